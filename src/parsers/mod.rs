pub mod html;
pub mod navtree;
pub mod text;

pub use navtree::{NavNode, NavTreeError};
