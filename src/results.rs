use serde::Serialize;
use std::path::PathBuf;

use crate::error::HarvestError;

/// The per-page result of a successful materialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitRecord {
    /// Position of the page in the run, gapless
    pub sequence: u32,

    /// URL of the page when it was captured
    pub url: String,

    /// Page title (linked-list mode) or the clicked label (target-list mode)
    pub title: String,

    /// Files written for this page, in capture order
    pub artifacts: Vec<PathBuf>,
}

/// Why a run ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No "next" control on the last page
    EndOfDocument,
    /// The next page had already been visited
    CycleDetected,
    /// Every target label was processed
    TargetsExhausted,
    /// `max_pages` pages were captured
    PageLimit,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            StopReason::EndOfDocument => "end of document",
            StopReason::CycleDetected => "cycle detected",
            StopReason::TargetsExhausted => "all targets processed",
            StopReason::PageLimit => "page limit reached",
        };
        f.write_str(text)
    }
}

#[derive(Debug)]
pub enum Outcome {
    Finished(StopReason),
    Aborted(HarvestError),
}

/// Everything a run produced, including partial results of an aborted run
#[derive(Debug)]
pub struct HarvestReport {
    pub records: Vec<VisitRecord>,
    pub outcome: Outcome,
}

impl HarvestReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Finished(_))
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        match self.outcome {
            Outcome::Finished(reason) => Some(reason),
            Outcome::Aborted(_) => None,
        }
    }

    pub fn error(&self) -> Option<&HarvestError> {
        match &self.outcome {
            Outcome::Finished(_) => None,
            Outcome::Aborted(err) => Some(err),
        }
    }

    /// All artifact paths in the order they were written
    pub fn artifact_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.records.iter().flat_map(|r| r.artifacts.iter())
    }
}
