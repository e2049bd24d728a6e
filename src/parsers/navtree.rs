//! Parser for sidebar navigation snippets.
//!
//! Documentation portals often embed their sidebar as a JavaScript object
//! literal (unquoted keys, single-quoted strings, trailing commas). This
//! module reads such a literal with a small recursive-descent parser and
//! turns it into a tree of [`NavNode`]s.

use serde::Serialize;
use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at byte {offset}")]
pub struct NavTreeError {
    pub offset: usize,
    pub message: String,
}

/// A sidebar entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavNode {
    /// Value of the `type` key (e.g. "group", "link"), if any
    pub kind: Option<String>,
    pub label: String,
    pub href: Option<String>,
    pub children: Vec<NavNode>,
}

impl NavNode {
    /// Labels of this node and all descendants, depth-first
    pub fn labels(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_labels(&mut out);
        out
    }

    fn collect_labels(&self, out: &mut Vec<String>) {
        out.push(self.label.clone());
        for child in &self.children {
            child.collect_labels(out);
        }
    }
}

/// Parses a snippet into its top-level navigation nodes
pub fn parse(snippet: &str) -> Result<Vec<NavNode>, NavTreeError> {
    let value = parse_literal(snippet)?;
    Ok(nodes_from_value(&value))
}

/// Parses a snippet and flattens it to labels in document order
pub fn parse_labels(snippet: &str) -> Result<Vec<String>, NavTreeError> {
    Ok(parse(snippet)?.iter().flat_map(NavNode::labels).collect())
}

/// Parses a JavaScript object/array literal into a JSON value
pub fn parse_literal(snippet: &str) -> Result<Value, NavTreeError> {
    let mut reader = Reader::new(snippet);
    // Tolerate `const navs = [...];` style assignments
    reader.skip_assignment_prefix();
    let value = reader.value()?;
    reader.skip_trivia()?;
    if reader.peek() == Some(';') {
        reader.bump();
        reader.skip_trivia()?;
    }
    if let Some(c) = reader.peek() {
        return Err(reader.error(format!("unexpected trailing '{}'", c)));
    }
    Ok(value)
}

fn nodes_from_value(value: &Value) -> Vec<NavNode> {
    match value {
        Value::Array(items) => items.iter().flat_map(nodes_from_value).collect(),
        Value::Object(map) => match label_of(map) {
            Some(label) => vec![NavNode {
                kind: map.get("type").and_then(Value::as_str).map(str::to_string),
                label,
                href: ["href", "url", "path", "link"]
                    .iter()
                    .find_map(|k| map.get(*k).and_then(Value::as_str))
                    .map(str::to_string),
                children: map
                    .iter()
                    .filter(|(k, _)| !is_scalar_key(k))
                    .flat_map(|(_, v)| nodes_from_value(v))
                    .collect(),
            }],
            // Unlabelled objects only group their children
            None => map.values().flat_map(nodes_from_value).collect(),
        },
        _ => Vec::new(),
    }
}

fn label_of(map: &Map<String, Value>) -> Option<String> {
    ["label", "title", "name"]
        .iter()
        .find_map(|k| map.get(*k).and_then(Value::as_str))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn is_scalar_key(key: &str) -> bool {
    matches!(
        key,
        "type" | "label" | "title" | "name" | "href" | "url" | "path" | "link"
    )
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> NavTreeError {
        NavTreeError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_assignment_prefix(&mut self) {
        let rest = self.rest();
        let Some(eq) = rest.find('=') else {
            return;
        };
        let head = rest[..eq].trim();
        let mut words = head.split_whitespace();
        let is_decl = match (words.next(), words.next(), words.next()) {
            (Some("const" | "let" | "var"), Some(name), None) => is_identifier(name),
            (Some(name), None, None) => is_identifier(name),
            _ => false,
        };
        if is_decl && !rest[eq + 1..].starts_with(['=', '>']) {
            self.pos += eq + 1;
        }
    }

    fn skip_trivia(&mut self) -> Result<(), NavTreeError> {
        loop {
            let rest = self.rest();
            if rest.starts_with("//") {
                let end = rest.find('\n').unwrap_or(rest.len());
                self.pos += end;
            } else if rest.starts_with("/*") {
                let Some(end) = rest[2..].find("*/") else {
                    return Err(self.error("unterminated comment"));
                };
                self.pos += end + 4;
            } else if self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            } else {
                return Ok(());
            }
        }
    }

    fn expect(&mut self, want: char) -> Result<(), NavTreeError> {
        self.skip_trivia()?;
        match self.peek() {
            Some(c) if c == want => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", want, c))),
            None => Err(self.error(format!("expected '{}', found end of input", want))),
        }
    }

    fn value(&mut self) -> Result<Value, NavTreeError> {
        self.skip_trivia()?;
        match self.peek() {
            Some('{') => self.object(),
            Some('[') => self.array(),
            Some('"' | '\'' | '`') => self.string().map(Value::String),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(c) if is_identifier_start(c) => {
                let ident = self.identifier();
                Ok(match ident {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    "null" | "undefined" => Value::Null,
                    // Bare references such as component names are kept as text
                    other => Value::String(other.to_string()),
                })
            }
            Some(c) => Err(self.error(format!("unexpected '{}'", c))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn object(&mut self) -> Result<Value, NavTreeError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some('}') => {
                    self.bump();
                    return Ok(Value::Object(map));
                }
                Some('"' | '\'' | '`') => {
                    let key = self.string()?;
                    self.expect(':')?;
                    map.insert(key, self.value()?);
                }
                Some(c) if is_identifier_start(c) => {
                    let key = self.identifier().to_string();
                    self.expect(':')?;
                    map.insert(key, self.value()?);
                }
                Some(c) => return Err(self.error(format!("unexpected '{}' in object", c))),
                None => return Err(self.error("unterminated object")),
            }
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {}
                Some(c) => {
                    return Err(self.error(format!("expected ',' or '}}', found '{}'", c)));
                }
                None => return Err(self.error("unterminated object")),
            }
        }
    }

    fn array(&mut self) -> Result<Value, NavTreeError> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(']') => {
                    self.bump();
                    return Ok(Value::Array(items));
                }
                None => return Err(self.error("unterminated array")),
                _ => items.push(self.value()?),
            }
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {}
                Some(c) => {
                    return Err(self.error(format!("expected ',' or ']', found '{}'", c)));
                }
                None => return Err(self.error("unterminated array")),
            }
        }
    }

    fn string(&mut self) -> Result<String, NavTreeError> {
        let start = self.pos;
        let Some(quote) = self.bump() else {
            return Err(self.error("expected string"));
        };
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('u') => out.push(self.unicode_escape()?),
                    Some(c) => out.push(c),
                    None => break,
                },
                Some(c) => out.push(c),
                None => break,
            }
        }
        Err(NavTreeError {
            offset: start,
            message: "unterminated string".to_string(),
        })
    }

    fn unicode_escape(&mut self) -> Result<char, NavTreeError> {
        let rest = self.rest();
        let hex = rest.get(..4).filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()));
        let Some(hex) = hex else {
            return Err(self.error("invalid unicode escape"));
        };
        let code = u32::from_str_radix(hex, 16).map_err(|e| self.error(e.to_string()))?;
        self.pos += 4;
        Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn number(&mut self) -> Result<Value, NavTreeError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
        {
            self.bump();
        }
        let text = &self.src[start..self.pos];
        let parsed = text
            .parse::<i64>()
            .ok()
            .map(Number::from)
            .or_else(|| text.parse::<f64>().ok().and_then(Number::from_f64));
        parsed.map(Value::Number).ok_or(NavTreeError {
            offset: start,
            message: format!("invalid number '{}'", text),
        })
    }

    fn identifier(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(is_identifier_char) {
            self.bump();
        }
        &self.src[start..self.pos]
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(is_identifier_start) && chars.all(is_identifier_char)
}
