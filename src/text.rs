//! Document text: YAML with comments.
//!
//! The YAML library has no notion of comments, so rendering dumps the tree
//! first and then walks the dump line by line with a [`PathTracker`],
//! inserting the comment lines registered for each path right above the line
//! that introduces it.
use std::collections::BTreeMap;

use crate::{error::Error, tree::ConfigTree, value::Plain};

/// Comment lines keyed by dotted document path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comments {
    entries: BTreeMap<String, Vec<String>>,
}

impl Comments {
    pub fn add(&mut self, path: impl Into<String>, line: impl Into<String>) {
        self.entries.entry(path.into()).or_default().push(line.into());
    }

    pub fn extend<I, S>(&mut self, path: impl Into<String>, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .entry(path.into())
            .or_default()
            .extend(lines.into_iter().map(Into::into));
    }

    pub fn get(&self, path: &str) -> Option<&[String]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(path, lines)| (path.as_str(), lines.as_slice()))
    }
}

fn is_sequence_item(text: &str) -> bool {
    text == "-" || text.starts_with("- ")
}

/// Splits `key: rest` into the unquoted key and whatever follows the colon.
fn parse_key(text: &str) -> Option<(String, &str)> {
    if let Some(quoted) = text.strip_prefix('\'') {
        let mut key = String::new();
        let mut chars = quoted.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c != '\'' {
                key.push(c);
            } else if chars.next_if(|(_, next)| *next == '\'').is_some() {
                key.push('\'');
            } else {
                return quoted[i + 1..].strip_prefix(':').map(|rest| (key, rest));
            }
        }
        return None;
    }

    if let Some(quoted) = text.strip_prefix('"') {
        let mut key = String::new();
        let mut chars = quoted.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => key.extend(chars.next().map(|(_, escaped)| escaped)),
                '"' => return quoted[i + 1..].strip_prefix(':').map(|rest| (key, rest)),
                c => key.push(c),
            }
        }
        return None;
    }

    if let Some(at) = text.find(": ") {
        return Some((text[..at].to_string(), &text[at + 1..]));
    }
    text.strip_suffix(':').map(|key| (key.to_string(), ""))
}

/// Follows the key chain of a block style YAML dump line by line.
///
/// Each nesting level is two spaces. Sequence items and continuation lines
/// of multi-line scalars sit inside an opaque region and do not change the
/// chain.
#[derive(Debug, Default)]
pub struct PathTracker {
    keys: Vec<String>,
    opaque_floor: Option<usize>,
}

impl PathTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the next line and returns the dotted path of the key it
    /// introduces, if any.
    pub fn advance(&mut self, line: &str) -> Option<String> {
        let text = line.trim_start_matches(' ');
        if text.is_empty() || text.starts_with('#') {
            return None;
        }
        let indent = line.len() - text.len();

        if let Some(floor) = self.opaque_floor {
            if indent > floor || (indent == floor && is_sequence_item(text)) {
                return None;
            }
            self.opaque_floor = None;
        }

        if is_sequence_item(text) {
            self.opaque_floor = Some(indent);
            return None;
        }

        let (key, rest) = parse_key(text)?;
        self.keys.truncate(indent / 2);
        self.keys.push(key);

        if !rest.trim().is_empty() {
            self.opaque_floor = Some(indent);
        }

        Some(self.keys.join("."))
    }
}

fn push_comment(out: &mut String, indent: &str, line: &str) {
    for part in line.split('\n') {
        out.push_str(indent);
        if part.is_empty() {
            out.push('#');
        } else {
            out.push_str("# ");
            out.push_str(part);
        }
        out.push('\n');
    }
}

/// Renders a tree as commented YAML.
pub fn render(tree: &ConfigTree, header: &[String], comments: &Comments) -> Result<String, Error> {
    let mut out = String::new();
    for line in header {
        push_comment(&mut out, "", line);
    }
    if !header.is_empty() {
        out.push('\n');
    }

    if tree.is_empty() {
        return Ok(out);
    }

    let body = serde_yaml::to_string(&tree.get_values(true)).map_err(Error::Render)?;
    let mut tracker = PathTracker::new();
    for line in body.lines() {
        if let Some(path) = tracker.advance(line)
            && let Some(lines) = comments.get(&path)
        {
            let indent = &line[..line.len() - line.trim_start_matches(' ').len()];
            for comment in lines {
                push_comment(&mut out, indent, comment);
            }
        }
        out.push_str(line);
        out.push('\n');
    }

    Ok(out)
}

fn is_blank(text: &str) -> bool {
    text.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}

/// Parses document text into a tree. Empty and comment-only text gives an
/// empty tree.
pub fn parse(text: &str) -> Result<ConfigTree, serde_yaml::Error> {
    if is_blank(text) {
        return Ok(ConfigTree::new());
    }

    match serde_yaml::from_str::<Plain>(text)? {
        Plain::Null => Ok(ConfigTree::new()),
        Plain::Mapping(mapping) => Ok(ConfigTree::from_mapping(mapping)),
        other => Err(<serde_yaml::Error as serde::de::Error>::custom(format!(
            "the top level of a document must be a mapping, found {}",
            crate::value::plain_kind(&other)
        ))),
    }
}
