//! Ordered, path addressed document tree.
//!
//! Paths are dot separated (`"database.pool.size"`). Writes create missing
//! sections along the way; reads never change the tree.
use crate::{
    error::{Error, Result},
    value::{Mapping, Plain, plain_label},
};

/// One entry of a [`ConfigTree`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Value(Plain),
    Section(ConfigTree),
}

impl Node {
    /// Flattens the node into a plain value, turning sections into mappings.
    pub fn to_plain(&self) -> Plain {
        match self {
            Node::Value(plain) => plain.clone(),
            Node::Section(section) => Plain::Mapping(section.get_values(true)),
        }
    }

    pub fn as_section(&self) -> Option<&ConfigTree> {
        match self {
            Node::Section(section) => Some(section),
            Node::Value(_) => None,
        }
    }
}

/// An ordered mapping from keys to values or nested sections.
///
/// Insertion order is kept and reproduced when rendering. Replacing an
/// existing key keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    entries: Vec<(String, Node)>,
}

fn segments(path: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(Error::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    fn child(&self, key: &str) -> Option<&Node> {
        self.position(key).map(|index| &self.entries[index].1)
    }

    /// Returns the section stored under `key`, replacing a plain value or
    /// appending a new section when needed.
    fn child_section(&mut self, key: &str) -> &mut ConfigTree {
        let index = match self.position(key) {
            Some(index) => index,
            None => {
                self.entries
                    .push((key.to_string(), Node::Section(ConfigTree::new())));
                self.entries.len() - 1
            }
        };

        let node = &mut self.entries[index].1;
        if let Node::Value(plain) = node {
            // a stored mapping keeps its entries when written through
            let section = match std::mem::take(plain) {
                Plain::Mapping(mapping) => ConfigTree::from_mapping(mapping),
                _ => ConfigTree::new(),
            };
            *node = Node::Section(section);
        }

        match node {
            Node::Section(section) => section,
            Node::Value(_) => unreachable!("entry was just turned into a section"),
        }
    }

    fn insert(&mut self, key: &str, node: Node) {
        match self.position(key) {
            Some(index) => self.entries[index].1 = node,
            None => self.entries.push((key.to_string(), node)),
        }
    }

    fn section_at(&self, parents: &[&str]) -> Option<&ConfigTree> {
        let mut section = self;
        for segment in parents {
            section = section.child(segment)?.as_section()?;
        }
        Some(section)
    }

    /// Returns the section at `path`, creating every missing section on the
    /// way.
    pub fn create(&mut self, path: &str) -> Result<&mut ConfigTree> {
        let mut section = self;
        for segment in segments(path)? {
            section = section.child_section(segment);
        }
        Ok(section)
    }

    /// Stores `value` at `path`. A null value removes the entry instead.
    pub fn set(&mut self, path: &str, value: Plain) -> Result<()> {
        if value.is_null() {
            self.remove(path)?;
            return Ok(());
        }
        self.set_node(path, Node::Value(value))
    }

    /// Stores a raw node at `path`.
    pub fn set_node(&mut self, path: &str, node: Node) -> Result<()> {
        let segments = segments(path)?;
        let (key, parents) = segments
            .split_last()
            .ok_or_else(|| Error::InvalidPath(path.to_string()))?;

        let mut section = self;
        for segment in parents {
            section = section.child_section(segment);
        }
        section.insert(key, node);
        Ok(())
    }

    /// Removes and returns the entry at `path`. Missing sections are not
    /// created.
    pub fn remove(&mut self, path: &str) -> Result<Option<Node>> {
        let segments = segments(path)?;
        let (key, parents) = segments
            .split_last()
            .ok_or_else(|| Error::InvalidPath(path.to_string()))?;

        let mut section = self;
        for segment in parents {
            let Some(index) = section.position(segment) else {
                return Ok(None);
            };
            match &mut section.entries[index].1 {
                Node::Section(child) => section = child,
                Node::Value(_) => return Ok(None),
            }
        }

        Ok(section
            .position(key)
            .map(|index| section.entries.remove(index).1))
    }

    /// Looks up the entry at `path` without touching the tree.
    pub fn get(&self, path: &str) -> Result<Option<&Node>> {
        let segments = segments(path)?;
        let Some((key, parents)) = segments.split_last() else {
            return Ok(None);
        };
        Ok(self.section_at(parents).and_then(|section| section.child(key)))
    }

    /// Like [`get`](Self::get), with sections flattened into mappings.
    pub fn get_plain(&self, path: &str) -> Result<Option<Plain>> {
        Ok(self.get(path)?.map(Node::to_plain))
    }

    pub fn has(&self, path: &str) -> Result<bool> {
        Ok(self.get(path)?.is_some())
    }

    /// Flattens the tree into plain mappings.
    ///
    /// Without `deep`, nested sections are returned as empty mappings.
    pub fn get_values(&self, deep: bool) -> Mapping {
        let mut output = Mapping::new();
        for (key, node) in &self.entries {
            let value = match node {
                Node::Value(plain) => plain.clone(),
                Node::Section(section) if deep => Plain::Mapping(section.get_values(true)),
                Node::Section(_) => Plain::Mapping(Mapping::new()),
            };
            output.insert(Plain::String(key.clone()), value);
        }
        output
    }

    /// Builds a tree from a parsed mapping.
    ///
    /// Nested mappings become sections and non-string keys are stringified.
    /// Keys are taken literally, so `a.b: 1` stays a single key. Null values
    /// are dropped.
    pub fn from_mapping(mapping: Mapping) -> Self {
        let mut tree = ConfigTree::new();
        tree.merge_mapping(mapping);
        tree
    }

    fn merge_mapping(&mut self, mapping: Mapping) {
        for (key, value) in mapping {
            let node = match value {
                Plain::Null => continue,
                Plain::Mapping(nested) => Node::Section(ConfigTree::from_mapping(nested)),
                other => Node::Value(other),
            };
            self.insert(&plain_label(&key), node);
        }
    }
}
