//! Moves members between a mapped value and a [`ConfigTree`].
use tracing::{trace, warn};

use crate::{
    error::{ConvertError, Error},
    mapped::Mapped,
    registry::ConverterRegistry,
    schema::FieldSpec,
    text::Comments,
    tree::ConfigTree,
    value::{Mapping, Plain},
};

/// What a [`FieldMapper::load`] had to fill in.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    /// Paths that were missing from the tree and were written from the
    /// member's compiled-in default.
    pub defaulted: Vec<String>,
}

impl LoadOutcome {
    pub fn is_dirty(&self) -> bool {
        !self.defaulted.is_empty()
    }
}

fn eligible<T: Mapped>() -> impl Iterator<Item = &'static FieldSpec<T>> {
    T::schema()
        .fields()
        .iter()
        .filter(|field| !field.is_skipped(T::PRESERVE_STATIC))
}

fn member_error<T>(field: &FieldSpec<T>, source: ConvertError) -> Error {
    Error::Member {
        member: field.name().to_string(),
        path: field.document_path().to_string(),
        source,
    }
}

/// Flattens a lifecycle error into a conversion error of a nested object.
fn nested_error(err: Error) -> ConvertError {
    match err {
        Error::Member { path, source, .. } => ConvertError::nested(&path, source),
        other => ConvertError::custom(other),
    }
}

/// Decides whether a failed member is skipped. Only conversion failures can
/// be skipped.
fn skip_or_fail<T: Mapped>(err: Error) -> Result<(), Error> {
    match err {
        Error::Member {
            member,
            path,
            source,
        } if T::SKIP_FAILED => {
            warn!(%member, %path, error = %source, "skipping member that failed to convert");
            Ok(())
        }
        other => Err(other),
    }
}

pub struct FieldMapper<'r> {
    registry: &'r ConverterRegistry,
}

impl<'r> FieldMapper<'r> {
    pub fn new(registry: &'r ConverterRegistry) -> Self {
        Self { registry }
    }

    /// Converts one member and stores it at its path.
    pub fn member_to_tree<T>(
        &self,
        value: &T,
        field: &FieldSpec<T>,
        tree: &mut ConfigTree,
    ) -> Result<(), Error> {
        let plain = field
            .read(value)
            .and_then(|dynamic| self.registry.to_plain(field.tag(), dynamic))
            .map_err(|source| member_error(field, source))?;
        tree.set(field.document_path(), plain)
    }

    /// Reads the value at a member's path back into the member. A missing
    /// path reads as null.
    pub fn tree_to_member<T>(
        &self,
        value: &mut T,
        field: &FieldSpec<T>,
        tree: &ConfigTree,
    ) -> Result<(), Error> {
        let plain = tree
            .get_plain(field.document_path())?
            .unwrap_or(Plain::Null);
        self.registry
            .from_plain(field.tag(), plain)
            .and_then(|dynamic| field.write(value, dynamic))
            .map_err(|source| member_error(field, source))
    }

    /// Loads every member from `tree`.
    ///
    /// Members present in the tree are read and their errors always
    /// propagate. Missing members are written from their current value and
    /// read back, and their paths reported in the outcome.
    pub fn load<T: Mapped>(&self, value: &mut T, tree: &mut ConfigTree) -> Result<LoadOutcome, Error> {
        let mut outcome = LoadOutcome::default();

        for field in eligible::<T>() {
            let path = field.document_path();
            if tree.has(path)? {
                trace!(member = field.name(), %path, "loading member");
                self.tree_to_member(value, field, tree)?;
                continue;
            }

            trace!(member = field.name(), %path, "filling member default");
            let filled = self
                .member_to_tree(value, field, tree)
                .and_then(|()| self.tree_to_member(value, field, tree));
            match filled {
                // a null default leaves nothing to write
                Ok(()) => {
                    if tree.has(path)? {
                        outcome.defaulted.push(path.to_string());
                    }
                }
                Err(err) => skip_or_fail::<T>(err)?,
            }
        }

        Ok(outcome)
    }

    /// Refreshes members whose path is present in `tree`. Absent members keep
    /// their current value.
    pub fn reload<T: Mapped>(&self, value: &mut T, tree: &ConfigTree) -> Result<(), Error> {
        for field in eligible::<T>() {
            if tree.has(field.document_path())? {
                self.tree_to_member(value, field, tree)?;
            }
        }
        Ok(())
    }

    /// Writes every member into `tree` and reads it back, so the value holds
    /// exactly what the document will hold. Comments are collected afresh.
    pub fn save<T: Mapped>(
        &self,
        value: &mut T,
        tree: &mut ConfigTree,
        comments: &mut Comments,
    ) -> Result<(), Error> {
        comments.clear();
        collect_comments::<T>(comments);

        for field in eligible::<T>() {
            trace!(member = field.name(), path = field.document_path(), "saving member");
            let saved = self
                .member_to_tree(value, field, tree)
                .and_then(|()| self.tree_to_member(value, field, tree));
            if let Err(err) = saved {
                skip_or_fail::<T>(err)?;
            }
        }
        Ok(())
    }
}

/// Adds the comment lines of every eligible member of `T`.
pub fn collect_comments<T: Mapped>(comments: &mut Comments) {
    for field in eligible::<T>() {
        if !field.comments().is_empty() {
            comments.extend(field.document_path(), field.comments().iter().cloned());
        }
    }
}

/// Projects a nested object into a plain mapping, with member paths nested
/// the same way they are in a document.
pub fn save_to_map<T: Mapped>(
    value: &T,
    registry: &ConverterRegistry,
) -> Result<Mapping, ConvertError> {
    let mapper = FieldMapper::new(registry);
    let mut tree = ConfigTree::new();

    for field in eligible::<T>() {
        if let Err(err) = mapper.member_to_tree(value, field, &mut tree) {
            skip_or_fail::<T>(err).map_err(nested_error)?;
        }
    }
    Ok(tree.get_values(true))
}

/// Loads a nested object from a plain mapping. Members missing from the
/// mapping keep their current value.
pub fn load_from_map<T: Mapped>(
    value: &mut T,
    mapping: Mapping,
    registry: &ConverterRegistry,
) -> Result<(), ConvertError> {
    let tree = ConfigTree::from_mapping(mapping);
    FieldMapper::new(registry)
        .reload(value, &tree)
        .map_err(nested_error)
}
