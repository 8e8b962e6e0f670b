//! Explicit member schemas.
//!
//! A [`Schema`] lists the members of a mapped type in the order they are
//! loaded and saved, each as a [`FieldSpec`] holding the document path, the
//! comment lines, the skip flags, the declared [`TypeTag`] and a pair of
//! accessors that move the member in and out of the erased [`Dynamic`] form.
//!
//! `#[derive(Mapped)]` generates the schema. Types that need static members
//! write it by hand with [`Schema::builder`].
use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use crate::{
    error::ConvertError,
    mapped::Mapped,
    reflect::Reflect,
    value::{Dynamic, TypeTag},
};

type Reader<T> = Box<dyn Fn(&T) -> Result<Dynamic, ConvertError> + Send + Sync>;
type Writer<T> = Box<dyn Fn(&mut T, Dynamic) -> Result<(), ConvertError> + Send + Sync>;

/// The document path of a member: its name with `_` replaced by `.`.
pub fn default_path(name: &str) -> String {
    name.replace('_', ".")
}

pub struct FieldSpec<T> {
    name: &'static str,
    path: String,
    comments: Vec<String>,
    transient: bool,
    immutable: bool,
    is_static: bool,
    tag: TypeTag,
    read: Reader<T>,
    write: Writer<T>,
}

impl<T> fmt::Debug for FieldSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("tag", &self.tag)
            .field("comments", &self.comments)
            .field("transient", &self.transient)
            .field("immutable", &self.immutable)
            .field("is_static", &self.is_static)
            .finish()
    }
}

impl<T: 'static> FieldSpec<T> {
    /// A member stored inside `T`, reached through a pair of projections.
    pub fn new<F, G, M>(name: &'static str, get: G, get_mut: M) -> Self
    where
        F: Reflect + 'static,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        Self {
            name,
            path: default_path(name),
            comments: Vec::new(),
            transient: false,
            immutable: false,
            is_static: false,
            tag: F::type_tag(),
            read: Box::new(move |owner| get(owner).to_dynamic()),
            write: Box::new(move |owner, value| {
                *get_mut(owner) = F::from_dynamic(value)?;
                Ok(())
            }),
        }
    }

    /// A static member shared by every instance of `T`.
    ///
    /// Static members are skipped unless the type sets
    /// [`Mapped::PRESERVE_STATIC`].
    pub fn global<F>(name: &'static str, cell: &'static RwLock<F>) -> Self
    where
        F: Reflect + Send + Sync + 'static,
    {
        Self {
            name,
            path: default_path(name),
            comments: Vec::new(),
            transient: false,
            immutable: false,
            is_static: true,
            tag: F::type_tag(),
            read: Box::new(move |_| {
                cell.read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .to_dynamic()
            }),
            write: Box::new(move |_, value| {
                let value = F::from_dynamic(value)?;
                *cell.write().unwrap_or_else(PoisonError::into_inner) = value;
                Ok(())
            }),
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Adds a comment line written above the member.
    pub fn comment(mut self, line: impl Into<String>) -> Self {
        self.comments.push(line.into());
        self
    }

    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    /// Re-targets a member of `B` at the `B` embedded in `T`.
    fn project<B: 'static>(field: &'static FieldSpec<B>, base: Arc<Projection<T, B>>) -> Self {
        let read_base = Arc::clone(&base);
        Self {
            name: field.name,
            path: field.path.clone(),
            comments: field.comments.clone(),
            transient: field.transient,
            immutable: field.immutable,
            is_static: field.is_static,
            tag: field.tag.clone(),
            read: Box::new(move |owner| field.read((read_base.get)(owner))),
            write: Box::new(move |owner, value| field.write((base.get_mut)(owner), value)),
        }
    }
}

impl<T> FieldSpec<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn document_path(&self) -> &str {
        &self.path
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn tag(&self) -> &TypeTag {
        &self.tag
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Whether the member stays out of the document.
    pub fn is_skipped(&self, preserve_static: bool) -> bool {
        self.transient || self.immutable || (self.is_static && !preserve_static)
    }

    pub fn read(&self, owner: &T) -> Result<Dynamic, ConvertError> {
        (self.read)(owner)
    }

    pub fn write(&self, owner: &mut T, value: Dynamic) -> Result<(), ConvertError> {
        (self.write)(owner, value)
    }
}

struct Projection<T, B> {
    get: Box<dyn Fn(&T) -> &B + Send + Sync>,
    get_mut: Box<dyn Fn(&mut T) -> &mut B + Send + Sync>,
}

/// The ordered members of a mapped type.
pub struct Schema<T> {
    fields: Vec<FieldSpec<T>>,
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.fields).finish()
    }
}

impl<T: 'static> Schema<T> {
    pub fn builder() -> SchemaBuilder<T> {
        SchemaBuilder {
            base: Vec::new(),
            own: Vec::new(),
        }
    }

    pub fn fields(&self) -> &[FieldSpec<T>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec<T>> {
        self.fields.iter().find(|f| f.name == name)
    }
}

pub struct SchemaBuilder<T> {
    base: Vec<FieldSpec<T>>,
    own: Vec<FieldSpec<T>>,
}

impl<T: 'static> SchemaBuilder<T> {
    pub fn field(mut self, field: FieldSpec<T>) -> Self {
        self.own.push(field);
        self
    }

    /// Shorthand for a static member; see [`FieldSpec::global`].
    pub fn global<F>(self, name: &'static str, cell: &'static RwLock<F>) -> Self
    where
        F: Reflect + Send + Sync + 'static,
    {
        self.field(FieldSpec::global(name, cell))
    }

    /// Splices in every member of an embedded base type.
    ///
    /// Base members keep their own paths and come before the members of `T`
    /// regardless of where `flatten` is called.
    pub fn flatten<B, G, M>(mut self, get: G, get_mut: M) -> Self
    where
        B: Mapped,
        G: Fn(&T) -> &B + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut B + Send + Sync + 'static,
    {
        let projection = Arc::new(Projection {
            get: Box::new(get),
            get_mut: Box::new(get_mut),
        });
        for field in B::schema().fields() {
            self.base
                .push(FieldSpec::project(field, Arc::clone(&projection)));
        }
        self
    }

    pub fn build(mut self) -> Schema<T> {
        self.base.append(&mut self.own);
        Schema { fields: self.base }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sample {
        max_players: u32,
        motd: String,
    }

    #[test]
    fn default_path_replaces_underscores() {
        assert_eq!(default_path("max_players"), "max.players");
        assert_eq!(default_path("motd"), "motd");
    }

    #[test]
    fn accessors_read_and_write_the_member() {
        let field = FieldSpec::new("max_players", |s: &Sample| &s.max_players, |s: &mut Sample| {
            &mut s.max_players
        });
        let mut sample = Sample::default();

        field.write(&mut sample, Dynamic::U32(12)).unwrap();
        assert_eq!(sample.max_players, 12);
        assert!(matches!(field.read(&sample), Ok(Dynamic::U32(12))));
        assert_eq!(field.tag(), &TypeTag::U32);
    }

    #[test]
    fn skip_flags() {
        static SHARED: RwLock<i32> = RwLock::new(0);

        let plain = FieldSpec::new("motd", |s: &Sample| &s.motd, |s: &mut Sample| &mut s.motd);
        assert!(!plain.is_skipped(false));
        assert!(plain.transient().is_skipped(false));

        let global = FieldSpec::<Sample>::global("shared", &SHARED);
        assert!(global.is_skipped(false));
        assert!(!global.is_skipped(true));
    }

    #[test]
    fn global_writes_the_shared_cell() {
        static COUNTER: RwLock<u16> = RwLock::new(1);

        let field = FieldSpec::<Sample>::global("counter", &COUNTER);
        let mut sample = Sample::default();
        field.write(&mut sample, Dynamic::U16(9)).unwrap();

        assert_eq!(*COUNTER.read().unwrap(), 9);
    }
}
