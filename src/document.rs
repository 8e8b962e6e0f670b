//! Mapped values bound to a document file.
//!
//! A [`Document`] owns a mapped value, the converter registry used for it and
//! the tree of the file it was last loaded from or saved to.
//!
//! # Lifecycle
//!
//! 1. **Initialize**: [`init`](Document::init) writes the defaults when the
//!    file does not exist yet, and loads it otherwise.
//! 2. **Load**: [`load`](Document::load) reads every member, filling in and
//!    persisting members that are missing from the file.
//! 3. **Access**: through [`Deref`]/[`DerefMut`], [`value`](Document::value)
//!    or [`value_mut`](Document::value_mut).
//! 4. **Save**: [`save`](Document::save) writes the value back atomically.
//!
//! [`reload`](Document::reload) refreshes the value from the file without
//! filling defaults.
//!
//! # Example
//!
//! ```rust,no_run
//! use mapped_config::{Document, DocumentOptions, Mapped};
//!
//! #[derive(Mapped, Debug, Clone)]
//! struct Sound {
//!     #[config(comment = "Sound volume, 0-10")]
//!     volume: u8,
//! }
//!
//! impl Default for Sound {
//!     fn default() -> Self {
//!         Self { volume: 5 }
//!     }
//! }
//!
//! # fn main() -> Result<(), mapped_config::Error> {
//! let options = DocumentOptions::builder()
//!     .file("config/sound.yml")
//!     .header_line("Generated file")
//!     .build()?;
//!
//! let mut sound = Document::with_options(Sound::default(), options);
//! sound.init()?;
//!
//! sound.volume = 7;
//! sound.save()?;
//! # Ok(())
//! # }
//! ```
use std::{
    ops::{Deref, DerefMut},
    path::{Path, PathBuf},
};

use derive_builder::Builder;
use tracing::debug;

use crate::{
    atomic::AtomicFile,
    converter::Converter,
    error::{Error, Result},
    mapped::Mapped,
    mapper::FieldMapper,
    registry::ConverterRegistry,
    text::{self, Comments},
    tree::ConfigTree,
};

/// How a [`Document`] is stored.
#[derive(Debug, Clone, Builder)]
#[builder(default, pattern = "owned", setter(into))]
pub struct DocumentOptions {
    /// The backing file.
    #[builder(setter(into, strip_option))]
    file: Option<PathBuf>,

    /// Comment lines written at the top of the file, followed by a blank
    /// line.
    #[builder(setter(each(name = "header_line", into)))]
    header: Vec<String>,

    /// Rewrite the file right away when `load` had to fill in missing
    /// members. On by default.
    persist_defaults: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            file: None,
            header: Vec::new(),
            persist_defaults: true,
        }
    }
}

impl DocumentOptions {
    pub fn builder() -> DocumentOptionsBuilder {
        DocumentOptionsBuilder::default()
    }
}

pub struct Document<T: Mapped> {
    value: T,
    file: Option<AtomicFile>,
    header: Vec<String>,
    persist_defaults: bool,
    registry: ConverterRegistry,
    root: ConfigTree,
    comments: Comments,
    dirty: bool,
}

impl<T: Mapped + std::fmt::Debug> std::fmt::Debug for Document<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("value", &self.value)
            .field("file", &self.file())
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl<T: Mapped> Document<T> {
    /// A document with no backing file yet.
    pub fn new(value: T) -> Self {
        Self::with_options(value, DocumentOptions::default())
    }

    pub fn with_options(value: T, options: DocumentOptions) -> Self {
        Self {
            value,
            file: options.file.map(AtomicFile::new),
            header: options.header,
            persist_defaults: options.persist_defaults,
            registry: ConverterRegistry::new(),
            root: ConfigTree::new(),
            comments: Comments::default(),
            dirty: false,
        }
    }

    /// A document holding `T::default()` backed by `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let options = DocumentOptions {
            file: Some(path.into()),
            ..DocumentOptions::default()
        };
        Self::with_options(T::default(), options)
    }

    /// Replaces the converter registry.
    pub fn with_registry(mut self, registry: ConverterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ConverterRegistry {
        &mut self.registry
    }

    /// Registers a custom converter with this document's registry.
    pub fn register_converter<C>(&mut self) -> Result<&mut Self>
    where
        C: Converter + Default + 'static,
    {
        self.registry.register::<C>()?;
        Ok(self)
    }

    fn backing_file(&self) -> Result<&AtomicFile> {
        self.file.as_ref().ok_or(Error::NoBackingFile)
    }

    /// Writes every member into the document and replaces the file
    /// atomically.
    ///
    /// Keys in the file that no member maps to are kept.
    pub fn save(&mut self) -> Result<()> {
        let file = self.file.as_ref().ok_or(Error::NoBackingFile)?;

        FieldMapper::new(&self.registry).save(&mut self.value, &mut self.root, &mut self.comments)?;
        let text = text::render(&self.root, &self.header, &self.comments)?;
        file.write(&text)?;

        self.dirty = false;
        debug!(path = %file.path().display(), "saved document");
        Ok(())
    }

    pub fn save_to(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        self.file = Some(AtomicFile::new(path));
        self.save()
    }

    /// Writes the defaults when the file does not exist, and loads it
    /// otherwise.
    ///
    /// Nothing is created when a member fails to convert.
    pub fn init(&mut self) -> Result<()> {
        let file = self.backing_file()?;
        if file.exists() {
            return self.load();
        }

        debug!(path = %file.path().display(), "creating document");
        self.save()
    }

    pub fn init_at(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        self.file = Some(AtomicFile::new(path));
        self.init()
    }

    fn read_tree(&self) -> Result<ConfigTree> {
        let file = self.backing_file()?;
        let contents = file.read()?;
        text::parse(&contents).map_err(|source| Error::Parse {
            path: file.path().to_path_buf(),
            source,
        })
    }

    /// Loads every member from the file.
    ///
    /// Members missing from the file are filled from their current value.
    /// When that happens the file is rewritten at once, unless
    /// `persist_defaults` is off, in which case [`is_dirty`](Self::is_dirty)
    /// reports it.
    pub fn load(&mut self) -> Result<()> {
        let mut tree = self.read_tree()?;
        T::preprocess(&mut tree);

        let outcome = FieldMapper::new(&self.registry).load(&mut self.value, &mut tree)?;
        self.root = tree;
        self.dirty = outcome.is_dirty();
        debug!(defaulted = ?outcome.defaulted, "loaded document");

        if self.dirty && self.persist_defaults {
            self.save()?;
        }
        Ok(())
    }

    pub fn load_from(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        self.file = Some(AtomicFile::new(path));
        self.load()
    }

    /// Refreshes the members present in the file. Does not run
    /// [`Mapped::preprocess`] and does not fill defaults.
    pub fn reload(&mut self) -> Result<()> {
        let tree = self.read_tree()?;
        FieldMapper::new(&self.registry).reload(&mut self.value, &tree)?;
        self.root = tree;
        debug!("reloaded document");
        Ok(())
    }

    /// The tree as last loaded or saved.
    pub fn tree(&self) -> &ConfigTree {
        &self.root
    }

    /// The comments collected by the last save.
    pub fn comments(&self) -> &Comments {
        &self.comments
    }

    /// Whether the last load filled in members that have not been written
    /// yet.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_ref().map(AtomicFile::path)
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: Mapped> Deref for Document<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Mapped> DerefMut for Document<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}
