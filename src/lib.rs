//! Maps plain Rust structs to commented YAML documents.
//!
//! Derive [`Mapped`] on a struct and wrap it in a [`Document`]: every member
//! is stored at a dotted path derived from its name, comments declared on
//! members are written above their keys, and members missing from an existing
//! file are filled in from the struct's defaults.
//!
//! Member types are converted by the converters of a [`ConverterRegistry`].
//! The built-in converters cover primitives, strings, enums deriving
//! [`MappedEnum`], nested mapped structs, lists, sets, fixed arrays and maps,
//! nested to any depth. Other types plug in through the [`Converter`] trait.
extern crate self as mapped_config;

pub mod atomic;
pub mod converter;
pub mod document;
pub mod error;
pub mod mapped;
pub mod mapper;
pub mod reflect;
pub mod registry;
pub mod schema;
pub mod text;
pub mod tree;
pub mod value;

pub use converter::Converter;
pub use document::{Document, DocumentOptions, DocumentOptionsBuilder};
pub use error::{ConvertError, Error, Result};
pub use mapped::{Mapped, MappedEnum, MappedObject};
pub use mapper::{FieldMapper, LoadOutcome};
pub use reflect::{Reflect, Serde};
pub use registry::{ConverterRegistry, SubmittedConverter};
pub use schema::{FieldSpec, Schema, SchemaBuilder};
pub use text::Comments;
pub use tree::{ConfigTree, Node};
pub use value::{CustomTag, Dynamic, EnumDescriptor, Mapping, ObjectTag, Plain, TypeTag};

// re-export derive macros
pub use mapped_config_macros::{Mapped, MappedEnum};

#[doc(hidden)]
pub use inventory;
