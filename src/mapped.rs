//! Traits implemented by mapped types.
//!
//! [`Mapped`] is implemented by structs whose members are stored in a
//! document, usually through `#[derive(Mapped)]`. Any `Mapped` type can also
//! be a member of another mapped type; it is then stored as a nested section.
//!
//! [`MappedEnum`] is implemented by unit-only enums stored by symbol name,
//! usually through `#[derive(MappedEnum)]`.
use std::any::{Any, TypeId};

use crate::{
    error::ConvertError,
    mapper,
    registry::ConverterRegistry,
    schema::Schema,
    tree::ConfigTree,
    value::{Dynamic, EnumDescriptor, Mapping, ObjectTag},
};

pub trait Mapped: Default + Clone + Send + 'static {
    /// Skip members whose value cannot be converted while saving or while
    /// filling defaults, instead of failing the whole operation.
    const SKIP_FAILED: bool = false;

    /// Include static members declared with
    /// [`SchemaBuilder::global`](crate::SchemaBuilder::global).
    const PRESERVE_STATIC: bool = false;

    fn schema() -> &'static Schema<Self>;

    /// Runs on the freshly parsed tree before any member is loaded. Not run by
    /// `reload`.
    fn preprocess(_tree: &mut ConfigTree) {}
}

/// A mapped value with its concrete type erased.
pub trait MappedObject: Any + Send {
    fn type_name(&self) -> &'static str;

    fn save_to_map(&self, registry: &ConverterRegistry) -> Result<Mapping, ConvertError>;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Mapped> MappedObject for T {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn save_to_map(&self, registry: &ConverterRegistry) -> Result<Mapping, ConvertError> {
        mapper::save_to_map(self, registry)
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

fn load_object<T: Mapped>(
    mapping: Mapping,
    registry: &ConverterRegistry,
) -> Result<Box<dyn MappedObject>, ConvertError> {
    let mut value = T::default();
    mapper::load_from_map(&mut value, mapping, registry)?;
    Ok(Box::new(value))
}

impl ObjectTag {
    pub fn of<T: Mapped>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            id: TypeId::of::<T>,
            load: load_object::<T>,
        }
    }
}

pub fn object_to_dynamic<T: Mapped>(value: &T) -> Dynamic {
    Dynamic::Object(Box::new(value.clone()))
}

/// Recovers a mapped value; a null section yields the type's default.
pub fn object_from_dynamic<T: Mapped>(value: Dynamic) -> Result<T, ConvertError> {
    match value {
        Dynamic::Object(object) => object
            .into_any()
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| ConvertError::mismatch(std::any::type_name::<T>(), "other object")),
        Dynamic::Null => Ok(T::default()),
        other => Err(ConvertError::mismatch(
            std::any::type_name::<T>(),
            other.kind(),
        )),
    }
}

pub trait MappedEnum: Sized + 'static {
    const DESCRIPTOR: &'static EnumDescriptor;

    fn index(&self) -> usize;

    fn from_index(index: usize) -> Option<Self>;
}

pub fn enum_to_dynamic<E: MappedEnum>(value: &E) -> Dynamic {
    Dynamic::Enum {
        descriptor: E::DESCRIPTOR,
        index: value.index(),
    }
}

pub fn enum_from_dynamic<E: MappedEnum>(value: Dynamic) -> Result<E, ConvertError> {
    match value {
        Dynamic::Enum { descriptor, index } if descriptor == E::DESCRIPTOR => {
            E::from_index(index).ok_or_else(|| {
                ConvertError::custom(format!("{} has no symbol #{index}", descriptor.name))
            })
        }
        other => Err(ConvertError::mismatch(E::DESCRIPTOR.name, other.kind())),
    }
}
