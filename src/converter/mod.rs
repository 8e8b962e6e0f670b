//! The converter protocol and the built-in converters.
//!
//! A converter turns a [`Dynamic`] host value of a declared [`TypeTag`] into a
//! [`Plain`] tree value and back. Converters are stateless; anything they need
//! to convert nested values is reached through the [`ConverterRegistry`]
//! passed to each call.
mod enumeration;
mod map;
mod object;
mod primitive;
mod sequence;

pub use enumeration::EnumConverter;
pub use map::MapConverter;
pub use object::ObjectConverter;
pub use primitive::PrimitiveConverter;
pub use sequence::{ArrayConverter, ListConverter, SetConverter};

use crate::{
    error::ConvertError,
    registry::ConverterRegistry,
    value::{Dynamic, Plain, TypeTag},
};

pub trait Converter: Send + Sync {
    /// Unique name of the converter inside a registry.
    fn name(&self) -> &str;

    fn supports(&self, ty: &TypeTag) -> bool;

    fn to_plain(
        &self,
        ty: &TypeTag,
        value: Dynamic,
        registry: &ConverterRegistry,
    ) -> Result<Plain, ConvertError>;

    fn from_plain(
        &self,
        ty: &TypeTag,
        plain: Plain,
        registry: &ConverterRegistry,
    ) -> Result<Dynamic, ConvertError>;
}

/// The built-in converters in lookup order.
pub(crate) fn builtins() -> Vec<Box<dyn Converter>> {
    vec![
        Box::new(PrimitiveConverter),
        Box::new(ObjectConverter),
        Box::new(EnumConverter),
        Box::new(ListConverter),
        Box::new(MapConverter),
        Box::new(ArrayConverter),
        Box::new(SetConverter),
    ]
}
