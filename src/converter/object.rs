use super::Converter;
use crate::{
    error::ConvertError,
    registry::ConverterRegistry,
    value::{Dynamic, Plain, TypeTag, plain_kind},
};

/// Nested mapped structs, stored as mappings of their members.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectConverter;

impl Converter for ObjectConverter {
    fn name(&self) -> &str {
        "object"
    }

    fn supports(&self, ty: &TypeTag) -> bool {
        matches!(ty, TypeTag::Object(_))
    }

    fn to_plain(
        &self,
        ty: &TypeTag,
        value: Dynamic,
        registry: &ConverterRegistry,
    ) -> Result<Plain, ConvertError> {
        match value {
            Dynamic::Object(object) => object.save_to_map(registry).map(Plain::Mapping),
            Dynamic::Plain(plain @ Plain::Mapping(_)) => Ok(plain),
            other => Err(ConvertError::mismatch(ty.to_string(), other.kind())),
        }
    }

    fn from_plain(
        &self,
        ty: &TypeTag,
        plain: Plain,
        registry: &ConverterRegistry,
    ) -> Result<Dynamic, ConvertError> {
        let TypeTag::Object(tag) = ty else {
            return Err(ConvertError::Unsupported(ty.to_string()));
        };
        match plain {
            Plain::Mapping(mapping) => (tag.load)(mapping, registry).map(Dynamic::Object),
            Plain::Null => Ok(Dynamic::Null),
            other => Err(ConvertError::mismatch(tag.name, plain_kind(&other))),
        }
    }
}
