use super::Converter;
use crate::{
    error::ConvertError,
    registry::ConverterRegistry,
    value::{Dynamic, Plain, TypeTag, plain_kind, plain_label},
};

/// Symbolic enumerations, stored by symbol name.
///
/// Reading is lenient about case, spaces and underscores and also accepts the
/// aliases declared on the enum.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnumConverter;

impl Converter for EnumConverter {
    fn name(&self) -> &str {
        "enum"
    }

    fn supports(&self, ty: &TypeTag) -> bool {
        matches!(ty, TypeTag::Enum(_))
    }

    fn to_plain(
        &self,
        ty: &TypeTag,
        value: Dynamic,
        _registry: &ConverterRegistry,
    ) -> Result<Plain, ConvertError> {
        match value {
            Dynamic::Enum { descriptor, index } => descriptor
                .symbol(index)
                .map(Plain::from)
                .ok_or_else(|| {
                    ConvertError::custom(format!("{} has no symbol #{index}", descriptor.name))
                }),
            Dynamic::Plain(plain) => Ok(plain),
            other => Err(ConvertError::mismatch(ty.to_string(), other.kind())),
        }
    }

    fn from_plain(
        &self,
        ty: &TypeTag,
        plain: Plain,
        _registry: &ConverterRegistry,
    ) -> Result<Dynamic, ConvertError> {
        let &TypeTag::Enum(descriptor) = ty else {
            return Err(ConvertError::Unsupported(ty.to_string()));
        };

        let symbol = match &plain {
            Plain::String(_) | Plain::Number(_) | Plain::Bool(_) => plain_label(&plain),
            other => return Err(ConvertError::mismatch(descriptor.name, plain_kind(other))),
        };

        descriptor
            .resolve(&symbol)
            .map(|index| Dynamic::Enum { descriptor, index })
            .ok_or_else(|| ConvertError::UnknownSymbol {
                symbol,
                enum_name: descriptor.name.to_string(),
            })
    }
}
