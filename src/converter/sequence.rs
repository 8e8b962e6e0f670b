use super::Converter;
use crate::{
    error::ConvertError,
    registry::ConverterRegistry,
    value::{Dynamic, Plain, TypeTag, plain_kind, plain_label},
};

fn write_elements(
    elem: &TypeTag,
    items: Vec<Dynamic>,
    registry: &ConverterRegistry,
) -> Result<Vec<Plain>, ConvertError> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            registry
                .to_plain(elem, item)
                .map_err(|e| ConvertError::nested(&format!("[{i}]"), e))
        })
        .collect()
}

fn read_elements(
    elem: &TypeTag,
    items: Vec<Plain>,
    registry: &ConverterRegistry,
) -> Result<Vec<Dynamic>, ConvertError> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            registry
                .from_plain(elem, item)
                .map_err(|e| ConvertError::nested(&format!("[{i}]"), e))
        })
        .collect()
}

fn host_elements(ty: &TypeTag, value: Dynamic) -> Result<Result<Vec<Dynamic>, Plain>, ConvertError> {
    match value {
        Dynamic::List(items) | Dynamic::Set(items) | Dynamic::Array(items) => Ok(Ok(items)),
        Dynamic::Plain(plain) => Ok(Err(plain)),
        other => Err(ConvertError::mismatch(ty.to_string(), other.kind())),
    }
}

fn plain_elements(ty: &TypeTag, plain: Plain) -> Result<Vec<Plain>, ConvertError> {
    match plain {
        Plain::Sequence(items) => Ok(items),
        other => Err(ConvertError::mismatch(ty.to_string(), plain_kind(&other))),
    }
}

/// Ordered lists, stored as sequences.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListConverter;

impl Converter for ListConverter {
    fn name(&self) -> &str {
        "list"
    }

    fn supports(&self, ty: &TypeTag) -> bool {
        matches!(ty, TypeTag::List(_))
    }

    fn to_plain(
        &self,
        ty: &TypeTag,
        value: Dynamic,
        registry: &ConverterRegistry,
    ) -> Result<Plain, ConvertError> {
        let TypeTag::List(elem) = ty else {
            return Err(ConvertError::Unsupported(ty.to_string()));
        };
        match host_elements(ty, value)? {
            Ok(items) => write_elements(elem, items, registry).map(Plain::Sequence),
            Err(plain) => Ok(plain),
        }
    }

    fn from_plain(
        &self,
        ty: &TypeTag,
        plain: Plain,
        registry: &ConverterRegistry,
    ) -> Result<Dynamic, ConvertError> {
        let TypeTag::List(elem) = ty else {
            return Err(ConvertError::Unsupported(ty.to_string()));
        };
        let items = plain_elements(ty, plain)?;
        read_elements(elem, items, registry).map(Dynamic::List)
    }
}

/// Sets, stored as sequences.
///
/// Sets without an order of their own are written sorted so the same set
/// always renders the same way.
#[derive(Debug, Default, Clone, Copy)]
pub struct SetConverter;

impl Converter for SetConverter {
    fn name(&self) -> &str {
        "set"
    }

    fn supports(&self, ty: &TypeTag) -> bool {
        matches!(ty, TypeTag::Set { .. })
    }

    fn to_plain(
        &self,
        ty: &TypeTag,
        value: Dynamic,
        registry: &ConverterRegistry,
    ) -> Result<Plain, ConvertError> {
        let TypeTag::Set { elem, unordered } = ty else {
            return Err(ConvertError::Unsupported(ty.to_string()));
        };
        let items = match host_elements(ty, value)? {
            Ok(items) => items,
            Err(plain) => return Ok(plain),
        };

        let mut plain = write_elements(elem, items, registry)?;
        if *unordered {
            plain.sort_by_cached_key(plain_label);
        }
        Ok(Plain::Sequence(plain))
    }

    fn from_plain(
        &self,
        ty: &TypeTag,
        plain: Plain,
        registry: &ConverterRegistry,
    ) -> Result<Dynamic, ConvertError> {
        let TypeTag::Set { elem, .. } = ty else {
            return Err(ConvertError::Unsupported(ty.to_string()));
        };
        let items = plain_elements(ty, plain)?;
        read_elements(elem, items, registry).map(Dynamic::Set)
    }
}

/// Fixed and boxed slices, stored as sequences.
///
/// Fixed size arrays reject sequences of any other length.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArrayConverter;

impl Converter for ArrayConverter {
    fn name(&self) -> &str {
        "array"
    }

    fn supports(&self, ty: &TypeTag) -> bool {
        matches!(ty, TypeTag::Array { .. })
    }

    fn to_plain(
        &self,
        ty: &TypeTag,
        value: Dynamic,
        registry: &ConverterRegistry,
    ) -> Result<Plain, ConvertError> {
        let TypeTag::Array { elem, .. } = ty else {
            return Err(ConvertError::Unsupported(ty.to_string()));
        };
        match host_elements(ty, value)? {
            Ok(items) => write_elements(elem, items, registry).map(Plain::Sequence),
            Err(plain) => Ok(plain),
        }
    }

    fn from_plain(
        &self,
        ty: &TypeTag,
        plain: Plain,
        registry: &ConverterRegistry,
    ) -> Result<Dynamic, ConvertError> {
        let TypeTag::Array { elem, len } = ty else {
            return Err(ConvertError::Unsupported(ty.to_string()));
        };
        let items = plain_elements(ty, plain)?;
        if let Some(expected) = *len
            && items.len() != expected
        {
            return Err(ConvertError::LengthMismatch {
                expected,
                found: items.len(),
            });
        }
        read_elements(elem, items, registry).map(Dynamic::Array)
    }
}
