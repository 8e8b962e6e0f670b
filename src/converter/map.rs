use super::Converter;
use crate::{
    error::ConvertError,
    registry::ConverterRegistry,
    value::{Dynamic, Mapping, Plain, TypeTag, plain_kind, plain_label},
};

/// Maps, stored as mappings.
///
/// Keys come back from a document as strings, so keys declared as numbers or
/// booleans are parsed from their text before conversion.
///
/// Entries whose value is null are left out in both directions, because a
/// null value removes its key from the document. A map with `Option` values
/// therefore loads back without its `None` entries.
#[derive(Debug, Default, Clone, Copy)]
pub struct MapConverter;

fn coerce_key(key_ty: &TypeTag, key: Plain) -> Plain {
    let wants_scalar = key_ty.is_integer() || key_ty.is_float() || *key_ty == TypeTag::Bool;
    match key {
        Plain::String(text) if wants_scalar => {
            serde_yaml::from_str::<Plain>(&text).unwrap_or(Plain::String(text))
        }
        other => other,
    }
}

impl Converter for MapConverter {
    fn name(&self) -> &str {
        "map"
    }

    fn supports(&self, ty: &TypeTag) -> bool {
        matches!(ty, TypeTag::Map { .. })
    }

    fn to_plain(
        &self,
        ty: &TypeTag,
        value: Dynamic,
        registry: &ConverterRegistry,
    ) -> Result<Plain, ConvertError> {
        let TypeTag::Map {
            key: key_ty,
            value: value_ty,
            unordered,
        } = ty
        else {
            return Err(ConvertError::Unsupported(ty.to_string()));
        };

        let entries = match value {
            Dynamic::Map(entries) => entries,
            Dynamic::Plain(plain) => return Ok(plain),
            other => return Err(ConvertError::mismatch(ty.to_string(), other.kind())),
        };

        let mut plain = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            if value.is_null() {
                continue;
            }
            let key = registry.to_plain(key_ty, key)?;
            let label = plain_label(&key);
            let value = registry
                .to_plain(value_ty, value)
                .map_err(|e| ConvertError::nested(&label, e))?;
            plain.push((label, key, value));
        }

        if *unordered {
            plain.sort_by(|(a, ..), (b, ..)| a.cmp(b));
        }

        Ok(Plain::Mapping(
            plain
                .into_iter()
                .map(|(_, key, value)| (key, value))
                .collect::<Mapping>(),
        ))
    }

    fn from_plain(
        &self,
        ty: &TypeTag,
        plain: Plain,
        registry: &ConverterRegistry,
    ) -> Result<Dynamic, ConvertError> {
        let TypeTag::Map {
            key: key_ty,
            value: value_ty,
            ..
        } = ty
        else {
            return Err(ConvertError::Unsupported(ty.to_string()));
        };

        let mapping = match plain {
            Plain::Mapping(mapping) => mapping,
            other => return Err(ConvertError::mismatch(ty.to_string(), plain_kind(&other))),
        };

        let mut entries = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            if value.is_null() {
                continue;
            }
            let label = plain_label(&key);
            let key = registry
                .from_plain(key_ty, coerce_key(key_ty, key))
                .map_err(|_| ConvertError::KeyCoercion {
                    key: label.clone(),
                    target: key_ty.to_string(),
                })?;
            let value = registry
                .from_plain(value_ty, value)
                .map_err(|e| ConvertError::nested(&label, e))?;
            entries.push((key, value));
        }
        Ok(Dynamic::Map(entries))
    }
}
