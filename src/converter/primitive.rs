use serde_yaml::Number;

use super::Converter;
use crate::{
    error::ConvertError,
    registry::ConverterRegistry,
    value::{Dynamic, Plain, TypeTag, plain_kind},
};

/// Booleans, characters, numbers of every width and strings.
///
/// The tree only keeps YAML's native integer and float widths, so reading
/// narrows the stored number to the declared width and fails when it does not
/// fit.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimitiveConverter;

fn integer<T>(plain: &Plain, target: &'static str) -> Result<T, ConvertError>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    let Plain::Number(number) = plain else {
        return Err(ConvertError::mismatch(target, plain_kind(plain)));
    };

    let out_of_range = || ConvertError::OutOfRange {
        value: number.to_string(),
        target,
    };

    if let Some(v) = number.as_i64() {
        <T as TryFrom<i64>>::try_from(v).map_err(|_| out_of_range())
    } else if let Some(v) = number.as_u64() {
        <T as TryFrom<u64>>::try_from(v).map_err(|_| out_of_range())
    } else {
        Err(ConvertError::mismatch(target, "float"))
    }
}

fn float(plain: &Plain, target: &'static str) -> Result<f64, ConvertError> {
    match plain {
        Plain::Number(number) => number
            .as_f64()
            .ok_or_else(|| ConvertError::mismatch(target, "number")),
        other => Err(ConvertError::mismatch(target, plain_kind(other))),
    }
}

/// Narrows to `f32`. Finite values beyond the `f32` range are rejected
/// rather than turned into infinity.
fn narrow_f32(value: f64) -> Result<f32, ConvertError> {
    if value.is_finite() && value.abs() > f64::from(f32::MAX) {
        return Err(ConvertError::OutOfRange {
            value: value.to_string(),
            target: "f32",
        });
    }
    Ok(value as f32)
}

/// Writes an `f32` through its shortest decimal form so `0.1f32` is stored
/// as `0.1` rather than its widened `f64` expansion.
fn widen_f32(value: f32) -> f64 {
    value.to_string().parse().unwrap_or(f64::from(value))
}

impl Converter for PrimitiveConverter {
    fn name(&self) -> &str {
        "primitive"
    }

    fn supports(&self, ty: &TypeTag) -> bool {
        ty.is_scalar()
    }

    fn to_plain(
        &self,
        ty: &TypeTag,
        value: Dynamic,
        _registry: &ConverterRegistry,
    ) -> Result<Plain, ConvertError> {
        let plain = match value {
            Dynamic::Bool(v) => Plain::Bool(v),
            Dynamic::Char(v) => Plain::String(v.to_string()),
            Dynamic::I8(v) => Plain::Number(v.into()),
            Dynamic::I16(v) => Plain::Number(v.into()),
            Dynamic::I32(v) => Plain::Number(v.into()),
            Dynamic::I64(v) => Plain::Number(v.into()),
            Dynamic::U8(v) => Plain::Number(v.into()),
            Dynamic::U16(v) => Plain::Number(v.into()),
            Dynamic::U32(v) => Plain::Number(v.into()),
            Dynamic::U64(v) => Plain::Number(v.into()),
            Dynamic::F32(v) => Plain::Number(Number::from(widen_f32(v))),
            Dynamic::F64(v) => Plain::Number(Number::from(v)),
            Dynamic::String(v) => Plain::String(v),
            Dynamic::Plain(plain) => plain,
            other => return Err(ConvertError::mismatch(ty.to_string(), other.kind())),
        };
        Ok(plain)
    }

    fn from_plain(
        &self,
        ty: &TypeTag,
        plain: Plain,
        _registry: &ConverterRegistry,
    ) -> Result<Dynamic, ConvertError> {
        let value = match ty {
            TypeTag::Bool => match plain {
                Plain::Bool(v) => Dynamic::Bool(v),
                other => return Err(ConvertError::mismatch("bool", plain_kind(&other))),
            },
            TypeTag::Char => match plain {
                Plain::String(s) => s
                    .chars()
                    .next()
                    .map(Dynamic::Char)
                    .ok_or_else(|| ConvertError::mismatch("char", "empty string"))?,
                other => return Err(ConvertError::mismatch("char", plain_kind(&other))),
            },
            TypeTag::I8 => Dynamic::I8(integer(&plain, "i8")?),
            TypeTag::I16 => Dynamic::I16(integer(&plain, "i16")?),
            TypeTag::I32 => Dynamic::I32(integer(&plain, "i32")?),
            TypeTag::I64 => Dynamic::I64(integer(&plain, "i64")?),
            TypeTag::U8 => Dynamic::U8(integer(&plain, "u8")?),
            TypeTag::U16 => Dynamic::U16(integer(&plain, "u16")?),
            TypeTag::U32 => Dynamic::U32(integer(&plain, "u32")?),
            TypeTag::U64 => Dynamic::U64(integer(&plain, "u64")?),
            TypeTag::F32 => Dynamic::F32(narrow_f32(float(&plain, "f32")?)?),
            TypeTag::F64 => Dynamic::F64(float(&plain, "f64")?),
            TypeTag::String => match plain {
                Plain::String(s) => Dynamic::String(s),
                Plain::Number(n) => Dynamic::String(n.to_string()),
                Plain::Bool(b) => Dynamic::String(b.to_string()),
                other => return Err(ConvertError::mismatch("String", plain_kind(&other))),
            },
            other => return Err(ConvertError::Unsupported(other.to_string())),
        };
        Ok(value)
    }
}
