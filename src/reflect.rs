//! Bridges concrete Rust types and the erased [`Dynamic`] representation.
//!
//! Every member type of a mapped struct implements [`Reflect`]. The derive
//! macros implement it for mapped structs and enums; this module covers
//! primitives, `String`, `Option` and the std collections.
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    hash::{BuildHasher, Hash},
    ops::{Deref, DerefMut},
};

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    error::ConvertError,
    value::{Dynamic, Mapping, Plain, TypeTag},
};

pub trait Reflect: Sized {
    /// The declared type, including generic arguments.
    fn type_tag() -> TypeTag;

    fn to_dynamic(&self) -> Result<Dynamic, ConvertError>;

    fn from_dynamic(value: Dynamic) -> Result<Self, ConvertError>;
}

macro_rules! reflect_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl Reflect for $ty {
            fn type_tag() -> TypeTag {
                TypeTag::$variant
            }

            fn to_dynamic(&self) -> Result<Dynamic, ConvertError> {
                Ok(Dynamic::$variant(*self))
            }

            fn from_dynamic(value: Dynamic) -> Result<Self, ConvertError> {
                match value {
                    Dynamic::$variant(v) => Ok(v),
                    other => Err(ConvertError::mismatch(stringify!($ty), other.kind())),
                }
            }
        }
    )*};
}

reflect_scalar! {
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

impl Reflect for usize {
    fn type_tag() -> TypeTag {
        TypeTag::U64
    }

    fn to_dynamic(&self) -> Result<Dynamic, ConvertError> {
        Ok(Dynamic::U64(*self as u64))
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, ConvertError> {
        let v = u64::from_dynamic(value)?;
        usize::try_from(v).map_err(|_| ConvertError::OutOfRange {
            value: v.to_string(),
            target: "usize",
        })
    }
}

impl Reflect for isize {
    fn type_tag() -> TypeTag {
        TypeTag::I64
    }

    fn to_dynamic(&self) -> Result<Dynamic, ConvertError> {
        Ok(Dynamic::I64(*self as i64))
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, ConvertError> {
        let v = i64::from_dynamic(value)?;
        isize::try_from(v).map_err(|_| ConvertError::OutOfRange {
            value: v.to_string(),
            target: "isize",
        })
    }
}

impl Reflect for String {
    fn type_tag() -> TypeTag {
        TypeTag::String
    }

    fn to_dynamic(&self) -> Result<Dynamic, ConvertError> {
        Ok(Dynamic::String(self.clone()))
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, ConvertError> {
        match value {
            Dynamic::String(v) => Ok(v),
            other => Err(ConvertError::mismatch("String", other.kind())),
        }
    }
}

/// `None` is written as null, which removes the key from the document.
impl<T: Reflect> Reflect for Option<T> {
    fn type_tag() -> TypeTag {
        T::type_tag()
    }

    fn to_dynamic(&self) -> Result<Dynamic, ConvertError> {
        match self {
            Some(value) => value.to_dynamic(),
            None => Ok(Dynamic::Null),
        }
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, ConvertError> {
        match value {
            Dynamic::Null => Ok(None),
            other => T::from_dynamic(other).map(Some),
        }
    }
}

fn elements_to_dynamic<'a, T: Reflect + 'a>(
    items: impl IntoIterator<Item = &'a T>,
) -> Result<Vec<Dynamic>, ConvertError> {
    items.into_iter().map(Reflect::to_dynamic).collect()
}

fn dynamic_elements(value: Dynamic, expected: &str) -> Result<Vec<Dynamic>, ConvertError> {
    match value {
        Dynamic::List(items) | Dynamic::Set(items) | Dynamic::Array(items) => Ok(items),
        other => Err(ConvertError::mismatch(expected, other.kind())),
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn type_tag() -> TypeTag {
        TypeTag::List(Box::new(T::type_tag()))
    }

    fn to_dynamic(&self) -> Result<Dynamic, ConvertError> {
        elements_to_dynamic(self).map(Dynamic::List)
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, ConvertError> {
        dynamic_elements(value, "list")?
            .into_iter()
            .map(T::from_dynamic)
            .collect()
    }
}

/// Hash sets are written sorted so repeated saves produce the same text.
impl<T, S> Reflect for HashSet<T, S>
where
    T: Reflect + Eq + Hash,
    S: BuildHasher + Default,
{
    fn type_tag() -> TypeTag {
        TypeTag::Set {
            elem: Box::new(T::type_tag()),
            unordered: true,
        }
    }

    fn to_dynamic(&self) -> Result<Dynamic, ConvertError> {
        elements_to_dynamic(self).map(Dynamic::Set)
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, ConvertError> {
        dynamic_elements(value, "set")?
            .into_iter()
            .map(T::from_dynamic)
            .collect()
    }
}

impl<T: Reflect + Ord> Reflect for BTreeSet<T> {
    fn type_tag() -> TypeTag {
        TypeTag::Set {
            elem: Box::new(T::type_tag()),
            unordered: false,
        }
    }

    fn to_dynamic(&self) -> Result<Dynamic, ConvertError> {
        elements_to_dynamic(self).map(Dynamic::Set)
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, ConvertError> {
        dynamic_elements(value, "set")?
            .into_iter()
            .map(T::from_dynamic)
            .collect()
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn type_tag() -> TypeTag {
        TypeTag::Array {
            elem: Box::new(T::type_tag()),
            len: Some(N),
        }
    }

    fn to_dynamic(&self) -> Result<Dynamic, ConvertError> {
        elements_to_dynamic(self).map(Dynamic::Array)
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, ConvertError> {
        let items = dynamic_elements(value, "array")?;
        let found = items.len();
        let items = items
            .into_iter()
            .map(T::from_dynamic)
            .collect::<Result<Vec<T>, _>>()?;
        <[T; N]>::try_from(items).map_err(|_| ConvertError::LengthMismatch { expected: N, found })
    }
}

impl<T: Reflect> Reflect for Box<[T]> {
    fn type_tag() -> TypeTag {
        TypeTag::Array {
            elem: Box::new(T::type_tag()),
            len: None,
        }
    }

    fn to_dynamic(&self) -> Result<Dynamic, ConvertError> {
        elements_to_dynamic(self.iter()).map(Dynamic::Array)
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, ConvertError> {
        dynamic_elements(value, "array")?
            .into_iter()
            .map(T::from_dynamic)
            .collect()
    }
}

fn entries_to_dynamic<'a, K, V>(
    entries: impl IntoIterator<Item = (&'a K, &'a V)>,
) -> Result<Dynamic, ConvertError>
where
    K: Reflect + 'a,
    V: Reflect + 'a,
{
    entries
        .into_iter()
        .map(|(k, v)| Ok((k.to_dynamic()?, v.to_dynamic()?)))
        .collect::<Result<Vec<_>, ConvertError>>()
        .map(Dynamic::Map)
}

fn dynamic_entries(value: Dynamic) -> Result<Vec<(Dynamic, Dynamic)>, ConvertError> {
    match value {
        Dynamic::Map(entries) => Ok(entries),
        other => Err(ConvertError::mismatch("map", other.kind())),
    }
}

/// Hash maps are written sorted by key so repeated saves produce the same
/// text.
impl<K, V, S> Reflect for HashMap<K, V, S>
where
    K: Reflect + Eq + Hash,
    V: Reflect,
    S: BuildHasher + Default,
{
    fn type_tag() -> TypeTag {
        TypeTag::Map {
            key: Box::new(K::type_tag()),
            value: Box::new(V::type_tag()),
            unordered: true,
        }
    }

    fn to_dynamic(&self) -> Result<Dynamic, ConvertError> {
        entries_to_dynamic(self)
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, ConvertError> {
        dynamic_entries(value)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_dynamic(k)?, V::from_dynamic(v)?)))
            .collect()
    }
}

impl<K, V> Reflect for BTreeMap<K, V>
where
    K: Reflect + Ord,
    V: Reflect,
{
    fn type_tag() -> TypeTag {
        TypeTag::Map {
            key: Box::new(K::type_tag()),
            value: Box::new(V::type_tag()),
            unordered: false,
        }
    }

    fn to_dynamic(&self) -> Result<Dynamic, ConvertError> {
        entries_to_dynamic(self)
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, ConvertError> {
        dynamic_entries(value)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_dynamic(k)?, V::from_dynamic(v)?)))
            .collect()
    }
}

/// Raw plain values are stored as they are.
impl Reflect for Plain {
    fn type_tag() -> TypeTag {
        TypeTag::Any
    }

    fn to_dynamic(&self) -> Result<Dynamic, ConvertError> {
        Ok(Dynamic::Plain(self.clone()))
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, ConvertError> {
        match value {
            Dynamic::Plain(plain) => Ok(plain),
            Dynamic::Null => Ok(Plain::Null),
            other => Err(ConvertError::mismatch("plain value", other.kind())),
        }
    }
}

impl Reflect for Mapping {
    fn type_tag() -> TypeTag {
        TypeTag::Any
    }

    fn to_dynamic(&self) -> Result<Dynamic, ConvertError> {
        Ok(Dynamic::Plain(Plain::Mapping(self.clone())))
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, ConvertError> {
        match value {
            Dynamic::Plain(Plain::Mapping(mapping)) => Ok(mapping),
            Dynamic::Null => Ok(Mapping::new()),
            Dynamic::Plain(other) => Err(ConvertError::mismatch(
                "mapping",
                crate::value::plain_kind(&other),
            )),
            other => Err(ConvertError::mismatch("mapping", other.kind())),
        }
    }
}

/// Stores any serde type through its YAML representation.
///
/// Useful for members whose type already derives `Serialize` and
/// `Deserialize` and needs no converter of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Serde<T>(pub T);

impl<T> Deref for Serde<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Serde<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: Serialize + DeserializeOwned> Reflect for Serde<T> {
    fn type_tag() -> TypeTag {
        TypeTag::Any
    }

    fn to_dynamic(&self) -> Result<Dynamic, ConvertError> {
        serde_yaml::to_value(&self.0)
            .map(Dynamic::Plain)
            .map_err(ConvertError::custom)
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, ConvertError> {
        let plain = Plain::from_dynamic(value)?;
        serde_yaml::from_value(plain)
            .map(Serde)
            .map_err(ConvertError::custom)
    }
}
