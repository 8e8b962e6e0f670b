//! Value model shared by converters.
//!
//! Three representations meet here:
//!
//! - [`Plain`]: what the document tree stores natively (YAML scalars,
//!   sequences and mappings);
//! - [`Dynamic`]: a host value with its exact Rust shape erased, which is what
//!   converters consume and produce;
//! - [`TypeTag`]: the declared type of a member, including the element, key
//!   and value types of containers.
use std::{
    any::{Any, TypeId},
    fmt,
};

use crate::{error::ConvertError, mapped::MappedObject, registry::ConverterRegistry};

/// A value as the document tree stores it.
pub type Plain = serde_yaml::Value;

/// An ordered map of plain values.
pub type Mapping = serde_yaml::Mapping;

/// Returns a short human readable name of the kind of a plain value.
pub fn plain_kind(plain: &Plain) -> &'static str {
    match plain {
        Plain::Null => "null",
        Plain::Bool(_) => "bool",
        Plain::Number(n) if n.is_f64() => "float",
        Plain::Number(_) => "integer",
        Plain::String(_) => "string",
        Plain::Sequence(_) => "sequence",
        Plain::Mapping(_) => "mapping",
        Plain::Tagged(_) => "tagged value",
    }
}

/// Returns a stable textual form of a plain value, used to order entries of
/// unordered containers and to label errors.
pub fn plain_label(plain: &Plain) -> String {
    match plain {
        Plain::Null => "null".to_string(),
        Plain::Bool(b) => b.to_string(),
        Plain::Number(n) => n.to_string(),
        Plain::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Static description of a symbolic enumeration.
///
/// Generated by `#[derive(MappedEnum)]`. Aliases map an extra accepted
/// spelling to the index of a symbol.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumDescriptor {
    pub name: &'static str,
    pub symbols: &'static [&'static str],
    pub aliases: &'static [(&'static str, usize)],
}

impl EnumDescriptor {
    pub fn symbol(&self, index: usize) -> Option<&'static str> {
        self.symbols.get(index).copied()
    }

    /// Resolves user input to a symbol index.
    ///
    /// Spaces and underscores are ignored and the comparison is case
    /// insensitive, so `FAST_DIGGING`, `FastDigging` and `fast digging` all
    /// name the same symbol. Symbols are tried before aliases.
    pub fn resolve(&self, input: &str) -> Option<usize> {
        let wanted = normalize_symbol(input);

        self.symbols
            .iter()
            .position(|symbol| normalize_symbol(symbol) == wanted)
            .or_else(|| {
                self.aliases
                    .iter()
                    .find(|(alias, _)| normalize_symbol(alias) == wanted)
                    .map(|(_, index)| *index)
            })
    }
}

pub fn normalize_symbol(input: &str) -> String {
    input
        .chars()
        .filter(|c| *c != ' ' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Declared type of a nested mapped object.
///
/// `load` builds a fresh instance of the type from a plain mapping.
#[derive(Clone, Copy)]
pub struct ObjectTag {
    pub name: &'static str,
    pub id: fn() -> TypeId,
    pub load: fn(Mapping, &ConverterRegistry) -> Result<Box<dyn MappedObject>, ConvertError>,
}

impl fmt::Debug for ObjectTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectTag").field(&self.name).finish()
    }
}

impl PartialEq for ObjectTag {
    fn eq(&self, other: &Self) -> bool {
        (self.id)() == (other.id)()
    }
}

/// Declared type of a value handled by a user registered converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomTag {
    pub name: &'static str,
    pub id: TypeId,
}

impl CustomTag {
    pub fn of<T: Any>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

/// The declared type of a member.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeTag {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    Enum(&'static EnumDescriptor),
    Object(ObjectTag),
    List(Box<TypeTag>),
    Set {
        elem: Box<TypeTag>,
        unordered: bool,
    },
    Map {
        key: Box<TypeTag>,
        value: Box<TypeTag>,
        unordered: bool,
    },
    Array {
        elem: Box<TypeTag>,
        len: Option<usize>,
    },
    Custom(CustomTag),
    /// A raw plain value with no further type information.
    Any,
}

impl TypeTag {
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            TypeTag::I8
                | TypeTag::I16
                | TypeTag::I32
                | TypeTag::I64
                | TypeTag::U8
                | TypeTag::U16
                | TypeTag::U32
                | TypeTag::U64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, TypeTag::F32 | TypeTag::F64)
    }

    pub fn is_scalar(&self) -> bool {
        self.is_integer()
            || self.is_float()
            || matches!(self, TypeTag::Bool | TypeTag::Char | TypeTag::String)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Bool => f.write_str("bool"),
            TypeTag::Char => f.write_str("char"),
            TypeTag::I8 => f.write_str("i8"),
            TypeTag::I16 => f.write_str("i16"),
            TypeTag::I32 => f.write_str("i32"),
            TypeTag::I64 => f.write_str("i64"),
            TypeTag::U8 => f.write_str("u8"),
            TypeTag::U16 => f.write_str("u16"),
            TypeTag::U32 => f.write_str("u32"),
            TypeTag::U64 => f.write_str("u64"),
            TypeTag::F32 => f.write_str("f32"),
            TypeTag::F64 => f.write_str("f64"),
            TypeTag::String => f.write_str("String"),
            TypeTag::Enum(descriptor) => f.write_str(descriptor.name),
            TypeTag::Object(tag) => f.write_str(tag.name),
            TypeTag::List(elem) => write!(f, "List<{elem}>"),
            TypeTag::Set { elem, .. } => write!(f, "Set<{elem}>"),
            TypeTag::Map { key, value, .. } => write!(f, "Map<{key}, {value}>"),
            TypeTag::Array { elem, len: Some(len) } => write!(f, "[{elem}; {len}]"),
            TypeTag::Array { elem, len: None } => write!(f, "[{elem}]"),
            TypeTag::Custom(tag) => f.write_str(tag.name),
            TypeTag::Any => f.write_str("any"),
        }
    }
}

/// A host value with its concrete Rust type erased.
pub enum Dynamic {
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Enum {
        descriptor: &'static EnumDescriptor,
        index: usize,
    },
    Object(Box<dyn MappedObject>),
    List(Vec<Dynamic>),
    Set(Vec<Dynamic>),
    Array(Vec<Dynamic>),
    Map(Vec<(Dynamic, Dynamic)>),
    Custom(Box<dyn Any + Send>),
    /// Already plain; passed through untouched.
    Plain(Plain),
}

impl Dynamic {
    pub fn custom<T: Any + Send>(value: T) -> Self {
        Dynamic::Custom(Box::new(value))
    }

    /// Unwraps a [`Dynamic::Custom`] holding a `T`.
    pub fn into_custom<T: Any>(self) -> Result<T, ConvertError> {
        match self {
            Dynamic::Custom(value) => {
                let value: Box<dyn Any> = value;
                value
                    .downcast::<T>()
                    .map(|v| *v)
                    .map_err(|_| ConvertError::mismatch(std::any::type_name::<T>(), "other custom value"))
            }
            other => Err(ConvertError::mismatch(
                std::any::type_name::<T>(),
                other.kind(),
            )),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Char(_) => "char",
            Dynamic::I8(_) => "i8",
            Dynamic::I16(_) => "i16",
            Dynamic::I32(_) => "i32",
            Dynamic::I64(_) => "i64",
            Dynamic::U8(_) => "u8",
            Dynamic::U16(_) => "u16",
            Dynamic::U32(_) => "u32",
            Dynamic::U64(_) => "u64",
            Dynamic::F32(_) => "f32",
            Dynamic::F64(_) => "f64",
            Dynamic::String(_) => "string",
            Dynamic::Enum { .. } => "enum",
            Dynamic::Object(_) => "object",
            Dynamic::List(_) => "list",
            Dynamic::Set(_) => "set",
            Dynamic::Array(_) => "array",
            Dynamic::Map(_) => "map",
            Dynamic::Custom(_) => "custom value",
            Dynamic::Plain(_) => "plain value",
        }
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dynamic::Null => f.write_str("Null"),
            Dynamic::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Dynamic::Char(v) => f.debug_tuple("Char").field(v).finish(),
            Dynamic::I8(v) => f.debug_tuple("I8").field(v).finish(),
            Dynamic::I16(v) => f.debug_tuple("I16").field(v).finish(),
            Dynamic::I32(v) => f.debug_tuple("I32").field(v).finish(),
            Dynamic::I64(v) => f.debug_tuple("I64").field(v).finish(),
            Dynamic::U8(v) => f.debug_tuple("U8").field(v).finish(),
            Dynamic::U16(v) => f.debug_tuple("U16").field(v).finish(),
            Dynamic::U32(v) => f.debug_tuple("U32").field(v).finish(),
            Dynamic::U64(v) => f.debug_tuple("U64").field(v).finish(),
            Dynamic::F32(v) => f.debug_tuple("F32").field(v).finish(),
            Dynamic::F64(v) => f.debug_tuple("F64").field(v).finish(),
            Dynamic::String(v) => f.debug_tuple("String").field(v).finish(),
            Dynamic::Enum { descriptor, index } => f
                .debug_struct("Enum")
                .field("name", &descriptor.name)
                .field("symbol", &descriptor.symbol(*index))
                .finish(),
            Dynamic::Object(object) => f.debug_tuple("Object").field(&object.type_name()).finish(),
            Dynamic::List(v) => f.debug_tuple("List").field(v).finish(),
            Dynamic::Set(v) => f.debug_tuple("Set").field(v).finish(),
            Dynamic::Array(v) => f.debug_tuple("Array").field(v).finish(),
            Dynamic::Map(v) => f.debug_tuple("Map").field(v).finish(),
            Dynamic::Custom(_) => f.write_str("Custom(..)"),
            Dynamic::Plain(v) => f.debug_tuple("Plain").field(v).finish(),
        }
    }
}
