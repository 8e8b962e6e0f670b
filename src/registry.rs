//! Converter lookup.
//!
//! A [`ConverterRegistry`] holds the built-in converters followed by any
//! converters registered by the application. Lookup walks the built-ins first
//! and then the custom converters in registration order; the first converter
//! whose [`supports`](Converter::supports) returns `true` handles the value.
//!
//! Converters can be registered on a registry directly, or submitted once at
//! link time with [`submit_converter!`](crate::submit_converter) and picked up
//! by [`ConverterRegistry::with_submitted`].
use std::fmt::Display;

use tracing::debug;

use crate::{
    converter::{self, Converter},
    error::{ConvertError, Error},
    value::{Dynamic, Plain, TypeTag},
};

pub struct ConverterRegistry {
    builtin: Vec<Box<dyn Converter>>,
    custom: Vec<Box<dyn Converter>>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.converter_names()).finish()
    }
}

impl ConverterRegistry {
    /// A registry with only the built-in converters.
    pub fn new() -> Self {
        Self {
            builtin: converter::builtins(),
            custom: Vec::new(),
        }
    }

    /// A registry with the built-in converters and every converter submitted
    /// with [`submit_converter!`](crate::submit_converter).
    ///
    /// Submitted converters whose name collides with one already present are
    /// skipped.
    pub fn with_submitted() -> Self {
        let mut registry = Self::new();
        for submitted in inventory::iter::<SubmittedConverter> {
            if let Err(err) = registry.register_boxed((submitted.create)()) {
                debug!(%err, "skipping submitted converter");
            }
        }
        registry
    }

    /// Registers a converter built with its `Default` impl.
    pub fn register<C>(&mut self) -> Result<&mut Self, Error>
    where
        C: Converter + Default + 'static,
    {
        self.register_boxed(Box::new(C::default()))
    }

    /// Registers a converter produced by a fallible factory.
    ///
    /// A factory error is reported as [`Error::Registration`] naming the
    /// converter type.
    pub fn try_register<C, E, F>(&mut self, factory: F) -> Result<&mut Self, Error>
    where
        C: Converter + 'static,
        E: Display,
        F: FnOnce() -> Result<C, E>,
    {
        let converter = factory().map_err(|err| Error::Registration {
            converter: std::any::type_name::<C>().to_string(),
            reason: err.to_string(),
        })?;
        self.register_boxed(Box::new(converter))
    }

    pub fn register_boxed(&mut self, converter: Box<dyn Converter>) -> Result<&mut Self, Error> {
        let name = converter.name().to_string();
        if self.converters().any(|c| c.name() == name) {
            return Err(Error::Registration {
                converter: name,
                reason: "a converter with this name is already registered".to_string(),
            });
        }

        debug!(converter = %name, "registered converter");
        self.custom.push(converter);
        Ok(self)
    }

    fn converters(&self) -> impl Iterator<Item = &dyn Converter> {
        self.builtin
            .iter()
            .chain(self.custom.iter())
            .map(|c| c.as_ref())
    }

    /// Returns the converter that handles `ty`, if any.
    pub fn find(&self, ty: &TypeTag) -> Option<&dyn Converter> {
        self.converters().find(|c| c.supports(ty))
    }

    /// Names of all converters in lookup order.
    pub fn converter_names(&self) -> Vec<&str> {
        self.converters().map(|c| c.name()).collect()
    }

    /// Converts a host value to its plain form.
    ///
    /// Null stays null without consulting any converter, and raw plain values
    /// pass through when no converter claims the type.
    pub fn to_plain(&self, ty: &TypeTag, value: Dynamic) -> Result<Plain, ConvertError> {
        if value.is_null() {
            return Ok(Plain::Null);
        }
        match (self.find(ty), value) {
            (Some(converter), value) => converter.to_plain(ty, value, self),
            (None, Dynamic::Plain(plain)) => Ok(plain),
            (None, _) => Err(ConvertError::Unsupported(ty.to_string())),
        }
    }

    /// Converts a plain value back to a host value of type `ty`.
    pub fn from_plain(&self, ty: &TypeTag, plain: Plain) -> Result<Dynamic, ConvertError> {
        if plain.is_null() {
            return Ok(Dynamic::Null);
        }
        match self.find(ty) {
            Some(converter) => converter.from_plain(ty, plain, self),
            None if *ty == TypeTag::Any => Ok(Dynamic::Plain(plain)),
            None => Err(ConvertError::Unsupported(ty.to_string())),
        }
    }
}

/// A converter submitted at link time with
/// [`submit_converter!`](crate::submit_converter).
pub struct SubmittedConverter {
    pub create: fn() -> Box<dyn Converter>,
}

impl SubmittedConverter {
    pub const fn new<C: Converter + Default + 'static>() -> Self {
        Self {
            create: || Box::new(C::default()),
        }
    }
}

inventory::collect!(SubmittedConverter);

/// Submits a converter type so every registry built with
/// [`ConverterRegistry::with_submitted`] includes it.
#[macro_export]
macro_rules! submit_converter {
    ($converter_type:ty) => {
        $crate::inventory::submit! {
            $crate::registry::SubmittedConverter::new::<$converter_type>()
        }
    };
}
