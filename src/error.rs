use std::path::PathBuf;

use thiserror::Error;

use crate::document::DocumentOptionsBuilderError;

/// Errors raised by the document lifecycle (`init`, `load`, `save`, `reload`)
/// and by converter registration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("could not render document: {0}")]
    Render(#[source] serde_yaml::Error),

    /// A single member failed to convert.
    ///
    /// `member` is the Rust member name and `path` the dotted document path it
    /// maps to, so an operator can find the offending line in the file.
    #[error("member `{member}` at `{path}`: {source}")]
    Member {
        member: String,
        path: String,
        #[source]
        source: ConvertError,
    },

    /// A converter could not be added to a [`ConverterRegistry`](crate::ConverterRegistry).
    #[error("converter `{converter}` rejected: {reason}")]
    Registration { converter: String, reason: String },

    #[error("invalid path `{0}`")]
    InvalidPath(String),

    /// `save`, `load` or `init` was called before a backing file was set.
    ///
    /// Use [`Document::save_to`](crate::Document::save_to),
    /// [`Document::load_from`](crate::Document::load_from) or
    /// [`Document::init_at`](crate::Document::init_at), or set
    /// `file` in [`DocumentOptions`](crate::DocumentOptions).
    #[error("no backing file configured")]
    NoBackingFile,

    #[error("options: {0}")]
    Options(#[from] DocumentOptionsBuilderError),
}

impl Error {
    pub(crate) fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while converting one value between its host representation
/// and its plain tree representation.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("no converter supports `{0}`")]
    Unsupported(String),

    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: String,
        found: String,
    },

    #[error("{value} does not fit in {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("unknown symbol `{symbol}` for {enum_name}")]
    UnknownSymbol { symbol: String, enum_name: String },

    #[error("cannot use key `{key}` as {target}")]
    KeyCoercion { key: String, target: String },

    #[error("expected {expected} elements, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("in `{path}`: {source}")]
    Nested {
        path: String,
        #[source]
        source: Box<ConvertError>,
    },

    #[error("{0}")]
    Custom(String),
}

impl ConvertError {
    pub fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        ConvertError::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn custom(message: impl std::fmt::Display) -> Self {
        ConvertError::Custom(message.to_string())
    }

    pub(crate) fn nested(path: &str, source: ConvertError) -> Self {
        ConvertError::Nested {
            path: path.to_string(),
            source: Box::new(source),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
