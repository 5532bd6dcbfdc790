use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while resolving a manifest and generating its icons.
///
/// Every variant is terminal: a failing [`crate::generate`] call returns no icons.
#[derive(Debug, Error)]
pub enum IconifyError {
    /// The caller passed options that cannot be honoured (e.g. an unknown resize mode).
    #[error("{0}")]
    InvalidOptions(String),

    #[error("failed to read manifest {}: {source}", .path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest {}: {source}", .path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("The icon size {size} is not a positive integer")]
    InvalidSize { size: String },

    #[error("The icon size {size} exceeds the maximum of {max}")]
    SizeTooLarge { size: u32, max: u32 },

    #[error("The path \"{path}\" is not a string")]
    InvalidPath { path: String },

    /// `size` is the later declaration, `existing_size` the one accepted first.
    #[error(
        "The manifest contains icons with sizes {size} and {existing_size} from the same path {path}"
    )]
    Conflict {
        path: String,
        size: u32,
        existing_size: u32,
    },

    #[error("failed to read icon {}: {source}", .path.display())]
    IconRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode icon: {source}")]
    IconDecode {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("The icon has size {width}x{height} which is not square")]
    NotSquare { width: u32, height: u32 },

    #[error("Unsupported image format for output path {}", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("The icon size {size} exceeds the {max} px limit of the format of {}", .path.display())]
    SizeNotEncodable { path: PathBuf, size: u32, max: u32 },

    #[error("failed to encode {}: {source}", .path.display())]
    IconEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write {}: {source}", .path.display())]
    IconWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Payload-free discriminant of [`IconifyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidOptions,
    ManifestRead,
    ManifestParse,
    InvalidSize,
    InvalidPath,
    Conflict,
    IconRead,
    IconDecode,
    UnsupportedFormat,
    IconEncode,
    IconWrite,
}

impl IconifyError {
    /// The kind of failure, for callers that branch on error identity.
    ///
    /// A non-square master reports [`ErrorKind::IconDecode`]: it is a master that
    /// could not be accepted as an icon.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidOptions(_) => ErrorKind::InvalidOptions,
            Self::ManifestRead { .. } => ErrorKind::ManifestRead,
            Self::ManifestParse { .. } => ErrorKind::ManifestParse,
            Self::InvalidSize { .. } | Self::SizeTooLarge { .. } => ErrorKind::InvalidSize,
            Self::InvalidPath { .. } => ErrorKind::InvalidPath,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::IconRead { .. } => ErrorKind::IconRead,
            Self::IconDecode { .. } | Self::NotSquare { .. } => ErrorKind::IconDecode,
            Self::UnsupportedFormat { .. } | Self::SizeNotEncodable { .. } => {
                ErrorKind::UnsupportedFormat
            }
            Self::IconEncode { .. } => ErrorKind::IconEncode,
            Self::IconWrite { .. } => ErrorKind::IconWrite,
        }
    }
}

pub type Result<T> = std::result::Result<T, IconifyError>;
