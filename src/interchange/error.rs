//! Error types for interchange operations.

use thiserror::Error;

use crate::document::HostError;

use super::model::EntryId;

/// Errors that can occur during capture, encoding, decoding and
/// reconstruction.
#[derive(Debug, Error)]
pub enum InterchangeError {
    /// Text cannot be interpreted as interchange data (whole document or a
    /// single entry).
    #[error("malformed {format} interchange: {message}")]
    Malformed {
        format: &'static str,
        message: String,
    },

    /// Entry tag outside the recognized set.
    #[error("malformed interchange: unrecognized entry kind `{tag}`")]
    UnknownEntry { tag: String },

    /// Entry parsed but violates a structural invariant.
    #[error("InvalidGeometry: {field} ({message})")]
    InvalidGeometry {
        field: &'static str,
        message: String,
    },

    /// IO error during read/write.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The user aborted the object selection.
    #[error("selection cancelled")]
    SelectionCancelled,

    /// A selected object does not exist in the document.
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// A cancellation token was signalled mid-operation.
    #[error("operation cancelled")]
    Cancelled,

    /// The host refused to add reconstructed geometry.
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// Unsupported feature or format variant.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl InterchangeError {
    /// Create an XML error.
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Malformed {
            format: "XML",
            message: message.into(),
        }
    }

    /// Create a JSON error.
    pub fn json(message: impl Into<String>) -> Self {
        Self::Malformed {
            format: "JSON",
            message: message.into(),
        }
    }

    /// Create an invalid geometry error for `field`.
    pub fn invalid_geometry(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            field,
            message: message.into(),
        }
    }

    /// Whether this error belongs to the MalformedInterchange class.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. } | Self::UnknownEntry { .. })
    }

    /// The offending field, for `InvalidGeometry` errors.
    pub fn invalid_field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidGeometry { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// A problem scoped to a single entry.
///
/// Decoders collect these for entries they drop; the reconstructor collects
/// them for entries it could not add.
#[derive(Debug)]
pub struct EntryFailure {
    /// Position of the entry in its container.
    pub index: usize,
    /// Entry id, when it could be read.
    pub id: Option<EntryId>,
    pub error: InterchangeError,
}

impl std::fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.id {
            Some(id) => write!(f, "entry {} ({id}): {}", self.index, self.error),
            None => write!(f, "entry {}: {}", self.index, self.error),
        }
    }
}
