use thiserror::Error;

use super::SIGNATURE_LEN;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Failed to open {path}: {source}")]
    StreamOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a savegame: signature {found:?} does not match")]
    FormatMismatch { found: [u8; SIGNATURE_LEN] },

    #[error("Unsupported savegame version {found} (supported: {min}..={max})")]
    UnsupportedVersion { found: u16, min: u16, max: u16 },

    #[error("Unexpected end of data while reading {what}")]
    Truncated { what: &'static str },

    #[error("Unknown {field} tag: {value}")]
    UnknownVariant { field: &'static str, value: u8 },

    #[error("World state rejected: {0}")]
    DelegateFailure(String),

    #[error("Malformed data: {0}")]
    Malformed(String),

    #[error("Invalid save slot: {slot}")]
    InvalidSlot { slot: u8 },

    #[error("Save slot {slot} is empty")]
    SlotEmpty { slot: u8 },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SaveError {
    pub fn truncated(what: &'static str) -> Self {
        SaveError::Truncated { what }
    }

    /// Maps a read-side io error, turning short reads into `Truncated`.
    pub fn from_read(err: std::io::Error, what: &'static str) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            SaveError::Truncated { what }
        } else {
            SaveError::Io(err)
        }
    }

    pub fn is_recoverable(&self) -> bool {
        match self {
            SaveError::Io(_) => true,
            SaveError::StreamOpen { .. } => true,
            SaveError::SlotEmpty { .. } => true,
            SaveError::UnsupportedVersion { .. } => true, // Caller may upgrade
            SaveError::InvalidSlot { .. } => false,
            SaveError::FormatMismatch { .. } => false,
            SaveError::Truncated { .. } => false,
            _ => false,
        }
    }
}

pub type SaveResult<T> = Result<T, SaveError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_short_read_maps_to_truncated() {
        let err = SaveError::from_read(Error::from(ErrorKind::UnexpectedEof), "roster");
        assert!(matches!(err, SaveError::Truncated { what: "roster" }));

        let err = SaveError::from_read(Error::from(ErrorKind::PermissionDenied), "roster");
        assert!(matches!(err, SaveError::Io(_)));
    }

    #[test]
    fn test_error_messages_carry_detail() {
        let err = SaveError::UnknownVariant { field: "pact type", value: 7 };
        assert_eq!(err.to_string(), "Unknown pact type tag: 7");

        let err = SaveError::UnsupportedVersion { found: 9, min: 4, max: 4 };
        assert!(err.to_string().contains("9"));
        assert!(err.is_recoverable());
        assert!(!SaveError::truncated("header").is_recoverable());
    }
}
