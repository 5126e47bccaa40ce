//! Error types for archive operations.
//!
//! Only [`ArchiveError::NotOwner`] is ever shown to the user directly; every
//! other variant ends up in the console log.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArchiveError {
    /// Browser window not available
    #[error("Browser window not available")]
    NoWindow,
    /// The `window.dat` bundle was not loaded
    #[error("Archive library not loaded")]
    LibraryUnavailable,
    #[error("Invalid archive key: {0}")]
    InvalidKey(String),
    /// Write attempted on an archive owned by another peer
    #[error("You can not put files in this archive")]
    NotOwner,
    #[error("No archive is open")]
    NoArchive,
    /// A call into the archive library failed or returned something unexpected
    #[error("Archive library error: {0}")]
    Library(String),
    #[error("Stream error: {0}")]
    Stream(String),
    /// A listing entry could not be decoded
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_owner_message_is_user_facing() {
        assert_eq!(
            ArchiveError::NotOwner.to_string(),
            "You can not put files in this archive"
        );
    }

    #[test]
    fn test_messages_carry_detail() {
        assert_eq!(
            ArchiveError::InvalidKey("xyz".to_string()).to_string(),
            "Invalid archive key: xyz"
        );
        assert_eq!(
            ArchiveError::Library("open failed".to_string()).to_string(),
            "Archive library error: open failed"
        );
    }
}
