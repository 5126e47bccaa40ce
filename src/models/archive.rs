//! Archive identity and directory listing entries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::ArchiveError;

/// Length of an archive public key in bytes.
pub const KEY_LEN: usize = 32;

/// Scheme prefix accepted when pasting archive links.
const LINK_SCHEME: &str = "dat://";

/// Public key identifying an archive.
///
/// Always stored as 64 lowercase hex characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArchiveKey(String);

impl ArchiveKey {
    /// Parse a key from user input, a URL path segment or a `dat://` link.
    pub fn parse(input: &str) -> Result<Self, ArchiveError> {
        let trimmed = input.trim();
        let stripped = trimmed
            .strip_prefix(LINK_SCHEME)
            .unwrap_or(trimmed)
            .trim_matches('/');

        let bytes = hex::decode(stripped).map_err(|_| ArchiveError::InvalidKey(input.to_string()))?;
        if bytes.len() != KEY_LEN {
            return Err(ArchiveError::InvalidKey(input.to_string()));
        }
        Ok(Self(hex::encode(bytes)))
    }

    /// Build a key from raw key bytes (as handed out by the library).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArchiveError> {
        if bytes.len() != KEY_LEN {
            return Err(ArchiveError::InvalidKey(hex::encode(bytes)));
        }
        Ok(Self(hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for narrow displays (`abcdef…123456`).
    pub fn short(&self) -> String {
        format!("{}…{}", &self.0[..6], &self.0[self.0.len() - 6..])
    }

    /// Shareable `dat://` link.
    pub fn link(&self) -> String {
        format!("{}{}", LINK_SCHEME, self.0)
    }
}

impl fmt::Display for ArchiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of a listing entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    File,
    Directory,
    /// Symlinks and anything else the library may list.
    #[serde(other)]
    Other,
}

/// A directory listing entry as emitted by the archive's live list stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: EntryKind,
    #[serde(default)]
    pub length: u64,
    /// Modification time in milliseconds since the Unix epoch.
    #[serde(default)]
    pub mtime: Option<u64>,
}

impl Entry {
    pub fn file(name: &str, length: u64) -> Self {
        Self {
            name: normalize_name(name),
            kind: EntryKind::File,
            length,
            mtime: None,
        }
    }

    /// Placeholder for a directory that only exists implicitly as a parent.
    pub fn directory(name: &str) -> Self {
        Self {
            name: normalize_name(name),
            kind: EntryKind::Directory,
            length: 0,
            mtime: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Last path component.
    pub fn base_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Normalize an archive path to `/a/b` form (leading slash, no trailing slash).
pub fn normalize_name(name: &str) -> String {
    let parts: Vec<&str> = name.split('/').filter(|p| !p.is_empty() && *p != ".").collect();
    format!("/{}", parts.join("/"))
}

/// Parent directory of a normalized archive path. The root is its own parent.
pub fn parent_dir(name: &str) -> &str {
    match name.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &name[..idx],
    }
}
