//! Data models and types for the application.
//!
//! Contains domain types for:
//! - [`ArchiveKey`], [`Entry`], `EntryTree` - Archive identity and listing
//! - `ImportQueue`, [`FileDescriptor`], [`QueueEvent`] - Import progress bookkeeping
//! - [`ArchiveState`], [`ArchiveMsg`] - The store mirrored from library events
//! - [`Route`] - Path-based navigation

mod archive;
mod entries;
mod import_queue;
mod route;
mod state;

pub use archive::{ArchiveKey, Entry, EntryKind, KEY_LEN, normalize_name};
pub use import_queue::{FileDescriptor, QueueEvent};
pub use route::Route;
pub use state::{ArchiveMsg, ArchiveState};
