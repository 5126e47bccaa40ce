//! Archive view state and the messages that mutate it.
//!
//! The state mirrors what the archive library reports; it is never the source
//! of truth. Every library callback is turned into an [`ArchiveMsg`] and folded
//! in with [`ArchiveState::apply`].

use super::archive::{ArchiveKey, Entry, normalize_name};
use super::entries::EntryTree;
use super::import_queue::{ImportQueue, QueueEvent};

#[derive(Clone, Debug, PartialEq)]
pub enum ArchiveMsg {
    /// A fresh archive was created locally.
    Created { key: ArchiveKey },
    /// An existing archive is being opened by key.
    Opened { key: ArchiveKey },
    /// Drop the current listing before a reload.
    EntriesReset,
    /// A listing entry arrived from the live list stream.
    EntryListed(Entry),
    /// Current number of connected peers.
    PeersChanged(usize),
    /// Bytes uploaded to peers since the last report.
    Uploaded(u64),
    /// Bytes downloaded from peers since the last report.
    Downloaded(u64),
    /// Byte size of the archive content feed.
    SizeChanged(u64),
    /// Directory shown in the file list.
    DirChanged(String),
    Queue(QueueEvent),
    Failed(String),
    /// Navigated away from the archive.
    Closed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArchiveState {
    pub key: Option<ArchiveKey>,
    pub entries: EntryTree,
    pub num_peers: usize,
    pub size: Option<u64>,
    pub uploaded: u64,
    pub downloaded: u64,
    pub error: Option<String>,
    pub cwd: String,
    pub import_queue: ImportQueue,
}

impl Default for ArchiveState {
    fn default() -> Self {
        Self {
            key: None,
            entries: EntryTree::new(),
            num_peers: 0,
            size: None,
            uploaded: 0,
            downloaded: 0,
            error: None,
            cwd: "/".to_string(),
            import_queue: ImportQueue::new(),
        }
    }
}

impl ArchiveState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, msg: ArchiveMsg) {
        match msg {
            ArchiveMsg::Created { key } | ArchiveMsg::Opened { key } => {
                if self.key.as_ref() != Some(&key) {
                    *self = Self {
                        key: Some(key),
                        ..Self::default()
                    };
                }
            }
            ArchiveMsg::EntriesReset => {
                self.entries.clear();
                self.size = None;
            }
            ArchiveMsg::EntryListed(entry) => self.entries.insert(entry),
            ArchiveMsg::PeersChanged(n) => self.num_peers = n,
            ArchiveMsg::Uploaded(n) => self.uploaded = self.uploaded.saturating_add(n),
            ArchiveMsg::Downloaded(n) => self.downloaded = self.downloaded.saturating_add(n),
            ArchiveMsg::SizeChanged(n) => self.size = Some(n),
            ArchiveMsg::DirChanged(dir) => self.cwd = normalize_name(&dir),
            ArchiveMsg::Queue(event) => self.import_queue.apply(event),
            ArchiveMsg::Failed(error) => self.error = Some(error),
            ArchiveMsg::Closed => *self = Self::default(),
        }
    }

    /// Entries of the current directory.
    pub fn cwd_entries(&self) -> Vec<Entry> {
        self.entries.children(&self.cwd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileDescriptor;

    fn key(byte: u8) -> ArchiveKey {
        ArchiveKey::from_bytes(&[byte; 32]).unwrap()
    }

    #[test]
    fn test_open_resets_state_for_other_key() {
        let mut state = ArchiveState::new();
        state.apply(ArchiveMsg::Created { key: key(1) });
        state.apply(ArchiveMsg::PeersChanged(3));
        state.apply(ArchiveMsg::EntryListed(Entry::file("/a", 1)));

        // Same key keeps everything.
        state.apply(ArchiveMsg::Opened { key: key(1) });
        assert_eq!(state.num_peers, 3);
        assert_eq!(state.entries.len(), 1);

        state.apply(ArchiveMsg::Opened { key: key(2) });
        assert_eq!(state.key, Some(key(2)));
        assert_eq!(state.num_peers, 0);
        assert!(state.entries.is_empty());
    }

    #[test]
    fn test_transfer_counters_accumulate() {
        let mut state = ArchiveState::new();
        state.apply(ArchiveMsg::Uploaded(10));
        state.apply(ArchiveMsg::Uploaded(5));
        state.apply(ArchiveMsg::Downloaded(7));
        state.apply(ArchiveMsg::Downloaded(u64::MAX));
        assert_eq!(state.uploaded, 15);
        assert_eq!(state.downloaded, u64::MAX);
    }

    #[test]
    fn test_entries_reset_and_listing() {
        let mut state = ArchiveState::new();
        state.apply(ArchiveMsg::EntryListed(Entry::file("/docs/a.md", 3)));
        state.apply(ArchiveMsg::SizeChanged(3));
        state.apply(ArchiveMsg::DirChanged("docs".to_string()));
        assert_eq!(state.cwd, "/docs");
        assert_eq!(state.cwd_entries().len(), 1);

        state.apply(ArchiveMsg::EntriesReset);
        assert!(state.entries.is_empty());
        assert_eq!(state.size, None);
    }

    #[test]
    fn test_queue_events_reach_import_queue() {
        let mut state = ArchiveState::new();
        state.apply(ArchiveMsg::Queue(QueueEvent::QueueNewFile(FileDescriptor::new(
            "/a", None,
        ))));
        state.apply(ArchiveMsg::Queue(QueueEvent::FileWriteBegin));
        assert_eq!(
            state.import_queue.writing.as_ref().map(|f| f.full_path.as_str()),
            Some("/a")
        );
    }

    #[test]
    fn test_closed_returns_to_default() {
        let mut state = ArchiveState::new();
        state.apply(ArchiveMsg::Created { key: key(9) });
        state.apply(ArchiveMsg::Failed("boom".to_string()));
        state.apply(ArchiveMsg::Closed);
        assert_eq!(state, ArchiveState::default());
    }
}
