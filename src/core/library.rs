//! Seam between the controller and the external archive library.
//!
//! The browser build talks to the JavaScript bundle through
//! [`DatLibrary`](super::dat::DatLibrary); tests use the mock in
//! [`mock`](super::mock). Callbacks are plain boxed closures because the
//! library is callback-driven and everything runs on the browser event loop.

use std::rc::Rc;

use super::error::ArchiveError;
use crate::models::{ArchiveKey, Entry, FileDescriptor, Route};

/// Repeating callback.
pub type Callback<T> = Box<dyn Fn(T)>;

/// One-shot callback.
pub type OnceCallback<T> = Box<dyn FnOnce(T)>;

/// A file handed to us by drag-and-drop or the file picker.
pub trait DroppedFile: Clone + 'static {
    fn name(&self) -> String;
    fn size(&self) -> u64;
    /// Path inside a dropped directory, when the browser supplied one.
    fn full_path(&self) -> Option<String> {
        None
    }
}

/// A dropped file paired with its destination path in the archive.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceFile<F> {
    pub full_path: String,
    pub file: F,
}

impl<F: DroppedFile> SourceFile<F> {
    pub fn descriptor(&self) -> FileDescriptor {
        FileDescriptor::new(&self.full_path, Some(self.file.size()))
    }
}

/// Options passed through to the import-queue helper.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportOptions {
    /// Archive directory the files are written into.
    pub cwd: String,
    /// Minimum interval between progress reports.
    pub progress_interval_ms: u32,
}

/// A file reported by the import-queue helper.
pub struct QueuedFile<P> {
    pub descriptor: FileDescriptor,
    /// Handle used to attach a progress listener once the file is writing.
    pub progress: Option<P>,
}

/// Lifecycle notifications from the import-queue helper.
pub enum ImportEvent<P> {
    Queued(Result<QueuedFile<P>, ArchiveError>),
    WriteBegin(Result<FileDescriptor, ArchiveError>),
    WriteComplete(Result<FileDescriptor, ArchiveError>),
    CompleteAll,
}

pub type ImportListener<P> = Rc<dyn Fn(ImportEvent<P>)>;

/// Something a progress listener can be attached to.
pub trait ProgressSource: 'static {
    /// Guard owning the listener; dropping it removes the listener.
    type Subscription;

    /// Attach `on_progress` (percentage, 0..=100). Returns `None` when the
    /// file has no progress emitter yet.
    fn subscribe(&self, on_progress: Callback<f64>) -> Option<Self::Subscription>;
}

/// Readable stream of a single archive entry.
pub trait ReadStream: 'static {
    /// Drain the stream, then call `done` with the collected bytes.
    fn read_to_end(self, done: OnceCallback<Result<Vec<u8>, ArchiveError>>);
}

/// An opened archive. Cloning yields another handle to the same archive.
pub trait Archive: Clone + 'static {
    type Stream: ReadStream;
    /// Live listing handle; dropping it stops the listing.
    type Listing;

    fn key(&self) -> Result<ArchiveKey, ArchiveError>;

    /// Whether the local peer holds the secret key. Only meaningful after `open`.
    fn is_owner(&self) -> bool;

    fn open(&self, on_ready: OnceCallback<Result<(), ArchiveError>>);

    /// Bytes in the content feed, if the content feed exists yet.
    fn content_bytes(&self) -> Option<u64>;

    /// Fetch the first content block so `content_bytes` reflects remote data.
    fn prime_content(&self, on_ready: OnceCallback<Option<u64>>);

    fn on_upload(&self, on_bytes: Callback<u64>);

    fn on_download(&self, on_bytes: Callback<u64>);

    /// Subscribe to the live directory listing. Existing entries are reported
    /// first, then entries as they are written.
    fn list_live(&self, on_entry: Callback<Result<Entry, ArchiveError>>) -> Self::Listing;

    fn create_file_read_stream(&self, name: &str) -> Result<Self::Stream, ArchiveError>;
}

/// Peer discovery for one archive.
pub trait Swarm: 'static {
    /// Number of open peer connections.
    fn connections(&self) -> usize;

    /// Called with the current connection count whenever a peer connects or
    /// disconnects.
    fn on_peers_changed(&self, on_count: Callback<usize>);
}

pub trait ArchiveLibrary: 'static {
    type Archive: Archive;
    type Swarm: Swarm;
    type File: DroppedFile;
    type Progress: ProgressSource;

    /// Create a new live, sparse, memory-backed archive.
    fn create_archive(&self) -> Result<Self::Archive, ArchiveError>;

    fn open_archive(&self, key: &ArchiveKey) -> Result<Self::Archive, ArchiveError>;

    /// Open `key` with storage that reads file content from `files` by name.
    fn open_writable(
        &self,
        key: &ArchiveKey,
        files: &[SourceFile<Self::File>],
    ) -> Result<Self::Archive, ArchiveError>;

    fn join_swarm(
        &self,
        archive: &Self::Archive,
        signalhubs: &[&str],
    ) -> Result<Self::Swarm, ArchiveError>;

    /// Hand files to the import-queue helper.
    fn import_files(
        &self,
        archive: &Self::Archive,
        files: Vec<SourceFile<Self::File>>,
        options: ImportOptions,
        listener: ImportListener<Self::Progress>,
    ) -> Result<(), ArchiveError>;
}

/// Browser services the controller needs besides the library.
pub trait Host: 'static {
    /// Reflect `route` in the address bar.
    fn navigate(&self, route: &Route);
    /// Blocking user-facing message.
    fn alert(&self, message: &str);
}

/// Pair each file with its archive path (`/` + name unless the browser
/// supplied a directory path), preserving input order.
pub fn normalize_files<F: DroppedFile>(files: Vec<F>) -> Vec<SourceFile<F>> {
    files
        .into_iter()
        .map(|file| {
            let full_path = file
                .full_path()
                .filter(|p| !p.trim_matches('/').is_empty())
                .unwrap_or_else(|| format!("/{}", file.name()));
            SourceFile {
                full_path: crate::models::normalize_name(&full_path),
                file,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Fake(&'static str, Option<&'static str>);

    impl DroppedFile for Fake {
        fn name(&self) -> String {
            self.0.to_string()
        }
        fn size(&self) -> u64 {
            self.0.len() as u64
        }
        fn full_path(&self) -> Option<String> {
            self.1.map(str::to_string)
        }
    }

    #[test]
    fn test_normalize_files_prefixes_names() {
        let files = normalize_files(vec![
            Fake("b.txt", None),
            Fake("a.txt", Some("/album/a.txt")),
            Fake("c.txt", Some("")),
        ]);
        let paths: Vec<&str> = files.iter().map(|f| f.full_path.as_str()).collect();
        assert_eq!(paths, vec!["/b.txt", "/album/a.txt", "/c.txt"]);
        assert_eq!(files[0].descriptor().size, Some(5));
        assert_eq!(files[1].descriptor().name, "a.txt");
    }
}
