//! In-memory archive library for tests.
//!
//! Everything runs synchronously: callbacks fire inside the call that
//! triggers them, which is stricter than the browser where they arrive on
//! later ticks. Writes are driven step by step with
//! [`MockLibrary::begin_write`] and [`MockLibrary::complete_write`].

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use super::error::ArchiveError;
use super::library::{
    Archive, ArchiveLibrary, Callback, DroppedFile, Host, ImportEvent, ImportListener,
    ImportOptions, OnceCallback, ProgressSource, QueuedFile, ReadStream, SourceFile, Swarm,
};
use crate::models::{ArchiveKey, Entry, KEY_LEN, Route, normalize_name};

// ============================================================================
// Files
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct MockFile {
    name: String,
    data: Vec<u8>,
    full_path: Option<String>,
}

impl MockFile {
    pub fn new(name: &str, data: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            data: data.to_vec(),
            full_path: None,
        }
    }

    pub fn with_path(mut self, full_path: &str) -> Self {
        self.full_path = Some(full_path.to_string());
        self
    }
}

impl DroppedFile for MockFile {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn full_path(&self) -> Option<String> {
        self.full_path.clone()
    }
}

// ============================================================================
// Archive
// ============================================================================

type ListListener = Rc<dyn Fn(Result<Entry, ArchiveError>)>;

#[derive(Default)]
struct ArchiveInner {
    owner: bool,
    contents: RefCell<Vec<(String, Vec<u8>)>>,
    list_listeners: RefCell<Vec<(u64, ListListener)>>,
    next_listing: Cell<u64>,
    upload_listeners: RefCell<Vec<Rc<dyn Fn(u64)>>>,
    download_listeners: RefCell<Vec<Rc<dyn Fn(u64)>>>,
}

#[derive(Clone)]
pub struct MockArchive {
    key: ArchiveKey,
    inner: Rc<ArchiveInner>,
}

impl MockArchive {
    fn new(key: ArchiveKey, owner: bool) -> Self {
        Self {
            key,
            inner: Rc::new(ArchiveInner {
                owner,
                ..Default::default()
            }),
        }
    }

    fn write(&self, name: &str, data: Vec<u8>) {
        let name = normalize_name(name);
        let entry = Entry::file(&name, data.len() as u64);
        {
            let mut contents = self.inner.contents.borrow_mut();
            contents.retain(|(n, _)| n != &name);
            contents.push((name, data));
        }
        let listeners: Vec<ListListener> = self
            .inner
            .list_listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            listener(Ok(entry.clone()));
        }
    }

    fn entries(&self) -> Vec<Entry> {
        self.inner
            .contents
            .borrow()
            .iter()
            .map(|(name, data)| Entry::file(name, data.len() as u64))
            .collect()
    }

    fn emit(listeners: &RefCell<Vec<Rc<dyn Fn(u64)>>>, bytes: u64) {
        let listeners = listeners.borrow().clone();
        for listener in listeners {
            listener(bytes);
        }
    }
}

impl Archive for MockArchive {
    type Stream = MockStream;
    type Listing = MockListing;

    fn key(&self) -> Result<ArchiveKey, ArchiveError> {
        Ok(self.key.clone())
    }

    fn is_owner(&self) -> bool {
        self.inner.owner
    }

    fn open(&self, on_ready: OnceCallback<Result<(), ArchiveError>>) {
        on_ready(Ok(()));
    }

    fn content_bytes(&self) -> Option<u64> {
        Some(
            self.inner
                .contents
                .borrow()
                .iter()
                .map(|(_, data)| data.len() as u64)
                .sum(),
        )
    }

    fn prime_content(&self, on_ready: OnceCallback<Option<u64>>) {
        on_ready(self.content_bytes());
    }

    fn on_upload(&self, on_bytes: Callback<u64>) {
        self.inner.upload_listeners.borrow_mut().push(Rc::from(on_bytes));
    }

    fn on_download(&self, on_bytes: Callback<u64>) {
        self.inner
            .download_listeners
            .borrow_mut()
            .push(Rc::from(on_bytes));
    }

    fn list_live(&self, on_entry: Callback<Result<Entry, ArchiveError>>) -> MockListing {
        let listener: ListListener = Rc::from(on_entry);
        let id = self.inner.next_listing.get();
        self.inner.next_listing.set(id + 1);
        self.inner
            .list_listeners
            .borrow_mut()
            .push((id, Rc::clone(&listener)));
        for entry in self.entries() {
            listener(Ok(entry));
        }
        MockListing {
            inner: Rc::clone(&self.inner),
            id,
        }
    }

    fn create_file_read_stream(&self, name: &str) -> Result<MockStream, ArchiveError> {
        self.inner
            .contents
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| MockStream(data.clone()))
            .ok_or_else(|| ArchiveError::Stream(format!("{} not found", name)))
    }
}

/// Removes its list listener when dropped.
pub struct MockListing {
    inner: Rc<ArchiveInner>,
    id: u64,
}

impl Drop for MockListing {
    fn drop(&mut self) {
        self.inner
            .list_listeners
            .borrow_mut()
            .retain(|(id, _)| *id != self.id);
    }
}

pub struct MockStream(Vec<u8>);

impl ReadStream for MockStream {
    fn read_to_end(self, done: OnceCallback<Result<Vec<u8>, ArchiveError>>) {
        done(Ok(self.0));
    }
}

// ============================================================================
// Swarm
// ============================================================================

#[derive(Default)]
struct SwarmInner {
    hubs: usize,
    connections: Cell<usize>,
    listeners: RefCell<Vec<Rc<dyn Fn(usize)>>>,
}

#[derive(Clone)]
pub struct MockSwarm(Rc<SwarmInner>);

impl MockSwarm {
    fn set_connections(&self, count: usize) {
        self.0.connections.set(count);
        let listeners = self.0.listeners.borrow().clone();
        for listener in listeners {
            listener(count);
        }
    }
}

impl Swarm for MockSwarm {
    fn connections(&self) -> usize {
        self.0.connections.get()
    }

    fn on_peers_changed(&self, on_count: Callback<usize>) {
        self.0.listeners.borrow_mut().push(Rc::from(on_count));
    }
}

// ============================================================================
// Progress
// ============================================================================

type ProgressListeners = Rc<RefCell<HashMap<String, Vec<(u64, Rc<dyn Fn(f64)>)>>>>;

/// Progress emitter of one queued file. New listeners immediately receive the
/// last reported percentage, if any.
#[derive(Clone)]
pub struct MockProgress {
    path: String,
    listeners: ProgressListeners,
    latest: Rc<RefCell<HashMap<String, f64>>>,
    next_id: Rc<Cell<u64>>,
}

impl ProgressSource for MockProgress {
    type Subscription = MockSubscription;

    fn subscribe(&self, on_progress: Callback<f64>) -> Option<MockSubscription> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let on_progress: Rc<dyn Fn(f64)> = Rc::from(on_progress);
        self.listeners
            .borrow_mut()
            .entry(self.path.clone())
            .or_default()
            .push((id, Rc::clone(&on_progress)));
        let latest = self.latest.borrow().get(&self.path).copied();
        if let Some(pct) = latest {
            on_progress(pct);
        }
        Some(MockSubscription {
            path: self.path.clone(),
            id,
            listeners: Rc::clone(&self.listeners),
        })
    }
}

/// Removes its listener when dropped.
pub struct MockSubscription {
    path: String,
    id: u64,
    listeners: ProgressListeners,
}

impl Drop for MockSubscription {
    fn drop(&mut self) {
        if let Some(list) = self.listeners.borrow_mut().get_mut(&self.path) {
            list.retain(|(id, _)| *id != self.id);
        }
    }
}

// ============================================================================
// Library
// ============================================================================

struct PendingImport {
    archive: MockArchive,
    cwd: String,
    queue: VecDeque<SourceFile<MockFile>>,
    writing: Option<SourceFile<MockFile>>,
    listener: ImportListener<MockProgress>,
}

#[derive(Default)]
struct LibraryInner {
    next_seed: Cell<u8>,
    archives: RefCell<HashMap<ArchiveKey, MockArchive>>,
    swarms: RefCell<HashMap<ArchiveKey, MockSwarm>>,
    imports: RefCell<HashMap<ArchiveKey, PendingImport>>,
    imported: RefCell<HashMap<ArchiveKey, Vec<String>>>,
    progress: ProgressListeners,
    latest_progress: Rc<RefCell<HashMap<String, f64>>>,
    next_listener_id: Rc<Cell<u64>>,
}

#[derive(Clone, Default)]
pub struct MockLibrary(Rc<LibraryInner>);

impl MockLibrary {
    pub fn new() -> Self {
        let library = Self::default();
        library.0.next_seed.set(1);
        library
    }

    fn archive(&self, key: &ArchiveKey) -> Option<MockArchive> {
        self.0.archives.borrow().get(key).cloned()
    }

    fn swarm(&self, key: &ArchiveKey) -> Option<MockSwarm> {
        self.0.swarms.borrow().get(key).cloned()
    }

    fn progress_source(&self, path: &str) -> MockProgress {
        MockProgress {
            path: path.to_string(),
            listeners: Rc::clone(&self.0.progress),
            latest: Rc::clone(&self.0.latest_progress),
            next_id: Rc::clone(&self.0.next_listener_id),
        }
    }

    /// Register an archive owned by some other peer, pre-filled with `files`.
    pub fn seed_remote_archive(&self, seed: u8, files: &[(&str, &str)]) -> ArchiveKey {
        let key = key_from_seed(seed.wrapping_add(128));
        let archive = MockArchive::new(key.clone(), false);
        for (name, data) in files {
            archive.write(name, data.as_bytes().to_vec());
        }
        self.0.archives.borrow_mut().insert(key.clone(), archive);
        key
    }

    /// Number of signalling hubs the swarm of `key` was joined with.
    pub fn swarm_hubs(&self, key: &ArchiveKey) -> Option<usize> {
        self.swarm(key).map(|s| s.0.hubs)
    }

    pub fn connect_peer(&self, key: &ArchiveKey) {
        if let Some(swarm) = self.swarm(key) {
            swarm.set_connections(swarm.0.connections.get() + 1);
        }
    }

    pub fn disconnect_peer(&self, key: &ArchiveKey) {
        if let Some(swarm) = self.swarm(key) {
            swarm.set_connections(swarm.0.connections.get().saturating_sub(1));
        }
    }

    pub fn emit_upload(&self, key: &ArchiveKey, bytes: u64) {
        if let Some(archive) = self.archive(key) {
            MockArchive::emit(&archive.inner.upload_listeners, bytes);
        }
    }

    pub fn emit_download(&self, key: &ArchiveKey, bytes: u64) {
        if let Some(archive) = self.archive(key) {
            MockArchive::emit(&archive.inner.download_listeners, bytes);
        }
    }

    pub fn list_listener_count(&self, key: &ArchiveKey) -> usize {
        self.archive(key)
            .map(|a| a.inner.list_listeners.borrow().len())
            .unwrap_or(0)
    }

    /// Paths handed to the import queue for `key`, in order.
    pub fn imported_paths(&self, key: &ArchiveKey) -> Vec<String> {
        self.0.imported.borrow().get(key).cloned().unwrap_or_default()
    }

    pub fn import_cwd(&self, key: &ArchiveKey) -> Option<String> {
        self.0.imports.borrow().get(key).map(|i| i.cwd.clone())
    }

    /// Start writing the next queued file of `key`. Returns false when idle.
    pub fn begin_write(&self, key: &ArchiveKey) -> bool {
        let (listener, descriptor) = {
            let mut imports = self.0.imports.borrow_mut();
            let Some(import) = imports.get_mut(key) else {
                return false;
            };
            let Some(next) = import.queue.pop_front() else {
                return false;
            };
            let descriptor = next.descriptor();
            import.writing = Some(next);
            (Rc::clone(&import.listener), descriptor)
        };
        listener(ImportEvent::WriteBegin(Ok(descriptor)));
        true
    }

    /// Finish the file currently writing into `key`.
    pub fn complete_write(&self, key: &ArchiveKey) {
        let (listener, archive, path, file, done) = {
            let mut imports = self.0.imports.borrow_mut();
            let Some(import) = imports.get_mut(key) else {
                return;
            };
            let Some(file) = import.writing.take() else {
                return;
            };
            let path = normalize_name(&format!("{}/{}", import.cwd, file.full_path));
            (
                Rc::clone(&import.listener),
                import.archive.clone(),
                path,
                file,
                import.queue.is_empty(),
            )
        };
        archive.write(&path, file.file.data.clone());
        listener(ImportEvent::WriteComplete(Ok(file.descriptor())));
        if done {
            listener(ImportEvent::CompleteAll);
        }
    }

    /// Abort the file currently writing into `key` with a library error.
    pub fn fail_write(&self, key: &ArchiveKey) {
        let listener = {
            let mut imports = self.0.imports.borrow_mut();
            let Some(import) = imports.get_mut(key) else {
                return;
            };
            if import.writing.take().is_none() {
                return;
            }
            Rc::clone(&import.listener)
        };
        listener(ImportEvent::WriteComplete(Err(ArchiveError::Library(
            "write failed".to_string(),
        ))));
    }

    pub fn emit_progress(&self, path: &str, pct: f64) {
        self.0
            .latest_progress
            .borrow_mut()
            .insert(path.to_string(), pct);
        let listeners: Vec<Rc<dyn Fn(f64)>> = self
            .0
            .progress
            .borrow()
            .get(path)
            .map(|l| l.iter().map(|(_, f)| Rc::clone(f)).collect())
            .unwrap_or_default();
        for listener in listeners {
            listener(pct);
        }
    }

    pub fn progress_listeners(&self, path: &str) -> usize {
        self.0.progress.borrow().get(path).map_or(0, Vec::len)
    }
}

fn key_from_seed(seed: u8) -> ArchiveKey {
    let mut bytes = [0u8; KEY_LEN];
    bytes[0] = seed;
    ArchiveKey::from_bytes(&bytes).expect("fixed-length key")
}

impl ArchiveLibrary for MockLibrary {
    type Archive = MockArchive;
    type Swarm = MockSwarm;
    type File = MockFile;
    type Progress = MockProgress;

    fn create_archive(&self) -> Result<MockArchive, ArchiveError> {
        let seed = self.0.next_seed.get();
        self.0.next_seed.set(seed.wrapping_add(1));
        let key = key_from_seed(seed);
        let archive = MockArchive::new(key.clone(), true);
        self.0.archives.borrow_mut().insert(key, archive.clone());
        Ok(archive)
    }

    fn open_archive(&self, key: &ArchiveKey) -> Result<MockArchive, ArchiveError> {
        let archive = self
            .archive(key)
            .unwrap_or_else(|| MockArchive::new(key.clone(), false));
        self.0
            .archives
            .borrow_mut()
            .insert(key.clone(), archive.clone());
        Ok(archive)
    }

    fn open_writable(
        &self,
        key: &ArchiveKey,
        _files: &[SourceFile<MockFile>],
    ) -> Result<MockArchive, ArchiveError> {
        self.open_archive(key)
    }

    fn join_swarm(
        &self,
        archive: &MockArchive,
        signalhubs: &[&str],
    ) -> Result<MockSwarm, ArchiveError> {
        let swarm = MockSwarm(Rc::new(SwarmInner {
            hubs: signalhubs.len(),
            ..Default::default()
        }));
        self.0
            .swarms
            .borrow_mut()
            .insert(archive.key.clone(), swarm.clone());
        Ok(swarm)
    }

    fn import_files(
        &self,
        archive: &MockArchive,
        files: Vec<SourceFile<MockFile>>,
        options: ImportOptions,
        listener: ImportListener<MockProgress>,
    ) -> Result<(), ArchiveError> {
        self.0
            .imported
            .borrow_mut()
            .entry(archive.key.clone())
            .or_default()
            .extend(files.iter().map(|f| f.full_path.clone()));

        let queued: Vec<QueuedFile<MockProgress>> = files
            .iter()
            .map(|f| QueuedFile {
                descriptor: f.descriptor(),
                progress: Some(self.progress_source(&f.full_path)),
            })
            .collect();

        self.0.imports.borrow_mut().insert(
            archive.key.clone(),
            PendingImport {
                archive: archive.clone(),
                cwd: options.cwd,
                queue: files.into(),
                writing: None,
                listener: Rc::clone(&listener),
            },
        );

        for file in queued {
            listener(ImportEvent::Queued(Ok(file)));
        }
        Ok(())
    }
}

// ============================================================================
// Host
// ============================================================================

#[derive(Default)]
struct HostInner {
    routes: RefCell<Vec<Route>>,
    alerts: RefCell<Vec<String>>,
}

#[derive(Clone, Default)]
pub struct MockHost(Rc<HostInner>);

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.0.routes.borrow().clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.0.alerts.borrow().clone()
    }
}

impl Host for MockHost {
    fn navigate(&self, route: &Route) {
        self.0.routes.borrow_mut().push(route.clone());
    }

    fn alert(&self, message: &str) {
        self.0.alerts.borrow_mut().push(message.to_string());
    }
}
