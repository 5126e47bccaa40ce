//! Archive operations driven by the UI.
//!
//! [`ArchiveController`] owns the opened archive and its swarm, translates UI
//! actions into library calls and turns library callbacks into
//! [`ArchiveMsg`]s. It never holds a `RefCell` borrow across a library call,
//! so callbacks fired synchronously by the library are safe.
//!
//! Every open or created archive starts a session with a new generation
//! number. Listing, size and import callbacks carry the generation they were
//! registered under and go quiet once it is no longer current.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use leptos::logging::{error, log, warn};

use super::error::ArchiveError;
use super::library::{
    Archive, ArchiveLibrary, Host, ImportEvent, ImportListener, ImportOptions, ProgressSource,
    QueuedFile, Swarm, normalize_files,
};
use crate::config::{PROGRESS_INTERVAL_MS, SIGNALHUBS};
use crate::models::{ArchiveKey, ArchiveMsg, QueueEvent, Route, normalize_name};

/// Sink for state updates.
pub type Dispatch = Rc<dyn Fn(ArchiveMsg)>;

/// Files to write into an archive.
pub struct ImportRequest<F> {
    pub files: Vec<F>,
    /// Archive directory to write into.
    pub cwd: String,
    /// Always start a fresh archive, even if one is open.
    pub create_archive: bool,
}

impl<F> ImportRequest<F> {
    pub fn new(files: Vec<F>, cwd: &str) -> Self {
        Self {
            files,
            cwd: cwd.to_string(),
            create_archive: false,
        }
    }
}

type Handle<L> = (<L as ArchiveLibrary>::Archive, Rc<<L as ArchiveLibrary>::Swarm>);

struct Session<L: ArchiveLibrary> {
    generation: u64,
    key: ArchiveKey,
    archive: L::Archive,
    swarm: Rc<L::Swarm>,
    /// Live listing of this session; dropping it stops the stream.
    listing: Option<<L::Archive as Archive>::Listing>,
    /// The archive was loaded for display (listing requested).
    listening: bool,
}

/// Progress emitters of queued files and the one listener currently attached.
///
/// Mirrors the import queue order so a finished write can be matched to its
/// file even when the library reports it as an error.
struct ProgressTracker<P: ProgressSource> {
    sources: HashMap<String, P>,
    pending: VecDeque<String>,
    writing: Option<String>,
    active: Option<(String, P::Subscription)>,
}

impl<P: ProgressSource> Default for ProgressTracker<P> {
    fn default() -> Self {
        Self {
            sources: HashMap::new(),
            pending: VecDeque::new(),
            writing: None,
            active: None,
        }
    }
}

impl<P: ProgressSource> ProgressTracker<P> {
    fn active_path(&self) -> Option<&str> {
        self.active.as_ref().map(|(path, _)| path.as_str())
    }

    fn queue(&mut self, path: String, source: Option<P>) {
        if let Some(source) = source {
            self.sources.insert(path.clone(), source);
        }
        self.pending.push_back(path);
    }

    fn begin(&mut self) {
        self.writing = self.pending.pop_front();
    }

    /// Forget the file that just finished. Returns its listener, if attached,
    /// so the caller can drop it after releasing the tracker.
    fn finish(&mut self) -> Option<P::Subscription> {
        let path = self.writing.take()?;
        self.sources.remove(&path);
        if self.active_path() == Some(path.as_str()) {
            self.active.take().map(|(_, subscription)| subscription)
        } else {
            None
        }
    }

    fn is_unfinished(&self, path: &str) -> bool {
        self.writing.as_deref() == Some(path) || self.pending.iter().any(|p| p == path)
    }
}

pub struct ArchiveController<L: ArchiveLibrary, H: Host> {
    library: L,
    host: H,
    dispatch: Dispatch,
    session: RefCell<Option<Session<L>>>,
    /// Last generation handed out.
    generation: Cell<u64>,
    /// Archives opened so far, with their peer and transfer listeners attached.
    handles: RefCell<HashMap<ArchiveKey, Handle<L>>>,
    progress: RefCell<ProgressTracker<L::Progress>>,
    this: Weak<Self>,
}

impl<L: ArchiveLibrary, H: Host> ArchiveController<L, H> {
    pub fn new(library: L, host: H, dispatch: Dispatch) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            library,
            host,
            dispatch,
            session: RefCell::new(None),
            generation: Cell::new(0),
            handles: RefCell::new(HashMap::new()),
            progress: RefCell::new(ProgressTracker::default()),
            this: this.clone(),
        })
    }

    /// Key of the archive currently open.
    pub fn key(&self) -> Option<ArchiveKey> {
        self.session.borrow().as_ref().map(|s| s.key.clone())
    }

    fn is_open(&self, key: &ArchiveKey) -> bool {
        self.session.borrow().as_ref().is_some_and(|s| &s.key == key)
    }

    fn is_listening(&self, key: &ArchiveKey) -> bool {
        self.session
            .borrow()
            .as_ref()
            .is_some_and(|s| &s.key == key && s.listening)
    }

    fn current_generation(&self) -> Option<u64> {
        self.session.borrow().as_ref().map(|s| s.generation)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.current_generation() == Some(generation)
    }

    fn dispatch(&self, msg: ArchiveMsg) {
        (self.dispatch)(msg);
    }

    /// Dispatch that only forwards while session `generation` is open.
    fn scoped(&self, generation: u64) -> Dispatch {
        let this = self.this.clone();
        Rc::new(move |msg| {
            if let Some(this) = this.upgrade()
                && this.is_current(generation)
            {
                this.dispatch(msg);
            }
        })
    }

    /// Dispatch that only forwards while `key` is the open archive.
    fn for_key(&self, key: ArchiveKey) -> Dispatch {
        let this = self.this.clone();
        Rc::new(move |msg| {
            if let Some(this) = this.upgrade()
                && this.is_open(&key)
            {
                this.dispatch(msg);
            }
        })
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Create a fresh archive, start discovery and show it. Files passed in
    /// `files` are imported once the archive exists.
    pub fn new_archive(
        &self,
        files: Option<ImportRequest<L::File>>,
    ) -> Result<ArchiveKey, ArchiveError> {
        let archive = self.library.create_archive()?;
        let key = archive.key()?;
        let swarm = self.library.join_swarm(&archive, SIGNALHUBS)?;
        log!("[archive] created {}", key);

        let (archive, swarm) = self.watch(key.clone(), archive, swarm);
        self.begin_session(key.clone(), archive, swarm, false);
        self.dispatch(ArchiveMsg::Created { key: key.clone() });

        self.import(key.clone());
        if let Some(request) = files {
            self.import_files(ImportRequest {
                create_archive: false,
                ..request
            });
        }
        Ok(key)
    }

    /// Show the archive `key`: update the address bar and (re)load it.
    pub fn import(&self, key: ArchiveKey) {
        self.host.navigate(&Route::archive(key.clone()));
        self.dispatch(ArchiveMsg::DirChanged("/".to_string()));
        if self.is_listening(&key) {
            return;
        }
        self.dispatch(ArchiveMsg::EntriesReset);
        if let Err(e) = self.load(&key) {
            error!("[archive] failed to load {}: {}", key, e);
        }
    }

    /// Write files into the open archive, creating one first if needed.
    pub fn import_files(&self, request: ImportRequest<L::File>) {
        let current = self
            .session
            .borrow()
            .as_ref()
            .map(|s| (s.key.clone(), s.generation));
        let (key, generation) = match current {
            Some(current) if !request.create_archive => current,
            _ => {
                let forwarded = ImportRequest {
                    files: request.files,
                    cwd: "/".to_string(),
                    create_archive: false,
                };
                if let Err(e) = self.new_archive(Some(forwarded)) {
                    error!("[archive] failed to create archive: {}", e);
                }
                return;
            }
        };
        if request.files.is_empty() {
            return;
        }

        let sources = normalize_files(request.files);
        let writable = match self.library.open_writable(&key, &sources) {
            Ok(archive) => archive,
            Err(e) => {
                error!("[archive] failed to open {} for writing: {}", key, e);
                return;
            }
        };

        let options = ImportOptions {
            cwd: normalize_name(&request.cwd),
            progress_interval_ms: PROGRESS_INTERVAL_MS,
        };
        let this = self.this.clone();
        let handle = writable.clone();
        writable.open(Box::new(move |result| {
            let Some(this) = this.upgrade() else {
                return;
            };
            if let Err(e) = result {
                error!("[archive] failed to open for writing: {}", e);
                return;
            }
            if !this.is_current(generation) {
                log!("[import] archive closed before writing started");
                return;
            }
            if !handle.is_owner() {
                let e = ArchiveError::NotOwner;
                this.host.alert(&e.to_string());
                this.dispatch(ArchiveMsg::Failed(e.to_string()));
                return;
            }
            let listener = this.import_listener(generation);
            if let Err(e) = this
                .library
                .import_files(&handle, sources, options, listener)
            {
                error!("[archive] import failed: {}", e);
            }
        }));
    }

    /// Open `key` (or reuse the open archive) and start its live listing.
    /// Peer and transfer listeners are attached the first time a key is
    /// opened and report only while that key is the open archive.
    pub fn load(&self, key: &ArchiveKey) -> Result<(), ArchiveError> {
        let resumed = {
            let mut session = self.session.borrow_mut();
            match session.as_mut().filter(|s| &s.key == key) {
                Some(s) if s.listening => return Ok(()),
                Some(s) => {
                    s.listening = true;
                    Some((s.generation, s.archive.clone(), Rc::clone(&s.swarm)))
                }
                None => None,
            }
        };

        let (generation, archive, swarm) = match resumed {
            Some(resumed) => resumed,
            None => {
                self.dispatch(ArchiveMsg::Opened { key: key.clone() });
                let (archive, swarm) = self.open_handle(key)?;
                let generation =
                    self.begin_session(key.clone(), archive.clone(), Rc::clone(&swarm), true);
                (generation, archive, swarm)
            }
        };
        self.dispatch(ArchiveMsg::PeersChanged(swarm.connections()));

        let this = self.this.clone();
        let opened = archive.clone();
        archive.open(Box::new(move |result| {
            let Some(this) = this.upgrade() else {
                return;
            };
            if let Err(e) = result {
                error!("[archive] failed to open: {}", e);
                return;
            }
            if this.is_current(generation) {
                this.start_listing(generation, opened);
            }
        }));

        Ok(())
    }

    /// Open a read stream for the entry `name` of the open archive.
    pub fn read_file(
        &self,
        name: &str,
    ) -> Result<<L::Archive as Archive>::Stream, ArchiveError> {
        let archive = self
            .session
            .borrow()
            .as_ref()
            .map(|s| s.archive.clone())
            .ok_or(ArchiveError::NoArchive)?;
        archive.create_file_read_stream(&normalize_name(name))
    }

    /// Attach a progress listener to the file at `path`, replacing the
    /// listener of the previously tracked file.
    pub fn track_progress(&self, path: &str) {
        let Some(generation) = self.current_generation() else {
            return;
        };
        let (source, previous) = {
            let mut tracker = self.progress.borrow_mut();
            if tracker.active_path() == Some(path) {
                return;
            }
            let previous = tracker.active.take();
            (tracker.sources.remove(path), previous)
        };
        drop(previous);
        let Some(source) = source else {
            return;
        };

        // The source may report synchronously; nothing is borrowed here.
        let dispatch = self.scoped(generation);
        let file_path = path.to_string();
        let subscription = source.subscribe(Box::new(move |pct| {
            dispatch(ArchiveMsg::Queue(QueueEvent::WriteProgress {
                path: file_path.clone(),
                pct,
            }))
        }));

        let detached = {
            let mut tracker = self.progress.borrow_mut();
            if self.is_current(generation) && tracker.is_unfinished(path) {
                tracker.sources.insert(path.to_string(), source);
                subscription
                    .and_then(|s| tracker.active.replace((path.to_string(), s)))
                    .map(|(_, s)| s)
            } else {
                subscription
            }
        };
        drop(detached);
    }

    /// Show directory `dir` of the open archive.
    pub fn change_dir(&self, dir: &str) {
        let Some(key) = self.key() else {
            return;
        };
        let dir = normalize_name(dir);
        self.host.navigate(&Route::Archive {
            key,
            dir: dir.clone(),
        });
        self.dispatch(ArchiveMsg::DirChanged(dir));
    }

    /// Leave the archive and return to the landing page.
    pub fn close(&self) {
        self.host.navigate(&Route::Home);
        self.reset();
    }

    /// Bring the controller in line with a route the browser navigated to.
    pub fn sync_route(&self, route: &Route) {
        match route {
            Route::Home => {
                if self.key().is_some() {
                    self.reset();
                }
            }
            Route::Archive { key, dir } => {
                if !self.is_listening(key) {
                    self.dispatch(ArchiveMsg::EntriesReset);
                    if let Err(e) = self.load(key) {
                        error!("[archive] failed to load {}: {}", key, e);
                        return;
                    }
                }
                self.dispatch(ArchiveMsg::DirChanged(dir.clone()));
            }
        }
    }

    fn reset(&self) {
        // Dropped after the cells are released: stopping a listing may call back.
        let previous = self.session.replace(None);
        let progress = self.progress.replace(ProgressTracker::default());
        drop((previous, progress));
        self.dispatch(ArchiveMsg::Closed);
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    fn begin_session(
        &self,
        key: ArchiveKey,
        archive: L::Archive,
        swarm: Rc<L::Swarm>,
        listening: bool,
    ) -> u64 {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        let previous = self.session.replace(Some(Session {
            generation,
            key,
            archive,
            swarm,
            listing: None,
            listening,
        }));
        let progress = self.progress.replace(ProgressTracker::default());
        drop((previous, progress));
        generation
    }

    fn open_handle(&self, key: &ArchiveKey) -> Result<Handle<L>, ArchiveError> {
        let cached = self
            .handles
            .borrow()
            .get(key)
            .map(|(archive, swarm)| (archive.clone(), Rc::clone(swarm)));
        if let Some(handle) = cached {
            return Ok(handle);
        }
        let archive = self.library.open_archive(key)?;
        let swarm = self.library.join_swarm(&archive, SIGNALHUBS)?;
        Ok(self.watch(key.clone(), archive, swarm))
    }

    /// Attach peer and transfer listeners to a newly opened archive and keep
    /// it for later sessions. The library offers no way to detach them.
    fn watch(&self, key: ArchiveKey, archive: L::Archive, swarm: L::Swarm) -> Handle<L> {
        let swarm = Rc::new(swarm);

        let dispatch = self.for_key(key.clone());
        swarm.on_peers_changed(Box::new(move |n| dispatch(ArchiveMsg::PeersChanged(n))));

        let dispatch = self.for_key(key.clone());
        archive.on_upload(Box::new(move |n| dispatch(ArchiveMsg::Uploaded(n))));

        let dispatch = self.for_key(key.clone());
        archive.on_download(Box::new(move |n| dispatch(ArchiveMsg::Downloaded(n))));

        self.handles
            .borrow_mut()
            .insert(key, (archive.clone(), Rc::clone(&swarm)));
        (archive, swarm)
    }

    fn start_listing(&self, generation: u64, archive: L::Archive) {
        let dispatch = self.scoped(generation);

        let on_size = Rc::clone(&dispatch);
        archive.prime_content(Box::new(move |bytes| {
            if let Some(bytes) = bytes {
                on_size(ArchiveMsg::SizeChanged(bytes));
            }
        }));

        let listed = archive.clone();
        let listing = archive.list_live(Box::new(move |entry| match entry {
            Ok(entry) => {
                dispatch(ArchiveMsg::EntryListed(entry));
                if let Some(bytes) = listed.content_bytes() {
                    dispatch(ArchiveMsg::SizeChanged(bytes));
                }
            }
            Err(e) => warn!("[archive] skipped listing entry: {}", e),
        }));

        let stale = {
            let mut session = self.session.borrow_mut();
            match session.as_mut().filter(|s| s.generation == generation) {
                Some(s) => s.listing.replace(listing),
                None => Some(listing),
            }
        };
        drop(stale);
    }

    // ========================================================================
    // Import notifications
    // ========================================================================

    fn import_listener(&self, generation: u64) -> ImportListener<L::Progress> {
        let this = self.this.clone();
        Rc::new(move |event| {
            if let Some(this) = this.upgrade()
                && this.is_current(generation)
            {
                this.on_import_event(event);
            }
        })
    }

    fn on_import_event(&self, event: ImportEvent<L::Progress>) {
        match event {
            ImportEvent::Queued(Ok(QueuedFile {
                descriptor,
                progress,
            })) => {
                self.progress
                    .borrow_mut()
                    .queue(descriptor.full_path.clone(), progress);
                self.dispatch(ArchiveMsg::Queue(QueueEvent::QueueNewFile(descriptor)));
            }
            ImportEvent::Queued(Err(e)) => warn!("[import] file not queued: {}", e),
            ImportEvent::WriteBegin(result) => {
                if let Err(e) = result {
                    warn!("[import] write begin: {}", e);
                }
                self.progress.borrow_mut().begin();
                self.dispatch(ArchiveMsg::Queue(QueueEvent::FileWriteBegin));
            }
            ImportEvent::WriteComplete(result) => {
                if let Err(e) = result {
                    warn!("[import] write complete: {}", e);
                }
                let detached = self.progress.borrow_mut().finish();
                drop(detached);
                self.dispatch(ArchiveMsg::Queue(QueueEvent::FileWriteComplete));
            }
            ImportEvent::CompleteAll => log!("[import] all files written"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::core::library::ReadStream;
    use crate::core::mock::{MockFile, MockHost, MockLibrary};
    use crate::models::{ArchiveState, EntryKind};

    type TestController = Rc<ArchiveController<MockLibrary, MockHost>>;

    struct Harness {
        library: MockLibrary,
        host: MockHost,
        state: Rc<RefCell<ArchiveState>>,
        controller: TestController,
    }

    fn harness() -> Harness {
        let library = MockLibrary::new();
        let host = MockHost::new();
        let state = Rc::new(RefCell::new(ArchiveState::new()));
        let sink = Rc::clone(&state);
        let controller = ArchiveController::new(
            library.clone(),
            host.clone(),
            Rc::new(move |msg| sink.borrow_mut().apply(msg)),
        );
        Harness {
            library,
            host,
            state,
            controller,
        }
    }

    fn files(names: &[&str]) -> Vec<MockFile> {
        names
            .iter()
            .map(|n| MockFile::new(n, n.as_bytes()))
            .collect()
    }

    #[test]
    fn test_new_archive_records_key_and_navigates() {
        let h = harness();
        let key = h.controller.new_archive(None).unwrap();

        assert_eq!(h.controller.key(), Some(key.clone()));
        assert_eq!(h.state.borrow().key, Some(key.clone()));
        assert_eq!(h.host.routes(), vec![Route::archive(key.clone())]);
        assert_eq!(h.library.swarm_hubs(&key), Some(SIGNALHUBS.len()));
    }

    #[test]
    fn test_import_files_without_archive_creates_one() {
        let h = harness();
        h.controller
            .import_files(ImportRequest::new(files(&["a.txt", "b.txt"]), "/ignored"));

        let key = h.controller.key().expect("archive created");
        assert_eq!(
            h.library.imported_paths(&key),
            vec!["/a.txt".to_string(), "/b.txt".to_string()]
        );
        assert_eq!(h.library.import_cwd(&key).as_deref(), Some("/"));

        let state = h.state.borrow();
        let queued: Vec<&str> = state
            .import_queue
            .next
            .iter()
            .map(|f| f.full_path.as_str())
            .collect();
        assert_eq!(queued, vec!["/a.txt", "/b.txt"]);
    }

    #[test]
    fn test_import_writes_show_up_in_listing() {
        let h = harness();
        let key = h.controller.new_archive(None).unwrap();
        h.controller
            .import_files(ImportRequest::new(files(&["song.mp3"]), "/music"));

        assert!(h.library.begin_write(&key));
        assert_eq!(
            h.state
                .borrow()
                .import_queue
                .writing
                .as_ref()
                .map(|f| f.full_path.clone()),
            Some("/song.mp3".to_string())
        );
        h.library.complete_write(&key);

        let state = h.state.borrow();
        assert!(state.import_queue.is_idle());
        let dir = state.entries.get("/music").unwrap();
        assert_eq!(dir.kind, EntryKind::Directory);
        assert_eq!(state.entries.get("/music/song.mp3").unwrap().length, 8);
        assert_eq!(state.size, Some(8));
    }

    #[test]
    fn test_create_archive_flag_starts_fresh_archive() {
        let h = harness();
        let first = h.controller.new_archive(None).unwrap();
        let mut request = ImportRequest::new(files(&["x"]), "/");
        request.create_archive = true;
        h.controller.import_files(request);

        let second = h.controller.key().unwrap();
        assert_ne!(first, second);
        assert_eq!(h.library.imported_paths(&second), vec!["/x".to_string()]);
        assert!(h.library.imported_paths(&first).is_empty());
    }

    #[test]
    fn test_non_owner_write_alerts_and_aborts() {
        let h = harness();
        let key = h.library.seed_remote_archive(7, &[("/readme.md", "hi")]);
        h.controller.import(key.clone());
        h.controller
            .import_files(ImportRequest::new(files(&["mine.txt"]), "/"));

        assert_eq!(
            h.host.alerts(),
            vec!["You can not put files in this archive".to_string()]
        );
        assert!(h.library.imported_paths(&key).is_empty());
        let state = h.state.borrow();
        assert!(state.import_queue.is_idle());
        assert_eq!(
            state.error.as_deref(),
            Some("You can not put files in this archive")
        );
    }

    #[test]
    fn test_load_lists_entries_with_parent_directories() {
        let h = harness();
        let key = h
            .library
            .seed_remote_archive(3, &[("/docs/guide/intro.md", "hello")]);
        h.controller.load(&key).unwrap();

        let state = h.state.borrow();
        assert_eq!(state.key, Some(key));
        assert!(state.entries.is_dir("/docs"));
        assert!(state.entries.is_dir("/docs/guide"));
        assert_eq!(state.entries.get("/docs/guide/intro.md").unwrap().length, 5);
        assert_eq!(state.size, Some(5));
    }

    #[test]
    fn test_load_counts_peers_and_transfers() {
        let h = harness();
        let key = h.library.seed_remote_archive(4, &[]);
        h.controller.load(&key).unwrap();

        h.library.connect_peer(&key);
        h.library.connect_peer(&key);
        assert_eq!(h.state.borrow().num_peers, 2);
        h.library.disconnect_peer(&key);
        assert_eq!(h.state.borrow().num_peers, 1);

        h.library.emit_upload(&key, 100);
        h.library.emit_upload(&key, 20);
        h.library.emit_download(&key, 7);
        let state = h.state.borrow();
        assert_eq!(state.uploaded, 120);
        assert_eq!(state.downloaded, 7);
    }

    #[test]
    fn test_load_same_key_twice_attaches_listeners_once() {
        let h = harness();
        let key = h.library.seed_remote_archive(5, &[]);
        h.controller.load(&key).unwrap();
        h.controller.load(&key).unwrap();
        h.controller.import(key.clone());

        assert_eq!(h.library.list_listener_count(&key), 1);
        h.library.emit_upload(&key, 10);
        assert_eq!(h.state.borrow().uploaded, 10);
    }

    #[test]
    fn test_read_file_requires_archive() {
        let h = harness();
        assert!(matches!(
            h.controller.read_file("/a"),
            Err(ArchiveError::NoArchive)
        ));
    }

    #[test]
    fn test_read_file_streams_content() {
        let h = harness();
        let key = h.library.seed_remote_archive(6, &[("/notes.txt", "content")]);
        h.controller.load(&key).unwrap();

        let stream = h.controller.read_file("notes.txt").unwrap();
        let out = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&out);
        stream.read_to_end(Box::new(move |bytes| *sink.borrow_mut() = Some(bytes)));
        assert_eq!(*out.borrow(), Some(Ok(b"content".to_vec())));
    }

    #[test]
    fn test_progress_tracking_switches_listener() {
        let h = harness();
        let key = h.controller.new_archive(None).unwrap();
        h.controller
            .import_files(ImportRequest::new(files(&["a", "b"]), "/"));

        h.library.begin_write(&key);
        h.controller.track_progress("/a");
        h.controller.track_progress("/a");
        assert_eq!(h.library.progress_listeners("/a"), 1);

        h.library.emit_progress("/a", 55.5);
        h.library.emit_progress("/b", 80.0);
        assert_eq!(
            h.state.borrow().import_queue.writing.as_ref().unwrap().progress_pct,
            55
        );

        // Switching files detaches the previous listener.
        h.controller.track_progress("/b");
        assert_eq!(h.library.progress_listeners("/a"), 0);
        assert_eq!(h.library.progress_listeners("/b"), 1);

        // Completion detaches too.
        h.library.complete_write(&key);
        h.library.begin_write(&key);
        h.library.complete_write(&key);
        assert_eq!(h.library.progress_listeners("/b"), 0);
    }

    #[test]
    fn test_change_dir_and_close() {
        let h = harness();
        let key = h.controller.new_archive(None).unwrap();
        h.controller.change_dir("photos/2016/");
        assert_eq!(h.state.borrow().cwd, "/photos/2016");
        assert_eq!(
            h.host.routes().last(),
            Some(&Route::Archive {
                key,
                dir: "/photos/2016".to_string(),
            })
        );

        h.controller.close();
        assert_eq!(h.controller.key(), None);
        assert_eq!(h.host.routes().last(), Some(&Route::Home));
        assert_eq!(*h.state.borrow(), ArchiveState::default());
    }

    #[test]
    fn test_sync_route_loads_once_and_follows_dir() {
        let h = harness();
        let key = h.library.seed_remote_archive(8, &[("/a/b.txt", "b")]);
        let route = Route::Archive {
            key: key.clone(),
            dir: "/a".to_string(),
        };
        h.controller.sync_route(&route);
        h.controller.sync_route(&route);

        assert_eq!(h.library.list_listener_count(&key), 1);
        assert_eq!(h.state.borrow().cwd, "/a");
        assert_eq!(h.state.borrow().cwd_entries().len(), 1);
        assert!(h.host.routes().is_empty());

        h.controller.sync_route(&Route::Home);
        assert_eq!(h.controller.key(), None);
    }

    #[test]
    fn test_closed_archive_stops_reporting_into_next_one() {
        let h = harness();
        let a = h.library.seed_remote_archive(10, &[("/a.txt", "a")]);
        let b = h.library.seed_remote_archive(11, &[("/b.txt", "b")]);
        h.controller.load(&a).unwrap();
        h.controller.close();
        h.controller.sync_route(&Route::archive(b.clone()));

        h.library.emit_upload(&a, 50);
        h.library.emit_download(&a, 5);
        h.library.connect_peer(&a);
        h.library.connect_peer(&a);

        let state = h.state.borrow();
        assert_eq!(state.key, Some(b));
        assert_eq!(state.uploaded, 0);
        assert_eq!(state.downloaded, 0);
        assert_eq!(state.num_peers, 0);
        assert!(state.entries.get("/a.txt").is_none());
        assert_eq!(h.library.list_listener_count(&a), 0);
    }

    #[test]
    fn test_reopening_archive_counts_transfers_once() {
        let h = harness();
        let key = h.library.seed_remote_archive(12, &[("/f", "ff")]);
        h.controller.load(&key).unwrap();
        h.library.connect_peer(&key);
        h.controller.close();
        h.controller.import(key.clone());

        h.library.emit_upload(&key, 10);
        let state = h.state.borrow();
        assert_eq!(state.uploaded, 10);
        assert_eq!(state.num_peers, 1);
        assert_eq!(state.entries.get("/f").unwrap().length, 2);
        assert_eq!(h.library.list_listener_count(&key), 1);
    }

    #[test]
    fn test_import_events_after_close_are_ignored() {
        let h = harness();
        let first = h.controller.new_archive(None).unwrap();
        h.controller
            .import_files(ImportRequest::new(files(&["a", "b"]), "/"));
        h.controller.close();
        let second = h.controller.new_archive(None).unwrap();

        assert!(h.library.begin_write(&first));
        h.library.emit_progress("/a", 30.0);
        h.library.complete_write(&first);

        let state = h.state.borrow();
        assert_eq!(state.key, Some(second));
        assert!(state.import_queue.is_idle());
        assert!(state.entries.get("/a").is_none());
    }

    #[test]
    fn test_failed_write_detaches_progress_listener() {
        let h = harness();
        let key = h.controller.new_archive(None).unwrap();
        h.controller
            .import_files(ImportRequest::new(files(&["a", "b"]), "/"));

        h.library.begin_write(&key);
        h.controller.track_progress("/a");
        assert_eq!(h.library.progress_listeners("/a"), 1);

        h.library.fail_write(&key);
        assert_eq!(h.library.progress_listeners("/a"), 0);
        // A late request for the failed file attaches nothing.
        h.controller.track_progress("/a");
        assert_eq!(h.library.progress_listeners("/a"), 0);

        h.library.begin_write(&key);
        h.controller.track_progress("/b");
        assert_eq!(h.library.progress_listeners("/b"), 1);
        let state = h.state.borrow();
        assert_eq!(
            state.import_queue.writing.as_ref().map(|f| f.full_path.as_str()),
            Some("/b")
        );
        assert!(state.import_queue.next.is_empty());
    }

    #[test]
    fn test_progress_reported_during_subscribe_can_retrack() {
        type Slot = Rc<RefCell<Weak<ArchiveController<MockLibrary, MockHost>>>>;

        let library = MockLibrary::new();
        let state = Rc::new(RefCell::new(ArchiveState::new()));
        let slot: Slot = Rc::new(RefCell::new(Weak::new()));
        let (sink, target) = (Rc::clone(&state), Rc::clone(&slot));
        let controller = ArchiveController::new(
            library.clone(),
            MockHost::new(),
            Rc::new(move |msg| {
                let followed = match &msg {
                    ArchiveMsg::Queue(QueueEvent::WriteProgress { path, .. }) => {
                        Some(path.clone())
                    }
                    _ => None,
                };
                sink.borrow_mut().apply(msg);
                if let Some(path) = followed
                    && let Some(controller) = target.borrow().upgrade()
                {
                    controller.track_progress(&path);
                }
            }),
        );
        *slot.borrow_mut() = Rc::downgrade(&controller);

        let key = controller.new_archive(None).unwrap();
        controller.import_files(ImportRequest::new(files(&["a"]), "/"));
        library.begin_write(&key);
        library.emit_progress("/a", 42.0);

        // The source replays 42% while subscribing.
        controller.track_progress("/a");
        assert_eq!(library.progress_listeners("/a"), 1);
        assert_eq!(
            state.borrow().import_queue.writing.as_ref().unwrap().progress_pct,
            42
        );

        library.emit_progress("/a", 70.0);
        assert_eq!(library.progress_listeners("/a"), 1);
        assert_eq!(
            state.borrow().import_queue.writing.as_ref().unwrap().progress_pct,
            70
        );
    }
}
