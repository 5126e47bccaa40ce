//! Archive library bindings using web-sys.
//!
//! Talks to the JavaScript bundle installed as `window.dat` (hyperdrive,
//! level, random-access storages, the archive swarm and the import-queue
//! helper) through the Reflect API, the same way the wallet integration
//! talks to `window.ethereum`.
//!
//! Listeners that must outlive the call that registers them are leaked with
//! `Closure::forget`; the page owns them until it is closed. Progress
//! listeners are the exception: [`DatSubscription`] removes its listener
//! when dropped.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function, Object, Reflect, Uint8Array};
use leptos::logging::error;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::WasmClosure;
use wasm_bindgen::prelude::Closure;

use super::error::ArchiveError;
use super::library::{
    Archive, ArchiveLibrary, Callback, DroppedFile, ImportEvent, ImportListener, ImportOptions,
    OnceCallback, ProgressSource, QueuedFile, ReadStream, SourceFile, Swarm,
};
use crate::config::{DB_NAME, LIBRARY_GLOBAL};
use crate::models::{ArchiveKey, Entry, FileDescriptor, normalize_name};
use crate::utils::dom;

// ============================================================================
// Reflect helpers
// ============================================================================

fn describe(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    if let Some(e) = value.dyn_ref::<js_sys::Error>() {
        return String::from(e.message());
    }
    format!("{:?}", value)
}

fn js_error(value: &JsValue) -> ArchiveError {
    ArchiveError::Library(describe(value))
}

/// Interpret the error argument of a Node-style callback.
fn node_result(err: &JsValue) -> Result<(), ArchiveError> {
    if err.is_null() || err.is_undefined() {
        Ok(())
    } else {
        Err(js_error(err))
    }
}

fn get(target: &JsValue, prop: &str) -> Result<JsValue, ArchiveError> {
    Reflect::get(target, &prop.into()).map_err(|e| js_error(&e))
}

fn set(target: &JsValue, prop: &str, value: &JsValue) -> Result<(), ArchiveError> {
    Reflect::set(target, &prop.into(), value)
        .map(|_| ())
        .map_err(|e| js_error(&e))
}

/// Call `target[name](...args)`.
fn call(target: &JsValue, name: &str, args: &[&JsValue]) -> Result<JsValue, ArchiveError> {
    let function = get(target, name)?
        .dyn_into::<Function>()
        .map_err(|_| ArchiveError::Library(format!("{} is not a function", name)))?;
    let array = Array::new();
    for arg in args {
        array.push(arg);
    }
    function.apply(target, &array).map_err(|e| js_error(&e))
}

/// Attach a listener for the rest of the page lifetime.
fn on<T>(emitter: &JsValue, event: &str, handler: Closure<T>) -> Result<(), ArchiveError>
where
    T: ?Sized + WasmClosure,
{
    call(emitter, "on", &[&event.into(), handler.as_ref()])?;
    handler.forget();
    Ok(())
}

fn number(target: &JsValue, prop: &str) -> Option<f64> {
    Reflect::get(target, &prop.into()).ok()?.as_f64()
}

/// `{ live: true, sparse: true }` plus any extra properties.
fn archive_options(extra: &[(&str, &JsValue)]) -> Result<Object, ArchiveError> {
    let opts = Object::new();
    set(&opts, "live", &JsValue::TRUE)?;
    set(&opts, "sparse", &JsValue::TRUE)?;
    for (prop, value) in extra {
        set(&opts, prop, value)?;
    }
    Ok(opts)
}

// ============================================================================
// Library
// ============================================================================

/// Entry point to the `window.dat` bundle.
///
/// The hyperdrive instance (backed by a level database named
/// [`DB_NAME`]) is created on first use and shared by every archive.
#[derive(Default)]
pub struct DatLibrary {
    drive: RefCell<Option<JsValue>>,
}

impl DatLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the archive bundle is loaded.
    pub fn is_available() -> bool {
        Self::bundle().is_ok()
    }

    fn bundle() -> Result<JsValue, ArchiveError> {
        let window = dom::window().ok_or(ArchiveError::NoWindow)?;
        Reflect::get(&window, &LIBRARY_GLOBAL.into())
            .ok()
            .filter(JsValue::is_object)
            .ok_or(ArchiveError::LibraryUnavailable)
    }

    fn drive(&self) -> Result<JsValue, ArchiveError> {
        if let Some(drive) = self.drive.borrow().as_ref() {
            return Ok(drive.clone());
        }
        let dat = Self::bundle()?;
        let db = call(&dat, "level", &[&DB_NAME.into()])?;
        let drive = call(&dat, "hyperdrive", &[&db])?;
        *self.drive.borrow_mut() = Some(drive.clone());
        Ok(drive)
    }
}

impl ArchiveLibrary for DatLibrary {
    type Archive = DatArchive;
    type Swarm = DatSwarm;
    type File = web_sys::File;
    type Progress = DatProgress;

    fn create_archive(&self) -> Result<DatArchive, ArchiveError> {
        let ram = get(&Self::bundle()?, "ram")?;
        let opts = archive_options(&[("file", &ram)])?;
        let archive = call(&self.drive()?, "createArchive", &[&JsValue::NULL, &opts])?;
        Ok(DatArchive(archive))
    }

    fn open_archive(&self, key: &ArchiveKey) -> Result<DatArchive, ArchiveError> {
        let archive = call(&self.drive()?, "createArchive", &[&key.as_str().into()])?;
        Ok(DatArchive(archive))
    }

    fn open_writable(
        &self,
        key: &ArchiveKey,
        files: &[SourceFile<web_sys::File>],
    ) -> Result<DatArchive, ArchiveError> {
        let raf = get(&Self::bundle()?, "raf")?
            .dyn_into::<Function>()
            .map_err(|_| ArchiveError::Library("raf is not a function".to_string()))?;

        // Storage lookup: the archive asks for file content by entry name.
        let sources: Vec<(String, String, web_sys::File)> = files
            .iter()
            .map(|f| (f.file.name(), f.full_path.clone(), f.file.clone()))
            .collect();
        let storage = Closure::wrap(Box::new(move |name: JsValue| -> JsValue {
            let name = name.as_string().unwrap_or_default();
            let normalized = normalize_name(&name);
            let Some((_, _, file)) = sources
                .iter()
                .find(|(file_name, path, _)| *file_name == name || *path == normalized)
            else {
                error!("[dat] no dropped file for storage name {}", name);
                return JsValue::UNDEFINED;
            };
            raf.call1(&JsValue::NULL, file).unwrap_or(JsValue::UNDEFINED)
        }) as Box<dyn FnMut(JsValue) -> JsValue>);

        let opts = archive_options(&[("file", storage.as_ref())])?;
        storage.forget();
        let archive = call(&self.drive()?, "createArchive", &[&key.as_str().into(), &opts])?;
        Ok(DatArchive(archive))
    }

    fn join_swarm(
        &self,
        archive: &DatArchive,
        signalhubs: &[&str],
    ) -> Result<DatSwarm, ArchiveError> {
        let hubs = Array::new();
        for host in signalhubs {
            hubs.push(&format!("https://{}", host).into());
        }
        let opts = Object::new();
        set(&opts, "signalhub", &hubs)?;
        let swarm = call(&Self::bundle()?, "swarm", &[&archive.0, &opts])?;
        Ok(DatSwarm(swarm))
    }

    fn import_files(
        &self,
        archive: &DatArchive,
        files: Vec<SourceFile<web_sys::File>>,
        options: ImportOptions,
        listener: ImportListener<DatProgress>,
    ) -> Result<(), ArchiveError> {
        let list = Array::new();
        for source in &files {
            set(&source.file, "fullPath", &source.full_path.as_str().into())?;
            list.push(&source.file);
        }

        let opts = Object::new();
        set(&opts, "cwd", &options.cwd.as_str().into())?;
        set(&opts, "progressInterval", &options.progress_interval_ms.into())?;

        let on_queue = Rc::clone(&listener);
        let queued = Closure::wrap(Box::new(move |err: JsValue, file: JsValue| {
            let result = node_result(&err).and_then(|()| {
                Ok(QueuedFile {
                    descriptor: descriptor_of(&file)?,
                    progress: Some(DatProgress(file)),
                })
            });
            on_queue(ImportEvent::Queued(result));
        }) as Box<dyn FnMut(JsValue, JsValue)>);

        let on_begin = Rc::clone(&listener);
        let begin = Closure::wrap(Box::new(move |err: JsValue, file: JsValue| {
            let result = node_result(&err).and_then(|()| descriptor_of(&file));
            on_begin(ImportEvent::WriteBegin(result));
        }) as Box<dyn FnMut(JsValue, JsValue)>);

        let on_complete = Rc::clone(&listener);
        let complete = Closure::wrap(Box::new(move |err: JsValue, file: JsValue| {
            detach_helper_progress(&file);
            let result = node_result(&err).and_then(|()| descriptor_of(&file));
            on_complete(ImportEvent::WriteComplete(result));
        }) as Box<dyn FnMut(JsValue, JsValue)>);

        let on_all = Rc::clone(&listener);
        let all = Closure::wrap(Box::new(move || {
            on_all(ImportEvent::CompleteAll);
        }) as Box<dyn FnMut()>);

        set(&opts, "onQueueNewFile", queued.as_ref())?;
        set(&opts, "onFileWriteBegin", begin.as_ref())?;
        set(&opts, "onFileWriteComplete", complete.as_ref())?;
        set(&opts, "onCompleteAll", all.as_ref())?;
        queued.forget();
        begin.forget();
        complete.forget();
        all.forget();

        let import_queue = get(&Self::bundle()?, "importQueue")?
            .dyn_into::<Function>()
            .map_err(|_| ArchiveError::Library("importQueue is not a function".to_string()))?;
        import_queue
            .call3(&JsValue::NULL, &list, &archive.0, &opts)
            .map(|_| ())
            .map_err(|e| js_error(&e))
    }
}

fn descriptor_of(file: &JsValue) -> Result<FileDescriptor, ArchiveError> {
    let full_path = get(file, "fullPath")?
        .as_string()
        .or_else(|| get(file, "name").ok()?.as_string())
        .ok_or_else(|| ArchiveError::Library("queued file has no path".to_string()))?;
    let size = number(file, "size").map(|s| s as u64);
    Ok(FileDescriptor::new(&full_path, size))
}

/// Remove the import helper's own progress handler from a finished file.
fn detach_helper_progress(file: &JsValue) {
    let (Ok(emitter), Ok(handler)) = (get(file, "progressListener"), get(file, "progressHandler"))
    else {
        return;
    };
    if emitter.is_object() && handler.is_function() {
        let _ = call(&emitter, "removeListener", &[&"progress".into(), &handler]);
    }
}

// ============================================================================
// Archive
// ============================================================================

#[derive(Clone)]
pub struct DatArchive(JsValue);

impl Archive for DatArchive {
    type Stream = DatReadStream;
    type Listing = DatListing;

    fn key(&self) -> Result<ArchiveKey, ArchiveError> {
        let key = get(&self.0, "key")?;
        if let Some(hex) = key.as_string() {
            return ArchiveKey::parse(&hex);
        }
        ArchiveKey::from_bytes(&Uint8Array::new(&key).to_vec())
    }

    fn is_owner(&self) -> bool {
        get(&self.0, "owner")
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    fn open(&self, on_ready: OnceCallback<Result<(), ArchiveError>>) {
        let pending = Rc::new(RefCell::new(Some(on_ready)));
        let slot = Rc::clone(&pending);
        let callback = Closure::once_into_js(move |err: JsValue| {
            let done = slot.borrow_mut().take();
            if let Some(done) = done {
                done(node_result(&err));
            }
        });
        if let Err(e) = call(&self.0, "open", &[&callback]) {
            let done = pending.borrow_mut().take();
            if let Some(done) = done {
                done(Err(e));
            }
        }
    }

    fn content_bytes(&self) -> Option<u64> {
        let content = get(&self.0, "content").ok().filter(JsValue::is_object)?;
        number(&content, "bytes").map(|b| b as u64)
    }

    fn prime_content(&self, on_ready: OnceCallback<Option<u64>>) {
        let Some(content) = get(&self.0, "content").ok().filter(JsValue::is_object) else {
            on_ready(None);
            return;
        };
        let archive = self.clone();
        let callback = Closure::once_into_js(move |_err: JsValue, _data: JsValue| {
            on_ready(archive.content_bytes());
        });
        if let Err(e) = call(&content, "get", &[&JsValue::from(0), &callback]) {
            error!("[dat] failed to fetch first block: {}", e);
        }
    }

    fn on_upload(&self, on_bytes: Callback<u64>) {
        let handler = Closure::wrap(Box::new(move |data: JsValue| {
            on_bytes(number(&data, "length").unwrap_or(0.0) as u64);
        }) as Box<dyn FnMut(JsValue)>);
        if let Err(e) = on(&self.0, "upload", handler) {
            error!("[dat] upload listener: {}", e);
        }
    }

    fn on_download(&self, on_bytes: Callback<u64>) {
        let handler = Closure::wrap(Box::new(move |data: JsValue| {
            on_bytes(number(&data, "length").unwrap_or(0.0) as u64);
        }) as Box<dyn FnMut(JsValue)>);
        if let Err(e) = on(&self.0, "download", handler) {
            error!("[dat] download listener: {}", e);
        }
    }

    fn list_live(&self, on_entry: Callback<Result<Entry, ArchiveError>>) -> DatListing {
        let result = (|| -> Result<JsValue, ArchiveError> {
            let opts = Object::new();
            set(&opts, "live", &JsValue::TRUE)?;
            let stream = call(&self.0, "list", &[&opts])?;

            let on_entry: Rc<dyn Fn(Result<Entry, ArchiveError>)> = Rc::from(on_entry);
            let on_data = Rc::clone(&on_entry);
            let data = Closure::wrap(Box::new(move |value: JsValue| {
                let entry = serde_wasm_bindgen::from_value::<Entry>(value)
                    .map_err(|e| ArchiveError::InvalidEntry(e.to_string()));
                on_data(entry);
            }) as Box<dyn FnMut(JsValue)>);
            on(&stream, "data", data)?;

            let failed = Closure::wrap(Box::new(move |err: JsValue| {
                on_entry(Err(ArchiveError::Stream(describe(&err))));
            }) as Box<dyn FnMut(JsValue)>);
            on(&stream, "error", failed)?;
            Ok(stream)
        })();

        match result {
            Ok(stream) => DatListing(Some(stream)),
            Err(e) => {
                error!("[dat] failed to list archive: {}", e);
                DatListing(None)
            }
        }
    }

    fn create_file_read_stream(&self, name: &str) -> Result<DatReadStream, ArchiveError> {
        call(&self.0, "createFileReadStream", &[&name.into()]).map(DatReadStream)
    }
}

/// Live list stream; destroyed on drop.
pub struct DatListing(Option<JsValue>);

impl Drop for DatListing {
    fn drop(&mut self) {
        if let Some(stream) = self.0.take() {
            let _ = call(&stream, "destroy", &[]);
        }
    }
}

pub struct DatReadStream(JsValue);

impl ReadStream for DatReadStream {
    fn read_to_end(self, done: OnceCallback<Result<Vec<u8>, ArchiveError>>) {
        let done = Rc::new(RefCell::new(Some(done)));
        let buffer = Rc::new(RefCell::new(Vec::new()));

        let finish = {
            let done = Rc::clone(&done);
            move |result: Result<Vec<u8>, ArchiveError>| {
                let callback = done.borrow_mut().take();
                if let Some(callback) = callback {
                    callback(result);
                }
            }
        };

        let sink = Rc::clone(&buffer);
        let data = Closure::wrap(Box::new(move |chunk: JsValue| {
            sink.borrow_mut().extend(Uint8Array::new(&chunk).to_vec());
        }) as Box<dyn FnMut(JsValue)>);

        let on_end = finish.clone();
        let end = Closure::wrap(Box::new(move |_: JsValue| {
            on_end(Ok(buffer.take()));
        }) as Box<dyn FnMut(JsValue)>);

        let on_error = finish.clone();
        let failed = Closure::wrap(Box::new(move |err: JsValue| {
            on_error(Err(ArchiveError::Stream(describe(&err))));
        }) as Box<dyn FnMut(JsValue)>);

        let attached = on(&self.0, "data", data)
            .and_then(|()| on(&self.0, "end", end))
            .and_then(|()| on(&self.0, "error", failed));
        if let Err(e) = attached {
            finish(Err(e));
        }
    }
}

// ============================================================================
// Swarm
// ============================================================================

pub struct DatSwarm(JsValue);

impl DatSwarm {
    fn connection_count(swarm: &JsValue) -> usize {
        let Ok(connections) = get(swarm, "connections") else {
            return 0;
        };
        if let Some(array) = connections.dyn_ref::<Array>() {
            array.length() as usize
        } else {
            connections.as_f64().unwrap_or(0.0) as usize
        }
    }
}

impl Swarm for DatSwarm {
    fn connections(&self) -> usize {
        Self::connection_count(&self.0)
    }

    fn on_peers_changed(&self, on_count: Callback<usize>) {
        let on_count: Rc<dyn Fn(usize)> = Rc::from(on_count);
        let swarm = self.0.clone();
        let handler = Closure::wrap(Box::new(move |conn: JsValue| {
            on_count(Self::connection_count(&swarm));

            let on_close = Rc::clone(&on_count);
            let closed_swarm = swarm.clone();
            let close = Closure::wrap(Box::new(move |_: JsValue| {
                on_close(Self::connection_count(&closed_swarm));
            }) as Box<dyn FnMut(JsValue)>);
            if let Err(e) = on(&conn, "close", close) {
                error!("[dat] close listener: {}", e);
            }
        }) as Box<dyn FnMut(JsValue)>);

        if let Err(e) = on(&self.0, "connection", handler) {
            error!("[dat] connection listener: {}", e);
        }
    }
}

// ============================================================================
// Progress
// ============================================================================

/// A queued file object; its `progressListener` emitter appears once the
/// helper starts writing it.
pub struct DatProgress(JsValue);

impl ProgressSource for DatProgress {
    type Subscription = DatSubscription;

    fn subscribe(&self, on_progress: Callback<f64>) -> Option<DatSubscription> {
        let emitter = get(&self.0, "progressListener")
            .ok()
            .filter(JsValue::is_object)?;
        let handler = Closure::wrap(Box::new(move |progress: JsValue| {
            on_progress(number(&progress, "percentage").unwrap_or(0.0));
        }) as Box<dyn FnMut(JsValue)>);

        match call(&emitter, "on", &[&"progress".into(), handler.as_ref()]) {
            Ok(_) => Some(DatSubscription { emitter, handler }),
            Err(e) => {
                error!("[dat] progress listener: {}", e);
                None
            }
        }
    }
}

/// Progress listener registration; removed from the emitter on drop.
pub struct DatSubscription {
    emitter: JsValue,
    handler: Closure<dyn FnMut(JsValue)>,
}

impl Drop for DatSubscription {
    fn drop(&mut self) {
        let _ = call(
            &self.emitter,
            "removeListener",
            &[&"progress".into(), self.handler.as_ref()],
        );
    }
}

// ============================================================================
// Dropped files
// ============================================================================

impl DroppedFile for web_sys::File {
    fn name(&self) -> String {
        web_sys::File::name(self)
    }

    fn size(&self) -> u64 {
        web_sys::Blob::size(self) as u64
    }

    /// Directory-relative path some drop sources attach as `fullPath`.
    fn full_path(&self) -> Option<String> {
        get(self, "fullPath").ok()?.as_string()
    }
}
