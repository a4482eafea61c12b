use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use crate::assets::decode::{DecodedImage, decode_image};
use crate::foundation::error::{AdError, AdResult};

/// Byte provider behind the loader. Hosts plug in their own (HTTP client, bundle, cache).
pub trait AssetSource: Send + Sync {
    /// Fetch the encoded bytes behind `reference`.
    fn fetch(&self, reference: &str) -> AdResult<Vec<u8>>;
}

/// Resolves references against a local directory mirror.
///
/// For URLs the scheme and host are dropped, so `https://cdn.example/templates/a.png` reads
/// `<root>/templates/a.png`. Plain references are treated as relative paths.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Local path a reference resolves to.
    pub fn resolve(&self, reference: &str) -> AdResult<PathBuf> {
        let rel = match reference.split_once("://") {
            Some((_, rest)) => rest.split_once('/').map(|(_, path)| path).unwrap_or(""),
            None => reference,
        };
        let rel = rel.split(['?', '#']).next().unwrap_or(rel);
        let norm = normalize_rel_path(rel)?;
        Ok(self.root.join(Path::new(&norm)))
    }
}

impl AssetSource for DirSource {
    fn fetch(&self, reference: &str) -> AdResult<Vec<u8>> {
        let p = self.resolve(reference)?;
        std::fs::read(&p)
            .map_err(|e| AdError::asset(format!("failed to read asset '{}': {e}", p.display())))
    }
}

/// In-memory source keyed by the exact reference string.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: HashMap<String, Arc<Vec<u8>>>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` under `reference`, replacing any previous entry.
    pub fn insert(&mut self, reference: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(reference.into(), Arc::new(bytes));
    }

    /// Builder-style [`MemorySource::insert`].
    pub fn with(mut self, reference: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(reference, bytes);
        self
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, reference: &str) -> AdResult<Vec<u8>> {
        self.entries
            .get(reference)
            .map(|b| b.as_ref().clone())
            .ok_or_else(|| AdError::asset(format!("no asset registered for '{reference}'")))
    }
}

/// Normalize and validate relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub(crate) fn normalize_rel_path(source: &str) -> AdResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(AdError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(AdError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(AdError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(AdError::validation("asset path must contain a file name"));
    }

    Ok(out.join("/"))
}

/// Process-unique identifier of one load request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(pub u64);

/// Lifecycle of a load request.
#[derive(Clone, Debug)]
pub enum AssetState {
    /// Fetch or decode still running.
    Pending,
    /// Decoded and ready to draw.
    Ready(Arc<DecodedImage>),
    /// Fetch or decode failed; the message is for display only.
    Failed(String),
}

impl AssetState {
    /// Return the image when ready.
    pub fn ready(&self) -> Option<Arc<DecodedImage>> {
        match self {
            Self::Ready(img) => Some(img.clone()),
            _ => None,
        }
    }

    /// Return `true` while the load has not finished.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Return `true` when the load finished with an error.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Completion notice sent once per load request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssetEvent {
    /// Request that finished.
    pub id: AssetId,
    /// Whether it finished in [`AssetState::Ready`].
    pub ok: bool,
}

struct Slot {
    state: Mutex<AssetState>,
    done: Condvar,
}

/// Shared, cloneable view of one load request.
#[derive(Clone)]
pub struct AssetHandle {
    id: AssetId,
    label: Arc<str>,
    slot: Arc<Slot>,
}

impl AssetHandle {
    fn new(id: AssetId, label: &str) -> Self {
        Self {
            id,
            label: Arc::from(label),
            slot: Arc::new(Slot {
                state: Mutex::new(AssetState::Pending),
                done: Condvar::new(),
            }),
        }
    }

    /// Request id, matching the [`AssetEvent`] emitted on completion.
    pub fn id(&self) -> AssetId {
        self.id
    }

    /// Reference (or `"<user file>"`) this handle was created for.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AssetState {
        self.slot
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The decoded image if the load finished successfully.
    pub fn ready(&self) -> Option<Arc<DecodedImage>> {
        self.state().ready()
    }

    /// Return `true` while the load has not finished.
    pub fn is_pending(&self) -> bool {
        self.state().is_pending()
    }

    /// Block the calling thread until the load finishes and return the final state.
    pub fn wait(&self) -> AssetState {
        let mut guard = self
            .slot
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while guard.is_pending() {
            guard = self
                .slot
                .done
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
        guard.clone()
    }

    /// Publish the result. The event is sent under the state lock, so anyone who observes the
    /// settled state through [`AssetHandle::wait`] also finds its event queued.
    fn finish(&self, result: AdResult<DecodedImage>, tx: &Sender<AssetEvent>) {
        let next = match result {
            Ok(img) => AssetState::Ready(Arc::new(img)),
            Err(err) => {
                tracing::warn!(asset = %self.label, id = self.id.0, error = %err, "asset load failed");
                AssetState::Failed(err.to_string())
            }
        };
        let ok = matches!(next, AssetState::Ready(_));
        let mut state = self
            .slot
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *state = next;
        // The receiver is gone once the loader is dropped; nobody is listening then.
        let _ = tx.send(AssetEvent { id: self.id, ok });
        drop(state);
        self.slot.done.notify_all();
    }
}

impl std::fmt::Debug for AssetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetHandle")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Loader configuration.
#[derive(Debug, Clone, Copy)]
pub struct LoaderOpts {
    /// Decode worker threads.
    pub workers: usize,
    /// Maximum fetch attempts per reference (>= 1). Decode failures are never retried.
    pub fetch_attempts: u32,
}

impl Default for LoaderOpts {
    fn default() -> Self {
        Self {
            workers: 2,
            fetch_attempts: 1,
        }
    }
}

impl LoaderOpts {
    /// Return options with a different worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Return options with a different fetch attempt budget.
    pub fn with_fetch_attempts(mut self, attempts: u32) -> Self {
        self.fetch_attempts = attempts;
        self
    }
}

static NEXT_ASSET_ID: AtomicU64 = AtomicU64::new(1);

/// Asynchronous fetch + decode of template overlays and user photos.
///
/// Work runs on a dedicated worker pool; each finished request updates its [`AssetHandle`] and
/// sends one [`AssetEvent`], drained with [`AssetLoader::poll_events`].
pub struct AssetLoader {
    source: Arc<dyn AssetSource>,
    pool: rayon::ThreadPool,
    opts: LoaderOpts,
    tx: Sender<AssetEvent>,
    rx: Receiver<AssetEvent>,
}

impl AssetLoader {
    /// Create a loader reading bytes from `source`.
    pub fn new(source: Arc<dyn AssetSource>, opts: LoaderOpts) -> AdResult<Self> {
        if opts.workers == 0 {
            return Err(AdError::validation("loader needs at least one worker"));
        }
        if opts.fetch_attempts == 0 {
            return Err(AdError::validation("fetch_attempts must be >= 1"));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(opts.workers)
            .thread_name(|i| format!("adcanvas-decode-{i}"))
            .build()
            .map_err(|e| AdError::Other(anyhow::Error::new(e).context("build decode pool")))?;
        let (tx, rx) = channel();
        Ok(Self {
            source,
            pool,
            opts,
            tx,
            rx,
        })
    }

    /// Start fetching and decoding the image behind `reference`.
    #[tracing::instrument(skip(self))]
    pub fn load_from_url(&self, reference: &str) -> AssetHandle {
        let handle = AssetHandle::new(next_id(), reference);
        let job = handle.clone();
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let attempts = self.opts.fetch_attempts;
        let reference = reference.to_owned();
        self.pool.spawn(move || {
            let result = fetch_with_retry(source.as_ref(), &reference, attempts)
                .and_then(|bytes| decode_image(&bytes));
            job.finish(result, &tx);
        });
        handle
    }

    /// Start decoding user-supplied file contents.
    #[tracing::instrument(skip_all, fields(len = bytes.len()))]
    pub fn load_from_user_file(&self, bytes: Vec<u8>) -> AssetHandle {
        let handle = AssetHandle::new(next_id(), "<user file>");
        let job = handle.clone();
        let tx = self.tx.clone();
        self.pool.spawn(move || {
            job.finish(decode_image(&bytes), &tx);
        });
        handle
    }

    /// Drain completion events received so far without blocking.
    pub fn poll_events(&self) -> Vec<AssetEvent> {
        self.rx.try_iter().collect()
    }
}

fn next_id() -> AssetId {
    AssetId(NEXT_ASSET_ID.fetch_add(1, Ordering::Relaxed))
}

fn fetch_with_retry(source: &dyn AssetSource, reference: &str, attempts: u32) -> AdResult<Vec<u8>> {
    let mut attempt = 1;
    loop {
        match source.fetch(reference) {
            Ok(bytes) => return Ok(bytes),
            Err(err) if attempt < attempts => {
                tracing::debug!(reference, attempt, error = %err, "asset fetch failed, retrying");
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
