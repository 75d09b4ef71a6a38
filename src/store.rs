//! Snippet persistence
//!
//! The core talks to persistence through the `SnippetStore` trait; wire
//! details belong to the implementation behind it. Two stores ship with the
//! binary: a JSON document under the XDG data directory (atomic
//! temp-file-then-rename writes) and an in-memory store for tests and
//! `--ephemeral` runs.
//!
//! Store calls run on a dedicated worker thread and answer over a channel.
//! A single request queue keeps mutations on any one snippet strictly
//! sequential; after every successful mutation the worker re-reads the full
//! collection and emits it, which is the system's only consistency
//! mechanism (last write wins). Calls are not cancellable once issued and
//! no timeout is enforced here.

use crate::snippet::{NewSnippet, Snippet, SnippetId, SnippetPatch};
use std::io::Write;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::JoinHandle;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed store data: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("no snippet with id {0}")]
    NotFound(SnippetId),
}

pub trait SnippetStore: Send {
    /// The authoritative collection, used to (re)hydrate after any mutation.
    fn fetch_all(&mut self) -> Result<Vec<Snippet>, StoreError>;
    /// Create a snippet; the store assigns id and creation time.
    fn insert(&mut self, fields: NewSnippet) -> Result<Snippet, StoreError>;
    /// Partial update of an existing snippet.
    fn update(&mut self, id: &str, patch: SnippetPatch) -> Result<(), StoreError>;
    fn delete(&mut self, id: &str) -> Result<(), StoreError>;
}

fn build_snippet(fields: NewSnippet) -> Snippet {
    Snippet {
        id: uuid::Uuid::new_v4().to_string(),
        title: fields.title,
        description: fields.description,
        code: fields.code,
        snippet_type: fields.snippet_type,
        category: fields.category,
        instruction: fields.instruction,
        image_url: fields.image_url,
        demo_url: fields.demo_url,
        download_url: fields.download_url,
        created_at: chrono::Utc::now().timestamp_millis(),
        is_favorite: false,
    }
}

/// Snippets as a single JSON document on disk.
///
/// Every mutation rewrites the whole file through a temp file in the same
/// directory followed by a rename, so a crash never leaves a truncated
/// store behind.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn load(&self) -> Result<Vec<Snippet>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, snippets: &[Snippet]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(serde_json::to_string_pretty(snippets)?.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SnippetStore for JsonFileStore {
    fn fetch_all(&mut self) -> Result<Vec<Snippet>, StoreError> {
        self.load()
    }

    fn insert(&mut self, fields: NewSnippet) -> Result<Snippet, StoreError> {
        let mut snippets = self.load()?;
        let snippet = build_snippet(fields);
        snippets.push(snippet.clone());
        self.save(&snippets)?;
        Ok(snippet)
    }

    fn update(&mut self, id: &str, patch: SnippetPatch) -> Result<(), StoreError> {
        let mut snippets = self.load()?;
        let snippet = snippets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.apply_to(snippet);
        self.save(&snippets)
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let mut snippets = self.load()?;
        let before = snippets.len();
        snippets.retain(|s| s.id != id);
        if snippets.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.save(&snippets)
    }
}

/// In-memory store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStore {
    snippets: Vec<Snippet>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snippets(snippets: Vec<Snippet>) -> Self {
        Self { snippets }
    }
}

impl SnippetStore for MemoryStore {
    fn fetch_all(&mut self) -> Result<Vec<Snippet>, StoreError> {
        Ok(self.snippets.clone())
    }

    fn insert(&mut self, fields: NewSnippet) -> Result<Snippet, StoreError> {
        let snippet = build_snippet(fields);
        self.snippets.push(snippet.clone());
        Ok(snippet)
    }

    fn update(&mut self, id: &str, patch: SnippetPatch) -> Result<(), StoreError> {
        let snippet = self
            .snippets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.apply_to(snippet);
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let before = self.snippets.len();
        self.snippets.retain(|s| s.id != id);
        if self.snippets.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

/// Which session (by snippet id) a mutation originated from, so the answer
/// can be routed back to it.
pub type Origin = Option<SnippetId>;

#[derive(Debug)]
pub enum StoreRequest {
    FetchAll,
    Insert { fields: NewSnippet, origin: Origin },
    Update { id: SnippetId, patch: SnippetPatch, origin: Origin },
    Delete { id: SnippetId },
}

#[derive(Debug)]
pub enum StoreEvent {
    /// The authoritative collection, emitted for fetches and after every
    /// successful mutation.
    Loaded(Vec<Snippet>),
    Updated { id: SnippetId, origin: Origin },
    Inserted { snippet: Snippet, origin: Origin },
    Deleted { id: SnippetId },
    Failed { action: &'static str, origin: Origin, message: String },
}

/// Handle to the store worker. Requests go in fire-and-forget; events are
/// polled without blocking from the UI loop.
pub struct StoreHandle {
    tx: Sender<StoreRequest>,
    rx: Receiver<StoreEvent>,
    #[allow(dead_code)]
    thread: JoinHandle<()>,
}

impl StoreHandle {
    pub fn spawn(store: Box<dyn SnippetStore>) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<StoreRequest>();
        let (event_tx, event_rx) = mpsc::channel::<StoreEvent>();

        let thread = std::thread::spawn(move || {
            run_worker(store, request_rx, event_tx);
        });

        Self {
            tx: request_tx,
            rx: event_rx,
            thread,
        }
    }

    pub fn request(&self, request: StoreRequest) {
        if self.tx.send(request).is_err() {
            tracing::error!("Store worker is gone; request dropped");
        }
    }

    pub fn poll(&self) -> Option<StoreEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

fn run_worker(
    mut store: Box<dyn SnippetStore>,
    requests: Receiver<StoreRequest>,
    events: Sender<StoreEvent>,
) {
    while let Ok(request) = requests.recv() {
        let outcome = match request {
            StoreRequest::FetchAll => match store.fetch_all() {
                Ok(snippets) => events.send(StoreEvent::Loaded(snippets)),
                Err(e) => events.send(StoreEvent::Failed {
                    action: "fetch",
                    origin: None,
                    message: e.to_string(),
                }),
            },
            StoreRequest::Insert { fields, origin } => match store.insert(fields) {
                Ok(snippet) => {
                    let _ = events.send(StoreEvent::Inserted { snippet, origin });
                    reload(&mut store, &events)
                }
                Err(e) => events.send(StoreEvent::Failed {
                    action: "insert",
                    origin,
                    message: e.to_string(),
                }),
            },
            StoreRequest::Update { id, patch, origin } => match store.update(&id, patch) {
                Ok(()) => {
                    let _ = events.send(StoreEvent::Updated { id, origin });
                    reload(&mut store, &events)
                }
                Err(e) => events.send(StoreEvent::Failed {
                    action: "update",
                    origin,
                    message: e.to_string(),
                }),
            },
            StoreRequest::Delete { id } => match store.delete(&id) {
                Ok(()) => {
                    let _ = events.send(StoreEvent::Deleted { id });
                    reload(&mut store, &events)
                }
                Err(e) => events.send(StoreEvent::Failed {
                    action: "delete",
                    origin: None,
                    message: e.to_string(),
                }),
            },
        };
        if outcome.is_err() {
            // UI side hung up; nothing left to serve.
            break;
        }
    }
}

/// Full reload after a mutation: the store's answer is the truth, local
/// optimistic state is reconciled against it.
fn reload(
    store: &mut Box<dyn SnippetStore>,
    events: &Sender<StoreEvent>,
) -> Result<(), mpsc::SendError<StoreEvent>> {
    match store.fetch_all() {
        Ok(snippets) => events.send(StoreEvent::Loaded(snippets)),
        Err(e) => events.send(StoreEvent::Failed {
            action: "fetch",
            origin: None,
            message: e.to_string(),
        }),
    }
}
