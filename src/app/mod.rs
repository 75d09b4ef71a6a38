//! The terminal application
//!
//! Composition root: one synchronous event loop that ticks the open editing
//! session, drains worker events (store, preview, generation) without
//! blocking, and redraws. Workers never touch application state directly;
//! everything arrives as a polled message.

mod input;
mod render;

use crate::collection::CollectionView;
use crate::config::Config;
use crate::editor::EditorSurface;
use crate::gate::{ConfirmationGate, SecretPrompt};
use crate::generate::{spawn_generation, GenerationHandle, SnippetGenerator};
use crate::i18n::{tr, Language};
use crate::preview::PreviewSandbox;
use crate::session::{ConfirmOutcome, SessionController, StoreAction};
use crate::snippet::{NewSnippet, Snippet, SnippetId, SnippetPatch, SnippetType};
use crate::store::{StoreEvent, StoreHandle, StoreRequest};
use crate::upload::{spawn_upload, ImageHost, UploadHandle};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Which pane of an open snippet is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Preview,
    Code,
}

/// Mutating action staged behind the secret prompt. The pending delete id
/// lives in the collection view; save intents live in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedAction {
    Overwrite,
    SaveAs,
    Delete,
}

/// Single-line text input used by the search, save-as and form prompts.
#[derive(Debug, Clone, Default)]
pub struct TextPrompt {
    pub input: String,
}

impl TextPrompt {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self { input: text.into() }
    }

    pub fn insert_char(&mut self, ch: char) {
        self.input.push(ch);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }
}

/// Add-snippet form. The code field is filled by generation (or left empty
/// for templates); everything else is typed.
pub struct AddSnippetForm {
    pub title: String,
    pub description: String,
    pub category: String,
    pub ai_prompt: String,
    pub code: String,
    /// Local file to upload as the thumbnail; templates only.
    pub image_path: String,
    pub snippet_type: SnippetType,
    /// 0 = title, 1 = description, 2 = category, 3 = type, 4 = AI prompt,
    /// 5 = thumbnail path
    pub focus: usize,
    pub error: Option<&'static str>,
    pub generating: bool,
}

pub const FORM_FIELDS: usize = 6;

impl AddSnippetForm {
    pub fn new() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: String::new(),
            ai_prompt: String::new(),
            code: String::new(),
            image_path: String::new(),
            snippet_type: SnippetType::Component,
            focus: 0,
            error: None,
            generating: false,
        }
    }

    pub fn focused_field_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            0 => Some(&mut self.title),
            1 => Some(&mut self.description),
            2 => Some(&mut self.category),
            4 => Some(&mut self.ai_prompt),
            5 => Some(&mut self.image_path),
            _ => None,
        }
    }

    /// Local validation; nothing reaches the store when this fails.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("validation_title");
        }
        if self.category.trim().is_empty() {
            return Err("validation_category");
        }
        if self.code.trim().is_empty() && self.snippet_type != SnippetType::Template {
            return Err("validation_code");
        }
        Ok(())
    }

    pub fn into_fields(self) -> NewSnippet {
        NewSnippet {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            code: self.code,
            snippet_type: self.snippet_type,
            category: self.category.trim().to_string(),
            instruction: String::new(),
            image_url: None,
            demo_url: None,
            download_url: None,
        }
    }
}

/// Modal state above the two main panes.
pub enum Overlay {
    None,
    Search(TextPrompt),
    SaveAs(TextPrompt),
    Secret {
        prompt: SecretPrompt,
        action: GatedAction,
    },
    AddForm(AddSnippetForm),
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

pub struct App {
    pub config: Config,
    pub lang: Language,
    pub gate: ConfirmationGate,
    pub collection: CollectionView,
    pub store: StoreHandle,
    pub preview: PreviewSandbox,
    pub generator: Arc<dyn SnippetGenerator>,
    pub generation: Option<GenerationHandle>,
    pub image_host: Arc<dyn ImageHost>,
    /// A template insert waiting for its thumbnail upload to finish.
    pending_insert: Option<(NewSnippet, UploadHandle)>,

    /// Editing state for the open snippet, if any.
    pub open_id: Option<SnippetId>,
    pub session: Option<SessionController>,
    pub editor: Option<EditorSurface>,
    pub tab: Tab,

    pub overlay: Overlay,
    pub status: Option<StatusMessage>,
    pub loading: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        config: Config,
        store: StoreHandle,
        generator: Arc<dyn SnippetGenerator>,
        image_host: Arc<dyn ImageHost>,
    ) -> Self {
        let lang = Language::from_tag(&config.locale).unwrap_or_default();
        let gate = ConfirmationGate::new(config.secret.clone());
        Self {
            config,
            lang,
            gate,
            collection: CollectionView::new(),
            store,
            preview: PreviewSandbox::spawn(),
            generator,
            generation: None,
            image_host,
            pending_insert: None,
            open_id: None,
            session: None,
            editor: None,
            tab: Tab::Preview,
            overlay: Overlay::None,
            status: None,
            loading: false,
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        self.loading = true;
        self.store.request(StoreRequest::FetchAll);

        while !self.should_quit {
            self.tick(Instant::now());
            terminal.draw(|frame| render::draw(frame, self))?;

            if event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) if key.kind != KeyEventKind::Release => {
                        input::handle_key(self, key);
                    }
                    Event::Resize(_, _) => {
                        // The next draw recomputes pane sizes; the editor is
                        // resized there so its scroll mirror re-clamps.
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// One scheduler pass: debounce timers and worker channels.
    pub fn tick(&mut self, now: Instant) {
        if let Some(session) = &mut self.session {
            if let Some(content) = session.tick(now) {
                self.preview.update(&content);
            }
        }
        while let Some(event) = self.store.poll() {
            self.handle_store_event(event);
        }
        self.poll_generation();
        self.poll_upload();
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.config.debounce_ms)
    }

    pub fn tr(&self, key: &'static str) -> &'static str {
        tr(self.lang, key)
    }

    // --- session lifecycle ---

    /// Open a snippet: the session exists while the snippet is in view.
    pub fn open_snippet(&mut self, snippet: &Snippet) {
        self.session = Some(SessionController::new(snippet, self.debounce_window()));
        // Size is provisional; the first draw resizes to the real pane.
        self.editor = Some(EditorSurface::new(&snippet.code, 80, 24));
        self.open_id = Some(snippet.id.clone());
        self.tab = Tab::Preview;
        self.preview.update(&snippet.code);
    }

    /// Close the open snippet, discarding any unsaved draft.
    pub fn close_snippet(&mut self) {
        self.session = None;
        self.editor = None;
        self.open_id = None;
        self.overlay = Overlay::None;
    }

    /// Forward an editor change into the session.
    pub fn on_editor_change(&mut self, text: &str, now: Instant) {
        if let Some(session) = &mut self.session {
            session.edit(text, now);
        }
    }

    // --- gated actions ---

    pub fn stage_overwrite(&mut self) {
        let Some(session) = &mut self.session else {
            return;
        };
        if session.request_overwrite() {
            self.overlay = Overlay::Secret {
                prompt: SecretPrompt::new(),
                action: GatedAction::Overwrite,
            };
        }
    }

    pub fn stage_save_as(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let title = self
            .collection
            .get(session.snippet_id())
            .map(|s| format!("{} ({})", s.title, self.tr("copy_suffix")))
            .unwrap_or_default();
        self.overlay = Overlay::SaveAs(TextPrompt::with_text(title));
    }

    pub fn stage_delete(&mut self, id: SnippetId) {
        self.collection.begin_delete(id);
        self.overlay = Overlay::Secret {
            prompt: SecretPrompt::new(),
            action: GatedAction::Delete,
        };
    }

    /// The secret prompt was submitted for `action`.
    pub fn confirm_gated(&mut self, action: GatedAction, attempt: &str) -> bool {
        match action {
            GatedAction::Overwrite | GatedAction::SaveAs => {
                let (Some(session), Some(id)) = (&mut self.session, &self.open_id) else {
                    return true;
                };
                let Some(original) = self.collection.get(id).cloned() else {
                    return true;
                };
                match session.confirm(attempt, &self.gate, &original) {
                    ConfirmOutcome::Rejected => false,
                    ConfirmOutcome::Accepted(StoreAction::Update { id, patch }) => {
                        self.store.request(StoreRequest::Update {
                            id: id.clone(),
                            patch,
                            origin: Some(id),
                        });
                        self.set_status(self.tr("saving").to_string(), false);
                        true
                    }
                    ConfirmOutcome::Accepted(StoreAction::Insert { fields }) => {
                        self.store.request(StoreRequest::Insert {
                            fields,
                            origin: self.open_id.clone(),
                        });
                        self.set_status(self.tr("saving").to_string(), false);
                        true
                    }
                }
            }
            GatedAction::Delete => {
                if !self.gate.verify(attempt) {
                    return false;
                }
                if let Some(id) = self.collection.take_pending_delete() {
                    self.store.request(StoreRequest::Delete { id });
                    self.set_status(self.tr("saving").to_string(), false);
                }
                true
            }
        }
    }

    // --- ungated actions ---

    /// Favorite toggle bypasses the session state machine entirely.
    pub fn toggle_favorite(&mut self, id: &str) {
        if let Some(snippet) = self.collection.get(id) {
            self.store.request(StoreRequest::Update {
                id: id.to_string(),
                patch: SnippetPatch::favorite(!snippet.is_favorite),
                origin: None,
            });
        }
    }

    pub fn submit_add_form(&mut self, form: AddSnippetForm) -> Option<AddSnippetForm> {
        if let Err(key) = form.validate() {
            let mut form = form;
            form.error = Some(key);
            return Some(form);
        }
        let image_path = form.image_path.trim().to_string();
        let fields = form.into_fields();

        // Templates with a local thumbnail upload it first; the insert waits
        // for the URL.
        if fields.snippet_type == SnippetType::Template && !image_path.is_empty() {
            let handle = spawn_upload(Arc::clone(&self.image_host), image_path.into());
            self.pending_insert = Some((fields, handle));
        } else {
            self.store
                .request(StoreRequest::Insert { fields, origin: None });
        }
        self.set_status(self.tr("saving").to_string(), false);
        None
    }

    fn poll_upload(&mut self) {
        let Some((_, handle)) = &mut self.pending_insert else {
            return;
        };
        let Some(result) = handle.try_result() else {
            return;
        };
        let Some((mut fields, _)) = self.pending_insert.take() else {
            return;
        };
        match result {
            Ok(url) => {
                fields.image_url = Some(url);
                self.store
                    .request(StoreRequest::Insert { fields, origin: None });
            }
            Err(e) => {
                // No partial mutation: the snippet is not inserted without
                // its thumbnail.
                self.set_status(format!("{}: {e}", self.tr("error_prefix")), true);
            }
        }
    }

    /// Kick off a one-shot generation. Returns false when nothing was
    /// started (empty prompt, or one already running).
    pub fn start_generation(&mut self, prompt: String, snippet_type: SnippetType) -> bool {
        if prompt.trim().is_empty() || self.generation.is_some() {
            return false;
        }
        self.generation = Some(spawn_generation(
            Arc::clone(&self.generator),
            prompt,
            snippet_type,
            self.lang,
        ));
        true
    }

    fn poll_generation(&mut self) {
        let Some(handle) = &mut self.generation else {
            return;
        };
        let Some(result) = handle.try_result() else {
            return;
        };
        self.generation = None;

        let Overlay::AddForm(form) = &mut self.overlay else {
            // Form was closed while generating; drop the result.
            return;
        };
        form.generating = false;
        match result {
            Ok(generated) => {
                form.title = generated.title;
                form.description = generated.description;
                form.code = generated.code;
                form.error = None;
            }
            Err(e) => {
                let text = format!("{}: {e}", tr(self.lang, "error_prefix"));
                self.status = Some(StatusMessage {
                    text,
                    is_error: true,
                });
            }
        }
    }

    // --- store events ---

    fn handle_store_event(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::Loaded(snippets) => {
                self.loading = false;
                self.collection.set_snippets(snippets);
                // The session dies with its snippet's visibility.
                if let Some(id) = &self.open_id {
                    if self.collection.get(id).is_none() {
                        self.close_snippet();
                    }
                }
            }
            StoreEvent::Updated { origin, .. } => {
                if self.session_originated(&origin) {
                    if let Some(session) = &mut self.session {
                        session.apply_overwrite_saved();
                    }
                    self.set_status(self.tr("saved").to_string(), false);
                }
            }
            StoreEvent::Inserted { snippet, origin } => {
                if self.session_originated(&origin) {
                    let baseline = self
                        .session
                        .as_mut()
                        .and_then(|session| session.apply_copy_created());
                    if let Some(baseline) = baseline {
                        if let Some(editor) = &mut self.editor {
                            editor.set_text(&baseline);
                        }
                        self.preview.update(&baseline);
                    }
                }
                self.set_status(
                    format!("{}: {}", self.tr("saved"), snippet.title),
                    false,
                );
            }
            StoreEvent::Deleted { id } => {
                self.set_status(self.tr("deleted").to_string(), false);
                if self.open_id.as_deref() == Some(id.as_str()) {
                    self.close_snippet();
                }
            }
            StoreEvent::Failed {
                action,
                origin,
                message,
            } => {
                tracing::warn!("Store {action} failed: {message}");
                if self.session_originated(&origin) {
                    if let Some(session) = &mut self.session {
                        session.apply_save_failed();
                    }
                }
                self.set_status(
                    format!("{}: {message}", self.tr("error_prefix")),
                    true,
                );
            }
        }
    }

    fn session_originated(&self, origin: &Option<SnippetId>) -> bool {
        match (origin, &self.open_id) {
            (Some(origin), Some(open)) => origin == open,
            _ => false,
        }
    }

    pub fn set_status(&mut self, text: String, is_error: bool) {
        self.status = Some(StatusMessage { text, is_error });
    }
}
