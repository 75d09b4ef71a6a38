//! Per-snippet editing session
//!
//! Owns one snippet's working draft, the debounce timer that feeds the
//! preview, and the staged save intents that have to pass the confirmation
//! gate before anything reaches the store.
//!
//! State machine: `Clean` ⇄ `Dirty` → `AwaitingConfirmation` → back. The
//! dirty flag is never tracked incrementally; it is recomputed from
//! `draft != last_saved` on every query, so it cannot desync. Dirty state
//! clears only when the store reports success, not when the request is
//! issued; an in-flight save that fails leaves the draft untouched.

use crate::debounce::Debouncer;
use crate::gate::ConfirmationGate;
use crate::snippet::{NewSnippet, Snippet, SnippetId, SnippetPatch};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Clean,
    Dirty,
    AwaitingConfirmation,
}

/// A staged mutating action, at most one per session. Staging a new intent
/// while one is pending replaces it (last-request-wins).
#[derive(Debug, Clone, PartialEq)]
pub enum SaveIntent {
    Overwrite,
    SaveAs { title: String },
}

/// What a confirmed intent asks the store to do. The session does not talk
/// to the store itself; the caller forwards these.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreAction {
    Update { id: SnippetId, patch: SnippetPatch },
    Insert { fields: NewSnippet },
}

/// Result of submitting a secret for a staged intent.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    /// Secret mismatch: intent retained, nothing sent.
    Rejected,
    /// Secret matched: forward the action, intent consumed.
    Accepted(StoreAction),
}

/// A save the store has not answered yet. Remembers the exact code that was
/// submitted so the baseline moves to what was actually persisted.
#[derive(Debug, Clone, PartialEq)]
enum InFlight {
    Overwrite { code: String },
    SaveAs { code: String },
}

pub struct SessionController {
    snippet_id: SnippetId,
    draft: String,
    last_saved: String,
    debounced: String,
    debouncer: Debouncer,
    pending: Option<SaveIntent>,
    in_flight: Option<InFlight>,
}

impl SessionController {
    /// Start a session for a snippet entering view.
    pub fn new(snippet: &Snippet, debounce_window: Duration) -> Self {
        Self {
            snippet_id: snippet.id.clone(),
            draft: snippet.code.clone(),
            last_saved: snippet.code.clone(),
            debounced: snippet.code.clone(),
            debouncer: Debouncer::new(debounce_window),
            pending: None,
            in_flight: None,
        }
    }

    pub fn snippet_id(&self) -> &SnippetId {
        &self.snippet_id
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn last_saved(&self) -> &str {
        &self.last_saved
    }

    /// The value the preview renders from. Lags the draft by the debounce
    /// window; never updates synchronously with a keystroke.
    pub fn debounced(&self) -> &str {
        &self.debounced
    }

    /// Recomputed on every call; there is no stored flag to drift.
    pub fn is_dirty(&self) -> bool {
        self.draft != self.last_saved
    }

    pub fn state(&self) -> SessionState {
        if self.pending.is_some() {
            SessionState::AwaitingConfirmation
        } else if self.is_dirty() {
            SessionState::Dirty
        } else {
            SessionState::Clean
        }
    }

    pub fn pending_intent(&self) -> Option<&SaveIntent> {
        self.pending.as_ref()
    }

    pub fn save_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Record an edit from the editor surface. Restarts the preview timer
    /// from this edit; an identical text is a no-op.
    pub fn edit(&mut self, text: &str, now: Instant) {
        if text == self.draft {
            return;
        }
        self.draft = text.to_string();
        self.debouncer.restart(now);
    }

    /// Advance the debounce timer. When the quiescence window has elapsed
    /// since the last edit, the draft becomes the debounced value and the
    /// caller should re-render the preview with the returned content.
    pub fn tick(&mut self, now: Instant) -> Option<String> {
        if !self.debouncer.fire(now) {
            return None;
        }
        if self.debounced == self.draft {
            return None;
        }
        self.debounced = self.draft.clone();
        Some(self.debounced.clone())
    }

    /// Stage an overwrite-save. Rejected outright when there is nothing to
    /// save; the save action is disabled, not merely discouraged.
    pub fn request_overwrite(&mut self) -> bool {
        if !self.is_dirty() {
            return false;
        }
        self.pending = Some(SaveIntent::Overwrite);
        true
    }

    /// Stage a save-as with a candidate title. Allowed from any state; the
    /// copy carries the current draft whether or not it is dirty.
    pub fn request_save_as(&mut self, title: String) {
        self.pending = Some(SaveIntent::SaveAs { title });
    }

    /// Drop the staged intent; draft and dirty state are untouched.
    pub fn cancel_intent(&mut self) {
        self.pending = None;
    }

    /// Submit the secret for the staged intent. On a match the intent is
    /// consumed and turned into a store action; on a mismatch it stays
    /// staged for retry and nothing is sent.
    ///
    /// `original` is the snippet this session edits; save-as copies its
    /// metadata into the new entity and never mutates it.
    pub fn confirm(
        &mut self,
        attempt: &str,
        gate: &ConfirmationGate,
        original: &Snippet,
    ) -> ConfirmOutcome {
        if !gate.verify(attempt) {
            tracing::debug!(snippet = %self.snippet_id, "Save confirmation rejected");
            return ConfirmOutcome::Rejected;
        }
        match self.pending.take() {
            Some(SaveIntent::Overwrite) => {
                let code = self.draft.clone();
                self.in_flight = Some(InFlight::Overwrite { code: code.clone() });
                ConfirmOutcome::Accepted(StoreAction::Update {
                    id: self.snippet_id.clone(),
                    patch: SnippetPatch::code(code),
                })
            }
            Some(SaveIntent::SaveAs { title }) => {
                let code = self.draft.clone();
                self.in_flight = Some(InFlight::SaveAs { code: code.clone() });
                ConfirmOutcome::Accepted(StoreAction::Insert {
                    fields: NewSnippet::copy_of(original, title, code),
                })
            }
            None => ConfirmOutcome::Rejected,
        }
    }

    /// The store answered success for an overwrite issued by this session.
    /// The submitted code becomes the baseline; edits made while the call
    /// was in flight keep the session dirty because the flag is recomputed.
    pub fn apply_overwrite_saved(&mut self) {
        if let Some(InFlight::Overwrite { code }) = self.in_flight.take() {
            self.last_saved = code;
        }
    }

    /// The store answered success for a save-as copy. The copy took the
    /// draft; this session reverts to its pre-edit baseline and ends clean
    /// at the original content. Returns the baseline so the caller can
    /// refresh the editor and preview immediately.
    pub fn apply_copy_created(&mut self) -> Option<String> {
        match self.in_flight.take() {
            Some(InFlight::SaveAs { .. }) => {
                self.draft = self.last_saved.clone();
                self.debounced = self.last_saved.clone();
                self.debouncer.cancel();
                Some(self.draft.clone())
            }
            other => {
                self.in_flight = other;
                None
            }
        }
    }

    /// The store reported failure; local state is deliberately unchanged
    /// apart from forgetting the in-flight marker.
    pub fn apply_save_failed(&mut self) {
        self.in_flight = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snippet::SnippetType;

    const WINDOW: Duration = Duration::from_millis(500);

    fn snippet(id: &str, code: &str) -> Snippet {
        Snippet {
            id: id.to_string(),
            title: "Sample".to_string(),
            description: String::new(),
            code: code.to_string(),
            snippet_type: SnippetType::Component,
            category: "Other".to_string(),
            instruction: String::new(),
            image_url: None,
            demo_url: None,
            download_url: None,
            created_at: 0,
            is_favorite: false,
        }
    }

    #[test]
    fn starts_clean_with_snippet_code() {
        let session = SessionController::new(&snippet("a", "<b>hi</b>"), WINDOW);
        assert_eq!(session.state(), SessionState::Clean);
        assert!(!session.is_dirty());
        assert_eq!(session.debounced(), "<b>hi</b>");
    }

    #[test]
    fn edit_marks_dirty_and_debounces() {
        let start = Instant::now();
        let mut session = SessionController::new(&snippet("a", "<b>hi</b>"), WINDOW);
        session.edit("<b>hi</b><i>!</i>", start);
        assert_eq!(session.state(), SessionState::Dirty);

        // Debounced value does not move with the keystroke.
        assert_eq!(session.debounced(), "<b>hi</b>");
        assert_eq!(session.tick(start + Duration::from_millis(100)), None);

        // After the quiescence window it catches up.
        let refreshed = session.tick(start + WINDOW).unwrap();
        assert_eq!(refreshed, "<b>hi</b><i>!</i>");
        assert_eq!(session.debounced(), session.draft());
    }

    #[test]
    fn rapid_edits_restart_the_window() {
        let start = Instant::now();
        let mut session = SessionController::new(&snippet("a", ""), WINDOW);
        session.edit("a", start);
        session.edit("ab", start + Duration::from_millis(400));
        assert_eq!(session.tick(start + Duration::from_millis(600)), None);
        assert_eq!(
            session.tick(start + Duration::from_millis(900)).as_deref(),
            Some("ab")
        );
    }

    #[test]
    fn editing_back_to_saved_code_is_clean() {
        let start = Instant::now();
        let mut session = SessionController::new(&snippet("a", "x"), WINDOW);
        session.edit("xy", start);
        assert!(session.is_dirty());
        session.edit("x", start);
        assert!(!session.is_dirty());
        assert_eq!(session.state(), SessionState::Clean);
    }

    #[test]
    fn overwrite_rejected_when_clean() {
        let mut session = SessionController::new(&snippet("a", "x"), WINDOW);
        assert!(!session.request_overwrite());
        assert_eq!(session.state(), SessionState::Clean);
    }

    #[test]
    fn wrong_secret_keeps_intent_and_sends_nothing() {
        let gate = ConfirmationGate::new("right");
        let original = snippet("a", "x");
        let mut session = SessionController::new(&original, WINDOW);
        session.edit("xy", Instant::now());
        assert!(session.request_overwrite());
        assert_eq!(session.state(), SessionState::AwaitingConfirmation);

        let outcome = session.confirm("wrong", &gate, &original);
        assert_eq!(outcome, ConfirmOutcome::Rejected);
        assert_eq!(session.state(), SessionState::AwaitingConfirmation);
        assert!(session.is_dirty());
    }

    #[test]
    fn correct_secret_emits_exactly_one_update() {
        let gate = ConfirmationGate::new("right");
        let original = snippet("a", "x");
        let mut session = SessionController::new(&original, WINDOW);
        session.edit("xy", Instant::now());
        session.request_overwrite();

        let outcome = session.confirm("right", &gate, &original);
        match outcome {
            ConfirmOutcome::Accepted(StoreAction::Update { id, patch }) => {
                assert_eq!(id, "a");
                assert_eq!(patch.code.as_deref(), Some("xy"));
            }
            other => panic!("expected update, got {other:?}"),
        }
        // Intent consumed, but dirty until the store confirms.
        assert!(session.pending_intent().is_none());
        assert!(session.is_dirty());
        assert!(session.save_in_flight());

        session.apply_overwrite_saved();
        assert!(!session.is_dirty());
        assert_eq!(session.state(), SessionState::Clean);
        assert_eq!(session.last_saved(), "xy");
    }

    #[test]
    fn save_failure_leaves_dirty_state() {
        let gate = ConfirmationGate::new("s");
        let original = snippet("a", "x");
        let mut session = SessionController::new(&original, WINDOW);
        session.edit("xy", Instant::now());
        session.request_overwrite();
        session.confirm("s", &gate, &original);

        session.apply_save_failed();
        assert!(session.is_dirty());
        assert_eq!(session.draft(), "xy");
        assert_eq!(session.last_saved(), "x");
    }

    #[test]
    fn edits_during_inflight_save_stay_dirty_after_success() {
        let gate = ConfirmationGate::new("s");
        let original = snippet("a", "x");
        let mut session = SessionController::new(&original, WINDOW);
        session.edit("xy", Instant::now());
        session.request_overwrite();
        session.confirm("s", &gate, &original);

        // More typing while the store call is outstanding.
        session.edit("xyz", Instant::now());
        session.apply_overwrite_saved();
        assert_eq!(session.last_saved(), "xy");
        assert!(session.is_dirty());
    }

    #[test]
    fn save_as_copies_draft_and_reverts_original() {
        let gate = ConfirmationGate::new("s");
        let original = snippet("a", "x");
        let mut session = SessionController::new(&original, WINDOW);
        session.edit("edited", Instant::now());
        session.request_save_as("Copy".to_string());

        let outcome = session.confirm("s", &gate, &original);
        match outcome {
            ConfirmOutcome::Accepted(StoreAction::Insert { fields }) => {
                assert_eq!(fields.title, "Copy");
                assert_eq!(fields.code, "edited");
                assert_eq!(fields.category, original.category);
            }
            other => panic!("expected insert, got {other:?}"),
        }

        let baseline = session.apply_copy_created().unwrap();
        assert_eq!(baseline, "x");
        assert_eq!(session.draft(), "x");
        assert_eq!(session.debounced(), "x");
        assert!(!session.is_dirty());
        assert_eq!(session.state(), SessionState::Clean);
    }

    #[test]
    fn new_intent_replaces_pending_one() {
        let mut session = SessionController::new(&snippet("a", "x"), WINDOW);
        session.edit("y", Instant::now());
        session.request_overwrite();
        session.request_save_as("Copy".to_string());
        assert_eq!(
            session.pending_intent(),
            Some(&SaveIntent::SaveAs {
                title: "Copy".to_string()
            })
        );
    }

    #[test]
    fn cancel_discards_intent_only() {
        let mut session = SessionController::new(&snippet("a", "x"), WINDOW);
        session.edit("y", Instant::now());
        session.request_overwrite();
        session.cancel_intent();
        assert_eq!(session.state(), SessionState::Dirty);
        assert_eq!(session.draft(), "y");
    }
}
