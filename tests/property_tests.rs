// Property-based tests using proptest
// Random inputs and edit sequences, checking the invariants that must hold
// in every reachable state.

use codelib::debounce::Debouncer;
use codelib::highlight::{plain_text, Highlighter};
use codelib::preview::render_markup;
use codelib::session::SessionController;
use codelib::snippet::{Snippet, SnippetType};
use proptest::prelude::*;
use std::time::{Duration, Instant};

fn snippet(code: &str) -> Snippet {
    Snippet {
        id: "prop".to_string(),
        title: "Prop".to_string(),
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

proptest! {
    /// highlight(T) is defined for every T and the plain text recoverable
    /// from its output equals T.
    #[test]
    fn highlight_is_total_and_content_preserving(source in "\\PC{0,200}") {
        let mut highlighter = Highlighter::new();
        let lines = highlighter.highlight(&source);
        prop_assert!(!lines.is_empty());
        prop_assert_eq!(plain_text(&lines), source);
    }

    /// Same, for inputs dense in markup-ish characters, including newlines.
    #[test]
    fn highlight_survives_taglike_noise(source in "[<>/a-z\"'= \n&;{}()-]{0,300}") {
        let mut highlighter = Highlighter::new();
        let lines = highlighter.highlight(&source);
        prop_assert_eq!(lines.len(), source.split('\n').count().max(1));
        prop_assert_eq!(plain_text(&lines), source);
    }

    /// The preview projection never fails, whatever the markup.
    #[test]
    fn preview_render_is_total(source in "\\PC{0,300}") {
        let _ = render_markup(&source);
    }

    /// For any edit sequence, dirty is true iff draft != last-saved, and the
    /// debounced value converges to the draft only after a quiet window.
    #[test]
    fn session_invariants_under_random_edits(
        edits in prop::collection::vec(("[a-z<>/ ]{0,20}", 0u64..1000), 1..20)
    ) {
        let window = Duration::from_millis(500);
        let original = snippet("start");
        let mut session = SessionController::new(&original, window);
        let mut now = Instant::now();

        for (text, advance_ms) in edits {
            let debounced_before = session.debounced().to_string();
            session.edit(&text, now);

            // Recomputed dirty flag, in every state.
            prop_assert_eq!(session.is_dirty(), session.draft() != "start");
            // A keystroke never moves the debounced value synchronously.
            prop_assert_eq!(session.debounced(), debounced_before.as_str());

            now += Duration::from_millis(advance_ms);
            session.tick(now);
            if advance_ms >= 500 {
                // Quiet for a full window: debounced caught up with draft.
                prop_assert_eq!(session.debounced(), session.draft());
            }
        }

        // After quiescence the two always converge.
        now += window;
        session.tick(now);
        prop_assert_eq!(session.debounced(), session.draft());
    }

    /// A debouncer fires exactly once per armed period, never early.
    #[test]
    fn debouncer_never_fires_early(delays in prop::collection::vec(0u64..1000, 1..30)) {
        let window = Duration::from_millis(500);
        let mut debouncer = Debouncer::new(window);
        let mut now = Instant::now();
        let mut armed_at = now;

        debouncer.restart(now);
        for delay in delays {
            now += Duration::from_millis(delay);
            let fired = debouncer.fire(now);
            if fired {
                prop_assert!(now.duration_since(armed_at) >= window);
                debouncer.restart(now);
                armed_at = now;
            }
        }
    }
}
