//! Keyboard dispatch
//!
//! One entry point per key event, routed by overlay first, then by whether
//! a snippet is open. Browse keys are single letters; editing uses control
//! chords so typing is never ambiguous.

use super::{AddSnippetForm, App, GatedAction, Overlay, Tab, TextPrompt, FORM_FIELDS};
use crate::collection::TypeFilter;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Instant;

pub fn handle_key(app: &mut App, key: KeyEvent) {
    // A visible error message is dismissed by the next Esc anywhere.
    if key.code == KeyCode::Esc {
        if let Some(status) = &app.status {
            if status.is_error {
                app.status = None;
                return;
            }
        }
    }

    match std::mem::replace(&mut app.overlay, Overlay::None) {
        Overlay::None => {
            if app.session.is_some() {
                handle_open_snippet_key(app, key);
            } else {
                handle_browse_key(app, key);
            }
        }
        Overlay::Search(prompt) => handle_search_key(app, prompt, key),
        Overlay::SaveAs(prompt) => handle_save_as_key(app, prompt, key),
        Overlay::Secret { prompt, action } => handle_secret_key(app, prompt, action, key),
        Overlay::AddForm(form) => handle_form_key(app, form, key),
    }
}

fn handle_browse_key(app: &mut App, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) | (KeyCode::Char('q'), KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::NONE) => {
            app.collection.select_next();
        }
        (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::NONE) => {
            app.collection.select_prev();
        }
        (KeyCode::Enter, _) => {
            if let Some(snippet) = app.collection.selected_snippet().cloned() {
                app.open_snippet(&snippet);
            }
        }
        (KeyCode::Char('/'), KeyModifiers::NONE) => {
            app.overlay = Overlay::Search(TextPrompt::with_text(app.collection.search.clone()));
        }
        (KeyCode::Char('t'), KeyModifiers::NONE) => {
            let next = app.collection.type_filter.next();
            app.collection.set_type_filter(next);
        }
        (KeyCode::Char('v'), KeyModifiers::NONE) => {
            app.collection.set_type_filter(TypeFilter::Favorites);
        }
        (KeyCode::Char('c'), KeyModifiers::NONE) => {
            app.collection.cycle_category();
        }
        (KeyCode::Char('f'), KeyModifiers::NONE) => {
            if let Some(snippet) = app.collection.selected_snippet() {
                let id = snippet.id.clone();
                app.toggle_favorite(&id);
            }
        }
        (KeyCode::Char('d'), KeyModifiers::NONE) => {
            if let Some(snippet) = app.collection.selected_snippet() {
                let id = snippet.id.clone();
                app.stage_delete(id);
            }
        }
        (KeyCode::Char('a'), KeyModifiers::NONE) => {
            app.overlay = Overlay::AddForm(AddSnippetForm::new());
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            app.loading = true;
            app.store.request(crate::store::StoreRequest::FetchAll);
        }
        (KeyCode::Char('l'), KeyModifiers::NONE) => {
            app.lang = app.lang.next();
        }
        _ => {}
    }
}

fn handle_open_snippet_key(app: &mut App, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            // Discard: close without saving, no gate involved.
            app.close_snippet();
            return;
        }
        (KeyCode::Tab, KeyModifiers::NONE) => {
            app.tab = match app.tab {
                Tab::Preview => Tab::Code,
                Tab::Code => Tab::Preview,
            };
            return;
        }
        (KeyCode::Char('s'), KeyModifiers::CONTROL) => {
            app.stage_overwrite();
            return;
        }
        (KeyCode::Char('n'), KeyModifiers::CONTROL) => {
            app.stage_save_as();
            return;
        }
        (KeyCode::Char('q'), KeyModifiers::CONTROL) => {
            app.should_quit = true;
            return;
        }
        _ => {}
    }

    if app.tab != Tab::Code {
        return;
    }
    let now = Instant::now();
    let Some(editor) = &mut app.editor else {
        return;
    };

    let change = match (key.code, key.modifiers) {
        (KeyCode::Char(ch), KeyModifiers::NONE) | (KeyCode::Char(ch), KeyModifiers::SHIFT) => {
            Some(editor.insert_char(ch))
        }
        (KeyCode::Enter, _) => Some(editor.insert_newline()),
        (KeyCode::Backspace, _) => editor.backspace(),
        (KeyCode::Delete, _) => editor.delete_forward(),
        (KeyCode::Left, KeyModifiers::NONE) => {
            editor.move_left();
            None
        }
        (KeyCode::Right, KeyModifiers::NONE) => {
            editor.move_right();
            None
        }
        (KeyCode::Up, KeyModifiers::NONE) => {
            editor.move_up();
            None
        }
        (KeyCode::Down, KeyModifiers::NONE) => {
            editor.move_down();
            None
        }
        (KeyCode::Home, _) => {
            editor.move_line_start();
            None
        }
        (KeyCode::End, _) => {
            editor.move_line_end();
            None
        }
        (KeyCode::PageUp, _) => {
            editor.page_up();
            None
        }
        (KeyCode::PageDown, _) => {
            editor.page_down();
            None
        }
        _ => None,
    };

    if let Some(change) = change {
        app.on_editor_change(&change.text, now);
    }
}

fn handle_search_key(app: &mut App, mut prompt: TextPrompt, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter => {
            // Filter already applied live; just close.
        }
        KeyCode::Backspace => {
            prompt.backspace();
            app.collection.search = prompt.input.clone();
            app.overlay = Overlay::Search(prompt);
        }
        KeyCode::Char(ch) => {
            prompt.insert_char(ch);
            app.collection.search = prompt.input.clone();
            app.overlay = Overlay::Search(prompt);
        }
        _ => {
            app.overlay = Overlay::Search(prompt);
        }
    }
}

fn handle_save_as_key(app: &mut App, mut prompt: TextPrompt, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            // Abandon the save-as before it was ever staged.
        }
        KeyCode::Enter => {
            let title = prompt.input.trim().to_string();
            if title.is_empty() {
                app.overlay = Overlay::SaveAs(prompt);
                return;
            }
            if let Some(session) = &mut app.session {
                session.request_save_as(title);
            }
            app.overlay = Overlay::Secret {
                prompt: crate::gate::SecretPrompt::new(),
                action: GatedAction::SaveAs,
            };
        }
        KeyCode::Backspace => {
            prompt.backspace();
            app.overlay = Overlay::SaveAs(prompt);
        }
        KeyCode::Char(ch) => {
            prompt.insert_char(ch);
            app.overlay = Overlay::SaveAs(prompt);
        }
        _ => {
            app.overlay = Overlay::SaveAs(prompt);
        }
    }
}

fn handle_secret_key(
    app: &mut App,
    mut prompt: crate::gate::SecretPrompt,
    action: GatedAction,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            // Cancelled: pending intent is discarded, draft untouched.
            match action {
                GatedAction::Overwrite | GatedAction::SaveAs => {
                    if let Some(session) = &mut app.session {
                        session.cancel_intent();
                    }
                }
                GatedAction::Delete => {
                    app.collection.cancel_delete();
                }
            }
        }
        KeyCode::Enter => {
            let attempt = prompt.input.clone();
            if app.confirm_gated(action, &attempt) {
                // Accepted; overlay stays closed.
            } else {
                prompt.error = true;
                prompt.input.clear();
                app.overlay = Overlay::Secret { prompt, action };
            }
        }
        KeyCode::Backspace => {
            prompt.backspace();
            app.overlay = Overlay::Secret { prompt, action };
        }
        KeyCode::Char(ch) => {
            prompt.insert_char(ch);
            app.overlay = Overlay::Secret { prompt, action };
        }
        _ => {
            app.overlay = Overlay::Secret { prompt, action };
        }
    }
}

fn handle_form_key(app: &mut App, mut form: AddSnippetForm, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            // Drop the form; a pending generation result will be ignored.
        }
        (KeyCode::Enter, _) => {
            if let Some(form) = app.submit_add_form(form) {
                // Validation failed; reopen with the inline error set.
                app.overlay = Overlay::AddForm(form);
            }
        }
        (KeyCode::Tab, KeyModifiers::NONE) | (KeyCode::Down, _) => {
            form.focus = (form.focus + 1) % FORM_FIELDS;
            app.overlay = Overlay::AddForm(form);
        }
        (KeyCode::BackTab, _) | (KeyCode::Up, _) => {
            form.focus = (form.focus + FORM_FIELDS - 1) % FORM_FIELDS;
            app.overlay = Overlay::AddForm(form);
        }
        (KeyCode::Left, _) | (KeyCode::Right, _) if form.focus == 3 => {
            form.snippet_type = form.snippet_type.next();
            app.overlay = Overlay::AddForm(form);
        }
        (KeyCode::Char('g'), KeyModifiers::CONTROL) => {
            if !form.generating {
                form.error = None;
                form.generating = app.start_generation(form.ai_prompt.clone(), form.snippet_type);
            }
            app.overlay = Overlay::AddForm(form);
        }
        (KeyCode::Backspace, _) => {
            if let Some(field) = form.focused_field_mut() {
                field.pop();
            }
            form.error = None;
            app.overlay = Overlay::AddForm(form);
        }
        (KeyCode::Char(ch), KeyModifiers::NONE) | (KeyCode::Char(ch), KeyModifiers::SHIFT) => {
            if let Some(field) = form.focused_field_mut() {
                field.push(ch);
            }
            form.error = None;
            app.overlay = Overlay::AddForm(form);
        }
        _ => {
            app.overlay = Overlay::AddForm(form);
        }
    }
}
