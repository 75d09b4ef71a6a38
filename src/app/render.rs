//! Drawing
//!
//! Pure projection of `App` state onto the frame. The editor pane is the
//! one place with layout feedback: the surface is resized to the pane it
//! is about to be drawn into, so its scroll mirror re-clamps before the
//! lines are read back.

use super::{App, GatedAction, Overlay, Tab};
use crate::collection::TypeFilter;
use crate::session::SessionState;
use crate::snippet::{Snippet, SnippetType};
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0]);

    if app.session.is_some() {
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(chunks[1]);
        draw_list(frame, app, panes[0]);
        draw_detail(frame, app, panes[1]);
    } else {
        draw_list(frame, app, chunks[1]);
    }

    draw_status(frame, app, chunks[2]);

    if let Overlay::AddForm(form) = &app.overlay {
        draw_add_form(frame, app, form, chunks[1]);
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let filter = match app.collection.type_filter {
        TypeFilter::All => app.tr("nav_all"),
        TypeFilter::Favorites => app.tr("nav_favorites"),
        TypeFilter::Kind(SnippetType::Component) => app.tr("nav_components"),
        TypeFilter::Kind(SnippetType::Website) => app.tr("nav_websites"),
        TypeFilter::Kind(SnippetType::Template) => app.tr("nav_templates"),
    };
    let mut spans = vec![
        Span::styled(
            format!(" {} ", app.tr("app_name")),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(filter, Style::default().fg(Color::Yellow)),
    ];
    if let Some(category) = &app.collection.category {
        spans.push(Span::raw(" / "));
        spans.push(Span::styled(category.clone(), Style::default().fg(Color::Cyan)));
    }
    if !app.collection.search.is_empty() {
        spans.push(Span::styled(
            format!("  \"{}\"", app.collection.search),
            Style::default().fg(Color::Magenta),
        ));
    }
    spans.push(Span::styled(
        format!("  [{}]", app.lang.as_str()),
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn snippet_row(app: &App, snippet: &Snippet, selected: bool) -> Line<'static> {
    let dirty = app
        .session
        .as_ref()
        .filter(|s| s.snippet_id() == &snippet.id)
        .map(|s| s.is_dirty())
        .unwrap_or(false);

    let marker = if selected { "▶ " } else { "  " };
    let mut spans = vec![Span::raw(marker.to_string())];
    if snippet.is_favorite {
        spans.push(Span::styled("★ ", Style::default().fg(Color::Red)));
    }
    let title_style = if selected {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    spans.push(Span::styled(snippet.title.clone(), title_style));
    if dirty {
        spans.push(Span::styled(
            " ●",
            Style::default().fg(Color::Yellow),
        ));
    }
    spans.push(Span::styled(
        format!("  {} · {}", snippet.snippet_type.as_str(), snippet.category),
        Style::default().fg(Color::DarkGray),
    ));
    Line::from(spans)
}

fn draw_list(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let filtered = app.collection.filtered();
    if filtered.is_empty() {
        let message = if app.loading {
            app.tr("loading").to_string()
        } else {
            format!("{}\n{}", app.tr("no_codes_title"), app.tr("no_codes_desc"))
        };
        frame.render_widget(
            Paragraph::new(message).style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        return;
    }

    let selected = app.collection.selected_index();
    // Keep the selection on screen.
    let height = inner.height as usize;
    let top = selected.saturating_sub(height.saturating_sub(1));
    let lines: Vec<Line> = filtered
        .iter()
        .enumerate()
        .skip(top)
        .take(height)
        .map(|(i, snippet)| snippet_row(app, snippet, i == selected))
        .collect();
    frame.render_widget(Paragraph::new(Text::from(lines)), inner);
}

fn draw_detail(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(id) = app.open_id.clone() else {
        return;
    };
    let title = app
        .collection
        .get(&id)
        .map(|s| s.title.clone())
        .unwrap_or_default();

    let dirty = app
        .session
        .as_ref()
        .map(|s| s.is_dirty())
        .unwrap_or(false);

    let tab_label = |tab: Tab, key: &'static str| {
        if app.tab == tab {
            Span::styled(
                format!("[{}]", app.tr(key)),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(format!(" {} ", app.tr(key)), Style::default().fg(Color::DarkGray))
        }
    };
    let mut header = vec![
        Span::raw(" "),
        tab_label(Tab::Preview, "tab_preview"),
        Span::raw(" "),
        tab_label(Tab::Code, "tab_code"),
        Span::raw("  "),
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
    ];
    if dirty {
        header.push(Span::styled(
            format!(" ● {}", app.tr("unsaved_changes")),
            Style::default().fg(Color::Yellow),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(header));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match app.tab {
        Tab::Preview => {
            let frame_lines = app.preview.frame().lines.clone();
            frame.render_widget(
                Paragraph::new(Text::from(frame_lines)).wrap(Wrap { trim: false }),
                inner,
            );
        }
        Tab::Code => draw_editor(frame, app, inner),
    }
}

fn draw_editor(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(editor) = &mut app.editor else {
        return;
    };

    let gutter_width = editor.gutter_width();
    let text_width = area.width.saturating_sub(gutter_width);
    // Mirror rule: the surface is resized to the pane before reading the
    // visible lines, so both layers draw from the same clamped offset.
    editor.resize(text_width, area.height);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(gutter_width), Constraint::Min(1)])
        .split(area);

    let (_, left_col) = editor.scroll_offset();
    let mut gutter_lines = Vec::new();
    let mut text_lines = Vec::new();
    for (number, line) in editor.visible_lines() {
        gutter_lines.push(Line::from(Span::styled(
            format!("{:>width$} ", number, width = gutter_width as usize - 1),
            Style::default().fg(Color::DarkGray),
        )));
        text_lines.push(line.to_line());
    }

    frame.render_widget(Paragraph::new(Text::from(gutter_lines)), panes[0]);
    frame.render_widget(
        Paragraph::new(Text::from(text_lines)).scroll((0, left_col as u16)),
        panes[1],
    );

    if let Some((x, y)) = editor.cursor_screen_position() {
        frame.set_cursor_position(Position::new(panes[1].x + x, panes[1].y + y));
    }
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.overlay {
        Overlay::Search(prompt) => Line::from(vec![
            Span::styled("/", Style::default().fg(Color::Yellow)),
            Span::raw(prompt.input.clone()),
            Span::styled("▏", Style::default().fg(Color::Yellow)),
        ]),
        Overlay::SaveAs(prompt) => Line::from(vec![
            Span::styled(
                format!("{}: ", app.tr("save_as_title")),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(prompt.input.clone()),
            Span::styled("▏", Style::default().fg(Color::Yellow)),
        ]),
        Overlay::Secret { prompt, action } => {
            let label = match action {
                GatedAction::Delete => app.tr("confirm_delete"),
                _ => app.tr("add_security"),
            };
            let mut spans = vec![
                Span::styled(
                    format!("{label} · {}: ", app.tr("add_password_placeholder")),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(prompt.masked()),
            ];
            if prompt.error {
                spans.push(Span::styled(
                    format!("  {}", app.tr("add_password_error")),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ));
            }
            Line::from(spans)
        }
        _ => match &app.status {
            Some(status) => {
                let style = if status.is_error {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default().fg(Color::Green)
                };
                let mut spans = vec![Span::styled(status.text.clone(), style)];
                if status.is_error {
                    spans.push(Span::styled(
                        format!("  ({})", app.tr("dismiss_hint")),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                Line::from(spans)
            }
            None => {
                let hints = if app.session.is_some() {
                    match app.session.as_ref().map(|s| s.state()) {
                        Some(SessionState::Dirty) => {
                            "Tab:code/preview  ^S:save  ^N:save-as  Esc:close"
                        }
                        _ => "Tab:code/preview  ^N:save-as  Esc:close",
                    }
                } else {
                    "↑↓:select  Enter:open  a:add  d:del  f:fav  t:type  c:cat  /:search  q:quit"
                };
                Line::from(Span::styled(hints, Style::default().fg(Color::DarkGray)))
            }
        },
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_add_form(frame: &mut Frame, app: &App, form: &super::AddSnippetForm, area: Rect) {
    let width = area.width.min(60).max(20);
    let height = 12.min(area.height);
    let popup = Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    );
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", app.tr("add_snippet")));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let field = |index: usize, key: &'static str, value: String| {
        let style = if form.focus == index {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::styled(format!("{:<12}", app.tr(key)), style),
            Span::raw(value),
        ])
    };

    let code_summary = if form.code.is_empty() {
        "—".to_string()
    } else {
        format!("{} B", form.code.len())
    };
    let mut lines = vec![
        field(0, "add_title", form.title.clone()),
        field(1, "add_description", form.description.clone()),
        field(2, "add_category", form.category.clone()),
        field(3, "add_type", format!("◀ {} ▶", form.snippet_type.as_str())),
        field(4, "add_ai_prompt", form.ai_prompt.clone()),
        field(5, "add_image", form.image_path.clone()),
        Line::from(Span::styled(
            format!("{:<12}{code_summary}", app.tr("tab_code")),
            Style::default().fg(Color::DarkGray),
        )),
        Line::default(),
    ];
    if form.generating {
        lines.push(Line::from(Span::styled(
            app.tr("add_generating"),
            Style::default().fg(Color::Cyan),
        )));
    } else if let Some(error) = form.error {
        lines.push(Line::from(Span::styled(
            app.tr(error),
            Style::default().fg(Color::Red),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            format!(
                "^G:{}  Enter:{}  Esc:{}",
                app.tr("add_generate"),
                app.tr("add_submit"),
                app.tr("add_cancel")
            ),
            Style::default().fg(Color::DarkGray),
        )));
    }
    frame.render_widget(Paragraph::new(Text::from(lines)), inner);
}
