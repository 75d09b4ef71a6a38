//! The preview sandbox
//!
//! Renders the most recent debounced snippet markup into a text frame for
//! the preview pane. The isolation boundary is a dedicated worker thread:
//! the renderer owns no application state and talks to the host only over
//! channels, embedded `<script>` code is never executed, and a panicking
//! render is caught inside the worker. The host never learns whether an
//! individual render succeeded; it just keeps showing the last frame it
//! received (fire-and-forget), so a wedged or dead worker cannot stall the
//! UI loop, which only ever polls with `try_recv`.
//!
//! Each render is a full replacement from the latest content; stale queued
//! contents are discarded before rendering.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::JoinHandle;

/// One rendered preview, ready to draw.
#[derive(Debug, Clone, Default)]
pub struct PreviewFrame {
    pub lines: Vec<Line<'static>>,
}

pub struct PreviewSandbox {
    tx: Sender<String>,
    rx: Receiver<PreviewFrame>,
    #[allow(dead_code)]
    thread: JoinHandle<()>,
    last: PreviewFrame,
}

impl PreviewSandbox {
    pub fn spawn() -> Self {
        let (content_tx, content_rx) = mpsc::channel::<String>();
        let (frame_tx, frame_rx) = mpsc::channel::<PreviewFrame>();

        let thread = std::thread::spawn(move || {
            while let Ok(mut content) = content_rx.recv() {
                // Latest-wins: drop anything that queued up behind us.
                while let Ok(newer) = content_rx.try_recv() {
                    content = newer;
                }
                match catch_unwind(AssertUnwindSafe(|| render_markup(&content))) {
                    Ok(lines) => {
                        if frame_tx.send(PreviewFrame { lines }).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        // Contained: the host keeps its previous frame.
                        tracing::warn!("Preview render panicked; frame dropped");
                    }
                }
            }
        });

        Self {
            tx: content_tx,
            rx: frame_rx,
            thread,
            last: PreviewFrame::default(),
        }
    }

    /// Hand new content to the sandbox. Fire-and-forget: a dead worker is
    /// logged, never surfaced.
    pub fn update(&self, content: &str) {
        if self.tx.send(content.to_string()).is_err() {
            tracing::warn!("Preview worker is gone; render request dropped");
        }
    }

    /// Latest frame the worker produced, without blocking.
    pub fn frame(&mut self) -> &PreviewFrame {
        loop {
            match self.rx.try_recv() {
                Ok(frame) => self.last = frame,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        &self.last
    }
}

/// Tolerant text projection of HTML markup.
///
/// Tags are stripped, block-level elements break lines, `<script>` and
/// `<style>` bodies are dropped entirely, a small entity set is decoded and
/// headings/links pick up terminal styling. Malformed input never fails:
/// anything unrecognized passes through as text.
pub fn render_markup(source: &str) -> Vec<Line<'static>> {
    let mut out = FrameBuilder::default();
    let mut rest = source;

    while !rest.is_empty() {
        match rest.find('<') {
            None => {
                out.text(rest);
                break;
            }
            Some(idx) => {
                let (text, tail) = rest.split_at(idx);
                out.text(text);

                if let Some(comment_end) = tail.strip_prefix("<!--").and_then(|t| t.find("-->")) {
                    rest = &tail[4 + comment_end + 3..];
                    continue;
                }

                match tail.find('>') {
                    None => {
                        // Unterminated tag: show it as text rather than eat it.
                        out.text(tail);
                        break;
                    }
                    Some(end) => {
                        let tag = &tail[1..end];
                        rest = &tail[end + 1..];
                        rest = out.tag(tag, rest);
                    }
                }
            }
        }
    }

    out.finish()
}

#[derive(Default)]
struct FrameBuilder {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    style: Style,
    list_depth: usize,
}

impl FrameBuilder {
    fn text(&mut self, raw: &str) {
        for (i, segment) in raw.split('\n').enumerate() {
            if i > 0 {
                self.soft_break();
            }
            let decoded = decode_entities(segment);
            let trimmed = if self.current.is_empty() {
                decoded.trim_start().to_string()
            } else {
                decoded
            };
            if !trimmed.is_empty() {
                self.current.push(Span::styled(trimmed, self.style));
            }
        }
    }

    /// Interpret one tag and return the remaining input (script/style bodies
    /// are consumed here).
    fn tag<'a>(&mut self, tag: &str, rest: &'a str) -> &'a str {
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        let closing = tag.starts_with('/');

        match name.as_str() {
            "script" | "style" if !closing => skip_element(rest, &name),
            "br" => {
                self.hard_break();
                rest
            }
            "p" | "div" | "section" | "article" | "header" | "footer" | "tr" => {
                self.soft_break();
                rest
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.soft_break();
                if closing {
                    self.style = Style::default();
                } else {
                    self.style = Style::default().add_modifier(Modifier::BOLD);
                }
                rest
            }
            "li" => {
                self.soft_break();
                if !closing {
                    let indent = "  ".repeat(self.list_depth.max(1));
                    self.current.push(Span::raw(format!("{indent}• ")));
                }
                rest
            }
            "ul" | "ol" => {
                if closing {
                    self.list_depth = self.list_depth.saturating_sub(1);
                } else {
                    self.list_depth += 1;
                }
                self.soft_break();
                rest
            }
            "a" => {
                self.style = if closing {
                    Style::default()
                } else {
                    Style::default()
                        .fg(Color::Blue)
                        .add_modifier(Modifier::UNDERLINED)
                };
                rest
            }
            "b" | "strong" => {
                self.style = if closing {
                    Style::default()
                } else {
                    self.style.add_modifier(Modifier::BOLD)
                };
                rest
            }
            "i" | "em" => {
                self.style = if closing {
                    Style::default()
                } else {
                    self.style.add_modifier(Modifier::ITALIC)
                };
                rest
            }
            "hr" => {
                self.soft_break();
                self.current
                    .push(Span::styled("─".repeat(40), Style::default().fg(Color::DarkGray)));
                self.soft_break();
                rest
            }
            // Unknown or inline tags contribute nothing to the projection.
            _ => rest,
        }
    }

    /// Flush the current line if it has content. Block boundaries call this,
    /// so adjacent blocks never produce blank filler lines.
    fn soft_break(&mut self) {
        if self.current.iter().any(|s| !s.content.trim().is_empty()) {
            let spans = std::mem::take(&mut self.current);
            self.lines.push(Line::from(spans));
        } else {
            self.current.clear();
        }
    }

    /// `<br>`: always ends the line, and an empty line stays visible
    /// (collapsed against a preceding blank).
    fn hard_break(&mut self) {
        if self.current.iter().any(|s| !s.content.trim().is_empty()) {
            let spans = std::mem::take(&mut self.current);
            self.lines.push(Line::from(spans));
        } else {
            self.current.clear();
            if !matches!(self.lines.last(), Some(last) if last.width() == 0) {
                self.lines.push(Line::default());
            }
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.soft_break();
        while matches!(self.lines.last(), Some(last) if last.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

/// Skip everything up to (and including) the matching close tag.
fn skip_element<'a>(rest: &'a str, name: &str) -> &'a str {
    let lower = rest.to_ascii_lowercase();
    let close = format!("</{name}");
    match lower.find(&close) {
        Some(idx) => {
            let after = &rest[idx..];
            match after.find('>') {
                Some(end) => &after[end + 1..],
                None => "",
            }
        }
        None => "",
    }
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line<'static>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn renders_visible_text() {
        let lines = render_markup("<b>hi</b><i>!</i>");
        assert_eq!(plain(&lines), vec!["hi!"]);
    }

    #[test]
    fn block_tags_break_lines() {
        let lines = render_markup("<p>one</p><p>two</p>");
        assert_eq!(plain(&lines), vec!["one", "two"]);
    }

    #[test]
    fn script_and_style_bodies_are_dropped() {
        let lines = render_markup(
            "<p>before</p><script>while(true){alert('x')}</script><style>p{color:red}</style><p>after</p>",
        );
        assert_eq!(plain(&lines), vec!["before", "after"]);
    }

    #[test]
    fn unclosed_script_swallows_to_end() {
        let lines = render_markup("<p>shown</p><script>var x = 1;");
        assert_eq!(plain(&lines), vec!["shown"]);
    }

    #[test]
    fn entities_are_decoded() {
        let lines = render_markup("a &lt;b&gt; &amp; c&nbsp;d");
        assert_eq!(plain(&lines), vec!["a <b> & c d"]);
    }

    #[test]
    fn list_items_get_bullets() {
        let lines = render_markup("<ul><li>one</li><li>two</li></ul>");
        assert_eq!(plain(&lines), vec!["  • one", "  • two"]);
    }

    #[test]
    fn comments_are_stripped() {
        let lines = render_markup("x<!-- hidden <b>not shown</b> -->y");
        assert_eq!(plain(&lines), vec!["xy"]);
    }

    #[test]
    fn malformed_markup_never_panics() {
        for source in ["<", "<<<", "<p", "</", "<p><b></p>", "&#xZZ;", "<script>"] {
            let _ = render_markup(source);
        }
    }

    #[test]
    fn sandbox_round_trip_latest_wins() {
        let mut sandbox = PreviewSandbox::spawn();
        sandbox.update("<p>first</p>");
        sandbox.update("<p>second</p>");

        // The worker is asynchronous; wait for it to drain.
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
        loop {
            let frame = sandbox.frame();
            if !frame.lines.is_empty() {
                let rows = plain(&frame.lines);
                if rows == vec!["second"] {
                    break;
                }
                // "first" may render if the worker won the race; the final
                // frame must still become "second".
            }
            assert!(std::time::Instant::now() < deadline, "no frame arrived");
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
    }
}
