//! Syntax highlighting with tree-sitter
//!
//! Snippets are HTML (with embedded CSS/JS), so a single HTML grammar is
//! used for everything, the same way the original highlighted all snippet
//! code as `language-html`.
//!
//! The engine is display-only: it never mutates or executes its input, and
//! it is total. Whatever tree-sitter does with malformed markup, the spans
//! returned always concatenate back to the exact input text; if highlighting
//! fails outright, the same text comes back as unstyled spans.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use tree_sitter_highlight::{HighlightConfiguration, HighlightEvent, Highlighter as TSHighlighter};

/// Highlight category names passed to `configure()`. The order matches
/// `HighlightCategory::from_index`.
const HIGHLIGHT_NAMES: &[&str] = &[
    "attribute",
    "comment",
    "constant",
    "function",
    "keyword",
    "number",
    "operator",
    "property",
    "string",
    "tag",
    "variable",
];

/// Highlight category for a span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightCategory {
    Attribute,
    Comment,
    Constant,
    Function,
    Keyword,
    Number,
    Operator,
    Property,
    String,
    Tag,
    Variable,
}

impl HighlightCategory {
    /// Map a highlight index to a category. The index is the position in
    /// `HIGHLIGHT_NAMES`.
    fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Attribute),
            1 => Some(Self::Comment),
            2 => Some(Self::Constant),
            3 => Some(Self::Function),
            4 => Some(Self::Keyword),
            5 => Some(Self::Number),
            6 => Some(Self::Operator),
            7 => Some(Self::Property),
            8 => Some(Self::String),
            9 => Some(Self::Tag),
            10 => Some(Self::Variable),
            _ => None,
        }
    }

    /// Terminal style for this category
    pub fn style(self) -> Style {
        match self {
            Self::Attribute => Style::default().fg(Color::Yellow),
            Self::Comment => Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            Self::Constant => Style::default().fg(Color::Cyan),
            Self::Function => Style::default().fg(Color::Blue),
            Self::Keyword => Style::default().fg(Color::Magenta),
            Self::Number => Style::default().fg(Color::Cyan),
            Self::Operator => Style::default().fg(Color::White),
            Self::Property => Style::default().fg(Color::Cyan),
            Self::String => Style::default().fg(Color::Green),
            Self::Tag => Style::default().fg(Color::Red),
            Self::Variable => Style::default().fg(Color::White),
        }
    }
}

/// A styled run of text. Styling affects presentation only; `text` is a
/// verbatim slice of the source.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightSpan {
    pub style: Style,
    pub text: String,
}

/// One display line of highlighted source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightedLine {
    pub spans: Vec<HighlightSpan>,
}

impl HighlightedLine {
    /// The plain text of this line, styles dropped.
    pub fn plain(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Render as a ratatui line.
    pub fn to_line(&self) -> Line<'static> {
        Line::from(
            self.spans
                .iter()
                .map(|s| Span::styled(s.text.clone(), s.style))
                .collect::<Vec<_>>(),
        )
    }
}

/// Reassemble the original source from highlighted lines.
pub fn plain_text(lines: &[HighlightedLine]) -> String {
    lines
        .iter()
        .map(|l| l.plain())
        .collect::<Vec<_>>()
        .join("\n")
}

/// HTML syntax highlighter.
///
/// Holds the parsed highlight queries and the tree-sitter parser state.
/// `highlight` needs `&mut self` because the underlying parser reuses its
/// allocation, but the output depends only on the input text.
pub struct Highlighter {
    ts_highlighter: TSHighlighter,
    /// None when the grammar failed to load; every call then takes the
    /// plain fallback path.
    config: Option<HighlightConfiguration>,
}

impl Highlighter {
    pub fn new() -> Self {
        let config = match html_config() {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::error!("Failed to create HTML highlight config: {e}");
                None
            }
        };
        Self {
            ts_highlighter: TSHighlighter::new(),
            config,
        }
    }

    /// Highlight `source` into display lines.
    ///
    /// Total: any input, including malformed markup, yields lines whose
    /// concatenation (joined with `\n`) equals `source`. Empty input yields
    /// one empty line.
    pub fn highlight(&mut self, source: &str) -> Vec<HighlightedLine> {
        let Some(config) = &self.config else {
            return plain_lines(source);
        };

        let events = match self
            .ts_highlighter
            .highlight(config, source.as_bytes(), None, |_| None)
        {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("Highlight failed, rendering plain: {e}");
                return plain_lines(source);
            }
        };

        let mut builder = LineBuilder::new();
        let mut current: Option<HighlightCategory> = None;

        for event in events {
            match event {
                Ok(HighlightEvent::Source { start, end }) => {
                    let Some(text) = source.get(start..end) else {
                        // A capture boundary landed inside a UTF-8 sequence;
                        // content preservation wins over styling.
                        tracing::warn!("Highlight span not on char boundary, rendering plain");
                        return plain_lines(source);
                    };
                    let style = current.map(|c| c.style()).unwrap_or_default();
                    builder.push(text, style);
                }
                Ok(HighlightEvent::HighlightStart(s)) => {
                    current = HighlightCategory::from_index(s.0);
                }
                Ok(HighlightEvent::HighlightEnd) => {
                    current = None;
                }
                Err(e) => {
                    tracing::warn!("Highlight stream error, rendering plain: {e}");
                    return plain_lines(source);
                }
            }
        }

        let lines = builder.finish();
        debug_assert_eq!(plain_text(&lines), source);
        lines
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

fn html_config() -> Result<HighlightConfiguration, tree_sitter::QueryError> {
    let mut config = HighlightConfiguration::new(
        tree_sitter_html::LANGUAGE.into(),
        "html",
        tree_sitter_html::HIGHLIGHTS_QUERY,
        "", // injections query: embedded CSS/JS stays unstyled, like the original
        "", // locals query
    )?;
    config.configure(HIGHLIGHT_NAMES);
    Ok(config)
}

/// Escape hatch: the input as unstyled lines.
fn plain_lines(source: &str) -> Vec<HighlightedLine> {
    source
        .split('\n')
        .map(|line| HighlightedLine {
            spans: if line.is_empty() {
                Vec::new()
            } else {
                vec![HighlightSpan {
                    style: Style::default(),
                    text: line.to_string(),
                }]
            },
        })
        .collect()
}

/// Accumulates styled text, splitting on newlines as it goes.
struct LineBuilder {
    lines: Vec<HighlightedLine>,
    current: HighlightedLine,
}

impl LineBuilder {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            current: HighlightedLine::default(),
        }
    }

    fn push(&mut self, text: &str, style: Style) {
        let mut rest = text;
        while let Some(idx) = rest.find('\n') {
            let (head, tail) = rest.split_at(idx);
            if !head.is_empty() {
                self.current.spans.push(HighlightSpan {
                    style,
                    text: head.to_string(),
                });
            }
            self.lines.push(std::mem::take(&mut self.current));
            rest = &tail[1..];
        }
        if !rest.is_empty() {
            self.current.spans.push(HighlightSpan {
                style,
                text: rest.to_string(),
            });
        }
    }

    fn finish(mut self) -> Vec<HighlightedLine> {
        self.lines.push(self.current);
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_simple_markup() {
        let mut hl = Highlighter::new();
        let source = "<div class=\"box\">\n  <b>hi</b>\n</div>";
        let lines = hl.highlight(source);
        assert_eq!(lines.len(), 3);
        assert_eq!(plain_text(&lines), source);
    }

    #[test]
    fn empty_input_is_one_empty_line() {
        let mut hl = Highlighter::new();
        let lines = hl.highlight("");
        assert_eq!(lines.len(), 1);
        assert_eq!(plain_text(&lines), "");
    }

    #[test]
    fn malformed_markup_never_diverges() {
        let mut hl = Highlighter::new();
        for source in [
            "<div><<<>>",
            "<script>if(x<3){</",
            "<b>unclosed",
            "plain text, no tags",
            "<p>ქართული & 中文</p>",
            "&&&&<<<<\n\n\n>",
        ] {
            let lines = hl.highlight(source);
            assert_eq!(plain_text(&lines), source, "diverged on {source:?}");
        }
    }

    #[test]
    fn deterministic_across_calls() {
        let mut hl = Highlighter::new();
        let source = "<span style=\"color:red\">x</span>";
        let first = hl.highlight(source);
        let second = hl.highlight(source);
        assert_eq!(first, second);
    }

    #[test]
    fn trailing_newline_yields_trailing_empty_line() {
        let mut hl = Highlighter::new();
        let lines = hl.highlight("<b>a</b>\n");
        assert_eq!(lines.len(), 2);
        assert!(lines[1].spans.is_empty());
    }

    #[test]
    fn tags_pick_up_styling() {
        let mut hl = Highlighter::new();
        let source = "<b>hi</b>";
        let styled = hl
            .highlight(source)
            .iter()
            .flat_map(|l| l.spans.clone())
            .filter(|s| s.style != Style::default())
            .count();
        assert!(styled > 0, "tag names should be styled");
    }
}
