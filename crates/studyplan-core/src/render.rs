//! Line-oriented rendering of model output into display blocks.
//!
//! This is deliberately not a markdown parser. Each line is classified on its
//! own, with no state carried between lines, by the first rule that matches:
//!
//! 1. `### ` → level-3 heading
//! 2. `## ` → level-2 heading
//! 3. `# ` → level-1 heading
//! 4. contains `**` → paragraph of plain/bold spans
//! 5. `- ` or `* ` → unordered list item
//! 6. `<digits>. ` → ordered list item
//! 7. blank → spacer
//! 8. anything else → plain paragraph
//!
//! Rule 4 runs before the list rules, so `- **x**` is a paragraph, not a
//! list item.

use serde::Serialize;

/// A styled fragment of paragraph text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "style", content = "text", rename_all = "snake_case")]
pub enum Span {
    Plain(String),
    Bold(String),
}

impl Span {
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(t) | Self::Bold(t) => t,
        }
    }
}

/// One display unit derived from one line of plan text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderedBlock {
    Heading { level: u8, text: String },
    Paragraph { spans: Vec<Span> },
    ListItem { ordered: bool, text: String },
    Spacer,
}

const HEADING_MARKERS: [(&str, u8); 3] = [("### ", 3), ("## ", 2), ("# ", 1)];

/// Render plan text into blocks, one block per line. Never fails.
pub fn render(text: &str) -> Vec<RenderedBlock> {
    text.split('\n').map(classify_line).collect()
}

/// Classify a single line.
pub fn classify_line(line: &str) -> RenderedBlock {
    let line = line.strip_suffix('\r').unwrap_or(line);

    // Longest marker first.
    for (marker, level) in HEADING_MARKERS {
        if let Some(rest) = line.strip_prefix(marker) {
            return RenderedBlock::Heading {
                level,
                text: rest.to_owned(),
            };
        }
    }

    if line.contains("**") {
        return RenderedBlock::Paragraph {
            spans: split_bold(line),
        };
    }

    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return RenderedBlock::ListItem {
            ordered: false,
            text: rest.to_owned(),
        };
    }

    if let Some(rest) = strip_ordered_marker(line) {
        return RenderedBlock::ListItem {
            ordered: true,
            text: rest.to_owned(),
        };
    }

    if line.trim().is_empty() {
        return RenderedBlock::Spacer;
    }

    RenderedBlock::Paragraph {
        spans: vec![Span::Plain(line.to_owned())],
    }
}

/// Split a line on paired `**` delimiters. An unpaired trailing `**` stays in
/// the final plain span. Empty plain segments are dropped.
fn split_bold(line: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut rest = line;

    while let Some(open) = rest.find("**") {
        let inner = &rest[open + 2..];
        let Some(close) = inner.find("**") else {
            break;
        };
        push_plain(&mut spans, &rest[..open]);
        spans.push(Span::Bold(inner[..close].to_owned()));
        rest = &inner[close + 2..];
    }
    push_plain(&mut spans, rest);

    spans
}

fn push_plain(spans: &mut Vec<Span>, text: &str) {
    if !text.is_empty() {
        spans.push(Span::Plain(text.to_owned()));
    }
}

/// Strip a `^\d+\. ` prefix.
fn strip_ordered_marker(line: &str) -> Option<&str> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    line[digits..].strip_prefix(". ")
}
