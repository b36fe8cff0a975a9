use std::fmt::Write as _;

use crate::block::{BlockKind, ListMarker, Span, TranslatedBlock};
use crate::config::{Config, HeadingStyle, LinkFormat, TableMode};

/// Convert translated blocks to mrkdwn text
pub fn blocks_to_mrkdwn(blocks: &[TranslatedBlock], config: &Config) -> String {
    // Leading and trailing blank lines are dropped
    let Some(first) = blocks.iter().position(|block| !block.is_blank()) else {
        return String::new();
    };
    let last = blocks
        .iter()
        .rposition(|block| !block.is_blank())
        .unwrap_or(first);

    let mut out = String::new();
    let mut counters = ListCounters::default();
    for block in &blocks[first..=last] {
        emit_block(block, config, &mut counters, &mut out);
    }

    // Every block ends its lines with a newline; the last one is not kept
    if out.ends_with('\n') {
        out.pop();
    }
    out
}

/// Ordered list numbering, one counter per nesting level.
#[derive(Default)]
struct ListCounters {
    levels: Vec<Option<u64>>,
}

impl ListCounters {
    fn reset(&mut self) {
        self.levels.clear();
    }

    fn enter(&mut self, level: usize) {
        self.levels.truncate(level + 1);
        self.levels.resize(level + 1, None);
    }

    fn unordered(&mut self, level: usize) {
        self.enter(level);
        self.levels[level] = None;
    }

    /// Next number at `level`; a fresh list starts from its first item's number.
    fn ordered(&mut self, level: usize, start: u64) -> u64 {
        self.enter(level);
        let number = self.levels[level].map_or(start, |n| n.saturating_add(1));
        self.levels[level] = Some(number);
        number
    }
}

#[derive(Clone, Copy)]
struct Style {
    links: LinkFormat,
    /// Drop bold and italic markers, keeping their text
    plain_emphasis: bool,
}

impl Style {
    fn new(config: &Config) -> Self {
        Self {
            links: config.links.format,
            plain_emphasis: false,
        }
    }

    fn plain(self) -> Self {
        Self {
            plain_emphasis: true,
            ..self
        }
    }
}

fn emit_block(
    block: &TranslatedBlock,
    config: &Config,
    counters: &mut ListCounters,
    out: &mut String,
) {
    let style = Style::new(config);

    match &block.kind {
        BlockKind::Blank => {
            for _ in 0..block.line_count() {
                out.push('\n');
            }
        }
        BlockKind::Paragraph => {
            counters.reset();
            out.push_str(&spans_to_string(&block.spans, style));
            out.push('\n');
        }
        BlockKind::Heading { level } => {
            counters.reset();
            emit_heading(usize::from(*level), &block.spans, config, out);
        }
        BlockKind::ListItem {
            marker,
            indent,
            task,
        } => {
            let item = ListItemParts {
                marker: *marker,
                indent: *indent,
                task: *task,
                level: block.level,
            };
            emit_list_item(&item, &block.spans, config, counters, out);
        }
        BlockKind::Fence { .. } => {
            counters.reset();
            for line in block.source.lines() {
                out.push_str(line);
                out.push('\n');
            }
        }
        BlockKind::Blockquote => {
            counters.reset();
            let prefix = ">".repeat(block.level);
            for line in spans_to_string(&block.spans, style).split('\n') {
                out.push_str(&prefix);
                if !line.is_empty() {
                    out.push(' ');
                    out.push_str(line);
                }
                out.push('\n');
            }
        }
        BlockKind::Table => {
            counters.reset();
            if config.convert.tables && config.tables.mode == TableMode::CodeBlock {
                out.push_str("```\n");
                out.push_str(&spans_to_string(&block.spans, style.plain()));
                out.push_str("\n```\n");
            } else {
                out.push_str(&spans_to_string(&block.spans, style));
                out.push('\n');
            }
        }
        BlockKind::Rule => {
            counters.reset();
            if config.convert.rules {
                out.push_str(&config.rules.char.repeat(config.rules.length));
            } else {
                out.push_str(block.source.trim_end());
            }
            out.push('\n');
        }
    }
}

fn emit_heading(level: usize, spans: &[Span], config: &Config, out: &mut String) {
    let style = Style::new(config);

    match (config.convert.headings, config.headings.style) {
        (false, _) | (true, HeadingStyle::Prefix) => {
            out.push_str(&"#".repeat(level));
            let text = spans_to_string(spans, style);
            if !text.is_empty() {
                out.push(' ');
                out.push_str(&text);
            }
        }
        (true, HeadingStyle::BoldOnly) => {
            push_bold(&spans_to_string(spans, style.plain()), out);
        }
        (true, HeadingStyle::BoldWithMarker) => {
            out.push_str(&config.headings.marker.repeat(level));
            let text = spans_to_string(spans, style.plain());
            if !text.is_empty() {
                out.push(' ');
                push_bold(&text, out);
            }
        }
        (true, HeadingStyle::Plain) => {
            out.push_str(&spans_to_string(spans, style.plain()));
        }
    }
    out.push('\n');
}

fn push_bold(text: &str, out: &mut String) {
    if !text.is_empty() {
        out.push('*');
        out.push_str(text);
        out.push('*');
    }
}

struct ListItemParts {
    marker: ListMarker,
    indent: usize,
    task: Option<bool>,
    level: usize,
}

fn emit_list_item(
    item: &ListItemParts,
    spans: &[Span],
    config: &Config,
    counters: &mut ListCounters,
    out: &mut String,
) {
    let mut prefix = String::new();

    if config.convert.lists {
        prefix.push_str(&"  ".repeat(item.level));
        match item.marker {
            ListMarker::Bullet(_) => {
                counters.unordered(item.level);
                prefix.push_str(&config.lists.bullet);
            }
            ListMarker::Ordered { number, .. } => {
                let number = counters.ordered(item.level, number);
                let _ = write!(prefix, "{number}.");
            }
        }
    } else {
        prefix.push_str(&" ".repeat(item.indent));
        match item.marker {
            ListMarker::Bullet(ch) => prefix.push(ch),
            ListMarker::Ordered { number, delimiter } => {
                let _ = write!(prefix, "{number}{delimiter}");
            }
        }
    }

    match item.task {
        Some(checked) if config.convert.task_lists => {
            prefix.push(' ');
            prefix.push_str(if checked {
                &config.lists.checkbox_checked
            } else {
                &config.lists.checkbox_unchecked
            });
        }
        // Checkbox kept as written only when lists are left alone too
        Some(checked) if !config.convert.lists => {
            prefix.push_str(if checked { " [x]" } else { " [ ]" });
        }
        _ => {}
    }

    let text = spans_to_string(spans, Style::new(config));
    let mut lines = text.split('\n');
    out.push_str(&prefix);
    if let Some(first) = lines.next().filter(|line| !line.is_empty()) {
        out.push(' ');
        out.push_str(first);
    }
    out.push('\n');

    // Continuation lines hang under the item text
    let hang = " ".repeat(prefix.chars().count() + 1);
    for line in lines {
        out.push_str(&hang);
        out.push_str(line);
        out.push('\n');
    }
}

/// Render spans with the default style for `config`.
pub(crate) fn render_spans(spans: &[Span], config: &Config) -> String {
    spans_to_string(spans, Style::new(config))
}

fn spans_to_string(spans: &[Span], style: Style) -> String {
    let mut out = String::new();
    spans_to_mrkdwn(spans, style, &mut out);
    out
}

fn spans_to_mrkdwn(spans: &[Span], style: Style, out: &mut String) {
    for span in spans {
        span_to_mrkdwn(span, style, out);
    }
}

fn span_to_mrkdwn(span: &Span, style: Style, out: &mut String) {
    match span {
        Span::Text(text) => out.push_str(text),
        Span::Bold(inner) => wrap(inner, "*", !style.plain_emphasis, style, out),
        Span::Italic(inner) => wrap(inner, "_", !style.plain_emphasis, style, out),
        Span::Strike(inner) => wrap(inner, "~", true, style, out),
        Span::Code(raw) => out.push_str(raw),
        Span::Link { url, content } => match style.links {
            LinkFormat::Slack => {
                out.push('<');
                out.push_str(url);
                out.push('|');
                spans_to_mrkdwn(content, style, out);
                out.push('>');
            }
            LinkFormat::UrlOnly => {
                out.push('<');
                out.push_str(url);
                out.push('>');
            }
            LinkFormat::TextOnly => spans_to_mrkdwn(content, style, out),
        },
        Span::Image { url, .. } => {
            out.push('<');
            out.push_str(url);
            out.push('>');
        }
        Span::LineBreak => out.push('\n'),
    }
}

fn wrap(inner: &[Span], marker: &str, marked: bool, style: Style, out: &mut String) {
    if marked {
        out.push_str(marker);
    }
    spans_to_mrkdwn(inner, style, out);
    if marked {
        out.push_str(marker);
    }
}
