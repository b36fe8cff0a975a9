//! Inline span parsing.
//!
//! Two passes over one block's text. The first splits it into literal spans
//! (text, code, links, images) and delimiter runs of `*`, `_` or `~`. The
//! second pairs runs on a delimiter stack: each closing run looks back for
//! the nearest usable opener, both sides give up as many characters as the
//! match uses, and what is left of a run keeps looking for a partner. Runs
//! that never pair are literal text. Code spans and links are atomic, so
//! markers inside them never pair with markers outside.

use std::collections::HashMap;

use crate::block::Span;
use crate::config::Config;

/// Which inline constructs are recognised. Anything switched off is literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InlineOptions {
    pub(crate) bold: bool,
    pub(crate) italic: bool,
    pub(crate) strike: bool,
    /// `_` runs count as emphasis markers
    pub(crate) underscores: bool,
    pub(crate) links: bool,
    pub(crate) images: bool,
    /// Drop the backslash from `\*` and friends
    pub(crate) escapes: bool,
}

impl InlineOptions {
    pub(crate) fn from_config(config: &Config) -> Self {
        Self {
            bold: config.convert.bold,
            italic: config.convert.italic,
            strike: config.convert.strikethrough,
            underscores: true,
            links: config.convert.links,
            images: config.convert.images,
            escapes: true,
        }
    }

    /// `*` bold and italic only, with backslashes kept. Used to strip
    /// emphasis from table rows that end up inside a code block, where
    /// underscores are usually part of identifiers.
    pub(crate) fn emphasis_only() -> Self {
        Self {
            bold: true,
            italic: true,
            strike: false,
            underscores: false,
            links: false,
            images: false,
            escapes: false,
        }
    }
}

/// Parse inline markdown into spans.
pub(crate) fn parse(text: &str, options: InlineOptions) -> Vec<Span> {
    InlineParser { src: text, options }.parse_range(0, text.len())
}

#[derive(Debug, Clone, Copy)]
enum Emphasis {
    Bold,
    Italic,
    BoldItalic,
    Strike,
}

impl Emphasis {
    fn for_size(marker: u8, size: usize) -> Self {
        match (marker, size) {
            (b'~', _) => Self::Strike,
            (_, 3) => Self::BoldItalic,
            (_, 2) => Self::Bold,
            _ => Self::Italic,
        }
    }

    fn wrap(self, content: Vec<Span>, options: InlineOptions) -> Span {
        match self {
            Self::Bold => collapse(Span::Bold(content)),
            Self::Italic => collapse(Span::Italic(content)),
            Self::Strike => collapse(Span::Strike(content)),
            Self::BoldItalic => match (options.bold, options.italic) {
                (true, true) => collapse(Span::Bold(vec![collapse(Span::Italic(content))])),
                (true, false) => collapse(Span::Bold(content)),
                _ => collapse(Span::Italic(content)),
            },
        }
    }
}

/// Collapse a span directly wrapping one span of the same kind.
fn collapse(span: Span) -> Span {
    match span {
        Span::Bold(mut inner) if matches!(inner.as_slice(), [Span::Bold(_)]) => inner.remove(0),
        Span::Italic(mut inner) if matches!(inner.as_slice(), [Span::Italic(_)]) => {
            inner.remove(0)
        }
        Span::Strike(mut inner) if matches!(inner.as_slice(), [Span::Strike(_)]) => {
            inner.remove(0)
        }
        other => other,
    }
}

/// Output of the first pass.
enum Node {
    Span(Span),
    /// Index into the delimiter list
    Delim(usize),
}

/// A run of emphasis markers that can open or close a span.
#[derive(Debug)]
struct Delim {
    marker: u8,
    /// Run length as written
    len: usize,
    /// Characters not used by any match yet
    remaining: usize,
    can_open: bool,
    can_close: bool,
    /// Still on the delimiter stack
    active: bool,
    /// Spans opened by this run, innermost first
    opens: Vec<Emphasis>,
    /// Spans closed by this run, innermost first
    closes: Vec<Emphasis>,
}

impl Delim {
    fn new(marker: u8, len: usize, can_open: bool, can_close: bool) -> Self {
        Self {
            marker,
            len,
            remaining: len,
            can_open,
            can_close,
            active: true,
            opens: Vec::new(),
            closes: Vec::new(),
        }
    }
}

/// Span tree under construction: finished spans at the root plus the
/// emphasis spans still open, outermost first.
#[derive(Default)]
struct SpanTree {
    root: Vec<Span>,
    stack: Vec<(Emphasis, Vec<Span>)>,
}

impl SpanTree {
    fn current(&mut self) -> &mut Vec<Span> {
        match self.stack.last_mut() {
            Some((_, spans)) => spans,
            None => &mut self.root,
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let spans = self.current();
        if let Some(Span::Text(last)) = spans.last_mut() {
            last.push_str(text);
        } else {
            spans.push(Span::Text(text.to_string()));
        }
    }

    fn push(&mut self, span: Span) {
        match span {
            Span::Text(text) => self.push_text(&text),
            other => self.current().push(other),
        }
    }

    fn open(&mut self, kind: Emphasis) {
        self.stack.push((kind, Vec::new()));
    }

    fn close(&mut self, options: InlineOptions) {
        if let Some((kind, spans)) = self.stack.pop() {
            let span = kind.wrap(spans, options);
            self.push(span);
        }
    }

    fn finish(mut self, options: InlineOptions) -> Vec<Span> {
        while !self.stack.is_empty() {
            self.close(options);
        }
        self.root
    }
}

struct LinkMatch {
    label: (usize, usize),
    url: String,
    end: usize,
}

struct InlineParser<'a> {
    src: &'a str,
    options: InlineOptions,
}

impl InlineParser<'_> {
    fn parse_range(&self, start: usize, end: usize) -> Vec<Span> {
        let (nodes, mut delims) = self.tokenize(start, end);
        self.match_delimiters(&mut delims);

        let mut tree = SpanTree::default();
        for node in nodes {
            match node {
                Node::Span(span) => tree.push(span),
                Node::Delim(index) => {
                    let delim = &delims[index];
                    for _ in &delim.closes {
                        tree.close(self.options);
                    }
                    let marker = char::from(delim.marker);
                    tree.push_text(&marker.to_string().repeat(delim.remaining));
                    for &kind in delim.opens.iter().rev() {
                        tree.open(kind);
                    }
                }
            }
        }
        tree.finish(self.options)
    }

    /// Split `start..end` into literal spans and delimiter runs.
    fn tokenize(&self, start: usize, end: usize) -> (Vec<Node>, Vec<Delim>) {
        let src = self.src;
        let mut nodes = Vec::new();
        let mut delims = Vec::new();
        let mut text = String::new();
        let mut i = start;

        while i < end {
            let rest = &src[i..end];
            match rest.as_bytes()[0] {
                b'\\' if self.options.escapes => {
                    if let Some(ch) = escaped_char(rest) {
                        text.push(ch);
                        i += 1 + ch.len_utf8();
                        continue;
                    }
                }
                b'`' => {
                    match self.code_span_end(i, end) {
                        Some(close) => {
                            flush(&mut text, &mut nodes);
                            nodes.push(Node::Span(Span::Code(src[i..close].to_string())));
                            i = close;
                        }
                        None => {
                            let len = run_len(rest, b'`');
                            text.push_str(&rest[..len]);
                            i += len;
                        }
                    }
                    continue;
                }
                b'!' if rest[1..].starts_with('[') => {
                    if let Some(link) = self.link_at(i + 1, end) {
                        if self.options.images {
                            flush(&mut text, &mut nodes);
                            let (alt_start, alt_end) = link.label;
                            nodes.push(Node::Span(Span::Image {
                                url: link.url,
                                alt: src[alt_start..alt_end].to_string(),
                            }));
                        } else {
                            text.push_str(&src[i..link.end]);
                        }
                        i = link.end;
                        continue;
                    }
                }
                b'[' => {
                    let link = self
                        .link_at(i, end)
                        .filter(|link| link.label.0 < link.label.1);
                    if let Some(link) = link {
                        if self.options.links {
                            flush(&mut text, &mut nodes);
                            // no links inside link text
                            let label = InlineParser {
                                src,
                                options: InlineOptions {
                                    links: false,
                                    ..self.options
                                },
                            };
                            nodes.push(Node::Span(Span::Link {
                                url: link.url,
                                content: label.parse_range(link.label.0, link.label.1),
                            }));
                        } else {
                            text.push_str(&src[i..link.end]);
                        }
                        i = link.end;
                        continue;
                    }
                }
                marker @ (b'*' | b'_' | b'~') => {
                    let len = run_len(rest, marker);
                    let can_open = self.can_open(i, i + len, marker);
                    let can_close = self.can_close(i, i + len, marker);
                    if self.run_enabled(marker, len) && (can_open || can_close) {
                        flush(&mut text, &mut nodes);
                        nodes.push(Node::Delim(delims.len()));
                        delims.push(Delim::new(marker, len, can_open, can_close));
                    } else {
                        text.push_str(&rest[..len]);
                    }
                    i += len;
                    continue;
                }
                _ => {}
            }

            let Some(ch) = rest.chars().next() else {
                break;
            };
            text.push(ch);
            i += ch.len_utf8();
        }

        flush(&mut text, &mut nodes);
        (nodes, delims)
    }

    /// Pair closing runs with openers, left to right, recording each match on
    /// both runs.
    fn match_delimiters(&self, delims: &mut [Delim]) {
        // Lowest opener index still worth searching, per closer class
        let mut bottoms: HashMap<(u8, bool, usize), usize> = HashMap::new();
        let mut closer = 0;

        while closer < delims.len() {
            let c = &delims[closer];
            if !c.active || !c.can_close || c.remaining == 0 {
                closer += 1;
                continue;
            }

            let class = (c.marker, c.can_open, c.len % 3);
            let bottom = bottoms.get(&class).copied().unwrap_or(0);
            let found = (bottom..closer).rev().find_map(|opener| {
                self.match_size(&delims[opener], &delims[closer])
                    .map(|size| (opener, size))
            });

            let Some((opener, size)) = found else {
                bottoms.insert(class, closer);
                if !delims[closer].can_open {
                    delims[closer].active = false;
                }
                closer += 1;
                continue;
            };

            let kind = Emphasis::for_size(delims[closer].marker, size);
            delims[opener].remaining -= size;
            delims[opener].opens.push(kind);
            delims[closer].remaining -= size;
            delims[closer].closes.push(kind);

            // Runs between the pair can no longer match anything
            for inner in &mut delims[opener + 1..closer] {
                inner.active = false;
            }
            if delims[opener].remaining == 0 {
                delims[opener].active = false;
            }
            if delims[closer].remaining == 0 {
                delims[closer].active = false;
                closer += 1;
            }
        }
    }

    /// Characters a match between `opener` and `closer` would use, if they pair.
    fn match_size(&self, opener: &Delim, closer: &Delim) -> Option<usize> {
        if !opener.active
            || !opener.can_open
            || opener.remaining == 0
            || opener.marker != closer.marker
        {
            return None;
        }
        if closer.marker == b'~' {
            return Some(2);
        }

        // A run that could both open and close only pairs when the run
        // lengths don't sum to a multiple of three, unless both are multiples
        if (opener.can_close || closer.can_open)
            && (opener.len + closer.len) % 3 == 0
            && !(opener.len % 3 == 0 && closer.len % 3 == 0)
        {
            return None;
        }

        let preferred = if opener.remaining >= 3 && closer.remaining >= 3 {
            3
        } else {
            opener.remaining.min(closer.remaining).min(2)
        };
        (1..=preferred).rev().find(|&size| self.size_enabled(size))
    }

    fn size_enabled(&self, size: usize) -> bool {
        match size {
            3 => self.options.bold || self.options.italic,
            2 => self.options.bold,
            _ => self.options.italic,
        }
    }

    /// A run whose own kind is switched off is plain text, opener or closer.
    fn run_enabled(&self, marker: u8, len: usize) -> bool {
        match marker {
            b'~' => self.options.strike && len == 2,
            b'_' if !self.options.underscores => false,
            _ => self.size_enabled(len.min(3)),
        }
    }

    fn neighbours(&self, start: usize, stop: usize) -> (Option<char>, Option<char>) {
        let prev = self.src[..start].chars().next_back();
        let next = self.src[stop..].chars().next();
        (prev, next)
    }

    fn can_open(&self, start: usize, stop: usize, marker: u8) -> bool {
        let (prev, next) = self.neighbours(start, stop);
        let left = next.is_some_and(|ch| !ch.is_whitespace());
        let right = prev.is_some_and(|ch| !ch.is_whitespace());
        if marker == b'_' {
            // snake_case words never open
            left && !(right && prev.is_some_and(char::is_alphanumeric))
        } else {
            left
        }
    }

    fn can_close(&self, start: usize, stop: usize, marker: u8) -> bool {
        let (prev, next) = self.neighbours(start, stop);
        let left = next.is_some_and(|ch| !ch.is_whitespace());
        let right = prev.is_some_and(|ch| !ch.is_whitespace());
        if marker == b'_' {
            right && !(left && next.is_some_and(char::is_alphanumeric))
        } else {
            right
        }
    }

    /// End of the code span opened by the backtick run at `start`, if it is closed
    /// by a run of the same length.
    fn code_span_end(&self, start: usize, end: usize) -> Option<usize> {
        let rest = &self.src[start..end];
        let bytes = rest.as_bytes();
        let len = run_len(rest, b'`');
        let mut j = len;
        while j < bytes.len() {
            if bytes[j] == b'`' {
                let close = run_len(&rest[j..], b'`');
                if close == len {
                    return Some(start + j + close);
                }
                j += close;
            } else {
                j += 1;
            }
        }
        None
    }

    /// Match `[label](url)` with the `[` at `start`.
    fn link_at(&self, start: usize, end: usize) -> Option<LinkMatch> {
        let bytes = self.src.as_bytes();
        let mut depth = 0usize;
        let mut j = start;

        let label_end = loop {
            if j >= end {
                return None;
            }
            match bytes[j] {
                b'\\' => j += 2,
                b'`' => {
                    j = self
                        .code_span_end(j, end)
                        .unwrap_or_else(|| j + run_len(&self.src[j..end], b'`'));
                }
                b'[' => {
                    depth += 1;
                    j += 1;
                }
                b']' => {
                    depth -= 1;
                    if depth == 0 {
                        break j;
                    }
                    j += 1;
                }
                _ => j += 1,
            }
        };

        if label_end + 1 >= end || bytes[label_end + 1] != b'(' {
            return None;
        }

        let url_start = label_end + 2;
        let mut parens = 0usize;
        let mut k = url_start;
        let url_end = loop {
            if k >= end {
                return None;
            }
            match bytes[k] {
                b'\n' => return None,
                b'\\' => k += 2,
                b'(' => {
                    parens += 1;
                    k += 1;
                }
                b')' => {
                    if parens == 0 {
                        break k;
                    }
                    parens -= 1;
                    k += 1;
                }
                _ => k += 1,
            }
        };

        // `(url "title")` keeps only the url; `<url>` loses its brackets
        let target = self.src[url_start..url_end].split_whitespace().next()?;
        let url = target
            .strip_prefix('<')
            .and_then(|url| url.strip_suffix('>'))
            .unwrap_or(target);
        if url.is_empty() {
            return None;
        }

        Some(LinkMatch {
            label: (start + 1, label_end),
            url: url.to_string(),
            end: url_end + 1,
        })
    }
}

fn flush(text: &mut String, nodes: &mut Vec<Node>) {
    if !text.is_empty() {
        nodes.push(Node::Span(Span::Text(std::mem::take(text))));
    }
}

fn run_len(s: &str, marker: u8) -> usize {
    s.bytes().take_while(|&b| b == marker).count()
}

/// The character after a backslash, when it is escapable punctuation.
fn escaped_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    if chars.next() != Some('\\') {
        return None;
    }
    chars.next().filter(char::is_ascii_punctuation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_default(text: &str) -> Vec<Span> {
        parse(text, InlineOptions::from_config(&Config::default()))
    }

    fn text(s: &str) -> Span {
        Span::Text(s.to_string())
    }

    #[test]
    fn plain_text_is_one_span() {
        assert_eq!(parse_default("just words"), vec![text("just words")]);
        assert_eq!(parse_default(""), Vec::<Span>::new());
    }

    #[test]
    fn bold_beats_italic() {
        assert_eq!(parse_default("**hi**"), vec![Span::Bold(vec![text("hi")])]);
        assert_eq!(parse_default("*hi*"), vec![Span::Italic(vec![text("hi")])]);
        assert_eq!(parse_default("__hi__"), vec![Span::Bold(vec![text("hi")])]);
    }

    #[test]
    fn triple_run_is_bold_italic() {
        assert_eq!(
            parse_default("***both***"),
            vec![Span::Bold(vec![Span::Italic(vec![text("both")])])]
        );
    }

    #[test]
    fn nested_emphasis() {
        assert_eq!(
            parse_default("**bold _and italic_**"),
            vec![Span::Bold(vec![
                text("bold "),
                Span::Italic(vec![text("and italic")])
            ])]
        );
        assert_eq!(
            parse_default("*a **b** c*"),
            vec![Span::Italic(vec![
                text("a "),
                Span::Bold(vec![text("b")]),
                text(" c")
            ])]
        );
    }

    #[test]
    fn shared_closing_run() {
        assert_eq!(
            parse_default("*italic **bold***"),
            vec![Span::Italic(vec![
                text("italic "),
                Span::Bold(vec![text("bold")])
            ])]
        );
    }

    #[test]
    fn leftover_markers_stay_literal() {
        assert_eq!(
            parse_default("**foo*"),
            vec![text("*"), Span::Italic(vec![text("foo")])]
        );
        assert_eq!(
            parse_default("*foo**"),
            vec![Span::Italic(vec![text("foo")]), text("*")]
        );
    }

    #[test]
    fn single_marker_inside_bold_is_text() {
        assert_eq!(parse_default("**a*b**"), vec![Span::Bold(vec![text("a*b")])]);
    }

    #[test]
    fn triple_run_closed_in_two_steps() {
        assert_eq!(
            parse_default("***a** b*"),
            vec![Span::Italic(vec![Span::Bold(vec![text("a")]), text(" b")])]
        );
        assert_eq!(
            parse_default("***a* b**"),
            vec![Span::Bold(vec![Span::Italic(vec![text("a")]), text(" b")])]
        );
    }

    #[test]
    fn both_flanking_runs_follow_rule_of_three() {
        // the inner `*` can open and close, and 1 + 2 is a multiple of three
        assert_eq!(
            parse_default("*a**b*"),
            vec![Span::Italic(vec![text("a**b")])]
        );
    }

    #[test]
    fn same_kind_collapses() {
        assert_eq!(parse_default("**__x__**"), vec![Span::Bold(vec![text("x")])]);
    }

    #[test]
    fn unmatched_and_spaced_markers_are_literal() {
        assert_eq!(parse_default("*oops"), vec![text("*oops")]);
        assert_eq!(parse_default("2 * 3 * 4"), vec![text("2 * 3 * 4")]);
        assert_eq!(parse_default("snake_case_name"), vec![text("snake_case_name")]);
        assert_eq!(parse_default("~single~"), vec![text("~single~")]);
    }

    #[test]
    fn strikethrough() {
        assert_eq!(
            parse_default("~~gone~~"),
            vec![Span::Strike(vec![text("gone")])]
        );
    }

    #[test]
    fn code_is_atomic() {
        assert_eq!(
            parse_default("`**x**` and **`y`**"),
            vec![
                Span::Code("`**x**`".to_string()),
                text(" and "),
                Span::Bold(vec![Span::Code("`y`".to_string())])
            ]
        );
        assert_eq!(
            parse_default("``a ` b``"),
            vec![Span::Code("``a ` b``".to_string())]
        );
        assert_eq!(parse_default("`open"), vec![text("`open")]);
    }

    #[test]
    fn links() {
        assert_eq!(
            parse_default("see [the **docs**](https://x.io/a_b_c \"Title\")"),
            vec![
                text("see "),
                Span::Link {
                    url: "https://x.io/a_b_c".to_string(),
                    content: vec![text("the "), Span::Bold(vec![text("docs")])]
                }
            ]
        );
        assert_eq!(parse_default("[](u)"), vec![text("[](u)")]);
        assert_eq!(parse_default("[no url]"), vec![text("[no url]")]);
    }

    #[test]
    fn link_inside_emphasis_hides_markers() {
        assert_eq!(
            parse_default("*[a*b](u)*"),
            vec![Span::Italic(vec![Span::Link {
                url: "u".to_string(),
                content: vec![text("a*b")]
            }])]
        );
    }

    #[test]
    fn images() {
        assert_eq!(
            parse_default("![](https://x.io/i.png)"),
            vec![Span::Image {
                url: "https://x.io/i.png".to_string(),
                alt: String::new()
            }]
        );
    }

    #[test]
    fn escapes_drop_backslash() {
        assert_eq!(parse_default(r"\*not italic\*"), vec![text("*not italic*")]);
        assert_eq!(parse_default(r"C:\path"), vec![text(r"C:\path")]);
        assert_eq!(
            parse(r"\*x\*", InlineOptions::emphasis_only()),
            vec![text(r"\"), Span::Italic(vec![text(r"x\")])]
        );
    }

    #[test]
    fn disabled_runs_are_inert() {
        let options = InlineOptions {
            bold: false,
            ..InlineOptions::from_config(&Config::default())
        };
        assert_eq!(parse("**text**", options), vec![text("**text**")]);
        assert_eq!(
            parse("***text***", options),
            vec![Span::Italic(vec![text("text")])]
        );
        assert_eq!(
            parse("*a **b** c*", options),
            vec![Span::Italic(vec![text("a **b** c")])]
        );
    }

    #[test]
    fn deep_nesting_terminates() {
        let input = "*a ".repeat(200);
        assert_eq!(parse_default(&input), vec![text(&input)]);
    }

    #[test]
    fn nesting_depth_is_unbounded() {
        let depth = 64;
        let input = format!("{}z{}", "*a ".repeat(depth), " b*".repeat(depth));
        let mut expected = Span::Italic(vec![text("a z b")]);
        for _ in 1..depth {
            expected = Span::Italic(vec![text("a "), expected, text(" b")]);
        }
        assert_eq!(parse_default(&input), vec![expected]);
    }

    #[test]
    fn emphasis_only_ignores_underscores() {
        assert_eq!(
            parse("| __init__ | **x** |", InlineOptions::emphasis_only()),
            vec![
                text("| __init__ | "),
                Span::Bold(vec![text("x")]),
                text(" |")
            ]
        );
    }

    #[test]
    fn multibyte_text() {
        assert_eq!(
            parse_default("héllo **wörld** ✓"),
            vec![text("héllo "), Span::Bold(vec![text("wörld")]), text(" ✓")]
        );
    }
}
