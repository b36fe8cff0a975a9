use crate::block::{Block, BlockKind, Document, ListMarker};
use crate::fence::Fence;
use crate::table;

/// Split markdown text into a document of blocks.
///
/// Total over any input: every line lands in exactly one block, in order, so
/// concatenating the block sources gives back `markdown` unchanged.
pub fn split(markdown: &str) -> Document {
    let lines: Vec<&str> = markdown.split_inclusive('\n').collect();
    let mut state = SplitState::default();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let (block, consumed) = next_block(&lines[i..], &mut state);
        tracing::trace!(kind = ?block.kind, line = i + 1, lines = consumed, "block");
        blocks.push(block);
        i += consumed;
    }

    let blank = blocks.iter().filter(|block| block.is_blank()).count();
    tracing::debug!(blocks = blocks.len(), blank, lines = lines.len(), "split document");
    Document { blocks }
}

#[derive(Default)]
struct SplitState {
    // Marker indentation of each open list level, outermost first
    list_indents: Vec<usize>,
}

impl SplitState {
    /// Nesting level for a list item whose marker sits at `indent`.
    fn list_level(&mut self, indent: usize) -> usize {
        while self.list_indents.last().is_some_and(|&top| top > indent) {
            self.list_indents.pop();
        }
        if self.list_indents.last() != Some(&indent) {
            self.list_indents.push(indent);
        }
        self.list_indents.len() - 1
    }
}

/// Split off the block starting at `lines[0]`, returning it and how many lines it used.
fn next_block(lines: &[&str], state: &mut SplitState) -> (Block, usize) {
    let line = lines[0];

    if is_blank(line) {
        let count = lines.iter().take_while(|line| is_blank(line)).count();
        let block = Block::new(BlockKind::Blank, join(&lines[..count]), String::new(), 0);
        return (block, count);
    }

    // Any other block ends the current list
    let item = list_item(line);
    if item.is_none() || is_rule(line) {
        state.list_indents.clear();
    }

    if let Some(fence) = Fence::open(line) {
        return fence_block(lines, fence);
    }

    if let Some(count) = table::table_len(lines) {
        let content = lines[..count].iter().map(|line| strip_eol(line)).collect::<Vec<_>>();
        let block = Block::new(BlockKind::Table, join(&lines[..count]), content.join("\n"), 0);
        return (block, count);
    }

    if is_rule(line) {
        let block = Block::new(BlockKind::Rule, line.to_string(), String::new(), 0);
        return (block, 1);
    }

    if let Some((level, content)) = heading(line) {
        let block = Block::new(BlockKind::Heading { level }, line.to_string(), content, 0);
        return (block, 1);
    }

    if let Some(item) = item {
        return list_item_block(lines, item, state);
    }

    if let Some((depth, _)) = quote(line) {
        return quote_block(lines, depth);
    }

    let count = 1 + lines[1..]
        .iter()
        .enumerate()
        .take_while(|(offset, line)| !is_blank(line) && !starts_block(&lines[offset + 1..]))
        .count();
    let content = lines[..count].iter().map(|line| strip_eol(line)).collect::<Vec<_>>();
    let block = Block::new(BlockKind::Paragraph, join(&lines[..count]), content.join("\n"), 0);
    (block, count)
}

/// Check if `lines[0]` starts a block that interrupts a paragraph.
fn starts_block(lines: &[&str]) -> bool {
    let line = lines[0];
    Fence::open(line).is_some()
        || table::table_len(lines).is_some()
        || is_rule(line)
        || heading(line).is_some()
        || list_item(line).is_some()
        || quote(line).is_some()
}

fn fence_block(lines: &[&str], fence: Fence) -> (Block, usize) {
    let close = lines[1..].iter().position(|line| fence.is_closed_by(line));
    let (count, closed) = match close {
        Some(offset) => (offset + 2, true),
        None => {
            tracing::debug!("unterminated code fence runs to end of input");
            (lines.len(), false)
        }
    };

    let inner_end = if closed { count - 1 } else { count };
    let content = lines[1..inner_end]
        .iter()
        .map(|line| strip_eol(line))
        .collect::<Vec<_>>()
        .join("\n");
    let kind = BlockKind::Fence {
        info: fence.info,
        closed,
    };
    (Block::new(kind, join(&lines[..count]), content, 0), count)
}

struct ItemStart {
    marker: ListMarker,
    indent: usize,
    task: Option<bool>,
    content: String,
}

fn list_item_block(lines: &[&str], item: ItemStart, state: &mut SplitState) -> (Block, usize) {
    // Indented lines that start no block of their own continue the item
    let count = 1 + lines[1..]
        .iter()
        .enumerate()
        .take_while(|(offset, line)| {
            !is_blank(line)
                && indent_width(line) > item.indent
                && !starts_block(&lines[offset + 1..])
        })
        .count();

    let mut content = item.content;
    for line in &lines[1..count] {
        content.push('\n');
        content.push_str(strip_eol(line).trim_start());
    }

    let level = state.list_level(item.indent);
    let kind = BlockKind::ListItem {
        marker: item.marker,
        indent: item.indent,
        task: item.task,
    };
    (Block::new(kind, join(&lines[..count]), content, level), count)
}

fn quote_block(lines: &[&str], depth: usize) -> (Block, usize) {
    let mut content = Vec::new();
    for line in lines {
        match quote(line) {
            Some((d, text)) if d == depth => content.push(text),
            _ => break,
        }
    }
    let count = content.len();
    let block = Block::new(
        BlockKind::Blockquote,
        join(&lines[..count]),
        content.join("\n"),
        depth,
    );
    (block, count)
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn join(lines: &[&str]) -> String {
    lines.concat()
}

fn strip_eol(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Width of leading whitespace in columns, with tabs stopping every 4.
fn indent_width(line: &str) -> usize {
    let mut width = 0;
    for ch in line.chars() {
        match ch {
            ' ' => width += 1,
            '\t' => width += 4 - width % 4,
            _ => break,
        }
    }
    width
}

/// `---`, `***` or `___`, three or more, optionally separated by spaces.
fn is_rule(line: &str) -> bool {
    let mut chars = line.chars().filter(|c| !c.is_whitespace());
    let Some(first) = chars.next() else {
        return false;
    };
    if !matches!(first, '-' | '*' | '_') {
        return false;
    }
    let mut count = 1;
    for ch in chars {
        if ch != first {
            return false;
        }
        count += 1;
    }
    count >= 3
}

/// ATX heading: up to six `#`, then whitespace or end of line.
fn heading(line: &str) -> Option<(u8, String)> {
    let text = strip_eol(line);
    let rest = text.trim_start_matches(' ');
    if text.len() - rest.len() > 3 {
        return None;
    }

    let hashes = rest.bytes().take_while(|&b| b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let after = &rest[hashes..];
    if !after.is_empty() && !after.starts_with([' ', '\t']) {
        return None;
    }

    let level = u8::try_from(hashes).ok()?;
    Some((level, strip_closing_hashes(after.trim()).to_string()))
}

/// Drop an optional closing `#` sequence, as in `## Title ##`.
fn strip_closing_hashes(content: &str) -> &str {
    let without = content.trim_end_matches('#');
    if without.is_empty() {
        without
    } else if without.ends_with([' ', '\t']) {
        without.trim_end()
    } else {
        content
    }
}

fn list_item(line: &str) -> Option<ItemStart> {
    let text = strip_eol(line);
    let body = text.trim_start_matches([' ', '\t']);
    let indent = indent_width(text);

    let (marker, rest) = match body.chars().next()? {
        ch @ ('-' | '*' | '+') => (ListMarker::Bullet(ch), &body[1..]),
        _ => {
            let digits = body.bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 || digits > 9 {
                return None;
            }
            let delimiter = body[digits..].chars().next()?;
            if delimiter != '.' && delimiter != ')' {
                return None;
            }
            let number = body[..digits].parse().ok()?;
            let marker = ListMarker::Ordered { number, delimiter };
            (marker, &body[digits + 1..])
        }
    };

    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }

    let (task, content) = task_box(rest.trim_start());
    Some(ItemStart {
        marker,
        indent,
        task,
        content: content.to_string(),
    })
}

/// Split a leading `[ ]`, `[x]` or `[X]` off list item content.
fn task_box(content: &str) -> (Option<bool>, &str) {
    let checked = if content.starts_with("[ ]") {
        false
    } else if content.starts_with("[x]") || content.starts_with("[X]") {
        true
    } else {
        return (None, content);
    };

    let rest = &content[3..];
    if rest.is_empty() || rest.starts_with([' ', '\t']) {
        (Some(checked), rest.trim_start())
    } else {
        (None, content)
    }
}

/// Blockquote line: depth and the text after the `>` markers.
fn quote(line: &str) -> Option<(usize, &str)> {
    let text = strip_eol(line);
    let mut rest = text.trim_start_matches(' ');
    if text.len() - rest.len() > 3 || !rest.starts_with('>') {
        return None;
    }

    let mut depth = 0;
    while let Some(after) = rest.strip_prefix('>') {
        depth += 1;
        rest = after.strip_prefix(' ').unwrap_or(after);
    }
    Some((depth, rest))
}
