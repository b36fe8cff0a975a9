//! Pipe table detection.

/// Check if a line could be part of a table: `|`, at least one character, `|`.
pub(crate) fn is_table_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 3 && trimmed.starts_with('|') && trimmed.ends_with('|')
}

/// Split a table row into trimmed cells, dropping the outer pipes.
pub(crate) fn parse_row(row: &str) -> Vec<&str> {
    let trimmed = row.trim();
    let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('|').unwrap_or(trimmed);
    trimmed.split('|').map(str::trim).collect()
}

/// A separator cell is dashes with optional alignment colons, e.g. `:---:`.
///
/// En dash, em dash and minus sign are accepted too, since editors like to
/// substitute them.
fn is_separator_cell(cell: &str) -> bool {
    let cell = cell.strip_prefix(':').unwrap_or(cell);
    let cell = cell.strip_suffix(':').unwrap_or(cell);
    !cell.is_empty()
        && cell
            .chars()
            .all(|c| matches!(c, '-' | '\u{2013}' | '\u{2014}' | '\u{2212}'))
}

/// Number of lines forming a table at the start of `lines`, if there is one.
///
/// A table needs a header row and a separator row with the same number of
/// cells; every following table-like line belongs to it.
pub(crate) fn table_len(lines: &[&str]) -> Option<usize> {
    let len = lines.iter().take_while(|line| is_table_line(line)).count();
    if len < 2 {
        return None;
    }

    let header = parse_row(lines[0]);
    let separator = parse_row(lines[1]);
    if header.len() != separator.len() || !separator.iter().all(|cell| is_separator_cell(cell)) {
        return None;
    }

    Some(len)
}
