use rayon::prelude::*;

use crate::block::{Block, BlockKind, Document, Span, TranslatedBlock};
use crate::config::{Config, TableMode};
use crate::inline::{self, InlineOptions};

/// Documents with at least this many blocks are translated on the rayon pool.
const PARALLEL_THRESHOLD: usize = 128;

/// Translate every block of a document, keeping document order.
pub fn translate_document(document: &Document, config: &Config) -> Vec<TranslatedBlock> {
    let parallel = document.len() >= PARALLEL_THRESHOLD;
    tracing::debug!(blocks = document.len(), parallel, "translating blocks");

    if parallel {
        document
            .blocks
            .par_iter()
            .map(|block| translate(block, config))
            .collect()
    } else {
        document
            .blocks
            .iter()
            .map(|block| translate(block, config))
            .collect()
    }
}

/// Rewrite one block's inline content into spans.
///
/// Fences, rules and blank separators are verbatim and get no spans.
pub fn translate(block: &Block, config: &Config) -> TranslatedBlock {
    let spans = match block.kind {
        BlockKind::Blank | BlockKind::Fence { .. } | BlockKind::Rule => Vec::new(),
        BlockKind::Table => table_spans(&block.content, config),
        BlockKind::Paragraph
        | BlockKind::Heading { .. }
        | BlockKind::ListItem { .. }
        | BlockKind::Blockquote => inline::parse(&block.content, InlineOptions::from_config(config)),
    };

    TranslatedBlock {
        kind: block.kind.clone(),
        source: block.source.clone(),
        level: block.level,
        spans,
    }
}

/// Translate table rows one at a time so no span crosses a row.
fn table_spans(content: &str, config: &Config) -> Vec<Span> {
    let options = if config.convert.tables && config.tables.mode == TableMode::CodeBlock {
        InlineOptions::emphasis_only()
    } else {
        InlineOptions::from_config(config)
    };

    let mut spans = Vec::new();
    for (i, row) in content.split('\n').enumerate() {
        if i > 0 {
            spans.push(Span::LineBreak);
        }
        spans.extend(inline::parse(row, options));
    }
    spans
}
