/// Inline text spans with formatting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    Bold(Vec<Span>),
    Italic(Vec<Span>),
    Strike(Vec<Span>),
    /// Inline code, verbatim including its backtick delimiters
    Code(String),
    Link {
        url: String,
        content: Vec<Span>,
    },
    Image {
        url: String,
        alt: String,
    },
    LineBreak,
}

/// The marker that opened a list item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMarker {
    /// `-`, `*` or `+`
    Bullet(char),
    /// `1.` or `1)`
    Ordered { number: u64, delimiter: char },
}

/// What a block is, plus the attributes the emitter needs to re-create it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// One or more blank lines between blocks
    Blank,
    Paragraph,
    Heading {
        level: u8,
    },
    ListItem {
        marker: ListMarker,
        /// Indentation of the marker, in columns
        indent: usize,
        /// For task lists: None = not a task, Some(false) = unchecked, Some(true) = checked
        task: Option<bool>,
    },
    Fence {
        info: Option<String>,
        /// False when the input ended before a closing fence
        closed: bool,
    },
    Blockquote,
    Table,
    Rule,
}

/// A block-level unit of the input.
///
/// `source` is the exact slice of input the block covers, line terminators
/// included. `content` is the text left once block markers are stripped,
/// with lines joined by `\n`. `level` is the list nesting level or the
/// blockquote depth, and 0 for everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub source: String,
    pub content: String,
    pub level: usize,
}

impl Block {
    pub fn new(kind: BlockKind, source: String, content: String, level: usize) -> Self {
        Self {
            kind,
            source,
            content,
            level,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.kind == BlockKind::Blank
    }

    /// Number of source lines this block covers
    pub fn line_count(&self) -> usize {
        self.source.split_inclusive('\n').count()
    }
}

/// The whole input as an ordered sequence of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    /// Concatenate block sources, reproducing the input the document was split from.
    pub fn source(&self) -> String {
        self.blocks.iter().map(|block| block.source.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// A block after inline translation.
///
/// Verbatim kinds (blank, fence, rule) carry no spans; the emitter renders
/// them from `source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedBlock {
    pub kind: BlockKind,
    pub source: String,
    pub level: usize,
    pub spans: Vec<Span>,
}

impl TranslatedBlock {
    pub fn is_blank(&self) -> bool {
        self.kind == BlockKind::Blank
    }

    /// Number of source lines this block covers
    pub fn line_count(&self) -> usize {
        self.source.split_inclusive('\n').count()
    }
}
