mod block;
mod config;
mod error;
mod fence;
mod inline;
mod mrkdwn;
mod splitter;
mod table;
mod translate;

pub use block::{Block, BlockKind, Document, ListMarker, Span, TranslatedBlock};
pub use config::{
    Config, ConvertConfig, DEFAULT_CONFIG_TOML, HeadingStyle, HeadingsConfig, LinkFormat,
    LinksConfig, ListsConfig, RulesConfig, TableMode, TablesConfig,
};
pub use error::{Error, Result};
pub use translate::{translate, translate_document};

use inline::InlineOptions;

/// Split markdown text into a document of blocks.
pub fn split(markdown: &str) -> Document {
    splitter::split(markdown)
}

/// Parse one fragment of inline markdown into spans.
pub fn parse_inline(text: &str, config: &Config) -> Vec<Span> {
    inline::parse(text, InlineOptions::from_config(config))
}

/// Convert one fragment of inline markdown to mrkdwn, with no block handling.
pub fn translate_inline(text: &str, config: &Config) -> String {
    mrkdwn::render_spans(&parse_inline(text, config), config)
}

/// Render translated blocks as mrkdwn text.
pub fn emit(blocks: &[TranslatedBlock], config: &Config) -> String {
    mrkdwn::blocks_to_mrkdwn(blocks, config)
}

/// Convert markdown to Slack mrkdwn with the default configuration.
pub fn convert(markdown: &str) -> String {
    convert_with_config(markdown, &Config::default())
}

/// Convert markdown to Slack mrkdwn.
pub fn convert_with_config(markdown: &str, config: &Config) -> String {
    let document = split(markdown);
    let blocks = translate_document(&document, config);
    emit(&blocks, config)
}
