use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Bundled defaults, kept in sync with `Config::default()`.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("default_config.toml");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub headings: HeadingsConfig,
    pub lists: ListsConfig,
    pub rules: RulesConfig,
    pub links: LinksConfig,
    pub tables: TablesConfig,
    pub convert: ConvertConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct HeadingsConfig {
    pub style: HeadingStyle,
    pub marker: String,
}

impl Default for HeadingsConfig {
    fn default() -> Self {
        Self {
            style: HeadingStyle::default(),
            marker: "=".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ListsConfig {
    pub bullet: String,
    pub checkbox_checked: String,
    pub checkbox_unchecked: String,
}

impl Default for ListsConfig {
    fn default() -> Self {
        Self {
            bullet: "•".to_string(),
            checkbox_checked: "☑".to_string(),
            checkbox_unchecked: "☐".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RulesConfig {
    pub char: String,
    pub length: usize,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            char: "─".to_string(),
            length: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct LinksConfig {
    pub format: LinkFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct TablesConfig {
    pub mode: TableMode,
}

/// Per-element switches. A disabled element is left as literal Markdown.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConvertConfig {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub links: bool,
    pub images: bool,
    pub lists: bool,
    pub task_lists: bool,
    pub headings: bool,
    pub rules: bool,
    pub tables: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            bold: true,
            italic: true,
            strikethrough: true,
            links: true,
            images: true,
            lists: true,
            task_lists: true,
            headings: true,
            rules: true,
            tables: true,
        }
    }
}

/// How headings are rendered, since mrkdwn has no heading syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum HeadingStyle {
    /// `*Title*`
    #[default]
    BoldOnly,
    /// `== *Title*` for a level 2 heading, using `headings.marker`
    BoldWithMarker,
    /// `Title`
    Plain,
    /// `## Title`, with inline content still translated
    Prefix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LinkFormat {
    /// `<url|label>`
    #[default]
    Slack,
    /// `<url>`
    UrlOnly,
    /// `label`
    TextOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TableMode {
    /// Wrap tables in a code fence so Slack shows them monospaced
    #[default]
    CodeBlock,
    /// Leave table rows in place, translating their inline content
    Preserve,
}

impl HeadingStyle {
    const EXPECTED: &'static str = "one of bold-only, bold-with-marker, plain, prefix";

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BoldOnly => "bold-only",
            Self::BoldWithMarker => "bold-with-marker",
            Self::Plain => "plain",
            Self::Prefix => "prefix",
        }
    }
}

impl FromStr for HeadingStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bold-only" => Ok(Self::BoldOnly),
            "bold-with-marker" => Ok(Self::BoldWithMarker),
            "plain" => Ok(Self::Plain),
            "prefix" => Ok(Self::Prefix),
            _ => Err(Error::unsupported("heading-style", s, Self::EXPECTED)),
        }
    }
}

impl fmt::Display for HeadingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LinkFormat {
    const EXPECTED: &'static str = "one of slack, url-only, text-only";

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slack => "slack",
            Self::UrlOnly => "url-only",
            Self::TextOnly => "text-only",
        }
    }
}

impl FromStr for LinkFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "slack" => Ok(Self::Slack),
            "url-only" => Ok(Self::UrlOnly),
            "text-only" => Ok(Self::TextOnly),
            _ => Err(Error::unsupported("link-format", s, Self::EXPECTED)),
        }
    }
}

impl fmt::Display for LinkFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TableMode {
    const EXPECTED: &'static str = "one of code-block, preserve";

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CodeBlock => "code-block",
            Self::Preserve => "preserve",
        }
    }
}

impl FromStr for TableMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "code-block" => Ok(Self::CodeBlock),
            "preserve" => Ok(Self::Preserve),
            _ => Err(Error::unsupported("table-mode", s, Self::EXPECTED)),
        }
    }
}

impl fmt::Display for TableMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Config {
    /// Load config from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse config from TOML text without validating option values.
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reject values that deserialize fine but cannot be rendered.
    pub fn validate(&self) -> Result<()> {
        if self.lists.bullet.is_empty() {
            return Err(Error::unsupported(
                "list-bullet",
                "",
                "a non-empty string",
            ));
        }
        if self.headings.marker.is_empty() {
            return Err(Error::unsupported(
                "heading-marker",
                "",
                "a non-empty string",
            ));
        }
        if self.rules.char.is_empty() {
            return Err(Error::unsupported("rule-char", "", "a non-empty string"));
        }
        if self.rules.length == 0 {
            return Err(Error::unsupported("rule-length", "0", "a length of at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn bundled_defaults_match_default_impl() {
        let parsed = Config::from_toml(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn default_values() {
        let config = Config::default();
        assert_eq!(config.headings.style, HeadingStyle::BoldOnly);
        assert_eq!(config.lists.bullet, "•");
        assert_eq!(config.lists.checkbox_checked, "☑");
        assert_eq!(config.lists.checkbox_unchecked, "☐");
        assert_eq!(config.rules.char, "─");
        assert_eq!(config.rules.length, 10);
        assert_eq!(config.links.format, LinkFormat::Slack);
        assert_eq!(config.tables.mode, TableMode::CodeBlock);
        assert!(config.convert.bold && config.convert.tables && config.convert.task_lists);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = Config::from_toml(
            "[headings]\nstyle = \"bold-with-marker\"\n\n[convert]\nbold = false\n",
        )
        .unwrap();
        assert_eq!(config.headings.style, HeadingStyle::BoldWithMarker);
        assert_eq!(config.headings.marker, "=");
        assert!(!config.convert.bold);
        assert!(config.convert.italic);
        assert_eq!(config.lists, ListsConfig::default());
    }

    #[test]
    fn unknown_enum_value_is_a_parse_error() {
        let err = Config::from_toml("[headings]\nstyle = \"underline\"\n").unwrap_err();
        assert!(err.to_string().contains("underline"));
    }

    #[test]
    fn unknown_key_is_a_parse_error() {
        assert!(Config::from_toml("[lists]\nbulet = \"-\"\n").is_err());
    }

    #[test]
    fn option_enums_parse_from_cli_strings() {
        assert_eq!("plain".parse::<HeadingStyle>().unwrap(), HeadingStyle::Plain);
        assert_eq!("url-only".parse::<LinkFormat>().unwrap(), LinkFormat::UrlOnly);
        assert_eq!("preserve".parse::<TableMode>().unwrap(), TableMode::Preserve);
        assert_eq!(HeadingStyle::BoldWithMarker.to_string(), "bold-with-marker");
    }

    #[test]
    fn unsupported_heading_style() {
        let err = "huge".parse::<HeadingStyle>().unwrap_err();
        match err {
            Error::UnsupportedOption { option, value, .. } => {
                assert_eq!(option, "heading-style");
                assert_eq!(value, "huge");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn validate_rejects_empty_bullet_and_zero_rule() {
        let mut config = Config::default();
        config.lists.bullet.clear();
        assert!(matches!(
            config.validate(),
            Err(Error::UnsupportedOption { option: "list-bullet", .. })
        ));

        let mut config = Config::default();
        config.rules.length = 0;
        assert!(matches!(
            config.validate(),
            Err(Error::UnsupportedOption { option: "rule-length", .. })
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[lists]\nbullet = \"→\"").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.lists.bullet, "→");
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn load_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[rules]\nlength = 0").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedOption { .. }));
    }
}
