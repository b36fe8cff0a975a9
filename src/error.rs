//! Error types for md2mrkdwn.
//!
//! Conversion itself never fails: every UTF-8 input has an mrkdwn rendering.
//! These errors cover the edges around it (reading input, loading and
//! validating configuration, writing output).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by configuration handling and the CLI.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read {source_name}: {source}")]
    InputRead {
        source_name: String,
        #[source]
        source: io::Error,
    },

    #[error("unsupported value {value:?} for option `{option}` (expected {expected})")]
    UnsupportedOption {
        option: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn unsupported(
        option: &'static str,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::UnsupportedOption {
            option,
            value: value.into(),
            expected,
        }
    }
}
