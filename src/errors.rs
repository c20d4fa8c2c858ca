//! WP-prefixed error types for the fallible paths outside the core loop.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PanelError>;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("[WP-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[WP-1002] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[WP-2001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[WP-3001] channel closed in component {component}")]
    ChannelClosed { component: &'static str },
}

impl PanelError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "WP-1001",
            Self::ConfigParse { .. } => "WP-1002",
            Self::Io { .. } => "WP-2001",
            Self::ChannelClosed { .. } => "WP-3001",
        }
    }

    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<toml::de::Error> for PanelError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
