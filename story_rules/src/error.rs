//! Errors raised while loading content and configuration.

use thiserror::Error;

/// Errors from the rules layer. Play itself never fails; only loading can.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("duplicate story node id '{0}'")]
    DuplicateNode(String),

    #[error("start node '{0}' is not defined in the story")]
    MissingStart(String),
}
