//! Error types for BhittiNav

use thiserror::Error;

/// BhittiNav error type
#[derive(Error, Debug)]
pub enum BhittiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Robot link error: {0}")]
    Link(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for BhittiError {
    fn from(e: toml::de::Error) -> Self {
        BhittiError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BhittiError>;
