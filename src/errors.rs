// src/errors.rs

//! Crate-wide error type and aliases.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::AssetClass;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("source file {path:?} is claimed by both {first} and {second}")]
    SourceOverlap {
        path: PathBuf,
        first: AssetClass,
        second: AssetClass,
    },

    #[error("{class}: failed to transform {path:?}: {message}")]
    TransformFailure {
        class: AssetClass,
        path: PathBuf,
        message: String,
    },

    #[error("filesystem error at {path:?}: {message}")]
    Filesystem { path: PathBuf, message: String },

    #[error("cannot watch {path:?}: {message}")]
    WatcherSubscription { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    /// Wrap an `anyhow` chain coming out of the filesystem layer.
    pub fn filesystem(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        PipelineError::Filesystem {
            path: path.into(),
            message: format!("{err:#}"),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipelineError>;
