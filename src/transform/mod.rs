// src/transform/mod.rs

//! Transform collaborators.
//!
//! A transform is a pure function from the ordered inputs of one asset class
//! to the files written into its destination. It never touches the output
//! tree itself: the executor writes the returned [`OutputFile`]s only after
//! the whole transform succeeded, so a failing class leaves nothing behind.
//!
//! - [`include`]: HTML partial expansion (`@@include('...')`).
//! - [`concat`]: join inputs in source order into one file.
//! - [`styles`]: Sass compilation plus autoprefixing.
//! - [`scripts`]: copy in dev, minify in release.
//! - [`images`]: lossless recompression, keeps whichever is smaller.
//! - [`copy`]: identity.
//! - [`command`]: pipe each input through an external command.
//! - [`purge`]: release-only removal of unused style selectors.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::TransformSpec;
use crate::fs::FileSystem;
use crate::types::{AssetClass, Mode};

pub mod command;
pub mod concat;
pub mod copy;
pub mod images;
pub mod include;
pub mod purge;
pub mod scripts;
pub mod styles;

/// One transform input, read before the transform runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Full path of the file (project directory joined with its pattern match).
    pub path: PathBuf,
    /// Path relative to the base directory of the pattern that matched it.
    /// Outputs keep this layout below the destination.
    pub rel: PathBuf,
    pub contents: Vec<u8>,
}

impl SourceFile {
    pub fn text(&self) -> Result<&str, TransformError> {
        std::str::from_utf8(&self.contents)
            .map_err(|e| TransformError::new(&self.path, format!("not valid UTF-8: {e}")))
    }
}

/// A file to be written below the class destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub rel: PathBuf,
    pub contents: Vec<u8>,
}

impl OutputFile {
    pub fn new(rel: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            rel: rel.into(),
            contents: contents.into(),
        }
    }
}

/// Everything a transform may consult besides its inputs.
pub struct TransformContext<'a> {
    pub class: AssetClass,
    pub mode: Mode,
    /// Used for reads the transform discovers itself (HTML partials).
    pub fs: &'a dyn FileSystem,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path:?}: {message}")]
pub struct TransformError {
    pub path: PathBuf,
    pub message: String,
}

impl TransformError {
    pub fn new(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }
}

/// Uniform interface over every collaborator.
pub trait Transform: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        ctx: &TransformContext<'_>,
        inputs: &[SourceFile],
    ) -> Result<Vec<OutputFile>, TransformError>;
}

/// Instantiate the collaborator selected in the config.
pub fn build_transform(spec: &TransformSpec) -> Box<dyn Transform> {
    match spec {
        TransformSpec::Include => Box::new(include::IncludeTransform),
        TransformSpec::Concat { output } => Box::new(concat::ConcatTransform::new(output)),
        TransformSpec::Sass => Box::new(styles::SassTransform),
        TransformSpec::Script => Box::new(scripts::ScriptTransform),
        TransformSpec::Image => Box::new(images::ImageTransform),
        TransformSpec::Copy => Box::new(copy::CopyTransform),
        TransformSpec::Command { command } => Box::new(command::CommandTransform::new(command)),
    }
}

/// Same relative path with a different extension.
pub(crate) fn with_extension(rel: &Path, ext: &str) -> PathBuf {
    let mut out = rel.to_path_buf();
    out.set_extension(ext);
    out
}
