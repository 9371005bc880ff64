// src/transform/copy.rs

use super::{OutputFile, SourceFile, Transform, TransformContext, TransformError};

/// Writes every input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyTransform;

impl Transform for CopyTransform {
    fn name(&self) -> &'static str {
        "copy"
    }

    fn apply(
        &self,
        _ctx: &TransformContext<'_>,
        inputs: &[SourceFile],
    ) -> Result<Vec<OutputFile>, TransformError> {
        Ok(inputs
            .iter()
            .map(|input| OutputFile::new(&input.rel, input.contents.clone()))
            .collect())
    }
}
