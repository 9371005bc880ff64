// src/transform/concat.rs

use super::{OutputFile, SourceFile, Transform, TransformContext, TransformError};

/// Joins all inputs, in source order, into a single `output` file.
#[derive(Debug, Clone)]
pub struct ConcatTransform {
    output: String,
}

impl ConcatTransform {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
        }
    }
}

impl Transform for ConcatTransform {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn apply(
        &self,
        _ctx: &TransformContext<'_>,
        inputs: &[SourceFile],
    ) -> Result<Vec<OutputFile>, TransformError> {
        let mut joined = Vec::new();
        for (i, input) in inputs.iter().enumerate() {
            if i > 0 {
                joined.push(b'\n');
            }
            joined.extend_from_slice(&input.contents);
        }
        Ok(vec![OutputFile::new(&self.output, joined)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::types::{AssetClass, Mode};
    use std::path::PathBuf;

    fn source(name: &str, body: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from("src/js/plugins").join(name),
            rel: PathBuf::from(name),
            contents: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn joins_in_listed_order() {
        let fs = MockFileSystem::new();
        let ctx = TransformContext {
            class: AssetClass::ScriptsVendor,
            mode: Mode::Dev,
            fs: &fs,
        };
        let out = ConcatTransform::new("plugins.js")
            .apply(&ctx, &[source("b.js", "var b;"), source("a.js", "var a;")])
            .unwrap();

        assert_eq!(out, vec![OutputFile::new("plugins.js", "var b;\nvar a;")]);
    }
}
