// src/transform/scripts.rs

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use super::{OutputFile, SourceFile, Transform, TransformContext, TransformError};
use crate::types::Mode;

/// Minify JavaScript source code.
///
/// Sources are parsed as classic scripts so that plain browser code without
/// `import`/`export` is accepted.
pub fn minify_js(source: &str) -> Result<String, String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if let Some(first) = ret.errors.first() {
        return Err(first.to_string());
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Dev copies scripts as they are; release minifies them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptTransform;

impl Transform for ScriptTransform {
    fn name(&self) -> &'static str {
        "script"
    }

    fn apply(
        &self,
        ctx: &TransformContext<'_>,
        inputs: &[SourceFile],
    ) -> Result<Vec<OutputFile>, TransformError> {
        inputs
            .iter()
            .map(|input| match ctx.mode {
                Mode::Dev => Ok(OutputFile::new(&input.rel, input.contents.clone())),
                Mode::Release => {
                    let code = minify_js(input.text()?)
                        .map_err(|message| TransformError::new(&input.path, message))?;
                    Ok(OutputFile::new(&input.rel, code))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minified_output_is_smaller() {
        let src = "function greet(name) {\n  // say hi\n  return 'hi ' + name;\n}\nwindow.greet = greet;\n";
        let out = minify_js(src).unwrap();
        assert!(out.len() < src.len());
        assert!(!out.contains("say hi"));
    }

    #[test]
    fn parse_errors_are_reported() {
        assert!(minify_js("function (").is_err());
    }
}
