// src/transform/images.rs

//! Lossless image optimisation.
//!
//! PNGs are re-encoded with the strongest deflate setting, SVGs lose their
//! comments and the whitespace between tags. Everything else is copied. The
//! optimised bytes are only used when they are actually smaller.

use std::path::Path;
use std::sync::LazyLock;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::ImageFormat;
use regex::Regex;
use tracing::debug;

use super::{OutputFile, SourceFile, Transform, TransformContext, TransformError};

static SVG_COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->").unwrap_or_else(|e| panic!("svg comment regex: {e}"))
});

static SVG_GAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").unwrap_or_else(|e| panic!("svg gap regex: {e}")));

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageTransform;

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub fn optimize_png(bytes: &[u8]) -> Result<Vec<u8>, String> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| format!("cannot decode PNG: {e}"))?;
    let mut out = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
    img.write_with_encoder(encoder)
        .map_err(|e| format!("cannot encode PNG: {e}"))?;
    Ok(out)
}

pub fn optimize_svg(text: &str) -> String {
    let without_comments = SVG_COMMENT_RE.replace_all(text, "");
    SVG_GAP_RE
        .replace_all(&without_comments, "><")
        .trim()
        .to_string()
}

impl ImageTransform {
    fn optimize(&self, input: &SourceFile) -> Result<Vec<u8>, TransformError> {
        let optimized = match extension(&input.rel).as_deref() {
            Some("png") => optimize_png(&input.contents)
                .map_err(|message| TransformError::new(&input.path, message))?,
            Some("svg") => optimize_svg(input.text()?).into_bytes(),
            _ => return Ok(input.contents.clone()),
        };

        if optimized.len() < input.contents.len() {
            debug!(
                path = %input.path.display(),
                before = input.contents.len(),
                after = optimized.len(),
                "image optimised"
            );
            Ok(optimized)
        } else {
            Ok(input.contents.clone())
        }
    }
}

impl Transform for ImageTransform {
    fn name(&self) -> &'static str {
        "image"
    }

    fn apply(
        &self,
        _ctx: &TransformContext<'_>,
        inputs: &[SourceFile],
    ) -> Result<Vec<OutputFile>, TransformError> {
        inputs
            .iter()
            .map(|input| Ok(OutputFile::new(&input.rel, self.optimize(input)?)))
            .collect()
    }
}
