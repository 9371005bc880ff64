// src/transform/styles.rs

//! Sass compilation (`grass`) followed by vendor prefixing (`lightningcss`).

use std::collections::HashSet;
use std::path::Path;

use grass::{Options, OutputStyle};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use super::{with_extension, OutputFile, SourceFile, Transform, TransformContext, TransformError};
use crate::types::Mode;

const fn version(major: u32) -> Option<u32> {
    Some(major << 16)
}

/// Browsers every stylesheet is prefixed for.
pub fn browser_targets() -> Targets {
    Targets::from(Browsers {
        chrome: version(87),
        edge: version(88),
        firefox: version(78),
        safari: version(14),
        ios_saf: version(14),
        samsung: version(14),
        ..Browsers::default()
    })
}

/// Parse `css`, add vendor prefixes, drop rules using `unused_symbols`, and
/// print it back, minified when `minify` is set.
pub fn process_css(
    filename: &Path,
    css: &str,
    minify: bool,
    unused_symbols: HashSet<String>,
) -> Result<String, String> {
    let mut sheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: filename.to_string_lossy().to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| e.to_string())?;

    sheet
        .minify(MinifyOptions {
            targets: browser_targets(),
            unused_symbols,
        })
        .map_err(|e| e.to_string())?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify,
            targets: browser_targets(),
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;

    Ok(printed.code)
}

/// Compiles every non-partial `.scss` input to `.css`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SassTransform;

impl SassTransform {
    fn compile(&self, input: &SourceFile, mode: Mode) -> Result<String, TransformError> {
        let style = match mode {
            Mode::Dev => OutputStyle::Expanded,
            Mode::Release => OutputStyle::Compressed,
        };
        let mut options = Options::default().style(style);
        if let Some(dir) = input.path.parent() {
            options = options.load_path(dir);
        }

        let css = grass::from_string(input.text()?.to_string(), &options)
            .map_err(|e| TransformError::new(&input.path, e.to_string()))?;

        process_css(&input.path, &css, mode == Mode::Release, HashSet::new())
            .map_err(|message| TransformError::new(&input.path, message))
    }
}

fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

impl Transform for SassTransform {
    fn name(&self) -> &'static str {
        "sass"
    }

    fn apply(
        &self,
        ctx: &TransformContext<'_>,
        inputs: &[SourceFile],
    ) -> Result<Vec<OutputFile>, TransformError> {
        inputs
            .iter()
            .filter(|input| !is_partial(&input.rel))
            .map(|input| {
                let css = self.compile(input, ctx.mode)?;
                Ok(OutputFile::new(with_extension(&input.rel, "css"), css))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::types::AssetClass;
    use std::path::PathBuf;

    fn scss(rel: &str, body: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from("/nonexistent/src/scss").join(rel),
            rel: PathBuf::from(rel),
            contents: body.as_bytes().to_vec(),
        }
    }

    fn apply(mode: Mode, inputs: &[SourceFile]) -> Result<Vec<OutputFile>, TransformError> {
        let fs = MockFileSystem::new();
        let ctx = TransformContext {
            class: AssetClass::StylesSource,
            mode,
            fs: &fs,
        };
        SassTransform.apply(&ctx, inputs)
    }

    #[test]
    fn compiles_and_prefixes() {
        let out = apply(
            Mode::Dev,
            &[scss("main.scss", "$c: red; .card { color: $c; .title { user-select: none; } }")],
        )
        .unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rel, PathBuf::from("main.css"));
        let css = String::from_utf8(out[0].contents.clone()).unwrap();
        assert!(css.contains(".card .title"), "{css}");
        assert!(css.contains("-webkit-user-select"), "{css}");
    }

    #[test]
    fn partials_produce_no_output() {
        let out = apply(Mode::Dev, &[scss("_vars.scss", "$c: red;")]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn syntax_errors_name_the_file() {
        let err = apply(Mode::Release, &[scss("broken.scss", ".a { color: red")]).unwrap_err();
        assert_eq!(err.path, PathBuf::from("/nonexistent/src/scss/broken.scss"));
    }
}
