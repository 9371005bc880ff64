// src/transform/include.rs

//! `@@include('partial.html')` expansion for markup.
//!
//! Paths are resolved relative to the file containing the directive and
//! expanded recursively. An optional JSON object after the path
//! (`@@include('card.html', { "title": "x" })`) supplies parameters: every
//! `@@title` in the partial is replaced by its value. Nested partials inherit
//! their parent's parameters; unknown `@@name` tokens are left as they are.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};
use tracing::trace;

use super::{OutputFile, SourceFile, Transform, TransformContext, TransformError};
use crate::fs::FileSystem;

static INCLUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@@include\(\s*(?:'([^']+)'|"([^"]+)")\s*"#)
        .unwrap_or_else(|e| panic!("include directive regex: {e}"))
});

static PARAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@@([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)")
        .unwrap_or_else(|e| panic!("include parameter regex: {e}"))
});

/// Partials nested deeper than this are assumed to be a runaway expansion.
const MAX_DEPTH: usize = 32;

type Params = Map<String, Value>;

#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeTransform;

impl Transform for IncludeTransform {
    fn name(&self) -> &'static str {
        "include"
    }

    fn apply(
        &self,
        ctx: &TransformContext<'_>,
        inputs: &[SourceFile],
    ) -> Result<Vec<OutputFile>, TransformError> {
        inputs
            .iter()
            .map(|input| {
                let mut stack = vec![input.path.clone()];
                let html = expand(ctx.fs, &input.path, input.text()?, &Params::new(), &mut stack)?;
                Ok(OutputFile::new(&input.rel, html))
            })
            .collect()
    }
}

/// Find the `)` closing a directive whose argument list continues at
/// `rest`. Parentheses inside quoted strings do not count. Returns the
/// argument text (without the leading comma) and the byte length consumed.
fn split_arguments(rest: &str) -> Option<(&str, usize)> {
    if rest.starts_with(')') {
        return Some(("", 1));
    }
    let args = rest.strip_prefix(',')?;

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in args.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '{' | '[' => depth += 1,
            ')' if depth == 0 => return Some((&args[..i], 1 + i + 1)),
            ')' | '}' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

fn parse_params(file: &Path, args: &str, inherited: &Params) -> Result<Params, TransformError> {
    let mut params = inherited.clone();
    let args = args.trim();
    if args.is_empty() {
        return Ok(params);
    }
    let value: Value = serde_json::from_str(args).map_err(|e| {
        TransformError::new(file, format!("invalid include parameters {args:?}: {e}"))
    })?;
    let Value::Object(own) = value else {
        return Err(TransformError::new(
            file,
            format!("include parameters must be a JSON object, got {args:?}"),
        ));
    };
    params.extend(own);
    Ok(params)
}

fn lookup<'a>(params: &'a Params, key: &str) -> Option<&'a Value> {
    let mut parts = key.split('.');
    let mut value = params.get(parts.next()?)?;
    for part in parts {
        value = value.as_object()?.get(part)?;
    }
    Some(value)
}

fn substitute(text: &str, params: &Params) -> String {
    if params.is_empty() {
        return text.to_string();
    }
    PARAM_RE
        .replace_all(text, |caps: &Captures<'_>| match lookup(params, &caps[1]) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn expand(
    fs: &dyn FileSystem,
    file: &Path,
    text: &str,
    params: &Params,
    stack: &mut Vec<PathBuf>,
) -> Result<String, TransformError> {
    let base = file.parent().unwrap_or_else(|| Path::new(""));
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut search_from = 0;

    while let Some(caps) = INCLUDE_RE.captures_at(text, search_from) {
        let Some(whole) = caps.get(0) else { break };
        let Some(target) = caps.get(1).or_else(|| caps.get(2)) else {
            break;
        };
        let Some((args, consumed)) = split_arguments(&text[whole.end()..]) else {
            // Not a complete directive; keep it as text.
            search_from = whole.end();
            continue;
        };
        let end = whole.end() + consumed;

        out.push_str(&substitute(&text[last..whole.start()], params));
        last = end;
        search_from = end;

        let partial = base.join(target.as_str());
        if stack.contains(&partial) {
            return Err(TransformError::new(
                file,
                format!("include cycle through {}", partial.display()),
            ));
        }
        if stack.len() >= MAX_DEPTH {
            return Err(TransformError::new(
                file,
                format!("includes nested deeper than {MAX_DEPTH} levels"),
            ));
        }

        let child_params = parse_params(file, args, params)?;
        let body = fs.read_to_string(&partial).map_err(|e| {
            TransformError::new(
                file,
                format!("cannot include {}: {e:#}", target.as_str()),
            )
        })?;
        trace!(file = %file.display(), partial = %partial.display(), "expanding include");

        stack.push(partial.clone());
        let expanded = expand(fs, &partial, &body, &child_params, stack)?;
        stack.pop();

        out.push_str(&expanded);
    }

    out.push_str(&substitute(&text[last..], params));
    Ok(out)
}
