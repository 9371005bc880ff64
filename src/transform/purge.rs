// src/transform/purge.rs

//! Unused selector removal for release stylesheets.
//!
//! Content files (release HTML and JS) are reduced to a set of tokens. Any
//! class or id selector in a stylesheet whose name is not among those tokens
//! and not matched by the safelist is handed to lightningcss as unused, and
//! the rules that only reference unused names disappear.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::styles::process_css;

static CONTENT_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9_-]+").unwrap_or_else(|e| panic!("content token regex: {e}"))
});

static SELECTOR_SYMBOL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[.#](-?[_A-Za-z][_A-Za-z0-9-]*)")
        .unwrap_or_else(|e| panic!("selector symbol regex: {e}"))
});

/// Tokens that keep a selector alive.
#[derive(Debug, Clone, Default)]
pub struct ContentTokens {
    tokens: HashSet<String>,
}

impl ContentTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every token found in one content file.
    pub fn scan(&mut self, text: &str) {
        self.tokens
            .extend(CONTENT_TOKEN_RE.find_iter(text).map(|m| m.as_str().to_string()));
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Compiled `purge_safelist`.
#[derive(Debug, Clone, Default)]
pub struct Safelist {
    patterns: Vec<Regex>,
}

impl Safelist {
    pub fn new(patterns: &[String]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_safe(&self, symbol: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(symbol))
    }
}

/// Class and id names a stylesheet mentions.
///
/// This over-approximates (it also picks up hex colours and file
/// extensions). Such names never appear as selectors, so reporting them as
/// unused has no effect.
pub fn selector_symbols(css: &str) -> BTreeSet<String> {
    SELECTOR_SYMBOL_RE
        .captures_iter(css)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Symbols of `css` that may be purged.
pub fn unused_symbols(css: &str, content: &ContentTokens, safelist: &Safelist) -> HashSet<String> {
    selector_symbols(css)
        .into_iter()
        .filter(|s| !content.contains(s) && !safelist.is_safe(s))
        .collect()
}

/// Purge, prefix and minify one stylesheet.
pub fn purge_stylesheet(
    filename: &Path,
    css: &str,
    content: &ContentTokens,
    safelist: &Safelist,
) -> Result<String, String> {
    let unused = unused_symbols(css, content, safelist);
    process_css(filename, css, true, unused)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_safelist() -> Safelist {
        Safelist::new(&["^veno".to_string(), "^swiper-pagination".to_string()]).unwrap()
    }

    #[test]
    fn drops_unreferenced_rules_and_keeps_safelisted_ones() {
        let mut content = ContentTokens::new();
        content.scan(r#"<div class="hero btn-primary"></div><script>el.classList.add("open")</script>"#);

        let css = ".hero{color:red}\n.btn-primary{color:blue}\n.unused{color:green}\n\
                   .venobox-open{color:black}\n.open{display:block}\n";
        let out = purge_stylesheet(Path::new("main.css"), css, &content, &default_safelist()).unwrap();

        assert!(out.contains(".hero"), "{out}");
        assert!(out.contains(".btn-primary"), "{out}");
        assert!(out.contains(".open"), "{out}");
        assert!(out.contains(".venobox-open"), "{out}");
        assert!(!out.contains(".unused"), "{out}");
        assert!(!out.contains('\n'), "output should be minified: {out}");
    }

    #[test]
    fn symbols_ignore_numeric_fractions() {
        let symbols = selector_symbols(".a{margin:.5em} #main .b-c{}");
        assert_eq!(
            symbols.into_iter().collect::<Vec<_>>(),
            vec!["a".to_string(), "b-c".to_string(), "main".to_string()]
        );
    }
}
