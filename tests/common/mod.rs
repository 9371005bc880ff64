// tests/common/mod.rs

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

pub use assetpipe_test_utils::builders::{AssetConfigBuilder, ConfigFileBuilder};
pub use assetpipe_test_utils::fake_executor::{CountingRunner, RecordingExecutor};
pub use assetpipe_test_utils::{init_tracing, wait_until, with_timeout};

pub type TestResult = Result<(), Box<dyn Error>>;

/// Write `contents` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

pub fn read_file(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel))
        .unwrap_or_else(|e| panic!("reading {rel}: {e}"))
}

/// Write `Assetpipe.toml` into `root` and return its path.
pub fn write_config(root: &Path, toml: &str) -> PathBuf {
    let path = root.join("Assetpipe.toml");
    fs::write(&path, toml).unwrap();
    path
}

/// A small site in the built-in `src/` layout.
pub fn scaffold_site(root: &Path) {
    write_file(
        root,
        "src/html/index.html",
        "<html><body>\n@@include('partials/header.html')\n<main class=\"hero\">Hi</main>\n</body></html>\n",
    );
    write_file(
        root,
        "src/html/partials/header.html",
        "<header class=\"site-header\">Header</header>",
    );
    write_file(root, "src/css/grid.css", ".grid { display: grid; }\n");
    write_file(root, "src/css/type.css", ".lead { font-size: 2rem; }\n");
    write_file(root, "src/scss/_vars.scss", "$accent: #c33;\n");
    write_file(
        root,
        "src/scss/main.scss",
        "@import 'vars';\n.hero { color: $accent; }\n.unused-banner { color: blue; }\n.venobox-frame { border: 0; }\n",
    );
    write_file(
        root,
        "src/js/app.js",
        "// greeting\nfunction greet(name) {\n  var message = 'hello ' + name;\n  return message;\n}\ngreet('site-header');\n",
    );
    write_file(root, "src/js/plugins/aos.min.js", "var AOS={init:function(){}};");
    write_file(root, "src/js/plugins/headroom.min.js", "var Headroom=function(){};");
    write_file(
        root,
        "src/images/icons/logo.svg",
        "<svg xmlns=\"http://www.w3.org/2000/svg\">  <!-- logo -->\n  <rect width=\"1\" height=\"1\"/>\n</svg>\n",
    );
    write_file(root, "src/php/mail.php", "<?php echo 'ok';\n");
}

/// blake3 digest of every file below `dir`, keyed by relative path.
pub fn snapshot(dir: &Path) -> BTreeMap<PathBuf, String> {
    let mut out = BTreeMap::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let Ok(entries) = fs::read_dir(&current) else {
            continue;
        };
        for entry in entries {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let bytes = fs::read(&path).unwrap();
                let rel = path.strip_prefix(dir).unwrap().to_path_buf();
                out.insert(rel, blake3::hash(&bytes).to_hex().to_string());
            }
        }
    }
    out
}
