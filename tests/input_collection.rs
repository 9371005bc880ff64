// tests/input_collection.rs

mod common;

use std::path::PathBuf;

use assetpipe::exec::collect_inputs;
use assetpipe::fs::mock::MockFileSystem;
use assetpipe::types::AssetClass;

use crate::common::{AssetConfigBuilder, ConfigFileBuilder};

fn rels(files: &[assetpipe::transform::SourceFile]) -> Vec<String> {
    files
        .iter()
        .map(|f| f.rel.to_string_lossy().replace('\\', "/"))
        .collect()
}

#[test]
fn literal_sources_keep_their_listed_order() {
    let fs = MockFileSystem::new();
    fs.add_file("/p/src/js/plugins/zeta.js", "z");
    fs.add_file("/p/src/js/plugins/alpha.js", "a");

    let cfg = ConfigFileBuilder::new()
        .with_asset(
            AssetClass::ScriptsVendor,
            AssetConfigBuilder::new(
                &[
                    "src/js/plugins/zeta.js",
                    "src/js/plugins/missing.js",
                    "src/js/plugins/alpha.js",
                ],
                "build/js",
                "dist/js",
            )
            .output("plugins.js")
            .build(),
        )
        .with_project_dir("/p")
        .build();
    let spec = cfg.asset(AssetClass::ScriptsVendor).unwrap();

    let inputs = collect_inputs(&fs, &cfg, spec).unwrap();

    assert_eq!(rels(&inputs), vec!["zeta.js", "alpha.js"]);
    assert_eq!(inputs[0].contents, b"z");
}

#[test]
fn globs_are_sorted_deduplicated_and_filtered() {
    let fs = MockFileSystem::new();
    fs.add_file("/p/src/scss/main.scss", "");
    fs.add_file("/p/src/scss/components/button.scss", "");
    fs.add_file("/p/src/scss/plugins/swiper.scss", "");
    fs.add_file("/p/src/scss/notes.txt", "");

    let cfg = ConfigFileBuilder::new()
        .with_asset(
            AssetClass::StylesSource,
            AssetConfigBuilder::new(
                &["src/scss/main.scss", "src/scss/**/*.scss"],
                "build/css",
                "dist/css",
            )
            .exclude("src/scss/plugins/**/*.scss")
            .build(),
        )
        .with_project_dir("/p")
        .build();
    let spec = cfg.asset(AssetClass::StylesSource).unwrap();

    let inputs = collect_inputs(&fs, &cfg, spec).unwrap();

    assert_eq!(rels(&inputs), vec!["main.scss", "components/button.scss"]);
    assert_eq!(inputs[1].path, PathBuf::from("/p/src/scss/components/button.scss"));
}
