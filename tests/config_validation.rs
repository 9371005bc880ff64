// tests/config_validation.rs

mod common;

use std::path::PathBuf;

use assetpipe::config::{check_source_overlap, load_and_validate, TransformKind, TransformSpec};
use assetpipe::errors::PipelineError;
use assetpipe::fs::RealFileSystem;
use assetpipe::graph::build_bindings;
use assetpipe::types::{AssetClass, HashStorageMode};
use tempfile::tempdir;

use crate::common::{write_config, write_file, AssetConfigBuilder, ConfigFileBuilder, TestResult};

#[test]
fn default_layout_groups_classes_sharing_a_destination() {
    let cfg = ConfigFileBuilder::default_layout().build();
    let bindings = build_bindings(&cfg);

    let names: Vec<&str> = bindings.iter().map(|b| b.name()).collect();
    assert_eq!(
        names,
        vec![
            "markup",
            "styles-precompiled+styles-source",
            "scripts+scripts-vendor",
            "images",
            "server-scripts",
        ]
    );
}

#[test]
fn identical_patterns_in_two_classes_are_rejected() {
    let result = ConfigFileBuilder::new()
        .with_asset(
            AssetClass::Scripts,
            AssetConfigBuilder::new(&["src/js/*.js"], "build/js", "dist/js").build(),
        )
        .with_asset(
            AssetClass::ScriptsVendor,
            AssetConfigBuilder::new(&["./src/js/*.js"], "build/vendor", "dist/vendor")
                .transform(TransformKind::Copy)
                .build(),
        )
        .try_build();

    assert!(matches!(result, Err(PipelineError::Config(msg)) if msg.contains("overlaps")));
}

#[test]
fn literal_source_inside_another_glob_is_rejected() {
    let result = ConfigFileBuilder::new()
        .with_asset(
            AssetClass::Scripts,
            AssetConfigBuilder::new(&["src/js/*.js"], "build/js", "dist/js").build(),
        )
        .with_asset(
            AssetClass::ScriptsVendor,
            AssetConfigBuilder::new(&["src/js/vendor.js"], "build/js", "dist/js")
                .output("vendor.js")
                .build(),
        )
        .try_build();

    assert!(matches!(result, Err(PipelineError::Config(_))));
}

#[test]
fn deep_clean_over_another_bindings_output_is_rejected() {
    let result = ConfigFileBuilder::new()
        .with_asset(
            AssetClass::Markup,
            AssetConfigBuilder::new(&["src/html/*.html"], "build", "dist")
                .clean("**/*")
                .build(),
        )
        .with_asset(
            AssetClass::Scripts,
            AssetConfigBuilder::new(&["src/js/*.js"], "build/assets/js", "dist/assets/js").build(),
        )
        .try_build();

    match result {
        Err(PipelineError::Config(msg)) => assert!(msg.contains("would delete output"), "{msg}"),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn shallow_clean_matching_the_enclosing_directory_is_rejected() {
    for pattern in ["*", "a*", "{assets,*.html}"] {
        let result = ConfigFileBuilder::new()
            .with_asset(
                AssetClass::Markup,
                AssetConfigBuilder::new(&["src/html/*.html"], "build", "dist")
                    .clean(pattern)
                    .build(),
            )
            .with_asset(
                AssetClass::Scripts,
                AssetConfigBuilder::new(&["src/js/*.js"], "build/assets/js", "dist/assets/js")
                    .build(),
            )
            .try_build();

        match result {
            Err(PipelineError::Config(msg)) => {
                assert!(msg.contains("would delete output"), "{pattern}: {msg}")
            }
            other => panic!("{pattern}: expected config error, got {other:?}"),
        }
    }
}

#[test]
fn default_layout_rejects_a_catch_all_markup_clean() {
    let result = ConfigFileBuilder::default_layout()
        .with_asset(
            AssetClass::Markup,
            AssetConfigBuilder::new(&["src/html/*.html"], "build", "dist")
                .clean("*")
                .build(),
        )
        .try_build();

    assert!(matches!(result, Err(PipelineError::Config(msg)) if msg.contains("build/assets")));
}

#[test]
fn top_level_clean_may_enclose_other_outputs() {
    let cfg = ConfigFileBuilder::new()
        .with_asset(
            AssetClass::Markup,
            AssetConfigBuilder::new(&["src/html/*.html"], "build", "dist")
                .clean("*.html")
                .build(),
        )
        .with_asset(
            AssetClass::Scripts,
            AssetConfigBuilder::new(&["src/js/*.js"], "build/assets/js", "dist/assets/js").build(),
        )
        .build();

    assert_eq!(build_bindings(&cfg).len(), 2);
}

#[test]
fn destinations_must_stay_inside_their_roots() {
    let result = ConfigFileBuilder::new()
        .with_asset(
            AssetClass::Images,
            AssetConfigBuilder::new(&["src/img/*.png"], "public/img", "dist/img").build(),
        )
        .try_build();

    assert!(matches!(result, Err(PipelineError::Config(msg)) if msg.contains("dev_root")));
}

#[test]
fn concat_needs_an_output_name() {
    let result = ConfigFileBuilder::new()
        .with_asset(
            AssetClass::StylesPrecompiled,
            AssetConfigBuilder::new(&["src/css/*.css"], "build/css", "dist/css")
                .transform(TransformKind::Concat)
                .build(),
        )
        .try_build();

    assert!(matches!(result, Err(PipelineError::Config(msg)) if msg.contains("output")));
}

#[test]
fn invalid_safelist_regex_is_rejected() {
    let result = ConfigFileBuilder::default_layout()
        .with_safelist(&["(unclosed"])
        .try_build();

    assert!(matches!(result, Err(PipelineError::Config(msg)) if msg.contains("purge_safelist")));
}

#[test]
fn files_claimed_by_two_classes_on_disk_are_reported() -> TestResult {
    let dir = tempdir()?;
    write_file(dir.path(), "src/pages/index.html", "<p>hi</p>");

    let cfg = ConfigFileBuilder::new()
        .with_asset(
            AssetClass::Markup,
            AssetConfigBuilder::new(&["src/pages/*.html"], "build/a", "dist/a").build(),
        )
        .with_asset(
            AssetClass::ServerScripts,
            AssetConfigBuilder::new(&["src/**/*.html"], "build/b", "dist/b")
                .transform(TransformKind::Copy)
                .build(),
        )
        .with_project_dir(dir.path())
        .build();

    match check_source_overlap(&RealFileSystem, &cfg) {
        Err(PipelineError::SourceOverlap {
            path,
            first,
            second,
        }) => {
            assert_eq!(path, PathBuf::from("src/pages/index.html"));
            assert_eq!(first, AssetClass::Markup);
            assert_eq!(second, AssetClass::ServerScripts);
        }
        other => panic!("expected SourceOverlap, got {other:?}"),
    }
    Ok(())
}

#[test]
fn toml_file_is_loaded_relative_to_its_directory() -> TestResult {
    let dir = tempdir()?;
    let path = write_config(
        dir.path(),
        r#"
[paths]
dev_root = "./out"
release_root = "public"

[watch]
use_hash = true
hash_storage = "file"

[asset.markup]
source = ["src/*.html"]
dev_dest = "out"
release_dest = "public"
clean = "*.html"

[asset.scripts-vendor]
source = ["src/vendor/a.js", "src/vendor/b.js"]
dev_dest = "out/js"
release_dest = "public/js"
output = "vendor.js"
"#,
    );

    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.project_dir(), dir.path());
    assert_eq!(cfg.paths().dev_root, PathBuf::from("out"));
    assert!(cfg.watch().use_hash);
    assert_eq!(cfg.watch().hash_storage, HashStorageMode::File);
    assert_eq!(cfg.assets().len(), 2);

    let vendor = cfg.asset(AssetClass::ScriptsVendor).unwrap();
    assert_eq!(
        vendor.transform,
        TransformSpec::Concat {
            output: "vendor.js".to_string()
        }
    );
    assert_eq!(vendor.clean, "**/*");
    Ok(())
}

#[test]
fn unknown_asset_class_is_a_config_error() -> TestResult {
    let dir = tempdir()?;
    let path = write_config(
        dir.path(),
        r#"
[asset.fonts]
source = ["src/fonts/*"]
dev_dest = "build/fonts"
release_dest = "dist/fonts"
"#,
    );

    let err = load_and_validate(&path).unwrap_err();
    assert!(err.to_string().contains("unknown asset class"), "{err}");
    Ok(())
}
