// tests/release_build.rs

mod common;

use std::sync::Arc;

use assetpipe::run_release;
use tempfile::tempdir;

use crate::common::{
    init_tracing, read_file, scaffold_site, with_timeout, write_file, ConfigFileBuilder,
    TestResult,
};

#[tokio::test]
async fn release_purges_unused_selectors_and_minifies() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let root = dir.path();
    scaffold_site(root);
    write_file(root, "dist/old-build.html", "stale");

    let cfg = ConfigFileBuilder::default_layout()
        .with_project_dir(root)
        .build();
    with_timeout(run_release(Arc::new(cfg))).await?;

    assert!(!root.join("dist/old-build.html").exists());
    assert!(!root.join("build").exists(), "release must not touch the dev root");

    let main_css = read_file(root, "dist/assets/css/main.css");
    assert!(main_css.contains(".hero"), "{main_css}");
    assert!(main_css.contains(".venobox-frame"), "safelisted: {main_css}");
    assert!(!main_css.contains("unused-banner"), "{main_css}");
    assert!(!main_css.contains('\n'), "minified: {main_css}");

    let source_js = read_file(root, "src/js/app.js");
    let app_js = read_file(root, "dist/assets/js/app.js");
    assert!(!app_js.contains("// greeting"));
    assert!(app_js.len() < source_js.len());

    assert!(read_file(root, "dist/index.html").contains("site-header"));
    assert!(root.join("dist/assets/images/icons/logo.svg").exists());
    assert!(root.join("dist/assets/php/mail.php").exists());
    Ok(())
}

#[tokio::test]
async fn release_stops_at_the_first_failing_stage() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let root = dir.path();
    scaffold_site(root);
    write_file(root, "src/js/app.js", "function broken( {\n");

    let cfg = ConfigFileBuilder::default_layout()
        .with_project_dir(root)
        .build();
    let err = with_timeout(run_release(Arc::new(cfg))).await.unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("transform scripts (release)"), "{message}");

    // Stages before the failure ran, stages after it did not.
    assert!(root.join("dist/index.html").exists());
    assert!(root.join("dist/assets/css/plugins.css").exists());
    assert!(!root.join("dist/assets/js/app.js").exists());
    assert!(!root.join("dist/assets/images").exists());
    assert!(!root.join("dist/assets/css/main.css").exists());
    Ok(())
}

#[tokio::test]
async fn safelist_is_configurable() -> TestResult {
    let dir = tempdir()?;
    let root = dir.path();
    write_file(root, "src/html/index.html", "<p class=\"intro\">hi</p>");
    write_file(
        root,
        "src/scss/site.scss",
        ".intro { margin: 0; }\n.js-toggled { display: none; }\n.venobox-frame { border: 0; }\n",
    );

    let cfg = ConfigFileBuilder::default_layout()
        .with_safelist(&["^js-"])
        .with_project_dir(root)
        .build();
    run_release(Arc::new(cfg)).await?;

    let css = read_file(root, "dist/assets/css/site.css");
    assert!(css.contains(".intro"), "{css}");
    assert!(css.contains(".js-toggled"), "{css}");
    assert!(!css.contains("venobox"), "{css}");
    Ok(())
}
