// tests/watch_triggers.rs

mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use assetpipe::config::{ConfigFile, TransformKind};
use assetpipe::engine::RuntimeEvent;
use assetpipe::errors::PipelineError;
use assetpipe::fs::mock::MockFileSystem;
use assetpipe::fs::{FileSystem, RealFileSystem};
use assetpipe::graph::build_bindings;
use assetpipe::types::{AssetClass, HashStorageMode};
use assetpipe::watch::event_handler::{process_file_change, HashFilter};
use assetpipe::watch::{build_binding_profiles, spawn_watcher, BindingWatchProfile, MemoryHashStore};
use tempfile::tempdir;
use tokio::sync::mpsc;

use crate::common::{
    init_tracing, scaffold_site, with_timeout, write_file, AssetConfigBuilder, ConfigFileBuilder,
    TestResult,
};

fn two_class_config(use_hash: bool) -> ConfigFile {
    ConfigFileBuilder::new()
        .with_asset(
            AssetClass::Markup,
            AssetConfigBuilder::new(&["src/html/*.html"], "build", "dist")
                .watch("src/html/**/*.html")
                .clean("*.html")
                .use_hash(use_hash)
                .build(),
        )
        .with_asset(
            AssetClass::Scripts,
            AssetConfigBuilder::new(&["src/js/*.js"], "build/js", "dist/js").build(),
        )
        .with_project_dir("/p")
        .build()
}

fn profiles(cfg: &ConfigFile) -> Vec<BindingWatchProfile> {
    build_binding_profiles(cfg, &build_bindings(cfg)).unwrap()
}

fn drain(rx: &mut mpsc::Receiver<RuntimeEvent>) -> Vec<usize> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let RuntimeEvent::BindingTriggered { binding, .. } = event {
            out.push(binding);
        }
    }
    out
}

#[tokio::test]
async fn changes_trigger_only_the_bindings_watching_them() {
    init_tracing();
    let fs = Arc::new(MockFileSystem::new());
    fs.add_file("/p/src/html/partials/nav.html", "<nav></nav>");
    fs.add_file("/p/src/js/app.js", "go()");

    let cfg = two_class_config(false);
    let profiles = profiles(&cfg);
    let filter = HashFilter::new(Box::new(MemoryHashStore::new()));
    let (tx, mut rx) = mpsc::channel(16);
    let fs: Arc<dyn FileSystem> = fs;
    let root = Path::new("/p");

    for changed in [
        "/p/src/html/partials/nav.html",
        "/p/src/js/app.js",
        "/p/src/js/lib/deep.js",
        "/p/README.md",
    ] {
        let open =
            process_file_change(Arc::clone(&fs), root, Path::new(changed), &profiles, &tx, &filter)
                .await;
        assert!(open);
    }

    // `src/js/*.js` does not reach into subdirectories.
    assert_eq!(drain(&mut rx), vec![0, 1]);
}

#[tokio::test]
async fn hashed_bindings_skip_saves_without_content_changes() {
    let mock = Arc::new(MockFileSystem::new());
    mock.add_file("/p/src/html/index.html", "<p>v1</p>");

    let cfg = two_class_config(true);
    let profiles = profiles(&cfg);
    let filter = HashFilter::new(Box::new(MemoryHashStore::new()));
    let (tx, mut rx) = mpsc::channel(16);
    let fs: Arc<dyn FileSystem> = mock.clone();
    let root = Path::new("/p");
    let page = Path::new("/p/src/html/index.html");

    process_file_change(Arc::clone(&fs), root, page, &profiles, &tx, &filter).await;
    assert_eq!(drain(&mut rx), vec![0]);

    // Touch without changing bytes.
    process_file_change(Arc::clone(&fs), root, page, &profiles, &tx, &filter).await;
    assert!(drain(&mut rx).is_empty());

    mock.add_file("/p/src/html/index.html", "<p>v2</p>");
    process_file_change(Arc::clone(&fs), root, page, &profiles, &tx, &filter).await;
    assert_eq!(drain(&mut rx), vec![0]);
}

#[tokio::test]
async fn closed_runtime_channel_stops_processing() {
    let mock = Arc::new(MockFileSystem::new());
    let cfg = two_class_config(false);
    let profiles = profiles(&cfg);
    let filter = HashFilter::new(Box::new(MemoryHashStore::new()));
    let (tx, rx) = mpsc::channel(1);
    drop(rx);

    let open = process_file_change(
        mock,
        Path::new("/p"),
        Path::new("/p/src/js/app.js"),
        &profiles,
        &tx,
        &filter,
    )
    .await;
    assert!(!open);
}

#[tokio::test]
async fn watcher_reports_edits_to_source_files() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let root = dir.path();
    scaffold_site(root);

    let cfg = ConfigFileBuilder::default_layout()
        .with_project_dir(root)
        .build();
    let bindings = build_bindings(&cfg);
    let scripts = bindings
        .iter()
        .find(|b| b.classes().contains(&AssetClass::Scripts))
        .unwrap()
        .id();
    let profiles = build_binding_profiles(&cfg, &bindings)?;

    let (tx, mut rx) = mpsc::channel(64);
    let handle = spawn_watcher(
        root,
        profiles,
        Arc::new(RealFileSystem),
        tx,
        HashStorageMode::Memory,
    )?;
    // Nested base directories collapse into their ancestors.
    assert!(!handle.watched_dirs().iter().any(|d| d.ends_with("src/js/plugins")));

    tokio::time::sleep(Duration::from_millis(100)).await;
    write_file(root, "src/js/app.js", "console.log('edited');\n");

    let binding = with_timeout(async {
        loop {
            match rx.recv().await {
                Some(RuntimeEvent::BindingTriggered { binding, .. }) => return binding,
                Some(_) => continue,
                None => panic!("watcher channel closed"),
            }
        }
    })
    .await;
    assert_eq!(binding, scripts);
    Ok(())
}

#[tokio::test]
async fn missing_source_directory_cannot_be_watched() -> TestResult {
    let dir = tempdir()?;
    write_file(dir.path(), "src/html/index.html", "<p></p>");

    let cfg = ConfigFileBuilder::new()
        .with_asset(
            AssetClass::Markup,
            AssetConfigBuilder::new(&["src/html/*.html"], "build", "dist")
                .clean("*.html")
                .build(),
        )
        .with_asset(
            AssetClass::Images,
            AssetConfigBuilder::new(&["src/img/**/*.png"], "build/img", "dist/img")
                .transform(TransformKind::Image)
                .build(),
        )
        .with_project_dir(dir.path())
        .build();
    let profiles = build_binding_profiles(&cfg, &build_bindings(&cfg))?;
    let (tx, _rx) = mpsc::channel(8);

    let err = spawn_watcher(dir.path(), profiles, Arc::new(RealFileSystem), tx, HashStorageMode::Memory)
        .unwrap_err();

    match err {
        PipelineError::WatcherSubscription { path, .. } => {
            assert!(path.ends_with(PathBuf::from("src/img")), "{path:?}");
        }
        other => panic!("expected WatcherSubscription, got {other:?}"),
    }
    Ok(())
}
