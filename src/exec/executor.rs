// src/exec/executor.rs

//! Production unit executor.
//!
//! Every unit does blocking filesystem work (and CPU-heavy transforms), so
//! the body of each unit runs on `tokio::task::spawn_blocking`.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::backend::UnitExecutor;
use super::clean::clean;
use super::inputs::collect_inputs;
use crate::config::ConfigFile;
use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;
use crate::graph::TaskUnit;
use crate::server::ReloadHub;
use crate::transform::purge::{purge_stylesheet, ContentTokens, Safelist};
use crate::transform::{build_transform, TransformContext};
use crate::types::{AssetClass, Mode};
use crate::watch::patterns::{build_globset, walk_files};

/// Executes units against the real configuration and a [`FileSystem`].
#[derive(Debug, Clone)]
pub struct RealUnitExecutor {
    cfg: Arc<ConfigFile>,
    fs: Arc<dyn FileSystem>,
    reload: Option<ReloadHub>,
}

impl RealUnitExecutor {
    pub fn new(cfg: Arc<ConfigFile>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            cfg,
            fs,
            reload: None,
        }
    }

    /// Send `Reload` units to the given hub.
    pub fn with_reload_hub(mut self, hub: ReloadHub) -> Self {
        self.reload = Some(hub);
        self
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<ConfigFile>, Arc<dyn FileSystem>) -> Result<T> + Send + 'static,
    {
        let cfg = Arc::clone(&self.cfg);
        let fs = Arc::clone(&self.fs);
        tokio::task::spawn_blocking(move || f(cfg, fs))
            .await
            .map_err(|e| PipelineError::Other(anyhow::anyhow!("unit worker panicked: {e}")))?
    }

    async fn run_unit(&self, unit: &TaskUnit) -> Result<()> {
        match unit {
            TaskUnit::Clean { dir, pattern } => {
                let dir = dir.clone();
                let pattern = pattern.clone();
                self.blocking(move |cfg, fs| {
                    let abs = cfg.resolve(&dir);
                    clean(fs.as_ref(), &abs, &pattern)
                        .map(|_| ())
                        .map_err(|e| PipelineError::filesystem(&dir, &e))
                })
                .await
            }
            TaskUnit::Transform { class, mode } => {
                let (class, mode) = (*class, *mode);
                self.blocking(move |cfg, fs| run_transform(&cfg, fs.as_ref(), class, mode))
                    .await
            }
            TaskUnit::PurgeStyles { dirs } => {
                let dirs = dirs.clone();
                self.blocking(move |cfg, fs| purge_styles(&cfg, fs.as_ref(), &dirs))
                    .await
            }
            TaskUnit::Reload => {
                if let Some(hub) = &self.reload {
                    hub.notify_reloadable();
                }
                Ok(())
            }
        }
    }
}

impl UnitExecutor for RealUnitExecutor {
    fn execute<'a>(
        &'a self,
        unit: &'a TaskUnit,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.run_unit(unit))
    }
}

fn display_path(cfg: &ConfigFile, path: &Path) -> PathBuf {
    path.strip_prefix(cfg.project_dir())
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Collect inputs, transform, then write outputs. Nothing is written unless
/// the transform succeeded for every input.
fn run_transform(cfg: &ConfigFile, fs: &dyn FileSystem, class: AssetClass, mode: Mode) -> Result<()> {
    let spec = cfg
        .asset(class)
        .ok_or_else(|| PipelineError::Config(format!("no [asset.{class}] configured")))?;

    let inputs = collect_inputs(fs, cfg, spec)
        .map_err(|e| PipelineError::filesystem(cfg.resolve(""), &e))?;
    if inputs.is_empty() {
        warn!(class = %class, mode = %mode, "source missing: no files match; nothing written");
        return Ok(());
    }

    let transform = build_transform(&spec.transform);
    let ctx = TransformContext { class, mode, fs };
    let outputs = transform
        .apply(&ctx, &inputs)
        .map_err(|e| PipelineError::TransformFailure {
            class,
            path: display_path(cfg, &e.path),
            message: e.message,
        })?;

    let dest = cfg.resolve(spec.destination(mode));
    for output in &outputs {
        let target = dest.join(&output.rel);
        fs.write(&target, &output.contents)
            .map_err(|e| PipelineError::filesystem(display_path(cfg, &target), &e))?;
    }

    info!(
        class = %class,
        mode = %mode,
        transform = transform.name(),
        inputs = inputs.len(),
        outputs = outputs.len(),
        "transform finished"
    );
    Ok(())
}

/// Style class whose destination is `dir`, for error reporting.
fn style_class_for(cfg: &ConfigFile, dir: &Path) -> AssetClass {
    [AssetClass::StylesSource, AssetClass::StylesPrecompiled]
        .into_iter()
        .find(|c| {
            cfg.asset(*c)
                .is_some_and(|spec| spec.release_dest == dir || spec.dev_dest == dir)
        })
        .unwrap_or(AssetClass::StylesSource)
}

fn purge_styles(cfg: &ConfigFile, fs: &dyn FileSystem, dirs: &[PathBuf]) -> Result<()> {
    let release = cfg.release();
    let safelist = Safelist::new(&release.purge_safelist)
        .map_err(|e| PipelineError::Config(format!("invalid purge_safelist: {e}")))?;
    let content_globs = build_globset(&release.purge_content)?;

    let root_rel = cfg.output_root(Mode::Release);
    let root = cfg.resolve(root_rel);
    let mut content = ContentTokens::new();
    if fs.is_dir(&root) {
        let files = walk_files(fs, &root).map_err(|e| PipelineError::filesystem(root_rel, &e))?;
        for path in files {
            let Ok(rel) = path.strip_prefix(&root) else {
                continue;
            };
            if !content_globs.is_match(rel.to_string_lossy().replace('\\', "/")) {
                continue;
            }
            let bytes = fs
                .read(&path)
                .map_err(|e| PipelineError::filesystem(display_path(cfg, &path), &e))?;
            content.scan(&String::from_utf8_lossy(&bytes));
        }
    }
    debug!(tokens = content.len(), "collected purge content tokens");

    for dir in dirs {
        let abs = cfg.resolve(dir);
        if !fs.is_dir(&abs) {
            continue;
        }
        let sheets = walk_files(fs, &abs).map_err(|e| PipelineError::filesystem(dir, &e))?;
        for sheet in sheets.into_iter().filter(|p| p.extension().is_some_and(|e| e == "css")) {
            let shown = display_path(cfg, &sheet);
            let css = fs
                .read_to_string(&sheet)
                .map_err(|e| PipelineError::filesystem(&shown, &e))?;
            let purged = purge_stylesheet(&sheet, &css, &content, &safelist).map_err(|message| {
                PipelineError::TransformFailure {
                    class: style_class_for(cfg, dir),
                    path: shown.clone(),
                    message,
                }
            })?;
            fs.write(&sheet, purged.as_bytes())
                .map_err(|e| PipelineError::filesystem(&shown, &e))?;
            info!(path = %shown.display(), before = css.len(), after = purged.len(), "stylesheet purged");
        }
    }
    Ok(())
}
