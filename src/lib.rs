// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod graph;
pub mod logging;
pub mod server;
pub mod transform;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::{check_source_overlap, load_or_default, ConfigFile};
use crate::engine::{CoreRuntime, GraphRunner, Runtime, RuntimeEvent, RuntimeOptions};
use crate::exec::RealUnitExecutor;
use crate::fs::{FileSystem, RealFileSystem};
use crate::graph::{build_bindings, dev_startup_graph, release_graph, run_graph};
use crate::server::{DevServer, ReloadHub};
use crate::types::Mode;
use crate::watch::{build_binding_profiles, spawn_watcher};

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = Arc::new(load_or_default(&args.config)?);
    debug!(project = %cfg.project_dir().display(), "configuration loaded");

    match args.command {
        Command::Dev => run_dev(cfg).await,
        Command::Release => run_release(cfg).await,
        Command::Check => {
            print_check(&cfg);
            Ok(())
        }
    }
}

/// `dev`: clean + build everything, then serve and rebuild on change until
/// Ctrl-C.
///
/// This wires together:
/// - the startup graph (a failure here ends the command)
/// - the dev server and its reload hub
/// - bindings, watcher and the coalescing runtime
/// - Ctrl-C handling
pub async fn run_dev(cfg: Arc<ConfigFile>) -> Result<()> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    check_source_overlap(fs.as_ref(), &cfg)?;

    let hub = ReloadHub::new();
    let executor = Arc::new(
        RealUnitExecutor::new(Arc::clone(&cfg), Arc::clone(&fs)).with_reload_hub(hub.clone()),
    );

    info!("initial dev build");
    run_graph(&dev_startup_graph(&cfg), executor.as_ref())
        .await
        .context("initial dev build failed")?;

    let server_cfg = cfg.server();
    let server = DevServer::bind(
        &server_cfg.host,
        server_cfg.port,
        cfg.resolve(cfg.output_root(Mode::Dev)),
        hub,
    )
    .await?;
    let addr = server.local_addr()?;
    let server_task = tokio::spawn(server.serve());
    info!("serving {} at http://{addr}", cfg.output_root(Mode::Dev).display());

    let bindings = Arc::new(build_bindings(&cfg));
    let profiles = build_binding_profiles(&cfg, &bindings)?;

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let _watcher = spawn_watcher(
        cfg.project_dir(),
        profiles,
        Arc::clone(&fs),
        rt_tx.clone(),
        cfg.watch().hash_storage,
    )?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let runner = Arc::new(GraphRunner::new(Arc::clone(&bindings), executor));
    let core = CoreRuntime::new(bindings.len(), RuntimeOptions::default());
    Runtime::new(core, rt_rx, rt_tx, runner).run().await?;

    server_task.abort();
    Ok(())
}

/// `release`: one sequential, optimised build into the release root.
pub async fn run_release(cfg: Arc<ConfigFile>) -> Result<()> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    check_source_overlap(fs.as_ref(), &cfg)?;

    let executor = RealUnitExecutor::new(Arc::clone(&cfg), fs);
    let graph = release_graph(&cfg);

    info!(root = %cfg.output_root(Mode::Release).display(), "release build");
    if let Err(failure) = run_graph(&graph, &executor).await {
        let stage = failure
            .first_stage()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        bail!("release build failed at stage `{stage}`: {failure}");
    }

    info!("release build finished");
    Ok(())
}

/// `check`: print bindings and graphs without running anything.
fn print_check(cfg: &ConfigFile) {
    println!("assetpipe check");
    println!("  project: {}", cfg.project_dir().display());
    println!("  dev_root: {}", cfg.paths().dev_root.display());
    println!("  release_root: {}", cfg.paths().release_root.display());
    println!();

    println!("assets ({}):", cfg.assets().len());
    for (class, spec) in cfg.assets() {
        println!("  - {class} [{}]", spec.transform.name());
        println!("      source: {:?}", spec.source);
        if !spec.watch.is_empty() {
            println!("      watch: {:?}", spec.watch);
        }
        if !spec.exclude.is_empty() {
            println!("      exclude: {:?}", spec.exclude);
        }
        println!("      dev_dest: {}", spec.dev_dest.display());
        println!("      release_dest: {}", spec.release_dest.display());
        println!("      clean: {}", spec.clean);
    }
    println!();

    let bindings = build_bindings(cfg);
    println!("bindings ({}):", bindings.len());
    for binding in &bindings {
        println!("  - {}", binding.name());
        for line in binding.graph().to_string().lines() {
            println!("      {line}");
        }
    }
    println!();

    println!("dev startup:");
    print!("{}", indent(&dev_startup_graph(cfg).to_string()));
    println!("release:");
    print!("{}", indent(&release_graph(cfg).to_string()));

    debug!("check complete (no execution)");
}

fn indent(text: &str) -> String {
    text.lines().map(|l| format!("  {l}\n")).collect()
}
