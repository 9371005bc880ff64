// src/engine/runtime.rs

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::exec::UnitExecutor;
use crate::graph::{run_graph, BindingId, WatchBinding};

use super::core::CoreRuntime;
use super::{CoreCommand, RunOutcome, RuntimeEvent};

/// Runs one binding's rebuild graph.
///
/// Production code uses [`GraphRunner`]; tests can substitute a runner that
/// only records and sleeps.
pub trait BindingRunner: Send + Sync + 'static {
    fn run_binding(&self, binding: BindingId) -> Pin<Box<dyn Future<Output = RunOutcome> + Send>>;
}

/// Evaluates a binding's graph with a [`UnitExecutor`] and logs failures.
pub struct GraphRunner<E: UnitExecutor + 'static> {
    bindings: Arc<Vec<WatchBinding>>,
    executor: Arc<E>,
}

impl<E: UnitExecutor + 'static> GraphRunner<E> {
    pub fn new(bindings: Arc<Vec<WatchBinding>>, executor: Arc<E>) -> Self {
        Self { bindings, executor }
    }
}

impl<E: UnitExecutor + 'static> BindingRunner for GraphRunner<E> {
    fn run_binding(&self, binding: BindingId) -> Pin<Box<dyn Future<Output = RunOutcome> + Send>> {
        let bindings = Arc::clone(&self.bindings);
        let executor = Arc::clone(&self.executor);

        Box::pin(async move {
            let Some(binding) = bindings.get(binding) else {
                warn!(binding, "run requested for unknown binding");
                return RunOutcome::Failed;
            };

            info!(binding = binding.name(), "rebuilding");
            match run_graph(binding.graph(), executor.as_ref()).await {
                Ok(()) => {
                    info!(binding = binding.name(), "rebuild finished");
                    RunOutcome::Success
                }
                Err(failure) => {
                    for f in failure.failures() {
                        error!(
                            binding = binding.name(),
                            unit = %f.unit,
                            error = %f.error,
                            "rebuild failed"
                        );
                    }
                    RunOutcome::Failed
                }
            }
        })
    }
}

/// Drives the coalescing core in response to `RuntimeEvent`s and spawns
/// binding runs through a [`BindingRunner`].
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics.
pub struct Runtime<R: BindingRunner> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    event_tx: mpsc::Sender<RuntimeEvent>,
    runner: Arc<R>,
    in_flight: JoinSet<()>,
}

impl<R: BindingRunner> fmt::Debug for Runtime<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl<R: BindingRunner> Runtime<R> {
    /// `event_tx` must feed `event_rx`; runs report completion through it.
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        event_tx: mpsc::Sender<RuntimeEvent>,
        runner: Arc<R>,
    ) -> Self {
        Self {
            core,
            event_rx,
            event_tx,
            runner,
            in_flight: JoinSet::new(),
        }
    }

    /// Main event loop.
    ///
    /// - Consumes `RuntimeEvent`s from `event_rx`.
    /// - Feeds them into the core runtime.
    /// - Executes commands returned by the core (start runs, exit).
    ///
    /// On shutdown no further events are accepted; runs already in flight
    /// are awaited, not aborted.
    pub async fn run(mut self) -> Result<()> {
        info!("assetpipe watch runtime started");

        loop {
            let event = tokio::select! {
                event = self.event_rx.recv() => event,
                // Reap finished run tasks so the set does not grow.
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "binding run task panicked");
                    }
                    continue;
                }
            };

            let Some(event) = event else {
                info!("runtime event channel closed; exiting");
                break;
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            for command in step.commands {
                self.execute_command(command);
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        // Completion reports have nowhere to go any more.
        drop(self.event_rx);
        if !self.in_flight.is_empty() {
            info!(runs = self.in_flight.len(), "waiting for in-flight runs");
        }
        while let Some(joined) = self.in_flight.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "binding run task panicked");
            }
        }

        info!("runtime exiting");
        Ok(())
    }

    fn execute_command(&mut self, command: CoreCommand) {
        match command {
            CoreCommand::StartRun(binding) => {
                let runner = Arc::clone(&self.runner);
                let tx = self.event_tx.clone();
                self.in_flight.spawn(async move {
                    // A panicking run still completes, as a failure, so the
                    // binding does not stay Running forever.
                    let run = AssertUnwindSafe(async { runner.run_binding(binding).await });
                    let outcome = match run.catch_unwind().await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            error!(binding, "binding run panicked");
                            RunOutcome::Failed
                        }
                    };
                    let _ = tx.send(RuntimeEvent::RunCompleted { binding, outcome }).await;
                });
            }
            CoreCommand::RequestExit => {
                debug!("core issued RequestExit command");
            }
        }
    }
}
