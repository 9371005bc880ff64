// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, warn};

use crate::engine::queue::TriggerQueue;
use crate::engine::{RunOutcome, RuntimeOptions, TriggerReason};
use crate::graph::BindingId;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Run this binding's rebuild graph.
    StartRun(BindingId),
    /// Request that the process exits (used with `exit_when_idle`).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub(crate) fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    pub(crate) fn stop() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: false,
        }
    }
}

/// Handle a binding trigger.
///
/// - Idle binding: start a run.
/// - Running binding: mark one re-run pending (repeated triggers coalesce).
pub fn handle_binding_trigger(
    queue: &mut TriggerQueue,
    binding: BindingId,
    reason: TriggerReason,
) -> CoreStep {
    if binding >= queue.len() {
        warn!(binding, "trigger for unknown binding ignored");
        return CoreStep::continue_with(Vec::new());
    }

    let mut commands = Vec::new();
    if queue.record_trigger(binding) {
        debug!(binding, ?reason, "starting binding run");
        commands.push(CoreCommand::StartRun(binding));
    }
    CoreStep::continue_with(commands)
}

/// Handle a completed binding run.
pub fn handle_run_completion(
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    binding: BindingId,
    outcome: RunOutcome,
) -> CoreStep {
    let mut commands = Vec::new();

    debug!(binding, ?outcome, "binding run completed");
    if queue.record_completion(binding) {
        commands.push(CoreCommand::StartRun(binding));
    }

    let mut keep_running = true;
    if options.exit_when_idle && queue.all_idle() {
        keep_running = false;
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}
