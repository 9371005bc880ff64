// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for reading
//! events from channels, spawning binding runs and handling shutdown.
//!
//! The core is unit tested without any Tokio, channels, filesystem, or
//! processes.

use crate::engine::event_handlers::{handle_binding_trigger, handle_run_completion, CoreStep};
use crate::engine::queue::{BindingState, TriggerQueue};
use crate::engine::{RuntimeEvent, RuntimeOptions};
use crate::graph::BindingId;

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    queue: TriggerQueue,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(binding_count: usize, options: RuntimeOptions) -> Self {
        Self {
            queue: TriggerQueue::new(binding_count),
            options,
        }
    }

    /// True when no binding is running or pending.
    pub fn is_idle(&self) -> bool {
        self.queue.all_idle()
    }

    pub fn state_of(&self, binding: BindingId) -> Option<BindingState> {
        self.queue.state_of(binding)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::BindingTriggered { binding, reason } => {
                handle_binding_trigger(&mut self.queue, binding, reason)
            }
            RuntimeEvent::RunCompleted { binding, outcome } => {
                handle_run_completion(&mut self.queue, &self.options, binding, outcome)
            }
            RuntimeEvent::ShutdownRequested => {
                self.queue.drop_pending();
                CoreStep::stop()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CoreCommand, RunOutcome, TriggerReason};

    fn trigger(binding: BindingId) -> RuntimeEvent {
        RuntimeEvent::BindingTriggered {
            binding,
            reason: TriggerReason::FileWatch,
        }
    }

    fn completed(binding: BindingId) -> RuntimeEvent {
        RuntimeEvent::RunCompleted {
            binding,
            outcome: RunOutcome::Success,
        }
    }

    #[test]
    fn rerun_starts_after_completion() {
        let mut core = CoreRuntime::new(1, RuntimeOptions::default());

        assert_eq!(core.step(trigger(0)).commands, vec![CoreCommand::StartRun(0)]);
        assert!(core.step(trigger(0)).commands.is_empty());
        assert!(core.step(trigger(0)).commands.is_empty());
        assert_eq!(core.step(completed(0)).commands, vec![CoreCommand::StartRun(0)]);
        assert!(core.step(completed(0)).commands.is_empty());
        assert!(core.is_idle());
    }

    #[test]
    fn failed_runs_still_honour_pending_reruns() {
        let mut core = CoreRuntime::new(1, RuntimeOptions::default());
        core.step(trigger(0));
        core.step(trigger(0));
        let step = core.step(RuntimeEvent::RunCompleted {
            binding: 0,
            outcome: RunOutcome::Failed,
        });
        assert_eq!(step.commands, vec![CoreCommand::StartRun(0)]);
    }

    #[test]
    fn exits_when_idle_if_asked() {
        let mut core = CoreRuntime::new(2, RuntimeOptions { exit_when_idle: true });
        core.step(trigger(0));
        core.step(trigger(1));

        let step = core.step(completed(0));
        assert!(step.keep_running);

        let step = core.step(completed(1));
        assert!(!step.keep_running);
        assert_eq!(step.commands, vec![CoreCommand::RequestExit]);
    }

    #[test]
    fn shutdown_drops_pending_reruns() {
        let mut core = CoreRuntime::new(1, RuntimeOptions::default());
        core.step(trigger(0));
        core.step(trigger(0));

        let step = core.step(RuntimeEvent::ShutdownRequested);
        assert!(!step.keep_running);
        assert_eq!(core.state_of(0), Some(BindingState::Running));
    }
}
