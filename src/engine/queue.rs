// src/engine/queue.rs

use tracing::debug;

use crate::graph::BindingId;

/// Coalescing state of one binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingState {
    #[default]
    Idle,
    Running,
    /// Running, and at least one trigger arrived since the run started.
    RunningWithRerun,
}

/// Per-binding trigger bookkeeping.
///
/// Semantics:
/// - a trigger on an idle binding starts a run right away;
/// - any number of triggers during a run collapse into one pending re-run;
/// - when a run completes with a re-run pending, exactly one new run starts.
///
/// Bindings are independent of each other.
#[derive(Debug)]
pub struct TriggerQueue {
    states: Vec<BindingState>,
}

impl TriggerQueue {
    pub fn new(binding_count: usize) -> Self {
        Self {
            states: vec![BindingState::Idle; binding_count],
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state_of(&self, binding: BindingId) -> Option<BindingState> {
        self.states.get(binding).copied()
    }

    /// Record a trigger. Returns `true` when a run should start now.
    pub fn record_trigger(&mut self, binding: BindingId) -> bool {
        let Some(state) = self.states.get_mut(binding) else {
            return false;
        };
        match *state {
            BindingState::Idle => {
                *state = BindingState::Running;
                true
            }
            BindingState::Running => {
                debug!(binding, "trigger while running; re-run pending");
                *state = BindingState::RunningWithRerun;
                false
            }
            BindingState::RunningWithRerun => {
                debug!(binding, "trigger coalesced into pending re-run");
                false
            }
        }
    }

    /// Record a finished run. Returns `true` when the pending re-run should
    /// start now.
    pub fn record_completion(&mut self, binding: BindingId) -> bool {
        let Some(state) = self.states.get_mut(binding) else {
            return false;
        };
        match *state {
            BindingState::RunningWithRerun => {
                *state = BindingState::Running;
                true
            }
            BindingState::Running | BindingState::Idle => {
                *state = BindingState::Idle;
                false
            }
        }
    }

    /// Forget every pending re-run; in-flight runs stay `Running`.
    pub fn drop_pending(&mut self) {
        for state in &mut self.states {
            if *state == BindingState::RunningWithRerun {
                *state = BindingState::Running;
            }
        }
    }

    pub fn all_idle(&self) -> bool {
        self.states.iter().all(|s| *s == BindingState::Idle)
    }

    pub fn running_count(&self) -> usize {
        self.states
            .iter()
            .filter(|s| **s != BindingState::Idle)
            .count()
    }
}
