// src/engine/mod.rs

//! Orchestration engine for assetpipe's watch mode.
//!
//! This module ties together:
//! - the per-binding coalescing state (at most one run in flight, at most one
//!   pending re-run per binding)
//! - the main runtime event loop that reacts to:
//!   - binding triggers from the watcher
//!   - run completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::graph::BindingId;

/// Outcome of one binding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    /// Details were already logged by the runner.
    Failed,
}

/// Why a binding was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Manual trigger (tests, tooling).
    Manual,
    /// Triggered due to a filesystem event.
    FileWatch,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// If true, exit the runtime once every binding is idle with nothing
    /// pending.
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from the watcher, runners and signals.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A binding's watched files changed.
    BindingTriggered {
        binding: BindingId,
        reason: TriggerReason,
    },
    /// A binding's rebuild graph finished.
    RunCompleted {
        binding: BindingId,
        outcome: RunOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::{BindingState, TriggerQueue};
pub use runtime::{BindingRunner, GraphRunner, Runtime};
