// src/graph/mod.rs

//! Task graphs: what runs, in which order, and how failures combine.
//!
//! - [`builder`] turns mode-independent plans into executable graphs.
//! - [`interpreter`] evaluates a graph against a `UnitExecutor`.
//! - [`bindings`] groups asset classes into watch bindings.

use std::fmt;
use std::path::PathBuf;

use crate::types::{AssetClass, Mode};

pub mod bindings;
pub mod builder;
pub mod interpreter;

pub use bindings::{build_bindings, BindingId, WatchBinding};
pub use builder::{
    binding_plan, build_graph, configured_classes, dev_startup_graph, dev_startup_plan,
    release_graph, release_plan, GraphPlan, UnitRef,
};
pub use interpreter::{run_graph, GraphFailure, UnitFailure};

/// A single side-effecting step. Callers only observe completion or failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskUnit {
    /// Remove entries under `dir` matching `pattern`.
    Clean { dir: PathBuf, pattern: String },
    /// Run the class's transform into its `mode` destination.
    Transform { class: AssetClass, mode: Mode },
    /// Drop unused selectors from every stylesheet under `dirs`, then minify.
    PurgeStyles { dirs: Vec<PathBuf> },
    /// Tell connected browsers to reload.
    Reload,
}

impl fmt::Display for TaskUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskUnit::Clean { dir, pattern } => {
                write!(f, "clean {}/{}", dir.display(), pattern)
            }
            TaskUnit::Transform { class, mode } => write!(f, "transform {class} ({mode})"),
            TaskUnit::PurgeStyles { dirs } => {
                let dirs: Vec<String> = dirs.iter().map(|d| d.display().to_string()).collect();
                write!(f, "purge-styles {}", dirs.join(", "))
            }
            TaskUnit::Reload => f.write_str("reload"),
        }
    }
}

/// Composition of task units.
///
/// - `Sequence`: each member completes before the next starts; the first
///   failure aborts the rest.
/// - `Concurrent`: all members run; the group completes when every member
///   has finished and fails if any member failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskGraph {
    Unit(TaskUnit),
    Sequence(Vec<TaskGraph>),
    Concurrent(Vec<TaskGraph>),
}

impl TaskGraph {
    /// All units in evaluation-listing order.
    pub fn units(&self) -> Vec<&TaskUnit> {
        let mut out = Vec::new();
        self.collect_units(&mut out);
        out
    }

    fn collect_units<'a>(&'a self, out: &mut Vec<&'a TaskUnit>) {
        match self {
            TaskGraph::Unit(unit) => out.push(unit),
            TaskGraph::Sequence(children) | TaskGraph::Concurrent(children) => {
                for child in children {
                    child.collect_units(out);
                }
            }
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        match self {
            TaskGraph::Unit(unit) => writeln!(f, "{pad}- {unit}"),
            TaskGraph::Sequence(children) => {
                writeln!(f, "{pad}sequence:")?;
                children.iter().try_for_each(|c| c.fmt_indented(f, depth + 1))
            }
            TaskGraph::Concurrent(children) => {
                writeln!(f, "{pad}concurrent:")?;
                children.iter().try_for_each(|c| c.fmt_indented(f, depth + 1))
            }
        }
    }
}

impl fmt::Display for TaskGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
