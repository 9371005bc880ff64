// src/graph/interpreter.rs

//! Evaluates a [`TaskGraph`] against a [`UnitExecutor`].
//!
//! Failure rules:
//! - a failing member of a concurrent group does not cancel its siblings;
//!   the group reports failure once every member has finished;
//! - a failure inside a sequence skips every step after it.
//!
//! All failures of one evaluation come back as a single [`GraphFailure`].

use std::fmt;

use futures::future::{join_all, BoxFuture, FutureExt};
use tracing::{debug, warn};

use crate::errors::PipelineError;
use crate::exec::UnitExecutor;
use crate::graph::{TaskGraph, TaskUnit};

/// One unit that failed, with the reason.
#[derive(Debug)]
pub struct UnitFailure {
    pub unit: TaskUnit,
    pub error: PipelineError,
}

/// Aggregated failure of one graph evaluation.
#[derive(Debug)]
pub struct GraphFailure {
    failures: Vec<UnitFailure>,
}

impl GraphFailure {
    pub fn failures(&self) -> &[UnitFailure] {
        &self.failures
    }

    /// The unit that failed first in listing order.
    pub fn first_stage(&self) -> Option<&TaskUnit> {
        self.failures.first().map(|f| &f.unit)
    }
}

impl fmt::Display for GraphFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} unit(s) failed", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; [{}] {}", failure.unit, failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for GraphFailure {}

/// Run `graph` to completion (or to the first failing sequence step).
pub async fn run_graph<E>(graph: &TaskGraph, executor: &E) -> Result<(), GraphFailure>
where
    E: UnitExecutor + ?Sized,
{
    let failures = run_node(graph, executor).await;
    if failures.is_empty() {
        Ok(())
    } else {
        Err(GraphFailure { failures })
    }
}

fn run_node<'a, E>(graph: &'a TaskGraph, executor: &'a E) -> BoxFuture<'a, Vec<UnitFailure>>
where
    E: UnitExecutor + ?Sized,
{
    async move {
        match graph {
            TaskGraph::Unit(unit) => {
                debug!(unit = %unit, "running unit");
                match executor.execute(unit).await {
                    Ok(()) => Vec::new(),
                    Err(error) => {
                        warn!(unit = %unit, error = %error, "unit failed");
                        vec![UnitFailure {
                            unit: unit.clone(),
                            error,
                        }]
                    }
                }
            }
            TaskGraph::Sequence(steps) => {
                for (i, step) in steps.iter().enumerate() {
                    let failures = run_node(step, executor).await;
                    if !failures.is_empty() {
                        let skipped = steps.len() - i - 1;
                        if skipped > 0 {
                            debug!(skipped, "sequence aborted; skipping remaining steps");
                        }
                        return failures;
                    }
                }
                Vec::new()
            }
            TaskGraph::Concurrent(members) => {
                join_all(members.iter().map(|m| run_node(m, executor)))
                    .await
                    .into_iter()
                    .flatten()
                    .collect()
            }
        }
    }
    .boxed()
}
