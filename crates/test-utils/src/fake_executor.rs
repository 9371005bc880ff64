use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assetpipe::engine::{BindingRunner, RunOutcome};
use assetpipe::errors::{PipelineError, Result};
use assetpipe::exec::UnitExecutor;
use assetpipe::graph::{BindingId, TaskUnit};

/// A fake unit executor that:
/// - records the order in which units started and finished
/// - sleeps for a configurable delay per unit
/// - fails the units it was told to fail.
#[derive(Default)]
pub struct RecordingExecutor {
    started: Arc<Mutex<Vec<TaskUnit>>>,
    finished: Arc<Mutex<Vec<TaskUnit>>>,
    failing: Vec<TaskUnit>,
    delays: HashMap<String, Duration>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, unit: TaskUnit) -> Self {
        self.failing.push(unit);
        self
    }

    /// Delay every unit whose display form equals `unit`'s.
    pub fn delayed(mut self, unit: &TaskUnit, delay: Duration) -> Self {
        self.delays.insert(unit.to_string(), delay);
        self
    }

    pub fn started(&self) -> Vec<TaskUnit> {
        self.started.lock().unwrap().clone()
    }

    pub fn finished(&self) -> Vec<TaskUnit> {
        self.finished.lock().unwrap().clone()
    }
}

impl UnitExecutor for RecordingExecutor {
    fn execute<'a>(
        &'a self,
        unit: &'a TaskUnit,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.started.lock().unwrap().push(unit.clone());

            if let Some(delay) = self.delays.get(&unit.to_string()) {
                tokio::time::sleep(*delay).await;
            }

            self.finished.lock().unwrap().push(unit.clone());

            if self.failing.contains(unit) {
                return Err(match unit {
                    TaskUnit::Transform { class, .. } => PipelineError::TransformFailure {
                        class: *class,
                        path: "injected".into(),
                        message: "injected failure".to_string(),
                    },
                    _ => PipelineError::Other(anyhow::anyhow!("injected failure")),
                });
            }
            Ok(())
        })
    }
}

/// A fake binding runner that counts runs and tracks how many runs of the
/// same binding overlap.
pub struct CountingRunner {
    delay: Duration,
    runs: Arc<Mutex<HashMap<BindingId, usize>>>,
    active: Arc<Mutex<HashMap<BindingId, usize>>>,
    max_overlap: Arc<Mutex<usize>>,
    peak_total: Arc<Mutex<(usize, usize)>>,
}

impl CountingRunner {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            runs: Arc::default(),
            active: Arc::default(),
            max_overlap: Arc::new(Mutex::new(0)),
            peak_total: Arc::new(Mutex::new((0, 0))),
        }
    }

    pub fn runs(&self, binding: BindingId) -> usize {
        self.runs.lock().unwrap().get(&binding).copied().unwrap_or(0)
    }

    /// Highest number of simultaneous runs of any single binding.
    pub fn max_overlap(&self) -> usize {
        *self.max_overlap.lock().unwrap()
    }

    /// Highest number of simultaneous runs across all bindings.
    pub fn peak_concurrency(&self) -> usize {
        self.peak_total.lock().unwrap().1
    }
}

impl BindingRunner for CountingRunner {
    fn run_binding(&self, binding: BindingId) -> Pin<Box<dyn Future<Output = RunOutcome> + Send>> {
        let delay = self.delay;
        let runs = Arc::clone(&self.runs);
        let active = Arc::clone(&self.active);
        let max_overlap = Arc::clone(&self.max_overlap);
        let peak_total = Arc::clone(&self.peak_total);

        Box::pin(async move {
            *runs.lock().unwrap().entry(binding).or_insert(0) += 1;
            {
                let mut active = active.lock().unwrap();
                let n = active.entry(binding).or_insert(0);
                *n += 1;
                let mut max = max_overlap.lock().unwrap();
                *max = (*max).max(*n);
            }
            {
                let mut total = peak_total.lock().unwrap();
                total.0 += 1;
                total.1 = total.1.max(total.0);
            }

            tokio::time::sleep(delay).await;

            *active.lock().unwrap().entry(binding).or_insert(1) -= 1;
            peak_total.lock().unwrap().0 -= 1;
            RunOutcome::Success
        })
    }
}
