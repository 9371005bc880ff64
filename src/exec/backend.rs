// src/exec/backend.rs

//! Pluggable unit executor abstraction.
//!
//! The graph interpreter talks to a `UnitExecutor` instead of touching the
//! filesystem directly. Production code uses
//! [`RealUnitExecutor`](super::RealUnitExecutor); tests provide their own
//! implementation that records which units ran and fails or delays on
//! demand.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::errors::Result;
use crate::graph::TaskUnit;

/// Trait abstracting how a single task unit is carried out.
pub trait UnitExecutor: Send + Sync {
    /// Run one unit to completion.
    ///
    /// Errors are reported, never panicked; the interpreter decides whether
    /// the surrounding graph continues.
    fn execute<'a>(
        &'a self,
        unit: &'a TaskUnit,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

impl<T: UnitExecutor + ?Sized> UnitExecutor for Arc<T> {
    fn execute<'a>(
        &'a self,
        unit: &'a TaskUnit,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        (**self).execute(unit)
    }
}
