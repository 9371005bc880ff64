// src/exec/mod.rs

//! Unit execution layer.
//!
//! - [`backend`] provides the `UnitExecutor` trait the graph interpreter
//!   runs against; tests replace it with a fake.
//! - [`executor`] holds `RealUnitExecutor`, used in production.
//! - [`clean`] implements the `Clean` unit.
//! - [`inputs`] resolves source patterns into ordered transform inputs.

pub mod backend;
pub mod clean;
pub mod executor;
pub mod inputs;

pub use backend::UnitExecutor;
pub use clean::clean;
pub use executor::RealUnitExecutor;
pub use inputs::collect_inputs;
