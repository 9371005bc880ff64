// src/config/mod.rs

//! Configuration loading and validation for assetpipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate the path registry invariants (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default, DEFAULT_CONFIG_FILE};
pub use model::{
    default_assets, AssetConfig, AssetSpec, ConfigFile, PathsSection, RawConfigFile,
    ReleaseSection, ServerSection, TransformKind, TransformSpec, WatchSection,
};
pub use validate::check_source_overlap;
