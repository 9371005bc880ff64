// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling each binding's `source ∪ watch` patterns.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Optionally hashing watched content so unchanged saves do not rebuild.
//!
//! It does **not** know about task graphs; it only turns filesystem
//! changes into binding-level triggers.

pub mod cache;
pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use hash::{FileHashStore, HashStore, MemoryHashStore, HASH_FILE_PATH};
pub use patterns::{build_binding_profiles, BindingWatchProfile};
pub use watcher::{spawn_watcher, WatcherHandle};
