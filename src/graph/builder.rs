// src/graph/builder.rs

//! Plans and the graph builder.
//!
//! A [`GraphPlan`] names units by reference (`Transform(Images)`) and
//! composes them; [`build_graph`] resolves each reference against the
//! configuration for a given mode. Mode only changes which destination a
//! unit addresses.

use std::path::PathBuf;

use crate::config::ConfigFile;
use crate::graph::{TaskGraph, TaskUnit};
use crate::types::{AssetClass, Mode};

/// Order in which a release build transforms classes, one at a time.
pub const RELEASE_ORDER: [AssetClass; 7] = [
    AssetClass::Markup,
    AssetClass::StylesPrecompiled,
    AssetClass::Scripts,
    AssetClass::ScriptsVendor,
    AssetClass::ServerScripts,
    AssetClass::Images,
    AssetClass::StylesSource,
];

const STYLE_CLASSES: [AssetClass; 2] = [AssetClass::StylesPrecompiled, AssetClass::StylesSource];

/// Reference to a unit, resolved by [`build_graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitRef {
    /// Everything directly under the mode's output root.
    CleanRoot,
    /// The class's destination, filtered by its `clean` pattern.
    CleanClass(AssetClass),
    Transform(AssetClass),
    PurgeStyles,
    Reload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphPlan {
    Unit(UnitRef),
    Sequence(Vec<GraphPlan>),
    Concurrent(Vec<GraphPlan>),
}

/// `clean root -> concurrent(transform every class)`.
pub fn dev_startup_plan(classes: &[AssetClass]) -> GraphPlan {
    GraphPlan::Sequence(vec![
        GraphPlan::Unit(UnitRef::CleanRoot),
        GraphPlan::Concurrent(
            classes
                .iter()
                .map(|c| GraphPlan::Unit(UnitRef::Transform(*c)))
                .collect(),
        ),
    ])
}

/// `clean(classes) -> concurrent(transform classes) -> reload`.
pub fn binding_plan(classes: &[AssetClass]) -> GraphPlan {
    GraphPlan::Sequence(vec![
        GraphPlan::Concurrent(
            classes
                .iter()
                .map(|c| GraphPlan::Unit(UnitRef::CleanClass(*c)))
                .collect(),
        ),
        GraphPlan::Concurrent(
            classes
                .iter()
                .map(|c| GraphPlan::Unit(UnitRef::Transform(*c)))
                .collect(),
        ),
        GraphPlan::Unit(UnitRef::Reload),
    ])
}

/// `clean root -> transform each class in RELEASE_ORDER -> purge styles`.
pub fn release_plan(classes: &[AssetClass]) -> GraphPlan {
    let mut steps = vec![GraphPlan::Unit(UnitRef::CleanRoot)];
    steps.extend(
        RELEASE_ORDER
            .iter()
            .filter(|c| classes.contains(c))
            .map(|c| GraphPlan::Unit(UnitRef::Transform(*c))),
    );
    if classes.iter().any(|c| STYLE_CLASSES.contains(c)) {
        steps.push(GraphPlan::Unit(UnitRef::PurgeStyles));
    }
    GraphPlan::Sequence(steps)
}

/// Classes configured in `cfg`, in declaration order.
pub fn configured_classes(cfg: &ConfigFile) -> Vec<AssetClass> {
    cfg.assets().keys().copied().collect()
}

/// The graph `dev` runs once before serving and watching.
pub fn dev_startup_graph(cfg: &ConfigFile) -> TaskGraph {
    build_graph(&dev_startup_plan(&configured_classes(cfg)), Mode::Dev, cfg)
}

/// The whole `release` build.
pub fn release_graph(cfg: &ConfigFile) -> TaskGraph {
    build_graph(&release_plan(&configured_classes(cfg)), Mode::Release, cfg)
}

/// Resolve a plan into an executable graph for `mode`.
///
/// References to classes missing from the config are dropped, duplicate
/// units inside a concurrent group are merged, and single-member groups
/// collapse into their member.
pub fn build_graph(plan: &GraphPlan, mode: Mode, cfg: &ConfigFile) -> TaskGraph {
    resolve(plan, mode, cfg).unwrap_or(TaskGraph::Sequence(Vec::new()))
}

fn resolve(plan: &GraphPlan, mode: Mode, cfg: &ConfigFile) -> Option<TaskGraph> {
    match plan {
        GraphPlan::Unit(unit) => resolve_unit(*unit, mode, cfg).map(TaskGraph::Unit),
        GraphPlan::Sequence(children) => {
            let nodes: Vec<TaskGraph> = children
                .iter()
                .filter_map(|c| resolve(c, mode, cfg))
                .collect();
            collapse(nodes, TaskGraph::Sequence)
        }
        GraphPlan::Concurrent(children) => {
            let mut nodes: Vec<TaskGraph> = Vec::new();
            for node in children.iter().filter_map(|c| resolve(c, mode, cfg)) {
                if !nodes.contains(&node) {
                    nodes.push(node);
                }
            }
            collapse(nodes, TaskGraph::Concurrent)
        }
    }
}

fn collapse(mut nodes: Vec<TaskGraph>, wrap: fn(Vec<TaskGraph>) -> TaskGraph) -> Option<TaskGraph> {
    match nodes.len() {
        0 => None,
        1 => nodes.pop(),
        _ => Some(wrap(nodes)),
    }
}

fn resolve_unit(unit: UnitRef, mode: Mode, cfg: &ConfigFile) -> Option<TaskUnit> {
    match unit {
        UnitRef::CleanRoot => Some(TaskUnit::Clean {
            dir: cfg.output_root(mode).to_path_buf(),
            pattern: "*".to_string(),
        }),
        UnitRef::CleanClass(class) => cfg.asset(class).map(|spec| TaskUnit::Clean {
            dir: spec.destination(mode).to_path_buf(),
            pattern: spec.clean.clone(),
        }),
        UnitRef::Transform(class) => cfg
            .asset(class)
            .map(|_| TaskUnit::Transform { class, mode }),
        UnitRef::PurgeStyles => {
            let mut dirs: Vec<PathBuf> = Vec::new();
            for class in STYLE_CLASSES {
                if let Some(spec) = cfg.asset(class) {
                    let dir = spec.destination(mode).to_path_buf();
                    if !dirs.contains(&dir) {
                        dirs.push(dir);
                    }
                }
            }
            (!dirs.is_empty()).then_some(TaskUnit::PurgeStyles { dirs })
        }
        UnitRef::Reload => Some(TaskUnit::Reload),
    }
}
