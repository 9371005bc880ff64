// src/graph/bindings.rs

//! Watch bindings: which classes rebuild together.
//!
//! Classes that write into the same dev destination directory must never be
//! rebuilt concurrently, so they are grouped into one binding with a single
//! rebuild graph. Grouping uses a union-find over the classes.

use std::collections::BTreeMap;

use petgraph::unionfind::UnionFind;

use crate::config::{AssetSpec, ConfigFile};
use crate::graph::builder::{binding_plan, build_graph};
use crate::graph::TaskGraph;
use crate::types::{AssetClass, Mode};

/// Index of a binding in the list returned by [`build_bindings`].
pub type BindingId = usize;

/// Relation from a group of asset classes to the graph re-run on change.
///
/// Created once at startup, never mutated.
#[derive(Debug, Clone)]
pub struct WatchBinding {
    id: BindingId,
    name: String,
    classes: Vec<AssetClass>,
    graph: TaskGraph,
}

impl WatchBinding {
    pub fn id(&self) -> BindingId {
        self.id
    }

    /// Human-readable name, e.g. `styles-precompiled+styles-source`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn classes(&self) -> &[AssetClass] {
        &self.classes
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }
}

/// Group classes sharing a dev destination. Groups and their members come
/// out in class declaration order.
pub fn group_classes(assets: &BTreeMap<AssetClass, AssetSpec>) -> Vec<Vec<AssetClass>> {
    let classes: Vec<AssetClass> = assets.keys().copied().collect();
    let mut sets = UnionFind::<usize>::new(classes.len());

    for (i, a) in classes.iter().enumerate() {
        for (j, b) in classes.iter().enumerate().skip(i + 1) {
            if assets[a].dev_dest == assets[b].dev_dest {
                sets.union(i, j);
            }
        }
    }

    let mut groups: Vec<(usize, Vec<AssetClass>)> = Vec::new();
    for (i, class) in classes.iter().enumerate() {
        let root = sets.find(i);
        match groups.iter_mut().find(|(r, _)| *r == root) {
            Some((_, members)) => members.push(*class),
            None => groups.push((root, vec![*class])),
        }
    }

    groups.into_iter().map(|(_, members)| members).collect()
}

/// Build every binding together with its rebuild graph.
pub fn build_bindings(cfg: &ConfigFile) -> Vec<WatchBinding> {
    group_classes(cfg.assets())
        .into_iter()
        .enumerate()
        .map(|(id, classes)| {
            let name = classes
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join("+");
            let graph = build_graph(&binding_plan(&classes), Mode::Dev, cfg);
            WatchBinding {
                id,
                name,
                classes,
                graph,
            }
        })
        .collect()
}
