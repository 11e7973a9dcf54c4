//! Path discovery for leaked heap objects.
//!
//! Given a heap graph, a reverse reference index and a set of leaked
//! targets, this crate finds a small set of diverse reference chains from
//! strong GC roots to each target and renders them as a report:
//!
//! 1. The [`Walker`] discovers id chains per target, with merging,
//!    displacement and cross-target claiming collapsing path explosions
//!    into one record per distinct retention cause.
//! 2. The edge resolver reopens each surviving chain to recover field
//!    names and array indices.
//! 3. The grouper collapses paths by canonical signature and the reporter
//!    writes the final text.
//!
//! The crate never touches a file: the graph comes in as a
//! [`HeapGraph`](leaks_snapshot::HeapGraph) and the report goes out through
//! any writer.

mod anchors;
mod edges;
mod error;
mod group;
mod report;
mod walker;

use std::collections::{HashMap, HashSet};
use std::io::Write;

use indexmap::IndexMap;
use leaks_index::ReverseIndex;
use leaks_snapshot::{HeapGraph, ObjectId, RootKind, simple_name};
use tracing::info;

#[doc(inline)]
pub use anchors::ANCHORS;
#[doc(inline)]
pub use edges::{PathStep, resolve_steps};
#[doc(inline)]
pub use error::AnalysisError;
#[doc(inline)]
pub use group::{DependentGroup, PathGroup, group_paths, signature};
#[doc(inline)]
pub use walker::{
    DEFAULT_MERGE_DEPTH, MAX_BACKTRACKS, MAX_PATHS_PER_TARGET, PathRecord,
    Walker,
};

/// Selects targets from the instance scan.
///
/// An instance is a target when its class matches any entry in `classes`,
/// by fully qualified or simple name. Scan order is preserved; it is the
/// walk order, and claiming makes it observable in the output.
pub fn select_targets(
    graph: &dyn HeapGraph,
    classes: &[String],
) -> Vec<ObjectId> {
    if classes.is_empty() {
        return Vec::new();
    }
    graph
        .instance_ids()
        .filter(|&id| {
            graph.class_name_of(id).is_some_and(|name| {
                classes
                    .iter()
                    .any(|c| c == name || c == simple_name(name))
            })
        })
        .collect()
}

/// Runs path discovery for `targets` and writes the report to `out`.
///
/// Targets are processed in the given order; records whose root cannot be
/// mapped to a strong root kind are dropped silently; targets with no
/// records are reported as dependent.
///
/// # Errors
///
/// Returns [`AnalysisError`] only when writing the report fails.
pub fn run(
    graph: &dyn HeapGraph,
    index: &ReverseIndex,
    targets: &[ObjectId],
    out: &mut dyn Write,
) -> Result<(), AnalysisError> {
    let mut strong_roots: HashSet<ObjectId> = HashSet::new();
    let mut root_kinds: HashMap<ObjectId, RootKind> = HashMap::new();
    for root in graph.gc_roots() {
        if root.kind.is_strong() {
            strong_roots.insert(root.object_id);
            // An id can be a root under several kinds; the first one wins
            // for presentation.
            root_kinds.entry(root.object_id).or_insert(root.kind);
        }
    }

    let target_set: HashSet<ObjectId> = targets.iter().copied().collect();
    let walker = Walker::new(graph, index, &strong_roots, &target_set);
    let mut claimed: HashSet<ObjectId> = HashSet::new();

    let mut resolved: Vec<(ObjectId, Vec<PathStep>)> = Vec::new();
    let mut dependents: IndexMap<String, Vec<ObjectId>> = IndexMap::new();
    for &target in targets {
        let records = walker.walk_target(target, &mut claimed);
        if records.is_empty() {
            let class = graph
                .class_name_of(target)
                .unwrap_or("?")
                .to_string();
            dependents.entry(class).or_default().push(target);
            continue;
        }
        for record in &records {
            if let Some(steps) =
                resolve_steps(graph, record, &root_kinds, target)
            {
                resolved.push((target, steps));
            }
        }
    }

    let groups = group_paths(resolved);
    let dependents: Vec<DependentGroup> = dependents
        .into_iter()
        .map(|(class, targets)| DependentGroup { class, targets })
        .collect();
    info!(
        targets = targets.len(),
        groups = groups.len(),
        dependent_classes = dependents.len(),
        "analysis.complete"
    );

    report::render_report(out, graph.info(), &groups, &dependents)?;
    Ok(())
}
