//! Edge resolution for surviving path records.
//!
//! The reverse index stores bare ids; only after the walker has settled on
//! a handful of records is each `parent -> child` pair reopened through the
//! graph oracle to recover a field name or array index. Unresolvable edges
//! render as `?` and are logged, never fatal.

use std::collections::HashMap;

use leaks_snapshot::{HeapGraph, HeapNode, ObjectId, RootKind};
use tracing::warn;

use crate::walker::PathRecord;

/// One presentation step along a finalized path, root first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Root { kind: RootKind, id: ObjectId },
    Field { class: String, field: String },
    ArrayElement { class: String, index: usize },
    Target { class: String, id: ObjectId },
}

/// The array class name without its final `[]`, for `Foo[3]` rendering.
fn array_base(class: &str) -> &str {
    class.strip_suffix("[]").unwrap_or(class)
}

impl PathStep {
    /// Concrete rendering with real ids and array indices.
    pub fn rendered(&self) -> String {
        match self {
            PathStep::Root { kind, id } => format!("Root[{kind}, {id}]"),
            PathStep::Field { class, field } => format!("{class}.{field}"),
            PathStep::ArrayElement { class, index } => {
                format!("{}[{index}]", array_base(class))
            }
            PathStep::Target { class, id } => format!("{class}@{id}"),
        }
    }

    /// Canonical rendering for grouping: ids are dropped and array indices
    /// erased to `[*]`, so paths differing only in slots collapse.
    pub fn canonical(&self) -> String {
        match self {
            PathStep::Root { kind, .. } => format!("Root[{kind}]"),
            PathStep::Field { class, field } => format!("{class}.{field}"),
            PathStep::ArrayElement { class, .. } => {
                format!("{}[*]", array_base(class))
            }
            PathStep::Target { class, .. } => class.clone(),
        }
    }
}

/// Resolves a record's id chain into presentation steps.
///
/// The chain is the root id, then `ids_from_target` reversed, then the
/// target id; consecutive equal ids are skipped, which suppresses the
/// duplicate root edge (`ids_from_target` already ends with the root).
/// Returns `None` when the record's root has no entry in the strong-root
/// kind map; such records are dropped silently.
pub fn resolve_steps(
    graph: &dyn HeapGraph,
    record: &PathRecord,
    root_kinds: &HashMap<ObjectId, RootKind>,
    target: ObjectId,
) -> Option<Vec<PathStep>> {
    let kind = *root_kinds.get(&record.root_id)?;

    let mut chain: Vec<ObjectId> =
        Vec::with_capacity(record.ids_from_target.len() + 2);
    chain.push(record.root_id);
    chain.extend(record.ids_from_target.iter().rev());
    chain.push(target);

    let mut steps = vec![PathStep::Root {
        kind,
        id: record.root_id,
    }];
    for pair in chain.windows(2) {
        let (parent, child) = (pair[0], pair[1]);
        if parent == child {
            continue;
        }
        steps.push(resolve_edge(graph, parent, child));
    }
    steps.push(PathStep::Target {
        class: graph
            .class_name_of(target)
            .unwrap_or("?")
            .to_string(),
        id: target,
    });
    Some(steps)
}

/// Finds the label for one `parent -> child` edge.
///
/// Collisions (several fields or slots holding the same child) resolve to
/// the first declared one.
fn resolve_edge(
    graph: &dyn HeapGraph,
    parent: ObjectId,
    child: ObjectId,
) -> PathStep {
    match graph.resolve(parent) {
        Some(HeapNode::Instance {
            class_name, fields, ..
        }) => {
            if let Some(field) =
                fields.iter().find(|f| f.value == Some(child))
            {
                return PathStep::Field {
                    class: class_name.to_string(),
                    field: field.name.to_string(),
                };
            }
            unresolved(class_name, parent, child)
        }
        Some(HeapNode::ObjectArray {
            class_name,
            elements,
        }) => {
            if let Some(index) = elements.iter().position(|&e| e == child) {
                return PathStep::ArrayElement {
                    class: class_name.to_string(),
                    index,
                };
            }
            unresolved(class_name, parent, child)
        }
        Some(HeapNode::ClassObject {
            class_name,
            statics,
        }) => {
            if let Some(field) =
                statics.iter().find(|f| f.value == Some(child))
            {
                return PathStep::Field {
                    class: class_name.to_string(),
                    field: field.name.to_string(),
                };
            }
            unresolved(class_name, parent, child)
        }
        Some(HeapNode::PrimitiveArray) | None => unresolved("?", parent, child),
    }
}

fn unresolved(class: &str, parent: ObjectId, child: ObjectId) -> PathStep {
    warn!(%parent, %child, class, "edge not resolvable");
    PathStep::Field {
        class: class.to_string(),
        field: "?".to_string(),
    }
}
