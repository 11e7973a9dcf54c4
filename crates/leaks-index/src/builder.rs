//! Forward sweep that builds the reverse index.
//!
//! Breadth-first from the union of strong GC root ids. Every traversed
//! outgoing reference `parent -> child` is recorded as `child -> parent`;
//! field names and array indices are not stored (the edge resolver recovers
//! them later, only for the handful of surviving paths).

use std::collections::{HashSet, VecDeque};

use leaks_snapshot::{HeapGraph, HeapNode, ObjectId};
use tracing::debug;

use crate::filter::{
    is_leaf_array_class, is_leaf_child, is_leaf_instance_class,
    is_weak_reference,
};
use crate::reverse::ReverseIndex;

/// Sweeps the graph from its strong roots and records reverse edges.
///
/// Parent order within each entry is edge-observation order: fields in
/// declaration order, array elements in slot order, nodes in BFS order.
/// Children that do not exist in the snapshot are silently dropped.
pub fn build_reverse_index(graph: &dyn HeapGraph) -> ReverseIndex {
    let mut index = ReverseIndex::new();
    let mut visited: HashSet<ObjectId> = HashSet::new();
    let mut queue: VecDeque<ObjectId> = VecDeque::new();

    for root in graph.gc_roots() {
        if root.kind.is_strong()
            && graph.contains(root.object_id)
            && visited.insert(root.object_id)
        {
            queue.push_back(root.object_id);
        }
    }
    debug!(strong_roots = queue.len(), "sweep.start");

    while let Some(parent) = queue.pop_front() {
        let Some(node) = graph.resolve(parent) else {
            continue;
        };
        match node {
            HeapNode::Instance {
                class_name,
                ancestry,
                fields,
            } => {
                // Leaf instances and weak-reference machinery are never
                // parents: their outgoing references do not retain.
                if is_leaf_instance_class(class_name)
                    || is_weak_reference(ancestry)
                {
                    continue;
                }
                for field in fields {
                    // `<`-prefixed names are JVM-internal synthetics.
                    if field.name.starts_with('<') {
                        continue;
                    }
                    if let Some(child) = field.value {
                        record_edge(
                            graph, &mut index, &mut visited, &mut queue,
                            parent, child,
                        );
                    }
                }
            }
            HeapNode::ObjectArray {
                class_name,
                elements,
            } => {
                if is_leaf_array_class(class_name) {
                    continue;
                }
                for child in elements {
                    if child.0 != 0 {
                        record_edge(
                            graph, &mut index, &mut visited, &mut queue,
                            parent, child,
                        );
                    }
                }
            }
            HeapNode::ClassObject { statics, .. } => {
                for field in statics {
                    if field.name.starts_with('<') {
                        continue;
                    }
                    if let Some(child) = field.value {
                        record_edge(
                            graph, &mut index, &mut visited, &mut queue,
                            parent, child,
                        );
                    }
                }
            }
            HeapNode::PrimitiveArray => {}
        }
    }

    debug!(
        children = index.len(),
        edges = index.edge_count(),
        traversed = visited.len(),
        "sweep.done"
    );
    index
}

fn record_edge(
    graph: &dyn HeapGraph,
    index: &mut ReverseIndex,
    visited: &mut HashSet<ObjectId>,
    queue: &mut VecDeque<ObjectId>,
    parent: ObjectId,
    child: ObjectId,
) {
    if !graph.contains(child) || is_leaf_child(graph, child) {
        return;
    }
    index.push(child, parent);
    if visited.insert(child) {
        queue.push_back(child);
    }
}
