//! In-memory heap graph.
//!
//! A hand-assembled [`HeapGraph`] used by unit and integration tests across
//! the workspace, and by embedders that already hold a decoded heap. The
//! builder keeps ids explicit so tests can spell out exact graph shapes.

use std::collections::HashMap;
use std::iter;

use crate::graph::{
    FieldRef, GcRoot, HeapGraph, HeapNode, ObjectId, RootKind, SnapshotInfo,
};

#[derive(Debug)]
enum MemNode {
    Instance {
        class: String,
        supers: Vec<String>,
        /// Reference fields in declaration order; 0 means null.
        fields: Vec<(String, u64)>,
    },
    ObjectArray {
        class: String,
        elements: Vec<u64>,
    },
    ClassObject {
        class: String,
        statics: Vec<(String, u64)>,
    },
    PrimitiveArray,
}

/// A [`HeapGraph`] answering from plain maps. Build with [`GraphBuilder`].
#[derive(Debug)]
pub struct MemoryGraph {
    nodes: HashMap<u64, MemNode>,
    /// Instance ids in insertion order; this is the target scan order.
    instance_order: Vec<u64>,
    roots: Vec<GcRoot>,
    info: SnapshotInfo,
}

impl MemoryGraph {
    /// Starts building a graph.
    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }
}

fn field_refs(fields: &[(String, u64)]) -> Vec<FieldRef<'_>> {
    fields
        .iter()
        .map(|(name, value)| FieldRef {
            name,
            value: (*value != 0).then_some(ObjectId(*value)),
        })
        .collect()
}

impl HeapGraph for MemoryGraph {
    fn info(&self) -> &SnapshotInfo {
        &self.info
    }

    fn instance_ids(&self) -> Box<dyn Iterator<Item = ObjectId> + '_> {
        Box::new(self.instance_order.iter().map(|&id| ObjectId(id)))
    }

    fn gc_roots(&self) -> &[GcRoot] {
        &self.roots
    }

    fn contains(&self, id: ObjectId) -> bool {
        self.nodes.contains_key(&id.0)
    }

    fn resolve(&self, id: ObjectId) -> Option<HeapNode<'_>> {
        Some(match self.nodes.get(&id.0)? {
            MemNode::Instance {
                class,
                supers,
                fields,
            } => HeapNode::Instance {
                class_name: class,
                ancestry: iter::once(class.as_str())
                    .chain(supers.iter().map(String::as_str))
                    .collect(),
                fields: field_refs(fields),
            },
            MemNode::ObjectArray { class, elements } => HeapNode::ObjectArray {
                class_name: class,
                elements: elements.iter().map(|&e| ObjectId(e)).collect(),
            },
            MemNode::ClassObject { class, statics } => HeapNode::ClassObject {
                class_name: class,
                statics: field_refs(statics),
            },
            MemNode::PrimitiveArray => HeapNode::PrimitiveArray,
        })
    }

    fn class_name_of(&self, id: ObjectId) -> Option<&str> {
        Some(match self.nodes.get(&id.0)? {
            MemNode::Instance { class, .. }
            | MemNode::ObjectArray { class, .. }
            | MemNode::ClassObject { class, .. } => class,
            MemNode::PrimitiveArray => "?[]",
        })
    }
}

/// Builder for [`MemoryGraph`]. Field values of 0 mean null.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: HashMap<u64, MemNode>,
    instance_order: Vec<u64>,
    roots: Vec<GcRoot>,
}

impl GraphBuilder {
    /// Adds an instance with reference fields in declaration order.
    pub fn instance(
        &mut self,
        id: u64,
        class: &str,
        fields: &[(&str, u64)],
    ) -> &mut Self {
        self.instance_with_supers(id, class, &[], fields)
    }

    /// Adds an instance with an explicit superclass chain (nearest first).
    pub fn instance_with_supers(
        &mut self,
        id: u64,
        class: &str,
        supers: &[&str],
        fields: &[(&str, u64)],
    ) -> &mut Self {
        self.instance_order.push(id);
        self.nodes.insert(
            id,
            MemNode::Instance {
                class: class.to_string(),
                supers: supers.iter().map(|s| s.to_string()).collect(),
                fields: fields
                    .iter()
                    .map(|(n, v)| (n.to_string(), *v))
                    .collect(),
            },
        );
        self
    }

    /// Adds an object array; 0 elements are null slots.
    pub fn object_array(
        &mut self,
        id: u64,
        class: &str,
        elements: &[u64],
    ) -> &mut Self {
        self.nodes.insert(
            id,
            MemNode::ObjectArray {
                class: class.to_string(),
                elements: elements.to_vec(),
            },
        );
        self
    }

    /// Adds a class object with static reference fields.
    pub fn class_object(
        &mut self,
        id: u64,
        class: &str,
        statics: &[(&str, u64)],
    ) -> &mut Self {
        self.nodes.insert(
            id,
            MemNode::ClassObject {
                class: class.to_string(),
                statics: statics
                    .iter()
                    .map(|(n, v)| (n.to_string(), *v))
                    .collect(),
            },
        );
        self
    }

    /// Adds a primitive array (a leaf; no outgoing references).
    pub fn primitive_array(&mut self, id: u64) -> &mut Self {
        self.nodes.insert(id, MemNode::PrimitiveArray);
        self
    }

    /// Registers a GC root entry for `id`.
    pub fn root(&mut self, id: u64, kind: RootKind) -> &mut Self {
        self.roots.push(GcRoot {
            kind,
            object_id: ObjectId(id),
        });
        self
    }

    /// Finalizes the graph, deriving the snapshot counts from the contents.
    pub fn build(&mut self) -> MemoryGraph {
        let nodes = std::mem::take(&mut self.nodes);
        let roots = std::mem::take(&mut self.roots);
        let instance_order = std::mem::take(&mut self.instance_order);
        let count = |pred: fn(&MemNode) -> bool| {
            nodes.values().filter(|n| pred(*n)).count() as u64
        };
        let info = SnapshotInfo {
            format_version: "MEMORY".to_string(),
            id_size: 8,
            class_count: count(|n| matches!(n, MemNode::ClassObject { .. })),
            instance_count: count(|n| matches!(n, MemNode::Instance { .. })),
            object_array_count: count(|n| {
                matches!(n, MemNode::ObjectArray { .. })
            }),
            primitive_array_count: count(|n| {
                matches!(n, MemNode::PrimitiveArray)
            }),
            root_count: roots.len() as u64,
            ..SnapshotInfo::default()
        };
        MemoryGraph {
            nodes,
            instance_order,
            roots,
            info,
        }
    }
}
