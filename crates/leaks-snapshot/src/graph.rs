//! The object-graph oracle: ids, roots, snapshot metadata, and the
//! [`HeapGraph`] trait the analysis pipeline consumes.

use std::fmt;
use std::path::PathBuf;

/// Identity of a heap object, stable within one snapshot.
///
/// Ids are opaque 64-bit values taken verbatim from the snapshot. They are
/// rendered in hex because that is how every JVM tool prints them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// The kind of a GC root entry.
///
/// Covers both the standard hprof root tags and the Android extensions.
/// Only a subset keeps objects strongly reachable; see [`RootKind::is_strong`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootKind {
    JniGlobal,
    JniLocal,
    JavaFrame,
    NativeStack,
    ThreadBlock,
    MonitorUsed,
    ThreadObject,
    JniMonitor,
    ReferenceCleanup,
    VmInternal,
    StickyClass,
    Finalizing,
    Debugger,
    Unreachable,
    InternedString,
    Unknown,
}

impl RootKind {
    /// Whether this root kind keeps its referent strongly reachable.
    ///
    /// Sticky classes, finalizer queues, debugger handles, unreachable
    /// entries, interned strings and unknown roots do not count: paths that
    /// end only in those do not explain why an object is alive.
    pub fn is_strong(self) -> bool {
        match self {
            RootKind::JniGlobal
            | RootKind::JniLocal
            | RootKind::JavaFrame
            | RootKind::NativeStack
            | RootKind::ThreadBlock
            | RootKind::MonitorUsed
            | RootKind::ThreadObject
            | RootKind::JniMonitor
            | RootKind::ReferenceCleanup
            | RootKind::VmInternal => true,
            RootKind::StickyClass
            | RootKind::Finalizing
            | RootKind::Debugger
            | RootKind::Unreachable
            | RootKind::InternedString
            | RootKind::Unknown => false,
        }
    }
}

impl fmt::Display for RootKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug names double as the report vocabulary (`Root[JniGlobal]`).
        write!(f, "{self:?}")
    }
}

/// One GC root entry: the root kind plus the object it pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcRoot {
    pub kind: RootKind,
    pub object_id: ObjectId,
}

/// Snapshot-level metadata surfaced in the report header.
#[derive(Debug, Clone, Default)]
pub struct SnapshotInfo {
    /// Path the snapshot was opened from (empty for in-memory graphs).
    pub path: PathBuf,
    /// Snapshot file size in bytes.
    pub file_size: u64,
    /// Dump timestamp in milliseconds since the epoch.
    pub timestamp_ms: u64,
    /// Format version string, e.g. `JAVA PROFILE 1.0.2`.
    pub format_version: String,
    /// Identifier width in bytes (4 or 8).
    pub id_size: u32,
    pub class_count: u64,
    pub instance_count: u64,
    pub object_array_count: u64,
    pub primitive_array_count: u64,
    pub root_count: u64,
}

impl SnapshotInfo {
    /// Total object count across all node kinds.
    pub fn object_count(&self) -> u64 {
        self.class_count
            + self.instance_count
            + self.object_array_count
            + self.primitive_array_count
    }
}

/// A declared reference-typed field slot: name plus referent (None = null).
///
/// Primitive fields never matter to path discovery, so the oracle only
/// surfaces reference-typed slots. Declaration order is preserved because
/// edge resolution picks the first field whose value matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRef<'a> {
    pub name: &'a str,
    pub value: Option<ObjectId>,
}

/// A resolved heap node.
///
/// The walker itself never branches on node kind; this variant surface is
/// consumed only by the reverse-index builder and the edge resolver.
#[derive(Debug, Clone)]
pub enum HeapNode<'a> {
    /// An ordinary object instance.
    Instance {
        class_name: &'a str,
        /// Class names from the object's own class up to the hierarchy root.
        ancestry: Vec<&'a str>,
        /// Reference-typed declared fields, own class first, then supers.
        fields: Vec<FieldRef<'a>>,
    },
    /// An array of object references. Elements keep their slots; a zero id
    /// means null, so element positions stay meaningful for edge labels.
    ObjectArray {
        class_name: &'a str,
        elements: Vec<ObjectId>,
    },
    /// The per-class metadata object; its static fields hold references.
    ClassObject {
        class_name: &'a str,
        statics: Vec<FieldRef<'a>>,
    },
    /// An array of primitives; carries no outgoing references.
    PrimitiveArray,
}

/// Read-only access to a heap snapshot.
///
/// The contract the analysis pipeline relies on:
/// - [`instance_ids`](Self::instance_ids) iteration order is stable across
///   calls for the same snapshot (it is the target scan order);
/// - [`resolve`](Self::resolve) surfaces fields and elements in declaration
///   /slot order;
/// - all methods are cheap enough to call repeatedly (the oracle answers
///   from memory once the snapshot is open).
pub trait HeapGraph {
    /// Snapshot-level metadata for the report header.
    fn info(&self) -> &SnapshotInfo;

    /// All instance ids in scan order.
    fn instance_ids(&self) -> Box<dyn Iterator<Item = ObjectId> + '_>;

    /// Every GC root entry in the snapshot, strong or not.
    fn gc_roots(&self) -> &[GcRoot];

    /// Whether an object with this id exists in the snapshot.
    fn contains(&self, id: ObjectId) -> bool;

    /// Resolve an id to its node, or None if the id is dangling.
    fn resolve(&self, id: ObjectId) -> Option<HeapNode<'_>>;

    /// The class name of the object behind `id`, if it exists.
    ///
    /// For class objects this is the described class, not `java.lang.Class`.
    fn class_name_of(&self, id: ObjectId) -> Option<&str>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_displays_as_hex() {
        assert_eq!(ObjectId(0x4fa).to_string(), "0x4fa");
        assert_eq!(ObjectId(10).to_string(), "0xa");
    }

    #[test]
    fn strong_root_partition_is_complete() {
        let strong = [
            RootKind::JniGlobal,
            RootKind::JniLocal,
            RootKind::JavaFrame,
            RootKind::NativeStack,
            RootKind::ThreadBlock,
            RootKind::MonitorUsed,
            RootKind::ThreadObject,
            RootKind::JniMonitor,
            RootKind::ReferenceCleanup,
            RootKind::VmInternal,
        ];
        let weak = [
            RootKind::StickyClass,
            RootKind::Finalizing,
            RootKind::Debugger,
            RootKind::Unreachable,
            RootKind::InternedString,
            RootKind::Unknown,
        ];
        assert!(strong.iter().all(|k| k.is_strong()));
        assert!(weak.iter().all(|k| !k.is_strong()));
    }

    #[test]
    fn object_count_sums_all_kinds() {
        let info = SnapshotInfo {
            class_count: 1,
            instance_count: 2,
            object_array_count: 3,
            primitive_array_count: 4,
            ..SnapshotInfo::default()
        };
        assert_eq!(info.object_count(), 10);
    }
}
