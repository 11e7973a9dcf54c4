//! Heap snapshot access for leak analysis.
//!
//! This crate defines the read-only object-graph surface the analysis
//! pipeline consumes, plus two implementations of it:
//!
//! - [`HprofSnapshot`]: a compact reader for the JVM hprof binary format
//!   that materializes the heap into id-keyed tables.
//! - [`MemoryGraph`]: a hand-assembled graph with a builder API, used by
//!   tests and by embedders that already hold a parsed heap.
//!
//! The analysis crates never see a file; they see a [`HeapGraph`] and a
//! [`SnapshotInfo`]. Keeping the oracle behind a trait means the walker and
//! index builder can be exercised against tiny synthetic graphs without a
//! snapshot on disk.

mod error;
mod graph;
mod hprof;
mod mem;
mod names;

#[doc(inline)]
pub use error::SnapshotError;
#[doc(inline)]
pub use graph::{
    FieldRef, GcRoot, HeapGraph, HeapNode, ObjectId, RootKind, SnapshotInfo,
};
#[doc(inline)]
pub use hprof::HprofSnapshot;
#[doc(inline)]
pub use mem::{GraphBuilder, MemoryGraph};
#[doc(inline)]
pub use names::{normalize_class_name, simple_name};
