//! Reverse reference index for heap path discovery.
//!
//! Built once per snapshot by a forward sweep from the strong GC roots,
//! this index maps every interesting object to the ordered list of objects
//! that reference it. Parent order within an entry is the order edges were
//! observed during the sweep; the walker consumes that order positionally,
//! so it is part of this crate's contract, not an accident.
//!
//! The index is expensive to build on large snapshots, so it is cached next
//! to the snapshot file in a compressed binary envelope keyed by a content
//! fingerprint; see [`cache`].

mod builder;
pub mod cache;
mod error;
mod filter;
mod reverse;

#[doc(inline)]
pub use builder::build_reverse_index;
#[doc(inline)]
pub use cache::load_or_build;
#[doc(inline)]
pub use error::IndexError;
#[doc(inline)]
pub use filter::{is_leaf_array_class, is_leaf_child, is_leaf_instance_class, is_weak_reference};
#[doc(inline)]
pub use reverse::ReverseIndex;
