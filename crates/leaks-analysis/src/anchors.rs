//! Merge-depth anchor table.
//!
//! Certain infrastructure classes sit a known distance from the real
//! retention cause. When one appears along a path, the path's merge depth is
//! lifted so that merges near it still count as distinct causes. The table
//! is ordered; at a given path position the first matching entry wins.
//!
//! Entries are `(simple class name, offset)`: the resulting merge depth is
//! the anchor's distance from the root plus the offset. New infrastructure
//! classes can be added here without touching the walker.

/// Known anchors. `Disposer` holds its tree four levels above the objects
/// it retains.
pub const ANCHORS: &[(&str, usize)] = &[("Disposer", 4)];
