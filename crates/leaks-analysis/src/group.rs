//! Path canonicalization and grouping.
//!
//! Finalized paths collapse into groups by canonical signature (array
//! indices erased, ids dropped). Signature insertion order is preserved,
//! the first path observed for a signature becomes the group's exemplar,
//! and groups sort by target count descending with stable ties.

use indexmap::IndexMap;
use itertools::Itertools;
use leaks_snapshot::ObjectId;

use crate::edges::PathStep;

/// Targets sharing one canonical retention signature.
#[derive(Debug, Clone)]
pub struct PathGroup {
    pub signature: String,
    /// The first path observed with this signature, kept verbatim.
    pub exemplar: Vec<PathStep>,
    pub targets: Vec<ObjectId>,
}

/// Targets for which no independent path was discovered, per class.
#[derive(Debug, Clone)]
pub struct DependentGroup {
    pub class: String,
    pub targets: Vec<ObjectId>,
}

/// The canonical signature of a step sequence.
pub fn signature(steps: &[PathStep]) -> String {
    steps.iter().map(PathStep::canonical).join(" -> ")
}

/// Groups finalized paths by signature.
pub fn group_paths(paths: Vec<(ObjectId, Vec<PathStep>)>) -> Vec<PathGroup> {
    let mut groups: IndexMap<String, PathGroup> = IndexMap::new();
    for (target, steps) in paths {
        let sig = signature(&steps);
        match groups.get_mut(&sig) {
            Some(group) => {
                // A target can contribute several records with the same
                // signature; count it once.
                if !group.targets.contains(&target) {
                    group.targets.push(target);
                }
            }
            None => {
                groups.insert(sig.clone(), PathGroup {
                    signature: sig,
                    exemplar: steps,
                    targets: vec![target],
                });
            }
        }
    }
    let mut groups: Vec<PathGroup> = groups.into_values().collect();
    // Stable sort keeps first-seen order within equal counts.
    groups.sort_by_key(|g| std::cmp::Reverse(g.targets.len()));
    groups
}
