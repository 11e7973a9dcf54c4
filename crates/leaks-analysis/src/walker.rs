//! Multi-target greedy walker.
//!
//! For each leaked target, walks backward through the reverse index from
//! every direct parent toward a strong GC root, collapsing the combinatorial
//! set of retention paths into one record per distinct cause:
//!
//! 1. Each walk is greedy with bounded backtracking and a per-walk visited
//!    set seeded with the target, so cycles terminate.
//! 2. A walk that lands on a node already owned by an earlier record merges:
//!    near the root that is genuine diversity (new record); far from the
//!    root it is redundancy (skip), unless the new prefix is strictly
//!    shorter, in which case the owning record is displaced in place.
//! 3. "Near" and "far" are decided per record by its merge depth, lifted
//!    dynamically when an anchor class appears along the path.
//! 4. After a target is done, the target-side portion of each surviving
//!    record is claimed; later targets must route around claimed nodes or
//!    become dependent.

use std::collections::{HashMap, HashSet};

use leaks_index::ReverseIndex;
use leaks_snapshot::{HeapGraph, ObjectId, simple_name};
use tracing::{debug, trace};

use crate::anchors::ANCHORS;

/// Budget of frame pops per walk before the walk gives up.
pub const MAX_BACKTRACKS: usize = 10;

/// Upper bound on surviving records per target.
pub const MAX_PATHS_PER_TARGET: usize = 100;

/// Merge depth for paths with no anchor class.
pub const DEFAULT_MERGE_DEPTH: usize = 3;

/// One discovered retention path for a target.
///
/// Invariants: `ids_from_target[0]` is a direct parent of the target,
/// `ids_from_target[last] == root_id`, and consecutive ids are adjacent in
/// the reverse index. Records may be displaced in place while later direct
/// parents of the same target are processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRecord {
    pub ids_from_target: Vec<ObjectId>,
    pub root_id: ObjectId,
    pub merge_depth: usize,
}

/// Ownership entry: which record a node belongs to and how many steps from
/// the target it sits (1-based; the direct parent is step 1).
#[derive(Debug, Clone, Copy)]
struct Owner {
    record: usize,
    steps_from_target: usize,
}

enum WalkOutcome {
    /// Reached a strong root; the chain ends with the root id itself.
    FoundRoot { ids: Vec<ObjectId> },
    /// Landed on a node owned by an earlier record; the chain ends with the
    /// shared node.
    Merged { ids: Vec<ObjectId> },
    /// Exhausted parents and backtracks without reaching anything.
    DeadEnd,
}

struct Frame {
    node: ObjectId,
    /// Next parent index to try when this frame is resumed.
    cursor: usize,
}

/// Walks targets against one snapshot's reverse index.
///
/// The claimed-node set is owned by the run and threaded through
/// [`walk_target`](Self::walk_target) so that every mutation is visible to
/// all subsequent targets.
pub struct Walker<'a> {
    graph: &'a dyn HeapGraph,
    index: &'a ReverseIndex,
    roots: &'a HashSet<ObjectId>,
    targets: &'a HashSet<ObjectId>,
}

impl<'a> Walker<'a> {
    pub fn new(
        graph: &'a dyn HeapGraph,
        index: &'a ReverseIndex,
        roots: &'a HashSet<ObjectId>,
        targets: &'a HashSet<ObjectId>,
    ) -> Self {
        Self {
            graph,
            index,
            roots,
            targets,
        }
    }

    /// Discovers the diverse retention paths for one target.
    ///
    /// Direct parents are consumed in reverse-index order. Returns the
    /// surviving records (possibly empty, which makes the target dependent)
    /// and claims the far-from-root portion of each into `claimed`.
    pub fn walk_target(
        &self,
        target: ObjectId,
        claimed: &mut HashSet<ObjectId>,
    ) -> Vec<PathRecord> {
        let mut records: Vec<PathRecord> = Vec::new();
        let mut owner: HashMap<ObjectId, Owner> = HashMap::new();

        for &parent in self.index.parents(target) {
            if records.len() >= MAX_PATHS_PER_TARGET {
                debug!(%target, "path cap reached");
                break;
            }
            // Other targets and claimed nodes are excluded as starting
            // points outright; the current target is in the target set too,
            // which also rules out self-loop edges here.
            if self.targets.contains(&parent) || claimed.contains(&parent) {
                trace!(%target, %parent, "direct parent excluded");
                continue;
            }
            match self.walk_to_root(target, parent, &owner, claimed) {
                WalkOutcome::FoundRoot { ids } => {
                    let merge_depth = self.merge_depth_for(&ids);
                    let root_id = ids[ids.len() - 1];
                    let record = records.len();
                    for (i, &id) in ids.iter().enumerate() {
                        owner.insert(id, Owner {
                            record,
                            steps_from_target: i + 1,
                        });
                    }
                    trace!(%target, steps = ids.len(), merge_depth, "found root");
                    records.push(PathRecord {
                        ids_from_target: ids,
                        root_id,
                        merge_depth,
                    });
                }
                WalkOutcome::Merged { ids } => {
                    self.merge(target, ids, &mut records, &mut owner);
                }
                WalkOutcome::DeadEnd => {
                    trace!(%target, %parent, "dead end");
                }
            }
        }

        // Claim the target-side portion of every surviving record: the ids
        // whose step-from-root is at least the record's merge depth.
        for record in &records {
            let steps_excluding_root =
                record.ids_from_target.len().saturating_sub(1);
            let claim_count = (steps_excluding_root + 1)
                .saturating_sub(record.merge_depth);
            for &id in &record.ids_from_target[..claim_count] {
                claimed.insert(id);
            }
        }
        debug!(
            %target,
            records = records.len(),
            claimed_total = claimed.len(),
            "target done"
        );
        records
    }

    /// One greedy backward walk from a direct parent.
    fn walk_to_root(
        &self,
        target: ObjectId,
        start: ObjectId,
        owner: &HashMap<ObjectId, Owner>,
        claimed: &HashSet<ObjectId>,
    ) -> WalkOutcome {
        let mut visited: HashSet<ObjectId> = HashSet::new();
        visited.insert(target);
        visited.insert(start);
        let mut frames = vec![Frame {
            node: start,
            cursor: 0,
        }];
        let mut backtracks_left = MAX_BACKTRACKS;

        loop {
            let current = frames[frames.len() - 1].node;

            if self.roots.contains(&current) {
                return WalkOutcome::FoundRoot {
                    ids: frames.iter().map(|f| f.node).collect(),
                };
            }
            if owner.contains_key(&current) {
                return WalkOutcome::Merged {
                    ids: frames.iter().map(|f| f.node).collect(),
                };
            }

            let next = if claimed.contains(&current) {
                // Claimed mid-chain: treat exactly like an exhausted frame.
                None
            } else {
                let parents = self.index.parents(current);
                let top_idx = frames.len() - 1;
                let top = &mut frames[top_idx];
                let mut chosen = None;
                while top.cursor < parents.len() {
                    let candidate = parents[top.cursor];
                    top.cursor += 1;
                    if !visited.contains(&candidate)
                        && !self.targets.contains(&candidate)
                        && !claimed.contains(&candidate)
                    {
                        chosen = Some(candidate);
                        break;
                    }
                }
                chosen
            };

            match next {
                Some(node) => {
                    visited.insert(node);
                    frames.push(Frame { node, cursor: 0 });
                }
                None => {
                    // Dead end; pop one frame and resume its cursor, if the
                    // backtrack budget allows.
                    if frames.len() > 1 && backtracks_left > 0 {
                        backtracks_left -= 1;
                        frames.pop();
                    } else {
                        return WalkOutcome::DeadEnd;
                    }
                }
            }
        }
    }

    /// Merge depth for a freshly rooted chain.
    ///
    /// Scans from the target side for the first position whose class is in
    /// the anchor table; the depth is then that position's distance from
    /// the root plus the anchor's offset. The last id is the root itself,
    /// hence the `- 1`.
    fn merge_depth_for(&self, ids: &[ObjectId]) -> usize {
        for (idx, &id) in ids.iter().enumerate() {
            let Some(name) = self.graph.class_name_of(id) else {
                continue;
            };
            let simple = simple_name(name);
            if let Some(&(_, offset)) =
                ANCHORS.iter().find(|(anchor, _)| *anchor == simple)
            {
                let steps_from_root = ids.len() - 1 - idx;
                debug!(anchor = simple, steps_from_root, "anchor found");
                return steps_from_root + offset;
            }
        }
        DEFAULT_MERGE_DEPTH
    }

    /// Applies the merge decision table for a walk that landed on an owned
    /// node. `new_prefix` runs from the target up to and including the
    /// shared node.
    fn merge(
        &self,
        target: ObjectId,
        new_prefix: Vec<ObjectId>,
        records: &mut Vec<PathRecord>,
        owner: &mut HashMap<ObjectId, Owner>,
    ) {
        let shared = new_prefix[new_prefix.len() - 1];
        let Some(&entry) = owner.get(&shared) else {
            return;
        };
        let record_idx = entry.record;
        let shared_steps = entry.steps_from_target;
        let record_len = records[record_idx].ids_from_target.len();

        // Stale owner entries can point past a record displaced since the
        // entry was written; such merges are skipped.
        if shared_steps > record_len {
            debug!(%target, %shared, "stale owner entry, skipping merge");
            return;
        }

        let existing_steps_from_root = record_len - shared_steps;
        let merge_depth = records[record_idx].merge_depth;

        if existing_steps_from_root < merge_depth {
            // Near root: the prefixes diverge close to the cause, so this
            // is a genuinely different path. New record sharing the suffix;
            // suffix nodes stay owned by the existing record.
            if records.len() >= MAX_PATHS_PER_TARGET {
                return;
            }
            let root_id = records[record_idx].root_id;
            let suffix =
                records[record_idx].ids_from_target[shared_steps..].to_vec();
            let mut ids = new_prefix.clone();
            ids.extend_from_slice(&suffix);
            let new_idx = records.len();
            for (i, &id) in new_prefix.iter().enumerate() {
                owner.insert(id, Owner {
                    record: new_idx,
                    steps_from_target: i + 1,
                });
            }
            debug!(
                %target,
                %shared,
                existing_steps_from_root,
                "merged near root into new record"
            );
            records.push(PathRecord {
                ids_from_target: ids,
                root_id,
                merge_depth,
            });
        } else if new_prefix.len() < shared_steps {
            // Far from root but strictly shorter: displace the existing
            // record's prefix in place.
            let old_prefix =
                records[record_idx].ids_from_target[..shared_steps].to_vec();
            for id in &old_prefix {
                // Another record may have re-registered one of these nodes
                // since; only drop entries that still point at this record.
                if owner.get(id).is_some_and(|o| o.record == record_idx) {
                    owner.remove(id);
                }
            }
            let suffix =
                records[record_idx].ids_from_target[shared_steps..].to_vec();
            let mut ids = new_prefix;
            ids.extend_from_slice(&suffix);
            for (i, &id) in ids.iter().enumerate() {
                owner.insert(id, Owner {
                    record: record_idx,
                    steps_from_target: i + 1,
                });
            }
            debug!(
                %target,
                %shared,
                old_len = record_len,
                new_len = ids.len(),
                "displaced record prefix"
            );
            records[record_idx].ids_from_target = ids;
        } else {
            // Far from root and not shorter: same cause, nothing new.
            trace!(%target, %shared, "redundant merge skipped");
        }
    }
}

#[cfg(test)]
mod tests {
    use leaks_snapshot::{MemoryGraph, RootKind};

    use super::*;

    /// Builds the index and walks `targets` in order with a shared claimed
    /// set, returning the per-target records plus the final claimed set.
    fn analyze(
        graph: &MemoryGraph,
        targets: &[u64],
    ) -> (Vec<Vec<PathRecord>>, HashSet<ObjectId>) {
        let index = leaks_index::build_reverse_index(graph);
        let roots: HashSet<ObjectId> = graph
            .gc_roots()
            .iter()
            .filter(|r| r.kind.is_strong())
            .map(|r| r.object_id)
            .collect();
        let target_set: HashSet<ObjectId> =
            targets.iter().map(|&id| ObjectId(id)).collect();
        let walker = Walker::new(graph, &index, &roots, &target_set);
        let mut claimed = HashSet::new();
        let records = targets
            .iter()
            .map(|&t| walker.walk_target(ObjectId(t), &mut claimed))
            .collect();
        (records, claimed)
    }

    fn ids(record: &PathRecord) -> Vec<u64> {
        record.ids_from_target.iter().map(|id| id.0).collect()
    }

    #[test]
    fn simple_chain_yields_one_record() {
        // root A(1) -> B(2) -> T(3)
        let mut b = MemoryGraph::builder();
        b.instance(1, "com.app.A", &[("field", 2)]);
        b.instance(2, "com.app.B", &[("field", 3)]);
        b.instance(3, "com.app.Target", &[]);
        b.root(1, RootKind::JniGlobal);
        let g = b.build();

        let (records, _) = analyze(&g, &[3]);
        assert_eq!(records[0].len(), 1);
        let rec = &records[0][0];
        assert_eq!(ids(rec), vec![2, 1]);
        assert_eq!(rec.root_id, ObjectId(1));
        assert_eq!(rec.merge_depth, DEFAULT_MERGE_DEPTH);
    }

    #[test]
    fn merge_near_root_produces_two_records() {
        // Two direct parents reach the root through distinct intermediates
        // that share S one step from the root:
        //
        //   R(1) -> S(2) -> A1(3) -> P1(5) -> T(7)
        //              \--> A2(4) -> P2(6) -/
        let mut b = MemoryGraph::builder();
        b.instance(1, "com.app.Root", &[("s", 2)]);
        b.instance(2, "com.app.Shared", &[("a1", 3), ("a2", 4)]);
        b.instance(3, "com.app.A1", &[("p", 5)]);
        b.instance(4, "com.app.A2", &[("p", 6)]);
        b.instance(5, "com.app.P1", &[("t", 7)]);
        b.instance(6, "com.app.P2", &[("t", 7)]);
        b.instance(7, "com.app.Target", &[]);
        b.root(1, RootKind::JniGlobal);
        let g = b.build();

        let (records, _) = analyze(&g, &[7]);
        assert_eq!(records[0].len(), 2);
        assert_eq!(ids(&records[0][0]), vec![5, 3, 2, 1]);
        // Second walk merged at S (1 step from root < merge depth 3) and
        // adopted the first record's suffix and merge depth.
        assert_eq!(ids(&records[0][1]), vec![6, 4, 2, 1]);
        assert_eq!(records[0][1].root_id, ObjectId(1));
        assert_eq!(records[0][1].merge_depth, DEFAULT_MERGE_DEPTH);
    }

    #[test]
    fn merge_far_from_root_skips_redundant() {
        // Both direct parents meet at S, three steps from the root, with
        // equal prefix lengths: the second walk is redundant.
        //
        //   R(1) -> B3(2) -> B2(3) -> B1(4) -> S(5) -> P1(6) -> T(8)
        //                                         \--> P2(7) -/
        let mut b = MemoryGraph::builder();
        b.instance(1, "com.app.Root", &[("b", 2)]);
        b.instance(2, "com.app.B3", &[("b", 3)]);
        b.instance(3, "com.app.B2", &[("b", 4)]);
        b.instance(4, "com.app.B1", &[("s", 5)]);
        b.instance(5, "com.app.Shared", &[("p1", 6), ("p2", 7)]);
        b.instance(6, "com.app.P1", &[("t", 8)]);
        b.instance(7, "com.app.P2", &[("t", 8)]);
        b.instance(8, "com.app.Target", &[]);
        b.root(1, RootKind::JniGlobal);
        let g = b.build();

        let (records, _) = analyze(&g, &[8]);
        assert_eq!(records[0].len(), 1);
        assert_eq!(ids(&records[0][0]), vec![6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn displacement_replaces_the_longer_prefix_in_place() {
        // The first walk reaches the shared node M through a detour
        // (P1 -> D1 -> D2 -> M), the second goes straight (P2 -> M); M sits
        // three steps from the root, so the strictly shorter prefix
        // displaces the record in place.
        //
        //   R(1) -> N2(2) -> N1(3) -> M(4) -> D2(5) -> D1(7) -> P1(8) -> T(10)
        //                               \---> P2(6) --------------------/
        //   R(1) -> E(9) -> P1(8)   (E is a second target: it pulls P1's
        //                            edge ahead of P2's in sweep order but
        //                            is filtered out of the walk itself)
        let mut b = MemoryGraph::builder();
        b.instance(1, "com.app.Root", &[("n2", 2), ("e", 9)]);
        b.instance(2, "com.app.N2", &[("n1", 3)]);
        b.instance(3, "com.app.N1", &[("m", 4)]);
        b.instance(4, "com.app.Shared", &[("d2", 5), ("p2", 6)]);
        b.instance(5, "com.app.D2", &[("d1", 7)]);
        b.instance(6, "com.app.P2", &[("t", 10)]);
        b.instance(7, "com.app.D1", &[("p1", 8)]);
        b.instance(8, "com.app.P1", &[("t", 10)]);
        b.instance(9, "com.app.Decoy", &[("p1", 8)]);
        b.instance(10, "com.app.Target", &[]);
        b.root(1, RootKind::JniGlobal);
        let g = b.build();

        // Sweep order must register the detour parent first.
        let index = leaks_index::build_reverse_index(&g);
        assert_eq!(index.parents(ObjectId(10)), &[ObjectId(8), ObjectId(6)]);

        let (records, claimed) = analyze(&g, &[10, 9]);
        assert_eq!(records[0].len(), 1);
        // Displaced: the shorter prefix [6, 4] plus the shared suffix.
        assert_eq!(ids(&records[0][0]), vec![6, 4, 3, 2, 1]);
        assert_eq!(records[0][0].root_id, ObjectId(1));
        // Claiming follows the displaced record: 4 steps excluding the
        // root, depth 3, so P2 and M are claimed.
        assert!(claimed.contains(&ObjectId(6)));
        assert!(claimed.contains(&ObjectId(4)));
        assert!(!claimed.contains(&ObjectId(3)));
    }

    #[test]
    fn cycle_is_escaped_by_backtracking() {
        // The greedy walk climbs P -> M and takes M's first parent, Dead,
        // which sits on the cycle Dead -> M -> Dead and whose only other
        // inbound edge comes from a second target. One backtrack resumes at
        // M's cursor and reaches the root through the Live branch.
        //
        //   R(1) -> T2(2) -> Dead(7) -> M(8) -> P(9) -> T(10)
        //   R(1) -> C1(3) -> C2(4) -> C3(5) -> Live(6) -> M(8)
        //   M(8) -> Dead(7)   (closes the cycle)
        let mut b = MemoryGraph::builder();
        b.instance(1, "com.app.Root", &[("t2", 2), ("c1", 3)]);
        b.instance(2, "com.app.Decoy", &[("dead", 7)]);
        b.instance(3, "com.app.C1", &[("c2", 4)]);
        b.instance(4, "com.app.C2", &[("c3", 5)]);
        b.instance(5, "com.app.C3", &[("live", 6)]);
        b.instance(6, "com.app.Live", &[("m", 8)]);
        b.instance(7, "com.app.Dead", &[("m", 8)]);
        b.instance(8, "com.app.M", &[("p", 9), ("dead", 7)]);
        b.instance(9, "com.app.P", &[("t", 10)]);
        b.instance(10, "com.app.Target", &[]);
        b.root(1, RootKind::JniGlobal);
        let g = b.build();

        // The dead branch must come first in M's parent list.
        let index = leaks_index::build_reverse_index(&g);
        assert_eq!(
            index.parents(ObjectId(8)),
            &[ObjectId(7), ObjectId(6)],
            "test graph must force the cyclic branch first"
        );

        let (records, _) = analyze(&g, &[10, 2]);
        assert_eq!(records[0].len(), 1);
        assert_eq!(ids(&records[0][0]), vec![9, 8, 6, 5, 4, 3, 1]);
    }

    #[test]
    fn other_targets_are_filtered_out_of_walks() {
        // T1's only route to a root passes through T2: no records for T1.
        //
        //   R(1) -> T2(2) -> T1(3)
        let mut b = MemoryGraph::builder();
        b.instance(1, "com.app.Root", &[("t2", 2)]);
        b.instance(2, "com.app.Leak", &[("t1", 3)]);
        b.instance(3, "com.app.Leak", &[]);
        b.root(1, RootKind::JniGlobal);
        let g = b.build();

        let (records, _) = analyze(&g, &[3, 2]);
        assert!(records[0].is_empty(), "T1 must be dependent");
        assert_eq!(records[1].len(), 1, "T2 still gets its own path");
    }

    #[test]
    fn claimed_nodes_force_alternate_discovery() {
        // T1 claims the deep end of its chain. T2's first route goes
        // through the claimed N, but an independent route exists.
        //
        //   R(1) -> B3(2) -> B2(3) -> B1(4) -> N(5) -> T1(6)
        //                                         \--> Q(7) -> T2(9)
        //   R(1) -> A1(10) -> A2(11) -> A3(12) -> A4(13) -> Alt(8) -> Q(7)
        let mut b = MemoryGraph::builder();
        b.instance(1, "com.app.Root", &[("b", 2), ("a", 10)]);
        b.instance(2, "com.app.B3", &[("b", 3)]);
        b.instance(3, "com.app.B2", &[("b", 4)]);
        b.instance(4, "com.app.B1", &[("n", 5)]);
        b.instance(5, "com.app.N", &[("t1", 6), ("q", 7)]);
        b.instance(6, "com.app.LeakA", &[]);
        b.instance(7, "com.app.Q", &[("t2", 9)]);
        b.instance(8, "com.app.Alt", &[("q", 7)]);
        b.instance(9, "com.app.LeakB", &[]);
        b.instance(10, "com.app.A1", &[("a", 11)]);
        b.instance(11, "com.app.A2", &[("a", 12)]);
        b.instance(12, "com.app.A3", &[("a", 13)]);
        b.instance(13, "com.app.A4", &[("alt", 8)]);
        b.root(1, RootKind::JniGlobal);
        let g = b.build();

        // N is visited before Alt, so Q's first parent is the claimed one.
        let index = leaks_index::build_reverse_index(&g);
        assert_eq!(index.parents(ObjectId(7)), &[ObjectId(5), ObjectId(8)]);

        let (records, claimed) = analyze(&g, &[6, 9]);

        // T1's record is [5, 4, 3, 2, 1]: 4 steps excluding root, depth 3,
        // so the two target-side ids (N and B1) are claimed.
        assert_eq!(ids(&records[0][0]), vec![5, 4, 3, 2, 1]);
        assert!(claimed.contains(&ObjectId(5)));
        assert!(claimed.contains(&ObjectId(4)));
        assert!(!claimed.contains(&ObjectId(3)));

        // T2's walk skips claimed N at Q's cursor and discovers the
        // independent route instead.
        assert_eq!(records[1].len(), 1);
        assert_eq!(ids(&records[1][0]), vec![7, 8, 13, 12, 11, 10, 1]);
    }

    #[test]
    fn claimed_nodes_with_no_alternate_make_the_target_dependent() {
        //   R(1) -> B3(2) -> B2(3) -> B1(4) -> N(5) -> T1(6)
        //                                         \--> Q(7) -> T2(9)
        let mut b = MemoryGraph::builder();
        b.instance(1, "com.app.Root", &[("b", 2)]);
        b.instance(2, "com.app.B3", &[("b", 3)]);
        b.instance(3, "com.app.B2", &[("b", 4)]);
        b.instance(4, "com.app.B1", &[("n", 5)]);
        b.instance(5, "com.app.N", &[("t1", 6), ("q", 7)]);
        b.instance(6, "com.app.LeakA", &[]);
        b.instance(7, "com.app.Q", &[("t2", 9)]);
        b.instance(9, "com.app.LeakB", &[]);
        b.root(1, RootKind::JniGlobal);
        let g = b.build();

        let (records, _) = analyze(&g, &[6, 9]);
        assert_eq!(records[0].len(), 1);
        assert!(records[1].is_empty(), "T2 has no unclaimed route");
    }

    #[test]
    fn anchor_lifts_merge_depth_and_claiming() {
        // Disposer sits one step above the direct parent: merge depth
        // becomes (len-1-idx) + 4 and nothing gets claimed.
        //
        //   R(1) -> B(2) -> Disposer(3) -> P(4) -> T(5)
        let mut b = MemoryGraph::builder();
        b.instance(1, "com.app.Root", &[("b", 2)]);
        b.instance(2, "com.app.B", &[("d", 3)]);
        b.instance(3, "com.intellij.openapi.util.Disposer", &[("p", 4)]);
        b.instance(4, "com.app.P", &[("t", 5)]);
        b.instance(5, "com.app.Target", &[]);
        b.root(1, RootKind::JniGlobal);
        let g = b.build();

        let (records, claimed) = analyze(&g, &[5]);
        let rec = &records[0][0];
        assert_eq!(ids(rec), vec![4, 3, 2, 1]);
        // ids len 4, Disposer at index 1: (4 - 1 - 1) + 4 = 6.
        assert_eq!(rec.merge_depth, 6);
        // 3 steps excluding root, depth 6: nothing is far enough to claim.
        assert!(claimed.is_empty());
    }

    #[test]
    fn records_satisfy_the_chain_invariants() {
        // Displacement graph again, checking record invariants: no repeated
        // ids, no target id, first id is a direct parent, last is the root,
        // and consecutive ids are adjacent in the reverse index.
        let mut b = MemoryGraph::builder();
        b.instance(1, "com.app.Root", &[("n2", 2), ("e", 9)]);
        b.instance(2, "com.app.N2", &[("n1", 3)]);
        b.instance(3, "com.app.N1", &[("m", 4)]);
        b.instance(4, "com.app.Shared", &[("d2", 5), ("p2", 6)]);
        b.instance(5, "com.app.D2", &[("d1", 7)]);
        b.instance(6, "com.app.P2", &[("t", 10)]);
        b.instance(7, "com.app.D1", &[("p1", 8)]);
        b.instance(8, "com.app.P1", &[("t", 10)]);
        b.instance(9, "com.app.Decoy", &[("p1", 8)]);
        b.instance(10, "com.app.Target", &[]);
        b.root(1, RootKind::JniGlobal);
        let g = b.build();

        let index = leaks_index::build_reverse_index(&g);
        let targets = [10u64, 9];
        let (records, _) = analyze(&g, &targets);
        for (&target, target_records) in targets.iter().zip(&records) {
            for rec in target_records {
                let chain = &rec.ids_from_target;
                let unique: HashSet<&ObjectId> = chain.iter().collect();
                assert_eq!(unique.len(), chain.len());
                assert!(!chain.contains(&ObjectId(target)));
                assert_eq!(chain[chain.len() - 1], rec.root_id);
                assert!(
                    index.parents(ObjectId(target)).contains(&chain[0]),
                    "first id must be a direct parent"
                );
                for pair in chain.windows(2) {
                    assert!(
                        index.parents(pair[0]).contains(&pair[1]),
                        "consecutive ids must be adjacent in the index"
                    );
                }
            }
        }
    }

    #[test]
    fn record_count_respects_the_cap() {
        // A target referenced by more direct parents than the cap, each
        // with its own root: the walker stops at MAX_PATHS_PER_TARGET.
        let mut b = MemoryGraph::builder();
        b.instance(1, "com.app.Target", &[]);
        for i in 0..(MAX_PATHS_PER_TARGET as u64 + 20) {
            let parent = 100 + i;
            b.instance(parent, "com.app.Holder", &[("t", 1)]);
            b.root(parent, RootKind::JniGlobal);
        }
        let g = b.build();

        let (records, _) = analyze(&g, &[1]);
        assert_eq!(records[0].len(), MAX_PATHS_PER_TARGET);
    }
}
