/*
 * Computes positional edit scripts between two ordered lists whose elements
 * carry a stable identity key. The display surface applies the script to update
 * what it shows instead of rebuilding the whole list.
 *
 * Script layout, in the order operations must be applied:
 *   1. `Remove` for every element whose key is absent from the new list, highest
 *      index first.
 *   2. `Move` and `Insert`, walking the new list front to back. Elements on a
 *      longest increasing subsequence of surviving positions never move.
 *   3. `Change` for every retained element whose content differs, at its final
 *      position.
 * A retained element is never removed and re-inserted.
 */
use super::models::ApplicationRecord;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;

/* Provides the identity used to match elements across two lists. */
pub trait Keyed {
    type Key: Eq + Hash + std::fmt::Debug + ?Sized;
    fn key(&self) -> &Self::Key;
}

impl Keyed for ApplicationRecord {
    type Key = str;

    fn key(&self) -> &str {
        self.package_id()
    }
}

/*
 * One positional operation. `Insert` places the item so it ends up at `pos`;
 * `Move` removes the element at `from` and re-inserts it at `to` in the
 * shortened list.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp<T> {
    Insert { pos: usize, item: T },
    Remove { pos: usize },
    Move { from: usize, to: usize },
    Change { pos: usize, item: T },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    PositionOutOfRange { op_index: usize, pos: usize, len: usize },
}

impl std::fmt::Display for DiffError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiffError::PositionOutOfRange { op_index, pos, len } => write!(
                f,
                "Edit operation #{op_index} refers to position {pos} in a list of length {len}"
            ),
        }
    }
}

impl std::error::Error for DiffError {}

pub type Result<T> = std::result::Result<T, DiffError>;

/*
 * Returns the indices into `seq` forming one longest strictly increasing
 * subsequence (patience sorting with predecessor links).
 */
fn longest_increasing_subsequence(seq: &[usize]) -> Vec<usize> {
    let mut tails: Vec<usize> = Vec::new();
    let mut predecessors: Vec<Option<usize>> = vec![None; seq.len()];

    for (i, value) in seq.iter().enumerate() {
        let slot = tails.partition_point(|&t| seq[t] < *value);
        if slot > 0 {
            predecessors[i] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(i);
        } else {
            tails[slot] = i;
        }
    }

    let mut result = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        result.push(i);
        cursor = predecessors[i];
    }
    result.reverse();
    result
}

/*
 * Fenwick tree over placement slots, counting the occupied ones. Turns "how many
 * elements sit before this slot" into an O(log n) query.
 */
struct OccupiedSlots {
    tree: Vec<isize>,
}

impl OccupiedSlots {
    fn new(slot_count: usize) -> Self {
        OccupiedSlots {
            tree: vec![0; slot_count + 1],
        }
    }

    fn adjust(&mut self, slot: usize, delta: isize) {
        let mut i = slot + 1;
        while i < self.tree.len() {
            self.tree[i] += delta;
            i += i & i.wrapping_neg();
        }
    }

    fn occupy(&mut self, slot: usize) {
        self.adjust(slot, 1);
    }

    fn vacate(&mut self, slot: usize) {
        self.adjust(slot, -1);
    }

    /* Number of occupied slots strictly before `slot`. */
    fn count_before(&self, slot: usize) -> usize {
        let mut i = slot;
        let mut total = 0;
        while i > 0 {
            total += self.tree[i];
            i &= i - 1;
        }
        total as usize
    }
}

/* Where an element of the new list ends up relative to the anchors. */
#[derive(Debug, Clone, Copy)]
enum Placement {
    Anchor,
    /* Before the first anchor, at this offset. */
    Front(usize),
    /* The `offset`-th element following the anchor at working position `anchor`. */
    AfterAnchor { anchor: usize, offset: usize },
}

/*
 * Computes an edit script turning `old` into `new`. Keys are expected to be
 * unique within each list; a duplicate key in `old` beyond its first occurrence
 * is treated as removed.
 *
 * Anchors never move, and every other element is placed directly after its
 * predecessor in `new`. Nothing is ever inserted between two placed neighbours,
 * so each anchor is followed by a run of placed elements, and every element gets
 * a fixed slot up front: surviving elements keep a slot at their old position
 * until they are placed, and placed elements take the slot reserved in their
 * run. Positions are then prefix counts over the occupied slots.
 */
pub fn diff<T>(old: &[T], new: &[T]) -> Vec<EditOp<T>>
where
    T: Keyed + Clone + PartialEq,
{
    let mut script = Vec::new();

    let new_index: HashMap<&T::Key, usize> = new
        .iter()
        .enumerate()
        .map(|(i, item)| (item.key(), i))
        .collect();

    // Survivors: first occurrence of a key that exists in `new`, kept in old order.
    let mut old_by_key: HashMap<&T::Key, &T> = HashMap::with_capacity(old.len());
    let mut survives = vec![false; old.len()];
    let mut targets: Vec<usize> = Vec::new();
    for (i, item) in old.iter().enumerate() {
        let key = item.key();
        if let Some(&target) = new_index.get(key) {
            if let Entry::Vacant(entry) = old_by_key.entry(key) {
                entry.insert(item);
                survives[i] = true;
                targets.push(target);
            }
        }
    }

    for i in (0..old.len()).rev() {
        if !survives[i] {
            script.push(EditOp::Remove { pos: i });
        }
    }

    // `targets[p]` is the new index of the survivor at working position `p`.
    let survivor_count = targets.len();
    let mut is_anchor = vec![false; survivor_count];
    for p in longest_increasing_subsequence(&targets) {
        is_anchor[p] = true;
    }
    let mut working_pos_of_new: Vec<Option<usize>> = vec![None; new.len()];
    for (p, &target) in targets.iter().enumerate() {
        working_pos_of_new[target] = Some(p);
    }

    let mut front_len = 0;
    let mut run_len = vec![0usize; survivor_count];
    let mut current_anchor: Option<usize> = None;
    let placements: Vec<Placement> = working_pos_of_new
        .iter()
        .map(|working_pos| match (*working_pos, current_anchor) {
            (Some(p), _) if is_anchor[p] => {
                current_anchor = Some(p);
                Placement::Anchor
            }
            (_, Some(anchor)) => {
                run_len[anchor] += 1;
                Placement::AfterAnchor {
                    anchor,
                    offset: run_len[anchor] - 1,
                }
            }
            (_, None) => {
                front_len += 1;
                Placement::Front(front_len - 1)
            }
        })
        .collect();

    // Slot layout: the front run, then each survivor followed by its run if it is an anchor.
    let mut initial_slot = vec![0usize; survivor_count];
    let mut run_start = vec![0usize; survivor_count];
    let mut slot_count = front_len;
    for p in 0..survivor_count {
        initial_slot[p] = slot_count;
        slot_count += 1;
        if is_anchor[p] {
            run_start[p] = slot_count;
            slot_count += run_len[p];
        }
    }

    let mut occupied = OccupiedSlots::new(slot_count);
    for &slot in &initial_slot {
        occupied.occupy(slot);
    }

    for (i, item) in new.iter().enumerate() {
        let target_slot = match placements[i] {
            Placement::Anchor => continue,
            Placement::Front(offset) => offset,
            Placement::AfterAnchor { anchor, offset } => run_start[anchor] + offset,
        };
        match working_pos_of_new[i] {
            Some(p) => {
                let from = occupied.count_before(initial_slot[p]);
                occupied.vacate(initial_slot[p]);
                let to = occupied.count_before(target_slot);
                occupied.occupy(target_slot);
                if from != to {
                    script.push(EditOp::Move { from, to });
                }
            }
            None => {
                let pos = occupied.count_before(target_slot);
                occupied.occupy(target_slot);
                script.push(EditOp::Insert {
                    pos,
                    item: item.clone(),
                });
            }
        }
    }

    for (pos, item) in new.iter().enumerate() {
        if let Some(previous) = old_by_key.get(item.key()) {
            if *previous != item {
                script.push(EditOp::Change {
                    pos,
                    item: item.clone(),
                });
            }
        }
    }

    log::trace!(
        "DiffEngine: {} -> {} elements in {} operations.",
        old.len(),
        new.len(),
        script.len()
    );
    script
}

/* Applies `script` to a copy of `old`. */
pub fn apply<T: Clone>(old: &[T], script: &[EditOp<T>]) -> Result<Vec<T>> {
    let mut list: Vec<T> = old.to_vec();
    for (op_index, op) in script.iter().enumerate() {
        let len = list.len();
        let out_of_range = |pos: usize| DiffError::PositionOutOfRange { op_index, pos, len };
        match op {
            EditOp::Insert { pos, item } => {
                if *pos > len {
                    return Err(out_of_range(*pos));
                }
                list.insert(*pos, item.clone());
            }
            EditOp::Remove { pos } => {
                if *pos >= len {
                    return Err(out_of_range(*pos));
                }
                list.remove(*pos);
            }
            EditOp::Move { from, to } => {
                if *from >= len {
                    return Err(out_of_range(*from));
                }
                if *to >= len {
                    return Err(out_of_range(*to));
                }
                let moved = list.remove(*from);
                list.insert(*to, moved);
            }
            EditOp::Change { pos, item } => {
                if *pos >= len {
                    return Err(out_of_range(*pos));
                }
                list[*pos] = item.clone();
            }
        }
    }
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::seq::SliceRandom;

    fn rec(id: &str) -> ApplicationRecord {
        ApplicationRecord::new(id, id.to_uppercase())
    }

    fn assert_round_trip(old: &[ApplicationRecord], new: &[ApplicationRecord]) -> Vec<EditOp<ApplicationRecord>> {
        let script = diff(old, new);
        let applied = apply(old, &script).expect("script should apply cleanly");
        assert_eq!(applied, new, "script {script:?}");
        script
    }

    #[test]
    fn test_diff_scenario_retains_shared_element() {
        let old = vec![rec("id1"), rec("id2")];
        let new = vec![rec("id2"), rec("id3")];
        let script = assert_round_trip(&old, &new);
        assert_eq!(
            script,
            vec![
                EditOp::Remove { pos: 0 },
                EditOp::Insert { pos: 1, item: rec("id3") },
            ]
        );
    }

    #[test]
    fn test_diff_empty_to_nonempty_and_back() {
        let items = vec![rec("a"), rec("b"), rec("c")];
        let grow = assert_round_trip(&[], &items);
        assert!(grow.iter().all(|op| matches!(op, EditOp::Insert { .. })));
        let shrink = assert_round_trip(&items, &[]);
        assert_eq!(
            shrink,
            vec![
                EditOp::Remove { pos: 2 },
                EditOp::Remove { pos: 1 },
                EditOp::Remove { pos: 0 },
            ]
        );
    }

    #[test]
    fn test_diff_identical_lists_is_empty() {
        let items = vec![rec("a"), rec("b")];
        assert!(diff(&items, &items).is_empty());
    }

    #[test]
    fn test_diff_rotation_uses_single_move() {
        let old = vec![rec("a"), rec("b"), rec("c"), rec("d")];
        let new = vec![rec("b"), rec("c"), rec("d"), rec("a")];
        let script = assert_round_trip(&old, &new);
        assert_eq!(script, vec![EditOp::Move { from: 0, to: 3 }]);
    }

    #[test]
    fn test_diff_reports_content_change_at_final_position() {
        let old = vec![rec("a"), rec("b")];
        let updated_b = rec("b").with_version("2.0", 2);
        let new = vec![updated_b.clone(), rec("a")];
        let script = assert_round_trip(&old, &new);
        assert!(script.contains(&EditOp::Change { pos: 0, item: updated_b }));
        assert!(!script.iter().any(|op| matches!(op, EditOp::Remove { .. } | EditOp::Insert { .. })));
    }

    #[test]
    fn test_apply_rejects_out_of_range_positions() {
        let old = vec![rec("a")];
        let err = apply(&old, &[EditOp::Remove { pos: 3 }]).unwrap_err();
        assert_eq!(err, DiffError::PositionOutOfRange { op_index: 0, pos: 3, len: 1 });
    }

    #[test]
    fn test_longest_increasing_subsequence() {
        assert_eq!(longest_increasing_subsequence(&[]), Vec::<usize>::new());
        let seq = [3, 0, 1, 4, 2];
        let lis = longest_increasing_subsequence(&seq);
        assert_eq!(lis.len(), 3);
        assert!(lis.windows(2).all(|w| w[0] < w[1] && seq[w[0]] < seq[w[1]]));
    }

    #[test]
    fn test_occupied_slots_counts_prefixes() {
        let mut slots = OccupiedSlots::new(6);
        for slot in [0, 2, 5] {
            slots.occupy(slot);
        }
        assert_eq!(slots.count_before(0), 0);
        assert_eq!(slots.count_before(3), 2);
        assert_eq!(slots.count_before(6), 3);
        slots.vacate(2);
        slots.occupy(4);
        assert_eq!(slots.count_before(5), 2);
    }

    #[test]
    fn test_diff_reversed_large_list_moves_all_but_one() {
        let old: Vec<ApplicationRecord> = (0..10_000).map(|i| rec(&format!("pkg{i:05}"))).collect();
        let new: Vec<ApplicationRecord> = old.iter().rev().cloned().collect();
        let script = diff(&old, &new);
        assert_eq!(script.len(), 9_999);
        assert!(script.iter().all(|op| matches!(op, EditOp::Move { .. })));
    }

    #[test]
    fn test_diff_round_trips_large_shuffle() {
        let mut rng = rand::rng();
        let old: Vec<ApplicationRecord> = (0..2_000).map(|i| rec(&format!("pkg{i}"))).collect();
        let mut new: Vec<ApplicationRecord> = old
            .iter()
            .filter(|_| rng.random_bool(0.9))
            .cloned()
            .chain((0..100).map(|i| rec(&format!("fresh{i}"))))
            .collect();
        new.shuffle(&mut rng);
        assert_round_trip(&old, &new);
    }

    #[test]
    fn test_diff_round_trips_random_lists() {
        let mut rng = rand::rng();
        let pool: Vec<String> = (0..30).map(|i| format!("pkg{i}")).collect();
        for _ in 0..300 {
            let mut old_ids = pool.clone();
            old_ids.shuffle(&mut rng);
            old_ids.truncate(rng.random_range(0..pool.len()));
            let mut new_ids = pool.clone();
            new_ids.shuffle(&mut rng);
            new_ids.truncate(rng.random_range(0..pool.len()));

            let old: Vec<ApplicationRecord> = old_ids.iter().map(|id| rec(id)).collect();
            let new: Vec<ApplicationRecord> = new_ids
                .iter()
                .map(|id| {
                    if rng.random_bool(0.2) {
                        rec(id).with_timestamps(1, 2)
                    } else {
                        rec(id)
                    }
                })
                .collect();

            let script = assert_round_trip(&old, &new);
            let shared = old_ids.iter().filter(|id| new_ids.contains(id)).count();
            let removes = script.iter().filter(|op| matches!(op, EditOp::Remove { .. })).count();
            let inserts = script.iter().filter(|op| matches!(op, EditOp::Insert { .. })).count();
            assert_eq!(removes, old.len() - shared);
            assert_eq!(inserts, new.len() - shared);
        }
    }
}
