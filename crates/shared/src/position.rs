use crate::config::OrderingConfig;
use crate::error::ConfigError;
use crate::models::Rekey;
use crate::order_key::{self, OrderKey};
use crate::sibling::Sibling;

/// Result of placing one entry among its siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation<Id> {
    pub position: OrderKey,
    /// Siblings whose keys a rebalance re-derived to make room. Empty unless
    /// the gap was exhausted.
    pub rebalanced: Vec<Rekey<Id>>,
}

impl<Id> Allocation<Id> {
    fn fresh(position: OrderKey) -> Self {
        Allocation {
            position,
            rebalanced: Vec::new(),
        }
    }
}

/// Computes new order keys relative to the current siblings of the target
/// container. All operations are pure; the sibling slice is never mutated and
/// rebalanced keys are returned for the caller to apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionAllocator {
    config: OrderingConfig,
}

impl PositionAllocator {
    /// Allocator for an already validated config.
    ///
    /// A config that fails [`OrderingConfig::validate`] makes the first
    /// exhausted gap panic; use [`try_new`](Self::try_new) for configs read
    /// from outside.
    pub fn new(config: OrderingConfig) -> Self {
        Self { config }
    }

    pub fn try_new(config: OrderingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &OrderingConfig {
        &self.config
    }

    /// Key below every sibling, or the baseline for an empty container.
    pub fn first_position<S: Sibling>(&self, siblings: &[S]) -> Allocation<S::Id> {
        let snapshot = Snapshot::new(siblings);
        self.allocate_in_gap(&snapshot, 0)
    }

    /// Key above every sibling, or the baseline for an empty container.
    pub fn last_position<S: Sibling>(&self, siblings: &[S]) -> Allocation<S::Id> {
        let snapshot = Snapshot::new(siblings);
        let gap = snapshot.len();
        self.allocate_in_gap(&snapshot, gap)
    }

    /// Key between `anchor` and the next greater sibling key.
    ///
    /// Falls back to [`last_position`](Self::last_position) when no sibling
    /// holds `anchor`.
    pub fn position_after<S: Sibling>(&self, anchor: &OrderKey, siblings: &[S]) -> Allocation<S::Id> {
        let snapshot = Snapshot::new(siblings);
        if !snapshot.contains(anchor) {
            let gap = snapshot.len();
            return self.allocate_in_gap(&snapshot, gap);
        }
        let gap = snapshot.entries.partition_point(|(key, _)| *key <= anchor);
        self.allocate_in_gap(&snapshot, gap)
    }

    /// Key between the next lesser sibling key and `anchor`.
    ///
    /// Falls back to [`last_position`](Self::last_position) when no sibling
    /// holds `anchor`.
    pub fn position_before<S: Sibling>(&self, anchor: &OrderKey, siblings: &[S]) -> Allocation<S::Id> {
        let snapshot = Snapshot::new(siblings);
        if !snapshot.contains(anchor) {
            let gap = snapshot.len();
            return self.allocate_in_gap(&snapshot, gap);
        }
        let gap = snapshot.entries.partition_point(|(key, _)| *key < anchor);
        self.allocate_in_gap(&snapshot, gap)
    }

    /// Key directly after the sibling `anchor`, ahead of any sibling whose
    /// key collides with the anchor's but whose id sorts after it.
    ///
    /// Falls back to [`last_position`](Self::last_position) when `anchor` is
    /// not among `siblings`.
    pub fn position_after_sibling<S: Sibling>(&self, anchor: &S::Id, siblings: &[S]) -> Allocation<S::Id> {
        let snapshot = Snapshot::new(siblings);
        let gap = snapshot.index_of(anchor).map_or(snapshot.len(), |i| i + 1);
        self.allocate_in_gap(&snapshot, gap)
    }

    /// Key directly before the sibling `anchor`.
    ///
    /// Falls back to [`last_position`](Self::last_position) when `anchor` is
    /// not among `siblings`.
    pub fn position_before_sibling<S: Sibling>(&self, anchor: &S::Id, siblings: &[S]) -> Allocation<S::Id> {
        let snapshot = Snapshot::new(siblings);
        let gap = snapshot.index_of(anchor).unwrap_or(snapshot.len());
        self.allocate_in_gap(&snapshot, gap)
    }

    /// Evenly spaced keys for `count` entries of an empty container, for
    /// seeding data that carries no keys yet.
    pub fn spread(&self, count: usize) -> Vec<OrderKey> {
        if count == 0 {
            return Vec::new();
        }
        let len = order_key::spread_len(None, None, count, self.config.rebalance_key_len)
            .or_else(|| order_key::spread_len(None, None, count, self.config.max_key_len))
            .unwrap_or_else(|| panic!("{count} entries do not fit in {} digit keys", self.config.max_key_len));
        order_key::spread(None, None, count, len)
    }

    fn allocate_in_gap<Id: Clone>(&self, snapshot: &Snapshot<'_, Id>, gap: usize) -> Allocation<Id> {
        let (lo, hi) = snapshot.bounds(gap, gap);
        match order_key::midpoint(lo, hi, self.config.max_key_len) {
            Some(position) => Allocation::fresh(position),
            None => self.rebalance(snapshot, gap),
        }
    }

    /// Re-derive evenly spaced keys for the smallest window of siblings around
    /// `gap` that has room, then retry the allocation once.
    ///
    /// # Panics
    ///
    /// Panics if the whole container cannot be respaced within the maximum key
    /// length, or if the retry still finds no key. Both mean the key space is
    /// corrupt, not that the caller did something recoverable.
    fn rebalance<Id: Clone>(&self, snapshot: &Snapshot<'_, Id>, gap: usize) -> Allocation<Id> {
        let (start, end, len) = self.find_window(snapshot, gap).unwrap_or_else(|| {
            panic!(
                "cannot respace {} siblings within {} digit keys",
                snapshot.len(),
                self.config.max_key_len
            )
        });
        let (lo, hi) = snapshot.bounds(start, end);
        let window = &snapshot.entries[start..end];

        // One slot per window entry plus the reserved slot at the gap.
        let slots = order_key::spread(lo, hi, window.len() + 1, len);
        let reserved = gap - start;
        let rebalanced: Vec<Rekey<Id>> = window
            .iter()
            .zip(
                slots
                    .iter()
                    .enumerate()
                    .filter(|(slot, _)| *slot != reserved)
                    .map(|(_, key)| key),
            )
            .map(|((_, id), key)| Rekey {
                id: (*id).clone(),
                position: key.clone(),
            })
            .collect();

        let retry_lo = if reserved == 0 { lo } else { slots.get(reserved - 1) };
        let retry_hi = if reserved == window.len() {
            hi
        } else {
            slots.get(reserved + 1)
        };
        let position = order_key::midpoint(retry_lo, retry_hi, self.config.max_key_len)
            .unwrap_or_else(|| panic!("no order key fits after rebalancing {} siblings", window.len()));

        tracing::debug!(
            window = window.len(),
            key_len = len,
            siblings = snapshot.len(),
            "Rebalanced exhausted sibling range"
        );

        Allocation {
            position,
            rebalanced,
        }
    }

    /// Grow a window around `gap` by doubling its radius until the window and
    /// the new slot fit at the rebalance key length. Only a window spanning
    /// the whole container may use longer keys.
    fn find_window<Id>(&self, snapshot: &Snapshot<'_, Id>, gap: usize) -> Option<(usize, usize, usize)> {
        let mut radius = 1;
        loop {
            let start = gap.saturating_sub(radius);
            let end = (gap + radius).min(snapshot.len());
            let (lo, hi) = snapshot.bounds(start, end);
            let slots = end - start + 1;
            if let Some(len) = order_key::spread_len(lo, hi, slots, self.config.rebalance_key_len) {
                return Some((start, end, len));
            }
            if start == 0 && end == snapshot.len() {
                return order_key::spread_len(lo, hi, slots, self.config.max_key_len)
                    .map(|len| (start, end, len));
            }
            radius *= 2;
        }
    }
}

/// Siblings sorted by (key, id) for neighbour lookups.
struct Snapshot<'a, Id> {
    entries: Vec<(&'a OrderKey, &'a Id)>,
}

impl<'a, Id: Ord> Snapshot<'a, Id> {
    fn new<S: Sibling<Id = Id>>(siblings: &'a [S]) -> Self {
        let mut entries: Vec<(&OrderKey, &Id)> =
            siblings.iter().map(|s| (s.position(), s.id())).collect();
        entries.sort();
        Snapshot { entries }
    }
}

impl<'a, Id> Snapshot<'a, Id> {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn contains(&self, key: &OrderKey) -> bool {
        self.entries.iter().any(|(k, _)| *k == key)
    }

    fn index_of(&self, id: &Id) -> Option<usize>
    where
        Id: PartialEq,
    {
        self.entries.iter().position(|(_, i)| *i == id)
    }

    /// Keys just outside `start..end`.
    fn bounds(&self, start: usize, end: usize) -> (Option<&'a OrderKey>, Option<&'a OrderKey>) {
        let lo = start.checked_sub(1).map(|i| self.entries[i].0);
        let hi = self.entries.get(end).map(|e| e.0);
        (lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Item, ItemId};
    use crate::sibling::sort_siblings;

    fn item(id: &str, pos: &str) -> Item {
        Item {
            id: ItemId::new(id),
            container_id: None,
            position: OrderKey::parse(pos).unwrap(),
        }
    }

    fn key(s: &str) -> OrderKey {
        OrderKey::parse(s).unwrap()
    }

    fn apply(items: &mut Vec<Item>, id: &str, alloc: Allocation<ItemId>) {
        for rekey in alloc.rebalanced {
            let entry = items.iter_mut().find(|i| i.id == rekey.id).unwrap();
            entry.position = rekey.position;
        }
        items.push(Item {
            id: ItemId::new(id),
            container_id: None,
            position: alloc.position,
        });
    }

    fn ordered_ids(items: &[Item]) -> Vec<String> {
        sort_siblings(items.iter())
            .into_iter()
            .map(|i| i.id.0.clone())
            .collect()
    }

    #[test]
    fn test_empty_container_gets_baseline() {
        let allocator = PositionAllocator::default();
        let empty: Vec<Item> = Vec::new();
        assert_eq!(allocator.first_position(&empty).position, OrderKey::baseline());
        assert_eq!(allocator.last_position(&empty).position, OrderKey::baseline());
    }

    #[test]
    fn test_first_and_last_bracket_existing() {
        let allocator = PositionAllocator::default();
        let siblings = vec![item("x", "5"), item("y", "9")];
        let first = allocator.first_position(&siblings);
        let last = allocator.last_position(&siblings);
        assert!(first.position < key("5"));
        assert!(last.position > key("9"));
        assert!(first.rebalanced.is_empty());
        assert!(last.rebalanced.is_empty());
    }

    #[test]
    fn test_position_after_lands_before_next() {
        let allocator = PositionAllocator::default();
        let siblings = vec![item("a", "1"), item("b", "2"), item("c", "3")];
        let alloc = allocator.position_after(&key("1"), &siblings);
        assert!(key("1") < alloc.position && alloc.position < key("2"));
    }

    #[test]
    fn test_position_after_max_goes_past_it() {
        let allocator = PositionAllocator::default();
        let siblings = vec![item("a", "1"), item("b", "2")];
        let alloc = allocator.position_after(&key("2"), &siblings);
        assert!(alloc.position > key("2"));
    }

    #[test]
    fn test_position_before_lands_after_previous() {
        let allocator = PositionAllocator::default();
        let siblings = vec![item("a", "1"), item("b", "2"), item("c", "3")];
        let alloc = allocator.position_before(&key("3"), &siblings);
        assert!(key("2") < alloc.position && alloc.position < key("3"));
    }

    #[test]
    fn test_missing_anchor_falls_back_to_last() {
        let allocator = PositionAllocator::default();
        let siblings = vec![item("a", "1"), item("b", "2")];
        let after = allocator.position_after(&key("1V"), &siblings);
        let before = allocator.position_before(&key("1V"), &siblings);
        assert!(after.position > key("2"));
        assert!(before.position > key("2"));
    }

    #[test]
    fn test_colliding_neighbours_are_rebalanced() {
        let allocator = PositionAllocator::default();
        let siblings = vec![item("a", "G"), item("b", "G")];
        let alloc = allocator.position_after(&key("G"), &siblings);
        // Inserting after both collided keys needs no respacing.
        assert!(alloc.rebalanced.is_empty());

        let mut items = siblings.clone();
        let between = allocator.allocate_in_gap(&Snapshot::new(&items), 1);
        assert!(!between.rebalanced.is_empty());
        apply(&mut items, "n", between);
        assert_eq!(ordered_ids(&items), vec!["a", "n", "b"]);
        let keys: Vec<&OrderKey> = sort_siblings(items.iter()).into_iter().map(|i| &i.position).collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_repeated_front_insertion_rebalances_and_keeps_order() {
        let allocator = PositionAllocator::default();
        let mut items: Vec<Item> = Vec::new();
        let mut rebalances = 0;
        for n in 0..1000 {
            let alloc = allocator.first_position(&items);
            if !alloc.rebalanced.is_empty() {
                rebalances += 1;
            }
            assert!(alloc.position.len() <= allocator.config().max_key_len);
            apply(&mut items, &format!("{n:04}"), alloc);
        }
        assert!(rebalances >= 1);

        let expected: Vec<String> = (0..1000).rev().map(|n| format!("{n:04}")).collect();
        assert_eq!(ordered_ids(&items), expected);

        let sorted = sort_siblings(items.iter());
        assert!(sorted.windows(2).all(|w| w[0].position < w[1].position));
    }

    #[test]
    fn test_repeated_insertion_after_same_anchor() {
        let allocator = PositionAllocator::new(OrderingConfig {
            max_key_len: 4,
            rebalance_key_len: 2,
        });
        let mut items = vec![item("head", "1"), item("tail", "2")];
        for n in 0..500 {
            let head = items.iter().find(|i| i.id.as_str() == "head").unwrap().position.clone();
            let alloc = allocator.position_after(&head, &items);
            apply(&mut items, &format!("{n:03}"), alloc);
        }
        let ids = ordered_ids(&items);
        assert_eq!(ids.first().map(String::as_str), Some("head"));
        assert_eq!(ids.get(1).map(String::as_str), Some("499"));
        assert_eq!(ids.last().map(String::as_str), Some("tail"));
        let sorted = sort_siblings(items.iter());
        assert!(sorted.windows(2).all(|w| w[0].position < w[1].position));
    }

    #[test]
    fn test_rebalance_touches_only_a_window() {
        let allocator = PositionAllocator::new(OrderingConfig {
            max_key_len: 2,
            rebalance_key_len: 2,
        });
        // Far apart prefix, then a crowded pair at the end.
        let mut items = vec![item("a", "1"), item("b", "A"), item("c", "x"), item("d", "x1")];
        let anchor = key("x");
        let alloc = allocator.position_after(&anchor, &items);
        assert!(!alloc.rebalanced.is_empty());
        assert!(alloc.rebalanced.iter().all(|r| r.id.as_str() != "a"));
        apply(&mut items, "n", alloc);
        assert_eq!(ordered_ids(&items), vec!["a", "b", "c", "n", "d"]);
    }

    #[test]
    fn test_sibling_anchor_respects_colliding_keys() {
        let allocator = PositionAllocator::default();
        let siblings = vec![item("a", "G"), item("b", "G"), item("c", "k")];

        let mut items = siblings.clone();
        let after_a = allocator.position_after_sibling(&ItemId::new("a"), &siblings);
        assert!(!after_a.rebalanced.is_empty());
        apply(&mut items, "n", after_a);
        assert_eq!(ordered_ids(&items), vec!["a", "n", "b", "c"]);

        let mut items = siblings.clone();
        let before_b = allocator.position_before_sibling(&ItemId::new("b"), &siblings);
        apply(&mut items, "n", before_b);
        assert_eq!(ordered_ids(&items), vec!["a", "n", "b", "c"]);

        let mut items = siblings.clone();
        let after_b = allocator.position_after_sibling(&ItemId::new("b"), &siblings);
        assert!(after_b.rebalanced.is_empty());
        apply(&mut items, "n", after_b);
        assert_eq!(ordered_ids(&items), vec!["a", "b", "n", "c"]);
    }

    #[test]
    fn test_sibling_anchor_missing_falls_back_to_last() {
        let allocator = PositionAllocator::default();
        let siblings = vec![item("a", "1"), item("b", "2")];
        let after = allocator.position_after_sibling(&ItemId::new("ghost"), &siblings);
        let before = allocator.position_before_sibling(&ItemId::new("ghost"), &siblings);
        assert!(after.position > key("2"));
        assert!(before.position > key("2"));
    }

    #[test]
    fn test_try_new_rejects_invalid_config() {
        let zero = OrderingConfig {
            max_key_len: 0,
            rebalance_key_len: 0,
        };
        assert!(matches!(
            PositionAllocator::try_new(zero),
            Err(ConfigError::MaxKeyLen { value: 0, .. })
        ));
        assert!(PositionAllocator::try_new(OrderingConfig::default()).is_ok());
    }

    #[test]
    fn test_spread_seeds_ordered_keys() {
        let allocator = PositionAllocator::default();
        let keys = allocator.spread(100);
        assert_eq!(keys.len(), 100);
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
        assert!(allocator.spread(0).is_empty());
    }
}
