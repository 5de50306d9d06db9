//! Order Remapper
//!
//! Translates a reorder performed on a filtered subset back onto the full
//! collection.

use std::collections::HashMap;
use std::hash::Hash;

/// New full order consistent with `reordered`.
///
/// Subset members form one contiguous block in their new order. Items outside
/// the subset keep their relative order: those that came before the first
/// subset member stay in front of the block, the rest follow it. Entries of
/// `reordered` that are not in `full` are ignored. Neither input is modified.
pub fn remap<T, K, F>(full: &[T], reordered: &[T], key: F) -> Vec<T>
where
    T: Clone,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut new_position: HashMap<K, usize> = HashMap::with_capacity(reordered.len());
    for (index, item) in reordered.iter().enumerate() {
        new_position.entry(key(item)).or_insert(index);
    }

    let anchor = full
        .iter()
        .position(|item| new_position.contains_key(&key(item)))
        .unwrap_or(full.len());

    // (band, position-in-band, original index): a total order
    let mut ranked: Vec<(u8, usize, usize)> = full
        .iter()
        .enumerate()
        .map(|(index, item)| match new_position.get(&key(item)) {
            Some(&position) => (1, position, index),
            None if index < anchor => (0, index, index),
            None => (2, index, index),
        })
        .collect();
    ranked.sort_unstable();

    ranked.into_iter().map(|(_, _, index)| full[index].clone()).collect()
}

/// Move the item keyed `dragged` into the slot of the item keyed `target`,
/// shifting everything in between by one. `None` if either key is missing
/// or both are the same item.
pub fn move_onto<T, K, F>(order: &[T], dragged: &K, target: &K, key: F) -> Option<Vec<T>>
where
    T: Clone,
    K: PartialEq,
    F: Fn(&T) -> K,
{
    if dragged == target {
        return None;
    }
    let from = order.iter().position(|item| key(item) == *dragged)?;
    let to = order.iter().position(|item| key(item) == *target)?;
    let mut moved = order.to_vec();
    let item = moved.remove(from);
    moved.insert(to, item);
    Some(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn same(x: &u32) -> u32 {
        *x
    }

    #[test]
    fn test_move_down_and_up() {
        let order = [1, 2, 3, 4, 5];
        assert_eq!(move_onto(&order, &1, &4, same), Some(vec![2, 3, 4, 1, 5]));
        assert_eq!(move_onto(&order, &5, &2, same), Some(vec![1, 5, 2, 3, 4]));
        assert_eq!(move_onto(&order, &3, &3, same), None);
        assert_eq!(move_onto(&order, &3, &9, same), None);
    }

    #[test]
    fn test_full_subset_is_the_new_order() {
        let full = [1, 2, 3, 4, 5];
        assert_eq!(remap(&full, &[2, 3, 4, 1, 5], same), vec![2, 3, 4, 1, 5]);
    }

    #[test]
    fn test_hidden_items_keep_their_side() {
        // 1 and 4 are hidden; 1 sits before the first visible item
        let full = [1, 2, 3, 4, 5];
        assert_eq!(remap(&full, &[5, 2, 3], same), vec![1, 5, 2, 3, 4]);
    }

    #[test]
    fn test_unknown_and_duplicate_keys() {
        let full = [1, 2, 3];
        assert_eq!(remap(&full, &[3, 9, 1, 3], same), vec![3, 1, 2]);
        assert_eq!(remap(&full, &[], same), vec![1, 2, 3]);
    }

    #[test]
    fn test_inputs_untouched() {
        let full = vec![String::from("a"), String::from("b")];
        let subset = vec![String::from("b"), String::from("a")];
        let out = remap(&full, &subset, |s| s.clone());
        assert_eq!(out, subset);
        assert_eq!(full, vec!["a", "b"]);
    }

    fn case() -> impl Strategy<Value = (Vec<u32>, Vec<u32>)> {
        (0usize..24).prop_flat_map(|n| {
            let full: Vec<u32> = (0..n as u32).collect();
            (
                Just(full.clone()),
                Just(full).prop_shuffle(),
                proptest::collection::vec(any::<bool>(), n),
            )
                .prop_map(|(full, shuffled, keep)| {
                    let subset: Vec<u32> = shuffled
                        .into_iter()
                        .filter(|id| keep[*id as usize])
                        .collect();
                    (full, subset)
                })
        })
    }

    proptest! {
        #[test]
        fn prop_remap_preserves_both_orders((full, subset) in case()) {
            let out = remap(&full, &subset, same);

            let mut sorted = out.clone();
            sorted.sort_unstable();
            prop_assert_eq!(&sorted, &full);

            let subset_in_out: Vec<u32> =
                out.iter().copied().filter(|id| subset.contains(id)).collect();
            prop_assert_eq!(subset_in_out, subset.clone());

            let rest_in_out: Vec<u32> =
                out.iter().copied().filter(|id| !subset.contains(id)).collect();
            let rest_in_full: Vec<u32> =
                full.iter().copied().filter(|id| !subset.contains(id)).collect();
            prop_assert_eq!(rest_in_out, rest_in_full);
        }
    }
}
