use std::collections::HashMap;
use std::collections::HashSet;
use std::hash::BuildHasher;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use siphasher::sip::SipHasher;

use crate::DenseMap;
use crate::DenseSet;

/// Deterministic hasher so failing cases replay exactly.
#[derive(Clone, Copy)]
struct FixedSipBuilder;

impl BuildHasher for FixedSipBuilder {
    type Hasher = SipHasher;

    fn build_hasher(&self) -> Self::Hasher {
        SipHasher::new_with_keys(0x517c_c1b7_2722_0a95, 0x9e37_79b9_7f4a_7c15)
    }
}

/// Actions run against both the dense map and the std model. Keys are
/// drawn from a small domain so sequences revisit and collide often.
#[derive(Arbitrary, Debug, Clone)]
enum MapAction {
    Insert(u8, u32),
    InsertOrAssign(u8, u32),
    Get(u8),
    Remove(u8),
    OrInsert(u8, u32),
}

#[derive(Arbitrary, Debug, Clone)]
enum SetAction {
    Insert(u8),
    Contains(u8),
    Remove(u8),
}

proptest! {
    #[test]
    fn map_matches_std_model(actions in prop::collection::vec(any::<MapAction>(), 1..256)) {
        let mut map = DenseMap::with_capacity_and_hasher(4, FixedSipBuilder).unwrap();
        let mut model: HashMap<u8, u32> = HashMap::new();

        for action in actions {
            match action {
                MapAction::Insert(key, value) => {
                    let expected = !model.contains_key(&key);
                    if expected {
                        model.insert(key, value);
                    }
                    prop_assert_eq!(map.insert(key, value), expected);
                }
                MapAction::InsertOrAssign(key, value) => {
                    prop_assert_eq!(map.insert_or_assign(key, value), model.insert(key, value));
                }
                MapAction::Get(key) => {
                    prop_assert_eq!(map.get(&key), model.get(&key));
                    prop_assert_eq!(map.contains_key(&key), model.contains_key(&key));
                }
                MapAction::Remove(key) => {
                    prop_assert_eq!(map.remove(&key), model.remove(&key));
                }
                MapAction::OrInsert(key, value) => {
                    let got = *map.entry(key).or_insert(value);
                    let expected = *model.entry(key).or_insert(value);
                    prop_assert_eq!(got, expected);
                }
            }
            prop_assert_eq!(map.len(), model.len());
        }

        let mut seen: Vec<(u8, u32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
        let mut expected: Vec<(u8, u32)> = model.iter().map(|(k, v)| (*k, *v)).collect();
        seen.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn set_matches_std_model(actions in prop::collection::vec(any::<SetAction>(), 1..256)) {
        let mut set = DenseSet::with_capacity_and_hasher(4, FixedSipBuilder).unwrap();
        let mut model: HashSet<u8> = HashSet::new();

        for action in actions {
            match action {
                SetAction::Insert(value) => {
                    prop_assert_eq!(set.insert(value), model.insert(value));
                }
                SetAction::Contains(value) => {
                    prop_assert_eq!(set.contains(&value), model.contains(&value));
                }
                SetAction::Remove(value) => {
                    prop_assert_eq!(set.remove(&value), model.remove(&value));
                }
            }
            prop_assert_eq!(set.len(), model.len());
        }

        let mut seen: Vec<u8> = set.iter().copied().collect();
        let mut expected: Vec<u8> = model.iter().copied().collect();
        seen.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn unique_inserts_are_all_found(keys in prop::collection::hash_set(any::<u64>(), 0..128)) {
        let mut set = DenseSet::with_capacity_and_hasher(4, FixedSipBuilder).unwrap();
        for &key in &keys {
            prop_assert!(set.insert(key));
        }
        prop_assert_eq!(set.len(), keys.len());
        for &key in &keys {
            prop_assert!(set.contains(&key));
        }
        prop_assert_eq!(set.iter().count(), keys.len());
    }

    #[test]
    fn erasing_everything_in_any_order_empties_the_set(
        keys in prop::collection::hash_set(any::<u64>(), 0..128)
            .prop_map(|keys| keys.into_iter().collect::<Vec<_>>())
            .prop_shuffle(),
    ) {
        let mut set = DenseSet::with_capacity_and_hasher(4, FixedSipBuilder).unwrap();
        let mut insert_order = keys.clone();
        insert_order.sort_unstable();
        for &key in &insert_order {
            prop_assert!(set.insert(key));
        }
        for &key in &keys {
            prop_assert!(set.remove(&key));
        }
        prop_assert!(set.is_empty());
        prop_assert_eq!(set.iter().count(), 0);
    }
}
