use super::*;
use crate::tag::TypeTag;
use proptest::prelude::*;
use std::collections::HashMap;

/// Every key lands in the same bucket
fn collide(_: u32) -> u32 {
    7
}

#[test]
fn insert_find_remove() {
    let mut table = TagTable::new(13);
    table.insert(TypeTag::new(b"Geom"), "geometry").expect("insert");
    table.insert(TypeTag::new(b"Xfrm"), "transform").expect("insert");

    assert_eq!(table.len(), 2);
    assert_eq!(table.find(&TypeTag::new(b"Geom")), Some(&"geometry"));
    assert_eq!(table.find(&TypeTag::new(b"Shdr")), None);

    assert_eq!(table.remove(&TypeTag::new(b"Geom")), Ok("geometry"));
    assert!(!table.contains(&TypeTag::new(b"Geom")));
    assert_eq!(table.len(), 1);
}

#[cfg(target_pointer_width = "64")]
#[test]
fn wide_keys_differing_in_high_bits_stay_distinct() {
    let mut table = TagTable::new(3);
    let low = 4usize;
    let high = low + (1usize << 32);
    table.insert(low, "low").expect("insert");
    table.insert(high, "high").expect("insert");

    assert_eq!(table.find(&low), Some(&"low"));
    assert_eq!(table.find(&high), Some(&"high"));
    assert_eq!(table.remove(&high), Ok("high"));
    assert_eq!(table.find(&low), Some(&"low"));
}

#[test]
fn duplicate_insert_is_rejected_and_keeps_original() {
    let mut table = TagTable::new(5);
    table.insert(42u32, 'a').expect("insert");

    assert_eq!(table.insert(42u32, 'b'), Err(TableError::DuplicateKey(42)));
    assert_eq!(table.find(&42), Some(&'a'));
    assert_eq!(table.len(), 1);
}

#[test]
fn remove_missing_key_fails() {
    let mut table: TagTable<u32, ()> = TagTable::new(5);
    assert_eq!(table.remove(&9), Err(TableError::NotFound(9)));
}

#[test]
fn zero_buckets_is_clamped_to_one() {
    let mut table = TagTable::new(0);
    assert_eq!(table.bucket_count(), 1);
    table.insert(1u32, 1).expect("insert");
    table.insert(2u32, 2).expect("insert");
    assert_eq!(table.longest_chain(), 2);
}

#[test]
fn full_collisions_still_resolve() {
    let mut table = TagTable::with_hasher(31, collide);
    for key in 0u32..20 {
        table.insert(key, key * 2).expect("insert");
    }
    assert_eq!(table.longest_chain(), 20);

    table.remove(&5).expect("remove");
    table.remove(&0).expect("remove");
    for key in 0u32..20 {
        let expected = if key == 5 || key == 0 { None } else { Some(key * 2) };
        assert_eq!(table.find(&key).copied(), expected);
    }
}

#[test]
fn find_mut_updates_payload() {
    let mut table = TagTable::new(7);
    table.insert(3u32, vec![1]).expect("insert");
    table.find_mut(&3).expect("present").push(2);
    assert_eq!(table.find(&3), Some(&vec![1, 2]));
    assert!(table.find_mut(&4).is_none());
}

#[test]
fn clear_keeps_bucket_count() {
    let mut table = TagTable::new(11);
    for key in 0u32..30 {
        table.insert(key, ()).expect("insert");
    }
    table.clear();
    assert!(table.is_empty());
    assert_eq!(table.bucket_count(), 11);
    assert_eq!(table.iter().count(), 0);
    table.insert(1u32, ()).expect("insert after clear");
}

#[test]
fn iteration_visits_every_entry_once() {
    let mut table = TagTable::new(4);
    for key in 100u32..140 {
        table.insert(key, key + 1).expect("insert");
    }
    let mut keys: Vec<_> = table.keys().collect();
    keys.sort_unstable();
    assert_eq!(keys, (100..140).collect::<Vec<_>>());
    assert_eq!(table.values().count(), 40);
}

proptest! {
    #[test]
    fn matches_hashmap_model(ops in proptest::collection::vec((any::<bool>(), 0u32..64, any::<u8>()), 0..200)) {
        let mut table = TagTable::new(17);
        let mut model = HashMap::new();

        for (is_insert, key, value) in ops {
            if is_insert {
                let expected_dup = model.contains_key(&key);
                let result = table.insert(key, value);
                prop_assert_eq!(result.is_err(), expected_dup);
                model.entry(key).or_insert(value);
            } else {
                let expected = model.remove(&key);
                prop_assert_eq!(table.remove(&key).ok(), expected);
            }
        }

        prop_assert_eq!(table.len(), model.len());
        for (key, value) in &model {
            prop_assert_eq!(table.find(key), Some(value));
        }
    }
}
