//! Pool tests
//!
//! Organized by component:
//! - RawPool: layout validation, zeroing, block growth, free-list reuse
//! - SlotPool: generational keys, block growth, drain

use super::*;
use crate::error::PoolError;
use proptest::prelude::*;
use std::collections::HashSet;

// ===== RawPool =====

#[test]
fn raw_pool_rejects_degenerate_layouts() {
    assert!(matches!(
        RawPool::new(0, 8, 16),
        Err(PoolError::InvalidLayout { .. })
    ));
    assert!(matches!(
        RawPool::new(16, 8, 0),
        Err(PoolError::InvalidLayout { .. })
    ));
    assert!(matches!(
        RawPool::new(16, 3, 16),
        Err(PoolError::InvalidLayout { .. })
    ));
}

#[test]
fn raw_pool_starts_without_blocks() {
    let pool = RawPool::new(24, 8, 4).expect("pool");
    let stats = pool.stats();
    assert_eq!(stats.blocks, 0);
    assert_eq!(stats.capacity, 0);
    assert_eq!(stats.live, 0);
}

#[test]
fn raw_pool_slots_are_distinct_and_aligned() {
    let mut pool = RawPool::new(12, 16, 8).expect("pool");
    let mut seen = HashSet::new();

    for _ in 0..8 {
        let ptr = pool.allocate().expect("slot");
        assert_eq!(ptr.as_ptr() as usize % 16, 0);
        assert!(seen.insert(ptr.as_ptr() as usize));
    }

    assert_eq!(pool.stats().blocks, 1);
    assert_eq!(pool.live(), 8);
}

#[test]
fn raw_pool_grows_by_whole_blocks() {
    let mut pool = RawPool::new(8, 8, 4).expect("pool");
    for _ in 0..9 {
        pool.allocate().expect("slot");
    }

    let stats = pool.stats();
    assert_eq!(stats.blocks, 3);
    assert_eq!(stats.capacity, 12);
    assert_eq!(stats.live, 9);
}

#[test]
fn raw_pool_fresh_slots_are_zeroed() {
    let mut pool = RawPool::new(32, 8, 2).expect("pool");
    let ptr = pool.allocate().expect("slot");
    let bytes = unsafe { core::slice::from_raw_parts(ptr.as_ptr(), 32) };
    assert!(bytes.iter().all(|b| *b == 0));
}

#[test]
fn raw_pool_reuses_and_rezeroes_freed_slots() {
    let mut pool = RawPool::new(16, 8, 4).expect("pool");
    let ptr = pool.allocate().expect("slot");

    unsafe {
        core::ptr::write_bytes(ptr.as_ptr(), 0xAB, 16);
        pool.free(ptr);
    }
    assert_eq!(pool.live(), 0);
    assert_eq!(pool.stats().free, 1);

    let again = pool.allocate().expect("slot");
    assert_eq!(again, ptr);
    let bytes = unsafe { core::slice::from_raw_parts(again.as_ptr(), 16) };
    assert!(bytes.iter().all(|b| *b == 0));

    // Reuse never grows the pool
    assert_eq!(pool.stats().blocks, 1);
}

#[test]
fn raw_pool_owns_only_its_slots() {
    let mut a = RawPool::new(16, 8, 4).expect("pool");
    let mut b = RawPool::new(16, 8, 4).expect("pool");
    let pa = a.allocate().expect("slot");
    let pb = b.allocate().expect("slot");

    assert!(a.owns(pa.as_ptr()));
    assert!(!a.owns(pb.as_ptr()));
    assert!(b.owns(pb.as_ptr()));
}

proptest! {
    /// `Some(i)` frees the i-th live slot (mod the live count), `None` allocates
    #[test]
    fn raw_pool_never_hands_out_live_slot_twice(
        block_len in 1usize..6,
        ops in proptest::collection::vec(proptest::option::of(0usize..16), 0..96),
    ) {
        let mut pool = RawPool::new(8, 8, block_len).expect("pool");
        let mut live = Vec::new();
        let mut addrs = HashSet::new();

        for op in ops {
            match op {
                Some(i) if !live.is_empty() => {
                    let victim: core::ptr::NonNull<u8> = live.swap_remove(i % live.len());
                    addrs.remove(&(victim.as_ptr() as usize));
                    unsafe { pool.free(victim) };
                }
                _ => {
                    let ptr = pool.allocate().expect("slot");
                    prop_assert!(addrs.insert(ptr.as_ptr() as usize), "live slot handed out twice");
                    prop_assert!(pool.owns(ptr.as_ptr()));
                    live.push(ptr);
                }
            }
            prop_assert_eq!(pool.live(), live.len());
        }

        let stats = pool.stats();
        prop_assert_eq!(stats.capacity, stats.blocks * block_len);
        prop_assert!(stats.live <= stats.capacity);
    }
}

// ===== SlotPool =====

#[test]
fn slot_pool_insert_get_remove() {
    let mut pool = SlotPool::new(4);
    let a = pool.insert("a");
    let b = pool.insert("b");

    assert_eq!(pool.get(a), Some(&"a"));
    assert_eq!(pool.get(b), Some(&"b"));
    assert_eq!(pool.len(), 2);

    assert_eq!(pool.remove(a), Some("a"));
    assert_eq!(pool.get(a), None);
    assert_eq!(pool.remove(a), None);
    assert_eq!(pool.len(), 1);
}

#[test]
fn slot_pool_stale_key_misses_reused_entry() {
    let mut pool = SlotPool::new(4);
    let old = pool.insert(1u32);
    pool.remove(old);

    let new = pool.insert(2u32);
    assert_eq!(new.index(), old.index());
    assert_ne!(new.generation(), old.generation());
    assert_eq!(pool.get(old), None);
    assert_eq!(pool.get(new), Some(&2));
}

#[test]
fn slot_pool_grows_in_blocks() {
    let mut pool = SlotPool::new(3);
    let keys: Vec<_> = (0..7).map(|i| pool.insert(i)).collect();

    assert_eq!(pool.block_count(), 3);
    assert_eq!(pool.capacity(), 9);
    for (i, key) in keys.iter().enumerate() {
        assert_eq!(pool.get(*key), Some(&i));
    }
}

#[test]
fn slot_pool_get_mut_updates_in_place() {
    let mut pool = SlotPool::new(2);
    let key = pool.insert(String::from("node"));
    pool.get_mut(key).expect("live").push_str("-renamed");
    assert_eq!(pool.get(key).map(String::as_str), Some("node-renamed"));
}

#[test]
fn slot_pool_drain_retires_every_key() {
    let mut pool = SlotPool::new(2);
    let keys: Vec<_> = (0..5).map(|i| pool.insert(i)).collect();

    let mut drained = pool.drain();
    drained.sort();
    assert_eq!(drained, vec![0, 1, 2, 3, 4]);
    assert!(pool.is_empty());
    assert!(keys.iter().all(|k| !pool.contains(*k)));
}

#[test]
fn slot_pool_iter_reports_live_keys() {
    let mut pool = SlotPool::new(2);
    let a = pool.insert('a');
    let b = pool.insert('b');
    let c = pool.insert('c');
    pool.remove(b);

    let seen: Vec<_> = pool.iter().map(|(k, v)| (k, *v)).collect();
    assert_eq!(seen, vec![(a, 'a'), (c, 'c')]);
}

#[test]
fn slot_key_bits_round_trip_and_reject_zero() {
    let mut pool = SlotPool::new(2);
    let key = pool.insert(());
    let bits = key.to_bits();
    assert_ne!(bits, 0);
    assert_eq!(SlotKey::from_bits(bits), Some(key));
    assert_eq!(SlotKey::from_bits(0), None);
}
