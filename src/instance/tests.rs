use super::*;
use crate::class::{roots, ClassRegistry};

const BASE: TypeTag = TypeTag::new(b"Base");
const MID: TypeTag = TypeTag::new(b"Mid ");
const LEAF: TypeTag = TypeTag::new(b"Leaf");

struct Fixture {
    store: InstanceStore,
    class: ClassId,
    layout: Arc<InstanceLayout>,
}

fn fixture_with(config: RuntimeConfig, sizes: [usize; 3]) -> Fixture {
    let registry = ClassRegistry::new(&config);
    let class = registry.id_of(roots::OBJECT).expect("object root");
    let layout = InstanceLayout::root(BASE, sizes[0])
        .extend(MID, sizes[1])
        .and_then(|layout| layout.extend(LEAF, sizes[2]))
        .expect("layout");
    Fixture {
        store: InstanceStore::new(&config),
        class,
        layout: Arc::new(layout),
    }
}

fn fixture() -> Fixture {
    fixture_with(RuntimeConfig::default(), [4, 8, 0])
}

impl Fixture {
    fn create(&mut self) -> ObjectHandle {
        self.store
            .create(self.class, LEAF, Arc::clone(&self.layout))
            .expect("create")
    }

    fn release_fully(&mut self, handle: ObjectHandle) {
        loop {
            match self.store.release(handle).expect("release") {
                Release::Retained(_) => continue,
                Release::Destroyed(instance) => {
                    self.store.reclaim(instance);
                    break;
                }
            }
        }
    }
}

// ===== Layout and slots =====

#[test]
fn slots_are_disjoint_and_zeroed() {
    let mut fx = fixture();
    let handle = fx.create();

    assert_eq!(fx.store.data(handle).expect("data").len(), 12);
    assert_eq!(fx.store.slot(handle, BASE).expect("base"), &[0u8; 4]);
    assert_eq!(fx.store.slot(handle, MID).expect("mid"), &[0u8; 8]);
    assert!(fx.store.slot(handle, LEAF).expect("leaf").is_empty());

    fx.store.slot_mut(handle, BASE).expect("base").fill(0xAA);
    fx.store.slot_mut(handle, MID).expect("mid").fill(0x55);

    let data = fx.store.data(handle).expect("data");
    assert_eq!(&data[..4], &[0xAA; 4]);
    assert_eq!(&data[4..], &[0x55; 8]);
}

#[test]
fn foreign_slot_is_not_an_ancestor() {
    let mut fx = fixture();
    let handle = fx.create();
    let stranger = TypeTag::new(b"Strg");

    assert_eq!(
        fx.store.slot(handle, stranger).unwrap_err(),
        InstanceError::NotAnAncestor {
            class: LEAF,
            ancestor: stranger
        }
    );
}

#[test]
fn reused_block_is_zeroed_again() {
    let mut fx = fixture();
    let first = fx.create();
    fx.store.slot_mut(first, MID).expect("mid").fill(0xFF);
    fx.release_fully(first);

    let second = fx.create();
    assert!(fx.store.data(second).expect("data").iter().all(|b| *b == 0));
}

#[test]
fn zero_size_instances_own_no_block() {
    let mut fx = fixture_with(RuntimeConfig::default(), [0, 0, 0]);
    let handle = fx.create();

    assert!(fx.store.data(handle).expect("data").is_empty());
    assert!(fx.store.slot(handle, MID).expect("mid").is_empty());
    assert!(fx.store.stats().pools.is_empty());
}

#[test]
fn large_instances_bypass_pools() {
    let config = RuntimeConfig {
        max_pooled_instance_size: 8,
        ..RuntimeConfig::default()
    };
    let mut fx = fixture_with(config, [16, 16, 0]);
    let handle = fx.create();

    assert_eq!(fx.store.stats().heap_blocks, 1);
    assert!(fx.store.stats().pools.is_empty());
    assert_eq!(fx.store.data(handle).expect("data").as_ptr() as usize % 16, 0);

    fx.release_fully(handle);
    assert_eq!(fx.store.stats().heap_blocks, 0);
}

#[cfg(target_pointer_width = "64")]
#[test]
fn pools_are_keyed_by_full_size() {
    let mut fx = fixture_with(RuntimeConfig::default(), [4, 0, 0]);
    let handle = fx.create();

    let wide = 4 + (1usize << 32);
    assert_eq!(fx.store.pools.find(&4).map(RawPool::slot_size), Some(4));
    assert!(fx.store.pools.find(&wide).is_none());
    assert_eq!(fx.store.data(handle).expect("data").len(), 4);
}

#[test]
fn blocks_are_aligned() {
    let mut fx = fixture();
    for _ in 0..10 {
        let handle = fx.create();
        let ptr = fx.store.data(handle).expect("data").as_ptr();
        assert_eq!(ptr as usize % 16, 0);
    }
}

// ===== Reference counting =====

#[test]
fn retain_release_counts() {
    let mut fx = fixture();
    let handle = fx.create();
    assert_eq!(fx.store.ref_count(handle), Ok(1));

    assert_eq!(fx.store.retain(handle), Ok(2));
    assert_eq!(fx.store.retain(handle), Ok(3));
    assert!(matches!(fx.store.release(handle), Ok(Release::Retained(2))));
    assert!(matches!(fx.store.release(handle), Ok(Release::Retained(1))));
    assert!(fx.store.contains(handle));

    match fx.store.release(handle).expect("last release") {
        Release::Destroyed(instance) => fx.store.reclaim(instance),
        Release::Retained(n) => panic!("still retained with {n}"),
    }

    assert!(!fx.store.contains(handle));
    assert!(matches!(fx.store.release(handle), Err(InstanceError::DoubleRelease(h)) if h == handle));
    assert_eq!(fx.store.retain(handle), Err(InstanceError::InvalidHandle(handle)));
}

#[test]
fn stale_handle_does_not_alias_reused_record() {
    let mut fx = fixture();
    let old = fx.create();
    fx.release_fully(old);
    let new = fx.create();

    assert_ne!(old, new);
    assert_eq!(fx.store.ref_count(old), Err(InstanceError::InvalidHandle(old)));
    assert_eq!(fx.store.ref_count(new), Ok(1));
}

#[test]
fn handle_bits_round_trip() {
    let mut fx = fixture();
    let handle = fx.create();
    let bits = handle.to_bits();

    assert_ne!(bits, 0);
    assert_eq!(ObjectHandle::from_bits(bits), Some(handle));
    assert_eq!(ObjectHandle::from_bits(0), None);
}

// ===== Accounting =====

#[test]
fn stats_track_lifecycle() {
    let mut fx = fixture();
    let a = fx.create();
    let _b = fx.create();
    fx.release_fully(a);

    let stats = fx.store.stats();
    assert_eq!(stats.live, 1);
    assert_eq!(stats.created, 2);
    assert_eq!(stats.destroyed, 1);
    assert_eq!(stats.pools.len(), 1);
    assert_eq!(stats.pools[0].slot_size, 12);
    assert_eq!(stats.pools[0].live, 1);
}

#[test]
fn drain_frees_everything() {
    let mut fx = fixture();
    for _ in 0..5 {
        fx.create();
    }
    assert_eq!(fx.store.drain(), 5);
    assert!(fx.store.is_empty());
    assert_eq!(fx.store.stats().pools[0].live, 0);
    assert_eq!(fx.store.handles().count(), 0);
}
