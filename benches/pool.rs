//! Pool benchmarks
//!
//! Compares pooled slot recycling with fresh global allocations, and the
//! full create/release cycle of runtime instances.

use classtree::pool::RawPool;
use classtree::{roots, ClassDescriptor, Runtime, TypeTag};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::alloc::{alloc_zeroed, dealloc, Layout};

fn bench_raw_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("alloc_free");

    for size in [16usize, 64, 256] {
        let mut pool = RawPool::new(size, 16, 64).expect("pool");
        group.bench_with_input(BenchmarkId::new("pool", size), &size, |b, _| {
            b.iter(|| {
                let ptr = pool.allocate().expect("allocate");
                // SAFETY: freed immediately after being handed out
                unsafe { pool.free(black_box(ptr)) };
            });
        });

        let layout = Layout::from_size_align(size, 16).expect("layout");
        group.bench_with_input(BenchmarkId::new("global", size), &size, |b, _| {
            b.iter(|| unsafe {
                let ptr = alloc_zeroed(layout);
                dealloc(black_box(ptr), layout);
            });
        });
    }

    group.finish();
}

fn bench_instance_cycle(c: &mut Criterion) {
    let mut rt = Runtime::with_defaults();
    let base = TypeTag::new(b"Base");
    let leaf = TypeTag::new(b"Leaf");
    rt.register_class(ClassDescriptor::new(base, roots::OBJECT, "Base").with_instance_size(16))
        .expect("Base");
    rt.register_class(ClassDescriptor::new(leaf, base, "Leaf").with_instance_size(48))
        .expect("Leaf");

    c.bench_function("create_release", |b| {
        b.iter(|| {
            let obj = rt.create_instance(black_box(leaf)).expect("create");
            rt.release(obj).expect("release");
        });
    });
}

criterion_group!(benches, bench_raw_pool, bench_instance_cycle);
criterion_main!(benches);
