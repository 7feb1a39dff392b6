//! Pool allocation - fixed-shape slots handed out from preallocated blocks
//!
//! Design: Two pools sharing one shape:
//! 1. `RawPool` hands out zeroed byte slots (per-instance data blocks)
//! 2. `SlotPool<T>` stores typed values under generational keys (class nodes,
//!    instance records)
//!
//! Both acquire memory `block_len` slots at a time, recycle freed slots through
//! a free list and only give memory back when the pool itself is dropped.

mod raw;
mod slots;

#[cfg(test)]
mod tests;

pub use raw::RawPool;
pub use slots::{SlotKey, SlotPool};

/// Pool statistics for monitoring and debugging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub slot_size: usize,
    pub blocks: usize,
    pub capacity: usize,
    pub live: usize,
    pub free: usize,
}
