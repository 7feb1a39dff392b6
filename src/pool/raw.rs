//! Byte-slot pool - fixed-size zeroed slots carved from large blocks
//!
//! Design: Blocks of `block_len` slots are acquired from the global allocator
//! and never returned until the pool is dropped. Freed slots go onto a free list
//! and are re-zeroed when handed out again.

use core::ptr::NonNull;
use std::alloc::{alloc_zeroed, dealloc, Layout};

use crate::error::PoolError;
use crate::logging::{log_pool_grow, warn};

use super::PoolStats;

/// One block of slots acquired from the global allocator
struct Block {
    start: NonNull<u8>,
    layout: Layout,
}

impl Block {
    fn new(layout: Layout) -> Result<Self, PoolError> {
        // SAFETY: layout size is nonzero (checked by RawPool::new)
        let start = unsafe { alloc_zeroed(layout) };
        let start = NonNull::new(start).ok_or(PoolError::OutOfMemory {
            bytes: layout.size(),
        })?;
        Ok(Self { start, layout })
    }

    #[inline]
    fn contains(&self, ptr: *const u8) -> bool {
        let start = self.start.as_ptr() as usize;
        let addr = ptr as usize;
        addr >= start && addr < start + self.layout.size()
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        // SAFETY: start was produced by alloc_zeroed with this exact layout
        unsafe {
            dealloc(self.start.as_ptr(), self.layout);
        }
    }
}

/// Pool of fixed-size byte slots
pub struct RawPool {
    slot_size: usize,
    stride: usize,
    align: usize,
    block_len: usize,
    blocks: Vec<Block>,
    /// Slots of the newest block not yet handed out
    bump: usize,
    free: Vec<NonNull<u8>>,
    live: usize,
}

// Blocks are owned exclusively by the pool; raw pointers never alias another pool.
unsafe impl Send for RawPool {}

impl RawPool {
    /// Create a pool of `slot_size`-byte slots aligned to `align`, growing
    /// `block_len` slots at a time. No memory is acquired until first use.
    pub fn new(slot_size: usize, align: usize, block_len: usize) -> Result<Self, PoolError> {
        let invalid = PoolError::InvalidLayout {
            size: slot_size,
            align,
            block_len,
        };
        if slot_size == 0 || block_len == 0 || !align.is_power_of_two() {
            return Err(invalid);
        }

        let stride = slot_size
            .checked_add(align - 1)
            .map(|s| s & !(align - 1))
            .ok_or_else(|| invalid.clone())?;
        stride.checked_mul(block_len).ok_or(invalid)?;

        Ok(Self {
            slot_size,
            stride,
            align,
            block_len,
            blocks: Vec::new(),
            bump: 0,
            free: Vec::new(),
            live: 0,
        })
    }

    /// Hand out a zeroed slot
    pub fn allocate(&mut self) -> Result<NonNull<u8>, PoolError> {
        if let Some(ptr) = self.free.pop() {
            // SAFETY: ptr is a slot of one of our blocks, stride >= slot_size
            unsafe {
                core::ptr::write_bytes(ptr.as_ptr(), 0, self.slot_size);
            }
            self.live += 1;
            return Ok(ptr);
        }

        if self.blocks.is_empty() || self.bump == self.block_len {
            self.grow()?;
        }

        let block = self.blocks.last().ok_or(PoolError::OutOfMemory {
            bytes: self.stride * self.block_len,
        })?;
        // SAFETY: bump < block_len so the offset stays within the block
        let ptr = unsafe { NonNull::new_unchecked(block.start.as_ptr().add(self.bump * self.stride)) };
        self.bump += 1;
        self.live += 1;
        Ok(ptr)
    }

    /// Return a slot to the free list
    ///
    /// # Safety
    /// `ptr` must have come from `allocate` on this pool and must not be used
    /// again by the caller. The pool does no liveness tracking of its own.
    pub unsafe fn free(&mut self, ptr: NonNull<u8>) {
        debug_assert!(self.owns(ptr.as_ptr()), "slot does not belong to this pool");
        debug_assert!(self.live > 0, "free on an empty pool");
        self.free.push(ptr);
        self.live -= 1;
    }

    /// Check whether `ptr` points into one of this pool's blocks
    pub fn owns(&self, ptr: *const u8) -> bool {
        self.blocks.iter().any(|b| b.contains(ptr))
    }

    #[inline]
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    #[inline]
    pub fn align(&self) -> usize {
        self.align
    }

    /// Slots currently handed out
    #[inline]
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            slot_size: self.slot_size,
            blocks: self.blocks.len(),
            capacity: self.blocks.len() * self.block_len,
            live: self.live,
            free: self.free.len(),
        }
    }

    #[cold]
    fn grow(&mut self) -> Result<(), PoolError> {
        let bytes = self.stride * self.block_len;
        let layout = Layout::from_size_align(bytes, self.align).map_err(|_| {
            PoolError::InvalidLayout {
                size: self.slot_size,
                align: self.align,
                block_len: self.block_len,
            }
        })?;

        let block = Block::new(layout)?;
        log_pool_grow(self.slot_size, self.blocks.len() + 1, bytes);
        self.blocks.push(block);
        self.bump = 0;
        Ok(())
    }
}

impl Drop for RawPool {
    fn drop(&mut self) {
        if self.live > 0 {
            warn!(
                event = "pool_destroyed_with_live_slots",
                slot_size = self.slot_size,
                live = self.live,
                "pool dropped while slots were still handed out"
            );
        }
        // Blocks release their memory via Drop
    }
}

impl core::fmt::Debug for RawPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RawPool")
            .field("slot_size", &self.slot_size)
            .field("stride", &self.stride)
            .field("blocks", &self.blocks.len())
            .field("live", &self.live)
            .finish()
    }
}
