//! Object instances - reference-counted records over pooled data blocks
//!
//! Design: An instance is a small record (class, layout, refcount) kept in a
//! generational [`SlotPool`], plus one zeroed data block holding every
//! ancestor's slot back to back. Data blocks come from one [`RawPool`] per
//! block size, created on first use; oversized blocks go straight to the
//! global allocator and zero-size instances own no block at all.

mod layout;

#[cfg(test)]
mod tests;

pub use layout::{InstanceLayout, SlotSpan};

use core::fmt;
use core::ptr::NonNull;
use std::alloc::{self, Layout};
use std::sync::Arc;

use crate::class::ClassId;
use crate::config::RuntimeConfig;
use crate::error::{InstanceError, PoolError};
use crate::logging::{log_instance_created, log_instance_destroyed, warn};
use crate::pool::{PoolStats, RawPool, SlotKey, SlotPool};
use crate::table::TagTable;
use crate::tag::TypeTag;

/// Opaque reference to a live object
///
/// Handles are generational: once the object is destroyed, the handle never
/// resolves again, even after its record is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(SlotKey);

impl ObjectHandle {
    /// Nonzero encoding for crossing a C boundary
    #[inline]
    pub fn to_bits(self) -> u64 {
        self.0.to_bits()
    }

    #[inline]
    pub fn from_bits(bits: u64) -> Option<Self> {
        SlotKey::from_bits(bits).map(Self)
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj{}", self.0)
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Backing storage of one instance
enum DataBlock {
    Empty,
    Pooled(NonNull<u8>),
    Heap(NonNull<u8>, Layout),
}

// Blocks are owned by exactly one record and only touched through it
unsafe impl Send for DataBlock {}

pub(crate) struct Instance {
    class: ClassId,
    tag: TypeTag,
    layout: Arc<InstanceLayout>,
    block: DataBlock,
    ref_count: u32,
}

impl Instance {
    #[inline]
    pub(crate) fn class(&self) -> ClassId {
        self.class
    }

    #[inline]
    pub(crate) fn tag(&self) -> TypeTag {
        self.tag
    }

    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.layout.total_size()
    }

    fn bytes(&self) -> &[u8] {
        match self.block {
            DataBlock::Empty => &[],
            // SAFETY: the block holds `size()` initialized bytes for as long
            // as the record owns it
            DataBlock::Pooled(ptr) | DataBlock::Heap(ptr, _) => unsafe {
                core::slice::from_raw_parts(ptr.as_ptr(), self.size())
            },
        }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        match self.block {
            DataBlock::Empty => &mut [],
            // SAFETY: as in `bytes`; `&mut self` makes the access exclusive
            DataBlock::Pooled(ptr) | DataBlock::Heap(ptr, _) => unsafe {
                core::slice::from_raw_parts_mut(ptr.as_ptr(), self.size())
            },
        }
    }

    pub(crate) fn slot(&self, ancestor: TypeTag) -> Result<&[u8], InstanceError> {
        let span = self.span_of(ancestor)?;
        Ok(&self.bytes()[span.range()])
    }

    pub(crate) fn slot_mut(&mut self, ancestor: TypeTag) -> Result<&mut [u8], InstanceError> {
        let span = self.span_of(ancestor)?;
        Ok(&mut self.bytes_mut()[span.range()])
    }

    fn span_of(&self, ancestor: TypeTag) -> Result<SlotSpan, InstanceError> {
        self.layout.span(ancestor).ok_or(InstanceError::NotAnAncestor {
            class: self.tag,
            ancestor,
        })
    }
}

/// Result of dropping one reference
pub(crate) enum Release {
    /// Object still referenced; remaining count
    Retained(u32),
    /// Last reference gone; the record is detached and awaits teardown
    Destroyed(Instance),
}

/// Instance statistics for monitoring and debugging
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceStats {
    pub live: usize,
    pub created: u64,
    pub destroyed: u64,
    pub heap_blocks: usize,
    pub pools: Vec<PoolStats>,
}

/// Owner of every live instance and its data block
pub struct InstanceStore {
    records: SlotPool<Instance>,
    pools: TagTable<usize, RawPool>,
    block_len: usize,
    max_pooled: usize,
    align: usize,
    created: u64,
    destroyed: u64,
    heap_blocks: usize,
}

impl InstanceStore {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            records: SlotPool::new(config.record_block_len),
            pools: TagTable::new(17),
            block_len: config.instance_block_len,
            max_pooled: config.max_pooled_instance_size,
            align: config.instance_align,
            created: 0,
            destroyed: 0,
            heap_blocks: 0,
        }
    }

    /// New zeroed instance with one reference; allocates nothing on failure
    pub(crate) fn create(
        &mut self,
        class: ClassId,
        tag: TypeTag,
        layout: Arc<InstanceLayout>,
    ) -> Result<ObjectHandle, InstanceError> {
        let size = layout.total_size();
        let block = self.allocate_block(size)?;

        let key = self.records.insert(Instance {
            class,
            tag,
            layout,
            block,
            ref_count: 1,
        });
        self.created += 1;
        log_instance_created(tag, size);
        Ok(ObjectHandle(key))
    }

    fn allocate_block(&mut self, size: usize) -> Result<DataBlock, PoolError> {
        if size == 0 {
            return Ok(DataBlock::Empty);
        }

        if size <= self.max_pooled {
            if !self.pools.contains(&size) {
                let pool = RawPool::new(size, self.align, self.block_len)?;
                self.pools.insert(size, pool).ok();
            }
            let pool = self
                .pools
                .find_mut(&size)
                .ok_or(PoolError::OutOfMemory { bytes: size })?;
            debug_assert_eq!(pool.slot_size(), size);
            return pool.allocate().map(DataBlock::Pooled);
        }

        let layout = Layout::from_size_align(size, self.align).map_err(|_| PoolError::InvalidLayout {
            size,
            align: self.align,
            block_len: 1,
        })?;
        // SAFETY: layout has nonzero size
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr).ok_or(PoolError::OutOfMemory { bytes: size })?;
        self.heap_blocks += 1;
        Ok(DataBlock::Heap(ptr, layout))
    }

    fn free_block(&mut self, block: DataBlock, size: usize) {
        match block {
            DataBlock::Empty => {}
            DataBlock::Pooled(ptr) => match self.pools.find_mut(&size) {
                // SAFETY: the block came from this pool and its record is gone
                Some(pool) => unsafe { pool.free(ptr) },
                None => warn!(size, "pooled block has no pool; leaking it"),
            },
            DataBlock::Heap(ptr, layout) => {
                // SAFETY: allocated in `allocate_block` with this layout
                unsafe { alloc::dealloc(ptr.as_ptr(), layout) };
                self.heap_blocks -= 1;
            }
        }
    }

    /// Add a reference; returns the new count
    pub fn retain(&mut self, handle: ObjectHandle) -> Result<u32, InstanceError> {
        let record = self
            .records
            .get_mut(handle.0)
            .ok_or(InstanceError::InvalidHandle(handle))?;
        record.ref_count = record
            .ref_count
            .checked_add(1)
            .ok_or(InstanceError::RefCountOverflow(handle))?;
        Ok(record.ref_count)
    }

    /// Drop a reference; on the last one the record is detached and returned
    /// so the caller can run teardown before [`InstanceStore::reclaim`]
    pub(crate) fn release(&mut self, handle: ObjectHandle) -> Result<Release, InstanceError> {
        let record = self
            .records
            .get_mut(handle.0)
            .ok_or(InstanceError::DoubleRelease(handle))?;

        record.ref_count -= 1;
        if record.ref_count > 0 {
            return Ok(Release::Retained(record.ref_count));
        }

        self.records
            .remove(handle.0)
            .map(Release::Destroyed)
            .ok_or(InstanceError::DoubleRelease(handle))
    }

    /// Return a detached instance's block to its pool
    pub(crate) fn reclaim(&mut self, instance: Instance) {
        let size = instance.size();
        log_instance_destroyed(instance.tag, size);
        self.free_block(instance.block, size);
        self.destroyed += 1;
    }

    /// Free every live instance without teardown; returns how many there were
    pub(crate) fn drain(&mut self) -> usize {
        let leaked = self.records.drain();
        let count = leaked.len();
        for instance in leaked {
            self.reclaim(instance);
        }
        count
    }

    pub(crate) fn get(&self, handle: ObjectHandle) -> Result<&Instance, InstanceError> {
        self.records
            .get(handle.0)
            .ok_or(InstanceError::InvalidHandle(handle))
    }

    pub(crate) fn get_mut(&mut self, handle: ObjectHandle) -> Result<&mut Instance, InstanceError> {
        self.records
            .get_mut(handle.0)
            .ok_or(InstanceError::InvalidHandle(handle))
    }

    #[inline]
    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.records.contains(handle.0)
    }

    pub fn ref_count(&self, handle: ObjectHandle) -> Result<u32, InstanceError> {
        self.get(handle).map(|r| r.ref_count)
    }

    /// Leaf class of a live object
    pub fn class_of(&self, handle: ObjectHandle) -> Result<TypeTag, InstanceError> {
        self.get(handle).map(Instance::tag)
    }

    /// Bytes owned by `ancestor` inside the object's block
    pub fn slot(&self, handle: ObjectHandle, ancestor: TypeTag) -> Result<&[u8], InstanceError> {
        self.get(handle)?.slot(ancestor)
    }

    pub fn slot_mut(&mut self, handle: ObjectHandle, ancestor: TypeTag) -> Result<&mut [u8], InstanceError> {
        self.get_mut(handle)?.slot_mut(ancestor)
    }

    /// The whole data block, root slot first
    pub fn data(&self, handle: ObjectHandle) -> Result<&[u8], InstanceError> {
        self.get(handle).map(Instance::bytes)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = ObjectHandle> + '_ {
        self.records.iter().map(|(key, _)| ObjectHandle(key))
    }

    pub fn stats(&self) -> InstanceStats {
        let mut pools: Vec<PoolStats> = self.pools.values().map(RawPool::stats).collect();
        pools.sort_by_key(|p| p.slot_size);
        InstanceStats {
            live: self.records.len(),
            created: self.created,
            destroyed: self.destroyed,
            heap_blocks: self.heap_blocks,
            pools,
        }
    }
}

impl Drop for InstanceStore {
    fn drop(&mut self) {
        let leaked = self.drain();
        if leaked > 0 {
            warn!(leaked, "instance store dropped with live instances");
        }
    }
}

impl fmt::Debug for InstanceStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceStore")
            .field("live", &self.records.len())
            .field("size_classes", &self.pools.len())
            .finish()
    }
}
