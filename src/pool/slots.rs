//! Typed slot pool with generational keys
//!
//! Values live in blocks of `block_len` entries. A key carries the generation
//! of the entry it was issued for, so a key kept past `remove` never resolves
//! to whatever value later reuses the entry.

use core::fmt;

/// Stable reference to a value stored in a [`SlotPool`]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    index: u32,
    generation: u32,
}

impl SlotKey {
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }

    /// Pack into a nonzero `u64` (generation high, index + 1 low)
    #[inline]
    pub fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64 + 1)
    }

    /// Inverse of [`SlotKey::to_bits`]; `None` for zero or malformed input
    #[inline]
    pub fn from_bits(bits: u64) -> Option<Self> {
        let low = (bits & 0xffff_ffff) as u32;
        if low == 0 {
            return None;
        }
        Some(Self {
            index: low - 1,
            generation: (bits >> 32) as u32,
        })
    }
}

impl fmt::Debug for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

struct Entry<T> {
    generation: u32,
    value: Option<T>,
}

/// Block-allocated pool of `T` values addressed by [`SlotKey`]
pub struct SlotPool<T> {
    blocks: Vec<Vec<Entry<T>>>,
    block_len: usize,
    free: Vec<u32>,
    live: usize,
}

impl<T> SlotPool<T> {
    /// Create an empty pool growing `block_len` entries at a time
    pub fn new(block_len: usize) -> Self {
        Self {
            blocks: Vec::new(),
            block_len: block_len.max(1),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Store `value`, reusing a freed entry when one is available
    pub fn insert(&mut self, value: T) -> SlotKey {
        self.live += 1;

        if let Some(index) = self.free.pop() {
            let entry = self.entry_mut(index);
            debug_assert!(entry.value.is_none());
            entry.value = Some(value);
            return SlotKey {
                index,
                generation: entry.generation,
            };
        }

        let needs_block = self
            .blocks
            .last()
            .map_or(true, |block| block.len() == self.block_len);
        if needs_block {
            self.blocks.push(Vec::with_capacity(self.block_len));
        }

        let block_count = self.blocks.len();
        let block = &mut self.blocks[block_count - 1];
        let index = ((block_count - 1) * self.block_len + block.len()) as u32;
        block.push(Entry {
            generation: 0,
            value: Some(value),
        });
        SlotKey { index, generation: 0 }
    }

    pub fn get(&self, key: SlotKey) -> Option<&T> {
        let entry = self.locate(key.index)?;
        if entry.generation != key.generation {
            return None;
        }
        entry.value.as_ref()
    }

    pub fn get_mut(&mut self, key: SlotKey) -> Option<&mut T> {
        let (block, offset) = self.split(key.index);
        let entry = self.blocks.get_mut(block)?.get_mut(offset)?;
        if entry.generation != key.generation {
            return None;
        }
        entry.value.as_mut()
    }

    #[inline]
    pub fn contains(&self, key: SlotKey) -> bool {
        self.get(key).is_some()
    }

    /// Take the value out and retire `key`
    pub fn remove(&mut self, key: SlotKey) -> Option<T> {
        let (block, offset) = self.split(key.index);
        let entry = self.blocks.get_mut(block)?.get_mut(offset)?;
        if entry.generation != key.generation {
            return None;
        }
        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(key.index);
        self.live -= 1;
        Some(value)
    }

    /// Remove every value, retiring all outstanding keys
    pub fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.live);
        let block_len = self.block_len;
        for (b, block) in self.blocks.iter_mut().enumerate() {
            for (o, entry) in block.iter_mut().enumerate() {
                if let Some(value) = entry.value.take() {
                    entry.generation = entry.generation.wrapping_add(1);
                    self.free.push((b * block_len + o) as u32);
                    out.push(value);
                }
            }
        }
        self.live = 0;
        out
    }

    /// Live values
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Entries reserved across all blocks
    pub fn capacity(&self) -> usize {
        self.blocks.len() * self.block_len
    }

    #[inline]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotKey, &T)> + '_ {
        let block_len = self.block_len;
        self.blocks.iter().enumerate().flat_map(move |(b, block)| {
            block.iter().enumerate().filter_map(move |(o, entry)| {
                entry.value.as_ref().map(|value| {
                    let key = SlotKey {
                        index: (b * block_len + o) as u32,
                        generation: entry.generation,
                    };
                    (key, value)
                })
            })
        })
    }

    #[inline]
    fn split(&self, index: u32) -> (usize, usize) {
        let index = index as usize;
        (index / self.block_len, index % self.block_len)
    }

    fn locate(&self, index: u32) -> Option<&Entry<T>> {
        let (block, offset) = self.split(index);
        self.blocks.get(block)?.get(offset)
    }

    fn entry_mut(&mut self, index: u32) -> &mut Entry<T> {
        let (block, offset) = self.split(index);
        &mut self.blocks[block][offset]
    }
}

impl<T> fmt::Debug for SlotPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotPool")
            .field("live", &self.live)
            .field("blocks", &self.blocks.len())
            .field("block_len", &self.block_len)
            .finish()
    }
}
