//! Tag table - fixed-bucket chained hash table keyed by 32-bit tags
//!
//! Design: Population is bounded and dominated by start-up registration, so
//! the bucket count is fixed for the table's lifetime (no rehashing). Each
//! bucket is an unsorted [`Seq`] in list form, cheap to append to and to
//! unlink from.

#[cfg(test)]
mod tests;

use core::fmt;

use crate::error::TableError;
use crate::seq::Seq;

/// Key usable in a [`TagTable`]
pub trait TableKey: Copy + Eq {
    /// 32-bit value fed to the table's hash function
    fn hash32(&self) -> u32;
}

impl TableKey for u32 {
    #[inline]
    fn hash32(&self) -> u32 {
        *self
    }
}

impl TableKey for usize {
    /// High bits folded into the low word; equality still compares the full value
    #[inline]
    fn hash32(&self) -> u32 {
        let wide = *self as u64;
        (wide ^ (wide >> 32)) as u32
    }
}

/// Bucket hash over a key's 32-bit value
pub type HashFn = fn(u32) -> u32;

/// Default bucket hash (Fibonacci multiplicative mix)
///
/// Four-character codes share their high bytes often, so the low bits are
/// mixed with the high ones before the bucket modulus.
#[inline]
pub fn mix32(key: u32) -> u32 {
    let h = key.wrapping_mul(0x9E37_79B9);
    h ^ (h >> 16)
}

/// Hash table mapping tags to payloads
pub struct TagTable<K, V> {
    buckets: Vec<Seq<(K, V)>>,
    hash: HashFn,
    len: usize,
}

impl<K: TableKey, V> TagTable<K, V> {
    /// Table with `bucket_count` buckets (at least one) and the default hash
    pub fn new(bucket_count: usize) -> Self {
        Self::with_hasher(bucket_count, mix32)
    }

    pub fn with_hasher(bucket_count: usize, hash: HashFn) -> Self {
        let buckets = (0..bucket_count.max(1)).map(|_| Seq::list()).collect();
        Self {
            buckets,
            hash,
            len: 0,
        }
    }

    #[inline]
    fn bucket_of(&self, key: &K) -> usize {
        (self.hash)(key.hash32()) as usize % self.buckets.len()
    }

    /// Add `key`; fails with `DuplicateKey` if already present
    pub fn insert(&mut self, key: K, value: V) -> Result<(), TableError> {
        let b = self.bucket_of(&key);
        let bucket = &mut self.buckets[b];
        if bucket.position(|(k, _)| *k == key).is_some() {
            return Err(TableError::DuplicateKey(key.hash32()));
        }
        bucket.push((key, value));
        self.len += 1;
        Ok(())
    }

    pub fn find(&self, key: &K) -> Option<&V> {
        let bucket = &self.buckets[self.bucket_of(key)];
        bucket.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn find_mut(&mut self, key: &K) -> Option<&mut V> {
        let b = self.bucket_of(key);
        let bucket = &mut self.buckets[b];
        let pos = bucket.position(|(k, _)| k == key)?;
        bucket.get_mut(pos).map(|(_, v)| v)
    }

    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Remove `key`; fails with `NotFound` if absent. Bucket order is not
    /// preserved.
    pub fn remove(&mut self, key: &K) -> Result<V, TableError> {
        let b = self.bucket_of(key);
        let bucket = &mut self.buckets[b];
        let pos = bucket
            .position(|(k, _)| k == key)
            .ok_or(TableError::NotFound(key.hash32()))?;
        let (_, value) = bucket
            .swap_remove(pos)
            .ok_or(TableError::NotFound(key.hash32()))?;
        self.len -= 1;
        Ok(value)
    }

    /// Empty every bucket; the bucket count is kept
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.len = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Entries in the fullest bucket (collision diagnostics)
    pub fn longest_chain(&self) -> usize {
        self.buckets.iter().map(Seq::len).max().unwrap_or(0)
    }

    /// Visit every entry, bucket by bucket
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.iter().map(|(k, v)| (k, v)))
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.iter().map(|(k, _)| *k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }
}

impl<K: TableKey + fmt::Debug, V: fmt::Debug> fmt::Debug for TagTable<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
