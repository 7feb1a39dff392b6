//! Method dispatch - selector resolution along the ancestor chain
//!
//! Design: Resolution asks the leaf class's provider first, then each
//! ancestor up to the root. Successful results are memoized per
//! (class, selector) in a [`DispatchCache`]; the cache is cleared wholesale
//! whenever the class tree changes, so an entry can never outlive the
//! classes it was resolved through.

mod method;


pub use method::{MethodFn, MethodProvider, MethodTable, Value};

use crate::class::ClassRegistry;
use crate::config::RuntimeConfig;
use crate::error::DispatchError;
use crate::logging::{debug, log_cache_invalidated, log_method_resolved};
use crate::table::{mix32, TableKey, TagTable};
use crate::tag::{Selector, TypeTag};

/// Cache key: receiver class and selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchKey {
    pub class: TypeTag,
    pub selector: Selector,
}

impl TableKey for DispatchKey {
    #[inline]
    fn hash32(&self) -> u32 {
        self.class.raw() ^ mix32(self.selector.raw()).rotate_left(13)
    }
}

/// Outcome of a successful resolution
#[derive(Clone, Copy)]
pub struct ResolvedMethod {
    pub method: MethodFn,
    /// Class whose provider supplied `method`
    pub supplier: TypeTag,
}

impl core::fmt::Debug for ResolvedMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResolvedMethod")
            .field("method", &(self.method as *const ()))
            .field("supplier", &self.supplier)
            .finish()
    }
}

/// Dispatch statistics for monitoring and debugging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
}

impl DispatchStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Walk the ancestor chain of `class` without consulting any cache
pub fn resolve_uncached(
    registry: &ClassRegistry,
    class: TypeTag,
    selector: Selector,
) -> Result<ResolvedMethod, DispatchError> {
    let id = registry.id_of(class).ok_or(DispatchError::UnknownClass(class))?;

    registry
        .ancestors(id)
        .find_map(|node| {
            node.descriptor().own_method(selector).map(|method| ResolvedMethod {
                method,
                supplier: node.tag(),
            })
        })
        .ok_or(DispatchError::MethodNotFound { class, selector })
}

/// Memo of successful resolutions
pub struct DispatchCache {
    entries: TagTable<DispatchKey, ResolvedMethod>,
    stats: DispatchStats,
}

impl DispatchCache {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            entries: TagTable::new(config.dispatch_cache_buckets),
            stats: DispatchStats::default(),
        }
    }

    /// Cached resolution; misses walk the chain and remember the result
    pub fn resolve(
        &mut self,
        registry: &ClassRegistry,
        class: TypeTag,
        selector: Selector,
    ) -> Result<ResolvedMethod, DispatchError> {
        let key = DispatchKey { class, selector };
        if let Some(hit) = self.entries.find(&key) {
            self.stats.hits += 1;
            return Ok(*hit);
        }

        self.stats.misses += 1;
        let resolved = resolve_uncached(registry, class, selector)?;
        log_method_resolved(class, selector, resolved.supplier);

        if let Err(err) = self.entries.insert(key, resolved) {
            debug!(error = %err, "dispatch entry already cached");
        }
        Ok(resolved)
    }

    /// Drop every entry
    pub fn invalidate(&mut self) {
        let entries = self.entries.len();
        self.entries.clear();
        self.stats.invalidations += 1;
        log_cache_invalidated(entries);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Cached (class, selector) pairs with the class that supplied each
    pub fn entries(&self) -> impl Iterator<Item = (DispatchKey, TypeTag)> + '_ {
        self.entries.iter().map(|(k, r)| (*k, r.supplier))
    }
}

impl core::fmt::Debug for DispatchCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DispatchCache")
            .field("entries", &self.entries.len())
            .field("stats", &self.stats)
            .finish()
    }
}
