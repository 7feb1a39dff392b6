//! Growable indexed container - array or linked list, convertible on demand
//!
//! Design: Callers pick the representation for the phase ahead:
//! 1. `Array` for random access and cheap iteration (class child lists,
//!    instance offset tables)
//! 2. `List` for frequent single-element insert/remove (hash table buckets)
//!
//! Conversions preserve element order and cost O(n).

mod list;

#[cfg(test)]
mod tests;

use core::fmt;
use list::LinkedList;

/// Current storage strategy of a [`Seq`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repr {
    Array,
    List,
}

enum Storage<T> {
    Array(Vec<T>),
    List(LinkedList<T>),
}

/// Sequence stored either contiguously or as a linked list
pub struct Seq<T> {
    storage: Storage<T>,
}

impl<T> Seq<T> {
    /// Empty sequence in array form
    pub fn new() -> Self {
        Self::array()
    }

    pub fn array() -> Self {
        Self {
            storage: Storage::Array(Vec::new()),
        }
    }

    pub fn list() -> Self {
        Self {
            storage: Storage::List(LinkedList::new()),
        }
    }

    pub fn with_repr(repr: Repr) -> Self {
        match repr {
            Repr::Array => Self::array(),
            Repr::List => Self::list(),
        }
    }

    #[inline]
    pub fn repr(&self) -> Repr {
        match self.storage {
            Storage::Array(_) => Repr::Array,
            Storage::List(_) => Repr::List,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Array(v) => v.len(),
            Storage::List(l) => l.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append at the end
    pub fn push(&mut self, value: T) {
        match &mut self.storage {
            Storage::Array(v) => v.push(value),
            Storage::List(l) => l.push_back(value),
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        match &self.storage {
            Storage::Array(v) => v.get(index),
            Storage::List(l) => l.get(index),
        }
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        match &mut self.storage {
            Storage::Array(v) => v.get_mut(index),
            Storage::List(l) => l.get_mut(index),
        }
    }

    /// Remove the element at `index`, keeping the order of the rest
    pub fn remove(&mut self, index: usize) -> Option<T> {
        match &mut self.storage {
            Storage::Array(v) if index < v.len() => Some(v.remove(index)),
            Storage::Array(_) => None,
            Storage::List(l) => l.remove(index),
        }
    }

    /// Remove the element at `index` without caring about the order of the
    /// rest. O(1) for arrays (last element moves into the gap).
    pub fn swap_remove(&mut self, index: usize) -> Option<T> {
        match &mut self.storage {
            Storage::Array(v) if index < v.len() => Some(v.swap_remove(index)),
            Storage::Array(_) => None,
            Storage::List(l) => l.remove(index),
        }
    }

    /// Position of the first element matching `pred`
    pub fn position<F>(&self, mut pred: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        self.iter().position(|item| pred(item))
    }

    pub fn clear(&mut self) {
        match &mut self.storage {
            Storage::Array(v) => v.clear(),
            Storage::List(l) => l.clear(),
        }
    }

    pub fn iter(&self) -> Iter<'_, T> {
        let inner = match &self.storage {
            Storage::Array(v) => IterInner::Array(v.iter()),
            Storage::List(l) => IterInner::List(l.iter()),
        };
        Iter { inner }
    }

    /// Convert to contiguous storage (no-op if already an array)
    pub fn make_array(&mut self) {
        if let Storage::List(l) = &mut self.storage {
            let items = l.drain_ordered();
            self.storage = Storage::Array(items);
        }
    }

    /// Convert to linked storage (no-op if already a list)
    pub fn make_list(&mut self) {
        if let Storage::Array(v) = &mut self.storage {
            let mut list = LinkedList::new();
            for item in v.drain(..) {
                list.push_back(item);
            }
            self.storage = Storage::List(list);
        }
    }

    /// Contiguous view, available in array form only
    pub fn as_slice(&self) -> Option<&[T]> {
        match &self.storage {
            Storage::Array(v) => Some(v.as_slice()),
            Storage::List(_) => None,
        }
    }

    /// Move the elements out in order
    pub fn into_vec(mut self) -> Vec<T> {
        match &mut self.storage {
            Storage::Array(v) => core::mem::take(v),
            Storage::List(l) => l.drain_ordered(),
        }
    }
}

impl<T> Default for Seq<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for Seq<T> {
    fn clone(&self) -> Self {
        let mut out = Self::with_repr(self.repr());
        out.extend(self.iter().cloned());
        out
    }
}

impl<T: fmt::Debug> fmt::Debug for Seq<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for Seq<T> {
    /// Element-wise; representation is not compared
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T> Extend<T> for Seq<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<T> FromIterator<T> for Seq<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            storage: Storage::Array(iter.into_iter().collect()),
        }
    }
}

impl<'a, T> IntoIterator for &'a Seq<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// Borrowing iterator over either representation
pub struct Iter<'a, T> {
    inner: IterInner<'a, T>,
}

enum IterInner<'a, T> {
    Array(core::slice::Iter<'a, T>),
    List(list::Iter<'a, T>),
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        match &mut self.inner {
            IterInner::Array(it) => it.next(),
            IterInner::List(it) => it.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            IterInner::Array(it) => it.size_hint(),
            IterInner::List(it) => it.size_hint(),
        }
    }
}
