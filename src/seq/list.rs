//! Doubly linked list over an index arena
//!
//! Links are indices into `links`, so unlinking an element never shifts the
//! others. Vacated link slots are recycled through `free`.

struct Link<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

pub(super) struct LinkedList<T> {
    links: Vec<Option<Link<T>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> LinkedList<T> {
    pub(super) fn new() -> Self {
        Self {
            links: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[inline]
    pub(super) fn len(&self) -> usize {
        self.len
    }

    pub(super) fn push_back(&mut self, value: T) {
        let link = Link {
            value,
            prev: self.tail,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.links[slot] = Some(link);
                slot
            }
            None => {
                self.links.push(Some(link));
                self.links.len() - 1
            }
        };

        match self.tail {
            Some(tail) => self.link_mut(tail).next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.len += 1;
    }

    pub(super) fn get(&self, index: usize) -> Option<&T> {
        let slot = self.slot_at(index)?;
        self.links[slot].as_ref().map(|l| &l.value)
    }

    pub(super) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let slot = self.slot_at(index)?;
        self.links[slot].as_mut().map(|l| &mut l.value)
    }

    /// Unlink the element at logical position `index`
    pub(super) fn remove(&mut self, index: usize) -> Option<T> {
        let slot = self.slot_at(index)?;
        let link = self.links[slot].take()?;

        match link.prev {
            Some(prev) => self.link_mut(prev).next = link.next,
            None => self.head = link.next,
        }
        match link.next {
            Some(next) => self.link_mut(next).prev = link.prev,
            None => self.tail = link.prev,
        }

        self.free.push(slot);
        self.len -= 1;
        Some(link.value)
    }

    pub(super) fn clear(&mut self) {
        self.links.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Move every element out in list order
    pub(super) fn drain_ordered(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            match self.links[slot].take() {
                Some(link) => {
                    cursor = link.next;
                    out.push(link.value);
                }
                None => break,
            }
        }
        self.clear();
        out
    }

    pub(super) fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    /// Physical slot of the element at logical `index`, walking from the
    /// nearer end
    fn slot_at(&self, index: usize) -> Option<usize> {
        if index >= self.len {
            return None;
        }

        if index <= self.len / 2 {
            let mut cursor = self.head;
            for _ in 0..index {
                cursor = self.links[cursor?].as_ref()?.next;
            }
            cursor
        } else {
            let mut cursor = self.tail;
            for _ in 0..(self.len - 1 - index) {
                cursor = self.links[cursor?].as_ref()?.prev;
            }
            cursor
        }
    }

    fn link_mut(&mut self, slot: usize) -> &mut Link<T> {
        match self.links[slot].as_mut() {
            Some(link) => link,
            None => unreachable!("linked slot {} is vacant", slot),
        }
    }
}

pub(super) struct Iter<'a, T> {
    list: &'a LinkedList<T>,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let slot = self.cursor?;
        let link = self.list.links[slot].as_ref()?;
        self.cursor = link.next;
        self.remaining -= 1;
        Some(&link.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
