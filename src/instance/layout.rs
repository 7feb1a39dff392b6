//! Instance layout - per-class offset table over a contiguous data block
//!
//! Slots are packed root to leaf with no padding: a chain with slot sizes
//! 4, 8 and 0 yields offsets 0, 4 and 12 in a 12-byte block. The table is
//! computed once at class registration and shared by every instance.

use core::ops::Range;

use crate::seq::Seq;
use crate::tag::TypeTag;

/// Region of an instance block owned by one ancestor class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSpan {
    pub class: TypeTag,
    pub offset: usize,
    pub size: usize,
}

impl SlotSpan {
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.size
    }
}

/// Offset table of one leaf class
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceLayout {
    spans: Seq<SlotSpan>,
    total: usize,
}

impl InstanceLayout {
    /// Layout of a class without ancestors
    pub fn root(class: TypeTag, size: usize) -> Self {
        let spans: Seq<SlotSpan> = core::iter::once(SlotSpan {
            class,
            offset: 0,
            size,
        })
        .collect();
        Self { spans, total: size }
    }

    /// Layout of a direct subclass: this layout plus one trailing slot
    ///
    /// `None` when the block would no longer fit in `usize`.
    pub fn extend(&self, class: TypeTag, size: usize) -> Option<Self> {
        let total = self.total.checked_add(size)?;
        let mut spans: Seq<SlotSpan> = self.spans.iter().copied().collect();
        spans.push(SlotSpan {
            class,
            offset: self.total,
            size,
        });
        Some(Self { spans, total })
    }

    /// Bytes of the whole instance block
    #[inline]
    pub fn total_size(&self) -> usize {
        self.total
    }

    /// Number of classes in the chain, root and leaf included
    #[inline]
    pub fn levels(&self) -> usize {
        self.spans.len()
    }

    pub fn span(&self, class: TypeTag) -> Option<SlotSpan> {
        self.spans.iter().find(|s| s.class == class).copied()
    }

    /// Spans in root-to-leaf order
    pub fn spans(&self) -> impl Iterator<Item = &SlotSpan> + '_ {
        self.spans.iter()
    }

    pub fn leaf(&self) -> Option<TypeTag> {
        self.spans.get(self.spans.len().checked_sub(1)?).map(|s| s.class)
    }
}
