//! Four-character-code identifiers
//!
//! Classes and methods are named by 32-bit tags. Registrants conventionally
//! pack four printable ASCII characters (`b"Geom"`) so tags stay readable in
//! logs and debugger output.

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::table::TableKey;

/// Identifier of a registered class
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct TypeTag(u32);

impl TypeTag {
    /// Sentinel parent of the bootstrap root classes
    pub const NONE: TypeTag = TypeTag(0);

    /// Build a tag from four characters, first character in the high byte
    #[inline]
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(u32::from_be_bytes(*code))
    }

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Identifier of a behavior a class may implement
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Selector(u32);

impl Selector {
    #[inline]
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(u32::from_be_bytes(*code))
    }

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl TableKey for TypeTag {
    #[inline]
    fn hash32(&self) -> u32 {
        self.0
    }
}

impl TableKey for Selector {
    #[inline]
    fn hash32(&self) -> u32 {
        self.0
    }
}

/// Write `raw` as `'abcd'` when all four bytes are printable, hex otherwise
fn write_code(raw: u32, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let bytes = raw.to_be_bytes();
    if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        write!(f, "'")?;
        for b in bytes {
            write!(f, "{}", b as char)?;
        }
        write!(f, "'")
    } else {
        write!(f, "{:#010x}", raw)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_code(self.0, f)
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag(")?;
        write_code(self.0, f)?;
        write!(f, ")")
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_code(self.0, f)
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Selector(")?;
        write_code(self.0, f)?;
        write!(f, ")")
    }
}
