//! Class hierarchy - runtime-registered classes with single inheritance
//!
//! Design: Every class is a node in a tree rooted at one of the bootstrap
//! roots. Nodes live in a generational slot pool; a [`TagTable`] maps type
//! tags to node ids, and each node keeps its children in an array-form
//! [`Seq`]. Layouts are computed once at registration and shared by every
//! instance of the class.
//!
//! [`TagTable`]: crate::table::TagTable
//! [`Seq`]: crate::seq::Seq

mod descriptor;
mod node;
mod registry;


pub use descriptor::{ClassDescriptor, TeardownFn};
pub use node::{ClassId, ClassNode};
pub use registry::{Ancestors, ClassRegistry};

/// Root classes present before any registrant runs
pub mod roots {
    use crate::tag::TypeTag;

    /// Base of ordinary objects
    pub const OBJECT: TypeTag = TypeTag::new(b"obj ");

    /// Base of scene elements
    pub const ELEMENT: TypeTag = TypeTag::new(b"elmt");

    pub(crate) const BOOTSTRAP: [(TypeTag, &str); 2] = [(OBJECT, "Object"), (ELEMENT, "Element")];
}
