//! Class node - one registered class and its place in the tree

use core::fmt;
use std::sync::Arc;

use super::descriptor::ClassDescriptor;
use crate::instance::InstanceLayout;
use crate::pool::SlotKey;
use crate::seq::Seq;
use crate::tag::TypeTag;

/// Stable id of a class node inside its registry
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) SlotKey);

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class{}", self.0)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug)]
pub struct ClassNode {
    pub(super) descriptor: ClassDescriptor,
    pub(super) parent: Option<ClassId>,
    pub(super) children: Seq<ClassId>,
    pub(super) depth: u32,
    pub(super) layout: Arc<InstanceLayout>,
    pub(super) own_instances: usize,
    pub(super) subtree_instances: usize,
}

impl ClassNode {
    pub(super) fn new(descriptor: ClassDescriptor, parent: Option<ClassId>, depth: u32, layout: InstanceLayout) -> Self {
        Self {
            descriptor,
            parent,
            children: Seq::array(),
            depth,
            layout: Arc::new(layout),
            own_instances: 0,
            subtree_instances: 0,
        }
    }

    #[inline]
    pub fn tag(&self) -> TypeTag {
        self.descriptor.tag()
    }

    /// Parent's tag; [`TypeTag::NONE`] for a root
    #[inline]
    pub fn parent_tag(&self) -> TypeTag {
        self.descriptor.parent()
    }

    #[inline]
    pub fn parent(&self) -> Option<ClassId> {
        self.parent
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    #[inline]
    pub fn descriptor(&self) -> &ClassDescriptor {
        &self.descriptor
    }

    /// Distance from the root (roots are at depth 0)
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Direct subclasses in registration order
    pub fn children(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.children.iter().copied()
    }

    #[inline]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Size of the class's own slot
    #[inline]
    pub fn instance_size(&self) -> usize {
        self.descriptor.instance_size()
    }

    /// Layout of a direct instance, shared with every live instance
    #[inline]
    pub fn layout(&self) -> &Arc<InstanceLayout> {
        &self.layout
    }

    /// Live instances whose class is exactly this one
    #[inline]
    pub fn instance_count(&self) -> usize {
        self.own_instances
    }

    /// Live instances of this class and all of its descendants
    #[inline]
    pub fn live_instances(&self) -> usize {
        self.subtree_instances
    }
}
