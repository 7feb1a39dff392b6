//! Class registry - tag -> node table plus the parent/child tree

use core::fmt::Write as _;

use super::descriptor::ClassDescriptor;
use super::node::{ClassId, ClassNode};
use super::roots;
use crate::config::RuntimeConfig;
use crate::error::RegistrationError;
use crate::instance::InstanceLayout;
use crate::logging::{debug, log_class_registered, log_class_unregistered};
use crate::pool::SlotPool;
use crate::table::TagTable;
use crate::tag::TypeTag;

pub struct ClassRegistry {
    nodes: SlotPool<ClassNode>,
    by_tag: TagTable<TypeTag, ClassId>,
    roots: Vec<ClassId>,
}

impl ClassRegistry {
    /// Registry holding only the bootstrap roots
    pub fn new(config: &RuntimeConfig) -> Self {
        let mut registry = Self {
            nodes: SlotPool::new(config.node_block_len),
            by_tag: TagTable::new(config.class_table_buckets),
            roots: Vec::new(),
        };
        for (tag, name) in roots::BOOTSTRAP {
            let descriptor = ClassDescriptor::new(tag, TypeTag::NONE, name);
            let layout = InstanceLayout::root(tag, descriptor.instance_size());
            let id = registry.attach(descriptor, None, 0, layout);
            registry.roots.push(id);
        }
        registry
    }

    /// Link a node under `parent`; the tag must not be registered yet
    fn attach(
        &mut self,
        descriptor: ClassDescriptor,
        parent: Option<ClassId>,
        depth: u32,
        layout: InstanceLayout,
    ) -> ClassId {
        let tag = descriptor.tag();
        let id = ClassId(self.nodes.insert(ClassNode::new(descriptor, parent, depth, layout)));
        let inserted = self.by_tag.insert(tag, id);
        debug_assert!(inserted.is_ok(), "class {tag} attached twice");

        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(p.0)) {
            p.children.push(id);
        }
        id
    }

    /// Register a subclass of an already registered class
    pub fn register(&mut self, descriptor: ClassDescriptor) -> Result<ClassId, RegistrationError> {
        let tag = descriptor.tag();
        let parent_tag = descriptor.parent();

        if self.by_tag.contains(&tag) {
            return Err(RegistrationError::DuplicateType(tag));
        }

        // Only the bootstrap roots may be parentless
        let parent = self
            .id_of(parent_tag)
            .ok_or(RegistrationError::UnknownParent {
                tag,
                parent: parent_tag,
            })?;

        let size = descriptor.instance_size();
        let parent_node = self.nodes.get(parent.0).ok_or(RegistrationError::UnknownParent {
            tag,
            parent: parent_tag,
        })?;
        let depth = parent_node.depth + 1;
        let layout = parent_node
            .layout
            .extend(tag, size)
            .ok_or(RegistrationError::InstanceTooLarge { tag, size })?;

        let id = self.attach(descriptor, Some(parent), depth, layout);
        log_class_registered(tag, parent_tag, depth, size);
        Ok(id)
    }

    /// Remove a leaf class with no live instances, handing back its descriptor
    pub fn unregister(&mut self, tag: TypeTag) -> Result<ClassDescriptor, RegistrationError> {
        let id = self.id_of(tag).ok_or(RegistrationError::NotFound(tag))?;
        if self.roots.contains(&id) {
            return Err(RegistrationError::BootstrapClass(tag));
        }

        let node = self.node(id).ok_or(RegistrationError::NotFound(tag))?;
        if node.subtree_instances > 0 {
            return Err(RegistrationError::HasLiveInstances {
                tag,
                live: node.subtree_instances,
            });
        }
        if !node.children.is_empty() {
            return Err(RegistrationError::HasChildren {
                tag,
                children: node.children.len(),
            });
        }
        let parent = node.parent;

        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p.0)) {
            if let Some(pos) = parent.children.position(|c| *c == id) {
                parent.children.remove(pos);
            }
        }
        let removed = self.by_tag.remove(&tag);
        debug_assert!(removed.is_ok(), "class {tag} missing from the tag table");
        let node = self.nodes.remove(id.0).ok_or(RegistrationError::NotFound(tag))?;

        log_class_unregistered(tag);
        Ok(node.descriptor)
    }

    /// Drop every class, roots included; returns how many were held
    pub(crate) fn clear(&mut self) -> usize {
        let released = self.nodes.drain().len();
        self.by_tag.clear();
        self.roots.clear();
        released
    }

    #[inline]
    pub fn id_of(&self, tag: TypeTag) -> Option<ClassId> {
        self.by_tag.find(&tag).copied()
    }

    #[inline]
    pub fn node(&self, id: ClassId) -> Option<&ClassNode> {
        self.nodes.get(id.0)
    }

    #[inline]
    pub fn find(&self, tag: TypeTag) -> Option<&ClassNode> {
        self.id_of(tag).and_then(|id| self.node(id))
    }

    #[inline]
    pub fn contains(&self, tag: TypeTag) -> bool {
        self.by_tag.contains(&tag)
    }

    /// Linear scan; names are not indexed
    pub fn find_by_name(&self, name: &str) -> Option<&ClassNode> {
        self.iter().find(|node| node.name() == name)
    }

    /// `tag`'s node followed by each ancestor up to its root
    pub fn ancestors(&self, id: ClassId) -> Ancestors<'_> {
        Ancestors {
            registry: self,
            next: Some(id),
        }
    }

    /// True if `ancestor` is `tag` or lies on its parent chain
    pub fn is_descendant_of(&self, tag: TypeTag, ancestor: TypeTag) -> bool {
        match self.id_of(tag) {
            Some(id) => self.ancestors(id).any(|node| node.tag() == ancestor),
            None => false,
        }
    }

    pub fn parent_of(&self, tag: TypeTag) -> Option<TypeTag> {
        let node = self.find(tag)?;
        node.parent.and_then(|p| self.node(p)).map(ClassNode::tag)
    }

    /// Tags from the root down to `tag` itself
    pub fn ancestry(&self, tag: TypeTag) -> Option<Vec<TypeTag>> {
        let node = self.find(tag)?;
        Some(node.layout.spans().map(|span| span.class).collect())
    }

    pub fn children_of(&self, tag: TypeTag) -> Option<Vec<TypeTag>> {
        let node = self.find(tag)?;
        Some(
            node.children()
                .filter_map(|c| self.node(c))
                .map(ClassNode::tag)
                .collect(),
        )
    }

    pub fn roots(&self) -> impl Iterator<Item = TypeTag> + '_ {
        self.roots
            .iter()
            .filter_map(|id| self.node(*id))
            .map(ClassNode::tag)
    }

    #[inline]
    pub fn is_root(&self, tag: TypeTag) -> bool {
        self.id_of(tag).map_or(false, |id| self.roots.contains(&id))
    }

    /// Live instances created as exactly `tag`
    pub fn instance_count(&self, tag: TypeTag) -> Option<usize> {
        self.find(tag).map(ClassNode::instance_count)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassNode> + '_ {
        self.nodes.iter().map(|(_, node)| node)
    }

    pub(crate) fn note_instance_created(&mut self, id: ClassId) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.own_instances += 1;
        }
        let mut cursor = Some(id);
        while let Some(node) = cursor.and_then(|c| self.nodes.get_mut(c.0)) {
            node.subtree_instances += 1;
            cursor = node.parent;
        }
    }

    pub(crate) fn note_instance_destroyed(&mut self, id: ClassId) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.own_instances = node.own_instances.saturating_sub(1);
        }
        let mut cursor = Some(id);
        while let Some(node) = cursor.and_then(|c| self.nodes.get_mut(c.0)) {
            node.subtree_instances = node.subtree_instances.saturating_sub(1);
            cursor = node.parent;
        }
    }

    /// Indented class tree, one class per line
    pub fn dump_tree(&self) -> String {
        let mut out = String::new();
        let mut stack: Vec<ClassId> = self.roots.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else { continue };
            let _ = writeln!(
                out,
                "{:indent$}{} {} (slot {} bytes, {} live)",
                "",
                node.tag(),
                node.name(),
                node.instance_size(),
                node.live_instances(),
                indent = node.depth as usize * 2,
            );
            let children: Vec<ClassId> = node.children().collect();
            stack.extend(children.into_iter().rev());
        }

        debug!(classes = self.len(), "class tree dumped");
        out
    }
}

impl core::fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.nodes.len())
            .field("roots", &self.roots.len())
            .finish()
    }
}

/// Walk from a class node up its parent chain
pub struct Ancestors<'a> {
    registry: &'a ClassRegistry,
    next: Option<ClassId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ClassNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.registry.node(self.next?)?;
        self.next = node.parent;
        Some(node)
    }
}
