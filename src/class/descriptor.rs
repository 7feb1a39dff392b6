//! Class descriptor - what a registrant supplies for a new class

use core::fmt;

use crate::dispatch::{MethodFn, MethodProvider};
use crate::runtime::Runtime;
use crate::tag::{Selector, TypeTag};

/// Hook run on a dying instance's own slot, leaf class first
///
/// The runtime is passed so the hook can release objects the slot refers to.
pub type TeardownFn = fn(&mut Runtime, &mut [u8]);

pub struct ClassDescriptor {
    tag: TypeTag,
    parent: TypeTag,
    name: String,
    instance_size: usize,
    methods: Option<Box<dyn MethodProvider>>,
    teardown: Option<TeardownFn>,
}

impl ClassDescriptor {
    /// Class with an empty slot and no methods
    pub fn new(tag: TypeTag, parent: TypeTag, name: impl Into<String>) -> Self {
        Self {
            tag,
            parent,
            name: name.into(),
            instance_size: 0,
            methods: None,
            teardown: None,
        }
    }

    /// Bytes this class adds to every instance of itself and its descendants
    #[must_use]
    pub fn with_instance_size(mut self, size: usize) -> Self {
        self.instance_size = size;
        self
    }

    #[must_use]
    pub fn with_methods(mut self, provider: impl MethodProvider + 'static) -> Self {
        self.methods = Some(Box::new(provider));
        self
    }

    #[must_use]
    pub fn with_teardown(mut self, hook: TeardownFn) -> Self {
        self.teardown = Some(hook);
        self
    }

    #[inline]
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    #[inline]
    pub fn parent(&self) -> TypeTag {
        self.parent
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn instance_size(&self) -> usize {
        self.instance_size
    }

    #[inline]
    pub fn has_methods(&self) -> bool {
        self.methods.is_some()
    }

    #[inline]
    pub fn teardown(&self) -> Option<TeardownFn> {
        self.teardown
    }

    /// The class's own implementation of `selector`, ignoring ancestors
    #[inline]
    pub fn own_method(&self, selector: Selector) -> Option<MethodFn> {
        self.methods.as_ref().and_then(|p| p.method(selector))
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("tag", &self.tag)
            .field("parent", &self.parent)
            .field("name", &self.name)
            .field("instance_size", &self.instance_size)
            .field("has_methods", &self.methods.is_some())
            .field("has_teardown", &self.teardown.is_some())
            .finish()
    }
}
