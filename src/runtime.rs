//! Runtime facade - registry, dispatch cache and instance store as one unit
//!
//! A [`Runtime`] can be owned directly, or installed process-wide with
//! [`initialize_runtime`] and reached through [`with_runtime`]. Methods and
//! teardown hooks receive `&mut Runtime`, so they never go through the
//! process-wide lock themselves.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::class::{ClassDescriptor, ClassId, ClassNode, ClassRegistry, TeardownFn};
use crate::config::RuntimeConfig;
use crate::dispatch::{DispatchCache, DispatchStats, ResolvedMethod, Value};
use crate::error::{ConfigError, DispatchError, InstanceError, RegistrationError, RuntimeError};
use crate::instance::{Instance, InstanceStats, InstanceStore, ObjectHandle, Release};
use crate::logging::{log_lifetime_defect, log_runtime_init, log_runtime_shutdown, perf, warn};
use crate::tag::{Selector, TypeTag};

/// Aggregate statistics
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeStats {
    pub classes: usize,
    pub cache_entries: usize,
    pub dispatch: DispatchStats,
    pub instances: InstanceStats,
}

/// What [`Runtime::shutdown`] cleaned up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Instances still alive at shutdown, freed without teardown
    pub leaked_instances: usize,
    /// Class nodes dropped, bootstrap roots included
    pub classes_released: usize,
}

pub struct Runtime {
    config: RuntimeConfig,
    registry: ClassRegistry,
    cache: DispatchCache,
    instances: InstanceStore,
}

impl Runtime {
    /// Runtime with the bootstrap roots registered
    pub fn new(config: RuntimeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    pub fn with_defaults() -> Self {
        Self::build(RuntimeConfig::default())
    }

    fn build(config: RuntimeConfig) -> Self {
        let registry = ClassRegistry::new(&config);
        let cache = DispatchCache::new(&config);
        let instances = InstanceStore::new(&config);
        log_runtime_init(registry.len());
        Self {
            config,
            registry,
            cache,
            instances,
        }
    }

    #[inline]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[inline]
    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    // ========================================================================
    // Classes
    // ========================================================================

    pub fn register_class(&mut self, descriptor: ClassDescriptor) -> Result<ClassId, RegistrationError> {
        let id = self.registry.register(descriptor)?;
        self.cache.invalidate();
        Ok(id)
    }

    /// Remove a class; hands back its descriptor for re-registration
    pub fn unregister_class(&mut self, tag: TypeTag) -> Result<ClassDescriptor, RegistrationError> {
        let descriptor = self.registry.unregister(tag)?;
        self.cache.invalidate();
        Ok(descriptor)
    }

    #[inline]
    pub fn find_class(&self, tag: TypeTag) -> Option<&ClassNode> {
        self.registry.find(tag)
    }

    #[inline]
    pub fn find_class_by_name(&self, name: &str) -> Option<&ClassNode> {
        self.registry.find_by_name(name)
    }

    #[inline]
    pub fn is_descendant_of(&self, tag: TypeTag, ancestor: TypeTag) -> bool {
        self.registry.is_descendant_of(tag, ancestor)
    }

    /// Live instances created as exactly `tag`
    pub fn instance_count(&self, tag: TypeTag) -> Option<usize> {
        self.registry.instance_count(tag)
    }

    pub fn dump_class_tree(&self) -> String {
        self.registry.dump_tree()
    }

    // ========================================================================
    // Instances
    // ========================================================================

    /// Zeroed instance of `tag` holding one reference
    pub fn create_instance(&mut self, tag: TypeTag) -> Result<ObjectHandle, InstanceError> {
        let id = self.registry.id_of(tag).ok_or(InstanceError::UnknownClass(tag))?;
        let layout = self
            .registry
            .node(id)
            .map(|node| node.layout().clone())
            .ok_or(InstanceError::UnknownClass(tag))?;

        let handle = self.instances.create(id, tag, layout)?;
        self.registry.note_instance_created(id);
        Ok(handle)
    }

    /// Add a reference; returns the new count
    #[inline]
    pub fn retain(&mut self, handle: ObjectHandle) -> Result<u32, InstanceError> {
        self.instances.retain(handle)
    }

    /// Drop a reference; returns the remaining count
    ///
    /// Dropping the last reference runs each class's teardown hook on its own
    /// slot, leaf first, then frees the block. Releasing a destroyed object
    /// fails with `DoubleRelease`.
    pub fn release(&mut self, handle: ObjectHandle) -> Result<u32, InstanceError> {
        match self.instances.release(handle) {
            Ok(Release::Retained(remaining)) => Ok(remaining),
            Ok(Release::Destroyed(instance)) => {
                self.destroy(instance);
                Ok(0)
            }
            Err(err) => {
                if let InstanceError::DoubleRelease(_) = err {
                    log_lifetime_defect("double_release", &handle.to_string());
                }
                Err(err)
            }
        }
    }

    fn destroy(&mut self, mut instance: Instance) {
        let hooks: SmallVec<[(TypeTag, TeardownFn); 8]> = self
            .registry
            .ancestors(instance.class())
            .filter_map(|node| node.descriptor().teardown().map(|hook| (node.tag(), hook)))
            .collect();

        for (tag, hook) in hooks {
            if let Ok(slot) = instance.slot_mut(tag) {
                hook(self, slot);
            }
        }

        self.registry.note_instance_destroyed(instance.class());
        self.instances.reclaim(instance);
    }

    #[inline]
    pub fn ref_count(&self, handle: ObjectHandle) -> Result<u32, InstanceError> {
        self.instances.ref_count(handle)
    }

    #[inline]
    pub fn is_alive(&self, handle: ObjectHandle) -> bool {
        self.instances.contains(handle)
    }

    /// Leaf class the object was created as
    #[inline]
    pub fn instance_type(&self, handle: ObjectHandle) -> Result<TypeTag, InstanceError> {
        self.instances.class_of(handle)
    }

    pub fn is_instance_of(&self, handle: ObjectHandle, ancestor: TypeTag) -> Result<bool, InstanceError> {
        let class = self.instances.class_of(handle)?;
        Ok(self.registry.is_descendant_of(class, ancestor))
    }

    /// Bytes owned by `ancestor` inside the object
    pub fn get_slot(&self, handle: ObjectHandle, ancestor: TypeTag) -> Result<&[u8], InstanceError> {
        self.instances.slot(handle, ancestor).map_err(Self::report_foreign_slot)
    }

    pub fn get_slot_mut(&mut self, handle: ObjectHandle, ancestor: TypeTag) -> Result<&mut [u8], InstanceError> {
        self.instances.slot_mut(handle, ancestor).map_err(Self::report_foreign_slot)
    }

    fn report_foreign_slot(err: InstanceError) -> InstanceError {
        if let InstanceError::NotAnAncestor { class, ancestor } = &err {
            log_lifetime_defect("not_an_ancestor", &format!("{ancestor} is not an ancestor of {class}"));
        }
        err
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Most-derived implementation of `selector` for `class`
    #[inline]
    pub fn resolve_method(&mut self, class: TypeTag, selector: Selector) -> Result<ResolvedMethod, DispatchError> {
        self.cache.resolve(&self.registry, class, selector)
    }

    /// Call the object's most-derived implementation of `selector`
    pub fn invoke_method(
        &mut self,
        handle: ObjectHandle,
        selector: Selector,
        args: &[Value],
    ) -> Result<Value, DispatchError> {
        let class = self.instances.class_of(handle)?;
        let resolved = self.cache.resolve(&self.registry, class, selector)?;
        Ok((resolved.method)(self, handle, args))
    }

    /// Call the implementation `from`'s parent would use
    ///
    /// Lets an override in `from` chain to the behavior it replaced.
    pub fn invoke_super(
        &mut self,
        handle: ObjectHandle,
        from: TypeTag,
        selector: Selector,
        args: &[Value],
    ) -> Result<Value, DispatchError> {
        let class = self.instances.class_of(handle)?;
        if !self.registry.is_descendant_of(class, from) {
            return Err(InstanceError::NotAnAncestor { class, ancestor: from }.into());
        }
        let parent = self
            .registry
            .parent_of(from)
            .ok_or(DispatchError::MethodNotFound { class: from, selector })?;

        let resolved = self.cache.resolve(&self.registry, parent, selector)?;
        Ok((resolved.method)(self, handle, args))
    }

    /// Whether the object implements `selector`, directly or by inheritance
    pub fn responds_to(&mut self, handle: ObjectHandle, selector: Selector) -> bool {
        match self.instances.class_of(handle) {
            Ok(class) => self.cache.resolve(&self.registry, class, selector).is_ok(),
            Err(_) => false,
        }
    }

    #[inline]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    #[inline]
    pub fn dispatch_stats(&self) -> DispatchStats {
        self.cache.stats()
    }

    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            classes: self.registry.len(),
            cache_entries: self.cache.len(),
            dispatch: self.cache.stats(),
            instances: self.instances.stats(),
        }
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Free every leaked instance (without teardown hooks) and every class
    pub fn shutdown(mut self) -> ShutdownReport {
        let _guard = perf::track("runtime_shutdown");

        for node in self.registry.iter().filter(|node| node.instance_count() > 0) {
            warn!(
                event = "instances_leaked",
                class = %node.tag(),
                live = node.instance_count(),
                "instances still alive at shutdown"
            );
        }

        let leaked_instances = self.instances.drain();
        self.cache.invalidate();
        let classes_released = self.registry.clear();

        log_runtime_shutdown(classes_released, leaked_instances);
        ShutdownReport {
            leaked_instances,
            classes_released,
        }
    }
}

impl core::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Runtime")
            .field("registry", &self.registry)
            .field("cache", &self.cache)
            .field("instances", &self.instances)
            .finish()
    }
}

// ============================================================================
// Process-wide runtime
// ============================================================================

static RUNTIME: Lazy<Mutex<Option<Runtime>>> = Lazy::new(|| Mutex::new(None));

/// Install the process-wide runtime
pub fn initialize_runtime(config: RuntimeConfig) -> Result<(), RuntimeError> {
    let mut slot = RUNTIME.lock();
    if slot.is_some() {
        return Err(RuntimeError::AlreadyInitialized);
    }
    *slot = Some(Runtime::new(config)?);
    Ok(())
}

/// Tear down the process-wide runtime
pub fn shutdown_runtime() -> Result<ShutdownReport, RuntimeError> {
    let runtime = RUNTIME.lock().take().ok_or(RuntimeError::NotInitialized)?;
    Ok(runtime.shutdown())
}

/// Run `f` against the process-wide runtime
///
/// The runtime stays locked while `f` runs; calling back into `with_runtime`
/// from inside `f` deadlocks.
pub fn with_runtime<R>(f: impl FnOnce(&mut Runtime) -> R) -> Result<R, RuntimeError> {
    let mut slot = RUNTIME.lock();
    let runtime = slot.as_mut().ok_or(RuntimeError::NotInitialized)?;
    Ok(f(runtime))
}

pub fn is_runtime_initialized() -> bool {
    RUNTIME.lock().is_some()
}
