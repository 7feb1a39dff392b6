//! Classtree - runtime-registered class hierarchies with dynamic dispatch
//!
//! Plugins register classes by four-character type tag at run time. Each
//! class names its parent, the bytes it adds to every instance, and a method
//! provider. Objects are reference counted and carry one slot per ancestor;
//! calls resolve to the most-derived implementation through a memoizing
//! dispatch cache.

pub mod class;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ffi;
pub mod instance;
pub mod logging;
pub mod pool;
pub mod runtime;
pub mod seq;
pub mod table;
pub mod tag;

// Re-export core types
pub use class::{roots, ClassDescriptor, ClassId, ClassNode, ClassRegistry, TeardownFn};
pub use config::RuntimeConfig;
pub use dispatch::{DispatchStats, MethodFn, MethodProvider, MethodTable, ResolvedMethod, Value};
pub use error::{
    ConfigError, DispatchError, InstanceError, PoolError, RegistrationError, RuntimeError, TableError,
};
pub use instance::{InstanceLayout, ObjectHandle, SlotSpan};
pub use runtime::{
    initialize_runtime, is_runtime_initialized, shutdown_runtime, with_runtime, Runtime, RuntimeStats,
    ShutdownReport,
};
pub use tag::{Selector, TypeTag};
