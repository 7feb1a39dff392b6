//! Error taxonomy
//!
//! Every operation in the runtime is a single in-memory data structure update,
//! so errors are returned to the immediate caller and never unwound further.

use std::path::PathBuf;
use thiserror::Error;

use crate::instance::ObjectHandle;
use crate::tag::{Selector, TypeTag};

/// Pool allocator failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("invalid slot layout: size {size}, align {align}, block length {block_len}")]
    InvalidLayout {
        size: usize,
        align: usize,
        block_len: usize,
    },

    #[error("out of memory allocating {bytes} bytes")]
    OutOfMemory { bytes: usize },
}

/// Tag table failures; keys are reported by their 32-bit hash input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("key {0:#010x} already present")]
    DuplicateKey(u32),

    #[error("key {0:#010x} not found")]
    NotFound(u32),
}

/// Class registration and unregistration failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("class {0} is already registered")]
    DuplicateType(TypeTag),

    #[error("cannot register {tag}: parent {parent} is not registered")]
    UnknownParent { tag: TypeTag, parent: TypeTag },

    #[error("class {0} is not registered")]
    NotFound(TypeTag),

    #[error("class {tag} still has {children} registered subclass(es)")]
    HasChildren { tag: TypeTag, children: usize },

    #[error("class {tag} still has {live} live instance(s) in its subtree")]
    HasLiveInstances { tag: TypeTag, live: usize },

    #[error("bootstrap root class {0} cannot be unregistered")]
    BootstrapClass(TypeTag),

    #[error("cannot register {tag}: a {size}-byte slot overflows the instance block")]
    InstanceTooLarge { tag: TypeTag, size: usize },
}

/// Object lifetime failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstanceError {
    #[error("class {0} is not registered")]
    UnknownClass(TypeTag),

    #[error("handle {0} does not refer to a live object")]
    InvalidHandle(ObjectHandle),

    #[error("handle {0} released after its object was destroyed")]
    DoubleRelease(ObjectHandle),

    #[error("class {ancestor} is not an ancestor of {class}")]
    NotAnAncestor { class: TypeTag, ancestor: TypeTag },

    #[error("reference count overflow on {0}")]
    RefCountOverflow(ObjectHandle),

    #[error(transparent)]
    OutOfMemory(#[from] PoolError),
}

/// Method resolution failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no class in the ancestry of {class} implements {selector}")]
    MethodNotFound { class: TypeTag, selector: Selector },

    #[error("class {0} is not registered")]
    UnknownClass(TypeTag),

    #[error(transparent)]
    Instance(#[from] InstanceError),
}

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration syntax: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failures of the process-wide runtime entry points
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime is not initialized")]
    NotInitialized,

    #[error("runtime is already initialized")]
    AlreadyInitialized,

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Instance(#[from] InstanceError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_messages_name_tags() {
        let err = RegistrationError::UnknownParent {
            tag: TypeTag::new(b"Mesh"),
            parent: TypeTag::new(b"Geom"),
        };
        assert_eq!(
            err.to_string(),
            "cannot register 'Mesh': parent 'Geom' is not registered"
        );
    }

    #[test]
    fn test_pool_error_converts_into_instance_error() {
        let err: InstanceError = PoolError::OutOfMemory { bytes: 64 }.into();
        assert!(matches!(err, InstanceError::OutOfMemory(_)));
        assert_eq!(err.to_string(), "out of memory allocating 64 bytes");
    }

    #[test]
    fn test_dispatch_wraps_instance_error() {
        let err: RuntimeError = DispatchError::MethodNotFound {
            class: TypeTag::new(b"Mesh"),
            selector: Selector::new(b"draw"),
        }
        .into();
        assert!(matches!(err, RuntimeError::Dispatch(_)));
    }
}
