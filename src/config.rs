//! Runtime configuration
//!
//! Table and pool shapes are fixed for the runtime's lifetime, so they are
//! chosen once here: from defaults, a TOML file, or `CLASSTREE_*` variables.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Buckets of the tag -> class table
    pub class_table_buckets: usize,

    /// Buckets of the (class, selector) -> method cache
    pub dispatch_cache_buckets: usize,

    /// Class nodes reserved per node-pool block
    pub node_block_len: usize,

    /// Instance records reserved per record-pool block
    pub record_block_len: usize,

    /// Instance data blocks reserved per size-class pool block
    pub instance_block_len: usize,

    /// Largest instance data block served from a pool; larger blocks go to
    /// the global allocator
    pub max_pooled_instance_size: usize,

    /// Alignment of every instance data block
    pub instance_align: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            class_table_buckets: 127,
            dispatch_cache_buckets: 509,
            node_block_len: 32,
            record_block_len: 128,
            instance_block_len: 64,
            max_pooled_instance_size: 512,
            instance_align: 16,
        }
    }
}

impl RuntimeConfig {
    /// Parse from TOML; missing keys take their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Defaults overridden by `CLASSTREE_<FIELD>` variables
    /// (e.g. `CLASSTREE_DISPATCH_CACHE_BUCKETS=1021`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let fields: [(&str, &mut usize); 7] = [
            ("CLASSTREE_CLASS_TABLE_BUCKETS", &mut config.class_table_buckets),
            ("CLASSTREE_DISPATCH_CACHE_BUCKETS", &mut config.dispatch_cache_buckets),
            ("CLASSTREE_NODE_BLOCK_LEN", &mut config.node_block_len),
            ("CLASSTREE_RECORD_BLOCK_LEN", &mut config.record_block_len),
            ("CLASSTREE_INSTANCE_BLOCK_LEN", &mut config.instance_block_len),
            ("CLASSTREE_MAX_POOLED_INSTANCE_SIZE", &mut config.max_pooled_instance_size),
            ("CLASSTREE_INSTANCE_ALIGN", &mut config.instance_align),
        ];

        for (var, field) in fields {
            if let Ok(raw) = std::env::var(var) {
                *field = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid(format!("{var}={raw:?} is not a count")))?;
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let counts = [
            ("class_table_buckets", self.class_table_buckets),
            ("dispatch_cache_buckets", self.dispatch_cache_buckets),
            ("node_block_len", self.node_block_len),
            ("record_block_len", self.record_block_len),
            ("instance_block_len", self.instance_block_len),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be at least 1")));
            }
        }

        if !self.instance_align.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "instance_align must be a power of two, got {}",
                self.instance_align
            )));
        }

        Ok(())
    }
}
