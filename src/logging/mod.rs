//! Logging infrastructure - structured tracing throughout the runtime
//!
//! Design: Uses `tracing` for structured, contextual logging with:
//! - Configurable log levels per module
//! - Zero-cost when disabled
//! - Console, JSON and file output
//!
//! Every runtime event carries an `event = "..."` field so logs can be
//! filtered by what happened rather than by message text.

use once_cell::sync::OnceCell;
use std::io;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

// Re-export tracing macros for use throughout the runtime
pub use tracing::{debug, error, info, trace, warn};

use crate::tag::{Selector, TypeTag};

static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level
    pub level: Level,
    /// Enable file logging
    pub file_output: bool,
    /// Log file path (if file_output enabled)
    pub log_path: Option<String>,
    /// Enable JSON format (vs human-readable)
    pub json_format: bool,
    /// Show span events (enter/exit)
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file_output: false,
            log_path: None,
            json_format: false,
            show_spans: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // CLASSTREE_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level_str) = std::env::var("CLASSTREE_LOG_LEVEL") {
            config.level = parse_level(&level_str);
        }

        // CLASSTREE_LOG_FILE: path to log file
        if let Ok(path) = std::env::var("CLASSTREE_LOG_FILE") {
            config.file_output = true;
            config.log_path = Some(path);
        }

        config.json_format = std::env::var("CLASSTREE_LOG_JSON").is_ok();
        config.show_spans = std::env::var("CLASSTREE_LOG_SPANS").is_ok();

        config
    }

    /// Minimal logging for hot dispatch loops
    pub fn performance() -> Self {
        Self {
            level: Level::ERROR,
            ..Self::default()
        }
    }

    /// Verbose logging, including per-instance lifetime events
    pub fn debug() -> Self {
        Self {
            level: Level::TRACE,
            file_output: true,
            log_path: Some("classtree.log".to_string()),
            json_format: false,
            show_spans: true,
        }
    }
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialize logging with configuration from the environment
pub fn init() {
    init_with_config(LogConfig::from_env());
}

/// Initialize logging with custom configuration
///
/// Only the first call installs a subscriber; later calls are no-ops. If the
/// host application already installed a global subscriber, that one is kept.
pub fn init_with_config(config: LogConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "classtree={}",
                config.level.as_str().to_lowercase()
            ))
        });

        let span_events = if config.show_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let registry = tracing_subscriber::registry().with(env_filter);

        let file_appender = match (&config.log_path, config.file_output) {
            (Some(path), true) => {
                let path = Path::new(path);
                let dir = path.parent().unwrap_or_else(|| Path::new("."));
                let file = path
                    .file_name()
                    .map(|f| f.to_owned())
                    .unwrap_or_else(|| "classtree.log".into());
                Some(tracing_appender::rolling::never(dir, file))
            }
            _ => None,
        };

        let result = match (file_appender, config.json_format) {
            (Some(appender), true) => registry
                .with(fmt::layer().json().with_writer(appender).with_span_events(span_events))
                .try_init(),
            (Some(appender), false) => registry
                .with(
                    fmt::layer()
                        .with_writer(appender)
                        .with_ansi(false)
                        .with_span_events(span_events),
                )
                .try_init(),
            (None, true) => registry
                .with(fmt::layer().json().with_writer(io::stdout).with_span_events(span_events))
                .try_init(),
            (None, false) => registry
                .with(
                    fmt::layer()
                        .with_writer(io::stdout)
                        .with_span_events(span_events)
                        .with_target(true)
                        .with_line_number(cfg!(debug_assertions)),
                )
                .try_init(),
        };

        // Another global subscriber may already be installed by the host
        result.ok();
    });
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

// ============================================================================
// Runtime-specific logging functions
// ============================================================================

pub fn log_runtime_init(roots: usize) {
    info!(event = "runtime_init", roots, "class runtime initialized");
}

pub fn log_runtime_shutdown(classes: usize, leaked_instances: usize) {
    info!(
        event = "runtime_shutdown",
        classes,
        leaked_instances,
        "class runtime shut down"
    );
}

pub fn log_class_registered(tag: TypeTag, parent: TypeTag, depth: u32, instance_size: usize) {
    debug!(
        event = "class_registered",
        class = %tag,
        parent = %parent,
        depth,
        instance_size,
        "class registered"
    );
}

pub fn log_class_unregistered(tag: TypeTag) {
    debug!(event = "class_unregistered", class = %tag, "class unregistered");
}

pub fn log_cache_invalidated(entries: usize) {
    debug!(
        event = "dispatch_cache_invalidated",
        entries,
        "dispatch cache cleared"
    );
}

#[inline]
pub fn log_method_resolved(class: TypeTag, selector: Selector, supplier: TypeTag) {
    trace!(
        event = "method_resolved",
        class = %class,
        selector = %selector,
        supplier = %supplier,
        "method resolved"
    );
}

#[inline]
pub fn log_instance_created(class: TypeTag, size: usize) {
    trace!(event = "instance_created", class = %class, size_bytes = size, "instance created");
}

#[inline]
pub fn log_instance_destroyed(class: TypeTag, size: usize) {
    trace!(event = "instance_destroyed", class = %class, size_bytes = size, "instance destroyed");
}

pub fn log_pool_grow(slot_size: usize, blocks: usize, block_bytes: usize) {
    debug!(
        event = "pool_grow",
        slot_size,
        blocks,
        block_bytes,
        "pool acquired a new block"
    );
}

/// Lifetime defects in the caller (double release, foreign slot access)
pub fn log_lifetime_defect(defect: &str, detail: &str) {
    error!(event = "lifetime_defect", defect, detail, "object lifetime defect");
}

/// Performance tracking utilities
pub mod perf {
    use std::time::Instant;
    use tracing::debug;

    /// Track operation duration (returns guard that logs on drop)
    #[must_use]
    pub fn track(operation: &'static str) -> PerformanceGuard {
        PerformanceGuard {
            operation,
            start: Instant::now(),
        }
    }

    pub struct PerformanceGuard {
        operation: &'static str,
        start: Instant,
    }

    impl Drop for PerformanceGuard {
        fn drop(&mut self) {
            let elapsed = self.start.elapsed();
            debug!(
                operation = self.operation,
                duration_us = elapsed.as_micros() as u64,
                "operation completed"
            );
        }
    }
}
