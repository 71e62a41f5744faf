//! Runtime configuration
//!
//! Two things are configured at runtime:
//! - logging (`BindConfig`, loaded from JSON and installed process-wide)
//! - the default execution context used by `fetch()` when no context is passed

use std::fs;
use std::path::Path;
use std::sync::{OnceLock, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event, Event, LogStream, Logger, Severity};
use crate::store::SharedContext;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Logging configuration
///
/// Every field is optional in the JSON form:
///
/// ```json
/// { "log_level": "warn", "log_stream": "stderr" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindConfig {
    /// Minimum severity written to the log
    pub log_level: Severity,
    /// Stream for TRACE and INFO records; WARN and above always use stderr
    pub log_stream: LogStream,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            log_level: Severity::Info,
            log_stream: LogStream::Stdout,
        }
    }
}

impl BindConfig {
    /// Config that only logs warnings and errors
    pub fn quiet() -> Self {
        Self {
            log_level: Severity::Warn,
            ..Self::default()
        }
    }

    /// Parse configuration from JSON text
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Install this configuration for the whole process
    pub fn install(&self) {
        Logger::configure(self.log_level, self.log_stream);
        log_event(
            Event::ConfigLoaded,
            &[("log_level", self.log_level.as_str())],
        );
    }
}

fn default_slot() -> &'static RwLock<Option<SharedContext>> {
    static SLOT: OnceLock<RwLock<Option<SharedContext>>> = OnceLock::new();
    SLOT.get_or_init(|| RwLock::new(None))
}

/// Set the process-wide default context
pub fn set_default_context(context: SharedContext) {
    let mut slot = default_slot()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *slot = Some(context);
}

/// Remove the process-wide default context
pub fn clear_default_context() {
    let mut slot = default_slot()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *slot = None;
}

/// The process-wide default context, if one is set
pub fn default_context() -> Option<SharedContext> {
    default_slot()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}
