// Insurance Transaction Handler - Core Library
// Exposes the record store, remediation engine, tools and pipeline for the
// CLI, the tool server and tests

pub mod config;
pub mod pipeline;
pub mod record;
pub mod remediation;
pub mod store;
pub mod tools;

// Only compile the tool server when the server feature is enabled
#[cfg(feature = "server")]
pub mod api;

// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use config::{init_logging, AppConfig, ConfigError, LogFormat, LoggingConfig, ServerConfig};
pub use pipeline::{
    write_results, Pipeline, PipelineError, PipelineReport, PipelineStep, TransactionResult,
    NO_TRANSACTION_ID, STEPS,
};
pub use record::{is_missing, normalize_id, TransactionRecord, REQUIRED_FIELDS};
pub use remediation::{
    placeholder_for, resolution_for_code, FixOutcome, RemediationEngine, NOT_FOUND,
};
pub use store::{RecordStore, StoreError};
pub use tools::{Tool, ToolError, ToolRegistry, ToolResponse};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
