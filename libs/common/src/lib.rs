//! Shared building blocks for the GridLAB-D publication generator
//!
//! Provides the functions every entry point needs:
//! - logging initialisation and the request log sink
//! - layered configuration loading and the property lookup seam

pub mod config_loader;
pub mod logging;

pub use config_loader::{
    load_config, load_config_from_file, property_or_default, AppConfig, ConfigurationSource,
    ImporterConfig, BLAZEGRAPH_HOST_PATH, DEFAULT_BLAZEGRAPH_ENDPOINT, IMPORTER_URL,
};
pub use logging::{LogEntry, LogSink, MemoryLogSink, TracingLogSink};
