pub mod access;
pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod output;
pub mod platform;
pub mod scanner;
pub mod service;

pub use config::Config;
pub use error::ScanError;
pub use filter::PluginFilter;
pub use model::{Domain, PluginKind, PluginMetadata, PluginRecord, PluginSet, ScanReport};
pub use service::{PluginScanService, Root};
