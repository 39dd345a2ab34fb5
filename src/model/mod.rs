//! Core data types for discovered plugins and scan reports.
//!
//! - [`PluginRecord`] - One discovered plugin bundle
//! - [`PluginKind`] - Bundle format (AudioUnit, VST, VST3, AAX)
//! - [`Domain`] - Whether a record came from the system or user library
//! - [`PluginSet`] - Records deduplicated by path
//! - [`ScanReport`] - Complete scan results
//!
//! # Example
//!
//! ```
//! use plugscan::{PluginKind, PluginRecord, PluginSet};
//!
//! let mut set = PluginSet::new();
//! set.insert(PluginRecord::from_path("/Library/Audio/Plug-Ins/VST3/Synth.vst3").unwrap());
//! set.insert(PluginRecord::from_path("/Library/Audio/Plug-Ins/VST3/Synth.vst3").unwrap());
//!
//! assert_eq!(set.len(), 1);
//! assert_eq!(set.of_kind(PluginKind::Vst3).len(), 1);
//! ```

mod plugin;
mod report;

pub use plugin::*;
pub use report::*;
