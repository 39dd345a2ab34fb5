use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::path::PathBuf;

use super::{Domain, PluginSet};
use crate::error::ScanError;

/// What happened to one configured root during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RootStatus {
    Scanned { count: usize },
    Denied,
    Cancelled,
    /// Access was granted but at least one plugin folder failed to list.
    Partial { count: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct RootReport {
    pub path: PathBuf,
    pub domain: Domain,
    #[serde(flatten)]
    pub status: RootStatus,
}

/// Immutable result of one scan request.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub scanned_at: DateTime<Utc>,
    pub records: PluginSet,
    /// First error encountered, kept for display.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_error"
    )]
    pub error: Option<ScanError>,
    pub roots: Vec<RootReport>,
}

impl ScanReport {
    pub fn new(records: PluginSet, error: Option<ScanError>, roots: Vec<RootReport>) -> Self {
        Self {
            scanned_at: Utc::now(),
            records,
            error,
            roots,
        }
    }
}

fn serialize_error<S: Serializer>(error: &Option<ScanError>, serializer: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_str(&e.to_string()),
        None => serializer.serialize_none(),
    }
}
