//! Narrowing a scan report for display.
//!
//! A [`PluginFilter`] hides plugins matching the configured ignore globs,
//! and optionally keeps only one [`PluginKind`] or records matching a
//! search text. Root statuses are left untouched.

use anyhow::Result;
use globset::GlobSet;

use crate::config::IgnoreConfig;
use crate::model::{PluginKind, PluginRecord, ScanReport};

#[derive(Debug, Clone)]
pub struct PluginFilter {
    ignore: GlobSet,
    kind: Option<PluginKind>,
    needle: Option<String>,
}

impl PluginFilter {
    /// Builds a filter from the ignore section of the config.
    pub fn new(ignore: &IgnoreConfig) -> Result<Self> {
        Ok(Self {
            ignore: ignore.globset()?,
            kind: None,
            needle: None,
        })
    }

    pub fn with_kind(mut self, kind: Option<PluginKind>) -> Self {
        self.kind = kind;
        self
    }

    /// Keeps records whose name, manufacturer or description contains
    /// `search`, ignoring case. Blank text matches everything.
    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.needle = search
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());
        self
    }

    pub fn accepts(&self, record: &PluginRecord) -> bool {
        !self.ignore.is_match(&record.name)
            && self.kind.map_or(true, |kind| record.kind == kind)
            && self
                .needle
                .as_deref()
                .map_or(true, |needle| record.matches(needle))
    }

    pub fn apply(&self, mut report: ScanReport) -> ScanReport {
        report.records.retain(|record| self.accepts(record));
        report
    }
}
