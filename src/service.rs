//! Full scans across all configured roots.
//!
//! [`PluginScanService`] is an ordinary value owned by the caller. It keeps
//! no state between scans: each call to [`scan`](PluginScanService::scan)
//! returns a fresh [`ScanReport`], so overlapping scans can't interfere and
//! the caller decides which report to keep.
//!
//! # Example
//!
//! ```no_run
//! use plugscan::access::OpenAccess;
//! use plugscan::service::{default_roots, PluginScanService};
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = PluginScanService::new(Box::new(OpenAccess));
//!     let report = service.scan(&default_roots()).await;
//!     println!("Found {} plugins", report.records.len());
//!     if let Some(error) = report.error {
//!         eprintln!("{}", error);
//!     }
//! }
//! ```

use futures::future::join_all;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::access::{AccessCoordinator, AccessOutcome};
use crate::error::ScanError;
use crate::model::{Domain, PluginSet, RootReport, RootStatus, ScanReport};
use crate::platform::{absolute_root, is_empty_root, library_dir};
use crate::scanner::{scan_in_domain, ExtensionSet};

/// A library root together with its domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    pub path: PathBuf,
    pub domain: Domain,
}

impl Root {
    /// Creates a root; a relative path is resolved against the working
    /// directory so record identities are always absolute.
    pub fn new(path: impl Into<PathBuf>, domain: Domain) -> Self {
        Self {
            path: absolute_root(path.into()),
            domain,
        }
    }

    /// The system library root, `/Library`.
    pub fn system() -> Self {
        Self::new(crate::platform::system_library_dir(), Domain::System)
    }

    /// The current user's library root, if the home directory is known.
    pub fn user() -> Option<Self> {
        library_dir(Domain::User).map(|path| Self::new(path, Domain::User))
    }
}

/// System and user roots for the current machine.
pub fn default_roots() -> Vec<Root> {
    std::iter::once(Root::system()).chain(Root::user()).collect()
}

/// Runs scans through an access coordinator.
pub struct PluginScanService {
    coordinator: Box<dyn AccessCoordinator>,
    extensions: ExtensionSet,
}

impl PluginScanService {
    /// Creates a service recognizing the default plugin extensions.
    pub fn new(coordinator: Box<dyn AccessCoordinator>) -> Self {
        Self::with_extensions(coordinator, ExtensionSet::default())
    }

    pub fn with_extensions(coordinator: Box<dyn AccessCoordinator>, extensions: ExtensionSet) -> Self {
        Self {
            coordinator,
            extensions,
        }
    }

    /// Scans every root and merges the results.
    ///
    /// Roots are independent: a denied or failing root contributes nothing
    /// but never hides records found under another one. The report carries
    /// the first error in root order.
    pub async fn scan(&self, roots: &[Root]) -> ScanReport {
        let results = join_all(roots.iter().map(|root| self.scan_root(root))).await;

        let mut records = PluginSet::new();
        let mut first_error = None;
        let mut reports = Vec::with_capacity(results.len());

        for (report, found, error) in results {
            records.union(found);
            if first_error.is_none() {
                first_error = error;
            }
            reports.push(report);
        }

        info!(
            roots = roots.len(),
            count = records.len(),
            "scan complete"
        );
        ScanReport::new(records, first_error, reports)
    }

    async fn scan_root(&self, root: &Root) -> (RootReport, PluginSet, Option<ScanError>) {
        let report = |status| RootReport {
            path: root.path.clone(),
            domain: root.domain,
            status,
        };

        if is_empty_root(&root.path) {
            debug!("skipping empty root");
            return (report(RootStatus::Scanned { count: 0 }), PluginSet::new(), None);
        }

        let handle = match self.coordinator.ensure_accessible(&root.path).await {
            AccessOutcome::Granted(handle) => handle,
            AccessOutcome::Denied => {
                warn!(root = %root.path.display(), "access denied, skipping root");
                return (
                    report(RootStatus::Denied),
                    PluginSet::new(),
                    Some(ScanError::access_denied(&root.path)),
                );
            }
            AccessOutcome::Cancelled => {
                warn!(root = %root.path.display(), "access prompt cancelled, skipping root");
                return (
                    report(RootStatus::Cancelled),
                    PluginSet::new(),
                    Some(ScanError::access_denied(&root.path)),
                );
            }
        };

        let outcome = scan_in_domain(&handle, &self.extensions, Some(root.domain)).await;
        let count = outcome.records.len();
        info!(root = %root.path.display(), count, "root scanned");

        let status = if outcome.error.is_some() {
            RootStatus::Partial { count }
        } else {
            RootStatus::Scanned { count }
        };
        (report(status), outcome.records, outcome.error)
    }
}
