//! Plugin discovery under a library root.
//!
//! A root expands into four fixed plugin folders:
//!
//! | Folder | Usual format |
//! |--------|--------------|
//! | `Audio/Plug-Ins/Components` | AudioUnit (`.component`) |
//! | `Audio/Plug-Ins/VST3` | VST3 (`.vst3`) |
//! | `Audio/Plug-Ins/VST` | VST (`.vst`) |
//! | `Application Support/Avid/Audio/Plug-Ins` | AAX (`.aaxplugin`) |
//!
//! Each folder is listed on its own blocking task and the results are
//! merged by path. Formats are matched by extension only, so a bundle in
//! an unexpected folder is still picked up.
//!
//! # Example
//!
//! ```no_run
//! use plugscan::access::AccessibleDirectory;
//! use plugscan::scanner::{scan, ExtensionSet};
//!
//! #[tokio::main]
//! async fn main() {
//!     let root = AccessibleDirectory::new("/Library");
//!     let outcome = scan(&root, &ExtensionSet::default()).await;
//!     for record in outcome.records.iter() {
//!         println!("{} ({})", record.name, record.kind);
//!     }
//! }
//! ```

mod directory;
mod metadata;

pub use directory::scan_directory;
pub use metadata::{extract_metadata, INFO_PLIST};

use crate::access::AccessibleDirectory;
use crate::error::ScanError;
use crate::model::{Domain, PluginKind, PluginSet};
use crate::platform::{is_empty_root, PLUGIN_SUBDIRECTORIES};
use futures::future::join_all;
use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Case-insensitive set of recognized bundle extensions.
///
/// Extensions that don't correspond to a [`PluginKind`] are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSet {
    extensions: BTreeSet<String>,
}

impl ExtensionSet {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .filter(|e| PluginKind::from_extension(e).is_some())
            .collect();
        Self { extensions }
    }

    pub fn contains(&self, extension: &str) -> bool {
        self.extensions.contains(&extension.to_lowercase())
    }

    /// Returns true if the path's extension is in the set.
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.contains(e))
            .unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl Default for ExtensionSet {
    fn default() -> Self {
        Self::new(PluginKind::ALL.iter().map(|k| k.extension()))
    }
}

/// Records found under one root, plus the first folder error if any.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub records: PluginSet,
    pub error: Option<ScanError>,
}

/// Scans every plugin folder under `root`.
///
/// Records carry no [`Domain`]; use [`scan_in_domain`] to tag them.
pub async fn scan(root: &AccessibleDirectory, extensions: &ExtensionSet) -> ScanOutcome {
    scan_in_domain(root, extensions, None).await
}

/// Scans every plugin folder under `root`, tagging records with `domain`.
///
/// The folders are listed concurrently and all of them are awaited. An
/// error from one folder never discards records from the others; the
/// first error collected is returned alongside the merged records.
///
/// An empty root path contributes nothing.
pub async fn scan_in_domain(
    root: &AccessibleDirectory,
    extensions: &ExtensionSet,
    domain: Option<Domain>,
) -> ScanOutcome {
    if is_empty_root(root.path()) {
        debug!("empty root, nothing to scan");
        return ScanOutcome::default();
    }

    let _scope = root.begin_access();

    let tasks: Vec<_> = PLUGIN_SUBDIRECTORIES
        .iter()
        .map(|sub| {
            let dir = root.path().join(sub);
            let extensions = extensions.clone();
            async move {
                let task_dir = dir.clone();
                let result = tokio::task::spawn_blocking(move || {
                    scan_directory(&task_dir, &extensions, domain)
                })
                .await;

                match result {
                    Ok(result) => result,
                    Err(e) => Err(ScanError::DirectoryReadFailure {
                        path: dir,
                        source: Arc::new(io::Error::other(e.to_string())),
                    }),
                }
            }
        })
        .collect();

    let mut outcome = ScanOutcome::default();
    for result in join_all(tasks).await {
        match result {
            Ok(records) => outcome.records.union(records),
            Err(e) => {
                warn!(error = %e, "plugin folder scan failed");
                if outcome.error.is_none() {
                    outcome.error = Some(e);
                }
            }
        }
    }

    debug!(
        root = %root.path().display(),
        count = outcome.records.len(),
        "root scanned"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn bundle(root: &Path, sub: &str, name: &str) -> PathBuf {
        let path = root.join(sub).join(name);
        fs::create_dir_all(&path).unwrap();
        path
    }

    fn write_version(bundle: &Path, version: &str) {
        fs::create_dir_all(bundle.join("Contents")).unwrap();
        fs::write(
            bundle.join(INFO_PLIST),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
<key>CFBundleShortVersionString</key><string>{}</string>
</dict>
</plist>
"#,
                version
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_extension_set() {
        let set = ExtensionSet::new([".VST3", "component", "txt"]);
        assert!(set.contains("vst3"));
        assert!(set.contains("Component"));
        assert!(!set.contains("txt"));
        assert!(set.matches(Path::new("/a/Synth.VST3")));
        assert!(!set.matches(Path::new("/a/Synth")));
        assert_eq!(ExtensionSet::default().iter().count(), 4);
    }

    #[tokio::test]
    async fn test_reverb_and_synth_scenario() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let reverb = bundle(root, "Audio/Plug-Ins/Components", "Reverb.component");
        write_version(&reverb, "1.2");
        bundle(root, "Audio/Plug-Ins/VST3", "Synth.vst3");
        bundle(root, "Audio/Plug-Ins/VST", ".hidden.vst");
        fs::write(root.join("Audio/Plug-Ins/Components/notes.txt"), "").unwrap();

        let outcome = scan(&AccessibleDirectory::new(root), &ExtensionSet::default()).await;

        assert!(outcome.error.is_none());
        assert_eq!(outcome.records.len(), 2);

        let reverb = outcome.records.find("Reverb").unwrap();
        assert_eq!(reverb.kind, PluginKind::AudioUnit);
        assert_eq!(reverb.version(), Some("1.2"));

        let synth = outcome.records.find("Synth").unwrap();
        assert_eq!(synth.kind, PluginKind::Vst3);
        assert_eq!(synth.version(), None);
        assert_eq!(synth.manufacturer(), None);
        assert_eq!(synth.description(), None);
    }

    #[tokio::test]
    async fn test_missing_folder_is_tolerated() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        bundle(root, "Audio/Plug-Ins/Components", "Reverb.component");
        bundle(root, "Audio/Plug-Ins/VST3", "Synth.vst3");
        bundle(root, "Application Support/Avid/Audio/Plug-Ins", "Limiter.aaxplugin");

        let outcome = scan(&AccessibleDirectory::new(root), &ExtensionSet::default()).await;

        assert!(outcome.error.is_none());
        assert_eq!(outcome.records.len(), 3);
        assert_eq!(outcome.records.find("Limiter").unwrap().kind, PluginKind::Aax);
    }

    #[tokio::test]
    async fn test_metadata_degrades_without_plist() {
        let dir = tempdir().unwrap();
        let path = bundle(dir.path(), "Audio/Plug-Ins/Components", "Bare.component");

        let outcome = scan(&AccessibleDirectory::new(dir.path()), &ExtensionSet::default()).await;

        let record = outcome.records.get(&path).unwrap();
        assert_eq!(record.name, "Bare");
        assert_eq!(record.kind, PluginKind::AudioUnit);
        assert!(record.metadata.is_empty());
    }

    #[tokio::test]
    async fn test_folder_error_keeps_other_records() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        bundle(root, "Audio/Plug-Ins/VST3", "Synth.vst3");
        fs::write(root.join("Audio/Plug-Ins/VST"), "not a folder").unwrap();

        let outcome = scan(&AccessibleDirectory::new(root), &ExtensionSet::default()).await;

        assert!(matches!(
            outcome.error,
            Some(ScanError::DirectoryReadFailure { .. })
        ));
        assert_eq!(outcome.records.len(), 1);
    }

    #[tokio::test]
    async fn test_scan_is_idempotent() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        bundle(root, "Audio/Plug-Ins/Components", "Reverb.component");
        bundle(root, "Audio/Plug-Ins/VST", "Delay.vst");

        let handle = AccessibleDirectory::new(root);
        let first = scan(&handle, &ExtensionSet::default()).await;
        let second = scan(&handle, &ExtensionSet::default()).await;

        let summary = |outcome: &ScanOutcome| -> Vec<(PathBuf, String, PluginKind)> {
            outcome
                .records
                .iter()
                .map(|r| (r.identity.clone(), r.name.clone(), r.kind))
                .collect()
        };
        assert_eq!(summary(&first), summary(&second));
        assert_eq!(handle.active_scopes(), 0);
    }

    #[tokio::test]
    async fn test_empty_root() {
        let root = AccessibleDirectory::new("");
        assert_eq!(root.path(), Path::new(""));

        let outcome = scan(&root, &ExtensionSet::default()).await;
        assert!(outcome.records.is_empty());
        assert!(outcome.error.is_none());
        assert_eq!(root.active_scopes(), 0);
    }
}
