//! Persisted folder-access grants.
//!
//! Grants are stored as JSON in the data directory and loaded at
//! startup. A grant stays usable as long as its root is still a listable
//! directory; anything else makes it stale.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::platform::data_dir;

const GRANTS_FILE: &str = "grants.json";

/// A reusable, revocable permission to read one root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub root: PathBuf,
    pub granted_at: DateTime<Utc>,
}

impl Grant {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            granted_at: Utc::now(),
        }
    }

    /// Returns true if the root can still be listed.
    pub fn is_valid(&self) -> bool {
        is_listable(&self.root)
    }
}

pub(crate) fn is_listable(path: &Path) -> bool {
    path.is_dir() && fs::read_dir(path).is_ok()
}

/// Grants keyed by root path, backed by a JSON file.
#[derive(Debug)]
pub struct GrantStore {
    path: PathBuf,
    grants: BTreeMap<PathBuf, Grant>,
}

impl GrantStore {
    /// Returns the default location of the grants file.
    pub fn default_path() -> PathBuf {
        data_dir().join(GRANTS_FILE)
    }

    /// Loads grants from `path`, starting empty if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path,
                grants: BTreeMap::new(),
            });
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read grants file: {:?}", path))?;
        let list: Vec<Grant> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse grants file: {:?}", path))?;
        let grants = list.into_iter().map(|g| (g.root.clone(), g)).collect();

        Ok(Self { path, grants })
    }

    /// Writes all grants back to disk, creating the parent directory if needed.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let list: Vec<&Grant> = self.grants.values().collect();
        let content = serde_json::to_string_pretty(&list)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write grants file: {:?}", self.path))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, root: &Path) -> Option<&Grant> {
        self.grants.get(root)
    }

    pub fn insert(&mut self, grant: Grant) {
        self.grants.insert(grant.root.clone(), grant);
    }

    /// Removes the grant for `root`, returning it if there was one.
    pub fn revoke(&mut self, root: &Path) -> Option<Grant> {
        self.grants.remove(root)
    }

    pub fn list(&self) -> impl Iterator<Item = &Grant> {
        self.grants.values()
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = GrantStore::load(dir.path().join("grants.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("nested").join("grants.json");
        let root = dir.path().join("Library");
        fs::create_dir_all(&root).unwrap();

        let mut store = GrantStore::load(&file).unwrap();
        store.insert(Grant::new(&root));
        store.save().unwrap();

        let reloaded = GrantStore::load(&file).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.get(&root).unwrap().is_valid());
    }

    #[test]
    fn test_revoke() {
        let dir = tempdir().unwrap();
        let mut store = GrantStore::load(dir.path().join("grants.json")).unwrap();
        store.insert(Grant::new("/Library"));

        assert!(store.revoke(Path::new("/Library")).is_some());
        assert!(store.revoke(Path::new("/Library")).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_grant_goes_stale_when_root_disappears() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("Library");
        fs::create_dir_all(&root).unwrap();
        let grant = Grant::new(&root);
        assert!(grant.is_valid());

        fs::remove_dir(&root).unwrap();
        assert!(!grant.is_valid());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("grants.json");
        fs::write(&file, "{not json").unwrap();
        assert!(GrantStore::load(&file).is_err());
    }
}
