//! Folder access coordination.
//!
//! Before a root is scanned, an [`AccessCoordinator`] must hand out an
//! [`AccessibleDirectory`] for it. Reads against that handle happen inside
//! an [`AccessScope`], which ends when dropped.
//!
//! Two coordinators are provided:
//!
//! | Coordinator | Behavior |
//! |-------------|----------|
//! | [`GrantingCoordinator`] | Reuses persisted grants, prompts when none is valid |
//! | [`OpenAccess`] | Grants any readable directory without prompting |

mod grants;
mod prompt;

pub use grants::{Grant, GrantStore};
pub use prompt::{DenyPrompter, PromptResponse, Prompter, TerminalPrompter};

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::platform::absolute_root;

use grants::is_listable;

/// A root that is currently readable.
#[derive(Debug, Clone)]
pub struct AccessibleDirectory {
    path: PathBuf,
    active: Arc<AtomicUsize>,
}

impl AccessibleDirectory {
    /// Wraps `path`, made absolute against the working directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: absolute_root(path.into()),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a use scope; reads must happen while the returned guard is alive.
    pub fn begin_access(&self) -> AccessScope {
        self.active.fetch_add(1, Ordering::SeqCst);
        debug!(root = %self.path.display(), "begin access");
        AccessScope {
            path: self.path.clone(),
            active: Arc::clone(&self.active),
        }
    }

    /// Number of scopes currently open on this handle.
    pub fn active_scopes(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Guard for an open access scope; ends the scope on drop.
#[derive(Debug)]
pub struct AccessScope {
    path: PathBuf,
    active: Arc<AtomicUsize>,
}

impl Drop for AccessScope {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        debug!(root = %self.path.display(), "end access");
    }
}

/// Result of asking for access to a root.
#[derive(Debug, Clone)]
pub enum AccessOutcome {
    Granted(AccessibleDirectory),
    Denied,
    Cancelled,
}

/// Supplies the scanner with readable roots.
#[async_trait]
pub trait AccessCoordinator: Send + Sync {
    /// Returns a ready-to-read handle for `path`, or why there isn't one.
    ///
    /// May suspend while the user is asked out of band.
    async fn ensure_accessible(&self, path: &Path) -> AccessOutcome;
}

/// Grants every directory the process can already read.
///
/// A root that does not exist is granted too; scanning it simply finds
/// nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAccess;

#[async_trait]
impl AccessCoordinator for OpenAccess {
    async fn ensure_accessible(&self, path: &Path) -> AccessOutcome {
        if !path.exists() || is_listable(path) {
            AccessOutcome::Granted(AccessibleDirectory::new(path))
        } else {
            AccessOutcome::Denied
        }
    }
}

/// Coordinator backed by persisted grants and an interactive prompter.
///
/// A valid stored grant is reused. A stale one is dropped and the user is
/// asked again; an allowed prompt stores a fresh grant.
///
/// Prompts are asked one at a time, even when several roots are resolved
/// concurrently.
pub struct GrantingCoordinator<P> {
    store: Mutex<GrantStore>,
    prompt_lock: tokio::sync::Mutex<()>,
    prompter: P,
}

impl<P: Prompter> GrantingCoordinator<P> {
    pub fn new(store: GrantStore, prompter: P) -> Self {
        Self {
            store: Mutex::new(store),
            prompt_lock: tokio::sync::Mutex::new(()),
            prompter,
        }
    }

    /// Loads the grant store from its default location.
    pub fn load(prompter: P) -> Result<Self> {
        Ok(Self::new(GrantStore::load(GrantStore::default_path())?, prompter))
    }

    fn with_store<T>(&self, f: impl FnOnce(&mut GrantStore) -> T) -> T {
        let mut guard = self.store.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// Checks the stored grant for `path`, dropping it if stale.
    fn valid_grant(&self, path: &Path) -> bool {
        self.with_store(|store| {
            let valid = match store.get(path) {
                Some(grant) => grant.is_valid(),
                None => return false,
            };

            if !valid {
                warn!(root = %path.display(), "stored grant is stale, asking again");
                store.revoke(path);
                if let Err(e) = store.save() {
                    warn!(error = %e, "failed to persist grants");
                }
            }
            valid
        })
    }

    fn persist_grant(&self, path: &Path) {
        self.with_store(|store| {
            store.insert(Grant::new(path));
            if let Err(e) = store.save() {
                warn!(error = %e, "failed to persist grants");
            }
        });
    }
}

#[async_trait]
impl<P: Prompter> AccessCoordinator for GrantingCoordinator<P> {
    async fn ensure_accessible(&self, path: &Path) -> AccessOutcome {
        if self.valid_grant(path) {
            debug!(root = %path.display(), "reusing stored grant");
            return AccessOutcome::Granted(AccessibleDirectory::new(path));
        }

        let _prompting = self.prompt_lock.lock().await;
        // Another root may have been granted while we waited.
        if self.valid_grant(path) {
            debug!(root = %path.display(), "granted while waiting for prompt");
            return AccessOutcome::Granted(AccessibleDirectory::new(path));
        }

        match self.prompter.request_access(path).await {
            PromptResponse::Allow => {
                if is_listable(path) {
                    self.persist_grant(path);
                    info!(root = %path.display(), "access granted");
                }
                AccessOutcome::Granted(AccessibleDirectory::new(path))
            }
            PromptResponse::Deny => {
                info!(root = %path.display(), "access denied");
                AccessOutcome::Denied
            }
            PromptResponse::Cancel => {
                info!(root = %path.display(), "access prompt cancelled");
                AccessOutcome::Cancelled
            }
        }
    }
}
