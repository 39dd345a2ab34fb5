//! Platform path resolution.
//!
//! Library roots follow the macOS layout. On other platforms the same
//! layout can still be scanned by pointing the tool at an explicit root.

use crate::model::Domain;
use std::path::{Path, PathBuf};

/// Plugin folders searched under every library root.
pub const PLUGIN_SUBDIRECTORIES: [&str; 4] = [
    "Audio/Plug-Ins/Components",
    "Audio/Plug-Ins/VST3",
    "Audio/Plug-Ins/VST",
    "Application Support/Avid/Audio/Plug-Ins",
];

/// Returns the system-wide library directory.
///
/// Location: `/Library`
pub fn system_library_dir() -> PathBuf {
    PathBuf::from("/Library")
}

/// Returns the per-user library directory.
///
/// Location: `~/Library`
///
/// Returns `None` if the home directory can't be determined.
pub fn user_library_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join("Library"))
}

/// Returns the library directory for a domain.
pub fn library_dir(domain: Domain) -> Option<PathBuf> {
    match domain {
        Domain::System => Some(system_library_dir()),
        Domain::User => user_library_dir(),
    }
}

/// Resolves a root against the working directory.
///
/// An empty path stays empty; it names no root at all. If the working
/// directory can't be read the path is returned unchanged.
pub fn absolute_root(path: PathBuf) -> PathBuf {
    if path.as_os_str().is_empty() || path.is_absolute() {
        return path;
    }
    std::path::absolute(&path).unwrap_or(path)
}

/// Returns true for the empty root, which is never scanned.
pub fn is_empty_root(path: &Path) -> bool {
    path.as_os_str().is_empty()
}

/// Returns the data directory where persisted grants live.
///
/// Platform-specific locations:
/// - Linux: `~/.local/share/plugscan/`
/// - macOS: `~/Library/Application Support/plugscan/`
///
/// Falls back to `./plugscan/` if no data directory can be determined.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("plugscan")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_dirs() {
        assert_eq!(library_dir(Domain::System), Some(PathBuf::from("/Library")));
        if let Some(user) = library_dir(Domain::User) {
            assert!(user.ends_with("Library"));
        }
    }

    #[test]
    fn test_absolute_root() {
        assert_eq!(absolute_root(PathBuf::new()), PathBuf::new());
        assert_eq!(
            absolute_root(PathBuf::from("/Library")),
            PathBuf::from("/Library")
        );
        let relative = absolute_root(PathBuf::from("Library"));
        assert_eq!(relative, std::env::current_dir().unwrap().join("Library"));
    }
}
