use crate::error::ScanError;
use crate::model::{Domain, PluginRecord, PluginSet};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

use super::{extract_metadata, ExtensionSet};

/// Scans the direct entries of one plugin folder.
///
/// A folder that does not exist yields an empty set. Hidden entries,
/// unrecognized extensions and dot-names are skipped, as is any single
/// entry whose attributes can't be read.
///
/// # Errors
///
/// Returns [`ScanError::DirectoryReadFailure`] if the folder exists but
/// cannot be listed.
pub fn scan_directory(
    dir: &Path,
    extensions: &ExtensionSet,
    domain: Option<Domain>,
) -> Result<PluginSet, ScanError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(PluginSet::new()),
        Err(e) => return Err(ScanError::read_failure(dir, e)),
    };

    let mut records = PluginSet::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };

        let file_name = entry.file_name();
        if file_name.to_string_lossy().starts_with('.') {
            continue;
        }

        if let Err(e) = entry.file_type() {
            debug!(path = %entry.path().display(), error = %e, "skipping entry");
            continue;
        }

        let path = entry.path();
        if !extensions.matches(&path) {
            continue;
        }

        // Extension checked above; None here means a hidden or empty name.
        let record = match PluginRecord::from_path(path) {
            Some(record) => record,
            None => continue,
        };

        let metadata = extract_metadata(record.path(), record.kind);
        records.insert(record.with_domain(domain).with_metadata(metadata));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PluginKind;
    use tempfile::tempdir;

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let result = scan_directory(&dir.path().join("VST"), &ExtensionSet::default(), None);
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_filters_extensions_and_hidden_names() {
        let dir = tempdir().unwrap();
        for name in ["Reverb.component", "Chorus.VST", "notes.txt", ".hidden.vst", ".DS_Store"] {
            fs::create_dir_all(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("Readme"), "").unwrap();

        let records =
            scan_directory(dir.path(), &ExtensionSet::default(), Some(Domain::User)).unwrap();

        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Chorus", "Reverb"]);
        assert_eq!(records.find("Chorus").unwrap().kind, PluginKind::Vst);
        assert!(records.iter().all(|r| r.domain == Some(Domain::User)));
    }

    #[test]
    fn test_restricted_extensions() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Reverb.component")).unwrap();
        fs::create_dir_all(dir.path().join("Synth.vst3")).unwrap();

        let only_vst3 = ExtensionSet::new(["VST3"]);
        let records = scan_directory(dir.path(), &only_vst3, None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records.iter().next().unwrap().name, "Synth");
    }

    #[test]
    fn test_does_not_recurse() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Vendor").join("Nested.vst3")).unwrap();

        let records = scan_directory(dir.path(), &ExtensionSet::default(), None).unwrap();
        assert!(records.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_folder_is_followed() {
        let dir = tempdir().unwrap();
        let real = dir.path().join("real");
        fs::create_dir_all(real.join("Synth.vst3")).unwrap();
        let link = dir.path().join("VST3");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let records = scan_directory(&link, &ExtensionSet::default(), None).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records.contains(&link.join("Synth.vst3")));
    }

    #[test]
    fn test_file_instead_of_folder_is_a_read_failure() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("VST");
        fs::write(&file, "").unwrap();

        let result = scan_directory(&file, &ExtensionSet::default(), None);
        assert!(matches!(result, Err(ScanError::DirectoryReadFailure { .. })));
    }
}
