//! Property-list metadata for AudioUnit and VST3 bundles.

use crate::model::{PluginKind, PluginMetadata};
use plist::{Dictionary, Value};
use std::path::Path;
use tracing::debug;

/// Location of the property list inside a bundle.
pub const INFO_PLIST: &str = "Contents/Info.plist";

const VERSION_KEY: &str = "CFBundleShortVersionString";
const MANUFACTURER_KEY: &str = "CFBundleIdentifier";
const DESCRIPTION_KEY: &str = "CFBundleGetInfoString";

/// Reads optional metadata from a bundle's `Contents/Info.plist`.
///
/// VST and AAX bundles are never introspected. A missing or unparseable
/// property list, or a key holding something other than a string, simply
/// leaves the corresponding field unset.
pub fn extract_metadata(bundle: &Path, kind: PluginKind) -> PluginMetadata {
    if !kind.has_bundle_metadata() {
        return PluginMetadata::default();
    }

    let plist_path = bundle.join(INFO_PLIST);
    let dict = match Value::from_file(&plist_path) {
        Ok(Value::Dictionary(dict)) => dict,
        Ok(_) => {
            debug!(path = %plist_path.display(), "property list is not a dictionary");
            return PluginMetadata::default();
        }
        Err(e) => {
            debug!(path = %plist_path.display(), error = %e, "no readable property list");
            return PluginMetadata::default();
        }
    };

    PluginMetadata {
        version: string_value(&dict, VERSION_KEY),
        manufacturer: string_value(&dict, MANUFACTURER_KEY),
        description: string_value(&dict, DESCRIPTION_KEY),
    }
}

fn string_value(dict: &Dictionary, key: &str) -> Option<String> {
    dict.get(key).and_then(Value::as_string).map(str::to_string)
}
