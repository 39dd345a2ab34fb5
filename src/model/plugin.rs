use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Plugin bundle format, recognized purely from the bundle's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    AudioUnit,
    Vst,
    Vst3,
    Aax,
}

impl PluginKind {
    pub const ALL: [PluginKind; 4] = [
        PluginKind::AudioUnit,
        PluginKind::Vst,
        PluginKind::Vst3,
        PluginKind::Aax,
    ];

    /// Maps a lowercase file extension to its plugin format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "component" => Some(PluginKind::AudioUnit),
            "vst" => Some(PluginKind::Vst),
            "vst3" => Some(PluginKind::Vst3),
            "aaxplugin" => Some(PluginKind::Aax),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            PluginKind::AudioUnit => "component",
            PluginKind::Vst => "vst",
            PluginKind::Vst3 => "vst3",
            PluginKind::Aax => "aaxplugin",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PluginKind::AudioUnit => "AudioUnit",
            PluginKind::Vst => "VST",
            PluginKind::Vst3 => "VST3",
            PluginKind::Aax => "AAX",
        }
    }

    /// Whether bundles of this format carry a property list worth reading.
    pub fn has_bundle_metadata(&self) -> bool {
        matches!(self, PluginKind::AudioUnit | PluginKind::Vst3)
    }
}

impl std::fmt::Display for PluginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for PluginKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "au" | "audiounit" | "component" => Ok(PluginKind::AudioUnit),
            "vst" | "vst2" => Ok(PluginKind::Vst),
            "vst3" => Ok(PluginKind::Vst3),
            "aax" | "aaxplugin" => Ok(PluginKind::Aax),
            _ => Err(format!(
                "Unknown plugin kind: {}. Use 'au', 'vst', 'vst3', or 'aax'",
                s
            )),
        }
    }
}

/// Which library root a record was found under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    System,
    User,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::System => "system",
            Domain::User => "user",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Optional fields read from a bundle's property list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PluginMetadata {
    pub fn is_empty(&self) -> bool {
        self.version.is_none() && self.manufacturer.is_none() && self.description.is_none()
    }
}

/// One discovered plugin bundle.
///
/// Equality and hashing only look at [`identity`](Self::identity): two
/// records for the same path are the same record regardless of metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginRecord {
    pub identity: PathBuf,
    pub name: String,
    pub kind: PluginKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
    #[serde(flatten)]
    pub metadata: PluginMetadata,
}

impl PluginRecord {
    /// Builds a record from a bundle path.
    ///
    /// Returns `None` when the extension is not a plugin format or the
    /// stripped name is empty or hidden.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let identity = path.into();
        let ext = identity.extension()?.to_str()?.to_lowercase();
        let kind = PluginKind::from_extension(&ext)?;
        let name = identity.file_stem()?.to_string_lossy().to_string();
        if name.is_empty() || name.starts_with('.') {
            return None;
        }

        Some(Self {
            identity,
            name,
            kind,
            domain: None,
            metadata: PluginMetadata::default(),
        })
    }

    pub fn with_domain(mut self, domain: Option<Domain>) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_metadata(mut self, metadata: PluginMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn path(&self) -> &Path {
        &self.identity
    }

    pub fn version(&self) -> Option<&str> {
        self.metadata.version.as_deref()
    }

    pub fn manufacturer(&self) -> Option<&str> {
        self.metadata.manufacturer.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.metadata.description.as_deref()
    }

    /// True if name, manufacturer or description contains `needle`, which
    /// must already be lowercase.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        [
            Some(self.name.as_str()),
            self.manufacturer(),
            self.description(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

impl PartialEq for PluginRecord {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for PluginRecord {}

impl Hash for PluginRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

/// Records keyed by identity, iterated in path order.
///
/// Inserting a record whose identity is already present replaces the
/// stored one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginSet {
    records: BTreeMap<PathBuf, PluginRecord>,
}

impl PluginSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record, returning the one it replaced.
    pub fn insert(&mut self, record: PluginRecord) -> Option<PluginRecord> {
        self.records.insert(record.identity.clone(), record)
    }

    /// Adds every record of `other`; on a shared identity, `other`'s record wins.
    pub fn union(&mut self, other: PluginSet) {
        self.records.extend(other.records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.records.contains_key(path)
    }

    pub fn get(&self, path: &Path) -> Option<&PluginRecord> {
        self.records.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginRecord> {
        self.records.values()
    }

    /// Case-insensitive substring search over name, manufacturer and description.
    pub fn search(&self, query: &str) -> Vec<&PluginRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.iter().collect();
        }
        self.iter().filter(|r| r.matches(&needle)).collect()
    }

    /// Looks a record up by exact path, falling back to a case-insensitive name match.
    pub fn find(&self, query: &str) -> Option<&PluginRecord> {
        if let Some(record) = self.records.get(Path::new(query)) {
            return Some(record);
        }
        self.iter().find(|r| r.name.eq_ignore_ascii_case(query))
    }

    pub fn of_kind(&self, kind: PluginKind) -> Vec<&PluginRecord> {
        self.iter().filter(|r| r.kind == kind).collect()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&PluginRecord) -> bool) {
        self.records.retain(|_, record| keep(record));
    }
}

impl FromIterator<PluginRecord> for PluginSet {
    fn from_iter<I: IntoIterator<Item = PluginRecord>>(iter: I) -> Self {
        let mut set = PluginSet::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

impl Extend<PluginRecord> for PluginSet {
    fn extend<I: IntoIterator<Item = PluginRecord>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl IntoIterator for PluginSet {
    type Item = PluginRecord;
    type IntoIter = std::collections::btree_map::IntoValues<PathBuf, PluginRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_values()
    }
}

impl Serialize for PluginSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.records.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(PluginKind::from_extension("component"), Some(PluginKind::AudioUnit));
        assert_eq!(PluginKind::from_extension("vst"), Some(PluginKind::Vst));
        assert_eq!(PluginKind::from_extension("vst3"), Some(PluginKind::Vst3));
        assert_eq!(PluginKind::from_extension("aaxplugin"), Some(PluginKind::Aax));
        assert_eq!(PluginKind::from_extension("txt"), None);
        assert_eq!(PluginKind::from_extension("VST3"), None);
    }

    #[test]
    fn test_record_from_path() {
        let record = PluginRecord::from_path("/Library/Audio/Plug-Ins/VST3/Synth.VST3").unwrap();
        assert_eq!(record.name, "Synth");
        assert_eq!(record.kind, PluginKind::Vst3);
        assert!(record.domain.is_none());
        assert!(record.metadata.is_empty());
    }

    #[test]
    fn test_record_from_path_rejects() {
        assert!(PluginRecord::from_path("/tmp/notes.txt").is_none());
        assert!(PluginRecord::from_path("/tmp/.hidden.vst").is_none());
        assert!(PluginRecord::from_path("/tmp/Reverb").is_none());
    }

    #[test]
    fn test_record_equality_is_identity_only() {
        let plain = PluginRecord::from_path("/a/Reverb.component").unwrap();
        let rich = plain.clone().with_metadata(PluginMetadata {
            version: Some("1.2".to_string()),
            ..Default::default()
        });
        assert_eq!(plain, rich);

        let other = PluginRecord::from_path("/b/Reverb.component").unwrap();
        assert_ne!(plain, other);
    }

    #[test]
    fn test_set_insert_later_wins() {
        let mut set = PluginSet::new();
        set.insert(PluginRecord::from_path("/a/Reverb.component").unwrap());
        let replaced = set.insert(
            PluginRecord::from_path("/a/Reverb.component")
                .unwrap()
                .with_metadata(PluginMetadata {
                    version: Some("2.0".to_string()),
                    ..Default::default()
                }),
        );

        assert!(replaced.is_some());
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap().version(), Some("2.0"));
    }

    #[test]
    fn test_set_union_later_wins() {
        let mut first: PluginSet = [
            PluginRecord::from_path("/a/Reverb.component").unwrap(),
            PluginRecord::from_path("/a/Delay.vst").unwrap(),
        ]
        .into_iter()
        .collect();
        let second: PluginSet = [
            PluginRecord::from_path("/a/Reverb.component")
                .unwrap()
                .with_domain(Some(Domain::User))
                .with_metadata(PluginMetadata {
                    version: Some("3.1".to_string()),
                    ..Default::default()
                }),
            PluginRecord::from_path("/a/Synth.vst3").unwrap(),
        ]
        .into_iter()
        .collect();

        first.union(second);

        assert_eq!(first.len(), 3);
        let reverb = first.get(Path::new("/a/Reverb.component")).unwrap();
        assert_eq!(reverb.version(), Some("3.1"));
        assert_eq!(reverb.domain, Some(Domain::User));
        assert!(first.contains(Path::new("/a/Delay.vst")));
    }

    #[test]
    fn test_set_search_and_find() {
        let set: PluginSet = [
            PluginRecord::from_path("/a/Reverb.component")
                .unwrap()
                .with_metadata(PluginMetadata {
                    manufacturer: Some("com.acme.reverb".to_string()),
                    ..Default::default()
                }),
            PluginRecord::from_path("/a/Synth.vst3").unwrap(),
            PluginRecord::from_path("/a/Delay.vst").unwrap(),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.search("ACME").len(), 1);
        assert_eq!(set.search("y").len(), 2);
        assert_eq!(set.search("  ").len(), 3);
        assert_eq!(set.find("synth").unwrap().kind, PluginKind::Vst3);
        assert_eq!(set.find("/a/Delay.vst").unwrap().name, "Delay");
        assert!(set.find("Chorus").is_none());
        assert_eq!(set.of_kind(PluginKind::AudioUnit).len(), 1);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("AU".parse::<PluginKind>(), Ok(PluginKind::AudioUnit));
        assert_eq!("vst3".parse::<PluginKind>(), Ok(PluginKind::Vst3));
        assert!("clap".parse::<PluginKind>().is_err());
    }
}
