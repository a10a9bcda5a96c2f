// The channel map follows the LEGEND metadata layout: a mapping keyed by detector name where
// each entry carries the DAQ raw id, the physical location (string, position) and the CC4
// front-end board. Only germanium detectors (system `geds`) are monitored here, everything
// else in the file is skipped.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use fxhash::FxHashMap;

use super::error::ChannelMapError;

const GEDS_SYSTEM: &str = "geds";

/// Entries without a `system` field are germanium detectors
fn is_geds(entry: &serde_yaml::Value) -> bool {
    match entry.get("system") {
        Some(system) => system.as_str() == Some(GEDS_SYSTEM),
        None => true,
    }
}

#[derive(Debug, Clone, Deserialize)]
struct DaqEntry {
    rawid: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct LocationEntry {
    string: u32,
    position: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Cc4Entry {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ElectronicsEntry {
    #[serde(default)]
    cc4: Cc4Entry,
}

#[derive(Debug, Clone, Deserialize)]
struct ChannelEntry {
    daq: DaqEntry,
    location: LocationEntry,
    #[serde(default)]
    electronics: ElectronicsEntry,
}

/// How detectors are grouped into selectable groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortBy {
    #[default]
    String,
    Cc4,
}

impl SortBy {
    pub const ALL: [SortBy; 2] = [SortBy::String, SortBy::Cc4];

    pub fn label(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Cc4 => "CC4",
        }
    }
}

/// A single germanium detector
#[derive(Debug, Clone, PartialEq)]
pub struct Detector {
    pub name: String,
    pub rawid: u32,
    pub string: u32,
    pub position: u32,
    pub cc4_id: Option<String>,
}

/// A named, ordered set of detector names
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelGroup {
    pub name: String,
    pub channels: Vec<String>,
}

/// ChannelMap contains the mapping between detector names and DAQ raw ids, as well as the
/// physical layout used to group detectors.
#[derive(Debug, Clone, Default)]
pub struct ChannelMap {
    detectors: Vec<Detector>,
    name_to_rawid: FxHashMap<String, u32>,
    rawid_to_name: FxHashMap<u32, String>,
}

impl ChannelMap {
    /// Load a ChannelMap from a YAML file
    pub fn read_file(path: &Path) -> Result<Self, ChannelMapError> {
        if !path.exists() {
            return Err(ChannelMapError::BadFilePath(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ChannelMapError> {
        // Entries of other systems have their own layout, so only geds entries are typed
        let entries = serde_yaml::from_str::<BTreeMap<String, serde_yaml::Value>>(contents)?;
        let mut detectors = Vec::new();
        for (name, value) in entries {
            if !is_geds(&value) {
                continue;
            }
            let entry = serde_yaml::from_value::<ChannelEntry>(value)?;
            detectors.push(Detector {
                name,
                rawid: entry.daq.rawid,
                string: entry.location.string,
                position: entry.location.position,
                cc4_id: entry.electronics.cc4.id,
            });
        }
        Self::from_detectors(detectors)
    }

    pub fn from_detectors(mut detectors: Vec<Detector>) -> Result<Self, ChannelMapError> {
        detectors.sort_by(|a, b| (a.string, a.position).cmp(&(b.string, b.position)));

        let mut map = ChannelMap::default();
        for det in detectors.iter() {
            if let Some(other) = map.rawid_to_name.get(&det.rawid) {
                return Err(ChannelMapError::DuplicateRawId(
                    det.rawid,
                    other.clone(),
                    det.name.clone(),
                ));
            }
            map.name_to_rawid.insert(det.name.clone(), det.rawid);
            map.rawid_to_name.insert(det.rawid, det.name.clone());
        }
        map.detectors = detectors;
        Ok(map)
    }

    pub fn rawid(&self, name: &str) -> Option<u32> {
        self.name_to_rawid.get(name).copied()
    }

    pub fn name(&self, rawid: u32) -> Option<&str> {
        self.rawid_to_name.get(&rawid).map(|n| n.as_str())
    }

    pub fn detector(&self, name: &str) -> Option<&Detector> {
        self.detectors.iter().find(|d| d.name == name)
    }

    pub fn detectors(&self) -> &[Detector] {
        &self.detectors
    }

    /// Group the detectors, ordered by string and position within each group.
    ///
    /// Detectors without a CC4 id are left out of the CC4 grouping
    pub fn groups(&self, sort_by: SortBy) -> Vec<ChannelGroup> {
        let mut groups: Vec<ChannelGroup> = Vec::new();
        match sort_by {
            SortBy::String => {
                for det in self.detectors.iter() {
                    let name = format!("String {}", det.string);
                    push_to_group(&mut groups, name, &det.name);
                }
            }
            SortBy::Cc4 => {
                for det in self.detectors.iter() {
                    if let Some(id) = &det.cc4_id {
                        push_to_group(&mut groups, format!("CC4 {id}"), &det.name);
                    }
                }
                groups.sort_by(|a, b| a.name.cmp(&b.name));
            }
        }
        groups
    }

    /// The detector names of a group, empty if the group does not exist
    pub fn group_channels(&self, sort_by: SortBy, group: &str) -> Vec<String> {
        self.groups(sort_by)
            .into_iter()
            .find(|g| g.name == group)
            .map(|g| g.channels)
            .unwrap_or_default()
    }
}

fn push_to_group(groups: &mut Vec<ChannelGroup>, name: String, channel: &str) {
    match groups.iter_mut().find(|g| g.name == name) {
        Some(group) => group.channels.push(channel.to_string()),
        None => groups.push(ChannelGroup {
            name,
            channels: vec![channel.to_string()],
        }),
    }
}

//Unit tests
#[cfg(test)]
mod tests {
    use super::*;

    const CHMAP: &str = "
V02160A:
  system: geds
  daq: {rawid: 1104000}
  location: {string: 1, position: 2}
  electronics: {cc4: {id: A1}}
B00035C:
  system: geds
  daq: {rawid: 1104001}
  location: {string: 1, position: 1}
  electronics: {cc4: {id: A1}}
P00574A:
  system: geds
  daq: {rawid: 1105600}
  location: {string: 10, position: 1}
  electronics: {cc4: {id: B2}}
S060:
  system: spms
  daq: {rawid: 1057600}
  location: {string: 1, position: 1}
";

    #[test]
    fn test_lookup() {
        let map = ChannelMap::from_yaml(CHMAP).unwrap();
        assert_eq!(map.detectors().len(), 3);
        assert_eq!(map.rawid("V02160A"), Some(1104000));
        assert_eq!(map.name(1105600), Some("P00574A"));
        assert_eq!(map.rawid("S060"), None);
    }

    #[test]
    fn test_skips_other_system_layouts() {
        let contents = "
V02160A:
  system: geds
  daq: {rawid: 1104000}
  location: {string: 1, position: 2}
S060:
  system: spms
  daq: {rawid: 1057600}
  location: {fiber: IB02, position: top}
PULS01:
  system: puls
  daq: {crate: 0}
";
        let map = ChannelMap::from_yaml(contents).unwrap();
        assert_eq!(map.detectors().len(), 1);
        assert_eq!(map.rawid("V02160A"), Some(1104000));
        assert_eq!(map.detectors()[0].cc4_id, None);
        assert_eq!(map.name(1057600), None);
    }

    #[test]
    fn test_groups_by_string() {
        let map = ChannelMap::from_yaml(CHMAP).unwrap();
        let groups = map.groups(SortBy::String);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "String 1");
        assert_eq!(groups[0].channels, vec!["B00035C", "V02160A"]);
        assert_eq!(groups[1].name, "String 10");
        assert_eq!(
            map.group_channels(SortBy::Cc4, "CC4 B2"),
            vec!["P00574A".to_string()]
        );
        assert!(map.group_channels(SortBy::String, "String 7").is_empty());
    }

    #[test]
    fn test_duplicate_rawid() {
        let det = Detector {
            name: String::from("A"),
            rawid: 1,
            string: 1,
            position: 1,
            cc4_id: None,
        };
        let dup = Detector {
            name: String::from("B"),
            position: 2,
            ..det.clone()
        };
        match ChannelMap::from_detectors(vec![det, dup]) {
            Err(ChannelMapError::DuplicateRawId(1, _, _)) => (),
            _ => panic!(),
        }
    }
}
