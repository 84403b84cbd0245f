//! Project Configuration Types
//!
//! Defines the structure of project files on disk.
//!
//! ```text
//! my-quest/
//! ├── quest.toml               # QuestManifest
//! ├── entities/*.entity.json   # one QuestEntity per file
//! └── nodes/*.nodes.toml       # NodeLibraryConfig (custom node types)
//! ```

use std::path::PathBuf;

use quest_compiler::NodeTypeSpec;
use quest_types::{ContainerReward, StateDeclaration};
use serde::{Deserialize, Serialize};

/// Manifest file name at the project root
pub const MANIFEST_FILE: &str = "quest.toml";
/// Directory holding entity graphs
pub const ENTITIES_DIR: &str = "entities";
/// Directory holding custom node libraries
pub const NODES_DIR: &str = "nodes";
pub const ENTITY_SUFFIX: &str = ".entity.json";
pub const NODES_SUFFIX: &str = ".nodes.toml";

/// Quest manifest (quest.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestManifest {
    pub quest: QuestInfo,
    #[serde(default, rename = "state")]
    pub states: Vec<StateDeclaration>,
    #[serde(default)]
    pub reward: Option<ContainerReward>,
    #[serde(default)]
    pub build: BuildConfig,
}

/// Quest information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestInfo {
    pub name: String,
    pub script_name: Option<String>,
    /// Regions the quest plays in; the first one hosts background tasks
    #[serde(default)]
    pub regions: Vec<String>,
    pub description: Option<String>,
}

/// Build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Output directory, relative to the project root
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("build/scripts")
}

/// Custom node library (nodes/*.nodes.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeLibraryConfig {
    #[serde(default, rename = "node")]
    pub nodes: Vec<NodeTypeSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_types::{SpawnLocation, StateType};

    #[test]
    fn test_parse_manifest() {
        let manifest: QuestManifest = toml::from_str(
            r#"
[quest]
name = "The Lost Ring"
script_name = "LostRing"
regions = ["Bowerstone", "Oakvale"]

[[state]]
name = "RingFound"
type = "bool"

[[state]]
name = "GoldPaid"
type = "int"
default = 25

[reward]
container = "OBJECT_CHEST_SILVER"
script_name = "RewardChest"
spawn = "NearMarker"
spawn_reference = "MK_RewardSpot"
auto_give_on_complete = true

[[reward.items]]
definition = "OBJECT_RING_GOLD"

[[reward.items]]
definition = "OBJECT_POTION_HEALTH"
count = 3
"#,
        )
        .unwrap();

        assert_eq!(manifest.quest.script_name.as_deref(), Some("LostRing"));
        assert_eq!(manifest.quest.regions.len(), 2);
        assert_eq!(manifest.states[1].state_type, StateType::Int);
        assert_eq!(manifest.states[1].default, Some(serde_json::json!(25)));

        let reward = manifest.reward.unwrap();
        assert_eq!(reward.spawn, SpawnLocation::NearMarker);
        assert!(reward.auto_give_on_complete);
        assert!(!reward.remove_after_give);
        assert_eq!(reward.items[0].count, 1);
        assert_eq!(reward.items[1].count, 3);

        assert_eq!(manifest.build.output_dir, PathBuf::from("build/scripts"));
    }

    #[test]
    fn test_parse_node_library() {
        let library: NodeLibraryConfig = toml::from_str(
            r#"
[[node]]
id = "ringChime"
category = "action"
template = "Quest:PlaySound({sound})\n{CHILDREN}"

[[node.property]]
name = "sound"
type = "String"
default = "SND_CHIME"
"#,
        )
        .unwrap();

        assert_eq!(library.nodes.len(), 1);
        assert_eq!(library.nodes[0].properties[0].name, "sound");
    }
}
