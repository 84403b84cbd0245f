// Quest Project - Project-level structures
//
// A quest project owns its entities, the regions it plays in, the persisted
// quest state declarations and an optional container reward.

use serde::{Deserialize, Serialize};

use crate::types::{QuestEntity, ValueType};

// ─────────────────────────────────────────────────────────────────────────────
// Persisted State
// ─────────────────────────────────────────────────────────────────────────────

/// Type of a persisted quest state value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateType {
    Bool,
    Int,
    Float,
    String,
}

impl StateType {
    /// Value type used to encode defaults of this state
    pub fn value_type(&self) -> ValueType {
        match self {
            StateType::Bool => ValueType::Boolean,
            StateType::Int => ValueType::Integer,
            StateType::Float => ValueType::Float,
            StateType::String => ValueType::String,
        }
    }
}

/// A quest state value that survives save/restore
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub state_type: StateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl StateDeclaration {
    pub fn new(name: &str, state_type: StateType) -> Self {
        Self {
            name: name.to_string(),
            state_type,
            default: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Container Reward
// ─────────────────────────────────────────────────────────────────────────────

/// Where a reward container is spawned relative to its marker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnLocation {
    /// Exactly at the marker position
    #[default]
    AtMarker,
    /// At a free position near the marker
    NearMarker,
}

/// An item placed in a reward container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardItem {
    /// Item definition name
    pub definition: String,
    #[serde(default = "default_item_count")]
    pub count: u32,
}

fn default_item_count() -> u32 {
    1
}

impl RewardItem {
    pub fn new(definition: &str, count: u32) -> Self {
        Self {
            definition: definition.to_string(),
            count,
        }
    }
}

/// Reward container synthesized into its own entity script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerReward {
    /// Container definition to spawn
    pub container: String,
    /// Script name of the spawned container
    #[serde(alias = "script_name")]
    pub script_name: String,
    /// Spawn location policy
    #[serde(default)]
    pub spawn: SpawnLocation,
    /// Script name of the marker the container spawns at
    #[serde(alias = "spawn_reference")]
    pub spawn_reference: String,
    /// Hand the contents to the hero when the quest completes
    #[serde(default, alias = "auto_give_on_complete")]
    pub auto_give_on_complete: bool,
    /// Remove the container after its contents were handed over
    #[serde(default, alias = "remove_after_give")]
    pub remove_after_give: bool,
    /// Items in insertion order
    #[serde(default)]
    pub items: Vec<RewardItem>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Quest Project
// ─────────────────────────────────────────────────────────────────────────────

/// Complete quest project definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestProject {
    /// Human-readable quest name
    pub name: String,
    /// Script name of the quest script (defaults to the name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_name: Option<String>,
    /// Regions in declaration order; the first one is the primary region
    #[serde(default)]
    pub regions: Vec<String>,
    /// Persisted state declarations
    #[serde(default)]
    pub states: Vec<StateDeclaration>,
    /// Scripted entities
    #[serde(default)]
    pub entities: Vec<QuestEntity>,
    /// Optional container reward
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<ContainerReward>,
}

impl QuestProject {
    /// Create a new empty project
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            script_name: None,
            regions: Vec::new(),
            states: Vec::new(),
            entities: Vec::new(),
            reward: None,
        }
    }

    /// Script name of the quest script
    pub fn script_name(&self) -> &str {
        self.script_name.as_deref().unwrap_or(&self.name)
    }

    /// The region background tasks are bound to
    pub fn primary_region(&self) -> Option<&str> {
        self.regions.first().map(|r| r.as_str())
    }

    /// Find an entity by script name (case-insensitive), falling back to its id
    pub fn find_entity(&self, name: &str) -> Option<&QuestEntity> {
        self.entities
            .iter()
            .find(|e| {
                e.script_name
                    .as_deref()
                    .is_some_and(|s| s.eq_ignore_ascii_case(name))
            })
            .or_else(|| self.entities.iter().find(|e| e.id == name))
    }
}
