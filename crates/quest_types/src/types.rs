// Quest Types - Behavior graph data structures
//
// These types define the structure of a behavior graph: nodes, named ports,
// connections and per-entity variables. Graphs are authored in the editor,
// stored as JSON and handed to the compiler read-only.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Categories & Value Types
// ─────────────────────────────────────────────────────────────────────────────

/// Category of a behavior node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    /// Graph root; compilation starts only from these
    Trigger,
    /// Performs an effect and continues
    Action,
    /// Branches on a named output port
    Condition,
    /// Pure control flow (reroute, sequence, random branch)
    Flow,
    /// Variable get/set
    Variable,
    /// Project-defined node type
    #[default]
    Custom,
}

impl NodeCategory {
    /// Whether nodes of this category branch by default (`True`/`False`)
    pub fn is_branching(&self) -> bool {
        matches!(self, NodeCategory::Condition)
    }
}

impl std::fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeCategory::Trigger => write!(f, "trigger"),
            NodeCategory::Action => write!(f, "action"),
            NodeCategory::Condition => write!(f, "condition"),
            NodeCategory::Flow => write!(f, "flow"),
            NodeCategory::Variable => write!(f, "variable"),
            NodeCategory::Custom => write!(f, "custom"),
        }
    }
}

/// Declared type of a variable or node property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    String,
    Boolean,
    Integer,
    Float,
    /// Reference to a game object by script name
    Object,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::String => write!(f, "String"),
            ValueType::Boolean => write!(f, "Boolean"),
            ValueType::Integer => write!(f, "Integer"),
            ValueType::Float => write!(f, "Float"),
            ValueType::Object => write!(f, "Object"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Nodes & Connections
// ─────────────────────────────────────────────────────────────────────────────

/// Default name of the single output port of non-branching nodes
pub const DEFAULT_OUTPUT_PORT: &str = "Output";
/// Default name of the single input port
pub const DEFAULT_INPUT_PORT: &str = "Input";

/// Position in the visual editor (for UI purposes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// A node instance within an entity's behavior graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorNode {
    /// Unique instance ID within the owning entity
    pub id: String,
    /// Node type (references a catalog entry or a variable node id)
    #[serde(rename = "type")]
    pub node_type: String,
    /// Category as recorded by the editor
    #[serde(default)]
    pub category: NodeCategory,
    /// Property values (string, boolean, number, or `$` placeholder)
    #[serde(default, alias = "config")]
    pub properties: serde_json::Map<String, serde_json::Value>,
    /// Position in the visual editor
    #[serde(default)]
    pub position: Position,
}

impl BehaviorNode {
    /// Create a node with no properties
    pub fn new(id: &str, node_type: &str, category: NodeCategory) -> Self {
        Self {
            id: id.to_string(),
            node_type: node_type.to_string(),
            category,
            properties: serde_json::Map::new(),
            position: Position::default(),
        }
    }

    /// Builder-style property setter
    pub fn with_property(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    /// Get a raw property value
    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties.get(name)
    }

    /// Check if this node is a graph root
    pub fn is_trigger(&self) -> bool {
        self.category == NodeCategory::Trigger
    }
}

/// A directed connection from an output port to an input port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConnection {
    pub from_node_id: String,
    pub from_port: String,
    pub to_node_id: String,
    #[serde(default = "default_input_port")]
    pub to_port: String,
}

fn default_input_port() -> String {
    DEFAULT_INPUT_PORT.to_string()
}

impl NodeConnection {
    /// Create a new connection
    pub fn new(from_node: &str, from_port: &str, to_node: &str, to_port: &str) -> Self {
        Self {
            from_node_id: from_node.to_string(),
            from_port: from_port.to_string(),
            to_node_id: to_node.to_string(),
            to_port: to_port.to_string(),
        }
    }

    /// Connect `from_port` of one node to the default input of another
    pub fn link(from_node: &str, from_port: &str, to_node: &str) -> Self {
        Self::new(from_node, from_port, to_node, DEFAULT_INPUT_PORT)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Variables
// ─────────────────────────────────────────────────────────────────────────────

/// Variable declared on an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityVariable {
    /// Variable name (unique per entity, case-insensitive)
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub var_type: ValueType,
    /// Default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    /// Whether other entities may read it via `$@Entity.Name`
    #[serde(default)]
    pub exposed: bool,
}

impl EntityVariable {
    /// Create a new private variable without a default
    pub fn new(name: &str, var_type: ValueType) -> Self {
        Self {
            name: name.to_string(),
            var_type,
            default: None,
            exposed: false,
        }
    }

    /// Set the default value
    pub fn with_default(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Mark the variable as readable from other entities
    pub fn exposed(mut self) -> Self {
        self.exposed = true;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Quest Entity
// ─────────────────────────────────────────────────────────────────────────────

/// A scripted entity: owns one behavior graph and its variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestEntity {
    /// Unique identifier within the project
    pub id: String,
    /// Script name used by the engine to bind this script
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_name: Option<String>,
    /// Thing definition this entity is placed as (informational)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    /// Region the entity lives in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Nodes in authoring order
    #[serde(default)]
    pub nodes: Vec<BehaviorNode>,
    /// Connections between nodes
    #[serde(default)]
    pub connections: Vec<NodeConnection>,
    /// Declared variables in authoring order
    #[serde(default)]
    pub variables: Vec<EntityVariable>,
}

impl QuestEntity {
    /// Create a new empty entity
    pub fn new(id: &str, script_name: &str) -> Self {
        Self {
            id: id.to_string(),
            script_name: Some(script_name.to_string()),
            definition: None,
            region: None,
            nodes: Vec::new(),
            connections: Vec::new(),
            variables: Vec::new(),
        }
    }

    /// Script name, falling back to the entity id
    pub fn script_name_or_id(&self) -> &str {
        self.script_name.as_deref().unwrap_or(&self.id)
    }

    /// Get a node by ID
    pub fn get_node(&self, id: &str) -> Option<&BehaviorNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Get all connections leaving a specific node port, in authoring order
    pub fn connections_from<'a>(
        &'a self,
        node_id: &'a str,
        port: &'a str,
    ) -> impl Iterator<Item = &'a NodeConnection> + 'a {
        self.connections
            .iter()
            .filter(move |c| c.from_node_id == node_id && c.from_port == port)
    }

    /// Get all connections leaving a node from any port, in authoring order
    pub fn connections_from_node<'a>(
        &'a self,
        node_id: &'a str,
    ) -> impl Iterator<Item = &'a NodeConnection> + 'a {
        self.connections
            .iter()
            .filter(move |c| c.from_node_id == node_id)
    }

    /// Look up a declared variable (case-insensitive)
    pub fn variable(&self, name: &str) -> Option<&EntityVariable> {
        self.variables
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(name))
    }

    /// Names that are declared more than once (case-insensitive)
    pub fn duplicate_variables(&self) -> Vec<&str> {
        let mut duplicates = Vec::new();
        for (i, var) in self.variables.iter().enumerate() {
            let seen_before = self.variables[..i]
                .iter()
                .any(|v| v.name.eq_ignore_ascii_case(&var.name));
            if seen_before {
                duplicates.push(var.name.as_str());
            }
        }
        duplicates
    }
}
