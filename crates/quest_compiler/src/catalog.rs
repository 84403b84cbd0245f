// Node Type Catalog - Maps node type ids to their port layout and code template
//
// The catalog holds every node type a graph may reference: the built-ins from
// `register_builtin_nodes` and project-defined entries loaded from TOML. Entries
// are validated and their templates parsed when they are registered, so the
// compiler itself never sees a malformed entry.

use std::borrow::Cow;
use std::collections::BTreeMap;

use quest_types::{DEFAULT_INPUT_PORT, DEFAULT_OUTPUT_PORT, NodeCategory, ValueType};
use serde::{Deserialize, Serialize};

use crate::resolver::VariableScope;
use crate::template::{Template, TemplateError};
use crate::variable_nodes;

/// Default output ports of branching nodes
pub const DEFAULT_BRANCH_PORTS: [&str; 2] = ["True", "False"];

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Catalog registration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("node type id must not be empty")]
    EmptyTypeId,

    #[error("node type '{0}' is already registered")]
    DuplicateType(String),

    #[error("node type '{type_id}' declares port '{port}' more than once")]
    DuplicatePort { type_id: String, port: String },

    #[error("node type '{type_id}' declares property '{property}' more than once")]
    DuplicateProperty { type_id: String, property: String },

    #[error("node type '{type_id}' has an invalid template: {source}")]
    InvalidTemplate {
        type_id: String,
        #[source]
        source: TemplateError,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Property Schema
// ─────────────────────────────────────────────────────────────────────────────

/// A property a node type accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertyDef {
    pub fn new(name: &str, value_type: ValueType) -> Self {
        Self {
            name: name.to_string(),
            value_type,
            default: None,
            description: None,
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, ValueType::String)
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, ValueType::Boolean)
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, ValueType::Integer)
    }

    pub fn float(name: &str) -> Self {
        Self::new(name, ValueType::Float)
    }

    pub fn object(name: &str) -> Self {
        Self::new(name, ValueType::Object)
    }

    pub fn with_default(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node Type Spec (unvalidated)
// ─────────────────────────────────────────────────────────────────────────────

/// Node type as written by hand, before validation.
///
/// This is the shape of a `[[node]]` table in a `*.nodes.toml` file. Omitted
/// port lists fall back to the category defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTypeSpec {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub category: NodeCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<String>>,
    #[serde(default, rename = "property", alias = "properties")]
    pub properties: Vec<PropertyDef>,
    pub template: String,
    #[serde(default)]
    pub queued: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NodeTypeSpec {
    pub fn new(id: &str, category: NodeCategory, template: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            category,
            inputs: None,
            outputs: None,
            properties: Vec::new(),
            template: template.to_string(),
            queued: false,
            description: None,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_outputs(mut self, ports: &[&str]) -> Self {
        self.outputs = Some(ports.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn with_property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn queued(mut self) -> Self {
        self.queued = true;
        self
    }

    /// Validate the entry and parse its template
    pub fn build(self) -> Result<NodeTypeDef, CatalogError> {
        if self.id.trim().is_empty() {
            return Err(CatalogError::EmptyTypeId);
        }

        let inputs = self
            .inputs
            .unwrap_or_else(|| default_inputs(self.category));
        let outputs = self
            .outputs
            .unwrap_or_else(|| default_outputs(self.category));

        if let Some(port) = first_duplicate(inputs.iter().chain(outputs.iter()).map(|p| p.as_str())) {
            return Err(CatalogError::DuplicatePort {
                type_id: self.id,
                port: port.to_string(),
            });
        }
        if let Some(property) = first_duplicate(self.properties.iter().map(|p| p.name.as_str())) {
            return Err(CatalogError::DuplicateProperty {
                type_id: self.id,
                property: property.to_string(),
            });
        }

        let template = match Template::parse(&self.template, &outputs, &self.properties, self.queued) {
            Ok(template) => template,
            Err(source) => {
                return Err(CatalogError::InvalidTemplate {
                    type_id: self.id,
                    source,
                });
            }
        };

        Ok(NodeTypeDef {
            name: self.name.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            category: self.category,
            inputs,
            outputs,
            properties: self.properties,
            template,
            queued: self.queued,
            description: self.description,
        })
    }
}

fn default_inputs(category: NodeCategory) -> Vec<String> {
    match category {
        NodeCategory::Trigger => Vec::new(),
        _ => vec![DEFAULT_INPUT_PORT.to_string()],
    }
}

fn default_outputs(category: NodeCategory) -> Vec<String> {
    if category.is_branching() {
        DEFAULT_BRANCH_PORTS.iter().map(|p| p.to_string()).collect()
    } else {
        vec![DEFAULT_OUTPUT_PORT.to_string()]
    }
}

fn first_duplicate<'a>(names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    for name in names {
        if seen.contains(&name) {
            return Some(name);
        }
        seen.push(name);
    }
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Node Type Definition (validated)
// ─────────────────────────────────────────────────────────────────────────────

/// A validated catalog entry
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTypeDef {
    pub id: String,
    pub name: String,
    pub category: NodeCategory,
    pub inputs: Vec<String>,
    /// Ordered output ports
    pub outputs: Vec<String>,
    pub properties: Vec<PropertyDef>,
    pub template: Template,
    /// Template is a deferred attempt run through the action queue
    pub queued: bool,
    pub description: Option<String>,
}

impl NodeTypeDef {
    /// Get a property schema by name
    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Check if this node has more than one output port
    pub fn is_branching(&self) -> bool {
        self.outputs.len() > 1
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node Catalog
// ─────────────────────────────────────────────────────────────────────────────

/// Registry of all available node types
#[derive(Debug, Clone, Default)]
pub struct NodeCatalog {
    nodes: BTreeMap<String, NodeTypeDef>,
}

impl NodeCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding the built-in node types
    pub fn builtin() -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        crate::nodes::register_builtin_nodes(&mut catalog)?;
        Ok(catalog)
    }

    /// Validate and register a node type
    pub fn register(&mut self, spec: NodeTypeSpec) -> Result<(), CatalogError> {
        if self.nodes.contains_key(&spec.id) {
            return Err(CatalogError::DuplicateType(spec.id));
        }
        let def = spec.build()?;
        tracing::trace!(node_type = %def.id, category = %def.category, "Registered node type");
        self.nodes.insert(def.id.clone(), def);
        Ok(())
    }

    /// Register several node types, stopping at the first invalid one
    pub fn register_all(
        &mut self,
        specs: impl IntoIterator<Item = NodeTypeSpec>,
    ) -> Result<(), CatalogError> {
        for spec in specs {
            self.register(spec)?;
        }
        Ok(())
    }

    /// Get a registered node type by id
    pub fn get(&self, id: &str) -> Option<&NodeTypeDef> {
        self.nodes.get(id)
    }

    /// Resolve a node type id for one entity.
    ///
    /// Registered entries win; otherwise variable get/set nodes are
    /// synthesized from the entity's variable tables.
    pub fn lookup<'a>(&'a self, id: &str, scope: &VariableScope<'_>) -> Option<Cow<'a, NodeTypeDef>> {
        if let Some(def) = self.nodes.get(id) {
            return Some(Cow::Borrowed(def));
        }
        if !variable_nodes::is_variable_node_id(id) {
            return None;
        }
        variable_nodes::synthesize(id, scope).map(Cow::Owned)
    }

    /// Check if a node type is registered
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// All registered definitions, ordered by id
    pub fn definitions(&self) -> impl Iterator<Item = &NodeTypeDef> {
        self.nodes.values()
    }

    /// Get nodes by category
    pub fn nodes_in_category(&self, category: NodeCategory) -> Vec<&NodeTypeDef> {
        self.nodes
            .values()
            .filter(|def| def.category == category)
            .collect()
    }

    /// Get all categories in use
    pub fn categories(&self) -> Vec<NodeCategory> {
        let mut cats: Vec<_> = Vec::new();
        for def in self.nodes.values() {
            if !cats.contains(&def.category) {
                cats.push(def.category);
            }
        }
        cats
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
