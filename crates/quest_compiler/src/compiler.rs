// Quest Compiler - Turns a quest project into Lua scripts
//
// One script per entity (its behavior graph under `Main(Me)`), one quest
// script (state init, persistence and the optional action queue) and one
// script for the container reward if the quest has one.
//
// Compilation is pure: the same project and catalog always give
// byte-identical output, and nothing here touches the filesystem.

use quest_types::{QuestEntity, QuestProject, StateDeclaration, StateType};
use serde::Serialize;

use crate::action_queue::{TaskBinding, emit_action_queue, is_queue_state, queue_states};
use crate::catalog::{CatalogError, NodeCatalog};
use crate::container::{compile_container_reward, reward_table};
use crate::diagnostics::Diagnostic;
use crate::encoder::{encode_literal, zero_literal};
use crate::lua::{LuaWriter, mangle_variable, quote_lua_string, sanitize_identifier};
use crate::resolver::VariableScope;
use crate::walker::{GraphWalker, is_root};

/// Banner line written at the top of every generated script
pub const GENERATED_BANNER: &str = "Generated by questc. Manual edits are overwritten on export.";

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

/// A compiled entity (or container reward) script
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityScript {
    /// Script name as authored
    pub script_name: String,
    /// Lua table the script populates; also its file stem on export
    pub table: String,
    pub source: String,
    pub uses_action_queue: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// All scripts produced for one quest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuest {
    /// Lua table of the quest script; also its file stem on export
    pub quest_table: String,
    pub quest_script: String,
    pub entities: Vec<EntityScript>,
    pub container: Option<EntityScript>,
    pub uses_action_queue: bool,
}

impl CompiledQuest {
    /// Every diagnostic, paired with the script name it was reported in
    pub fn diagnostics(&self) -> impl Iterator<Item = (&str, &Diagnostic)> {
        self.entities
            .iter()
            .flat_map(|e| e.diagnostics.iter().map(move |d| (e.script_name.as_str(), d)))
    }

    /// Entity scripts followed by the container script, if any
    pub fn scripts(&self) -> impl Iterator<Item = &EntityScript> {
        self.entities.iter().chain(self.container.iter())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Compiler
// ─────────────────────────────────────────────────────────────────────────────

/// Compiles quest projects against a node catalog
#[derive(Debug, Clone)]
pub struct QuestCompiler {
    catalog: NodeCatalog,
}

impl QuestCompiler {
    pub fn new(catalog: NodeCatalog) -> Self {
        Self { catalog }
    }

    /// Compiler using only the built-in node types
    pub fn with_builtin_nodes() -> Result<Self, CatalogError> {
        Ok(Self::new(NodeCatalog::builtin()?))
    }

    pub fn catalog(&self) -> &NodeCatalog {
        &self.catalog
    }

    /// Compile every script of a quest
    pub fn compile_quest(&self, project: &QuestProject) -> CompiledQuest {
        let quest_table = quest_table(project);

        let entities: Vec<EntityScript> = project
            .entities
            .iter()
            .map(|entity| self.compile_entity(project, entity))
            .collect();

        let uses_action_queue =
            entities.iter().any(|e| e.uses_action_queue) || self.references_queued_node(project);

        let container = project
            .reward
            .as_ref()
            .map(|reward| compile_container_reward(project, reward));

        let quest_script = self.emit_quest_script(project, &quest_table, uses_action_queue);

        tracing::debug!(
            quest = %project.name,
            entities = entities.len(),
            uses_action_queue,
            "Compiled quest"
        );

        CompiledQuest {
            quest_table,
            quest_script,
            entities,
            container,
            uses_action_queue,
        }
    }

    /// Compile the script of one entity of `project`
    pub fn compile_entity(&self, project: &QuestProject, entity: &QuestEntity) -> EntityScript {
        let script_name = entity.script_name_or_id().to_string();
        let table = entity_table(entity);
        let quest_table = quest_table(project);
        let scope = VariableScope::new(project, entity);

        let mut w = LuaWriter::new();
        write_entity_header(&mut w, "Entity script", &script_name, project, &table);

        for variable in &entity.variables {
            let value = match &variable.default {
                Some(default) => encode_literal(default, variable.var_type),
                None => zero_literal(variable.var_type).to_string(),
            };
            w.line(&format!("{} = {}", mangle_variable(&variable.name), value));
        }
        if !entity.variables.is_empty() {
            w.blank();
        }

        let mut diagnostics = Vec::new();
        let mut uses_action_queue = false;

        w.line("function Main(Me)");
        w.indent();
        if entity.nodes.is_empty() {
            let diagnostic = Diagnostic::empty_graph();
            w.line(&diagnostic.to_comment());
            diagnostics.push(diagnostic);
        } else if !entity.nodes.iter().any(|n| is_root(&self.catalog, n)) {
            let diagnostic = Diagnostic::missing_trigger(entity.nodes.len());
            w.line(&diagnostic.to_comment());
            diagnostics.push(diagnostic);
        } else {
            let walk = GraphWalker::new(&self.catalog, scope, &quest_table).walk();
            for (i, trigger) in walk.triggers.iter().enumerate() {
                if i > 0 {
                    w.blank();
                }
                w.block(trigger);
            }
            diagnostics.extend(walk.diagnostics);
            uses_action_queue = walk.uses_action_queue;
        }
        w.dedent();
        w.line("end");

        tracing::debug!(
            entity = %script_name,
            nodes = entity.nodes.len(),
            diagnostics = diagnostics.len(),
            "Compiled entity"
        );

        EntityScript {
            script_name,
            table,
            source: w.finish(),
            uses_action_queue,
            diagnostics,
        }
    }

    /// Any node anywhere in the quest, reachable or not, is a queued action
    fn references_queued_node(&self, project: &QuestProject) -> bool {
        project
            .entities
            .iter()
            .flat_map(|e| e.nodes.iter())
            .any(|n| self.catalog.get(&n.node_type).is_some_and(|def| def.queued))
    }

    fn emit_quest_script(&self, project: &QuestProject, table: &str, uses_action_queue: bool) -> String {
        let states = persisted_states(project, uses_action_queue);

        let mut w = LuaWriter::new();
        w.comment(&format!("Quest script: {}", project.script_name()));
        w.comment(&format!("Quest: {}", project.name));
        w.comment(GENERATED_BANNER);
        w.blank();
        w.line(&format!("{} = {{}}", table));
        w.blank();

        w.line(&format!("function {}.Init()", table));
        w.indent();
        for state in &states {
            let value = match &state.default {
                Some(default) => encode_literal(default, state.state_type.value_type()),
                None => zero_literal(state.state_type.value_type()).to_string(),
            };
            w.line(&format!(
                "Quest:{}({}, {})",
                state_setter(state.state_type),
                quote_lua_string(&state.name),
                value
            ));
        }
        if let Some(reward) = &project.reward {
            w.line(&format!("{}.Main()", reward_table(reward)));
        }
        w.dedent();
        w.line("end");
        w.blank();

        w.line(&format!("function {}.OnPersist(context)", table));
        w.indent();
        for state in &states {
            w.line(&format!(
                "Quest:{}(context, {})",
                persist_transfer(state.state_type),
                quote_lua_string(&state.name)
            ));
        }
        w.dedent();
        w.line("end");

        if uses_action_queue {
            w.blank();
            emit_action_queue(&mut w, table, TaskBinding::for_project(project));
        }

        w.finish()
    }
}

/// Lua table of the quest script
pub fn quest_table(project: &QuestProject) -> String {
    sanitize_identifier(project.script_name())
}

/// Lua table (and exported file stem) of an entity script
pub fn entity_table(entity: &QuestEntity) -> String {
    sanitize_identifier(entity.script_name_or_id())
}

/// Declared states plus the queue states. The queue states always carry the
/// protocol's own type and default; a user declaration of the same name is
/// replaced.
fn persisted_states(project: &QuestProject, uses_action_queue: bool) -> Vec<StateDeclaration> {
    if !uses_action_queue {
        return project.states.clone();
    }

    let mut states: Vec<StateDeclaration> = project
        .states
        .iter()
        .filter(|s| !is_queue_state(&s.name))
        .cloned()
        .collect();
    states.extend(queue_states());
    states
}

/// `Quest:SetStateX` used to initialize a state
pub fn state_setter(state_type: StateType) -> &'static str {
    match state_type {
        StateType::Bool => "SetStateBool",
        StateType::Int => "SetStateInt",
        StateType::Float => "SetStateFloat",
        StateType::String => "SetStateString",
    }
}

/// `Quest:PersistTransferX` used to save and restore a state
pub fn persist_transfer(state_type: StateType) -> &'static str {
    match state_type {
        StateType::Bool => "PersistTransferBool",
        StateType::Int => "PersistTransferInt",
        StateType::Float | StateType::String => "PersistTransferString",
    }
}

/// Header comments plus the per-script environment table
pub(crate) fn write_entity_header(
    w: &mut LuaWriter,
    kind: &str,
    script_name: &str,
    project: &QuestProject,
    table: &str,
) {
    w.comment(&format!("{}: {}", kind, script_name));
    w.comment(&format!("Quest: {}", project.name));
    w.comment(GENERATED_BANNER);
    w.blank();
    w.line(&format!("{} = {{}}", table));
    w.line(&format!("local _ENV = setmetatable({}, {{ __index = _G }})", table));
    w.blank();
}
