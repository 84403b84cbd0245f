//! Action Queue Protocol
//!
//! Some actions target things that may not be loaded when the graph runs.
//! Those are enqueued as closures returning `true` on success and retried by a
//! cooperative background task until they succeed:
//!
//! ```text
//! EnqueueAction ──► PendingActions[Enqueued] ──► ProcessAllActions (task)
//!                                                   └─ ProcessNextAction ── Yield ──┐
//!                                                          ▲                        │
//!                                                          └────────────────────────┘
//! ```
//!
//! Both counters and the stop flag are persisted quest states. `Processed`
//! only advances when the action at that index succeeds, so actions complete
//! strictly in the order they were enqueued. There is no timeout; setting
//! `ActionQueue_Stop` is the only way to end the task early.

use quest_types::{QuestProject, StateDeclaration, StateType};

use crate::lua::{LuaWriter, quote_lua_string};

pub const ENQUEUED_STATE: &str = "ActionQueue_Enqueued";
pub const PROCESSED_STATE: &str = "ActionQueue_Processed";
pub const STOP_STATE: &str = "ActionQueue_Stop";

/// Persisted states the protocol relies on, with their initial values
pub fn queue_states() -> [StateDeclaration; 3] {
    [
        StateDeclaration::new(ENQUEUED_STATE, StateType::Int).with_default(0),
        StateDeclaration::new(PROCESSED_STATE, StateType::Int).with_default(0),
        StateDeclaration::new(STOP_STATE, StateType::Bool).with_default(false),
    ]
}

/// Whether `name` is one of the protocol's own states
pub fn is_queue_state(name: &str) -> bool {
    [ENQUEUED_STATE, PROCESSED_STATE, STOP_STATE].contains(&name)
}

/// How the background task is launched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskBinding<'a> {
    /// `Quest:StartRegionTask(<region>, ...)`
    Region(&'a str),
    /// `Quest:StartTask(...)`
    Unbound,
}

impl<'a> TaskBinding<'a> {
    /// First quest region, else the first entity that declares one
    pub fn for_project(project: &'a QuestProject) -> Self {
        project
            .primary_region()
            .or_else(|| project.entities.iter().find_map(|e| e.region.as_deref()))
            .map_or(TaskBinding::Unbound, TaskBinding::Region)
    }

    fn launch(&self, table: &str) -> String {
        match self {
            TaskBinding::Region(region) => format!(
                "Quest:StartRegionTask({}, {}.ProcessAllActions)",
                quote_lua_string(region),
                table
            ),
            TaskBinding::Unbound => format!("Quest:StartTask({}.ProcessAllActions)", table),
        }
    }
}

/// Emit the queue functions for the quest table `table`
pub fn emit_action_queue(w: &mut LuaWriter, table: &str, binding: TaskBinding<'_>) {
    let enqueued = quote_lua_string(ENQUEUED_STATE);
    let processed = quote_lua_string(PROCESSED_STATE);
    let stop = quote_lua_string(STOP_STATE);

    w.comment("Action queue");
    w.line(&format!("{}.PendingActions = {{}}", table));
    w.line(&format!("{}.TaskRunning = false", table));
    w.blank();

    w.line(&format!("function {}.EnqueueAction(action)", table));
    w.indent();
    w.line(&format!("local index = Quest:GetStateInt({})", enqueued));
    w.line(&format!("{}.PendingActions[index] = action", table));
    w.line(&format!("Quest:SetStateInt({}, index + 1)", enqueued));
    w.line(&format!("if not {}.TaskRunning then", table));
    w.indent();
    w.line(&format!("{}.TaskRunning = true", table));
    w.line(&binding.launch(table));
    w.dedent();
    w.line("end");
    w.dedent();
    w.line("end");
    w.blank();

    // A slot with no closure (lost across a reload) counts as done
    w.line(&format!("function {}.ProcessNextAction()", table));
    w.indent();
    w.line(&format!("if Quest:GetStateBool({}) then", stop));
    w.block("    return false\nend");
    w.line(&format!("local processed = Quest:GetStateInt({})", processed));
    w.line(&format!("if processed >= Quest:GetStateInt({}) then", enqueued));
    w.block("    return false\nend");
    w.line(&format!("local action = {}.PendingActions[processed]", table));
    w.line("if action == nil or action() then");
    w.indent();
    w.line(&format!("{}.PendingActions[processed] = nil", table));
    w.line(&format!("Quest:SetStateInt({}, processed + 1)", processed));
    w.line("return true");
    w.dedent();
    w.line("end");
    w.line("return false");
    w.dedent();
    w.line("end");
    w.blank();

    w.line(&format!("function {}.ProcessAllActions()", table));
    w.indent();
    w.line(&format!("while not Quest:GetStateBool({}) do", stop));
    w.indent();
    w.line(&format!(
        "if Quest:GetStateInt({}) >= Quest:GetStateInt({}) then",
        processed, enqueued
    ));
    w.block("    break\nend");
    w.line(&format!("{}.ProcessNextAction()", table));
    w.line("Quest:Yield()");
    w.dedent();
    w.line("end");
    w.line(&format!("{}.TaskRunning = false", table));
    w.dedent();
    w.line("end");
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_types::QuestEntity;

    fn emit(binding: TaskBinding<'_>) -> String {
        let mut w = LuaWriter::new();
        emit_action_queue(&mut w, "LostRing", binding);
        w.finish()
    }

    #[test]
    fn test_binding_prefers_quest_region() {
        let mut project = QuestProject::new("Lost Ring");
        let mut entity = QuestEntity::new("guard", "Guard_Bob");
        entity.region = Some("Oakvale".to_string());
        project.entities.push(entity);

        assert_eq!(TaskBinding::for_project(&project), TaskBinding::Region("Oakvale"));

        project.regions = vec!["Bowerstone".to_string(), "Oakvale".to_string()];
        assert_eq!(TaskBinding::for_project(&project), TaskBinding::Region("Bowerstone"));
    }

    #[test]
    fn test_binding_without_regions() {
        let project = QuestProject::new("Lost Ring");
        assert_eq!(TaskBinding::for_project(&project), TaskBinding::Unbound);
        assert!(emit(TaskBinding::Unbound).contains("Quest:StartTask(LostRing.ProcessAllActions)"));
    }

    #[test]
    fn test_protocol_functions() {
        let lua = emit(TaskBinding::Region("Bowerstone"));

        assert!(lua.contains("function LostRing.EnqueueAction(action)\n"));
        assert!(lua.contains("function LostRing.ProcessNextAction()\n"));
        assert!(lua.contains("function LostRing.ProcessAllActions()\n"));
        assert!(lua.contains(
            "        Quest:StartRegionTask(\"Bowerstone\", LostRing.ProcessAllActions)\n"
        ));
        assert!(lua.contains("    while not Quest:GetStateBool(\"ActionQueue_Stop\") do\n"));
        assert!(lua.contains("        Quest:Yield()\n"));
        assert!(lua.contains(
            "        Quest:SetStateInt(\"ActionQueue_Processed\", processed + 1)\n"
        ));
    }

    #[test]
    fn test_stop_flag_checked_before_each_attempt() {
        let lua = emit(TaskBinding::Unbound);
        let next = lua.find("function LostRing.ProcessNextAction()").unwrap();
        let stop_check = lua[next..].find("ActionQueue_Stop").unwrap();
        let attempt = lua[next..].find("action()").unwrap();
        assert!(stop_check < attempt);
    }

    #[test]
    fn test_queue_states() {
        let states = queue_states();
        assert_eq!(states[0].name, ENQUEUED_STATE);
        assert_eq!(states[1].state_type, StateType::Int);
        assert_eq!(states[2].default, Some(serde_json::json!(false)));
    }
}
