//! Built-in Node Registration
//!
//! Registers all built-in node types (triggers, actions, queued actions,
//! conditions, flow control).

use quest_types::NodeCategory;

use crate::catalog::{CatalogError, NodeCatalog, NodeTypeSpec, PropertyDef};

/// Register all built-in nodes
pub fn register_builtin_nodes(catalog: &mut NodeCatalog) -> Result<(), CatalogError> {
    // Trigger nodes
    register_trigger_nodes(catalog)?;

    // Action nodes
    register_action_nodes(catalog)?;

    // Queued action nodes
    register_queued_nodes(catalog)?;

    // Condition nodes
    register_condition_nodes(catalog)?;

    // Flow control nodes
    register_flow_nodes(catalog)?;

    tracing::debug!("Registered {} built-in nodes", catalog.len());
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Trigger Nodes
// ─────────────────────────────────────────────────────────────────────────────

fn trigger(id: &str, name: &str, template: &str) -> NodeTypeSpec {
    NodeTypeSpec::new(id, NodeCategory::Trigger, template).named(name)
}

fn register_trigger_nodes(catalog: &mut NodeCatalog) -> Result<(), CatalogError> {
    catalog.register_all([
        trigger(
            "onQuestStart",
            "On Quest Start",
            "Quest:OnStart(function()\n    {CHILDREN}\nend)",
        )
        .with_description("Runs when the quest starts"),
        trigger(
            "onQuestComplete",
            "On Quest Complete",
            "Quest:OnComplete(function()\n    {CHILDREN}\nend)",
        ),
        trigger(
            "onTalk",
            "On Talk",
            "Me:OnTalk(function()\n    {CHILDREN}\nend)",
        )
        .with_description("Runs when the hero talks to this entity"),
        trigger(
            "onKilled",
            "On Killed",
            "Me:OnKilled(function()\n    {CHILDREN}\nend)",
        ),
        trigger(
            "onEnterRegion",
            "On Enter Region",
            "Quest:OnEnterRegion({region}, function()\n    {CHILDREN}\nend)",
        )
        .with_property(PropertyDef::string("region")),
        trigger(
            "onStateChanged",
            "On State Changed",
            "Quest:OnStateChanged({name}, function(value)\n    {CHILDREN}\nend)",
        )
        .with_property(PropertyDef::string("name"))
        .with_description("Runs when a persisted quest state changes"),
        trigger(
            "onTimer",
            "On Timer",
            "Quest:Every({seconds}, function()\n    {CHILDREN}\nend)",
        )
        .with_property(PropertyDef::float("seconds").with_default(10.0)),
        trigger(
            "onItemReceived",
            "On Item Received",
            "Quest:OnItemReceived({item}, function()\n    {CHILDREN}\nend)",
        )
        .with_property(PropertyDef::string("item")),
    ])
}

// ─────────────────────────────────────────────────────────────────────────────
// Action Nodes
// ─────────────────────────────────────────────────────────────────────────────

/// An action whose template is a single call followed by its continuation
fn action(id: &str, name: &str, call: &str) -> NodeTypeSpec {
    NodeTypeSpec::new(id, NodeCategory::Action, &format!("{}\n{{CHILDREN}}", call)).named(name)
}

fn set_state(id: &str, name: &str, setter: &str, value: PropertyDef) -> NodeTypeSpec {
    action(id, name, &format!("Quest:{}({{name}}, {{value}})", setter))
        .with_property(PropertyDef::string("name"))
        .with_property(value)
}

fn register_action_nodes(catalog: &mut NodeCatalog) -> Result<(), CatalogError> {
    catalog.register_all([
        action("showMessage", "Show Message", "Quest:ShowMessage({text}, {duration})")
            .with_property(PropertyDef::string("text"))
            .with_property(PropertyDef::float("duration").with_default(5.0)),
        action("speak", "Speak", "Me:Speak({line})").with_property(PropertyDef::string("line")),
        set_state(
            "setStateBool",
            "Set State (Bool)",
            "SetStateBool",
            PropertyDef::boolean("value"),
        ),
        set_state(
            "setStateInt",
            "Set State (Int)",
            "SetStateInt",
            PropertyDef::integer("value"),
        ),
        set_state(
            "setStateFloat",
            "Set State (Float)",
            "SetStateFloat",
            PropertyDef::float("value"),
        ),
        set_state(
            "setStateString",
            "Set State (String)",
            "SetStateString",
            PropertyDef::string("value"),
        ),
        action("giveItem", "Give Item", "Quest:GiveItemToHero({item}, {count})")
            .with_property(PropertyDef::string("item"))
            .with_property(PropertyDef::integer("count").with_default(1)),
        action("giveGold", "Give Gold", "Quest:GiveGoldToHero({amount})")
            .with_property(PropertyDef::integer("amount")),
        action(
            "giveExperience",
            "Give Experience",
            "Quest:GiveExperienceToHero({amount})",
        )
        .with_property(PropertyDef::integer("amount")),
        action("playAnimation", "Play Animation", "Me:PlayAnimation({animation})")
            .with_property(PropertyDef::string("animation")),
        action(
            "moveToMarker",
            "Move To Marker",
            "Me:MoveTo(Quest:GetThingWithScriptName({marker}))",
        )
        .with_property(PropertyDef::object("marker")),
        action("followHero", "Follow Hero", "Me:FollowHero()"),
        action(
            "spawnCreature",
            "Spawn Creature",
            "Quest:CreateCreature({definition}, Quest:GetThingWithScriptName({marker}), {scriptName})",
        )
        .with_property(PropertyDef::string("definition"))
        .with_property(PropertyDef::object("marker"))
        .with_property(PropertyDef::string("scriptName")),
        action("wait", "Wait", "Quest:Wait({seconds})")
            .with_property(PropertyDef::float("seconds").with_default(1.0)),
        action("completeQuest", "Complete Quest", "Quest:Complete()"),
        action("failQuest", "Fail Quest", "Quest:Fail()"),
        action("log", "Log", "Quest:Log({message})").with_property(PropertyDef::string("message")),
    ])
}

// ─────────────────────────────────────────────────────────────────────────────
// Queued Action Nodes
// ─────────────────────────────────────────────────────────────────────────────

/// A deferred action on a thing that may not be loaded yet.
///
/// The attempt fails (and is retried) until the target can be found.
fn queued_on_target(id: &str, name: &str, call: &str) -> NodeTypeSpec {
    let body = format!(
        "local target = Quest:GetThingWithScriptName({{target}})\n\
         if target == nil then\n    return false\nend\n\
         {}\n\
         return true",
        call
    );
    NodeTypeSpec::new(id, NodeCategory::Action, &body)
        .named(name)
        .with_property(PropertyDef::object("target"))
        .queued()
}

fn register_queued_nodes(catalog: &mut NodeCatalog) -> Result<(), CatalogError> {
    catalog.register_all([
        queued_on_target("addMapMarker", "Add Map Marker", "target:AddMapMarker()")
            .with_description("Marks the target on the map once it exists"),
        queued_on_target("addItemToEntity", "Add Item To Entity", "target:AddItem({item})")
            .with_property(PropertyDef::string("item")),
        queued_on_target("setEntityHostile", "Set Entity Hostile", "target:SetHostile(true)"),
    ])
}

// ─────────────────────────────────────────────────────────────────────────────
// Condition Nodes
// ─────────────────────────────────────────────────────────────────────────────

/// A `True`/`False` branch on a single Lua expression
fn condition(id: &str, name: &str, expression: &str) -> NodeTypeSpec {
    let template = format!(
        "if {} then\n    {{True}}\nelse\n    {{False}}\nend",
        expression
    );
    NodeTypeSpec::new(id, NodeCategory::Condition, &template).named(name)
}

fn register_condition_nodes(catalog: &mut NodeCatalog) -> Result<(), CatalogError> {
    catalog.register_all([
        condition("checkStateBool", "Check State (Bool)", "Quest:GetStateBool({name})")
            .with_property(PropertyDef::string("name")),
        condition(
            "checkStateInt",
            "Check State (Int)",
            "Quest:GetStateInt({name}) >= {value}",
        )
        .with_property(PropertyDef::string("name"))
        .with_property(PropertyDef::integer("value")),
        condition(
            "checkStateString",
            "Check State (String)",
            "Quest:GetStateString({name}) == {value}",
        )
        .with_property(PropertyDef::string("name"))
        .with_property(PropertyDef::string("value")),
        condition("heroHasItem", "Hero Has Item", "Quest:HeroHasItem({item})")
            .with_property(PropertyDef::string("item")),
        NodeTypeSpec::new(
            "askQuestion",
            NodeCategory::Condition,
            "local answer = Me:AskQuestion({question}, {{ \"Yes\", \"No\", \"Unsure\" }})\n\
             if answer == 1 then\n    {Yes}\n\
             elseif answer == 2 then\n    {No}\n\
             else\n    {Unsure}\n\
             end",
        )
        .named("Ask Question")
        .with_outputs(&["Yes", "No", "Unsure"])
        .with_property(PropertyDef::string("question")),
    ])
}

// ─────────────────────────────────────────────────────────────────────────────
// Flow Nodes
// ─────────────────────────────────────────────────────────────────────────────

fn register_flow_nodes(catalog: &mut NodeCatalog) -> Result<(), CatalogError> {
    catalog.register_all([
        NodeTypeSpec::new("reroute", NodeCategory::Flow, "{CHILDREN}")
            .named("Reroute")
            .with_description("Pass-through used to tidy up wires"),
        NodeTypeSpec::new("sequence", NodeCategory::Flow, "{Then1}\n{Then2}\n{Then3}")
            .named("Sequence")
            .with_outputs(&["Then1", "Then2", "Then3"]),
        NodeTypeSpec::new(
            "randomBranch",
            NodeCategory::Flow,
            "if math.random() < 0.5 then\n    {A}\nelse\n    {B}\nend",
        )
        .named("Random Branch")
        .with_outputs(&["A", "B"]),
    ])
}
