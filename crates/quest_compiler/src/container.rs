// Container Reward - Standalone script for a quest reward container
//
// The reward is not part of any behavior graph. It gets its own virtual entity
// script that spawns the container, fills it and hands the contents over when
// the quest completes.

use quest_types::{ContainerReward, QuestProject, SpawnLocation, ValueType};

use crate::compiler::{EntityScript, write_entity_header};
use crate::encoder::encode_literal;
use crate::lua::{LuaWriter, sanitize_identifier};

/// Distance from the marker used by `NearMarker` spawns
pub const NEAR_MARKER_RADIUS: &str = "2.0";

/// Table name of the reward's script
pub fn reward_table(reward: &ContainerReward) -> String {
    sanitize_identifier(&reward.script_name)
}

/// Emit the container reward script
pub fn compile_container_reward(project: &QuestProject, reward: &ContainerReward) -> EntityScript {
    let table = reward_table(reward);
    let string = |text: &str| encode_literal(&serde_json::Value::from(text), ValueType::String);

    let mut w = LuaWriter::new();
    write_entity_header(&mut w, "Container reward", &reward.script_name, project, &table);

    w.line("function Spawn()");
    w.indent();
    w.line(&format!(
        "local marker = Quest:GetThingWithScriptName({})",
        encode_literal(&serde_json::Value::from(reward.spawn_reference.as_str()), ValueType::Object)
    ));
    w.line("if marker == nil then");
    w.block("    return\nend");
    match reward.spawn {
        SpawnLocation::AtMarker => w.line("local position = marker:GetPosition()"),
        SpawnLocation::NearMarker => w.line(&format!(
            "local position = Quest:GetPositionNear(marker, {})",
            NEAR_MARKER_RADIUS
        )),
    }
    w.line(&format!(
        "Container = Quest:CreateObject({}, position, {})",
        string(&reward.container),
        string(&reward.script_name)
    ));
    for item in &reward.items {
        w.line(&format!(
            "Container:AddItem({}, {})",
            string(&item.definition),
            encode_literal(&serde_json::Value::from(item.count), ValueType::Integer)
        ));
    }
    w.dedent();
    w.line("end");
    w.blank();

    w.line("function GiveContents()");
    w.indent();
    w.line("if Container == nil then");
    w.block("    return\nend");
    w.line("Container:GiveContentsToHero()");
    if reward.remove_after_give {
        w.line("Container:Remove()");
        w.line("Container = nil");
    }
    w.dedent();
    w.line("end");
    w.blank();

    w.line("function Main()");
    w.indent();
    w.line("Spawn()");
    if reward.auto_give_on_complete {
        w.line("Quest:OnComplete(function()");
        w.block("    GiveContents()\nend)");
    }
    w.dedent();
    w.line("end");

    tracing::debug!(
        reward = %reward.script_name,
        items = reward.items.len(),
        "Compiled container reward"
    );

    EntityScript {
        script_name: reward.script_name.clone(),
        table,
        source: w.finish(),
        uses_action_queue: false,
        diagnostics: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_types::RewardItem;

    fn reward() -> ContainerReward {
        ContainerReward {
            container: "OBJECT_CHEST_SILVER".to_string(),
            script_name: "RewardChest".to_string(),
            spawn: SpawnLocation::AtMarker,
            spawn_reference: "MK_RewardSpot".to_string(),
            auto_give_on_complete: true,
            remove_after_give: false,
            items: vec![
                RewardItem::new("OBJECT_RING_GOLD", 1),
                RewardItem::new("OBJECT_POTION_HEALTH", 3),
            ],
        }
    }

    #[test]
    fn test_at_marker_with_items_in_order() {
        let project = QuestProject::new("Lost Ring");
        let script = compile_container_reward(&project, &reward());

        assert_eq!(script.table, "RewardChest");
        let src = &script.source;
        assert!(src.starts_with("-- Container reward: RewardChest\n-- Quest: Lost Ring\n"));
        assert!(src.contains("local _ENV = setmetatable(RewardChest, { __index = _G })\n"));
        assert!(src.contains("    local position = marker:GetPosition()\n"));
        assert!(src.contains(
            "    Container = Quest:CreateObject(\"OBJECT_CHEST_SILVER\", position, \"RewardChest\")\n"
        ));

        let ring = src.find("Container:AddItem(\"OBJECT_RING_GOLD\", 1)").unwrap();
        let potion = src.find("Container:AddItem(\"OBJECT_POTION_HEALTH\", 3)").unwrap();
        assert!(ring < potion);

        assert!(src.contains("    Quest:OnComplete(function()\n        GiveContents()\n    end)\n"));
        assert!(!src.contains("Container:Remove()"));
    }

    #[test]
    fn test_near_marker_and_remove_after_give() {
        let mut reward = reward();
        reward.spawn = SpawnLocation::NearMarker;
        reward.auto_give_on_complete = false;
        reward.remove_after_give = true;

        let script = compile_container_reward(&QuestProject::new("Lost Ring"), &reward);
        let src = &script.source;

        assert!(src.contains("local position = Quest:GetPositionNear(marker, 2.0)"));
        assert!(src.contains("    Container:Remove()\n"));
        assert!(!src.contains("Quest:OnComplete"));
    }
}
