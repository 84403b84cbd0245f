//! Variable Node Factory
//!
//! Variable get/set nodes are not registered up front: their type id names
//! the variable, so entries are synthesized per lookup from the entity's
//! variable tables.
//!
//! | Type id                              | Reads / writes           |
//! |--------------------------------------|--------------------------|
//! | `var_get_<Var>` / `var_set_<Var>`    | current entity           |
//! | `var_get_ext_<Entity>.<Var>` / `var_set_ext_<Entity>.<Var>` | another entity |
//!
//! The `_ext_` forms are tried first. If the external reference does not
//! resolve, the id is retried as a local form (so a local variable literally
//! named `ext_Foo.Bar` still works).

use quest_types::{DEFAULT_INPUT_PORT, DEFAULT_OUTPUT_PORT, EntityVariable, NodeCategory};

use crate::catalog::{NodeTypeDef, PropertyDef};
use crate::lua::{mangle_external_variable, mangle_variable};
use crate::resolver::VariableScope;
use crate::template::{Template, TemplateSegment};

pub const VAR_GET_EXT_PREFIX: &str = "var_get_ext_";
pub const VAR_SET_EXT_PREFIX: &str = "var_set_ext_";
pub const VAR_GET_PREFIX: &str = "var_get_";
pub const VAR_SET_PREFIX: &str = "var_set_";

/// Name of the property a set node writes
pub const SET_VALUE_PROPERTY: &str = "value";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Get,
    Set,
}

/// Prefixes in the order they are tried
const PREFIXES: [(&str, Access, bool); 4] = [
    (VAR_GET_EXT_PREFIX, Access::Get, true),
    (VAR_SET_EXT_PREFIX, Access::Set, true),
    (VAR_GET_PREFIX, Access::Get, false),
    (VAR_SET_PREFIX, Access::Set, false),
];

/// Check if a type id has a variable node prefix
pub fn is_variable_node_id(id: &str) -> bool {
    PREFIXES.iter().any(|(prefix, _, _)| id.starts_with(prefix))
}

/// Build the catalog entry for a variable node, if `id` names a declared variable
pub fn synthesize(id: &str, scope: &VariableScope<'_>) -> Option<NodeTypeDef> {
    for (prefix, access, external) in PREFIXES {
        let Some(rest) = id.strip_prefix(prefix) else {
            continue;
        };

        if external {
            let Some((entity, name)) = rest.rsplit_once('.') else {
                continue;
            };
            if let Some((owner, variable)) = scope.external(entity, name) {
                let ident = mangle_external_variable(owner.script_name_or_id(), &variable.name);
                return Some(build(id, access, ident, variable));
            }
        } else if let Some(variable) = scope.local(rest) {
            return Some(build(id, access, mangle_variable(&variable.name), variable));
        }
    }

    None
}

fn build(id: &str, access: Access, ident: String, variable: &EntityVariable) -> NodeTypeDef {
    let output = TemplateSegment::Continuation(DEFAULT_OUTPUT_PORT.to_string());

    let (name, properties, segments) = match access {
        Access::Get => (
            format!("Get {}", variable.name),
            Vec::new(),
            vec![TemplateSegment::Literal(format!("local value = {}\n", ident)), output],
        ),
        Access::Set => {
            let mut value = PropertyDef::new(SET_VALUE_PROPERTY, variable.var_type);
            value.default = variable.default.clone();
            (
                format!("Set {}", variable.name),
                vec![value],
                vec![
                    TemplateSegment::Literal(format!("{} = ", ident)),
                    TemplateSegment::Property(SET_VALUE_PROPERTY.to_string()),
                    TemplateSegment::Literal("\n".to_string()),
                    output,
                ],
            )
        }
    };

    NodeTypeDef {
        id: id.to_string(),
        name,
        category: NodeCategory::Variable,
        inputs: vec![DEFAULT_INPUT_PORT.to_string()],
        outputs: vec![DEFAULT_OUTPUT_PORT.to_string()],
        properties,
        template: Template::from_segments(segments),
        queued: false,
        description: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_types::{QuestEntity, QuestProject, ValueType};
    use serde_json::json;

    fn project() -> QuestProject {
        let mut project = QuestProject::new("Lost Ring");

        let mut guard = QuestEntity::new("guard", "Guard_Bob");
        guard
            .variables
            .push(EntityVariable::new("Alerted", ValueType::Boolean).with_default(true));
        guard
            .variables
            .push(EntityVariable::new("ext_Odd.Name", ValueType::String));
        project.entities.push(guard);

        let mut merchant = QuestEntity::new("merchant", "Merchant_Sal");
        merchant
            .variables
            .push(EntityVariable::new("Gold", ValueType::Integer).exposed());
        project.entities.push(merchant);

        project
    }

    #[test]
    fn test_local_get() {
        let project = project();
        let scope = VariableScope::new(&project, &project.entities[0]);

        let def = synthesize("var_get_alerted", &scope).unwrap();
        assert_eq!(def.category, NodeCategory::Variable);
        assert_eq!(
            def.template.segments()[0],
            TemplateSegment::Literal("local value = var_Alerted\n".to_string())
        );
        assert_eq!(def.template.continuation_ports().collect::<Vec<_>>(), vec!["Output"]);
    }

    #[test]
    fn test_local_set_types_value_with_variable() {
        let project = project();
        let scope = VariableScope::new(&project, &project.entities[0]);

        let def = synthesize("var_set_Alerted", &scope).unwrap();
        let value = def.property(SET_VALUE_PROPERTY).unwrap();
        assert_eq!(value.value_type, ValueType::Boolean);
        assert_eq!(value.default, Some(json!(true)));
        assert_eq!(
            def.template.segments()[0],
            TemplateSegment::Literal("var_Alerted = ".to_string())
        );
    }

    #[test]
    fn test_external_get_and_set() {
        let project = project();
        let scope = VariableScope::new(&project, &project.entities[0]);

        let get = synthesize("var_get_ext_Merchant_Sal.Gold", &scope).unwrap();
        assert_eq!(
            get.template.segments()[0],
            TemplateSegment::Literal("local value = Merchant_Sal.var_Gold\n".to_string())
        );

        let set = synthesize("var_set_ext_merchant_sal.gold", &scope).unwrap();
        assert_eq!(
            set.template.segments()[0],
            TemplateSegment::Literal("Merchant_Sal.var_Gold = ".to_string())
        );
    }

    #[test]
    fn test_external_owner_with_dotted_script_name() {
        let mut project = project();
        let mut warden = QuestEntity::new("warden", "Keep.Warden");
        warden
            .variables
            .push(EntityVariable::new("Keys", ValueType::Integer));
        project.entities.push(warden);
        let scope = VariableScope::new(&project, &project.entities[0]);

        let get = synthesize("var_get_ext_Keep.Warden.Keys", &scope).unwrap();
        assert_eq!(
            get.template.segments()[0],
            TemplateSegment::Literal("local value = Keep_Warden.var_Keys\n".to_string())
        );
    }

    #[test]
    fn test_unresolved_external_falls_back_to_local_form() {
        let project = project();
        let scope = VariableScope::new(&project, &project.entities[0]);

        let def = synthesize("var_get_ext_Odd.Name", &scope).unwrap();
        assert_eq!(
            def.template.segments()[0],
            TemplateSegment::Literal("local value = var_ext_Odd_Name\n".to_string())
        );
    }

    #[test]
    fn test_unknown_variables() {
        let project = project();
        let scope = VariableScope::new(&project, &project.entities[0]);

        assert!(synthesize("var_get_Missing", &scope).is_none());
        assert!(synthesize("var_set_ext_Nobody.Gold", &scope).is_none());
        assert!(synthesize("showMessage", &scope).is_none());
        assert!(is_variable_node_id("var_set_Anything"));
        assert!(!is_variable_node_id("variable"));
    }
}
