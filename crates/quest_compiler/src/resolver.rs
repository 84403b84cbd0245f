//! Variable Resolver
//!
//! Maps `$Name` placeholders to the current entity's variables and
//! `$@Entity.Name` placeholders to variables declared on another entity.

use quest_types::{EntityVariable, QuestEntity, QuestProject};

use crate::lua::{mangle_external_variable, mangle_variable};

/// Prefix marking a property value as a variable placeholder
pub const PLACEHOLDER_PREFIX: char = '$';
/// Marker following the prefix for cross-entity references
pub const EXTERNAL_MARKER: char = '@';

/// A parsed, not yet resolved, variable placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableRef<'a> {
    /// `$Name`
    Local(&'a str),
    /// `$@Entity.Name`
    External { entity: &'a str, name: &'a str },
}

impl<'a> VariableRef<'a> {
    /// Parse a placeholder; returns `None` when `text` is not one
    pub fn parse(text: &'a str) -> Option<Self> {
        let body = text.strip_prefix(PLACEHOLDER_PREFIX)?;
        if body.is_empty() {
            return None;
        }
        match body.strip_prefix(EXTERNAL_MARKER) {
            Some(qualified) => {
                // Script names may contain dots, variable names may not
                let (entity, name) = qualified.rsplit_once('.')?;
                if entity.is_empty() || name.is_empty() {
                    return None;
                }
                Some(VariableRef::External { entity, name })
            }
            None => Some(VariableRef::Local(body)),
        }
    }
}

/// Outcome of resolving a placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Bare identifier of a variable on the current entity
    Local(String),
    /// Namespaced identifier of a variable on another entity
    External(String),
    /// Not declared anywhere; the caller encodes the raw text instead
    Unresolved,
}

impl Resolution {
    /// The expression to emit, if the placeholder resolved
    pub fn expression(&self) -> Option<&str> {
        match self {
            Resolution::Local(ident) | Resolution::External(ident) => Some(ident),
            Resolution::Unresolved => None,
        }
    }
}

/// Variable tables visible while compiling one entity
#[derive(Debug, Clone, Copy)]
pub struct VariableScope<'a> {
    project: &'a QuestProject,
    entity: &'a QuestEntity,
}

impl<'a> VariableScope<'a> {
    pub fn new(project: &'a QuestProject, entity: &'a QuestEntity) -> Self {
        Self { project, entity }
    }

    pub fn project(&self) -> &'a QuestProject {
        self.project
    }

    pub fn entity(&self) -> &'a QuestEntity {
        self.entity
    }

    /// Look up a variable on the current entity (case-insensitive)
    pub fn local(&self, name: &str) -> Option<&'a EntityVariable> {
        self.entity.variable(name)
    }

    /// Look up a variable declared on another entity.
    ///
    /// The owner's `exposed` flag is not consulted.
    pub fn external(
        &self,
        entity_name: &str,
        name: &str,
    ) -> Option<(&'a QuestEntity, &'a EntityVariable)> {
        let owner = self.project.find_entity(entity_name)?;
        let variable = owner.variable(name)?;
        if !variable.exposed {
            tracing::debug!(
                owner = owner.script_name_or_id(),
                variable = %variable.name,
                "External reference to a variable that is not exposed"
            );
        }
        Some((owner, variable))
    }

    /// Resolve a placeholder string to an identifier expression
    pub fn resolve(&self, placeholder: &str) -> Resolution {
        match VariableRef::parse(placeholder) {
            Some(VariableRef::Local(name)) => match self.local(name) {
                Some(variable) => Resolution::Local(mangle_variable(&variable.name)),
                None => Resolution::Unresolved,
            },
            Some(VariableRef::External { entity, name }) => match self.external(entity, name) {
                Some((owner, variable)) => Resolution::External(mangle_external_variable(
                    owner.script_name_or_id(),
                    &variable.name,
                )),
                None => Resolution::Unresolved,
            },
            None => Resolution::Unresolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_types::{EntityVariable, ValueType};

    fn project() -> QuestProject {
        let mut project = QuestProject::new("Lost Ring");

        let mut guard = QuestEntity::new("guard", "Guard_Bob");
        guard
            .variables
            .push(EntityVariable::new("Stage Name", ValueType::String));
        guard
            .variables
            .push(EntityVariable::new("Alerted", ValueType::Boolean).exposed());
        project.entities.push(guard);

        let mut merchant = QuestEntity::new("merchant", "Merchant Sal");
        merchant
            .variables
            .push(EntityVariable::new("Gold", ValueType::Integer));
        project.entities.push(merchant);

        project
    }

    #[test]
    fn test_parse_placeholders() {
        assert_eq!(VariableRef::parse("$Count"), Some(VariableRef::Local("Count")));
        assert_eq!(
            VariableRef::parse("$@Guard_Bob.Alerted"),
            Some(VariableRef::External { entity: "Guard_Bob", name: "Alerted" })
        );
        assert_eq!(VariableRef::parse("Count"), None);
        assert_eq!(VariableRef::parse("$"), None);
        assert_eq!(VariableRef::parse("$@NoDot"), None);
        assert_eq!(VariableRef::parse("$@.Name"), None);
        assert_eq!(
            VariableRef::parse("$@Guard.Bob.Alerted"),
            Some(VariableRef::External { entity: "Guard.Bob", name: "Alerted" })
        );
    }

    #[test]
    fn test_resolve_external_owner_with_dotted_script_name() {
        let mut project = project();
        let mut warden = QuestEntity::new("warden", "Keep.Warden");
        warden
            .variables
            .push(EntityVariable::new("Keys", ValueType::Integer));
        project.entities.push(warden);
        let scope = VariableScope::new(&project, &project.entities[0]);

        assert_eq!(
            scope.resolve("$@Keep.Warden.Keys"),
            Resolution::External("Keep_Warden.var_Keys".to_string())
        );
    }

    #[test]
    fn test_resolve_local_case_insensitive() {
        let project = project();
        let scope = VariableScope::new(&project, &project.entities[0]);

        assert_eq!(
            scope.resolve("$stage name"),
            Resolution::Local("var_Stage_Name".to_string())
        );
    }

    #[test]
    fn test_resolve_external_uses_owner_script_name() {
        let project = project();
        let scope = VariableScope::new(&project, &project.entities[0]);

        assert_eq!(
            scope.resolve("$@Merchant Sal.gold"),
            Resolution::External("Merchant_Sal.var_Gold".to_string())
        );
        // Exposure is not enforced.
        assert_eq!(
            scope.resolve("$@merchant.Gold").expression(),
            Some("Merchant_Sal.var_Gold")
        );
    }

    #[test]
    fn test_unresolved_placeholders() {
        let project = project();
        let scope = VariableScope::new(&project, &project.entities[1]);

        assert_eq!(scope.resolve("$Stage Name"), Resolution::Unresolved);
        assert_eq!(scope.resolve("$@Nobody.Gold"), Resolution::Unresolved);
        assert_eq!(scope.resolve("$@Guard_Bob.Missing"), Resolution::Unresolved);
        assert_eq!(scope.resolve("$5 reward"), Resolution::Unresolved);
    }
}
