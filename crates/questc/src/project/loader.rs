//! Project Loader
//!
//! Loads a quest project from disk and builds the node catalog it compiles
//! against (built-ins plus the project's custom node libraries).

use std::path::{Path, PathBuf};

use quest_compiler::{
    CatalogError, NodeCatalog, entity_table, is_queue_state, quest_table, reward_table,
};
use quest_types::{QuestEntity, QuestProject};
use tokio::fs;
use tracing::{debug, info};

use super::config::*;

/// Error type for project loading
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Project path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("Project manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("Failed to read file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML in {path}: {source}")]
    TomlParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to parse JSON in {path}: {source}")]
    JsonParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Entity '{entity}' declares variable '{name}' more than once")]
    DuplicateVariable { entity: String, name: String },

    #[error("Scripts '{first}' and '{second}' both compile to the Lua table '{table}'")]
    DuplicateScriptTable {
        table: String,
        first: String,
        second: String,
    },

    #[error("State '{0}' is reserved for the action queue")]
    ReservedStateName(String),

    #[error("Invalid node catalog: {0}")]
    Catalog(#[from] CatalogError),
}

/// A loaded quest project
#[derive(Debug, Clone)]
pub struct Project {
    /// Project root directory
    pub path: PathBuf,
    pub manifest: QuestManifest,
    /// Graph model handed to the compiler
    pub quest: QuestProject,
    /// Built-in plus custom node types
    pub catalog: NodeCatalog,
}

impl Project {
    pub fn name(&self) -> &str {
        &self.quest.name
    }

    /// Output directory from the manifest, resolved against the project root
    pub fn output_dir(&self) -> PathBuf {
        self.path.join(&self.manifest.build.output_dir)
    }
}

/// Project loader
pub struct ProjectLoader;

impl ProjectLoader {
    /// Load a project from the given path
    pub async fn load(path: impl AsRef<Path>) -> Result<Project, LoadError> {
        let path = path.as_ref();

        // Check path exists
        if !path.exists() {
            return Err(LoadError::PathNotFound(path.to_path_buf()));
        }

        debug!("Loading project from: {}", path.display());

        // Load manifest
        let manifest_path = path.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(LoadError::ManifestNotFound(manifest_path));
        }
        let manifest: QuestManifest = Self::read_toml(&manifest_path).await?;
        debug!("Loaded quest manifest: {}", manifest.quest.name);

        // Load entities
        let entities = Self::load_entities(path).await?;
        debug!("Loaded {} entities", entities.len());

        // Build the node catalog
        let mut catalog = NodeCatalog::builtin()?;
        let builtin_count = catalog.len();
        for library in Self::load_node_libraries(path).await? {
            catalog.register_all(library.nodes)?;
        }
        debug!("Registered {} custom node types", catalog.len() - builtin_count);

        let mut quest = QuestProject::new(&manifest.quest.name);
        quest.script_name = manifest.quest.script_name.clone();
        quest.regions = manifest.quest.regions.clone();
        quest.states = manifest.states.clone();
        quest.reward = manifest.reward.clone();
        quest.entities = entities;
        Self::validate(&quest)?;

        info!(
            "Loaded quest '{}' ({} entities, {} node types)",
            quest.name,
            quest.entities.len(),
            catalog.len()
        );

        Ok(Project {
            path: path.to_path_buf(),
            manifest,
            quest,
            catalog,
        })
    }

    /// Load all entities from the entities/ directory, ordered by file name
    async fn load_entities(project_path: &Path) -> Result<Vec<QuestEntity>, LoadError> {
        let mut entities = Vec::new();
        for path in Self::files_with_suffix(&project_path.join(ENTITIES_DIR), ENTITY_SUFFIX).await? {
            let entity = Self::load_entity(&path).await?;
            debug!("Loaded entity: {} ({} nodes)", entity.id, entity.nodes.len());
            entities.push(entity);
        }
        Ok(entities)
    }

    /// Load a single entity graph
    pub async fn load_entity(path: &Path) -> Result<QuestEntity, LoadError> {
        let content = fs::read_to_string(path).await?;
        serde_json::from_str(&content).map_err(|source| LoadError::JsonParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load all custom node libraries from the nodes/ directory, ordered by file name
    async fn load_node_libraries(project_path: &Path) -> Result<Vec<NodeLibraryConfig>, LoadError> {
        let mut libraries = Vec::new();
        for path in Self::files_with_suffix(&project_path.join(NODES_DIR), NODES_SUFFIX).await? {
            let library: NodeLibraryConfig = Self::read_toml(&path).await?;
            debug!("Loaded node library {} ({} nodes)", path.display(), library.nodes.len());
            libraries.push(library);
        }
        Ok(libraries)
    }

    /// Reject projects the compiler must not see
    fn validate(quest: &QuestProject) -> Result<(), LoadError> {
        for entity in &quest.entities {
            if let Some(name) = entity.duplicate_variables().first() {
                return Err(LoadError::DuplicateVariable {
                    entity: entity.id.clone(),
                    name: name.to_string(),
                });
            }
        }

        if let Some(state) = quest.states.iter().find(|s| is_queue_state(&s.name)) {
            return Err(LoadError::ReservedStateName(state.name.clone()));
        }

        // Every script is a global Lua table and entity scripts share one
        // output directory, so tables must differ even ignoring case.
        let mut scripts = vec![(quest_table(quest), quest.script_name().to_string())];
        scripts.extend(
            quest
                .entities
                .iter()
                .map(|e| (entity_table(e), e.script_name_or_id().to_string())),
        );
        if let Some(reward) = &quest.reward {
            scripts.push((reward_table(reward), reward.script_name.clone()));
        }

        for (i, (table, name)) in scripts.iter().enumerate() {
            if let Some((_, first)) = scripts[..i]
                .iter()
                .find(|(other, _)| other.eq_ignore_ascii_case(table))
            {
                return Err(LoadError::DuplicateScriptTable {
                    table: table.clone(),
                    first: first.clone(),
                    second: name.clone(),
                });
            }
        }

        Ok(())
    }

    /// Files in `dir` whose name ends with `suffix`, sorted so builds are reproducible
    async fn files_with_suffix(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>, LoadError> {
        let mut files = Vec::new();

        if !dir.exists() {
            debug!("No {} directory found", dir.display());
            return Ok(files);
        }

        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.ends_with(suffix) {
                    files.push(path);
                }
            }
        }

        files.sort();
        Ok(files)
    }

    async fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
        let content = fs::read_to_string(path).await?;
        toml::from_str(&content).map_err(|source| LoadError::TomlParseError {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::fs;

    const MANIFEST: &str = r#"
[quest]
name = "The Lost Ring"
script_name = "LostRing"
regions = ["Bowerstone"]

[[state]]
name = "RingFound"
type = "bool"
"#;

    const GUARD: &str = r#"{
        "id": "guard",
        "scriptName": "Guard_Bob",
        "variables": [{ "name": "Stage Name", "type": "String", "default": "Intro" }],
        "nodes": [
            { "id": "t", "type": "onTalk", "category": "trigger" },
            { "id": "s", "type": "speak", "category": "action", "properties": { "line": "Halt!" } }
        ],
        "connections": [{ "fromNodeId": "t", "fromPort": "Output", "toNodeId": "s" }]
    }"#;

    async fn create_test_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let path = dir.path();

        fs::write(path.join("quest.toml"), MANIFEST).await.unwrap();

        fs::create_dir(path.join("entities")).await.unwrap();
        fs::write(path.join("entities/guard.entity.json"), GUARD)
            .await
            .unwrap();
        fs::write(path.join("entities/notes.txt"), "ignored")
            .await
            .unwrap();

        fs::create_dir(path.join("nodes")).await.unwrap();
        fs::write(
            path.join("nodes/sounds.nodes.toml"),
            r#"
[[node]]
id = "ringChime"
category = "action"
template = "Quest:PlaySound({sound})\n{CHILDREN}"

[[node.property]]
name = "sound"
type = "String"
"#,
        )
        .await
        .unwrap();

        dir
    }

    #[tokio::test]
    async fn test_load_project() {
        let dir = create_test_project().await;
        let project = ProjectLoader::load(dir.path()).await.unwrap();

        assert_eq!(project.name(), "The Lost Ring");
        assert_eq!(project.quest.script_name(), "LostRing");
        assert_eq!(project.quest.regions, vec!["Bowerstone"]);
        assert_eq!(project.quest.states.len(), 1);
        assert_eq!(project.quest.entities.len(), 1);
        assert_eq!(project.quest.entities[0].script_name_or_id(), "Guard_Bob");
        assert!(project.catalog.contains("ringChime"));
        assert!(project.catalog.contains("onTalk"));
        assert_eq!(project.output_dir(), dir.path().join("build/scripts"));
    }

    #[tokio::test]
    async fn test_missing_path_and_manifest() {
        let dir = TempDir::new().unwrap();

        let missing = dir.path().join("nope");
        assert!(matches!(
            ProjectLoader::load(&missing).await,
            Err(LoadError::PathNotFound(_))
        ));
        assert!(matches!(
            ProjectLoader::load(dir.path()).await,
            Err(LoadError::ManifestNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_variable_rejected() {
        let dir = create_test_project().await;
        fs::write(
            dir.path().join("entities/merchant.entity.json"),
            r#"{
                "id": "merchant",
                "variables": [
                    { "name": "Gold", "type": "Integer" },
                    { "name": "GOLD", "type": "Integer" }
                ]
            }"#,
        )
        .await
        .unwrap();

        match ProjectLoader::load(dir.path()).await {
            Err(LoadError::DuplicateVariable { entity, name }) => {
                assert_eq!(entity, "merchant");
                assert_eq!(name, "GOLD");
            }
            other => panic!("expected duplicate variable error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_script_name_rejected() {
        let dir = create_test_project().await;
        fs::write(
            dir.path().join("entities/guard2.entity.json"),
            r#"{ "id": "guard2", "scriptName": "guard_bob" }"#,
        )
        .await
        .unwrap();

        assert!(matches!(
            ProjectLoader::load(dir.path()).await,
            Err(LoadError::DuplicateScriptTable { .. })
        ));
    }

    #[tokio::test]
    async fn test_script_names_sanitizing_to_one_table_rejected() {
        let dir = create_test_project().await;
        fs::write(
            dir.path().join("entities/guard.entity.json"),
            r#"{ "id": "guard", "scriptName": "Guard Bob" }"#,
        )
        .await
        .unwrap();
        fs::write(
            dir.path().join("entities/guard2.entity.json"),
            r#"{ "id": "guard2", "scriptName": "Guard-Bob" }"#,
        )
        .await
        .unwrap();

        match ProjectLoader::load(dir.path()).await {
            Err(LoadError::DuplicateScriptTable { table, first, second }) => {
                assert_eq!(table, "Guard_Bob");
                assert_eq!(first, "Guard Bob");
                assert_eq!(second, "Guard-Bob");
            }
            other => panic!("expected duplicate table error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reward_colliding_with_entity_rejected() {
        let dir = create_test_project().await;
        let manifest = format!(
            "{}\n{}",
            MANIFEST,
            r#"
[reward]
container = "OBJECT_CHEST_SILVER"
scriptName = "Guard_Bob"
spawnReference = "MK_RewardSpot"
"#
        );
        fs::write(dir.path().join("quest.toml"), manifest).await.unwrap();

        match ProjectLoader::load(dir.path()).await {
            Err(LoadError::DuplicateScriptTable { table, .. }) => assert_eq!(table, "Guard_Bob"),
            other => panic!("expected duplicate table error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_entity_colliding_with_quest_rejected() {
        let dir = create_test_project().await;
        fs::write(
            dir.path().join("entities/ring.entity.json"),
            r#"{ "id": "ring", "scriptName": "lostring" }"#,
        )
        .await
        .unwrap();

        assert!(matches!(
            ProjectLoader::load(dir.path()).await,
            Err(LoadError::DuplicateScriptTable { .. })
        ));
    }

    #[tokio::test]
    async fn test_reserved_queue_state_rejected() {
        let dir = create_test_project().await;
        let manifest = format!(
            "{}\n{}",
            MANIFEST,
            r#"
[[state]]
name = "ActionQueue_Stop"
type = "bool"
default = true
"#
        );
        fs::write(dir.path().join("quest.toml"), manifest).await.unwrap();

        match ProjectLoader::load(dir.path()).await {
            Err(LoadError::ReservedStateName(name)) => assert_eq!(name, "ActionQueue_Stop"),
            other => panic!("expected reserved state error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_custom_node_colliding_with_builtin() {
        let dir = create_test_project().await;
        fs::write(
            dir.path().join("nodes/clash.nodes.toml"),
            r#"
[[node]]
id = "speak"
category = "action"
template = "{CHILDREN}"
"#,
        )
        .await
        .unwrap();

        assert!(matches!(
            ProjectLoader::load(dir.path()).await,
            Err(LoadError::Catalog(CatalogError::DuplicateType(_)))
        ));
    }

    #[tokio::test]
    async fn test_invalid_json_reports_path() {
        let dir = create_test_project().await;
        fs::write(dir.path().join("entities/bad.entity.json"), "{ not json")
            .await
            .unwrap();

        match ProjectLoader::load(dir.path()).await {
            Err(LoadError::JsonParseError { path, .. }) => {
                assert!(path.ends_with("bad.entity.json"));
            }
            other => panic!("expected JSON error, got {:?}", other),
        }
    }
}
