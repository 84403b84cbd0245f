//! Build Pipeline
//!
//! Load a project, compile it, surface diagnostics and export the scripts.

use std::path::{Path, PathBuf};

use quest_compiler::{CompiledQuest, QuestCompiler};
use tracing::{info, warn};

use crate::export::{ExportError, export_scripts};
use crate::project::{LoadError, Project, ProjectLoader};

/// Error type for a build run
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// What to do with the compiled scripts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildMode {
    /// Write scripts to `out_dir`, or to the manifest's output directory
    Write { out_dir: Option<PathBuf> },
    /// Compile and report only
    Check,
}

/// Outcome of a build run
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub compiled: CompiledQuest,
    /// Files written, empty in check mode
    pub written: Vec<PathBuf>,
}

impl BuildReport {
    pub fn diagnostic_count(&self) -> usize {
        self.compiled.diagnostics().count()
    }
}

/// Compile a loaded project against its own catalog
pub fn compile(project: &Project) -> CompiledQuest {
    QuestCompiler::new(project.catalog.clone()).compile_quest(&project.quest)
}

/// Run one build of the project at `path`
pub async fn build_project(path: &Path, mode: &BuildMode) -> Result<BuildReport, BuildError> {
    let project = ProjectLoader::load(path).await?;
    let compiled = compile(&project);

    for (script, diagnostic) in compiled.diagnostics() {
        warn!("{}: {}", script, diagnostic);
    }

    let written = match mode {
        BuildMode::Check => Vec::new(),
        BuildMode::Write { out_dir } => {
            let out_dir = out_dir.clone().unwrap_or_else(|| project.output_dir());
            export_scripts(&project.quest, &compiled, &out_dir).await?
        }
    };

    info!(
        "Built quest '{}': {} entity scripts, {} diagnostics{}",
        project.name(),
        compiled.entities.len(),
        compiled.diagnostics().count(),
        if compiled.uses_action_queue {
            ", action queue enabled"
        } else {
            ""
        }
    );

    Ok(BuildReport { compiled, written })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::fs;

    async fn create_test_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let path = dir.path();

        fs::write(
            path.join("quest.toml"),
            r#"
[quest]
name = "The Lost Ring"
script_name = "LostRing"
regions = ["Bowerstone"]
"#,
        )
        .await
        .unwrap();

        fs::create_dir(path.join("entities")).await.unwrap();
        fs::write(
            path.join("entities/guard.entity.json"),
            r#"{
                "id": "guard",
                "scriptName": "Guard_Bob",
                "nodes": [
                    { "id": "t", "type": "onQuestStart", "category": "trigger" },
                    { "id": "m", "type": "addMapMarker", "properties": { "target": "Guard_Bob" } },
                    { "id": "x", "type": "summonDragon" }
                ],
                "connections": [
                    { "fromNodeId": "t", "fromPort": "Output", "toNodeId": "m" },
                    { "fromNodeId": "m", "fromPort": "Output", "toNodeId": "x" }
                ]
            }"#,
        )
        .await
        .unwrap();

        dir
    }

    #[tokio::test]
    async fn test_build_writes_to_manifest_output_dir() {
        let dir = create_test_project().await;
        let report = build_project(dir.path(), &BuildMode::Write { out_dir: None })
            .await
            .unwrap();

        assert_eq!(report.written.len(), 2);
        assert!(dir.path().join("build/scripts/LostRing.lua").exists());
        assert!(dir.path().join("build/scripts/entities/Guard_Bob.lua").exists());
        assert!(report.compiled.uses_action_queue);
        assert_eq!(report.diagnostic_count(), 1);
    }

    #[tokio::test]
    async fn test_check_writes_nothing() {
        let dir = create_test_project().await;
        let report = build_project(dir.path(), &BuildMode::Check).await.unwrap();

        assert!(report.written.is_empty());
        assert!(!dir.path().join("build").exists());
    }

    #[tokio::test]
    async fn test_out_dir_override() {
        let dir = create_test_project().await;
        let out = dir.path().join("custom");
        let report = build_project(dir.path(), &BuildMode::Write { out_dir: Some(out.clone()) })
            .await
            .unwrap();

        assert_eq!(report.written[0], out.join("LostRing.lua"));
    }

    #[tokio::test]
    async fn test_rebuild_is_byte_identical() {
        let dir = create_test_project().await;
        let first = build_project(dir.path(), &BuildMode::Check).await.unwrap();
        let second = build_project(dir.path(), &BuildMode::Check).await.unwrap();
        assert_eq!(first.compiled, second.compiled);
    }
}
