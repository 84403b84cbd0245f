//! Script Export
//!
//! Writes compiled scripts to the output directory:
//!
//! ```text
//! <out>/<QuestTable>.lua
//! <out>/entities/<EntityTable>.lua
//! ```

use std::path::{Path, PathBuf};

use quest_compiler::CompiledQuest;
use quest_types::QuestProject;
use tokio::fs;
use tracing::{debug, info};

/// Subdirectory of the output directory holding entity scripts
pub const ENTITY_SCRIPTS_DIR: &str = "entities";

/// Error type for script export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Entity '{entity_id}' has no script name; the game cannot bind its script")]
    MissingScriptName { entity_id: String },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Write every script of `compiled` below `out_dir`.
///
/// All entities must carry a script name; nothing is written otherwise.
/// Returns the written files in write order.
pub async fn export_scripts(
    project: &QuestProject,
    compiled: &CompiledQuest,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, ExportError> {
    if let Some(entity) = project
        .entities
        .iter()
        .find(|e| e.script_name.as_deref().is_none_or(|s| s.trim().is_empty()))
    {
        return Err(ExportError::MissingScriptName {
            entity_id: entity.id.clone(),
        });
    }

    let entities_dir = out_dir.join(ENTITY_SCRIPTS_DIR);
    fs::create_dir_all(&entities_dir)
        .await
        .map_err(|source| ExportError::Io {
            path: entities_dir.clone(),
            source,
        })?;

    let mut written = Vec::new();

    let quest_path = out_dir.join(format!("{}.lua", compiled.quest_table));
    write_script(&quest_path, &compiled.quest_script).await?;
    written.push(quest_path);

    for script in compiled.scripts() {
        let path = entities_dir.join(format!("{}.lua", script.table));
        write_script(&path, &script.source).await?;
        written.push(path);
    }

    info!("Exported {} scripts to {}", written.len(), out_dir.display());
    Ok(written)
}

async fn write_script(path: &Path, source: &str) -> Result<(), ExportError> {
    fs::write(path, source)
        .await
        .map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("Wrote {}", path.display());
    Ok(())
}
