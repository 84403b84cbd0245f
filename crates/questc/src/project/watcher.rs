//! Project File Watcher
//!
//! Watches project source files and reports changes that need a rebuild.
//! Generated scripts are never reported, so writing the build output does not
//! trigger another build.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::config::{ENTITIES_DIR, ENTITY_SUFFIX, MANIFEST_FILE, NODES_DIR, NODES_SUFFIX};

/// Quiet period used to coalesce bursts of editor writes
const DEBOUNCE: Duration = Duration::from_millis(200);

/// File change event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    /// The quest manifest was modified
    ManifestChanged,
    /// An entity graph was created, modified or removed
    EntityChanged(String),
    /// A custom node library was created, modified or removed
    NodeLibraryChanged(String),
}

/// Project file watcher
pub struct ProjectWatcher {
    /// Path to the project
    project_path: PathBuf,
    /// Channel receiver for file events
    rx: mpsc::Receiver<FileChange>,
    /// The underlying watcher (kept alive)
    _watcher: RecommendedWatcher,
}

impl ProjectWatcher {
    /// Create a new project watcher
    pub fn new(project_path: impl AsRef<Path>) -> Result<Self, notify::Error> {
        // Canonicalize the path to get absolute path for reliable comparison
        let project_path = project_path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| project_path.as_ref().to_path_buf());
        let (tx, rx) = mpsc::channel(100);

        let project_path_clone = project_path.clone();

        // Create the watcher
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    if let Some(change) = Self::event_to_change(&project_path_clone, &event) {
                        let _ = tx.blocking_send(change);
                    }
                }
                Err(e) => {
                    error!("File watcher error: {}", e);
                }
            }
        })?;

        // Watch the project directory
        watcher.watch(&project_path, RecursiveMode::Recursive)?;
        info!("Watching project directory: {}", project_path.display());

        Ok(Self {
            project_path,
            rx,
            _watcher: watcher,
        })
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    /// Convert a notify event to our FileChange type
    fn event_to_change(project_path: &Path, event: &Event) -> Option<FileChange> {
        // Only care about modifications, creations and removals
        match event.kind {
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => {}
            _ => {
                debug!("Ignoring event kind: {:?}", event.kind);
                return None;
            }
        }

        // Get the first path from the event
        let path = event.paths.first()?;

        // Get relative path from project root
        let rel_path = path.strip_prefix(project_path).ok()?;
        classify(rel_path)
    }

    /// Wait for the next change, then swallow follow-up events for a short
    /// quiet period. Returns `None` once the watcher is gone.
    pub async fn next_change(&mut self) -> Option<FileChange> {
        let change = self.rx.recv().await?;
        debug!("File change detected: {:?}", change);

        while let Ok(Some(more)) = tokio::time::timeout(DEBOUNCE, self.rx.recv()).await {
            debug!("Coalesced file change: {:?}", more);
        }

        Some(change)
    }
}

/// Map a path relative to the project root onto a change kind
fn classify(rel_path: &Path) -> Option<FileChange> {
    let rel_str = rel_path.to_string_lossy().replace('\\', "/");
    let file_name = rel_path.file_name()?.to_string_lossy();

    if rel_str == MANIFEST_FILE {
        Some(FileChange::ManifestChanged)
    } else if rel_str.starts_with(&format!("{}/", ENTITIES_DIR)) && rel_str.ends_with(ENTITY_SUFFIX) {
        let entity_id = file_name.strip_suffix(ENTITY_SUFFIX)?;
        Some(FileChange::EntityChanged(entity_id.to_string()))
    } else if rel_str.starts_with(&format!("{}/", NODES_DIR)) && rel_str.ends_with(NODES_SUFFIX) {
        let library = file_name.strip_suffix(NODES_SUFFIX)?;
        Some(FileChange::NodeLibraryChanged(library.to_string()))
    } else {
        None
    }
}
