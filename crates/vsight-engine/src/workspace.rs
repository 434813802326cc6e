//! Per-job workspace allocation and cleanup.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use vsight_models::JobId;

use crate::error::{EngineError, EngineResult};

/// Input filename stem inside a workspace.
const INPUT_STEM: &str = "input";
/// Output artifact filename inside a workspace.
const OUTPUT_NAME: &str = "result.json";

/// A directory exclusively owned by one job.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Workspace root, `<work_dir>/<job_id>`
    pub root: PathBuf,
    /// Absolute path for the persisted upload
    pub input_path: PathBuf,
    /// Absolute path where the analyzer must write its result
    pub output_path: PathBuf,
}

/// Allocates isolated, collision-free working directories per job.
///
/// Directory names are keyed by the generated [`JobId`] only; the
/// client-supplied filename never reaches path construction, so concurrent
/// allocations cannot overlap regardless of upload names.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    work_dir: PathBuf,
}

impl WorkspaceManager {
    /// Create a manager rooted at `work_dir`.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    /// Create the work root if it does not exist yet.
    pub async fn init(&self) -> EngineResult<()> {
        fs::create_dir_all(&self.work_dir)
            .await
            .map_err(EngineError::WorkspaceAllocation)
    }

    /// The work root this manager allocates under.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Allocate a fresh workspace for `job_id`.
    ///
    /// `extension` is normalized to ASCII alphanumerics before it is joined
    /// into the input filename.
    pub async fn allocate(&self, job_id: &JobId, extension: &str) -> EngineResult<Workspace> {
        let root = self.work_dir.join(job_id.as_str());
        fs::create_dir_all(&root)
            .await
            .map_err(EngineError::WorkspaceAllocation)?;

        let input_path = root.join(format!("{INPUT_STEM}.{}", normalize_extension(extension)));
        let output_path = root.join(OUTPUT_NAME);

        debug!(job_id = %job_id, root = %root.display(), "workspace allocated");

        Ok(Workspace {
            root,
            input_path,
            output_path,
        })
    }

    /// Remove a workspace tree. Best effort: failures are logged, never
    /// propagated, so cleanup cannot mask the job's actual outcome.
    pub async fn release(&self, workspace: &Workspace) {
        if let Err(e) = fs::remove_dir_all(&workspace.root).await {
            warn!(
                root = %workspace.root.display(),
                error = %e,
                "failed to remove workspace"
            );
        }
    }

    /// Synchronous variant of [`release`](Self::release), usable from drop
    /// guards where no executor is available.
    pub fn release_blocking(root: &Path) {
        if let Err(e) = std::fs::remove_dir_all(root) {
            warn!(root = %root.display(), error = %e, "failed to remove workspace");
        }
    }
}

fn normalize_extension(extension: &str) -> String {
    let ext: String = extension
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect::<String>()
        .to_ascii_lowercase();

    if ext.is_empty() {
        "bin".to_string()
    } else {
        ext
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_allocations_never_overlap() {
        let dir = TempDir::new().unwrap();
        let manager = WorkspaceManager::new(dir.path());
        manager.init().await.unwrap();

        let a = manager.allocate(&JobId::new(), "mp4").await.unwrap();
        let b = manager.allocate(&JobId::new(), "mp4").await.unwrap();

        assert_ne!(a.root, b.root);
        assert_ne!(a.input_path, b.input_path);
        assert_ne!(a.output_path, b.output_path);
        assert!(a.root.is_dir());
        assert!(b.root.is_dir());
    }

    #[tokio::test]
    async fn test_hostile_extension_stays_inside_workspace() {
        let dir = TempDir::new().unwrap();
        let manager = WorkspaceManager::new(dir.path());
        manager.init().await.unwrap();

        let ws = manager
            .allocate(&JobId::new(), "../../etc/passwd")
            .await
            .unwrap();

        assert!(ws.input_path.starts_with(&ws.root));
        let name = ws.input_path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("input."));
        assert!(!name.contains('/'));
    }

    #[tokio::test]
    async fn test_empty_extension_falls_back() {
        let dir = TempDir::new().unwrap();
        let manager = WorkspaceManager::new(dir.path());
        manager.init().await.unwrap();

        let ws = manager.allocate(&JobId::new(), "///").await.unwrap();
        assert!(ws.input_path.ends_with("input.bin"));
    }

    #[tokio::test]
    async fn test_release_removes_tree() {
        let dir = TempDir::new().unwrap();
        let manager = WorkspaceManager::new(dir.path());
        manager.init().await.unwrap();

        let ws = manager.allocate(&JobId::new(), "mp4").await.unwrap();
        fs::write(&ws.input_path, b"data").await.unwrap();

        manager.release(&ws).await;
        assert!(!ws.root.exists());
    }

    #[tokio::test]
    async fn test_release_of_missing_workspace_is_silent() {
        let dir = TempDir::new().unwrap();
        let manager = WorkspaceManager::new(dir.path());
        manager.init().await.unwrap();

        let ws = manager.allocate(&JobId::new(), "mp4").await.unwrap();
        manager.release(&ws).await;
        // Second release must not panic or error
        manager.release(&ws).await;
    }
}
