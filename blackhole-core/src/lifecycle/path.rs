//! Locating completed torrents under the local mount

use std::path::{Component, Path, PathBuf};

use crate::torrent::strip_media_extension;

/// Probes the mount root for the directory of a completed remote torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    mount_root: PathBuf,
}

impl PathResolver {
    pub fn new(mount_root: impl Into<PathBuf>) -> Self {
        Self {
            mount_root: mount_root.into(),
        }
    }

    pub fn mount_root(&self) -> &Path {
        &self.mount_root
    }

    /// Returns the first candidate directory that exists and is non-empty.
    ///
    /// Candidates, in order: `filename`, `original_filename`, and
    /// `original_filename` without its media extension when it has one.
    /// Names that are not a single path component are skipped, so the result
    /// always lies directly under the mount root. `None` means the mount has
    /// not caught up yet.
    pub async fn resolve(&self, filename: &str, original_filename: &str) -> Option<PathBuf> {
        let candidates = [
            Some(filename),
            Some(original_filename),
            strip_media_extension(original_filename),
        ];

        for name in candidates.into_iter().flatten() {
            if !is_single_component(name) {
                tracing::debug!(name, "Skipping mount candidate outside the mount root");
                continue;
            }
            let path = self.mount_root.join(name);
            if is_populated_dir(&path).await {
                return Some(path);
            }
            tracing::trace!(path = %path.display(), "Mount candidate not ready");
        }

        None
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

async fn is_populated_dir(path: &Path) -> bool {
    let Ok(mut entries) = tokio::fs::read_dir(path).await else {
        return false;
    };
    matches!(entries.next_entry().await, Ok(Some(_)))
}
