//! Normalization of raw debrid status strings

use std::fmt;

/// Canonical lifecycle states of a remote torrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Remote side is waiting for the client to pick files.
    WaitingFilesSelection,
    /// Conversion, queueing, download or upload in progress.
    Downloading,
    /// Content is available on the service.
    Completed,
    /// Terminal failure on the remote side.
    Error,
}

impl LifecycleState {
    /// Returns the canonical name of this state.
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::WaitingFilesSelection => "waiting_files_selection",
            LifecycleState::Downloading => "downloading",
            LifecycleState::Completed => "completed",
            LifecycleState::Error => "error",
        }
    }

    /// Whether polling can stop at this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Completed | LifecycleState::Error)
    }
}

/// Remote torrent status after normalization.
///
/// Statuses the service may introduce later are kept verbatim in
/// `Unrecognized` rather than treated as errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TorrentStatus {
    Known(LifecycleState),
    Unrecognized(String),
}

impl TorrentStatus {
    /// Maps a raw service status onto a lifecycle state.
    pub fn normalize(raw: &str) -> Self {
        let state = match raw {
            "waiting_files_selection" => LifecycleState::WaitingFilesSelection,
            "magnet_conversion" | "queued" | "downloading" | "compressing" | "uploading" => {
                LifecycleState::Downloading
            }
            "downloaded" => LifecycleState::Completed,
            "magnet_error" | "error" | "dead" | "virus" => LifecycleState::Error,
            _ => return TorrentStatus::Unrecognized(raw.to_string()),
        };
        TorrentStatus::Known(state)
    }

    /// Returns the lifecycle state, if the raw status was recognized.
    pub fn state(&self) -> Option<LifecycleState> {
        match self {
            TorrentStatus::Known(state) => Some(*state),
            TorrentStatus::Unrecognized(_) => None,
        }
    }

    /// Canonical name for known states, the raw string otherwise.
    pub fn as_str(&self) -> &str {
        match self {
            TorrentStatus::Known(state) => state.as_str(),
            TorrentStatus::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for TorrentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_known_statuses() {
        let cases = [
            ("waiting_files_selection", LifecycleState::WaitingFilesSelection),
            ("magnet_conversion", LifecycleState::Downloading),
            ("queued", LifecycleState::Downloading),
            ("downloading", LifecycleState::Downloading),
            ("compressing", LifecycleState::Downloading),
            ("uploading", LifecycleState::Downloading),
            ("downloaded", LifecycleState::Completed),
            ("magnet_error", LifecycleState::Error),
            ("error", LifecycleState::Error),
            ("dead", LifecycleState::Error),
            ("virus", LifecycleState::Error),
        ];

        for (raw, expected) in cases {
            assert_eq!(TorrentStatus::normalize(raw).state(), Some(expected), "{raw}");
        }
    }

    #[test]
    fn test_unrecognized_status_passes_through() {
        let status = TorrentStatus::normalize("some_new_status");
        assert_eq!(status, TorrentStatus::Unrecognized("some_new_status".to_string()));
        assert_eq!(status.as_str(), "some_new_status");
        assert_eq!(status.state(), None);
    }

    #[test]
    fn test_display_uses_canonical_name() {
        assert_eq!(TorrentStatus::normalize("downloaded").to_string(), "completed");
        assert_eq!(TorrentStatus::normalize("queued").to_string(), "downloading");
    }

    #[test]
    fn test_terminal_states() {
        assert!(LifecycleState::Completed.is_terminal());
        assert!(LifecycleState::Error.is_terminal());
        assert!(!LifecycleState::Downloading.is_terminal());
        assert!(!LifecycleState::WaitingFilesSelection.is_terminal());
    }
}
