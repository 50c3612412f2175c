//! Blackhole Core - debrid torrent lifecycle engine
//!
//! This crate moves a dropped torrent or magnet through a debrid caching
//! service until its media shows up under a local mount: content hashing,
//! cache availability, submission, file selection, status normalization and
//! mount path resolution.

pub mod config;
pub mod debrid;
pub mod lifecycle;
pub mod torrent;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::{BlackholeConfig, DebridConfig, DriverConfig, SubmissionPolicy};
pub use debrid::{DebridClient, DebridError, RealDebridClient};
pub use lifecycle::{LifecycleError, PathResolver, Rejection, TorrentHandle, Verdict};
pub use torrent::{ContentHash, HashSource, LifecycleState, TorrentError, TorrentSource};

/// Core errors that can bubble up from any Blackhole subsystem.
#[derive(Debug, thiserror::Error)]
pub enum BlackholeError {
    #[error("Torrent error: {0}")]
    Torrent(#[from] TorrentError),

    #[error("Debrid error: {0}")]
    Debrid(#[from] DebridError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BlackholeError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            BlackholeError::Torrent(e) => match e {
                TorrentError::InvalidTorrentFile { reason } => {
                    format!("Invalid torrent file: {reason}")
                }
                TorrentError::MissingMagnetHash { .. } => {
                    "Magnet link has no info hash".to_string()
                }
                TorrentError::UnsupportedSource { path } => {
                    format!("Not a .torrent or .magnet file: {}", path.display())
                }
                TorrentError::Io(_) => "Could not read torrent source".to_string(),
            },
            BlackholeError::Debrid(e) => match e {
                DebridError::Unauthorized => "Invalid or expired API key".to_string(),
                DebridError::AccountLocked => "Real-Debrid account is locked".to_string(),
                DebridError::NotConfigured { setting } => format!("{setting} is not set"),
                _ => "Real-Debrid request failed".to_string(),
            },
            BlackholeError::Lifecycle(LifecycleError::InvalidSource(_)) => {
                "Torrent source could not be hashed".to_string()
            }
            BlackholeError::Lifecycle(_) => "Torrent lifecycle error occurred".to_string(),
            BlackholeError::Configuration { reason } => reason.clone(),
            BlackholeError::Io(_) => "File system error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            BlackholeError::Configuration { .. }
                | BlackholeError::Torrent(
                    TorrentError::InvalidTorrentFile { .. }
                        | TorrentError::MissingMagnetHash { .. }
                        | TorrentError::UnsupportedSource { .. }
                )
                | BlackholeError::Lifecycle(LifecycleError::InvalidSource(_))
                | BlackholeError::Debrid(
                    DebridError::NotConfigured { .. }
                        | DebridError::Unauthorized
                        | DebridError::AccountLocked
                )
        )
    }
}

pub type Result<T> = std::result::Result<T, BlackholeError>;
