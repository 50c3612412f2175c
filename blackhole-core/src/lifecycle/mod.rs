//! Per-torrent lifecycle: submission, file selection and mount resolution.
//!
//! A [`TorrentHandle`] drives one torrent through the debrid service. Its
//! operations return `Result<Verdict<T>, LifecycleError>`: the outer error is
//! reserved for misuse of the handle and unusable input, while the inner
//! [`Verdict`] carries the accept-or-reject decision the driver acts on.

pub mod handle;
pub mod path;
pub mod selection;

pub use handle::TorrentHandle;
pub use path::PathResolver;
pub use selection::{FileSelection, check_cached_selection, largest_file, media_files};

use crate::debrid::DebridError;
use crate::torrent::TorrentError;

/// Outcome of a lifecycle step: the accepted value or the reason it was turned down.
pub type Verdict<T> = Result<T, Rejection>;

/// Errors that abort a lifecycle operation outright.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Cannot {operation} before the torrent has been submitted")]
    MissingId { operation: &'static str },

    #[error("Invalid torrent source: {0}")]
    InvalidSource(#[from] TorrentError),
}

/// Reasons a torrent is not accepted at some lifecycle step.
#[derive(Debug, thiserror::Error)]
pub enum Rejection {
    #[error("Torrent is not cached")]
    NotCached,

    #[error("Cache availability could not be determined")]
    AvailabilityUnknown,

    #[error("No media files found")]
    NoMediaFiles,

    #[error("No cached bundle matches the requested files")]
    CacheMismatch {
        /// Ids cached together with the largest file, when only it was wanted
        extra_files: Option<Vec<String>>,
    },

    #[error("Debrid request failed: {0}")]
    Remote(#[from] DebridError),
}

impl Rejection {
    /// Whether the rejection is a policy decision rather than a remote failure.
    pub fn is_policy(&self) -> bool {
        !matches!(self, Rejection::Remote(_))
    }
}
