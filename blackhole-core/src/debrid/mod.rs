//! Debrid service abstractions and the Real-Debrid implementation.
//!
//! `DebridClient` is the seam between the lifecycle engine and the remote
//! service. Every operation is a single logical request; transport retries
//! happen underneath it and surface only as `DebridError` once exhausted.

pub mod availability;
pub mod realdebrid;
pub mod retry;
#[cfg(test)]
pub mod test_mocks;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

pub use availability::{Availability, AvailabilityGroup, AvailabilitySet, check_availability};
pub use realdebrid::RealDebridClient;
pub use retry::{RetryPolicy, retry_request};

use crate::torrent::{ContentHash, TorrentStatus};

/// Upload host offered by the service for add operations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AvailableHost {
    pub host: String,
}

/// Response of the add endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddedTorrent {
    #[serde(deserialize_with = "deserialize_remote_id")]
    pub id: String,
}

/// A file inside a remote torrent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteFile {
    #[serde(deserialize_with = "deserialize_remote_id")]
    pub id: String,
    pub path: String,
    pub bytes: u64,
}

/// Remote torrent metadata as returned by the info endpoint.
///
/// `raw_status` is kept as sent; use [`RemoteTorrentInfo::status`] for the
/// normalized view so the two can never drift apart.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteTorrentInfo {
    #[serde(deserialize_with = "deserialize_remote_id")]
    pub id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub original_filename: String,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(rename = "status")]
    pub raw_status: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub files: Vec<RemoteFile>,
}

impl RemoteTorrentInfo {
    /// Normalized status of this snapshot.
    pub fn status(&self) -> TorrentStatus {
        TorrentStatus::normalize(&self.raw_status)
    }

    /// Whether the service reports `expected` as this torrent's hash.
    ///
    /// Hex case is ignored. A snapshot without a hash matches anything.
    pub fn hash_matches(&self, expected: &ContentHash) -> bool {
        self.hash
            .as_deref()
            .is_none_or(|hash| hash.eq_ignore_ascii_case(expected.as_str()))
    }
}

/// Errors from debrid service communication.
#[derive(Debug, thiserror::Error)]
pub enum DebridError {
    #[error("Request to {endpoint} failed")]
    RequestFailed { endpoint: String },

    #[error("Unexpected response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("No upload hosts available")]
    NoHostsAvailable,

    #[error("Debrid setting {setting} is not configured")]
    NotConfigured { setting: &'static str },

    #[error("Invalid or expired API key")]
    Unauthorized,

    #[error("Permission denied, account locked")]
    AccountLocked,

    #[error("URL parsing error")]
    UrlParsing(#[from] url::ParseError),

    #[error("HTTP error")]
    Http(#[from] reqwest::Error),
}

/// Operations the lifecycle engine needs from a debrid service.
#[async_trait]
pub trait DebridClient: Send + Sync {
    /// Looks up which file bundles of `hash` are cached on the first hoster.
    ///
    /// An empty set means the torrent is not cached.
    async fn instant_availability(
        &self,
        hash: &ContentHash,
    ) -> Result<AvailabilitySet, DebridError>;

    /// Lists upload hosts in the service's preferred order.
    async fn available_hosts(&self) -> Result<Vec<AvailableHost>, DebridError>;

    /// Uploads raw `.torrent` bytes through `host`.
    async fn add_torrent(&self, host: &str, torrent: &[u8]) -> Result<AddedTorrent, DebridError>;

    /// Registers a magnet link through `host`.
    async fn add_magnet(&self, host: &str, magnet: &str) -> Result<AddedTorrent, DebridError>;

    /// Fetches current metadata of torrent `id`.
    async fn torrent_info(&self, id: &str) -> Result<RemoteTorrentInfo, DebridError>;

    /// Tells the service which files of torrent `id` to materialize.
    async fn select_files(&self, id: &str, file_ids: &[String]) -> Result<(), DebridError>;

    /// Removes torrent `id` from the account.
    async fn delete_torrent(&self, id: &str) -> Result<(), DebridError>;
}

/// Accepts remote ids sent either as JSON numbers or strings.
fn deserialize_remote_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RemoteId {
        Number(u64),
        Text(String),
    }

    Ok(match RemoteId::deserialize(deserializer)? {
        RemoteId::Number(number) => number.to_string(),
        RemoteId::Text(text) => text,
    })
}
