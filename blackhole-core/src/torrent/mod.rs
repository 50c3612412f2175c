//! Torrent sources, content hashes and remote status normalization

pub mod bencode;
pub mod hash;
pub mod media;
pub mod source;
pub mod status;

use std::fmt;
use std::path::PathBuf;

pub use bencode::BencodeEncoder;
pub use hash::{HashSource, SourcePayload, hash_from_magnet, info_hash_from_torrent};
pub use media::{MEDIA_EXTENSIONS, is_media_path, strip_media_extension};
pub use source::{MagnetSource, TorrentFileSource, TorrentSource};
pub use status::{LifecycleState, TorrentStatus};

/// Hex identifier of a torrent's content as understood by the debrid service.
///
/// Torrent files always produce the 40-character SHA-1 info hash. Magnet links
/// carry whatever the `xt=urn:btih:` parameter holds, which may be a base32
/// hash or some other length; those are kept verbatim but flagged as
/// incompatible with cache lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    /// Length of a hex-encoded SHA-1 info hash.
    pub const INFO_HASH_HEX_LEN: usize = 40;

    /// Wraps an already-rendered hash string.
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Renders a raw 20-byte SHA-1 digest as lowercase hex.
    pub fn from_digest(digest: [u8; 20]) -> Self {
        Self(hex::encode(digest))
    }

    /// Returns the hash as it will be sent to the service.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this hash has the 40-character info-hash shape the
    /// availability endpoint understands.
    pub fn is_info_hash(&self) -> bool {
        self.0.len() == Self::INFO_HASH_HEX_LEN
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors raised while loading a torrent source or deriving its hash.
#[derive(Debug, thiserror::Error)]
pub enum TorrentError {
    #[error("Failed to parse torrent file: {reason}")]
    InvalidTorrentFile { reason: String },

    #[error("Missing or invalid info hash in magnet link: {magnet}")]
    MissingMagnetHash { magnet: String },

    #[error("Unsupported torrent source: {}", path.display())]
    UnsupportedSource { path: PathBuf },

    #[error("I/O error")]
    Io(#[from] std::io::Error),
}
