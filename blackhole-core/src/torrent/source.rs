//! Torrent sources dropped into the blackhole

use std::path::Path;

use super::hash::{HashSource, SourcePayload, hash_from_magnet, info_hash_from_torrent};
use super::{ContentHash, TorrentError};

/// A `.torrent` metainfo file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentFileSource {
    data: Vec<u8>,
    label: String,
}

impl TorrentFileSource {
    pub fn new(data: Vec<u8>, label: impl Into<String>) -> Self {
        Self {
            data,
            label: label.into(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl HashSource for TorrentFileSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn derive_hash(&self) -> Result<ContentHash, TorrentError> {
        info_hash_from_torrent(&self.data)
    }

    fn payload(&self) -> SourcePayload<'_> {
        SourcePayload::TorrentFile(&self.data)
    }
}

/// A magnet URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagnetSource {
    uri: String,
    label: String,
}

impl MagnetSource {
    pub fn new(uri: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            label: label.into(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl HashSource for MagnetSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn derive_hash(&self) -> Result<ContentHash, TorrentError> {
        hash_from_magnet(&self.uri)
    }

    fn payload(&self) -> SourcePayload<'_> {
        SourcePayload::Magnet(&self.uri)
    }
}

/// Either kind of source, for callers that only learn the kind at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TorrentSource {
    TorrentFile(TorrentFileSource),
    Magnet(MagnetSource),
}

impl TorrentSource {
    /// Loads a source from a `.torrent` or `.magnet` file.
    ///
    /// The label is the file name without its extension. Magnet files are
    /// read as text and trimmed.
    ///
    /// # Errors
    /// - `TorrentError::UnsupportedSource` - Extension is neither `torrent` nor `magnet`
    /// - `TorrentError::Io` - File could not be read
    pub async fn from_path(path: &Path) -> Result<Self, TorrentError> {
        let label = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

        match extension.as_deref() {
            Some("torrent") => {
                let data = tokio::fs::read(path).await?;
                Ok(TorrentSource::TorrentFile(TorrentFileSource::new(data, label)))
            }
            Some("magnet") => {
                let uri = tokio::fs::read_to_string(path).await?;
                Ok(TorrentSource::Magnet(MagnetSource::new(uri.trim(), label)))
            }
            _ => Err(TorrentError::UnsupportedSource {
                path: path.to_path_buf(),
            }),
        }
    }
}

impl HashSource for TorrentSource {
    fn label(&self) -> &str {
        match self {
            TorrentSource::TorrentFile(source) => source.label(),
            TorrentSource::Magnet(source) => source.label(),
        }
    }

    fn derive_hash(&self) -> Result<ContentHash, TorrentError> {
        match self {
            TorrentSource::TorrentFile(source) => source.derive_hash(),
            TorrentSource::Magnet(source) => source.derive_hash(),
        }
    }

    fn payload(&self) -> SourcePayload<'_> {
        match self {
            TorrentSource::TorrentFile(source) => source.payload(),
            TorrentSource::Magnet(source) => source.payload(),
        }
    }
}
