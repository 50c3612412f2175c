//! Content hash derivation for torrent files and magnet links

use std::sync::LazyLock;

use regex::Regex;
use sha1::{Digest, Sha1};

use super::bencode::BencodeEncoder;
use super::{ContentHash, TorrentError};

static MAGNET_HASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"xt=urn:btih:([^&]+)").expect("magnet hash pattern is valid")
});

/// Payload handed to the debrid service when a source is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePayload<'a> {
    /// Raw `.torrent` bytes, uploaded as the request body.
    TorrentFile(&'a [u8]),
    /// Magnet URI, posted as a form field.
    Magnet(&'a str),
}

/// Variant-specific behaviour of a torrent source.
///
/// Each implementation knows how to derive its content hash and how it must
/// be presented to the add endpoint. The lifecycle handle is generic over
/// this trait so it never needs to know which kind of source it carries.
pub trait HashSource: Send + Sync {
    /// Human-readable name used in log output.
    fn label(&self) -> &str;

    /// Derives the content hash for this source.
    ///
    /// # Errors
    /// - `TorrentError::InvalidTorrentFile` - Torrent bytes are not valid metainfo
    /// - `TorrentError::MissingMagnetHash` - Magnet link has no `xt=urn:btih:` value
    fn derive_hash(&self) -> Result<ContentHash, TorrentError>;

    /// Returns the payload for the add operation.
    fn payload(&self) -> SourcePayload<'_>;
}

/// Computes the SHA-1 info hash of a `.torrent` file.
///
/// The `info` dictionary is decoded and re-encoded canonically before hashing.
///
/// # Errors
/// - `TorrentError::InvalidTorrentFile` - Malformed bencode or missing `info`
pub fn info_hash_from_torrent(torrent_bytes: &[u8]) -> Result<ContentHash, TorrentError> {
    let info_bytes = BencodeEncoder::encode_info_dictionary(torrent_bytes)?;

    let mut hasher = Sha1::new();
    hasher.update(&info_bytes);
    let mut digest = [0u8; 20];
    digest.copy_from_slice(&hasher.finalize());

    Ok(ContentHash::from_digest(digest))
}

/// Extracts the `xt=urn:btih:` value from a magnet URI.
///
/// The value is returned exactly as written, up to the next `&` or the end of
/// the URI. No case folding or base32 decoding is applied.
///
/// # Errors
/// - `TorrentError::MissingMagnetHash` - No `xt=urn:btih:` parameter present
pub fn hash_from_magnet(magnet: &str) -> Result<ContentHash, TorrentError> {
    MAGNET_HASH
        .captures(magnet)
        .and_then(|captures| captures.get(1))
        .map(|value| ContentHash::new(value.as_str()))
        .ok_or_else(|| TorrentError::MissingMagnetHash {
            magnet: magnet.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TORRENT: &[u8] = b"d8:announce9:test:80804:infod6:lengthi1000e4:name8:test.txt12:piece lengthi32768e6:pieces20:12345678901234567890ee";

    #[test]
    fn test_torrent_hash_is_deterministic() {
        let first = info_hash_from_torrent(TORRENT).unwrap();
        let second = info_hash_from_torrent(TORRENT).unwrap();

        assert_eq!(first, second);
        assert!(first.is_info_hash());
        assert!(
            first
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn test_torrent_hash_matches_sha1_of_info_slice() {
        let info = b"d6:lengthi1000e4:name8:test.txt12:piece lengthi32768e6:pieces20:12345678901234567890e";
        let expected = hex::encode(Sha1::digest(info));

        let hash = info_hash_from_torrent(TORRENT).unwrap();
        assert_eq!(hash.as_str(), expected);
    }

    #[test]
    fn test_torrent_hash_ignores_outer_fields() {
        let other_tracker = b"d8:announce10:other:80814:infod6:lengthi1000e4:name8:test.txt12:piece lengthi32768e6:pieces20:12345678901234567890ee";
        assert_eq!(
            info_hash_from_torrent(TORRENT).unwrap(),
            info_hash_from_torrent(other_tracker).unwrap()
        );
    }

    #[test]
    fn test_torrent_hash_rejects_garbage() {
        assert!(info_hash_from_torrent(b"not bencode").is_err());
    }

    #[test]
    fn test_magnet_hash_extraction() {
        let hash =
            hash_from_magnet("magnet:?xt=urn:btih:ABCDEF0123456789ABCDEF0123456789ABCDEF01&dn=x")
                .unwrap();
        assert_eq!(hash.as_str(), "ABCDEF0123456789ABCDEF0123456789ABCDEF01");
        assert!(hash.is_info_hash());
    }

    #[test]
    fn test_magnet_hash_at_end_of_uri() {
        let hash = hash_from_magnet("magnet:?dn=x&xt=urn:btih:0123456789abcdef0123456789abcdef01234567")
            .unwrap();
        assert_eq!(hash.as_str(), "0123456789abcdef0123456789abcdef01234567");
    }

    #[test]
    fn test_magnet_base32_hash_is_kept_verbatim() {
        let hash = hash_from_magnet("magnet:?xt=urn:btih:MFRGGZDFMZTWQ2LKNNWG23TPOBYXE43U&tr=udp://t")
            .unwrap();
        assert_eq!(hash.as_str(), "MFRGGZDFMZTWQ2LKNNWG23TPOBYXE43U");
        assert!(!hash.is_info_hash());
    }

    #[test]
    fn test_magnet_without_hash() {
        let result = hash_from_magnet("magnet:?dn=Test%20Torrent&tr=http://tracker.example.com");
        assert!(matches!(result, Err(TorrentError::MissingMagnetHash { .. })));
    }
}
