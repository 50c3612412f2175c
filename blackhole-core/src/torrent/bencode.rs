//! Canonical bencode encoding of the `info` dictionary

use super::TorrentError;

pub(super) type BencodeDict<'a> = std::collections::HashMap<&'a [u8], bencode_rs::Value<'a>>;

/// Re-encodes decoded bencode values in canonical form.
///
/// Canonical bencode sorts dictionary keys as raw byte strings, which is what
/// makes the info hash independent of how the original file ordered them.
pub struct BencodeEncoder;

impl BencodeEncoder {
    /// Decodes a torrent file and returns the canonical bytes of its `info`
    /// dictionary.
    ///
    /// # Errors
    ///
    /// - `TorrentError::InvalidTorrentFile` - Malformed bencode, non-dictionary
    ///   root, or missing/non-dictionary `info` field
    pub fn encode_info_dictionary(torrent_bytes: &[u8]) -> Result<Vec<u8>, TorrentError> {
        let parsed = bencode_rs::Value::parse(torrent_bytes).map_err(|e| {
            TorrentError::InvalidTorrentFile {
                reason: format!("Bencode parsing failed: {e:?}"),
            }
        })?;

        let Some(root) = parsed.first() else {
            return Err(TorrentError::InvalidTorrentFile {
                reason: "Empty bencode data".to_string(),
            });
        };

        let bencode_rs::Value::Dictionary(dict) = root else {
            return Err(TorrentError::InvalidTorrentFile {
                reason: "Root element must be dictionary".to_string(),
            });
        };

        let info = Self::info_dictionary(dict)?;

        let mut encoded = Vec::with_capacity(torrent_bytes.len());
        Self::encode_value(info, &mut encoded);
        Ok(encoded)
    }

    fn info_dictionary<'d, 'a>(
        dict: &'d BencodeDict<'a>,
    ) -> Result<&'d bencode_rs::Value<'a>, TorrentError> {
        let info = dict
            .get(b"info".as_slice())
            .ok_or_else(|| TorrentError::InvalidTorrentFile {
                reason: "Missing 'info' field".to_string(),
            })?;

        if !matches!(info, bencode_rs::Value::Dictionary(_)) {
            return Err(TorrentError::InvalidTorrentFile {
                reason: "Info field must be dictionary".to_string(),
            });
        }

        Ok(info)
    }

    /// Appends the canonical encoding of `value` to `out`.
    pub fn encode_value(value: &bencode_rs::Value<'_>, out: &mut Vec<u8>) {
        match value {
            bencode_rs::Value::Integer(number) => {
                out.push(b'i');
                out.extend_from_slice(number.to_string().as_bytes());
                out.push(b'e');
            }
            bencode_rs::Value::Bytes(bytes) => Self::encode_bytes(bytes, out),
            bencode_rs::Value::List(items) => {
                out.push(b'l');
                for item in items {
                    Self::encode_value(item, out);
                }
                out.push(b'e');
            }
            bencode_rs::Value::Dictionary(dict) => {
                let mut entries: Vec<_> = dict.iter().collect();
                entries.sort_by(|(left, _), (right, _)| left.cmp(right));

                out.push(b'd');
                for (key, item) in entries {
                    Self::encode_bytes(key, out);
                    Self::encode_value(item, out);
                }
                out.push(b'e');
            }
        }
    }

    fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
        out.extend_from_slice(bytes.len().to_string().as_bytes());
        out.push(b':');
        out.extend_from_slice(bytes);
    }
}
