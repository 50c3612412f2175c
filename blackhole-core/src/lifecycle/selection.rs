//! Media file selection policy

use std::collections::BTreeSet;

use super::Rejection;
use crate::debrid::{AvailabilitySet, RemoteFile};
use crate::torrent::is_media_path;

/// Files chosen for download from a remote torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelection {
    /// Id of the largest media file
    pub largest_id: String,
    /// Ids to request, in remote file order
    pub file_ids: Vec<String>,
    /// Number of media files the torrent holds
    pub media_count: usize,
}

impl FileSelection {
    /// Builds the selection for `files`.
    ///
    /// Returns `None` when the torrent holds no media files.
    pub fn plan(files: &[RemoteFile], only_largest_file: bool) -> Option<Self> {
        let media = media_files(files);
        let largest = largest_file(&media)?;

        let file_ids = if only_largest_file {
            vec![largest.id.clone()]
        } else {
            media.iter().map(|file| file.id.clone()).collect()
        };

        Some(Self {
            largest_id: largest.id.clone(),
            file_ids,
            media_count: media.len(),
        })
    }

    /// The requested ids as a set, for comparison with cached bundles.
    pub fn target(&self) -> BTreeSet<String> {
        self.file_ids.iter().cloned().collect()
    }
}

/// Files whose extension is in the media allow-list.
pub fn media_files(files: &[RemoteFile]) -> Vec<&RemoteFile> {
    files.iter().filter(|file| is_media_path(&file.path)).collect()
}

/// The largest file; on ties the first one wins.
pub fn largest_file<'a>(files: &[&'a RemoteFile]) -> Option<&'a RemoteFile> {
    files.iter().copied().fold(None, |largest, file| match largest {
        Some(current) if current.bytes >= file.bytes => Some(current),
        _ => Some(file),
    })
}

/// Requires some cached bundle to be exactly the selected files.
///
/// When only the largest file is wanted but the service caches it together
/// with other files, the rejection names those extra ids.
pub fn check_cached_selection(
    selection: &FileSelection,
    availability: &AvailabilitySet,
    only_largest_file: bool,
) -> Result<(), Rejection> {
    if availability.has_exact_group(&selection.target()) {
        return Ok(());
    }

    let extra_files = if only_largest_file {
        availability
            .group_containing(&selection.largest_id)
            .map(|group| {
                group
                    .file_ids()
                    .iter()
                    .filter(|id| **id != selection.largest_id)
                    .cloned()
                    .collect()
            })
    } else {
        None
    };

    Err(Rejection::CacheMismatch { extra_files })
}
