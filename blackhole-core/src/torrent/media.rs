//! Media container extension allow-list

use std::path::Path;

/// Extensions recognized as media containers, lowercase and without the dot.
///
/// Mirrors the list Radarr uses to decide which files it will import.
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "m4v", "3gp", "nsv", "ty", "strm", "rm", "rmvb", "m3u", "ifo", "mov", "qt", "divx", "xvid",
    "bivx", "nrg", "pva", "wmv", "asf", "asx", "ogm", "ogv", "m2v", "avi", "bin", "dat", "dvr-ms",
    "mpg", "mpeg", "mp4", "avc", "vp3", "svq3", "nuv", "viv", "dv", "fli", "flv", "wpl", "img",
    "iso", "vob", "mkv", "mk3d", "ts", "wtv", "m2ts", "webm",
];

/// Returns the lowercase extension of `path` when it is on the media allow-list.
fn media_extension(path: &str) -> Option<String> {
    let extension = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    MEDIA_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

/// Checks whether a remote file path names a media container.
pub fn is_media_path(path: &str) -> bool {
    media_extension(path).is_some()
}

/// Strips a recognized media-container extension from `name`.
///
/// Returns `None` when `name` has no extension or one that is not on the
/// allow-list.
pub fn strip_media_extension(name: &str) -> Option<&str> {
    let extension = media_extension(name)?;
    name.get(..name.len() - extension.len() - 1)
}
