use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::utils::sanitize_filename;

const PATH_SEPARATORS: [char; 2] = ['\\', '/'];

/// A synthesized output location relative to the download directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputPath {
    pub subfolders: Vec<String>,
    pub filename: String,
}

impl OutputPath {
    /// Joins the subfolders and filename with the native separator.
    pub fn to_path_buf(&self) -> PathBuf {
        let mut path: PathBuf = self.subfolders.iter().collect();
        path.push(&self.filename);
        path
    }
}

impl fmt::Display for OutputPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path_buf().display())
    }
}

/// Splits a fully expanded template on `/` and `\`.
///
/// Empty segments are dropped, the last segment becomes the filename and
/// the others the subfolders. Every segment is sanitized on its own.
pub fn split_path(full: &str) -> OutputPath {
    let mut segments: Vec<String> = full
        .split(PATH_SEPARATORS)
        .filter(|segment| !segment.is_empty())
        .map(|segment| sanitize_filename(segment).into_owned())
        .collect();

    let filename = segments.pop().unwrap_or_default();
    OutputPath {
        subfolders: segments,
        filename,
    }
}

/// Returns `path` if nothing exists there, otherwise the first free
/// `name (n).ext` next to it, counting n up from 1.
///
/// This only looks at the filesystem as it is right now and reserves
/// nothing: another writer can still take the returned name before the
/// caller creates it. Open the file with `create_new` when that matters.
pub fn get_non_colliding_name(path: &Path) -> io::Result<PathBuf> {
    if !path.try_exists()? {
        return Ok(path.to_path_buf());
    }

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let (stem, extension) = split_extension(path);

    let mut n: u64 = 1;
    loop {
        let mut name = stem.clone();
        name.push(format!(" ({n})"));
        name.push(&extension);

        let candidate = parent.join(name);
        if !candidate.try_exists()? {
            debug!("{} exists, using {}", path.display(), candidate.display());
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Splits the file name into stem and dotted extension, byte for byte.
///
/// A name that is nothing but a leading dot and a suffix (`.mp4`) is all
/// extension and has an empty stem.
fn split_extension(path: &Path) -> (OsString, OsString) {
    let name = path.file_name().unwrap_or_default();
    match path.extension() {
        Some(ext) => {
            let mut extension = OsString::from(".");
            extension.push(ext);
            (path.file_stem().unwrap_or_default().to_os_string(), extension)
        }
        None if name.as_encoded_bytes().first() == Some(&b'.') => (OsString::new(), name.to_os_string()),
        None => (name.to_os_string(), OsString::new()),
    }
}

/// Best guess at the container extension for a VOD quality string such as
/// `1080p60`, `Source` or `Audio Only`. `None` when the quality gives no hint.
///
/// Any leading Unicode numeric character counts as a resolution, not only ASCII digits.
pub fn guess_vod_extension(quality: Option<&str>) -> Option<&'static str> {
    let Some(quality) = quality.filter(|q| !q.trim().is_empty()) else {
        return Some(".mp4");
    };

    let lower = quality.to_lowercase();
    if lower.contains("audio") {
        return Some(".m4a");
    }

    if quality.starts_with(|ch: char| ch.is_numeric())
        || lower.contains("source")
        || lower.contains("chunked")
    {
        return Some(".mp4");
    }

    None
}
