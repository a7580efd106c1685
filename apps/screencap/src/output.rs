use std::{
    env,
    path::{Path, PathBuf},
};

use chrono::{DateTime, TimeZone};

pub const DATE_TOKEN: &str = "<date>";
const DATE_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Where bare file names end up: the user's video directory if it exists,
/// otherwise the current directory.
pub fn media_dir() -> PathBuf {
    media_dir_from(
        directories::UserDirs::new().and_then(|dirs| dirs.video_dir().map(Path::to_path_buf)),
    )
}

fn media_dir_from(video_dir: Option<PathBuf>) -> PathBuf {
    video_dir
        .filter(|dir| dir.is_dir())
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Resolves a file-entry answer to the final output path.
pub fn resolve<Tz: TimeZone>(
    entry: &str,
    extension: &str,
    media_dir: &Path,
    now: &DateTime<Tz>,
) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    let entry = entry.trim();
    let entry = if entry.is_empty() { DATE_TOKEN } else { entry };
    let entry = entry.replace(DATE_TOKEN, &now.format(DATE_FORMAT).to_string());

    let mut path = PathBuf::from(entry);
    if path.extension().is_none() {
        path.set_extension(extension);
    }
    let bare = path
        .parent()
        .is_none_or(|parent| parent.as_os_str().is_empty());
    if bare { media_dir.join(path) } else { path }
}

/// Intermediate file for two-pass sessions, named by a millisecond timestamp.
pub fn temp_path<Tz: TimeZone>(extension: &str, now: &DateTime<Tz>) -> PathBuf {
    env::temp_dir().join(format!("{}.{extension}", now.timestamp_millis()))
}
