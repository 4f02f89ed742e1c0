//! Recordings catalog.
//!
//! Finished recordings are plain files in one directory; the catalog is
//! whatever is on disk at the moment of the request. Only transcoded `.mp4`
//! files are listed. Raw `.mjpeg` files still waiting on the encoder, or
//! left behind by a failed run, are downloadable by exact name but never
//! advertised.

use std::cmp::Reverse;
use std::io;
use std::path::{Path, PathBuf};

use picast_common::security::path_validation::validate_recording_filename;
use picast_common::RecordingEntry;
use tracing::warn;

/// List finished recordings, newest first.
///
/// Ordering uses the millisecond timestamp embedded in the filename rather
/// than file mtime, so a transcode finishing late does not reorder the list.
pub async fn list_recordings(dir: &Path) -> io::Result<Vec<RecordingEntry>> {
    let mut entries = Vec::new();
    let mut read_dir = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = read_dir.next_entry().await? {
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(_) => continue,
        };
        if !name.ends_with(".mp4") {
            continue;
        }

        match entry.metadata().await {
            Ok(metadata) if metadata.is_file() => {
                entries.push(RecordingEntry::new(name, metadata.len()));
            }
            Ok(_) => {}
            Err(err) => warn!("could not stat recording {name}: {err}"),
        }
    }

    entries.sort_by_key(|entry| Reverse(entry.timestamp_millis().unwrap_or(0)));
    Ok(entries)
}

/// Resolve a client-supplied filename to a path inside the recordings
/// directory.
///
/// Returns `None` for any name that does not validate; callers treat that
/// the same as a missing file.
pub fn resolve_download(dir: &Path, filename: &str) -> Option<PathBuf> {
    match validate_recording_filename(filename) {
        Ok(()) => Some(dir.join(filename)),
        Err(err) => {
            warn!("rejected download request for {filename:?}: {err}");
            None
        }
    }
}

/// Content type for a download by extension.
pub fn download_content_type(filename: &str) -> &'static str {
    if filename.ends_with(".mp4") {
        "video/mp4"
    } else {
        "application/octet-stream"
    }
}
