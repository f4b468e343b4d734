use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::TEXT_EXTENSIONS;

/// Immutable snapshot of one file, taken at analysis time.
#[derive(Debug, Clone, Serialize)]
pub struct FileMetadata {
    pub path: PathBuf,
    pub name: String,
    /// Lowercased extension without the dot, empty when the file has none
    pub extension: String,
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,
    pub is_text: bool,
    /// Files over the size limit are never opened for preview but still
    /// classify by extension
    pub oversized: bool,
    pub content_preview: Option<String>,
}

impl FileMetadata {
    pub fn stem(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.name.clone())
    }

    pub fn preview(&self) -> &str {
        self.content_preview.as_deref().unwrap_or("")
    }
}

/// Read filesystem attributes and a bounded content preview for one file.
/// Reads only, never mutates.
pub fn extract_metadata(path: &Path, settings: &Settings) -> Result<FileMetadata> {
    let attrs = fs::metadata(path).map_err(|e| Error::FileAccess {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if !attrs.is_file() {
        return Err(Error::FileAccess {
            path: path.to_path_buf(),
            reason: "not a regular file".to_string(),
        });
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    let size_bytes = attrs.len();
    let modified: DateTime<Utc> = attrs
        .modified()
        .unwrap_or_else(|_| SystemTime::now())
        .into();

    let is_text = TEXT_EXTENSIONS.contains(&extension.as_str());
    let oversized = size_bytes > settings.max_file_size_bytes();

    let content_preview = if is_text && !oversized {
        read_preview(path, settings.preview_chars)
    } else {
        None
    };

    Ok(FileMetadata {
        path: path.to_path_buf(),
        name,
        extension,
        size_bytes,
        modified,
        is_text,
        oversized,
        content_preview,
    })
}

/// Read at most `max_chars` characters from the start of a text file. A
/// failed preview read is not fatal; the file stays categorizable by
/// extension.
fn read_preview(path: &Path, max_chars: usize) -> Option<String> {
    let mut file = File::open(path).ok()?;

    // UTF-8 chars are at most 4 bytes, so this bounds the read
    let mut buffer = vec![0u8; max_chars * 4];
    let mut read_total = 0;
    while read_total < buffer.len() {
        match file.read(&mut buffer[read_total..]) {
            Ok(0) => break,
            Ok(n) => read_total += n,
            Err(_) => return None,
        }
    }
    buffer.truncate(read_total);

    let text = String::from_utf8_lossy(&buffer);
    Some(text.chars().take(max_chars).collect())
}
