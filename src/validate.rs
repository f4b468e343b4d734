use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const INVALID_FOLDER_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Validate that a path points to a readable directory and return its
/// canonical (absolute) form.
pub fn validate_folder(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(Error::InvalidPath {
            path: path.to_path_buf(),
            reason: "path does not exist".to_string(),
        });
    }

    if !path.is_dir() {
        return Err(Error::InvalidPath {
            path: path.to_path_buf(),
            reason: "path is not a directory".to_string(),
        });
    }

    // Readability check up front so a permission problem is fatal instead of
    // surfacing as an empty analysis.
    fs::read_dir(path).map_err(|e| Error::InvalidPath {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    fs::canonicalize(path).map_err(|e| Error::InvalidPath {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Check if name is usable as a folder name as-is.
pub fn is_valid_folder_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(INVALID_FOLDER_CHARS)
}

/// Sanitize a name so it can be created as a folder: replace invalid
/// characters, trim leading/trailing dots and spaces, cap the length.
pub fn sanitize_folder_name(name: &str, max_len: usize) -> String {
    let mut cleaned: String = name
        .chars()
        .map(|c| if INVALID_FOLDER_CHARS.contains(&c) { '_' } else { c })
        .collect();

    cleaned = cleaned.trim_matches(|c| c == '.' || c == ' ').to_string();

    if cleaned.chars().count() > max_len {
        cleaned = cleaned.chars().take(max_len).collect();
    }

    if cleaned.is_empty() {
        "folder".to_string()
    } else {
        cleaned
    }
}

/// Truncate text to at most `max_len` characters, marking the cut.
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", cut)
}
