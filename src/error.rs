use std::path::PathBuf;
use thiserror::Error;

/// Core error taxonomy. `InvalidPath` and `Analysis` are fatal and abort a
/// run before producing any partial result; per-file failures are recorded
/// inside the plan/result instead of being raised.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("cannot access '{path}': {reason}")]
    FileAccess { path: PathBuf, reason: String },

    #[error("analysis failed: {0}")]
    Analysis(String),

    #[error("organization failed: {0}")]
    Organization(String),
}

pub type Result<T> = std::result::Result<T, Error>;
