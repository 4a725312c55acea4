//! Error types for Tachylog

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while recording or exporting a session
#[derive(Debug, Error)]
pub enum LogError {
    #[error("No active session to export")]
    NoActiveSession,

    #[error("No stimulus file selected")]
    NoFileSelected,

    #[error("No participant attached to the session")]
    NoParticipant,

    #[error("Failed to read input file {path}: {source}")]
    InputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
