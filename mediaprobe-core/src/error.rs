// ============================================================================
// mediaprobe-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error Types for Probing and Engine Access
//
// Two layers of errors live here. `EngineError` describes what went wrong
// inside a demuxing engine (missing file, missing executable, unrecognized
// container, unparsable output). `ProbeError` is what callers of the probe
// see: it classifies the failure by the stage that produced it and carries
// the engine error as its source.
//
// AI-ASSISTANT-INFO: Error types for the probe and engine layers

// ---- External crate imports ----
use thiserror::Error;

// ---- Standard library imports ----
use std::path::PathBuf;
use std::process::ExitStatus;

// ============================================================================
// ENGINE ERRORS
// ============================================================================

/// Failures reported by a demuxing engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Source not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Engine executable '{0}' not found")]
    ToolNotFound(String),

    #[error("Engine process exited with {status}: {stderr}")]
    ProcessFailed { status: ExitStatus, stderr: String },

    #[error("Unrecognized container format: {0}")]
    UnrecognizedFormat(String),

    #[error("Stream analysis failed: {0}")]
    Analysis(String),

    #[error("Failed to parse engine output: {0}")]
    Parse(String),

    #[error("{context}: {message} (code {code})")]
    Ffmpeg {
        context: String,
        code: i32,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// PROBE ERRORS
// ============================================================================

/// Failures returned by [`crate::ContainerProbe`].
///
/// Every variant is terminal for the probe call that produced it. Resources
/// acquired before the failure have already been released when the error
/// reaches the caller.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The source could not be opened or its container was not recognized.
    #[error("Failed to open '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    /// The engine's stream discovery pass failed.
    #[error("Failed to read stream information from '{}': {source}", path.display())]
    StreamInfo {
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    /// A value reported by the engine does not fit the aggregate's field type.
    #[error("Value for {field} cannot be represented: {detail}")]
    Format { field: &'static str, detail: String },

    /// Memory was exhausted while cloning codec parameters.
    #[error("Out of memory cloning {bytes} bytes of codec parameters")]
    Allocation { bytes: usize },
}

/// Result type for probe operations
pub type ProbeResult<T> = std::result::Result<T, ProbeError>;

/// Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Creates an `EngineError::ProcessFailed` from a finished process.
///
/// Only the last non-empty line of stderr is kept; ffprobe prints the
/// relevant diagnostic last.
pub fn process_failed_error(status: ExitStatus, stderr: &[u8]) -> EngineError {
    let text = String::from_utf8_lossy(stderr);
    let summary = text
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no diagnostic output")
        .to_string();
    EngineError::ProcessFailed {
        status,
        stderr: summary,
    }
}
