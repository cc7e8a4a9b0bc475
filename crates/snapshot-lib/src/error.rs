//! Error types for snapshot construction
//!
//! Only whole-feed failures abort a run: an undecodable JSON payload or a
//! failed kubectl invocation. Row-level problems in the tabular feeds are
//! handled by skipping and counting, never by raising an error.

use thiserror::Error;

/// Errors that abort a snapshot run.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// A structured feed could not be decoded. Partial decoding of a
    /// malformed feed is not attempted.
    #[error("failed to decode {feed} feed: {source}")]
    Decode {
        feed: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The external command could not be spawned.
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The external command ran but exited non-zero.
    #[error("command `{command}` failed: {stderr}")]
    Command { command: String, stderr: String },

    /// The external command produced output that is not valid UTF-8.
    #[error("command `{command}` produced non-UTF-8 output")]
    InvalidOutput { command: String },
}
