//! Error taxonomy for the export pipeline.

use thiserror::Error;

/// Failures the exit-code mapping in `main` needs to tell apart.
///
/// Everything else (tracking-API transport failures during expansion,
/// config errors, I/O) travels as plain `anyhow` context and exits 1.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The saved query matched no work items. A normal "nothing to
    /// report" outcome: warning printed, exit code 2, no output file.
    #[error("the saved query returned no work items")]
    EmptyQueryResult,

    /// The time-log API answered with a non-success status.
    #[error("time-log API error {status}: {body}")]
    TimeHubApi {
        status: reqwest::StatusCode,
        body: String,
    },
}
