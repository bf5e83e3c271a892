//! Error types for the c99conv library.
//!
//! Only infrastructure failures are errors here: a project root that cannot
//! be found, a build-environment file that cannot be read or parsed, or a
//! child process that cannot be spawned or awaited.
//!
//! A compiler or converter that *runs* and exits non-zero is not an error.
//! That outcome is reported through [`crate::output::PipelineOutcome`] with
//! `exit_code != 0`, so the caller can surface the child's status verbatim.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the c99conv library.
#[derive(Debug, Error)]
pub enum C99ConvError {
    // ── Layout errors ─────────────────────────────────────────────────────
    /// No ancestor of the searched directories contains the converter binary.
    #[error(
        "Could not locate the project root (no ancestor contains {marker}).\n\
         Searched from: {searched:?}\n\
         Pass --project-root or set C99CONV_PROJECT_ROOT."
    )]
    ProjectRootNotFound {
        marker: PathBuf,
        searched: Vec<PathBuf>,
    },

    // ── Build-environment errors ──────────────────────────────────────────
    /// The build-environment file exists but could not be read.
    #[error("Failed to read build environment '{path}': {source}")]
    BuildEnvUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The build-environment file is not a well-formed mapping literal.
    #[error("Malformed build environment '{path}' at {line}:{column}: {detail}")]
    BuildEnvMalformed {
        path: PathBuf,
        line: usize,
        column: usize,
        detail: String,
    },

    /// The mapping parsed, but a known key has the wrong shape.
    #[error("Invalid build environment '{path}': {detail}")]
    BuildEnvSchema { path: PathBuf, detail: String },

    /// A compiler command resolved to zero tokens.
    #[error("Compiler command from {origin} is empty")]
    EmptyCompilerCommand { origin: String },

    // ── Invocation errors ─────────────────────────────────────────────────
    /// The caller-supplied paths cannot be used.
    #[error("Invalid invocation: {0}")]
    InvalidInvocation(String),

    // ── Process errors ────────────────────────────────────────────────────
    /// The child process could not be started (binary missing, not executable).
    #[error("Failed to launch '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child, or reading its output, failed.
    #[error("I/O error while running '{program}': {source}")]
    ProcessIo {
        program: String,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
