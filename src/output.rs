//! Output types returned by a pipeline run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One of the two external-process stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// The compiler running in preprocess-only mode.
    Preprocess,
    /// The C99-to-C89 converter.
    Convert,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Preprocess => f.write_str("preprocess"),
            Stage::Convert => f.write_str("convert"),
        }
    }
}

/// Result of a run that got as far as launching the compiler.
///
/// `exit_code` is what the process should exit with: the first failing
/// stage's status, or the converter's status when preprocessing succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    /// Overall exit code.
    pub exit_code: i32,

    /// The stage whose failure decided `exit_code`, if any.
    pub failed_stage: Option<Stage>,

    /// Compiler command tokens actually used.
    pub compiler: Vec<String>,

    /// Preprocessor output lines worth showing (see
    /// [`crate::pipeline::preprocess::filter_diagnostics`]).
    pub diagnostics: Vec<String>,

    /// Final output path.
    pub output: PathBuf,

    /// Timing information.
    pub stats: PipelineStats,
}

impl PipelineOutcome {
    /// `true` when both stages exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Wall-clock timings for a run, in milliseconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineStats {
    pub preprocess_duration_ms: u64,
    /// None when the convert stage never ran.
    pub convert_duration_ms: Option<u64>,
    pub total_duration_ms: u64,
}
