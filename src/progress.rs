//! Progress-callback trait for per-stage pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to be told
//! when each external process starts and finishes. The `c99conv` binary uses
//! this to drive a terminal spinner; a build system could forward the events
//! to its own log instead.
//!
//! # Example
//!
//! ```rust
//! use c99conv::{PipelineConfig, PipelineProgressCallback, ProjectLayout, Stage};
//! use std::sync::Arc;
//!
//! struct StageLogger;
//!
//! impl PipelineProgressCallback for StageLogger {
//!     fn on_stage_complete(&self, stage: Stage, exit_code: i32) {
//!         eprintln!("{stage} exited with {exit_code}");
//!     }
//! }
//!
//! let config = PipelineConfig::builder(ProjectLayout::new("/src/ffmpeg"))
//!     .progress_callback(Arc::new(StageLogger) as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::Stage;
use std::sync::Arc;

/// Called by the pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Stages run one after another, so calls never
/// overlap, but the trait is `Send + Sync` so the config stays shareable.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once, after the toolchain is resolved and before any process runs.
    ///
    /// # Arguments
    /// * `compiler`: the resolved compiler command tokens
    fn on_pipeline_start(&self, compiler: &[String]) {
        let _ = compiler;
    }

    /// Called just before the stage's child process is spawned.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when the stage's child process has exited.
    ///
    /// # Arguments
    /// * `stage`    : the stage that finished
    /// * `exit_code`: the child's exit code (0 on success)
    fn on_stage_complete(&self, stage: Stage, exit_code: i32) {
        let _ = (stage, exit_code);
    }

    /// Called right after the preprocess stage with the compiler output worth
    /// showing, before the converter starts. Not called when the compiler
    /// could not be launched.
    fn on_diagnostics(&self, lines: &[String]) {
        let _ = lines;
    }

    /// Called once after cleanup, with the overall exit code.
    fn on_pipeline_complete(&self, exit_code: i32) {
        let _ = exit_code;
    }
}

/// Convenience type alias for a shared callback.
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

/// A no-op callback. Useful as a default.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}
