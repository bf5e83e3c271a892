//! Pipeline entry points: resolve, preprocess, convert, clean up.
//!
//! ```text
//! START → RESOLVE_TOOLCHAIN → PREPROCESS ─┬─ fail → CLEANUP → EXIT(code)
//!                                         └─ ok   → CONVERT → CLEANUP → EXIT(code)
//! ```
//!
//! Stages run strictly one after another. Non-zero exit statuses are
//! returned inside [`PipelineOutcome`]; only infrastructure failures
//! surface as `Err`.

use crate::config::PipelineConfig;
use crate::error::C99ConvError;
use crate::output::{PipelineOutcome, PipelineStats, Stage};
use crate::pipeline::converter::{Converter, ExternalConverter};
use crate::pipeline::intermediate::Intermediate;
use crate::pipeline::{preprocess, toolchain};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// One conversion request.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// C99 source to preprocess.
    pub input: PathBuf,
    /// Where the converter writes the C89 result.
    pub output: PathBuf,
    /// Extra compiler flags, passed through verbatim.
    pub extra_flags: Vec<String>,
}

impl Invocation {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            extra_flags: Vec::new(),
        }
    }

    pub fn with_extra_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_flags = flags.into_iter().map(Into::into).collect();
        self
    }
}

/// Run the pipeline with the native converter from `config.layout`.
pub async fn convert(
    invocation: &Invocation,
    config: &PipelineConfig,
) -> Result<PipelineOutcome, C99ConvError> {
    let converter = ExternalConverter::new(&config.layout.converter);
    convert_with(invocation, config, &converter).await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    invocation: &Invocation,
    config: &PipelineConfig,
) -> Result<PipelineOutcome, C99ConvError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| C99ConvError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(invocation, config))
}

/// Run the pipeline with a caller-supplied [`Converter`].
pub async fn convert_with(
    invocation: &Invocation,
    config: &PipelineConfig,
    converter: &dyn Converter,
) -> Result<PipelineOutcome, C99ConvError> {
    let total_start = Instant::now();

    let input = absolute(&invocation.input)?;
    let output = absolute(&invocation.output)?;
    let input_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            C99ConvError::InvalidInvocation(format!(
                "input '{}' has no file name",
                input.display()
            ))
        })?;
    let cwd = config.layout.root.as_path();
    let cb = config.progress_callback.as_ref();

    // ── Step 1: Resolve toolchain ────────────────────────────────────────
    let compiler = toolchain::resolve_compiler(config).await?;
    if let Some(cb) = cb {
        cb.on_pipeline_start(compiler.tokens());
    }

    // Held for the rest of the run; dropping it deletes the file on every
    // return path below.
    let intermediate = Intermediate::for_input(&input);

    // ── Step 2: Preprocess ───────────────────────────────────────────────
    info!("Preprocessing {}", input.display());
    if let Some(cb) = cb {
        cb.on_stage_start(Stage::Preprocess);
    }
    let preprocess_start = Instant::now();
    let args = preprocess::build_args(config, &input, intermediate.path(), &invocation.extra_flags);
    let result = preprocess::run_preprocess(&compiler, &args, cwd).await?;
    let preprocess_duration_ms = preprocess_start.elapsed().as_millis() as u64;
    if let Some(cb) = cb {
        cb.on_stage_complete(Stage::Preprocess, result.exit_code);
    }

    let diagnostics = preprocess::filter_diagnostics(&result.lines, result.success(), &input_name);
    // Delivered before the converter runs or can fail to launch.
    if let Some(cb) = cb {
        cb.on_diagnostics(&diagnostics);
    }

    if !result.success() {
        warn!(
            "Preprocessing {} failed with exit code {}",
            input.display(),
            result.exit_code
        );
        intermediate.remove();
        return Ok(finish(
            config,
            result.exit_code,
            Some(Stage::Preprocess),
            compiler.into_tokens(),
            diagnostics,
            output,
            PipelineStats {
                preprocess_duration_ms,
                convert_duration_ms: None,
                total_duration_ms: total_start.elapsed().as_millis() as u64,
            },
        ));
    }
    debug!("Preprocessed into {}", intermediate.path().display());

    // ── Step 3: Convert ──────────────────────────────────────────────────
    info!("Converting {} -> {}", intermediate.path().display(), output.display());
    if let Some(cb) = cb {
        cb.on_stage_start(Stage::Convert);
    }
    let convert_start = Instant::now();
    let exit_code = converter.convert(intermediate.path(), &output, cwd).await?;
    let convert_duration_ms = convert_start.elapsed().as_millis() as u64;
    if let Some(cb) = cb {
        cb.on_stage_complete(Stage::Convert, exit_code);
    }

    // ── Step 4: Cleanup ──────────────────────────────────────────────────
    intermediate.remove();

    if exit_code != 0 {
        warn!("Converter failed with exit code {}", exit_code);
    } else {
        info!("Wrote {}", output.display());
    }

    Ok(finish(
        config,
        exit_code,
        (exit_code != 0).then_some(Stage::Convert),
        compiler.into_tokens(),
        diagnostics,
        output,
        PipelineStats {
            preprocess_duration_ms,
            convert_duration_ms: Some(convert_duration_ms),
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        },
    ))
}

fn finish(
    config: &PipelineConfig,
    exit_code: i32,
    failed_stage: Option<Stage>,
    compiler: Vec<String>,
    diagnostics: Vec<String>,
    output: PathBuf,
    stats: PipelineStats,
) -> PipelineOutcome {
    if let Some(ref cb) = config.progress_callback {
        cb.on_pipeline_complete(exit_code);
    }
    PipelineOutcome {
        exit_code,
        failed_stage,
        compiler,
        diagnostics,
        output,
        stats,
    }
}

fn absolute(path: &Path) -> Result<PathBuf, C99ConvError> {
    std::path::absolute(path).map_err(|e| {
        C99ConvError::InvalidInvocation(format!("cannot resolve '{}': {}", path.display(), e))
    })
}
