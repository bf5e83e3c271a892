//! # c99conv
//!
//! Build-time wrapper that turns a C99 FFmpeg source file into C89 that old
//! MSVC toolchains can compile.
//!
//! The heavy lifting is done by two external programs: the platform compiler
//! (preprocess only) and the `c99conv.exe` converter. This crate sequences
//! them, picks the right compiler, and guarantees the intermediate file is
//! gone afterwards.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input.c
//!  │
//!  ├─ 1. Toolchain   --cc, else CC from chromium.gyp_env (GOMA), else cl.exe
//!  ├─ 2. Preprocess  cl.exe -P … -Fi input.c_preprocessed.c input.c
//!  ├─ 3. Convert     c99conv.exe input.c_preprocessed.c output.c
//!  └─ 4. Cleanup     remove input.c_preprocessed.c
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use c99conv::{convert, Invocation, PipelineConfig, ProjectLayout};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let layout = ProjectLayout::new("/src/third_party/ffmpeg");
//!     let config = PipelineConfig::builder(layout).build()?;
//!     let invocation = Invocation::new("libavcodec/vp8.c", "out/vp8.c")
//!         .with_extra_flags(["-I", "out/Release"]);
//!     let outcome = convert(&invocation, &config).await?;
//!     for line in &outcome.diagnostics {
//!         println!("{line}");
//!     }
//!     std::process::exit(outcome.exit_code);
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `c99conv` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder, ProjectLayout};
pub use convert::{convert, convert_sync, convert_with, Invocation};
pub use error::C99ConvError;
pub use output::{PipelineOutcome, PipelineStats, Stage};
pub use pipeline::converter::{Converter, ExternalConverter};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
