//! Convert stage: hand the preprocessed file to the C99-to-C89 converter.
//!
//! The converter is opaque. All this crate knows is that it takes an input
//! and an output path, resolves relative paths against the project root, and
//! reports success through its exit status. [`Converter`] captures exactly
//! that capability so tests (and callers with an in-process converter) can
//! stand in for the native binary.

use crate::error::C99ConvError;
use crate::pipeline::process::run_inherited;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Something that turns a preprocessed C99 file into a C89 file.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Convert `input` into `output`, running in `cwd`.
    ///
    /// Returns the exit code; 0 means success. `Err` is reserved for
    /// failures to run the converter at all.
    async fn convert(&self, input: &Path, output: &Path, cwd: &Path) -> Result<i32, C99ConvError>;
}

/// The native `c99conv.exe` binary.
///
/// Its stdout and stderr are inherited, not captured, so whatever it prints
/// reaches the build log unfiltered.
#[derive(Debug, Clone)]
pub struct ExternalConverter {
    executable: PathBuf,
}

impl ExternalConverter {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

#[async_trait]
impl Converter for ExternalConverter {
    async fn convert(&self, input: &Path, output: &Path, cwd: &Path) -> Result<i32, C99ConvError> {
        debug!(
            "{} {} {} (cwd {})",
            self.executable.display(),
            input.display(),
            output.display(),
            cwd.display()
        );
        run_inherited(&self.executable, &[input.as_os_str(), output.as_os_str()], cwd).await
    }
}
