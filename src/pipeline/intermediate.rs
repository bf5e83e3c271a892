//! The preprocessed file bridging the two stages.
//!
//! It lives next to the input (`<input>_preprocessed.c`) so GOMA accepts the
//! path, and it must end in `.c`: the converter is built on libclang, which
//! picks the language from the extension and crashes on anything else.
//!
//! [`Intermediate`] owns the path for the duration of one run and deletes the
//! file on drop, so every exit path (compiler failure, converter failure,
//! spawn error, panic) leaves nothing behind.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Suffix appended to the input path. Must end in `.c`.
pub const INTERMEDIATE_SUFFIX: &str = "_preprocessed.c";

/// Derive the intermediate path for `input`.
pub fn intermediate_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(INTERMEDIATE_SUFFIX);
    PathBuf::from(name)
}

/// Owned intermediate artifact; removed when dropped.
#[derive(Debug)]
pub struct Intermediate {
    path: PathBuf,
}

impl Intermediate {
    /// Claim the intermediate path for `input`.
    pub fn for_input(input: &Path) -> Self {
        Self {
            path: intermediate_path(input),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the file now if it exists.
    ///
    /// Best-effort: failures are logged, never returned.
    pub fn remove(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed intermediate {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove intermediate {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

impl Drop for Intermediate {
    fn drop(&mut self) {
        self.remove();
    }
}
