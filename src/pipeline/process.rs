//! Child-process helpers shared by both stages.

use crate::error::C99ConvError;
use std::ffi::OsStr;
use std::io::Read;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::warn;

/// A finished child whose stdout and stderr were captured together.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    pub exit_code: i32,
    /// Combined stdout/stderr, lossily decoded.
    pub text: String,
}

/// Map an exit status to a process exit code.
///
/// Signal deaths become `128 + signal` on Unix, matching shell convention.
/// Any other status without a code becomes 1.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            warn!("Child terminated by signal {}", signal);
            return 128 + signal;
        }
    }

    1
}

/// Run `program args…` in `cwd`, capturing stdout and stderr through one pipe.
///
/// A single pipe keeps the compiler's interleaving of the two streams.
/// The read end is drained on a blocking thread while the child is awaited
/// so a chatty child can never fill the pipe and stall.
pub async fn run_captured<S: AsRef<OsStr>>(
    program: &str,
    args: &[S],
    cwd: &Path,
) -> Result<CapturedOutput, C99ConvError> {
    let io_err = |source| C99ConvError::ProcessIo {
        program: program.to_string(),
        source,
    };

    let (mut reader, writer) = std::io::pipe().map_err(io_err)?;
    let writer_err = writer.try_clone().map_err(io_err)?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .stdout(Stdio::from(writer))
        .stderr(Stdio::from(writer_err));

    let mut child = cmd.spawn().map_err(|source| C99ConvError::SpawnFailed {
        program: program.to_string(),
        source,
    })?;
    // The command still holds our copies of the write end; EOF never
    // arrives while they are open.
    drop(cmd);

    let drain = tokio::task::spawn_blocking(move || {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).map(|_| buf)
    });

    let status = child.wait().await.map_err(io_err)?;
    let buf = drain
        .await
        .map_err(|e| C99ConvError::Internal(format!("output reader panicked: {e}")))?
        .map_err(io_err)?;

    Ok(CapturedOutput {
        exit_code: exit_code(status),
        text: String::from_utf8_lossy(&buf).into_owned(),
    })
}

/// Run `program args…` in `cwd` with inherited stdio and return its exit code.
pub async fn run_inherited<S: AsRef<OsStr>>(
    program: &Path,
    args: &[S],
    cwd: &Path,
) -> Result<i32, C99ConvError> {
    let status = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .status()
        .await
        .map_err(|source| C99ConvError::SpawnFailed {
            program: program.display().to_string(),
            source,
        })?;
    Ok(exit_code(status))
}
