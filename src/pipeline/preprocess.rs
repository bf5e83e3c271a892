//! Preprocess stage: run the compiler with `-P` to flatten the input.
//!
//! The argument list mirrors the CFLAGS of an MSVC FFmpeg build. Its order
//! matters only in that caller flags land after the stock defines, so a
//! caller `-D`/`-U` wins over a default.

use crate::config::PipelineConfig;
use crate::error::C99ConvError;
use crate::pipeline::process::run_captured;
use crate::pipeline::toolchain::CompilerCommand;
use std::ffi::OsString;
use std::path::Path;
use tracing::debug;

/// What the compiler reported.
#[derive(Debug, Clone)]
pub struct PreprocessResult {
    pub exit_code: i32,
    /// Every captured output line, unfiltered.
    pub lines: Vec<String>,
}

impl PreprocessResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Build the compiler arguments that follow the compiler command tokens.
pub fn build_args(
    config: &PipelineConfig,
    input: &Path,
    intermediate: &Path,
    extra_flags: &[String],
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-P".into(), "-nologo".into()];

    args.extend(config.macro_flags.iter().map(OsString::from));

    if let Some(ref header) = config.forced_include {
        args.push(format!("-FI{header}").into());
    }

    args.extend(extra_flags.iter().map(OsString::from));

    args.extend(
        config
            .disabled_warnings
            .iter()
            .map(|code| OsString::from(format!("-wd{code}"))),
    );

    args.push("-I".into());
    args.push(".".into());
    args.push("-I".into());
    args.push(config.layout.root.clone().into_os_string());
    for dir in &config.layout.include_dirs {
        args.push("-I".into());
        args.push(dir.clone().into_os_string());
    }

    let mut redirect = OsString::from("-Fi");
    redirect.push(intermediate);
    args.push(redirect);
    args.push(input.as_os_str().to_owned());

    args
}

/// Run the compiler and collect its output.
pub async fn run_preprocess(
    compiler: &CompilerCommand,
    args: &[OsString],
    cwd: &Path,
) -> Result<PreprocessResult, C99ConvError> {
    let mut full: Vec<OsString> = compiler.args().iter().map(OsString::from).collect();
    full.extend_from_slice(args);
    debug!("{} {:?}", compiler.program(), full);

    let captured = run_captured(compiler.program(), &full, cwd).await?;
    Ok(PreprocessResult {
        exit_code: captured.exit_code,
        lines: captured.text.lines().map(str::to_string).collect(),
    })
}

/// Choose which compiler output lines to show.
///
/// `cl.exe` echoes the source file name on every invocation. When the run
/// succeeded that line is noise and is dropped; when it failed, every line
/// is kept for diagnosis.
pub fn filter_diagnostics(lines: &[String], succeeded: bool, input_name: &str) -> Vec<String> {
    lines
        .iter()
        .filter(|line| !succeeded || line.trim() != input_name)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectLayout;
    use std::path::PathBuf;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn args_follow_msvc_cflags_layout() {
        let config = PipelineConfig::builder(ProjectLayout::new("/src/ffmpeg"))
            .build()
            .unwrap();
        let args = strings(&build_args(
            &config,
            Path::new("/src/ffmpeg/libavcodec/vp8.c"),
            Path::new("/src/ffmpeg/libavcodec/vp8.c_preprocessed.c"),
            &["-I".to_string(), "extra/include".to_string()],
        ));

        assert_eq!(&args[..2], ["-P", "-nologo"]);
        assert_eq!(args[2], "-DCOMPILING_avcodec=1");
        assert_eq!(args[15], "-Dvsnprintf=avpriv_vsnprintf");
        assert_eq!(args[16], "-FIstdlib.h");
        assert_eq!(&args[17..19], ["-I", "extra/include"]);
        assert_eq!(args[19], "-wd4005");
        assert_eq!(
            &args[20..28],
            [
                "-I",
                ".",
                "-I",
                "/src/ffmpeg",
                "-I",
                "chromium/config",
                "-I",
                "chromium/include/win"
            ]
        );
        assert_eq!(args[28], "-Fi/src/ffmpeg/libavcodec/vp8.c_preprocessed.c");
        assert_eq!(args[29], "/src/ffmpeg/libavcodec/vp8.c");
        assert_eq!(args.len(), 30);
    }

    #[test]
    fn forced_include_can_be_disabled() {
        let config = PipelineConfig::builder(ProjectLayout::new(PathBuf::from("/r")))
            .forced_include(None)
            .macro_flags(Vec::<String>::new())
            .disabled_warnings(vec![4005, 4996])
            .build()
            .unwrap();
        let args = strings(&build_args(&config, Path::new("a.c"), Path::new("b.c"), &[]));
        assert!(!args.iter().any(|a| a.starts_with("-FI")));
        assert_eq!(&args[2..4], ["-wd4005", "-wd4996"]);
    }

    #[test]
    fn success_drops_only_filename_echo() {
        let out = filter_diagnostics(
            &lines(&["vp8.c", "  vp8.c  ", "warning C4244: conversion", "vp8.cc"]),
            true,
            "vp8.c",
        );
        assert_eq!(out, lines(&["warning C4244: conversion", "vp8.cc"]));
    }

    #[test]
    fn failure_keeps_every_line() {
        let input = lines(&["vp8.c", "vp8.c(12): error C2065: undeclared"]);
        let out = filter_diagnostics(&input, false, "vp8.c");
        assert_eq!(out, input);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_prepends_compiler_args() {
        let dir = tempfile::tempdir().unwrap();
        let compiler =
            CompilerCommand::from_tokens(["sh", "-c", "echo \"$0 $1\"; exit 2"]).unwrap();
        let result = run_preprocess(&compiler, &["first".into(), "second".into()], dir.path())
            .await
            .unwrap();
        assert!(!result.success());
        assert_eq!(result.exit_code, 2);
        assert_eq!(result.lines, vec!["first second".to_string()]);
    }
}
