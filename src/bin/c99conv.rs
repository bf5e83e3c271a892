//! CLI binary for c99conv.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig`, prints the compiler's diagnostics, and exits with the
//! pipeline's exit code so the calling build system sees the real status.

use anyhow::{Context, Result};
use c99conv::{
    convert, Invocation, PipelineConfig, PipelineProgressCallback, ProgressCallback,
    ProjectLayout, Stage,
};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "C99 to C89 Converter Wrapper\n  usage: c99conv <input file> <output file> [-I <include> ...]";

// ── CLI reporter: diagnostics on stdout, optional indicatif spinner ─────────

/// Prints the compiler's diagnostics to stdout as soon as preprocessing ends,
/// and optionally drives a spinner on stderr naming the running stage.
/// indicatif hides the spinner when stderr is not a terminal, so build logs
/// stay clean.
struct CliReporter {
    bar: Option<ProgressBar>,
}

impl CliReporter {
    fn new(input: &Path, show_progress: bool) -> Arc<Self> {
        let bar = show_progress.then(|| {
            let bar = ProgressBar::new_spinner();
            let style =
                ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
            bar.set_style(style);
            bar.set_prefix("Resolving");
            bar.set_message(
                input
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        Arc::new(Self { bar })
    }

    fn clear(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

impl PipelineProgressCallback for CliReporter {
    fn on_stage_start(&self, stage: Stage) {
        if let Some(ref bar) = self.bar {
            bar.set_prefix(match stage {
                Stage::Preprocess => "Preprocessing",
                Stage::Convert => "Converting",
            });
        }
    }

    fn on_stage_complete(&self, stage: Stage, exit_code: i32) {
        match self.bar {
            Some(ref bar) if exit_code != 0 => {
                bar.println(format!("✗ {stage} exited with {exit_code}"));
            }
            _ => {}
        }
    }

    fn on_diagnostics(&self, lines: &[String]) {
        let print = || {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            for line in lines {
                if writeln!(handle, "{line}").is_err() {
                    break;
                }
            }
            // The converter inherits stdout; our lines must land first.
            handle.flush().ok();
        };
        match self.bar {
            Some(ref bar) => bar.suspend(print),
            None => print(),
        }
    }

    fn on_pipeline_complete(&self, _exit_code: i32) {
        self.clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one file (run from anywhere inside the FFmpeg checkout)
  c99conv libavcodec/vp8.c out/vp8.c

  # Extra include directories are passed straight to the compiler
  c99conv libavcodec/vp8.c out/vp8.c -I out/Release/gen -DNDEBUG

  # Explicit layout and compiler
  c99conv --project-root third_party/ffmpeg --cc "gomacc.exe cl.exe" in.c out.c

COMPILER SELECTION (first match wins):
  1. --cc / C99CONV_CC
  2. 'CC' in <project root>/../../../chromium.gyp_env, e.g.
       {'CC': 'C:/goma/gomacc.exe cl.exe'}
  3. cl.exe

EXIT STATUS:
  0  both stages succeeded
  1  usage error, or the wrapper itself failed (bad chromium.gyp_env,
     compiler not found, project root not found)
  N  the compiler's exit status if preprocessing failed, otherwise the
     converter's exit status
"#;

/// Preprocess a C99 source file and convert it to C89.
#[derive(Parser, Debug)]
#[command(
    name = "c99conv",
    version,
    about = "Preprocess a C99 source file and convert it to C89",
    long_about = "Runs the platform compiler in preprocess-only mode with the FFmpeg MSVC \
CFLAGS, then feeds the result through the C99-to-C89 converter. The intermediate \
file is always removed. Options must come before <INPUT>; everything after \
<OUTPUT> goes to the compiler unchanged.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// FFmpeg checkout root. Discovered from the executable or current directory if unset.
    #[arg(long, env = "C99CONV_PROJECT_ROOT")]
    project_root: Option<PathBuf>,

    /// Converter executable (default: <root>/chromium/binaries/c99conv.exe).
    #[arg(long, env = "C99CONV_CONVERTER")]
    converter: Option<PathBuf>,

    /// Build-environment file (default: <root>/../../../chromium.gyp_env).
    #[arg(long, env = "C99CONV_BUILD_ENV")]
    build_env: Option<PathBuf>,

    /// Compiler command, split on whitespace. Skips the build-environment lookup.
    #[arg(long = "cc", env = "C99CONV_CC")]
    cc: Option<String>,

    /// Print a JSON run report to stdout after the diagnostics.
    #[arg(long)]
    json: bool,

    /// Disable the stage spinner.
    #[arg(long, env = "C99CONV_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "C99CONV_VERBOSE")]
    verbose: bool,

    /// Suppress all logs except errors.
    #[arg(short, long, env = "C99CONV_QUIET")]
    quiet: bool,

    /// C99 source file.
    input: PathBuf,

    /// Where to write the converted C89 file.
    output: PathBuf,

    /// Extra compiler flags after <OUTPUT>, passed through verbatim.
    #[arg(value_name = "EXTRA_FLAGS", allow_hyphen_values = true)]
    extra_flags: Vec<String>,
}

/// Split argv at the end of `<OUTPUT>`.
///
/// Everything after the second positional belongs to the compiler, even
/// tokens that look like our own options (`-v`, `-h`, `--json`), so clap
/// only ever sees the head. Options that take a value consume the next
/// token; `--` ends option parsing.
fn split_passthrough(argv: Vec<OsString>, value_options: &[String]) -> (Vec<OsString>, Vec<String>) {
    let mut iter = argv.into_iter();
    let mut head: Vec<OsString> = iter.next().into_iter().collect();
    let mut positionals = 0;
    let mut options_done = false;

    while positionals < 2 {
        let Some(arg) = iter.next() else { break };
        let text = arg.to_string_lossy();
        if options_done || text == "-" || !text.starts_with('-') {
            positionals += 1;
        } else if text == "--" {
            options_done = true;
        } else if value_options.iter().any(|o| *o == text) {
            head.push(arg);
            if let Some(value) = iter.next() {
                head.push(value);
            }
            continue;
        }
        head.push(arg);
    }

    let extra = iter.map(|a| a.to_string_lossy().into_owned()).collect();
    (head, extra)
}

/// `--long` and `-s` spellings of every option that takes a separate value.
fn value_options() -> Vec<String> {
    Cli::command()
        .get_arguments()
        .filter(|a| !a.is_positional() && a.get_action().takes_values())
        .flat_map(|a| {
            let long = a.get_long().map(|l| format!("--{l}"));
            let short = a.get_short().map(|c| format!("-{c}"));
            long.into_iter().chain(short)
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let (head, passthrough) = split_passthrough(std::env::args_os().collect(), &value_options());
    let cli = match Cli::try_parse_from(head) {
        Ok(mut cli) => {
            cli.extra_flags.extend(passthrough);
            cli
        }
        Err(e)
            if matches!(
                e.kind(),
                ErrorKind::MissingRequiredArgument
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) =>
        {
            println!("{USAGE}");
            exit_with(1);
        }
        Err(e) => e.exit(),
    };

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers stage progress; only problems need a log line.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.quiet || show_progress {
        "error"
    } else {
        "warn"
    };
    let filter = if cli.verbose { "debug" } else { filter };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let layout = build_layout(&cli)?;

    let reporter = CliReporter::new(&cli.input, show_progress);
    let config = build_config(&cli, layout, reporter.clone())?;
    let invocation =
        Invocation::new(&cli.input, &cli.output).with_extra_flags(cli.extra_flags.iter().cloned());

    // ── Run pipeline ─────────────────────────────────────────────────────
    // Diagnostics are printed by the reporter when preprocessing ends.
    let result = convert(&invocation, &config).await;
    // The callback clears the spinner on completion; an Err never gets there.
    reporter.clear();
    let outcome = result.with_context(|| format!("Failed to convert {}", cli.input.display()))?;

    if cli.json {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        let json = serde_json::to_string_pretty(&outcome).context("Failed to serialise report")?;
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
        handle.flush().context("Failed to write to stdout")?;
    }

    if outcome.exit_code != 0 {
        exit_with(outcome.exit_code);
    }
    Ok(())
}

/// Exit with `code` after flushing stdout.
fn exit_with(code: i32) -> ! {
    io::stdout().flush().ok();
    std::process::exit(code)
}

/// Resolve the project layout from flags, falling back to discovery.
fn build_layout(cli: &Cli) -> Result<ProjectLayout> {
    let mut layout = if let Some(ref root) = cli.project_root {
        ProjectLayout::new(absolute(root)?)
    } else {
        let mut starts = Vec::new();
        if let Some(dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            starts.push(dir);
        }
        starts.push(std::env::current_dir().context("Failed to read current directory")?);
        ProjectLayout::discover(&starts)?
    };

    if let Some(ref converter) = cli.converter {
        layout = layout.with_converter(absolute(converter)?);
    }
    if let Some(ref build_env) = cli.build_env {
        layout = layout.with_build_env(absolute(build_env)?);
    }
    Ok(layout)
}

/// Map CLI args to `PipelineConfig`.
fn build_config(
    cli: &Cli,
    layout: ProjectLayout,
    progress: ProgressCallback,
) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder(layout).progress_callback(progress);
    if let Some(ref cc) = cli.cc {
        builder = builder.compiler_command(cc);
    }
    builder.build().context("Invalid configuration")
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("Failed to resolve {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(args: &[&str]) -> (Vec<String>, Vec<String>) {
        let argv = args.iter().map(OsString::from).collect();
        let (head, extra) = split_passthrough(argv, &value_options());
        let head = head
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        (head, extra)
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn value_options_cover_path_and_compiler_flags() {
        let opts = value_options();
        for name in ["--project-root", "--converter", "--build-env", "--cc"] {
            assert!(opts.iter().any(|o| o == name), "missing {name}");
        }
        assert!(!opts.iter().any(|o| o == "--json" || o == "-v"));
    }

    #[test]
    fn own_flags_after_output_go_to_compiler() {
        let (head, extra) = split(&["c99conv", "-q", "in.c", "out.c", "-h", "-v", "--json", "-V"]);
        assert_eq!(head, ["c99conv", "-q", "in.c", "out.c"]);
        assert_eq!(extra, ["-h", "-v", "--json", "-V"]);
    }

    #[test]
    fn option_values_are_not_counted_as_positionals() {
        let (head, extra) = split(&[
            "c99conv",
            "--cc",
            "gomacc cl.exe",
            "--project-root=/src/ffmpeg",
            "in.c",
            "--converter",
            "conv.exe",
            "out.c",
            "-I",
            "gen",
        ]);
        assert_eq!(
            head,
            [
                "c99conv",
                "--cc",
                "gomacc cl.exe",
                "--project-root=/src/ffmpeg",
                "in.c",
                "--converter",
                "conv.exe",
                "out.c"
            ]
        );
        assert_eq!(extra, ["-I", "gen"]);
    }

    #[test]
    fn double_dash_allows_hyphenated_paths() {
        let (head, extra) = split(&["c99conv", "--", "-in.c", "out.c", "-DX"]);
        assert_eq!(head, ["c99conv", "--", "-in.c", "out.c"]);
        assert_eq!(extra, ["-DX"]);
    }

    #[test]
    fn help_before_positionals_still_reaches_clap() {
        let (head, extra) = split(&["c99conv", "-h"]);
        assert_eq!(head, ["c99conv", "-h"]);
        assert!(extra.is_empty());
    }

    #[test]
    fn parsed_head_plus_passthrough() {
        let (head, extra) = split(&["c99conv", "in.c", "out.c", "-v", "-DNDEBUG"]);
        let cli = Cli::try_parse_from(head.iter().map(String::as_str)).unwrap();
        assert!(!cli.verbose);
        assert!(cli.extra_flags.is_empty());
        assert_eq!(extra, ["-v", "-DNDEBUG"]);
    }
}
