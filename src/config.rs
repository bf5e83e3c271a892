//! Configuration types for the preprocess-and-convert pipeline.
//!
//! Two structs carry everything a run needs:
//!
//! * [`ProjectLayout`]: where things live on disk (project root, converter
//!   binary, build-environment file, include directories). Computed once at
//!   startup and threaded through the pipeline.
//! * [`PipelineConfig`]: the compiler flags and toolchain choices, built via
//!   [`PipelineConfigBuilder`]. Defaults reproduce the CFLAGS that the FFmpeg
//!   `config.mak` uses for MSVC builds.

use crate::error::C99ConvError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

// ── Layout constants ─────────────────────────────────────────────────────

/// Converter executable, relative to the project root.
pub const CONVERTER_RELATIVE_PATH: &str = "chromium/binaries/c99conv.exe";

/// Generated FFmpeg configuration headers, relative to the project root.
pub const CONFIG_INCLUDE_DIR: &str = "chromium/config";

/// Windows compatibility headers, relative to the project root.
pub const PLATFORM_INCLUDE_DIR: &str = "chromium/include/win";

/// Build-environment file name. Lives three levels above the project root.
pub const BUILD_ENV_FILE_NAME: &str = "chromium.gyp_env";

/// Compiler used when no distributed-build wrapper is configured.
pub const DEFAULT_COMPILER: &[&str] = &["cl.exe"];

/// Macro definitions required by the libavcodec/libavutil/libavformat sources.
pub const DEFAULT_MACRO_FLAGS: &[&str] = &[
    "-DCOMPILING_avcodec=1",
    "-DCOMPILING_avutil=1",
    "-DCOMPILING_avformat=1",
    "-D_USE_MATH_DEFINES",
    "-Dinline=__inline",
    "-Dstrtoll=_strtoi64",
    "-U__STRICT_ANSI__",
    "-D_ISOC99_SOURCE",
    "-D_LARGEFILE_SOURCE",
    "-DHAVE_AV_CONFIG_H",
    "-Dstrtod=avpriv_strtod",
    "-Dsnprintf=avpriv_snprintf",
    "-D_snprintf=avpriv_snprintf",
    "-Dvsnprintf=avpriv_vsnprintf",
];

/// Header force-included ahead of every translation unit.
pub const DEFAULT_FORCED_INCLUDE: &str = "stdlib.h";

/// C4005 (macro redefinition) fires on `av_restrict` in upstream headers.
pub const DEFAULT_DISABLED_WARNINGS: &[u32] = &[4005];

// ── ProjectLayout ────────────────────────────────────────────────────────

/// Filesystem layout of the FFmpeg checkout the pipeline operates in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    /// Project root. Working directory of both child processes.
    pub root: PathBuf,
    /// Path of the C99-to-C89 converter executable.
    pub converter: PathBuf,
    /// Path of the optional build-environment file.
    pub build_env: PathBuf,
    /// Extra include directories, relative to `root`.
    pub include_dirs: Vec<PathBuf>,
}

impl ProjectLayout {
    /// Layout with every path at its fixed location under `root`.
    ///
    /// `.` and `..` components in `root` are collapsed lexically first, so
    /// the build-environment file is found relative to the real directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = normalize_lexically(&root.into());
        Self {
            converter: root.join(CONVERTER_RELATIVE_PATH),
            build_env: build_env_path(&root),
            include_dirs: vec![
                PathBuf::from(CONFIG_INCLUDE_DIR),
                PathBuf::from(PLATFORM_INCLUDE_DIR),
            ],
            root,
        }
    }

    /// Find the project root by walking up from each of `starts` in turn.
    ///
    /// The first ancestor containing [`CONVERTER_RELATIVE_PATH`] wins.
    pub fn discover<P: AsRef<Path>>(starts: &[P]) -> Result<Self, C99ConvError> {
        for start in starts {
            for dir in start.as_ref().ancestors() {
                if dir.join(CONVERTER_RELATIVE_PATH).is_file() {
                    debug!("Discovered project root: {}", dir.display());
                    return Ok(Self::new(dir));
                }
            }
        }

        Err(C99ConvError::ProjectRootNotFound {
            marker: PathBuf::from(CONVERTER_RELATIVE_PATH),
            searched: starts.iter().map(|p| p.as_ref().to_path_buf()).collect(),
        })
    }

    /// Replace the converter path.
    pub fn with_converter(mut self, path: impl Into<PathBuf>) -> Self {
        self.converter = path.into();
        self
    }

    /// Replace the build-environment file path.
    pub fn with_build_env(mut self, path: impl Into<PathBuf>) -> Self {
        self.build_env = path.into();
        self
    }
}

/// `<root>/../../../chromium.gyp_env`, collapsed lexically.
fn build_env_path(root: &Path) -> PathBuf {
    let base = root.ancestors().take(4).last().unwrap_or(root);
    base.join(BUILD_ENV_FILE_NAME)
}

/// Drop `.` components and resolve `..` against the preceding component
/// without touching the filesystem. A `..` at the root stays at the root;
/// leading `..` of a relative path are kept.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ── PipelineConfig ───────────────────────────────────────────────────────

/// Configuration for a preprocess-and-convert run.
///
/// # Example
/// ```rust
/// use c99conv::{PipelineConfig, ProjectLayout};
///
/// let config = PipelineConfig::builder(ProjectLayout::new("/src/third_party/ffmpeg"))
///     .compiler_command("clang-cl.exe /nologo")
///     .build()
///     .unwrap();
/// assert_eq!(config.compiler_override.as_deref().unwrap()[0], "clang-cl.exe");
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Where the converter, include directories and build environment live.
    pub layout: ProjectLayout,

    /// Explicit compiler command. When set, the build-environment file is
    /// not consulted.
    pub compiler_override: Option<Vec<String>>,

    /// Compiler used when the build environment declares no `CC`.
    pub default_compiler: Vec<String>,

    /// `-D` / `-U` flags passed to the preprocessor, in order.
    pub macro_flags: Vec<String>,

    /// Header passed via `-FI`. None disables the forced include.
    pub forced_include: Option<String>,

    /// MSVC warning numbers passed as `-wd<N>`.
    pub disabled_warnings: Vec<u32>,

    /// Optional per-stage progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("layout", &self.layout)
            .field("compiler_override", &self.compiler_override)
            .field("default_compiler", &self.default_compiler)
            .field("macro_flags", &self.macro_flags)
            .field("forced_include", &self.forced_include)
            .field("disabled_warnings", &self.disabled_warnings)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn PipelineProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a builder with the stock FFmpeg/MSVC defaults.
    pub fn builder(layout: ProjectLayout) -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self {
                layout,
                compiler_override: None,
                default_compiler: to_strings(DEFAULT_COMPILER),
                macro_flags: to_strings(DEFAULT_MACRO_FLAGS),
                forced_include: Some(DEFAULT_FORCED_INCLUDE.to_string()),
                disabled_warnings: DEFAULT_DISABLED_WARNINGS.to_vec(),
                progress_callback: None,
            },
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Split a compiler command line on whitespace.
pub fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn compiler_override<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.compiler_override = Some(tokens.into_iter().map(Into::into).collect());
        self
    }

    /// Same as [`Self::compiler_override`], splitting `command` on whitespace.
    pub fn compiler_command(mut self, command: &str) -> Self {
        self.config.compiler_override = Some(split_command(command));
        self
    }

    pub fn default_compiler<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.default_compiler = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn macro_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.macro_flags = flags.into_iter().map(Into::into).collect();
        self
    }

    pub fn forced_include(mut self, header: Option<String>) -> Self {
        self.config.forced_include = header;
        self
    }

    pub fn disabled_warnings(mut self, codes: Vec<u32>) -> Self {
        self.config.disabled_warnings = codes;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, C99ConvError> {
        let c = &self.config;
        if matches!(c.compiler_override, Some(ref tokens) if tokens.is_empty()) {
            return Err(C99ConvError::EmptyCompilerCommand {
                origin: "compiler override".into(),
            });
        }
        if c.default_compiler.is_empty() {
            return Err(C99ConvError::EmptyCompilerCommand {
                origin: "default compiler".into(),
            });
        }
        Ok(self.config)
    }
}
