//! Toolchain resolution: decide which compiler command runs the preprocessor.
//!
//! Precedence, most specific first:
//!
//! 1. An explicit override on [`PipelineConfig`] (`--cc` / `C99CONV_CC`).
//! 2. The `CC` entry of the build-environment file, which is how GOMA users
//!    route compiles through `gomacc`. `$CC` itself is useless here: GYP
//!    strips it from the environment it hands to actions.
//! 3. The default compiler (`cl.exe`).
//!
//! A build-environment file that exists but is malformed is an error, never
//! a silent fall-through to step 3.

use crate::config::PipelineConfig;
use crate::error::C99ConvError;
use crate::pipeline::build_env::load_build_env;
use tracing::{debug, info};

/// Where the resolved compiler command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerSource {
    Override,
    BuildEnv,
    Default,
}

/// An ordered, non-empty list of compiler command tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerCommand {
    tokens: Vec<String>,
    source: CompilerSource,
}

impl CompilerCommand {
    fn new(tokens: Vec<String>, source: CompilerSource, origin: &str) -> Result<Self, C99ConvError> {
        if tokens.is_empty() {
            return Err(C99ConvError::EmptyCompilerCommand {
                origin: origin.to_string(),
            });
        }
        Ok(Self { tokens, source })
    }

    /// Build a command from explicit tokens.
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self, C99ConvError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens = tokens.into_iter().map(Into::into).collect();
        Self::new(tokens, CompilerSource::Override, "compiler override")
    }

    /// The executable to launch.
    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    /// Fixed arguments that follow the executable.
    pub fn args(&self) -> &[String] {
        &self.tokens[1..]
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn source(&self) -> CompilerSource {
        self.source
    }

    pub fn into_tokens(self) -> Vec<String> {
        self.tokens
    }
}

/// Resolve the compiler command for `config`.
pub async fn resolve_compiler(config: &PipelineConfig) -> Result<CompilerCommand, C99ConvError> {
    if let Some(ref tokens) = config.compiler_override {
        debug!("Using compiler override: {:?}", tokens);
        return CompilerCommand::new(tokens.clone(), CompilerSource::Override, "compiler override");
    }

    let path = &config.layout.build_env;
    if let Some(env) = load_build_env(path).await? {
        if let Some(tokens) = env.compiler_command() {
            info!("Using CC from {}: {:?}", path.display(), tokens);
            let origin = format!("CC in {}", path.display());
            return CompilerCommand::new(tokens, CompilerSource::BuildEnv, &origin);
        }
        debug!("{} declares no CC", path.display());
    }

    debug!("Using default compiler: {:?}", config.default_compiler);
    CompilerCommand::new(
        config.default_compiler.clone(),
        CompilerSource::Default,
        "default compiler",
    )
}
