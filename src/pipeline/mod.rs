//! Pipeline stages for C99-to-C89 conversion.
//!
//! Each submodule implements one step. The stages themselves only know
//! how to run one external process each; [`crate::convert`] sequences them
//! and owns the failure policy.
//!
//! ## Data Flow
//!
//! ```text
//! toolchain ──▶ preprocess ──▶ converter
//! (CC lookup)   (cl.exe -P)    (c99conv.exe)
//!                   │               │
//!                   └─ intermediate ┘   removed on every exit path
//! ```
//!
//! 1. [`toolchain`]   : pick the compiler command (override, `CC` from
//!    [`build_env`], or `cl.exe`)
//! 2. [`preprocess`]  : run the compiler in preprocess-only mode into the
//!    [`intermediate`] file and filter its chatter
//! 3. [`converter`]   : hand the intermediate file to the converter
//! 4. [`process`]     : spawning, output capture and exit-code mapping
//!    shared by both stages

pub mod build_env;
pub mod converter;
pub mod intermediate;
pub mod preprocess;
pub mod process;
pub mod toolchain;
