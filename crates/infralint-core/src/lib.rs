//! # infralint-core
//!
//! Core engine for linting infrastructure configuration files.
//!
//! This crate provides the pieces every rule and front end builds on:
//!
//! - [`FileType`] detection from file names and content
//! - [`parser`] turning Dockerfiles, Makefiles, `.env` files, crontabs and
//!   systemd units into position-tagged [`ParsedModel`]s
//! - [`Registry`] of value-typed [`RuleDescriptor`]s
//! - [`resolve()`] merging defaults, the user [`Config`] and per-run
//!   [`Overrides`]
//! - [`Analyzer`] for running the rules over many files concurrently
//! - [`LintResult`] with sorted [`Diagnostic`]s and an exit status
//!
//! ## Example
//!
//! ```ignore
//! use infralint_core::{Analyzer, Overrides, resolve};
//!
//! let registry = infralint_rules::builtin_registry()?;
//! let resolution = resolve(&registry, None, &Overrides::default())?;
//! let analyzer = Analyzer::builder()
//!     .registry(registry)
//!     .resolution(resolution)
//!     .build()?;
//!
//! let result = analyzer.analyze(&["Dockerfile".into()]).await;
//! std::process::exit(result.exit_code());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod aggregate;
mod analyzer;
mod config;
mod context;
mod engine;
mod error;
mod file_type;
mod rule;
mod types;

pub mod discover;
pub mod loader;
pub mod model;
pub mod parser;
pub mod resolve;

pub use aggregate::{aggregate, FileOutcome};
pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError};
pub use config::{
    AnalyzerConfig, Config, ConfigError, DockerfileOptions, EnvOptions, MakefileOptions,
    OptionError, Options, ResolvedConfig, RuleConfig, RuleSetting, SystemdOptions,
    DEFAULT_WEAK_VALUES,
};
pub use context::{RuleContext, SourceFile};
pub use engine::{check_source, evaluate};
pub use error::FatalRunError;
pub use file_type::FileType;
pub use model::ParsedModel;
pub use resolve::{resolve, Overrides, Resolution};
pub use rule::{
    Check, CrontabCheck, DockerfileCheck, EnvCheck, MakefileCheck, Registry, RuleDescriptor,
    SystemdCheck,
};
pub use types::{
    Diagnostic, LintResult, RunStatus, Severity, SeverityCounts, CONFIG_WARNING, INTERNAL_ERROR,
    LOAD_ERROR, PARSE_ERROR, TIMEOUT,
};
