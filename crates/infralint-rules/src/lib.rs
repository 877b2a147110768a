//! # infralint-rules
//!
//! Built-in rules for infralint.
//!
//! Each rule lives in its own module and exposes an `ID` and a `RULE`
//! descriptor; [`BUILTIN_RULES`] lists them in evaluation order.
//!
//! ## Available Rules
//!
//! | Id | Default | Description |
//! |----|---------|-------------|
//! | `dockerfile-latest-tag` | warning | `FROM` uses `latest` or no tag |
//! | `dockerfile-missing-user` | warning | no `USER` instruction |
//! | `dockerfile-missing-healthcheck` | info | no `HEALTHCHECK` instruction |
//! | `dockerfile-root-user` | warning | final `USER` is root |
//! | `makefile-missing-phony` | info | command target missing from `.PHONY` |
//! | `makefile-duplicate-target` | error | target defined twice |
//! | `makefile-unquoted-rm-variable` | warning | `rm -r` on an unquoted variable |
//! | `env-weak-value` | error | weak, short or predictable secret |
//! | `env-duplicate-key` | error | key assigned twice |
//! | `env-malformed-spacing` | warning | whitespace around `=` |
//! | `env-invalid-key` | warning | key is not a portable variable name |
//! | `crontab-invalid-field` | error | schedule field out of range or malformed |
//! | `crontab-every-minute` | info | job runs every minute |
//! | `systemd-missing-restart` | warning | service without `Restart=` |
//! | `systemd-missing-description` | info | unit without `Description=` |
//!
//! ## Usage
//!
//! ```ignore
//! use infralint_core::Analyzer;
//!
//! let analyzer = Analyzer::builder()
//!     .registry(infralint_rules::builtin_registry()?)
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod crontab;
pub mod dockerfile;
pub mod env;
pub mod makefile;
pub mod systemd;

mod registry;

#[cfg(test)]
mod test_support;

pub use registry::{builtin_registry, BUILTIN_RULES};

/// Re-export core types for convenience.
pub use infralint_core::{Diagnostic, RuleDescriptor, Severity};
