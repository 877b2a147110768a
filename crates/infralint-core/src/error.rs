//! Run-level errors.

use miette::Diagnostic;
use thiserror::Error;

/// An error that aborts the whole run before any file is evaluated.
#[derive(Debug, Error, Diagnostic)]
pub enum FatalRunError {
    /// Two registered rules share an id.
    #[error("rule id `{id}` is registered more than once")]
    #[diagnostic(
        code(infralint::registry::duplicate_id),
        help("every rule descriptor needs a unique kebab-case id")
    )]
    DuplicateRuleId {
        /// The offending id.
        id: String,
    },

    /// A rule descriptor carries an unusable default.
    #[error("rule `{rule_id}` has an invalid default: {message}")]
    #[diagnostic(code(infralint::registry::invalid_default))]
    InvalidDefault {
        /// Rule whose descriptor is broken.
        rule_id: String,
        /// What is wrong with it.
        message: String,
    },

    /// A built-in option default failed validation.
    #[error("invalid built-in option `{section}.{key}`: {message}")]
    #[diagnostic(code(infralint::config::invalid_default))]
    InvalidOptionDefault {
        /// Config section of the option.
        section: String,
        /// Option key.
        key: String,
        /// Validation failure.
        message: String,
    },
}
