//! The built-in registration table.

use infralint_core::{FatalRunError, Registry, RuleDescriptor};

use crate::{crontab, dockerfile, env, makefile, systemd};

/// Every built-in rule, in evaluation order.
///
/// Adding a rule means adding its `RULE` here; nothing else changes.
pub static BUILTIN_RULES: &[RuleDescriptor] = &[
    dockerfile::latest_tag::RULE,
    dockerfile::missing_user::RULE,
    dockerfile::missing_healthcheck::RULE,
    dockerfile::root_user::RULE,
    makefile::missing_phony::RULE,
    makefile::duplicate_target::RULE,
    makefile::unquoted_rm_variable::RULE,
    env::weak_value::RULE,
    env::duplicate_key::RULE,
    env::malformed_spacing::RULE,
    env::invalid_key::RULE,
    crontab::invalid_field::RULE,
    crontab::every_minute::RULE,
    systemd::missing_restart::RULE,
    systemd::missing_description::RULE,
];

/// Builds the registry of built-in rules.
///
/// # Errors
///
/// Returns an error if the table contains a duplicate or malformed id.
pub fn builtin_registry() -> Result<Registry, FatalRunError> {
    Registry::new(BUILTIN_RULES.iter().copied())
}
