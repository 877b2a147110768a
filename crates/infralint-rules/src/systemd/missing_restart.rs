//! Rule to require a restart policy for services.
//!
//! # Rationale
//!
//! Without `Restart=` a crashed service stays down until someone notices.
//! `Type=oneshot` services are meant to exit and are exempt.

use infralint_core::model::SystemdUnit;
use infralint_core::{Check, Diagnostic, RuleContext, RuleDescriptor, Severity};

/// Rule id.
pub const ID: &str = "systemd-missing-restart";

/// Registration entry.
pub const RULE: RuleDescriptor = RuleDescriptor {
    id: ID,
    description: "`[Service]` sections should set `Restart=`",
    default_severity: Severity::Warning,
    options: &["require_restart"],
    check: Check::SystemdUnit(check),
};

fn check(model: &SystemdUnit, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let required = ctx
        .options
        .get_bool("require_restart", ctx.config.systemd.require_restart);
    if !required {
        return Vec::new();
    }

    let Some(service) = model.sections_named("Service").next() else {
        return Vec::new();
    };
    if model.value("Service", "Restart").is_some() || model.value("Service", "Type") == Some("oneshot") {
        return Vec::new();
    }

    vec![ctx.diagnostic(
        service.line,
        1,
        "`[Service]` section has no `Restart=` policy",
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{check, check_with};

    #[test]
    fn test_reports_missing_restart() {
        let diagnostics = check(
            RULE,
            "app.service",
            "[Unit]\nDescription=App\n\n[Service]\nExecStart=/usr/bin/app\n",
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 4);
    }

    #[test]
    fn test_restart_in_any_service_section() {
        let diagnostics = check(
            RULE,
            "app.service",
            "[Service]\nExecStart=/usr/bin/app\n[Install]\nWantedBy=multi-user.target\n[Service]\nRestart=on-failure\n",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_oneshot_and_non_services_are_exempt() {
        assert!(check(RULE, "job.service", "[Service]\nType=oneshot\nExecStart=/bin/true\n").is_empty());
        assert!(check(RULE, "nightly.timer", "[Timer]\nOnCalendar=daily\n").is_empty());
    }

    #[test]
    fn test_option_disables_rule() {
        let diagnostics = check_with(
            RULE,
            "app.service",
            "[Service]\nExecStart=/usr/bin/app\n",
            &[("systemd.require_restart", "false")],
        );
        assert!(diagnostics.is_empty());
    }
}
