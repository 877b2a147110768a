//! Rule to forbid floating `latest` base images.
//!
//! # Rationale
//!
//! `FROM image` and `FROM image:latest` resolve to whatever was pushed
//! last, so two builds of the same Dockerfile can produce different images.
//!
//! # Detected Patterns
//!
//! - `FROM ubuntu:latest`
//! - `FROM ubuntu` (no tag, implied `latest`)
//!
//! # Exempt
//!
//! `scratch`, pinned digests (`image@sha256:...`), references built from
//! build arguments (`FROM $BASE`) and earlier stage aliases.

use infralint_core::model::Dockerfile;
use infralint_core::{Check, Diagnostic, RuleContext, RuleDescriptor, Severity};

/// Rule id.
pub const ID: &str = "dockerfile-latest-tag";

/// Registration entry.
pub const RULE: RuleDescriptor = RuleDescriptor {
    id: ID,
    description: "Base images must be pinned to a tag other than `latest`",
    default_severity: Severity::Warning,
    options: &["allow_latest_tag"],
    check: Check::Dockerfile(check),
};

fn check(model: &Dockerfile, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let allowed = ctx
        .options
        .get_bool("allow_latest_tag", ctx.config.dockerfile.allow_latest_tag);
    if allowed {
        return Vec::new();
    }

    let mut stages: Vec<String> = Vec::new();
    let mut diagnostics = Vec::new();

    for from in model.instructions_named("FROM") {
        let Some(image) = from.image() else {
            continue;
        };

        let exempt = image.name.eq_ignore_ascii_case("scratch")
            || image.digest.is_some()
            || image.is_variable()
            || stages.contains(&image.name.to_ascii_lowercase());

        if !exempt {
            match image.tag.as_deref() {
                None => diagnostics.push(ctx.diagnostic(
                    from.line,
                    from.column,
                    format!("image `{}` has no tag and defaults to `latest`", image.name),
                )),
                Some(tag) if tag.eq_ignore_ascii_case("latest") => {
                    diagnostics.push(ctx.diagnostic(
                        from.line,
                        from.column,
                        format!("image `{}:{tag}` uses the floating `latest` tag", image.name),
                    ));
                }
                Some(_) => {}
            }
        }

        if let Some(alias) = image.alias {
            stages.push(alias.to_ascii_lowercase());
        }
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{check, check_with, lines};

    #[test]
    fn test_detects_latest_and_untagged() {
        let diagnostics = check(
            RULE,
            "Dockerfile",
            "FROM ubuntu:latest\nRUN true\nFROM --platform=linux/amd64 alpine\n",
        );
        assert_eq!(lines(&diagnostics), vec![1, 3]);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].column, 1);
        assert!(diagnostics[1].message.contains("no tag"));
    }

    #[test]
    fn test_allows_pinned_images() {
        let diagnostics = check(
            RULE,
            "Dockerfile",
            "FROM ubuntu:22.04\n\
             FROM registry.local:5000/app:1.2\n\
             FROM node@sha256:abc\n\
             FROM scratch\n\
             ARG BASE=debian\n\
             FROM ${BASE}\n",
        );
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn test_registry_port_is_not_a_tag() {
        let diagnostics = check(RULE, "Dockerfile", "FROM registry.local:5000/app\n");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("registry.local:5000/app"));
    }

    #[test]
    fn test_stage_aliases_are_exempt() {
        let diagnostics = check(
            RULE,
            "Dockerfile",
            "FROM golang:1.22 AS build\nRUN go build\nFROM build\n",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_option_disables_rule() {
        let diagnostics = check_with(
            RULE,
            "Dockerfile",
            "FROM ubuntu\n",
            &[("dockerfile.allow_latest_tag", "true")],
        );
        assert!(diagnostics.is_empty());
    }
}
