//! systemd unit parser.

use super::{first_column, join_continuations, Continuation, ParseIssue};
use crate::model::{Directive, Section, SystemdUnit};

/// Parses a systemd unit file.
#[must_use]
pub fn parse(text: &str) -> (SystemdUnit, Vec<ParseIssue>) {
    let mut model = SystemdUnit::default();
    let mut issues = Vec::new();

    let logical = join_continuations(
        text,
        Continuation {
            escape: '\\',
            comment_prefixes: &['#', ';'],
        },
    );

    for logical_line in logical {
        let trimmed = logical_line.text.trim();
        if trimmed.is_empty() || trimmed.starts_with(['#', ';']) {
            continue;
        }
        let line = logical_line.line;
        let column = first_column(&logical_line.text);

        if trimmed.starts_with('[') {
            match section_name(trimmed) {
                Some(name) => model.sections.push(Section {
                    name: name.to_string(),
                    line,
                    directives: Vec::new(),
                }),
                None => issues.push(ParseIssue::new(
                    line,
                    column,
                    format!("malformed section header `{trimmed}`"),
                )),
            }
            continue;
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            issues.push(ParseIssue::new(
                line,
                column,
                format!("expected `Key=Value`, found `{trimmed}`"),
            ));
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            issues.push(ParseIssue::new(line, column, "directive has an empty key"));
            continue;
        }

        let Some(section) = model.sections.last_mut() else {
            issues.push(ParseIssue::new(
                line,
                column,
                format!("directive `{key}` appears before any section header"),
            ));
            continue;
        };
        section.directives.push(Directive {
            key: key.to_string(),
            value: value.trim().to_string(),
            line,
        });
    }

    (model, issues)
}

fn section_name(header: &str) -> Option<&str> {
    let inner = header.strip_prefix('[')?.strip_suffix(']')?;
    if inner.is_empty() || inner.contains(['[', ']']) {
        None
    } else {
        Some(inner)
    }
}
