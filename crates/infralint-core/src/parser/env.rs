//! `.env` parser.

use super::ParseIssue;
use crate::model::{Assignment, EnvFile, Quote};

/// Parses dotenv text.
///
/// Raw key and value text are kept verbatim so spacing problems stay
/// visible to rules. Blank and comment lines produce nothing.
#[must_use]
pub fn parse(text: &str) -> (EnvFile, Vec<ParseIssue>) {
    let mut model = EnvFile::default();
    let mut issues = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut offset = line.len() - line.trim_start().len();
        let mut rest = &line[offset..];
        let mut exported = false;
        if let Some(after) = rest.strip_prefix("export") {
            if after.starts_with(char::is_whitespace) {
                let skipped = rest.len() - after.trim_start().len();
                offset += skipped;
                rest = &rest[skipped..];
                exported = true;
            }
        }

        let column = line[..offset].chars().count() + 1;
        let Some((raw_key, raw_value)) = rest.split_once('=') else {
            issues.push(ParseIssue::new(
                line_no,
                column,
                format!("expected `KEY=VALUE`, found `{}`", rest.trim()),
            ));
            continue;
        };

        let key = raw_key.trim();
        if key.is_empty() {
            issues.push(ParseIssue::new(line_no, column, "assignment has an empty key"));
            continue;
        }

        let (value, quoted, terminated) = unquote(raw_value);
        if !terminated {
            issues.push(ParseIssue::new(
                line_no,
                column,
                format!("unterminated quoted value for `{key}`"),
            ));
        }

        model.assignments.push(Assignment {
            key: key.to_string(),
            raw_key: raw_key.to_string(),
            raw_value: raw_value.to_string(),
            value,
            quoted,
            line: line_no,
            column,
            exported,
        });
    }

    (model, issues)
}

/// Returns the inner value, its quote style, and whether a closing quote
/// was found. Unquoted values lose a trailing ` # comment`.
fn unquote(raw_value: &str) -> (String, Option<Quote>, bool) {
    let value = raw_value.trim_start();
    let quote = match value.chars().next() {
        Some('"') => Quote::Double,
        Some('\'') => Quote::Single,
        _ => return (strip_inline_comment(value).trim().to_string(), None, true),
    };

    let delimiter = if quote == Quote::Double { '"' } else { '\'' };
    let body = &value[1..];
    let mut escaped = false;
    for (idx, c) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' && quote == Quote::Double {
            escaped = true;
        } else if c == delimiter {
            return (body[..idx].to_string(), Some(quote), true);
        }
    }

    (body.trim_end().to_string(), Some(quote), false)
}

fn strip_inline_comment(value: &str) -> &str {
    let mut prev_space = false;
    for (idx, c) in value.char_indices() {
        if c == '#' && prev_space {
            return &value[..idx];
        }
        prev_space = c.is_whitespace();
    }
    value
}
