//! Dockerfile parser.

use super::{first_column, join_continuations, Continuation, ParseIssue};
use crate::model::{Dockerfile, Instruction};

/// Instructions understood by the builder.
pub const KNOWN_INSTRUCTIONS: &[&str] = &[
    "ADD",
    "ARG",
    "CMD",
    "COPY",
    "ENTRYPOINT",
    "ENV",
    "EXPOSE",
    "FROM",
    "HEALTHCHECK",
    "LABEL",
    "MAINTAINER",
    "ONBUILD",
    "RUN",
    "SHELL",
    "STOPSIGNAL",
    "USER",
    "VOLUME",
    "WORKDIR",
];

/// Parses Dockerfile text.
///
/// `ARG` instructions and comments are not part of the model. A leading
/// `# escape=` directive switches the continuation character. Heredoc
/// bodies (`RUN <<EOF`) are appended to their instruction's arguments.
#[must_use]
pub fn parse(text: &str) -> (Dockerfile, Vec<ParseIssue>) {
    let mut issues = Vec::new();
    let escape = escape_directive(text, &mut issues);
    let mut model = Dockerfile::default();

    let logical = join_continuations(
        text,
        Continuation {
            escape,
            comment_prefixes: &['#'],
        },
    );

    let mut lines = logical.into_iter();
    while let Some(logical_line) = lines.next() {
        let trimmed = logical_line.text.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let column = first_column(&logical_line.text);
        let (word, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (trimmed, ""),
        };

        if !word.chars().all(|c| c.is_ascii_alphabetic()) {
            issues.push(ParseIssue::new(
                logical_line.line,
                column,
                format!("invalid instruction `{word}`"),
            ));
            continue;
        }

        let keyword = word.to_ascii_uppercase();
        if !KNOWN_INSTRUCTIONS.contains(&keyword.as_str()) {
            issues.push(ParseIssue::new(
                logical_line.line,
                column,
                format!("unknown instruction `{keyword}`"),
            ));
            continue;
        }
        if keyword == "ARG" {
            continue;
        }

        if rest.is_empty() {
            issues.push(ParseIssue::new(
                logical_line.line,
                column,
                format!("`{keyword}` requires at least one argument"),
            ));
        }

        let mut arguments = rest.to_string();
        for heredoc in heredocs(rest) {
            let mut terminated = false;
            for body in lines.by_ref() {
                if heredoc.ends_at(&body.text) {
                    terminated = true;
                    break;
                }
                arguments.push('\n');
                arguments.push_str(&body.text);
            }
            if !terminated {
                issues.push(ParseIssue::new(
                    logical_line.line,
                    column,
                    format!("heredoc `{}` is never terminated", heredoc.word),
                ));
            }
        }

        model.instructions.push(Instruction {
            keyword,
            arguments,
            line: logical_line.line,
            column,
        });
    }

    (model, issues)
}

/// A `<<WORD` or `<<-WORD` heredoc opener.
#[derive(Debug, PartialEq, Eq)]
struct Heredoc<'a> {
    word: &'a str,
    strip_tabs: bool,
}

impl Heredoc<'_> {
    fn ends_at(&self, line: &str) -> bool {
        let line = if self.strip_tabs {
            line.trim_start_matches('\t')
        } else {
            line
        };
        line.trim_end() == self.word
    }
}

/// Heredoc openers in `args`, in order. The word may be quoted; `<<<`
/// here-strings are not heredocs.
fn heredocs(args: &str) -> Vec<Heredoc<'_>> {
    let mut found = Vec::new();
    let mut rest = args;

    while let Some(pos) = rest.find("<<") {
        let mut tail = &rest[pos + 2..];
        if tail.starts_with('<') {
            rest = tail.trim_start_matches('<');
            continue;
        }
        let strip_tabs = tail.starts_with('-');
        if strip_tabs {
            tail = &tail[1..];
        }
        let quote = tail.chars().next().filter(|c| matches!(c, '\'' | '"'));
        if let Some(q) = quote {
            tail = &tail[1..];
            let end = word_end(tail);
            if end > 0 && tail[end..].starts_with(q) {
                found.push(Heredoc {
                    word: &tail[..end],
                    strip_tabs,
                });
                rest = &tail[end + 1..];
                continue;
            }
        } else {
            let end = word_end(tail);
            if end > 0 {
                found.push(Heredoc {
                    word: &tail[..end],
                    strip_tabs,
                });
            }
            rest = &tail[end..];
            continue;
        }
        rest = tail;
    }

    found
}

fn word_end(s: &str) -> usize {
    s.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(s.len())
}

/// Reads parser directives at the top of the file and returns the escape
/// character. Directives stop at the first line that is not one.
fn escape_directive(text: &str, issues: &mut Vec<ParseIssue>) -> char {
    let mut escape = '\\';

    for (idx, line) in text.lines().enumerate() {
        let Some(body) = line.trim().strip_prefix('#') else {
            break;
        };
        let Some((key, value)) = body.split_once('=') else {
            break;
        };
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() || key.contains(char::is_whitespace) {
            break;
        }
        if key == "escape" {
            match value.trim() {
                "\\" => escape = '\\',
                "`" => escape = '`',
                other => issues.push(ParseIssue::new(
                    idx + 1,
                    1,
                    format!("invalid escape character `{other}`; expected `\\` or a backtick"),
                )),
            }
        }
    }

    escape
}
