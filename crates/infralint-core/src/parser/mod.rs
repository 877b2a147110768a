//! Format parsers.
//!
//! Every parser is total: it always returns a model, and structurally
//! invalid lines become [`ParseIssue`]s that the evaluator turns into
//! `parse-error` diagnostics.

pub mod crontab;
pub mod dockerfile;
pub mod env;
pub mod makefile;
pub mod systemd;

use serde::{Deserialize, Serialize};

use crate::file_type::FileType;
use crate::model::ParsedModel;

/// A structural problem found while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseIssue {
    /// Physical line (1-based).
    pub line: usize,
    /// Column (1-based, 0 when not applicable).
    pub column: usize,
    /// Description of the problem.
    pub message: String,
}

impl ParseIssue {
    /// Creates a new issue.
    #[must_use]
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// A parsed model together with the issues found while building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutput {
    /// The (possibly partial) model.
    pub model: ParsedModel,
    /// Issues in source order.
    pub issues: Vec<ParseIssue>,
}

/// Parses `text` as `file_type`. Returns `None` for [`FileType::Unknown`].
#[must_use]
pub fn parse(file_type: FileType, text: &str) -> Option<ParseOutput> {
    let (model, issues) = match file_type {
        FileType::Dockerfile => {
            let (m, i) = dockerfile::parse(text);
            (ParsedModel::Dockerfile(m), i)
        }
        FileType::Makefile => {
            let (m, i) = makefile::parse(text);
            (ParsedModel::Makefile(m), i)
        }
        FileType::Env => {
            let (m, i) = env::parse(text);
            (ParsedModel::Env(m), i)
        }
        FileType::Crontab => {
            let (m, i) = crontab::parse(text);
            (ParsedModel::Crontab(m), i)
        }
        FileType::SystemdUnit => {
            let (m, i) = systemd::parse(text);
            (ParsedModel::SystemdUnit(m), i)
        }
        FileType::Unknown => return None,
    };
    Some(ParseOutput { model, issues })
}

/// A logical line assembled from one or more physical lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LogicalLine {
    /// Joined text. The first physical line keeps its leading whitespace.
    pub text: String,
    /// First physical line (1-based).
    pub line: usize,
}

/// How continuation lines are joined.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Continuation<'a> {
    /// Trailing character that continues a line.
    pub escape: char,
    /// Line prefixes marking comments. Comments never continue, and inside a
    /// continuation they are dropped. Blank lines are dropped as well when
    /// this is non-empty.
    pub comment_prefixes: &'a [char],
}

/// Joins continuation lines.
///
/// A physical line whose trimmed end is `escape` continues onto the next
/// one; the escape is removed and the pieces are joined with one space.
/// A trailing escape at end of input just ends the line.
pub(crate) fn join_continuations(text: &str, rules: Continuation<'_>) -> Vec<LogicalLine> {
    let mut out = Vec::new();
    let mut current: Option<LogicalLine> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;

        let piece = if current.is_none() {
            if !rules.comment_prefixes.is_empty()
                && raw.trim_start().starts_with(rules.comment_prefixes)
            {
                out.push(LogicalLine {
                    text: raw.to_string(),
                    line: line_no,
                });
                continue;
            }
            raw
        } else {
            let trimmed = raw.trim_start();
            let blank = trimmed.is_empty();
            if !rules.comment_prefixes.is_empty()
                && (blank || trimmed.starts_with(rules.comment_prefixes))
            {
                continue;
            }
            if blank {
                if let Some(done) = current.take() {
                    out.push(done);
                }
                out.push(LogicalLine {
                    text: String::new(),
                    line: line_no,
                });
                continue;
            }
            trimmed
        };

        let body = piece.trim_end();
        let (body, continues) = match body.strip_suffix(rules.escape) {
            Some(stripped) => (stripped, true),
            None => (piece, false),
        };

        match current.as_mut() {
            Some(open) => {
                if !open.text.is_empty() && !open.text.ends_with(char::is_whitespace) {
                    open.text.push(' ');
                }
                open.text.push_str(body);
            }
            None => {
                current = Some(LogicalLine {
                    text: body.to_string(),
                    line: line_no,
                });
            }
        }

        if !continues {
            if let Some(done) = current.take() {
                out.push(done);
            }
        }
    }

    if let Some(done) = current {
        out.push(done);
    }
    out
}

/// 1-based column of the first non-whitespace character of `line`.
pub(crate) fn first_column(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCKER: Continuation<'static> = Continuation {
        escape: '\\',
        comment_prefixes: &['#'],
    };
    const MAKE: Continuation<'static> = Continuation {
        escape: '\\',
        comment_prefixes: &[],
    };

    #[test]
    fn joins_continuations_and_keeps_first_line() {
        let text = "RUN apt-get update \\\n    && apt-get install -y curl\nUSER app\n";
        let lines = join_continuations(text, DOCKER);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "RUN apt-get update && apt-get install -y curl");
        assert_eq!(lines[0].line, 1);
        assert_eq!(lines[1].text, "USER app");
        assert_eq!(lines[1].line, 3);
    }

    #[test]
    fn drops_comments_inside_continuation() {
        let text = "RUN a \\\n# note\n\n    b\n";
        let lines = join_continuations(text, DOCKER);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "RUN a b");
    }

    #[test]
    fn blank_line_ends_continuation_without_comment_rules() {
        let text = "VAR = a \\\n\nall:\n";
        let lines = join_continuations(text, MAKE);
        assert_eq!(lines[0].text, "VAR = a ");
        assert_eq!(lines[0].line, 1);
        assert_eq!(lines[1].line, 2);
        assert_eq!(lines[2].text, "all:");
        assert_eq!(lines[2].line, 3);
    }

    #[test]
    fn dangling_escape_at_eof() {
        let lines = join_continuations("RUN echo \\", DOCKER);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "RUN echo ");
    }

    #[test]
    fn keeps_leading_whitespace_of_first_line() {
        let lines = join_continuations("\techo a \\\n\t  b\n", MAKE);
        assert_eq!(lines[0].text, "\techo a b");
    }

    #[test]
    fn first_column_counts_indent() {
        assert_eq!(first_column("FROM x"), 1);
        assert_eq!(first_column("   FROM x"), 4);
    }

    #[test]
    fn unknown_type_is_not_parsed() {
        assert!(parse(FileType::Unknown, "anything").is_none());
        let out = parse(FileType::Env, "A=1\n").unwrap();
        assert_eq!(out.model.file_type(), FileType::Env);
    }
}
