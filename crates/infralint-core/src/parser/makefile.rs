//! Makefile parser.
//!
//! Recognizes rule headers, tab-prefixed recipes, `.PHONY`, variable
//! assignments, target-specific variables, `define` blocks and directives.
//! Everything else is reported.

use super::{first_column, join_continuations, Continuation, ParseIssue};
use crate::model::{Makefile, RecipeLine, Target, VariableRef};

const CONDITIONALS: &[&str] = &["ifeq", "ifneq", "ifdef", "ifndef", "else", "endif"];
const DIRECTIVES: &[&str] = &[
    "include", "-include", "sinclude", "vpath", "undefine", "unexport", "export", "override",
    "private",
];

/// Parses Makefile text.
#[must_use]
pub fn parse(text: &str) -> (Makefile, Vec<ParseIssue>) {
    let mut model = Makefile::default();
    let mut issues = Vec::new();
    // Indices into `model.targets` of the most recent rule header.
    let mut current: Vec<usize> = Vec::new();
    // Set after a `.PHONY:` header, whose recipe make ignores.
    let mut phony_recipe = false;
    let mut in_define = false;

    let logical = join_continuations(
        text,
        Continuation {
            escape: '\\',
            comment_prefixes: &[],
        },
    );

    for logical_line in logical {
        let full = logical_line.text.as_str();
        let line = logical_line.line;

        if in_define {
            if first_word(full.trim()) == "endef" {
                in_define = false;
            }
            continue;
        }

        // Tab-indented text outside a rule is ordinary makefile text, e.g.
        // an assignment inside a conditional.
        let (raw, indented) = match full.strip_prefix('\t') {
            Some(command) if !current.is_empty() => {
                let command = command.trim();
                if !command.is_empty() {
                    add_recipe_line(&mut model, &current, command, line);
                    scan_variable_refs(full, 1, line, &mut model.variable_refs);
                }
                continue;
            }
            Some(_) if phony_recipe => continue,
            Some(rest) => (rest, true),
            None => (full, false),
        };

        let code = strip_comment(raw);
        let trimmed = code.trim();
        if trimmed.is_empty() {
            continue;
        }

        let word = first_word(trimmed);
        if CONDITIONALS.contains(&word) {
            continue;
        }
        if word == "define" {
            in_define = true;
            current.clear();
            phony_recipe = false;
            continue;
        }
        if DIRECTIVES.contains(&word) {
            if first_word(trimmed[word.len()..].trim_start()) == "define" {
                in_define = true;
            }
            current.clear();
            phony_recipe = false;
            continue;
        }

        let column = first_column(code) + usize::from(indented);
        match classify(trimmed) {
            LineKind::Assignment | LineKind::TargetVariable => {
                current.clear();
                phony_recipe = false;
            }
            LineKind::Rule {
                names,
                double_colon,
                prerequisites,
                inline_recipe,
            } => {
                if code.starts_with(' ') && !current.is_empty() {
                    issues.push(space_indent_issue(line, column));
                    continue;
                }
                let names: Vec<&str> = names.split_whitespace().collect();
                if names.is_empty() {
                    issues.push(ParseIssue::new(line, column, "missing target name before `:`"));
                    current.clear();
                    phony_recipe = false;
                    continue;
                }

                let prerequisites: Vec<String> = prerequisites
                    .split_whitespace()
                    .filter(|p| *p != "|")
                    .map(String::from)
                    .collect();

                phony_recipe = names.contains(&".PHONY");
                if phony_recipe {
                    model.phony.extend(prerequisites.iter().cloned());
                }

                current.clear();
                for name in names.into_iter().filter(|n| *n != ".PHONY") {
                    current.push(model.targets.len());
                    model.targets.push(Target {
                        name: name.to_string(),
                        prerequisites: prerequisites.clone(),
                        recipe_lines: Vec::new(),
                        line,
                        double_colon,
                    });
                }

                if let Some(recipe) = inline_recipe {
                    let recipe_trimmed = recipe.trim();
                    if !recipe_trimmed.is_empty() {
                        add_recipe_line(&mut model, &current, recipe_trimmed, line);
                        let offset = recipe.as_ptr() as usize - full.as_ptr() as usize;
                        scan_variable_refs(
                            recipe,
                            column_of(full, offset),
                            line,
                            &mut model.variable_refs,
                        );
                    }
                }
            }
            LineKind::Unrecognized => {
                if trimmed.starts_with("$(") || trimmed.starts_with("${") {
                    // Top-level function expansion such as `$(eval ...)`.
                    continue;
                }
                if indented {
                    issues.push(ParseIssue::new(line, 1, "recipe line outside of any target"));
                } else if code.starts_with(' ') && !current.is_empty() {
                    issues.push(space_indent_issue(line, column));
                } else {
                    issues.push(ParseIssue::new(
                        line,
                        column,
                        "missing separator: expected `:` for a rule or `=` for an assignment",
                    ));
                }
            }
        }
    }

    (model, issues)
}

fn space_indent_issue(line: usize, column: usize) -> ParseIssue {
    ParseIssue::new(
        line,
        column,
        "recipe line is indented with spaces; recipes must start with a tab",
    )
}

fn add_recipe_line(model: &mut Makefile, current: &[usize], text: &str, line: usize) {
    for &idx in current {
        if let Some(target) = model.targets.get_mut(idx) {
            target.recipe_lines.push(RecipeLine {
                text: text.to_string(),
                line,
            });
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum LineKind<'a> {
    Assignment,
    TargetVariable,
    Rule {
        names: &'a str,
        double_colon: bool,
        prerequisites: &'a str,
        inline_recipe: Option<&'a str>,
    },
    Unrecognized,
}

fn classify(line: &str) -> LineKind<'_> {
    let Some((pos, sep)) = find_separator(line) else {
        return LineKind::Unrecognized;
    };

    if sep == '=' {
        let name_end = match line[..pos].chars().last() {
            Some('?' | '+' | '!') => pos - 1,
            _ => pos,
        };
        return if is_variable_name(&line[..name_end]) {
            LineKind::Assignment
        } else {
            LineKind::Unrecognized
        };
    }

    let after = &line[pos + 1..];
    if after.starts_with('=') || after.starts_with(":=") {
        return if is_variable_name(&line[..pos]) {
            LineKind::Assignment
        } else {
            LineKind::Unrecognized
        };
    }

    let (double_colon, rest) = match after.strip_prefix(':') {
        Some(rest) => (true, rest),
        None => (false, after),
    };
    let (deps, inline_recipe) = match rest.split_once(';') {
        Some((deps, recipe)) => (deps, Some(recipe)),
        None => (rest, None),
    };

    if is_target_variable(deps) {
        return LineKind::TargetVariable;
    }

    // Static pattern rule `targets: pattern: prereq-patterns`.
    let prerequisites = match find_separator(deps) {
        Some((p, ':')) => &deps[p + 1..],
        _ => deps,
    };

    LineKind::Rule {
        names: &line[..pos],
        double_colon,
        prerequisites,
        inline_recipe,
    }
}

fn is_target_variable(deps: &str) -> bool {
    let mut rest = deps.trim_start();
    loop {
        let word = first_word(rest);
        if matches!(word, "export" | "override" | "private") {
            rest = rest[word.len()..].trim_start();
        } else {
            break;
        }
    }
    match find_separator(rest) {
        Some((pos, '=')) => {
            let name_end = match rest[..pos].chars().last() {
                Some('?' | '+' | '!') => pos - 1,
                _ => pos,
            };
            is_variable_name(&rest[..name_end])
        }
        Some((pos, ':')) => {
            let after = &rest[pos + 1..];
            (after.starts_with('=') || after.starts_with(":="))
                && is_variable_name(&rest[..pos])
        }
        _ => false,
    }
}

/// First `:` or `=` outside `$(...)` / `${...}`.
fn find_separator(line: &str) -> Option<(usize, char)> {
    let mut depth = 0usize;
    let mut prev = '\0';
    for (idx, c) in line.char_indices() {
        match c {
            '(' | '{' if prev == '$' || depth > 0 => depth += 1,
            ')' | '}' if depth > 0 => depth -= 1,
            ':' | '=' if depth == 0 => return Some((idx, c)),
            _ => {}
        }
        prev = c;
    }
    None
}

fn is_variable_name(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && !name.contains(char::is_whitespace)
}

fn first_word(s: &str) -> &str {
    s.split_whitespace().next().unwrap_or("")
}

fn strip_comment(line: &str) -> &str {
    let mut prev = '\0';
    for (idx, c) in line.char_indices() {
        if c == '#' && prev != '\\' {
            return &line[..idx];
        }
        prev = c;
    }
    line
}

fn column_of(line: &str, byte_offset: usize) -> usize {
    line[..byte_offset].chars().count() + 1
}

/// Collects `$(NAME)` / `${NAME}` references in `text`.
///
/// `$$` escapes and function calls such as `$(shell ...)` are skipped.
/// `base_column` is the column of `text`'s first character.
fn scan_variable_refs(text: &str, base_column: usize, line: usize, out: &mut Vec<VariableRef>) {
    let chars: Vec<char> = text.chars().collect();
    let mut in_single = false;
    let mut in_double = false;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '$' => match chars.get(i + 1) {
                Some('$') => {
                    i += 2;
                    continue;
                }
                Some(&open @ ('(' | '{')) => {
                    let close = if open == '(' { ')' } else { '}' };
                    if let Some(len) = matching_close(&chars[i + 2..], open, close) {
                        let inner: String = chars[i + 2..i + 2 + len].iter().collect();
                        if let Some(name) = reference_name(&inner) {
                            out.push(VariableRef {
                                name,
                                quoted: in_single || in_double,
                                line,
                                column: base_column + i,
                            });
                        }
                        i += len + 3;
                        continue;
                    }
                }
                _ => {}
            },
            _ => {}
        }
        i += 1;
    }
}

fn matching_close(chars: &[char], open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, &c) in chars.iter().enumerate() {
        if c == open {
            depth += 1;
        } else if c == close {
            if depth == 0 {
                return Some(idx);
            }
            depth -= 1;
        }
    }
    None
}

/// Variable name of a reference body, `None` for function calls.
fn reference_name(inner: &str) -> Option<String> {
    if inner.is_empty() || inner.contains(char::is_whitespace) || inner.contains(',') {
        return None;
    }
    // Substitution reference `$(VAR:.c=.o)`.
    let name = inner.split(':').next().unwrap_or(inner);
    if name.is_empty() || name.contains('$') {
        return None;
    }
    Some(name.to_string())
}
