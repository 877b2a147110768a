//! Crontab parser.

use super::ParseIssue;
use crate::model::{CronEntry, CronEnv, Crontab};

/// System accounts accepted in the user column of system crontabs.
pub const KNOWN_USERS: &[&str] = &[
    "root", "nobody", "daemon", "bin", "sys", "www-data", "postgres", "mysql", "redis", "nginx",
    "apache", "backup", "mail", "news", "operator", "ubuntu", "admin", "deploy", "jenkins",
];

/// Schedule nicknames and the five fields they expand to. `@reboot` has none.
const NICKNAMES: &[(&str, Option<[&str; 5]>)] = &[
    ("@reboot", None),
    ("@yearly", Some(["0", "0", "1", "1", "*"])),
    ("@annually", Some(["0", "0", "1", "1", "*"])),
    ("@monthly", Some(["0", "0", "1", "*", "*"])),
    ("@weekly", Some(["0", "0", "*", "*", "0"])),
    ("@daily", Some(["0", "0", "*", "*", "*"])),
    ("@midnight", Some(["0", "0", "*", "*", "*"])),
    ("@hourly", Some(["0", "*", "*", "*", "*"])),
];

/// Month names usable in the month field.
pub const MONTH_NAMES: &[&str] = &[
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Day names usable in the day-of-week field.
pub const DAY_NAMES: &[&str] = &["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

/// Parses crontab text.
#[must_use]
pub fn parse(text: &str) -> (Crontab, Vec<ParseIssue>) {
    let mut model = Crontab::default();
    let mut issues = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let column = super::first_column(raw);

        if is_environment_line(trimmed) {
            if let Some((key, value)) = trimmed.split_once('=') {
                model.environment.push(CronEnv {
                    key: key.trim().to_string(),
                    value: value.trim().to_string(),
                    line,
                });
            }
            continue;
        }

        if trimmed.starts_with('@') {
            let (nickname, rest) = split_token(trimmed);
            let Some((_, expansion)) = NICKNAMES.iter().find(|(n, _)| *n == nickname) else {
                issues.push(ParseIssue::new(
                    line,
                    column,
                    format!("unknown schedule nickname `{nickname}`"),
                ));
                continue;
            };
            let fields = expansion.unwrap_or(["", "", "", "", ""]);
            match entry(fields, rest, Some(nickname), line) {
                Some(e) => model.entries.push(e),
                None => issues.push(missing_command(line, column)),
            }
            continue;
        }

        let mut fields = [""; 5];
        let mut rest = trimmed;
        let mut found = 0;
        while found < 5 {
            let (token, after) = split_token(rest);
            if token.is_empty() || !is_schedule_token(token) {
                break;
            }
            fields[found] = token;
            found += 1;
            rest = after;
        }

        // Seconds or year columns from other schedulers: a purely numeric or
        // starred token right after the fifth field.
        let mut after = rest;
        loop {
            let (token, next) = split_token(after);
            if token.is_empty() || !is_numeric_field(token) {
                break;
            }
            found += 1;
            after = next;
        }

        if found != 5 {
            issues.push(ParseIssue::new(
                line,
                column,
                format!("expected five schedule fields, found {found}"),
            ));
            continue;
        }

        match entry(fields, rest, None, line) {
            Some(e) => model.entries.push(e),
            None => issues.push(missing_command(line, column)),
        }
    }

    (model, issues)
}

fn missing_command(line: usize, column: usize) -> ParseIssue {
    ParseIssue::new(line, column, "schedule has no command")
}

fn entry(fields: [&str; 5], rest: &str, nickname: Option<&str>, line: usize) -> Option<CronEntry> {
    let (first, after_first) = split_token(rest);
    let (run_as_user, command) = if KNOWN_USERS.contains(&first) && !after_first.is_empty() {
        (Some(first.to_string()), after_first)
    } else {
        (None, rest)
    };

    let command = command.trim();
    if command.is_empty() {
        return None;
    }

    let [minute, hour, day_of_month, month, day_of_week] = fields;
    Some(CronEntry {
        minute: minute.to_string(),
        hour: hour.to_string(),
        day_of_month: day_of_month.to_string(),
        month: month.to_string(),
        day_of_week: day_of_week.to_string(),
        command: command.to_string(),
        run_as_user,
        nickname: nickname.map(String::from),
        line,
    })
}

/// Splits off the first whitespace-delimited token; the remainder keeps
/// its inner spacing.
fn split_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(end) => (&s[..end], s[end..].trim_start()),
        None => (s, ""),
    }
}

/// True for `NAME=value` lines.
#[must_use]
pub fn is_environment_line(line: &str) -> bool {
    let Some((key, _)) = line.split_once('=') else {
        return false;
    };
    let key = key.trim();
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// True if `line` reads like a schedule entry: a known `@nickname` or five
/// schedule fields, each followed by a command.
#[must_use]
pub fn looks_like_schedule_line(line: &str) -> bool {
    if line.starts_with('@') {
        let (nickname, rest) = split_token(line);
        return NICKNAMES.iter().any(|(n, _)| *n == nickname) && !rest.is_empty();
    }
    let tokens: Vec<&str> = line.split_whitespace().take(6).collect();
    tokens.len() == 6 && tokens[..5].iter().all(|t| is_schedule_token(t))
}

/// True if `token` is made only of numbers, `*`, `,-/` and month or day
/// names.
#[must_use]
pub fn is_schedule_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .split([',', '-', '/'])
            .all(|piece| piece == "*" || is_number(piece) || is_name(piece))
}

fn is_numeric_field(token: &str) -> bool {
    token
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '*' | ',' | '-' | '/'))
        && is_schedule_token(token)
}

fn is_number(piece: &str) -> bool {
    !piece.is_empty() && piece.chars().all(|c| c.is_ascii_digit())
}

fn is_name(piece: &str) -> bool {
    let lower = piece.to_ascii_lowercase();
    MONTH_NAMES.contains(&lower.as_str()) || DAY_NAMES.contains(&lower.as_str())
}
