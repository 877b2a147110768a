//! Rule to validate crontab schedule fields.
//!
//! # Detected Patterns
//!
//! - values outside the field's range (`61 * * * *`)
//! - reversed ranges (`5-1`), zero or non-numeric steps (`*/0`)
//! - month names in the weekday field and vice versa
//!
//! Month names (`jan`..`dec`) and weekday names (`sun`..`sat`) are
//! accepted case-insensitively. Day-of-week allows both 0 and 7 for Sunday.

use infralint_core::model::{CronField, Crontab};
use infralint_core::parser::crontab::{DAY_NAMES, MONTH_NAMES};
use infralint_core::{Check, Diagnostic, RuleContext, RuleDescriptor, Severity};

/// Rule id.
pub const ID: &str = "crontab-invalid-field";

/// Registration entry.
pub const RULE: RuleDescriptor = RuleDescriptor {
    id: ID,
    description: "Schedule fields must be well-formed and in range",
    default_severity: Severity::Error,
    options: &[],
    check: Check::Crontab(check),
};

fn check(model: &Crontab, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for entry in model.entries.iter().filter(|e| !e.is_reboot()) {
        for (field, text) in entry.fields() {
            if let Err(reason) = validate(field, text) {
                diagnostics.push(ctx.diagnostic(
                    entry.line,
                    0,
                    format!("invalid {} field `{text}`: {reason}", field.name()),
                ));
            }
        }
    }

    diagnostics
}

fn validate(field: CronField, text: &str) -> Result<(), String> {
    if text.is_empty() {
        return Err("field is empty".to_string());
    }

    for item in text.split(',') {
        if item.is_empty() {
            return Err("empty list item".to_string());
        }

        let (range, step) = match item.split_once('/') {
            Some((range, step)) => (range, Some(step)),
            None => (item, None),
        };
        if let Some(step) = step {
            let n: u32 = step
                .parse()
                .map_err(|_| format!("step `{step}` is not a number"))?;
            if n == 0 {
                return Err("step must be greater than zero".to_string());
            }
        }

        if range == "*" {
            continue;
        }
        match range.split_once('-') {
            Some((low, high)) => {
                let (low, high) = (value(field, low)?, value(field, high)?);
                if low > high {
                    return Err(format!("range {low}-{high} is reversed"));
                }
            }
            None => {
                value(field, range)?;
            }
        }
    }

    Ok(())
}

fn value(field: CronField, token: &str) -> Result<u32, String> {
    let (low, high) = field.range();
    let n = match token.parse::<u32>() {
        Ok(n) => n,
        Err(_) => named_value(field, token).ok_or_else(|| format!("`{token}` is not a valid value"))?,
    };
    if n < low || n > high {
        return Err(format!("{n} is outside {low}-{high}"));
    }
    Ok(n)
}

fn named_value(field: CronField, token: &str) -> Option<u32> {
    let token = token.to_ascii_lowercase();
    let (names, first) = match field {
        CronField::Month => (MONTH_NAMES, 1),
        CronField::DayOfWeek => (DAY_NAMES, 0),
        _ => return None,
    };
    names
        .iter()
        .position(|n| *n == token)
        .and_then(|i| u32::try_from(i).ok())
        .map(|i| i + first)
}
