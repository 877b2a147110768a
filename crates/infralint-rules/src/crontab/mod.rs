//! Crontab rules.

pub mod every_minute;
pub mod invalid_field;
