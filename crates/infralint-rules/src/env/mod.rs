//! `.env` rules.

pub mod duplicate_key;
pub mod invalid_key;
pub mod malformed_spacing;
pub mod weak_value;
