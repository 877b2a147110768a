//! Makefile rules.

pub mod duplicate_target;
pub mod missing_phony;
pub mod unquoted_rm_variable;
