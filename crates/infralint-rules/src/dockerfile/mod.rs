//! Dockerfile rules.

pub mod latest_tag;
pub mod missing_healthcheck;
pub mod missing_user;
pub mod root_user;

use infralint_core::model::Dockerfile;

/// Line that findings about the whole image are reported on: the final
/// `FROM`, or the first instruction when there is none.
pub(crate) fn anchor_line(model: &Dockerfile) -> usize {
    model
        .last_from()
        .or_else(|| model.instructions.first())
        .map_or(1, |i| i.line)
}
