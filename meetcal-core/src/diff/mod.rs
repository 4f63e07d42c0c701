//! Calendar diff types and computation.

mod apply_plan;
mod diff_kind;
mod event_diff;

pub use apply_plan::{ApplyPlan, compute_plan};
pub use diff_kind::DiffKind;
pub use event_diff::{EventDiff, FieldChange};
