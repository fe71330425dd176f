//! # Task data model.
//!
//! - [`TaskId`] / [`TaskStatus`] - identity and lifecycle status
//! - [`TaskRecord`] - mutable record owned by the lifecycle manager
//! - [`TaskView`] - read-only projection handed to observers

mod record;
mod status;
mod view;

pub(crate) use record::TaskRecord;
pub use status::{TaskId, TaskStatus};
pub use view::TaskView;
