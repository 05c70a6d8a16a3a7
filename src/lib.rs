//! Attendance projection and safe-skip planning.
//!
//! The [`engine`] and [`planner`] modules are pure functions over
//! caller-owned [`models::SubjectRecord`]s. The remaining modules cover what a
//! front end around them needs: a weekly timetable, day-level calendar marks,
//! CSV input, summaries and a markdown report.

pub mod calendar;
pub mod config;
pub mod engine;
pub mod error;
pub mod import;
pub mod models;
pub mod planner;
pub mod report;
pub mod timetable;

pub use error::{AttendanceError, Result};
pub use models::{
    Outcome, Recommendation, SafetyReason, SkipPlan, SkipVerdict, Slot, SubjectId, SubjectRecord,
};
