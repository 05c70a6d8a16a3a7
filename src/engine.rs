//! Attendance arithmetic over caller-owned [`SubjectRecord`]s.
//!
//! Every function here is pure. Percentages are returned unrounded; callers
//! format them for display.

use crate::error::{AttendanceError, Result};
use crate::models::{SafetyReason, SkipVerdict, SubjectRecord};

/// `100 * attended / total`.
pub fn current_percentage(record: &SubjectRecord) -> Result<f64> {
    projected_percentage(record, 0)
}

/// Percentage after `additional_misses` more classes are held and not attended.
pub fn projected_percentage(record: &SubjectRecord, additional_misses: u32) -> Result<f64> {
    let held = held_after(record, additional_misses);
    if held == 0 {
        return Err(undefined(record));
    }
    Ok(100.0 * record.attended() as f64 / held as f64)
}

pub fn is_safe_to_skip(record: &SubjectRecord, additional_misses: u32) -> Result<SkipVerdict> {
    if record.total() == 0 {
        return Err(undefined(record));
    }

    let required = record.required_percentage();
    let attended = record.attended() as u64;

    if !meets_threshold(attended, record.total() as u64, required) {
        return Ok(SkipVerdict {
            safe: false,
            reason: SafetyReason::AlreadyBelowMinimum,
        });
    }

    if meets_threshold(attended, held_after(record, additional_misses), required) {
        Ok(SkipVerdict {
            safe: true,
            reason: SafetyReason::SafeToSkip,
        })
    } else {
        Ok(SkipVerdict {
            safe: false,
            reason: SafetyReason::WouldDropBelowMinimum,
        })
    }
}

/// Smallest number of consecutive attended classes that brings the subject
/// back to its threshold. Zero when it is already compliant.
///
/// The count is bounded by what a `u32` class counter can still hold; a
/// threshold that needs more classes than that is reported as unreachable.
pub fn classes_needed_to_reach_threshold(record: &SubjectRecord) -> Result<u32> {
    if record.total() == 0 {
        return Err(undefined(record));
    }

    let required = record.required_percentage();
    let attended = record.attended() as u64;
    let total = record.total() as u64;
    let reaches = |extra: u64| meets_threshold(attended + extra, total + extra, required);

    if reaches(0) {
        return Ok(0);
    }

    let limit = (u32::MAX - record.total()) as u64;
    if required >= 100.0 || !reaches(limit) {
        return Err(AttendanceError::ThresholdUnreachable {
            id: record.id().clone(),
            required,
        });
    }

    let estimate = (required * total as f64 - 100.0 * attended as f64) / (100.0 - required);
    let guess = if estimate.is_finite() {
        (estimate.ceil().max(1.0) as u64).min(limit)
    } else {
        limit
    };
    if reaches(guess) && !reaches(guess - 1) {
        return Ok(guess as u32);
    }

    // The closed form landed off after rounding; bisect with `reaches(low)`
    // false and `reaches(high)` true.
    let (mut low, mut high) = if reaches(guess) { (0, guess) } else { (guess, limit) };
    while high - low > 1 {
        let mid = low + (high - low) / 2;
        if reaches(mid) {
            high = mid;
        } else {
            low = mid;
        }
    }

    Ok(high as u32)
}

/// Largest number of further misses the subject can absorb while staying at
/// or above its threshold. A zero threshold never binds and yields `u32::MAX`.
pub fn safe_skip_allowance(record: &SubjectRecord) -> Result<u32> {
    if record.total() == 0 {
        return Err(undefined(record));
    }

    let required = record.required_percentage();
    let attended = record.attended() as u64;
    let total = record.total() as u64;

    if !meets_threshold(attended, total, required) {
        return Ok(0);
    }
    if required == 0.0 {
        return Ok(u32::MAX);
    }

    let limit = u32::MAX as u64;
    let estimate = (100.0 * attended as f64 / required - total as f64).floor();
    let mut allowance = (estimate.max(0.0) as u64).min(limit);

    while allowance > 0 && !meets_threshold(attended, total + allowance, required) {
        allowance -= 1;
    }
    while allowance < limit && meets_threshold(attended, total + allowance + 1, required) {
        allowance += 1;
    }

    Ok(allowance as u32)
}

/// `100 * attended / held >= required`, cross-multiplied so boundary values
/// such as 30 of 40 at 75% compare exactly.
fn meets_threshold(attended: u64, held: u64, required: f64) -> bool {
    100.0 * attended as f64 >= required * held as f64
}

fn held_after(record: &SubjectRecord, additional_misses: u32) -> u64 {
    record.total() as u64 + additional_misses as u64
}

fn undefined(record: &SubjectRecord) -> AttendanceError {
    AttendanceError::DivisionUndefined {
        id: record.id().clone(),
    }
}
