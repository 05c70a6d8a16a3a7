use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AttendanceError, Result};

/// Threshold applied to a subject when its input names none.
pub const DEFAULT_REQUIRED_PERCENTAGE: f64 = 75.0;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Present,
    Absent,
}

/// Attendance counters for one subject.
///
/// Fields are private so every record in circulation satisfies
/// `attended <= total` and a threshold within `0..=100`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectRecord {
    id: SubjectId,
    name: String,
    attended: u32,
    total: u32,
    required_percentage: f64,
}

impl SubjectRecord {
    pub fn new(
        id: impl Into<SubjectId>,
        name: impl Into<String>,
        attended: u32,
        total: u32,
    ) -> Result<Self> {
        Self::with_threshold(id, name, attended, total, DEFAULT_REQUIRED_PERCENTAGE)
    }

    pub fn with_threshold(
        id: impl Into<SubjectId>,
        name: impl Into<String>,
        attended: u32,
        total: u32,
        required_percentage: f64,
    ) -> Result<Self> {
        let id = id.into();
        validate_threshold(&id, required_percentage)?;
        validate_counts(&id, attended, total)?;

        Ok(Self {
            id,
            name: name.into(),
            attended,
            total,
            required_percentage,
        })
    }

    pub fn id(&self) -> &SubjectId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attended(&self) -> u32 {
        self.attended
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn required_percentage(&self) -> f64 {
        self.required_percentage
    }

    /// Records one more held class.
    pub fn record(&mut self, outcome: Outcome) -> Result<()> {
        let overflow = || AttendanceError::InvalidRecord {
            id: self.id.clone(),
            attended: self.attended,
            total: self.total,
        };

        let total = self.total.checked_add(1).ok_or_else(overflow)?;
        let attended = match outcome {
            Outcome::Present => self.attended.checked_add(1).ok_or_else(overflow)?,
            Outcome::Absent => self.attended,
        };

        self.total = total;
        self.attended = attended;
        Ok(())
    }

    /// Administrative correction of both counters. The record is left
    /// untouched when the new counts are invalid.
    pub fn correct(&mut self, attended: u32, total: u32) -> Result<()> {
        validate_counts(&self.id, attended, total)?;
        self.attended = attended;
        self.total = total;
        Ok(())
    }
}

fn validate_counts(id: &SubjectId, attended: u32, total: u32) -> Result<()> {
    if attended > total {
        return Err(AttendanceError::InvalidRecord {
            id: id.clone(),
            attended,
            total,
        });
    }
    Ok(())
}

fn validate_threshold(id: &SubjectId, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(AttendanceError::InvalidThreshold {
            id: id.clone(),
            value,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipCandidate {
    pub subject: SubjectId,
    pub miss_count: u32,
}

/// Hypothetical misses per subject. Never applied to a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipPlan {
    misses: BTreeMap<SubjectId, u32>,
}

impl SkipPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_slots<'a>(slots: impl IntoIterator<Item = &'a Slot>) -> Self {
        let mut plan = Self::new();
        for slot in slots {
            for subject in &slot.subjects {
                plan.add(subject.clone(), 1);
            }
        }
        plan
    }

    pub fn add(&mut self, subject: SubjectId, miss_count: u32) {
        let entry = self.misses.entry(subject).or_insert(0);
        *entry = entry.saturating_add(miss_count);
    }

    pub fn misses_for(&self, subject: &SubjectId) -> u32 {
        self.misses.get(subject).copied().unwrap_or(0)
    }

    pub fn candidates(&self) -> impl Iterator<Item = SkipCandidate> + '_ {
        self.misses.iter().map(|(subject, miss_count)| SkipCandidate {
            subject: subject.clone(),
            miss_count: *miss_count,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.misses.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub label: String,
    pub date: Option<NaiveDate>,
    pub subjects: Vec<SubjectId>,
}

impl Slot {
    pub fn new(label: impl Into<String>, subjects: Vec<SubjectId>) -> Self {
        Self {
            label: label.into(),
            date: None,
            subjects,
        }
    }

    pub fn on_date(date: NaiveDate, subjects: Vec<SubjectId>) -> Self {
        Self {
            label: date.format("%a %Y-%m-%d").to_string(),
            date: Some(date),
            subjects,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SafetyReason {
    AlreadyBelowMinimum,
    SafeToSkip,
    WouldDropBelowMinimum,
}

impl fmt::Display for SafetyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SafetyReason::AlreadyBelowMinimum => "already below minimum",
            SafetyReason::SafeToSkip => "safe to skip",
            SafetyReason::WouldDropBelowMinimum => "would drop below minimum",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkipVerdict {
    pub safe: bool,
    pub reason: SafetyReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub selected: Vec<Slot>,
    pub feasible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanImpact {
    pub subject: SubjectId,
    pub miss_count: u32,
    pub current_percentage: f64,
    pub projected_percentage: f64,
    pub verdict: SkipVerdict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceSummary {
    pub overall_percentage: Option<f64>,
    pub compliant: usize,
    pub deficient: usize,
    pub untracked: usize,
    pub classes_held: u64,
    pub classes_attended: u64,
}
