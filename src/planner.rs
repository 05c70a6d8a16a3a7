use std::collections::{BTreeMap, HashMap};

use crate::engine;
use crate::error::{AttendanceError, Result};
use crate::models::{PlanImpact, Recommendation, SkipPlan, Slot, SubjectId, SubjectRecord};

/// Greedy, order-stable pick of up to `desired_skip_count` slots.
///
/// A slot is accepted only if every subject meeting in it stays at or above
/// its threshold once the misses from all previously accepted slots are
/// counted too. Slots with no classes are always accepted.
pub fn recommend_skip_days(
    records: &[SubjectRecord],
    candidate_slots: &[Slot],
    desired_skip_count: usize,
) -> Result<Recommendation> {
    let by_id = index_records(records);
    let mut cumulative: HashMap<&SubjectId, u32> = HashMap::new();
    let mut selected = Vec::new();

    for slot in candidate_slots {
        if selected.len() >= desired_skip_count {
            break;
        }

        let mut in_slot: BTreeMap<&SubjectId, u32> = BTreeMap::new();
        for subject in &slot.subjects {
            let entry = in_slot.entry(subject).or_insert(0);
            *entry = entry.saturating_add(1);
        }

        let mut accepted = true;
        for (subject, count) in &in_slot {
            let record = lookup(&by_id, subject)?;
            let misses = cumulative
                .get(subject)
                .copied()
                .unwrap_or(0)
                .saturating_add(*count);
            let verdict = engine::is_safe_to_skip(record, misses)?;
            if !verdict.safe {
                tracing::debug!(
                    slot = %slot.label,
                    subject = %subject,
                    misses,
                    reason = %verdict.reason,
                    "slot rejected"
                );
                accepted = false;
                break;
            }
        }

        if !accepted {
            continue;
        }

        for (subject, count) in in_slot {
            let entry = cumulative.entry(subject).or_insert(0);
            *entry = entry.saturating_add(count);
        }
        tracing::debug!(slot = %slot.label, "slot accepted");
        selected.push(slot.clone());
    }

    let feasible = selected.len() == desired_skip_count;
    Ok(Recommendation { selected, feasible })
}

/// Per-subject effect of a plan, evaluated cumulatively, ordered by subject id.
pub fn evaluate_plan(records: &[SubjectRecord], plan: &SkipPlan) -> Result<Vec<PlanImpact>> {
    let by_id = index_records(records);
    let mut impacts = Vec::new();

    for candidate in plan.candidates() {
        let record = lookup(&by_id, &candidate.subject)?;
        impacts.push(PlanImpact {
            current_percentage: engine::current_percentage(record)?,
            projected_percentage: engine::projected_percentage(record, candidate.miss_count)?,
            verdict: engine::is_safe_to_skip(record, candidate.miss_count)?,
            subject: candidate.subject,
            miss_count: candidate.miss_count,
        });
    }

    Ok(impacts)
}

fn index_records(records: &[SubjectRecord]) -> HashMap<&SubjectId, &SubjectRecord> {
    records.iter().map(|record| (record.id(), record)).collect()
}

fn lookup<'a>(
    by_id: &HashMap<&SubjectId, &'a SubjectRecord>,
    subject: &SubjectId,
) -> Result<&'a SubjectRecord> {
    by_id
        .get(subject)
        .copied()
        .ok_or_else(|| AttendanceError::UnknownSubject(subject.clone()))
}
