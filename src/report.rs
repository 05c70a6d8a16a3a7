use std::fmt::Write;

use crate::engine;
use crate::error::Result;
use crate::models::{AttendanceSummary, Recommendation, SubjectRecord};

pub fn summarize(records: &[SubjectRecord]) -> AttendanceSummary {
    let mut summary = AttendanceSummary {
        overall_percentage: None,
        compliant: 0,
        deficient: 0,
        untracked: 0,
        classes_held: 0,
        classes_attended: 0,
    };
    let mut percentage_sum = 0.0;

    for record in records {
        summary.classes_held += record.total() as u64;
        summary.classes_attended += record.attended() as u64;

        match engine::current_percentage(record) {
            Ok(percentage) => {
                percentage_sum += percentage;
                if percentage < record.required_percentage() {
                    summary.deficient += 1;
                } else {
                    summary.compliant += 1;
                }
            }
            // Only a subject with no classes held has no percentage.
            Err(_) => summary.untracked += 1,
        }
    }

    let tracked = summary.compliant + summary.deficient;
    if tracked > 0 {
        summary.overall_percentage = Some(percentage_sum / tracked as f64);
    }

    summary
}

/// Footer line of a subject card.
pub fn subject_status(record: &SubjectRecord) -> Result<String> {
    let needed = engine::classes_needed_to_reach_threshold(record)?;
    Ok(match needed {
        0 => "On track".to_string(),
        1 => "Need 1 more class".to_string(),
        n => format!("Need {n} more classes"),
    })
}

pub fn build_report(
    student: Option<&str>,
    records: &[SubjectRecord],
    recommendation: Option<&Recommendation>,
) -> String {
    let summary = summarize(records);

    let mut output = String::new();
    let student_label = student.unwrap_or("this student");

    let _ = writeln!(output, "# Attendance Report");
    let _ = writeln!(output, "Generated for {}", student_label);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");

    match summary.overall_percentage {
        Some(overall) => {
            let _ = writeln!(output, "- Overall attendance: {:.1}%", overall);
        }
        None => {
            let _ = writeln!(output, "- Overall attendance: no classes held yet");
        }
    }
    let _ = writeln!(output, "- Subjects on track: {}", summary.compliant);
    let _ = writeln!(output, "- Subjects below minimum: {}", summary.deficient);
    if summary.untracked > 0 {
        let _ = writeln!(output, "- Subjects without classes: {}", summary.untracked);
    }
    let _ = writeln!(
        output,
        "- Classes attended: {} of {}",
        summary.classes_attended, summary.classes_held
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Subjects");

    if records.is_empty() {
        let _ = writeln!(output, "No subjects recorded.");
    } else {
        for record in records {
            let _ = writeln!(output, "{}", subject_line(record));
        }
    }

    if let Some(recommendation) = recommendation {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Recommended Skips");

        if recommendation.selected.is_empty() {
            let _ = writeln!(output, "No class can be skipped safely right now.");
        } else {
            for slot in recommendation.selected.iter() {
                let subjects: Vec<&str> = slot.subjects.iter().map(|id| id.as_str()).collect();
                let _ = writeln!(output, "- {} ({})", slot.label, subjects.join(", "));
            }
        }
        if !recommendation.feasible {
            let _ = writeln!(
                output,
                "Not possible to skip as many as requested without dropping below the minimum."
            );
        }
    }

    output
}

fn subject_line(record: &SubjectRecord) -> String {
    let percentage = match engine::current_percentage(record) {
        Ok(value) => format!("{:.1}%", value),
        Err(_) => "n/a".to_string(),
    };
    let status = subject_status(record).unwrap_or_else(|err| err.to_string());

    format!(
        "- {}: {} / {} classes, {} (required {}%): {}",
        record.name(),
        record.attended(),
        record.total(),
        percentage,
        record.required_percentage(),
        status
    )
}
