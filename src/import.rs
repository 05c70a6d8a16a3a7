use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::calendar::{AttendanceCalendar, DayStatus};
use crate::error::AttendanceError;
use crate::models::{SubjectId, SubjectRecord};
use crate::timetable::{weekday_name, Timetable, TimetableEntry};

#[derive(Debug, Serialize, Deserialize)]
struct SubjectRow {
    id: String,
    name: String,
    attended: u32,
    total: u32,
    #[serde(default)]
    required_percentage: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TimetableRow {
    weekday: String,
    time: String,
    subject: String,
    teacher: String,
    room: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CalendarRow {
    date: NaiveDate,
    status: DayStatus,
}

/// Reads `id,name,attended,total[,required_percentage]` rows. Rows without a
/// threshold get `default_required_percentage`.
pub fn load_subjects(
    csv_path: &Path,
    default_required_percentage: f64,
) -> anyhow::Result<Vec<SubjectRecord>> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut records = Vec::new();
    let mut seen = HashSet::new();

    for (line, result) in reader.deserialize::<SubjectRow>().enumerate() {
        let row = result.with_context(|| format!("{}: bad subject row", csv_path.display()))?;
        let id = SubjectId::new(row.id.trim());
        if !seen.insert(id.clone()) {
            return Err(AttendanceError::DuplicateSubject(id).into());
        }

        let required = row
            .required_percentage
            .unwrap_or(default_required_percentage);
        let record = SubjectRecord::with_threshold(id, row.name, row.attended, row.total, required)
            .with_context(|| format!("{}: row {}", csv_path.display(), line + 1))?;
        records.push(record);
    }

    tracing::debug!(count = records.len(), path = %csv_path.display(), "loaded subjects");
    Ok(records)
}

pub fn write_subjects(csv_path: &Path, records: &[SubjectRecord]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(csv_path)
        .with_context(|| format!("failed to create {}", csv_path.display()))?;

    for record in records {
        writer.serialize(SubjectRow {
            id: record.id().to_string(),
            name: record.name().to_string(),
            attended: record.attended(),
            total: record.total(),
            required_percentage: Some(record.required_percentage()),
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Reads `weekday,time,subject,teacher,room` rows. Weekdays accept full or
/// three-letter English names.
pub fn load_timetable(csv_path: &Path) -> anyhow::Result<Timetable> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut entries = Vec::new();

    for result in reader.deserialize::<TimetableRow>() {
        let row = result.with_context(|| format!("{}: bad timetable row", csv_path.display()))?;
        let weekday: Weekday = row
            .weekday
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{}: unknown weekday {:?}", csv_path.display(), row.weekday))?;

        entries.push(TimetableEntry {
            weekday,
            time: row.time,
            subject: SubjectId::new(row.subject.trim()),
            teacher: row.teacher,
            room: row.room,
        });
    }

    tracing::debug!(count = entries.len(), path = %csv_path.display(), "loaded timetable");
    Ok(Timetable::new(entries))
}

pub fn write_timetable(csv_path: &Path, timetable: &Timetable) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(csv_path)
        .with_context(|| format!("failed to create {}", csv_path.display()))?;

    for entry in timetable.entries() {
        writer.serialize(TimetableRow {
            weekday: weekday_name(entry.weekday).to_string(),
            time: entry.time.clone(),
            subject: entry.subject.to_string(),
            teacher: entry.teacher.clone(),
            room: entry.room.clone(),
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Reads `date,status` rows; later rows win for a repeated date.
pub fn load_calendar(csv_path: &Path) -> anyhow::Result<AttendanceCalendar> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut calendar = AttendanceCalendar::default();

    for result in reader.deserialize::<CalendarRow>() {
        let row = result.with_context(|| format!("{}: bad calendar row", csv_path.display()))?;
        calendar.set(row.date, row.status);
    }

    Ok(calendar)
}

pub fn write_calendar(csv_path: &Path, calendar: &AttendanceCalendar) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(csv_path)
        .with_context(|| format!("failed to create {}", csv_path.display()))?;

    for (date, status) in calendar.iter() {
        writer.serialize(CalendarRow { date, status })?;
    }

    writer.flush()?;
    Ok(())
}

/// Like [`load_calendar`], but a missing file is an empty calendar.
pub fn load_calendar_or_default(csv_path: &Path) -> anyhow::Result<AttendanceCalendar> {
    if csv_path.exists() {
        load_calendar(csv_path)
    } else {
        Ok(AttendanceCalendar::default())
    }
}

pub fn sample_subjects() -> anyhow::Result<Vec<SubjectRecord>> {
    let subjects = vec![
        ("1", "Mathematics", 28, 35),
        ("2", "Physics", 22, 30),
        ("3", "Chemistry", 25, 32),
        ("4", "Computer Science", 30, 33),
        ("5", "English", 26, 31),
    ];

    let mut records = Vec::new();
    for (id, name, attended, total) in subjects {
        records.push(SubjectRecord::new(id, name, attended, total)?);
    }
    Ok(records)
}

pub fn sample_timetable() -> Timetable {
    let entries = vec![
        (Weekday::Mon, "9:00 AM", "1", "Dr. Smith", "Room 101"),
        (Weekday::Mon, "10:30 AM", "2", "Prof. Johnson", "Lab 201"),
        (Weekday::Mon, "2:00 PM", "3", "Dr. Brown", "Lab 301"),
        (Weekday::Tue, "9:00 AM", "5", "Ms. Davis", "Room 102"),
        (Weekday::Wed, "10:00 AM", "4", "Dr. Taylor", "Lab 401"),
        (Weekday::Thu, "9:30 AM", "1", "Dr. Smith", "Room 101"),
        (Weekday::Thu, "1:00 PM", "2", "Prof. Johnson", "Lab 201"),
        (Weekday::Fri, "10:00 AM", "3", "Dr. Brown", "Lab 301"),
        (Weekday::Fri, "2:00 PM", "5", "Ms. Davis", "Room 102"),
    ];

    Timetable::new(
        entries
            .into_iter()
            .map(|(weekday, time, subject, teacher, room)| TimetableEntry {
                weekday,
                time: time.to_string(),
                subject: SubjectId::from(subject),
                teacher: teacher.to_string(),
                room: room.to_string(),
            })
            .collect(),
    )
}

/// Writes the sample subjects and timetable into `dir`.
pub fn seed(dir: &Path) -> anyhow::Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let subjects_path = dir.join("subjects.csv");
    let timetable_path = dir.join("timetable.csv");
    write_subjects(&subjects_path, &sample_subjects()?)?;
    write_timetable(&timetable_path, &sample_timetable())?;

    Ok((subjects_path, timetable_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn subjects_fall_back_to_default_threshold() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "subjects.csv",
            "id,name,attended,total,required_percentage\n\
             1,Mathematics,28,35,\n\
             2,Physics,22,30,60\n",
        );

        let records = load_subjects(&path, 80.0).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].required_percentage(), 80.0);
        assert_eq!(records[1].required_percentage(), 60.0);
    }

    #[test]
    fn threshold_column_is_optional() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "subjects.csv", "id,name,attended,total\n1,Mathematics,28,35\n");
        let records = load_subjects(&path, 75.0).unwrap();
        assert_eq!(records[0].required_percentage(), 75.0);
    }

    #[test]
    fn invalid_rows_are_rejected() {
        let dir = TempDir::new().unwrap();
        let inverted = write(&dir, "inverted.csv", "id,name,attended,total\n1,Mathematics,36,35\n");
        let err = load_subjects(&inverted, 75.0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AttendanceError>(),
            Some(AttendanceError::InvalidRecord { .. })
        ));

        let negative = write(&dir, "negative.csv", "id,name,attended,total\n1,Mathematics,-1,35\n");
        assert!(load_subjects(&negative, 75.0).is_err());

        let duplicate = write(
            &dir,
            "duplicate.csv",
            "id,name,attended,total\n1,Mathematics,1,2\n1,Physics,1,2\n",
        );
        let err = load_subjects(&duplicate, 75.0).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AttendanceError>(),
            Some(&AttendanceError::DuplicateSubject("1".into()))
        );
    }

    #[test]
    fn timetable_accepts_short_weekday_names() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "timetable.csv",
            "weekday,time,subject,teacher,room\n\
             mon,9:00 AM,1,Dr. Smith,Room 101\n\
             Thursday,9:30 AM,1,Dr. Smith,Room 101\n",
        );
        let timetable = load_timetable(&path).unwrap();
        assert_eq!(timetable.subjects_on(Weekday::Mon), vec![SubjectId::from("1")]);
        assert_eq!(timetable.subjects_on(Weekday::Thu), vec![SubjectId::from("1")]);

        let bad = write(&dir, "bad.csv", "weekday,time,subject,teacher,room\nsomeday,9,1,a,b\n");
        assert!(load_timetable(&bad).is_err());
    }

    #[test]
    fn calendar_reads_statuses() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "calendar.csv",
            "date,status\n2026-10-12,present\n2026-10-13,holiday\n",
        );
        let calendar = load_calendar(&path).unwrap();
        assert_eq!(
            calendar.get(NaiveDate::from_ymd_opt(2026, 10, 12).unwrap()),
            Some(DayStatus::Present)
        );
        assert!(calendar.is_holiday(NaiveDate::from_ymd_opt(2026, 10, 13).unwrap()));
    }

    #[test]
    fn calendar_survives_write_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("calendar.csv");
        assert!(load_calendar_or_default(&path).unwrap().is_empty());

        let mut calendar = AttendanceCalendar::default();
        calendar.set(NaiveDate::from_ymd_opt(2026, 10, 12).unwrap(), DayStatus::Absent);
        calendar.set(NaiveDate::from_ymd_opt(2026, 10, 13).unwrap(), DayStatus::Holiday);
        write_calendar(&path, &calendar).unwrap();

        assert_eq!(load_calendar_or_default(&path).unwrap(), calendar);
    }

    #[test]
    fn seed_round_trips_through_loaders() {
        let dir = TempDir::new().unwrap();
        let (subjects_path, timetable_path) = seed(dir.path()).unwrap();

        let subjects = load_subjects(&subjects_path, 50.0).unwrap();
        assert_eq!(subjects, sample_subjects().unwrap());
        assert_eq!(load_timetable(&timetable_path).unwrap(), sample_timetable());
    }
}
