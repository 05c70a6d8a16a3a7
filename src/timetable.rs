use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

use crate::calendar::AttendanceCalendar;
use crate::models::{Slot, SubjectId};

pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimetableEntry {
    pub weekday: Weekday,
    pub time: String,
    pub subject: SubjectId,
    pub teacher: String,
    pub room: String,
}

/// A recurring weekly timetable. Entries keep their input order within a day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Timetable {
    entries: Vec<TimetableEntry>,
}

impl Timetable {
    pub fn new(entries: Vec<TimetableEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[TimetableEntry] {
        &self.entries
    }

    pub fn entries_on(&self, weekday: Weekday) -> impl Iterator<Item = &TimetableEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.weekday == weekday)
    }

    pub fn subjects_on(&self, weekday: Weekday) -> Vec<SubjectId> {
        self.entries_on(weekday)
            .map(|entry| entry.subject.clone())
            .collect()
    }

    /// One slot per weekday with classes, Monday first.
    pub fn weekly_slots(&self) -> Vec<Slot> {
        WEEK.iter()
            .filter_map(|weekday| {
                let subjects = self.subjects_on(*weekday);
                (!subjects.is_empty()).then(|| Slot::new(weekday_name(*weekday), subjects))
            })
            .collect()
    }

    /// Dated slots for `[from, from + days)`, leaving out days without classes
    /// and days the calendar marks as holidays.
    pub fn slots_between(
        &self,
        from: NaiveDate,
        days: u32,
        calendar: Option<&AttendanceCalendar>,
    ) -> Vec<Slot> {
        let mut slots = Vec::new();

        for offset in 0..days {
            let Some(date) = from.checked_add_signed(Duration::days(offset as i64)) else {
                break;
            };
            if calendar.is_some_and(|calendar| calendar.is_holiday(date)) {
                tracing::debug!(%date, "holiday left out of plan");
                continue;
            }

            let subjects = self.subjects_on(date.weekday());
            if !subjects.is_empty() {
                slots.push(Slot::on_date(date, subjects));
            }
        }

        slots
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::DayStatus;

    fn entry(weekday: Weekday, time: &str, subject: &str) -> TimetableEntry {
        TimetableEntry {
            weekday,
            time: time.to_string(),
            subject: subject.into(),
            teacher: "Dr. Smith".to_string(),
            room: "Room 101".to_string(),
        }
    }

    fn timetable() -> Timetable {
        Timetable::new(vec![
            entry(Weekday::Mon, "9:00 AM", "math"),
            entry(Weekday::Mon, "10:30 AM", "physics"),
            entry(Weekday::Wed, "10:00 AM", "cs"),
            entry(Weekday::Thu, "9:30 AM", "math"),
        ])
    }

    #[test]
    fn weekly_slots_follow_week_order() {
        let slots = timetable().weekly_slots();
        let labels: Vec<&str> = slots.iter().map(|slot| slot.label.as_str()).collect();
        assert_eq!(labels, vec!["Monday", "Wednesday", "Thursday"]);
        assert_eq!(
            slots[0].subjects,
            vec![SubjectId::from("math"), SubjectId::from("physics")]
        );
        assert!(slots.iter().all(|slot| slot.date.is_none()));
    }

    #[test]
    fn dated_slots_skip_empty_days() {
        // 2026-10-12 is a Monday.
        let from = NaiveDate::from_ymd_opt(2026, 10, 12).unwrap();
        let slots = timetable().slots_between(from, 7, None);
        let dates: Vec<NaiveDate> = slots.iter().filter_map(|slot| slot.date).collect();
        assert_eq!(
            dates,
            vec![
                from,
                NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
                NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
            ]
        );
        assert_eq!(slots[0].label, "Mon 2026-10-12");
    }

    #[test]
    fn dated_slots_leave_out_holidays() {
        let from = NaiveDate::from_ymd_opt(2026, 10, 12).unwrap();
        let mut calendar = AttendanceCalendar::default();
        calendar.set(from, DayStatus::Holiday);
        calendar.set(
            NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
            DayStatus::Absent,
        );

        let slots = timetable().slots_between(from, 14, Some(&calendar));
        assert_eq!(slots.len(), 5);
        assert_eq!(
            slots[0].date,
            Some(NaiveDate::from_ymd_opt(2026, 10, 14).unwrap())
        );
    }

    #[test]
    fn zero_days_yields_no_slots() {
        let from = NaiveDate::from_ymd_opt(2026, 10, 12).unwrap();
        assert!(timetable().slots_between(from, 0, None).is_empty());
    }
}
