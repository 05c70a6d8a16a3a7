use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{Outcome, SubjectId};
use crate::timetable::Timetable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Present,
    Absent,
    Holiday,
}

/// Click cycle on a calendar day: unmarked, present, absent, holiday, unmarked.
pub fn next_status(current: Option<DayStatus>) -> Option<DayStatus> {
    match current {
        None => Some(DayStatus::Present),
        Some(DayStatus::Present) => Some(DayStatus::Absent),
        Some(DayStatus::Absent) => Some(DayStatus::Holiday),
        Some(DayStatus::Holiday) => None,
    }
}

/// Day-level attendance marks keyed by date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceCalendar {
    days: BTreeMap<NaiveDate, DayStatus>,
}

impl AttendanceCalendar {
    pub fn get(&self, date: NaiveDate) -> Option<DayStatus> {
        self.days.get(&date).copied()
    }

    pub fn set(&mut self, date: NaiveDate, status: DayStatus) {
        self.days.insert(date, status);
    }

    pub fn clear(&mut self, date: NaiveDate) {
        self.days.remove(&date);
    }

    pub fn toggle(&mut self, date: NaiveDate) -> Option<DayStatus> {
        let next = next_status(self.get(date));
        match next {
            Some(status) => self.set(date, status),
            None => self.clear(date),
        }
        next
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.get(date) == Some(DayStatus::Holiday)
    }

    /// Marks every Monday to Friday in `[from, through]` present.
    pub fn mark_weekdays_present(&mut self, from: NaiveDate, through: NaiveDate) {
        for date in from.iter_days().take_while(|date| *date <= through) {
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                self.set(date, DayStatus::Present);
            }
        }
    }

    /// One outcome per scheduled class on every present or absent day from
    /// `since` onwards, in date order. Holidays contribute nothing.
    ///
    /// Outcomes are meant to be appended to the counters, so a caller that
    /// applies the same calendar twice passes the first unapplied date as
    /// `since`.
    pub fn tally(
        &self,
        timetable: &Timetable,
        since: Option<NaiveDate>,
    ) -> Vec<(SubjectId, Outcome)> {
        let mut outcomes = Vec::new();
        let days = match since {
            Some(since) => self.days.range(since..),
            None => self.days.range(..),
        };

        for (date, status) in days {
            let outcome = match status {
                DayStatus::Present => Outcome::Present,
                DayStatus::Absent => Outcome::Absent,
                DayStatus::Holiday => continue,
            };
            for entry in timetable.entries_on(date.weekday()) {
                outcomes.push((entry.subject.clone(), outcome));
            }
        }

        outcomes
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, DayStatus)> + '_ {
        self.days.iter().map(|(date, status)| (*date, *status))
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.days.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
