// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Monday–Sunday weekly aggregation of training logs.
//!
//! All functions are pure. Dates are calendar dates with no timezone; the
//! caller decides which "today" to use.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::TrainingLog;

/// Korean short day names, indexed by days since Sunday.
const DAY_NAMES: [&str; 7] = ["일", "월", "화", "수", "목", "금", "토"];

/// Inclusive Monday–Sunday range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekRange {
    pub fn start_iso(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_iso(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Monday–Sunday week containing `date`.
pub fn week_range(date: NaiveDate) -> WeekRange {
    let day = date.weekday().num_days_from_sunday() as i64;
    // Sunday belongs to the week that started six days earlier.
    let offset = if day == 0 { -6 } else { 1 - day };
    let start = date + Duration::days(offset);
    WeekRange {
        start,
        end: start + Duration::days(6),
    }
}

/// Logs inside a range and their summed minutes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeekSummary {
    pub logs: Vec<TrainingLog>,
    pub total_minutes: u64,
}

impl WeekSummary {
    /// The log recorded on `date`, if any.
    pub fn log_for(&self, date: &str) -> Option<&TrainingLog> {
        self.logs.iter().find(|log| log.date == date)
    }
}

/// Keep logs dated within `[start, end]` and sum their `total_duration`.
///
/// ISO dates are fixed-width, so string comparison orders them correctly.
pub fn filter_and_sum(logs: &[TrainingLog], start: &str, end: &str) -> WeekSummary {
    let logs: Vec<TrainingLog> = logs
        .iter()
        .filter(|log| log.date.as_str() >= start && log.date.as_str() <= end)
        .cloned()
        .collect();
    let total_minutes = logs.iter().map(|log| u64::from(log.total_duration)).sum();

    WeekSummary {
        logs,
        total_minutes,
    }
}

/// One column of the weekly table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WeekDay {
    pub date: String,
    pub day_name: String,
}

/// The seven days of `range`, Monday first.
pub fn week_days(range: &WeekRange) -> Vec<WeekDay> {
    range
        .start
        .iter_days()
        .take(7)
        .map(|day| WeekDay {
            date: day.format("%Y-%m-%d").to_string(),
            day_name: DAY_NAMES[day.weekday().num_days_from_sunday() as usize].to_string(),
        })
        .collect()
}

/// `"{hours}시간 {minutes}분"`
pub fn format_minutes(total: u64) -> String {
    format!("{}시간 {}분", total / 60, total % 60)
}
