// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CSV export of training logs.
//!
//! Output opens cleanly in spreadsheet software: UTF-8 with a byte-order
//! mark, Korean headers, one row per log.

use crate::models::{Category, TrainingLog};

/// UTF-8 byte-order mark.
pub const BOM: char = '\u{FEFF}';

/// MIME type for the exported file.
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Column headers: date, one per category in [`Category::ALL`] order, total.
pub const HEADERS: [&str; 7] = [
    "날짜",
    "스트레칭(분)",
    "유산소(분)",
    "근력(분)",
    "기술(분)",
    "기타(분)",
    "총합(분)",
];

/// Serialize logs to CSV, in the order given.
///
/// Categories missing from a log are written as 0. The total column is the
/// stored `total_duration`, not a recomputed sum.
pub fn to_csv(logs: &[TrainingLog]) -> String {
    let mut lines = Vec::with_capacity(logs.len() + 1);
    lines.push(HEADERS.join(","));

    for log in logs {
        let mut row = Vec::with_capacity(HEADERS.len());
        row.push(log.date.clone());
        row.extend(Category::ALL.iter().map(|c| log.minutes(*c).to_string()));
        row.push(log.total_duration.to_string());
        lines.push(row.join(","));
    }

    let mut csv = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum::<usize>() + 3);
    csv.push(BOM);
    csv.push_str(&lines.join("\n"));
    csv
}

/// Download filename for a user's export.
pub fn export_filename(display_name: &str) -> String {
    format!("{}_훈련기록.csv", display_name)
}

/// `Content-Disposition` value carrying a UTF-8 filename (RFC 6266 / RFC 5987).
///
/// The plain `filename` parameter is an ASCII fallback for old clients.
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}
