// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Daily training log model for storage and API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Fixed training categories, in display/export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Stretching,
    Cardio,
    Strength,
    Skill,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Stretching,
        Category::Cardio,
        Category::Strength,
        Category::Skill,
        Category::Other,
    ];

    /// Key used in the stored `trainings` map.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Stretching => "스트레칭",
            Category::Cardio => "유산소",
            Category::Strength => "근력",
            Category::Skill => "기술",
            Category::Other => "기타",
        }
    }
}

/// Stored training record in the `trainingLogs` collection.
///
/// One record per (user, date); see [`log_id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct TrainingLog {
    /// `{userId}_{date}` (also used as document ID)
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    /// Calendar date (`YYYY-MM-DD`)
    pub date: String,
    /// Minutes per category, keyed by [`Category::key`]
    #[serde(default)]
    pub trainings: HashMap<String, u32>,
    /// Sum of `trainings` at write time
    #[serde(default)]
    pub total_duration: u32,
    /// When this record was written (RFC3339)
    #[serde(default)]
    pub created_at: String,
}

impl TrainingLog {
    /// Minutes recorded for a category; absent keys read as 0.
    pub fn minutes(&self, category: Category) -> u32 {
        self.trainings.get(category.key()).copied().unwrap_or(0)
    }
}

/// Document ID for a user's log on a given date.
pub fn log_id(user_id: &str, date: &str) -> String {
    format!("{}_{}", user_id, date)
}

/// Build the stored `trainings` map: every category present, unset ones at 0.
pub fn stored_trainings(input: &HashMap<Category, u32>) -> (HashMap<String, u32>, u32) {
    let mut trainings = HashMap::with_capacity(Category::ALL.len());
    let mut total = 0u32;

    for category in Category::ALL {
        let minutes = input.get(&category).copied().unwrap_or(0);
        trainings.insert(category.key().to_string(), minutes);
        total = total.saturating_add(minutes);
    }

    (trainings, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_trainings_fills_all_categories() {
        let input = HashMap::from([(Category::Cardio, 30), (Category::Skill, 15)]);
        let (trainings, total) = stored_trainings(&input);

        assert_eq!(trainings.len(), 5);
        assert_eq!(trainings.get("유산소"), Some(&30));
        assert_eq!(trainings.get("기술"), Some(&15));
        assert_eq!(trainings.get("스트레칭"), Some(&0));
        assert_eq!(total, 45);
    }

    #[test]
    fn test_minutes_defaults_missing_category() {
        let log = TrainingLog {
            id: log_id("u1", "2024-06-03"),
            user_id: "u1".to_string(),
            user_name: "Kim".to_string(),
            date: "2024-06-03".to_string(),
            trainings: HashMap::from([("근력".to_string(), 40)]),
            total_duration: 40,
            created_at: String::new(),
        };

        assert_eq!(log.minutes(Category::Strength), 40);
        assert_eq!(log.minutes(Category::Other), 0);
    }

    #[test]
    fn test_category_accepts_english_identifiers() {
        let input: HashMap<Category, u32> =
            serde_json::from_str(r#"{"cardio": 30, "stretching": 10}"#).unwrap();
        assert_eq!(input.get(&Category::Cardio), Some(&30));
        assert_eq!(input.get(&Category::Stretching), Some(&10));
    }

    #[test]
    fn test_log_deserializes_legacy_document() {
        let json = r#"{
            "id": "u1_2024-06-03",
            "userId": "u1",
            "userName": "Kim",
            "date": "2024-06-03",
            "trainings": {"유산소": 30}
        }"#;
        let log: TrainingLog = serde_json::from_str(json).unwrap();
        assert_eq!(log.total_duration, 0);
        assert_eq!(log.minutes(Category::Cardio), 30);
    }
}
