use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Password;

/// A marked day inside a [`HolidaySummary`]. The calendar UI owns its shape.
pub type HolidayEntry = Value;

/// Date key to status label, supplied by the calendar UI.
pub type DayStates = BTreeMap<String, String>;

/// The persisted unit behind a shareable link.
///
/// Carries no password. An inbound `state` object that embeds one has the key
/// dropped during deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarConfiguration {
    pub selected_year: i32,
    pub hide_weekend_colors: bool,
    #[serde(default)]
    pub holiday_summary: HolidaySummary,
    #[serde(default)]
    pub day_states: DayStates,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidaySummary {
    #[serde(default)]
    pub hr_days: Vec<HolidayEntry>,
    #[serde(default)]
    pub fd_days: Vec<HolidayEntry>,
}

/// Record as written to the key-value store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub state: CalendarConfiguration,
    pub password: Option<Password>,
}

impl CalendarConfiguration {
    #[must_use]
    pub fn new(selected_year: i32) -> Self {
        Self {
            selected_year,
            hide_weekend_colors: false,
            holiday_summary: HolidaySummary::default(),
            day_states: DayStates::new(),
        }
    }
}

impl HolidaySummary {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hr_days.is_empty() && self.fd_days.is_empty()
    }
}
