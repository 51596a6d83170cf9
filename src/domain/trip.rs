use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::timeline::DayTimeline;

/// Which flow the wizard is running. Fixes the reachable transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardMode {
    Create,
    Edit,
    Reactivate,
}

impl WizardMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "create" | "new" => Some(Self::Create),
            "edit" => Some(Self::Edit),
            "reactivate" => Some(Self::Reactivate),
            _ => None,
        }
    }

    pub fn has_improvements(self) -> bool {
        matches!(self, Self::Reactivate)
    }
}

impl fmt::Display for WizardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Reactivate => "reactivate",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
    AllYear,
}

impl Season {
    pub const ALL: [Season; 5] = [
        Season::Spring,
        Season::Summer,
        Season::Autumn,
        Season::Winter,
        Season::AllYear,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Autumn => "autumn",
            Self::Winter => "winter",
            Self::AllYear => "all_year",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "spring" => Some(Self::Spring),
            "summer" => Some(Self::Summer),
            "autumn" | "fall" => Some(Self::Autumn),
            "winter" => Some(Self::Winter),
            "all_year" | "allyear" => Some(Self::AllYear),
            _ => None,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Basic trip attributes collected on the first wizard step.
///
/// Numeric fields that the user may leave blank are optional; the payload builder
/// coerces them to their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct TripDraft {
    pub name: String,
    pub description: String,
    pub season: Option<Season>,
    pub start_date: Option<NaiveDate>,
    pub days: u32,
    pub tickets: Option<u32>,
    pub price: Option<f64>,
    pub discount: Option<f64>,
    pub discount_enabled: bool,
    pub tags: BTreeSet<String>,
}

impl Default for TripDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            season: None,
            start_date: None,
            days: 1,
            tickets: None,
            price: None,
            discount: None,
            discount_enabled: false,
            tags: BTreeSet::new(),
        }
    }
}

impl TripDraft {
    /// Adds a tag after trimming; blank tags and duplicates are ignored.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.tags.insert(trimmed.to_string())
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag.trim())
    }
}

/// Pre-fill values supplied when editing or reactivating an existing trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitialTripData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub season: Option<Season>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub days: Option<u32>,
    #[serde(default)]
    pub tickets: Option<u32>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub discount: Option<f64>,
    #[serde(default)]
    pub discount_enabled: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Locations of images already stored for the trip.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub timelines: Vec<DayTimeline>,
    #[serde(default)]
    pub improvements: Vec<String>,
}

impl InitialTripData {
    pub(crate) fn to_draft(&self) -> TripDraft {
        let mut draft = TripDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            season: self.season,
            start_date: self.start_date,
            days: self
                .days
                .unwrap_or(self.timelines.len() as u32)
                .max(1),
            tickets: self.tickets,
            price: self.price,
            discount: self.discount,
            discount_enabled: self.discount_enabled,
            tags: BTreeSet::new(),
        };
        for tag in &self.tags {
            draft.add_tag(tag);
        }
        draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_parse_accepts_common_spellings() {
        assert_eq!(Season::parse("Fall"), Some(Season::Autumn));
        assert_eq!(Season::parse("all year"), Some(Season::AllYear));
        assert_eq!(Season::parse("monsoon"), None);
    }

    #[test]
    fn season_serializes_lowercase() {
        let json = serde_json::to_string(&Season::AllYear).unwrap();
        assert_eq!(json, "\"all_year\"");
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let mut draft = TripDraft::default();
        assert!(draft.add_tag(" hiking "));
        assert!(!draft.add_tag("hiking"));
        assert!(!draft.add_tag("   "));
        assert_eq!(draft.tags.len(), 1);
        assert!(draft.remove_tag("hiking"));
    }

    #[test]
    fn initial_days_fall_back_to_timeline_count() {
        let initial = InitialTripData {
            timelines: vec![DayTimeline::new(1), DayTimeline::new(2)],
            ..InitialTripData::default()
        };
        assert_eq!(initial.to_draft().days, 2);

        let empty = InitialTripData::default();
        assert_eq!(empty.to_draft().days, 1);
    }
}
