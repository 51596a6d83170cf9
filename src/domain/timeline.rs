use std::fmt;

use serde::{Deserialize, Serialize};

/// Zero-based address of one activity section inside the itinerary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SectionPath {
    pub day: usize,
    pub section: usize,
}

impl SectionPath {
    pub fn new(day: usize, section: usize) -> Self {
        Self { day, section }
    }
}

impl fmt::Display for SectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {} / section {}", self.day + 1, self.section + 1)
    }
}

/// Scalar fields of a section that can be set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionField {
    Time,
    Title,
    Latitude,
    Longitude,
}

impl SectionField {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "time" => Some(Self::Time),
            "title" => Some(Self::Title),
            "lat" | "latitude" => Some(Self::Latitude),
            "lng" | "lon" | "longitude" => Some(Self::Longitude),
            _ => None,
        }
    }
}

/// A single timed activity within a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySection {
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "ActivitySection::default_description")]
    pub description: Vec<String>,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
}

impl Default for ActivitySection {
    fn default() -> Self {
        Self {
            time: String::new(),
            title: String::new(),
            description: Self::default_description(),
            latitude: None,
            longitude: None,
        }
    }
}

impl ActivitySection {
    fn default_description() -> Vec<String> {
        vec![String::new()]
    }

    /// True when time, title, and every description line are blank.
    pub fn is_blank(&self) -> bool {
        self.time.trim().is_empty()
            && self.title.trim().is_empty()
            && self.description.iter().all(|line| line.trim().is_empty())
    }

    pub fn has_location(&self) -> bool {
        let filled = |value: &Option<String>| {
            value
                .as_deref()
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false)
        };
        filled(&self.latitude) && filled(&self.longitude)
    }

    pub(crate) fn set_field(&mut self, field: SectionField, value: Option<String>) {
        match field {
            SectionField::Time => self.time = value.unwrap_or_default(),
            SectionField::Title => self.title = value.unwrap_or_default(),
            SectionField::Latitude => self.latitude = value.filter(|v| !v.trim().is_empty()),
            SectionField::Longitude => self.longitude = value.filter(|v| !v.trim().is_empty()),
        }
    }

    /// Restores the one-line invariant after deserializing foreign data.
    pub(crate) fn normalize(&mut self) {
        if self.description.is_empty() {
            self.description.push(String::new());
        }
    }
}

/// The ordered activities of one day. `day` is 1-based and always matches the position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTimeline {
    pub day: u32,
    pub sections: Vec<ActivitySection>,
}

impl DayTimeline {
    pub fn new(day: u32) -> Self {
        Self {
            day,
            sections: vec![ActivitySection::default()],
        }
    }

    pub fn is_blank(&self) -> bool {
        self.sections.iter().all(ActivitySection::is_blank)
    }
}
