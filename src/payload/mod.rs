//! Normalisation of wizard state into the submission schema.

use chrono::NaiveTime;
use serde::{Serialize, Serializer};

use crate::assets::ImageFile;
use crate::domain::{ActivitySection, DayTimeline, TripDraft, WizardMode};

/// Reference to an uploaded binary. The bytes travel beside the JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinaryRef {
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
    /// Location of the bytes inside a stored outbox entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_as: Option<String>,
    #[serde(skip)]
    pub file: ImageFile,
}

impl From<ImageFile> for BinaryRef {
    fn from(file: ImageFile) -> Self {
        Self {
            file_name: file.name().to_string(),
            content_type: file.content_type().to_string(),
            size: file.size(),
            stored_as: None,
            file,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionPayload {
    pub time: String,
    pub title: String,
    pub description: Vec<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePayload {
    pub day: u32,
    pub sections: Vec<SectionPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripPayload {
    pub name: String,
    pub description: String,
    pub season: String,
    pub start_date: String,
    pub days: u32,
    pub tickets: u32,
    #[serde(serialize_with = "serialize_number")]
    pub price: f64,
    #[serde(serialize_with = "serialize_number")]
    pub discount: f64,
    pub discount_enabled: bool,
    pub tags: Vec<String>,
    pub images: Vec<BinaryRef>,
    pub timelines: Vec<TimelinePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub improvements: Option<Vec<String>>,
}

impl TripPayload {
    pub fn section_count(&self) -> usize {
        self.timelines.iter().map(|day| day.sections.len()).sum()
    }
}

/// Whole amounts go out as integers, fractional ones unchanged.
fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Stateless transform from draft state to [`TripPayload`].
pub struct PayloadBuilder;

impl PayloadBuilder {
    pub fn build(
        draft: &TripDraft,
        timelines: &[DayTimeline],
        improvements: Option<&str>,
        mode: WizardMode,
        images: Vec<ImageFile>,
    ) -> TripPayload {
        TripPayload {
            name: draft.name.trim().to_string(),
            description: draft.description.trim().to_string(),
            season: draft
                .season
                .map(|season| season.as_str().to_string())
                .unwrap_or_default(),
            start_date: draft
                .start_date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            days: draft.days.max(1),
            tickets: draft.tickets.unwrap_or(0),
            price: non_negative(draft.price),
            discount: Self::discount(draft),
            discount_enabled: draft.discount_enabled,
            tags: draft.tags.iter().cloned().collect(),
            images: images.into_iter().map(BinaryRef::from).collect(),
            timelines: Self::timelines(timelines),
            improvements: mode
                .has_improvements()
                .then(|| parse_improvements(improvements.unwrap_or_default())),
        }
    }

    fn discount(draft: &TripDraft) -> f64 {
        if !draft.discount_enabled {
            return 0.0;
        }
        non_negative(draft.discount).min(100.0)
    }

    /// Drops blank sections and empty days, then renumbers the survivors.
    pub fn timelines(timelines: &[DayTimeline]) -> Vec<TimelinePayload> {
        timelines
            .iter()
            .map(|timeline| {
                timeline
                    .sections
                    .iter()
                    .filter(|section| !section.is_blank())
                    .map(section_payload)
                    .collect::<Vec<_>>()
            })
            .filter(|sections| !sections.is_empty())
            .enumerate()
            .map(|(index, sections)| TimelinePayload {
                day: index as u32 + 1,
                sections,
            })
            .collect()
    }
}

fn section_payload(section: &ActivitySection) -> SectionPayload {
    SectionPayload {
        time: wire_time(&section.time),
        title: section.title.trim().to_string(),
        description: section
            .description
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        latitude: section.latitude.clone(),
        longitude: section.longitude.clone(),
    }
}

/// Zero-padded `HH:MM`; text that is not a time passes through trimmed.
fn wire_time(time: &str) -> String {
    let time = time.trim();
    match NaiveTime::parse_from_str(time, "%H:%M") {
        Ok(parsed) => parsed.format("%H:%M").to_string(),
        Err(_) => time.to_string(),
    }
}

fn non_negative(value: Option<f64>) -> f64 {
    value
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(0.0)
}

/// Splits free text into trimmed, non-blank lines.
pub fn parse_improvements(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
