#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use trip_composer::{
    assets::{ImageFile, TrackingPreviewRegistry},
    domain::{ActivitySection, DayTimeline, SectionField, SectionPath},
    errors::SubmissionError,
    payload::TripPayload,
    InitialTripData, Season, TripSink, WizardController, WizardOptions,
};

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
}

pub fn options() -> WizardOptions {
    WizardOptions::new(today())
}

pub fn photo(name: &str) -> ImageFile {
    ImageFile::new(name, "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0])
}

pub fn filled_section(title: &str) -> ActivitySection {
    ActivitySection {
        time: "09:00".into(),
        title: title.into(),
        description: vec![format!("{title} with a local guide")],
        latitude: Some("41.9028".into()),
        longitude: Some("12.4964".into()),
    }
}

pub fn initial_trip(days: u32) -> InitialTripData {
    InitialTripData {
        name: "Roman Holiday".into(),
        description: "Classic sights of Rome".into(),
        season: Some(Season::Spring),
        start_date: NaiveDate::from_ymd_opt(2026, 7, 1),
        days: Some(days),
        tickets: Some(20),
        price: Some(1250.0),
        discount: Some(10.0),
        discount_enabled: true,
        tags: vec!["history".into(), "food".into()],
        images: vec!["colosseum.jpg".into()],
        timelines: (1..=days)
            .map(|day| DayTimeline {
                day,
                sections: vec![filled_section(&format!("Day {day} tour"))],
            })
            .collect(),
        improvements: Vec::new(),
    }
}

pub fn create_wizard(previews: &Arc<TrackingPreviewRegistry>) -> WizardController {
    WizardController::create(options(), previews.clone())
}

/// Fills the basic step with values that pass validation in create mode.
pub fn fill_basic(wizard: &mut WizardController) {
    wizard.set_name("Amalfi Coast").unwrap();
    wizard.set_description("Lemons, cliffs and boats").unwrap();
    wizard.set_season(Some(Season::Summer)).unwrap();
    wizard.set_start_date(Some(today())).unwrap();
    wizard.set_days(2).unwrap();
    wizard.set_tickets(Some(16)).unwrap();
    wizard.set_price(Some(980.5)).unwrap();
    let rejected = wizard.add_images(vec![photo("positano.jpg")]).unwrap();
    assert!(rejected.is_empty());
}

/// Fills every section currently in the itinerary.
pub fn fill_itinerary(wizard: &mut WizardController) {
    let paths: Vec<SectionPath> = wizard.itinerary().paths().collect();
    for path in paths {
        wizard
            .set_section_field(path, SectionField::Time, Some("10:30".into()))
            .unwrap();
        wizard
            .set_section_field(path, SectionField::Title, Some(format!("Stop {}", path)))
            .unwrap();
        wizard
            .set_description_line(path, 0, "Walk and lunch")
            .unwrap();
        wizard
            .set_section_field(path, SectionField::Latitude, Some("40.63".into()))
            .unwrap();
        wizard
            .set_section_field(path, SectionField::Longitude, Some("14.60".into()))
            .unwrap();
    }
}

/// Sink that records what the wizard hands it.
#[derive(Default)]
pub struct RecordingSink {
    pub saved: Vec<TripPayload>,
    pub closed: usize,
    pub fail_with: Option<String>,
}

impl RecordingSink {
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::default()
        }
    }
}

impl TripSink for RecordingSink {
    fn on_save(&mut self, payload: &TripPayload) -> Result<(), SubmissionError> {
        if let Some(message) = &self.fail_with {
            return Err(SubmissionError::Rejected(message.clone()));
        }
        self.saved.push(payload.clone());
        Ok(())
    }

    fn on_close(&mut self) {
        self.closed += 1;
    }
}
