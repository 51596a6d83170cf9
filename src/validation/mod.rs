//! Step-scoped validation rules.
//!
//! Each step has its own key type so a report can only ever name fields that
//! exist on that step. Validators are pure: they read the draft and return a
//! [`ValidationReport`]; an empty report means the step may be left.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveTime};

use crate::assets::ImageAsset;
use crate::domain::{SectionPath, TripDraft, WizardMode};
use crate::itinerary::ItineraryModel;

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Errors keyed by the field they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport<K: Ord> {
    errors: BTreeMap<K, ValidationError>,
}

impl<K: Ord> Default for ValidationReport<K> {
    fn default() -> Self {
        Self {
            errors: BTreeMap::new(),
        }
    }
}

impl<K: Ord> ValidationReport<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.errors.contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<&ValidationError> {
        self.errors.get(key)
    }

    pub fn insert(&mut self, key: K, message: impl Into<String>) {
        self.errors.insert(key, ValidationError::new(message));
    }

    pub fn remove(&mut self, key: &K) -> Option<ValidationError> {
        self.errors.remove(key)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.errors.retain(|key, _| keep(key));
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    /// Re-keys every error; entries mapped to `None` are dropped.
    pub fn remap(&mut self, mut f: impl FnMut(&K) -> Option<K>) {
        let errors = std::mem::take(&mut self.errors);
        self.errors = errors
            .into_iter()
            .filter_map(|(key, err)| f(&key).map(|key| (key, err)))
            .collect();
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.errors.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &ValidationError)> {
        self.errors.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BasicField {
    Name,
    Description,
    Season,
    StartDate,
    Days,
    Tickets,
    Price,
    Discount,
    Images,
}

impl BasicField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Season => "season",
            Self::StartDate => "start_date",
            Self::Days => "days",
            Self::Tickets => "tickets",
            Self::Price => "price",
            Self::Discount => "discount",
            Self::Images => "images",
        }
    }
}

impl fmt::Display for BasicField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Section controls that can carry a timeline error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimelineField {
    Time,
    Title,
    Description,
    Location,
}

impl fmt::Display for TimelineField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Time => "time",
            Self::Title => "title",
            Self::Description => "description",
            Self::Location => "location",
        };
        f.write_str(label)
    }
}

/// Composite key pointing at one control of one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimelineKey {
    pub path: SectionPath,
    pub field: TimelineField,
}

impl TimelineKey {
    pub fn new(day: usize, section: usize, field: TimelineField) -> Self {
        Self {
            path: SectionPath::new(day, section),
            field,
        }
    }
}

impl fmt::Display for TimelineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.path, self.field)
    }
}

/// The improvements step has no required fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImprovementField {}

/// Errors that blocked a transition, tagged with the step that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepErrors {
    Basic(ValidationReport<BasicField>),
    Timeline(ValidationReport<TimelineKey>),
}

impl StepErrors {
    pub fn len(&self) -> usize {
        match self {
            Self::Basic(report) => report.len(),
            Self::Timeline(report) => report.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattened `field: message` lines for display.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Basic(report) => report
                .iter()
                .map(|(key, err)| format!("{key}: {err}"))
                .collect(),
            Self::Timeline(report) => report
                .iter()
                .map(|(key, err)| format!("{key}: {err}"))
                .collect(),
        }
    }
}

/// Inputs that vary by caller rather than by draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    pub mode: WizardMode,
    pub today: NaiveDate,
    pub require_tickets: bool,
}

pub fn validate_basic(
    draft: &TripDraft,
    images: &[ImageAsset],
    ctx: &ValidationContext,
) -> ValidationReport<BasicField> {
    let mut report = ValidationReport::new();

    if draft.name.trim().is_empty() {
        report.insert(BasicField::Name, "Name is required");
    }
    if draft.description.trim().is_empty() {
        report.insert(BasicField::Description, "Description is required");
    }
    if draft.season.is_none() {
        report.insert(BasicField::Season, "Select a season");
    }
    match draft.start_date {
        None => report.insert(BasicField::StartDate, "Start date is required"),
        Some(date) if date < ctx.today => report.insert(
            BasicField::StartDate,
            format!("Start date must be on or after {}", ctx.today.format("%Y-%m-%d")),
        ),
        Some(_) => {}
    }
    if draft.days < 1 {
        report.insert(BasicField::Days, "A trip must last at least 1 day");
    }
    if ctx.require_tickets && draft.tickets.unwrap_or(0) < 1 {
        report.insert(BasicField::Tickets, "At least 1 ticket must be offered");
    }
    match draft.price {
        None => report.insert(BasicField::Price, "Price is required"),
        Some(price) if !price.is_finite() || price < 0.0 => {
            report.insert(BasicField::Price, "Price must be zero or positive")
        }
        Some(_) => {}
    }
    if draft.discount_enabled {
        match draft.discount {
            None => report.insert(BasicField::Discount, "Discount is required when enabled"),
            Some(discount) if !discount.is_finite() || !(0.0..=100.0).contains(&discount) => {
                report.insert(BasicField::Discount, "Discount must be between 0 and 100")
            }
            Some(_) => {}
        }
    }
    if let Some(message) = image_requirement(images, ctx.mode) {
        report.insert(BasicField::Images, message);
    }

    report
}

fn image_requirement(images: &[ImageAsset], mode: WizardMode) -> Option<&'static str> {
    match mode {
        WizardMode::Create => {
            let usable = images
                .iter()
                .any(|asset| asset.is_new() && asset.file().map(|f| f.size() > 0).unwrap_or(false));
            (!usable).then_some("Attach at least one image")
        }
        WizardMode::Edit | WizardMode::Reactivate => {
            images.is_empty().then_some("Keep or attach at least one image")
        }
    }
}

pub fn validate_timeline(itinerary: &ItineraryModel) -> ValidationReport<TimelineKey> {
    let mut report = ValidationReport::new();

    for path in itinerary.paths() {
        let Some(section) = itinerary.section(path) else {
            continue;
        };
        let key = |field| TimelineKey { path, field };

        let time = section.time.trim();
        if time.is_empty() {
            report.insert(key(TimelineField::Time), "Time is required");
        } else if !is_clock_time(time) {
            report.insert(key(TimelineField::Time), "Use 24-hour HH:MM format");
        }
        if section.title.trim().is_empty() {
            report.insert(key(TimelineField::Title), "Title is required");
        }
        if section
            .description
            .iter()
            .any(|line| line.trim().is_empty())
        {
            report.insert(
                key(TimelineField::Description),
                "Description lines cannot be empty",
            );
        }
        if !section.has_location() {
            report.insert(key(TimelineField::Location), "Choose a location");
        }
    }

    report
}

/// Exactly two digits, a colon and two digits, naming a real time of day.
fn is_clock_time(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 5
        && bytes[2] == b':'
        && [0, 1, 3, 4].iter().all(|&i| bytes[i].is_ascii_digit())
        && NaiveTime::parse_from_str(text, "%H:%M").is_ok()
}

/// Improvement notes are free text and always pass.
pub fn validate_improvements(_text: &str) -> ValidationReport<ImprovementField> {
    ValidationReport::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{ImageAsset, ImageFile};
    use crate::domain::{ActivitySection, Season};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
    }

    fn ctx(mode: WizardMode) -> ValidationContext {
        ValidationContext {
            mode,
            today: today(),
            require_tickets: true,
        }
    }

    fn complete_draft() -> TripDraft {
        TripDraft {
            name: "Alpine Loop".into(),
            description: "Three passes in four days".into(),
            season: Some(Season::Summer),
            start_date: Some(today()),
            days: 4,
            tickets: Some(12),
            price: Some(890.0),
            discount: None,
            discount_enabled: false,
            ..TripDraft::default()
        }
    }

    fn photo() -> ImageAsset {
        ImageAsset::detached(ImageFile::new("pass.jpg", "image/jpeg", vec![1, 2, 3]))
    }

    #[test]
    fn complete_draft_passes() {
        let report = validate_basic(&complete_draft(), &[photo()], &ctx(WizardMode::Create));
        assert!(report.is_valid(), "{report:?}");
    }

    #[test]
    fn empty_name_and_zero_days_are_reported() {
        let draft = TripDraft {
            name: String::new(),
            days: 0,
            ..complete_draft()
        };
        let report = validate_basic(&draft, &[photo()], &ctx(WizardMode::Create));
        assert!(report.contains(&BasicField::Name));
        assert!(report.contains(&BasicField::Days));
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn past_start_date_is_rejected() {
        let draft = TripDraft {
            start_date: today().pred_opt(),
            ..complete_draft()
        };
        let report = validate_basic(&draft, &[photo()], &ctx(WizardMode::Create));
        assert_eq!(
            report.get(&BasicField::StartDate).unwrap().message,
            "Start date must be on or after 2026-05-01"
        );
    }

    #[test]
    fn tickets_rule_follows_context() {
        let draft = TripDraft {
            tickets: None,
            ..complete_draft()
        };
        let mut context = ctx(WizardMode::Create);
        assert!(validate_basic(&draft, &[photo()], &context).contains(&BasicField::Tickets));
        context.require_tickets = false;
        assert!(validate_basic(&draft, &[photo()], &context).is_valid());
    }

    #[test]
    fn discount_only_checked_when_enabled() {
        let mut draft = TripDraft {
            discount: Some(250.0),
            ..complete_draft()
        };
        assert!(validate_basic(&draft, &[photo()], &ctx(WizardMode::Create)).is_valid());

        draft.discount_enabled = true;
        let report = validate_basic(&draft, &[photo()], &ctx(WizardMode::Create));
        assert!(report.contains(&BasicField::Discount));

        draft.discount = None;
        let report = validate_basic(&draft, &[photo()], &ctx(WizardMode::Create));
        assert_eq!(
            report.get(&BasicField::Discount).unwrap().message,
            "Discount is required when enabled"
        );
    }

    #[test]
    fn negative_price_is_rejected() {
        let draft = TripDraft {
            price: Some(-1.0),
            ..complete_draft()
        };
        let report = validate_basic(&draft, &[photo()], &ctx(WizardMode::Create));
        assert!(report.contains(&BasicField::Price));
    }

    #[test]
    fn create_mode_needs_a_new_image_but_edit_accepts_existing() {
        let existing = ImageAsset::existing("https://cdn.example/trips/1.jpg");
        let draft = complete_draft();

        let report = validate_basic(&draft, &[existing], &ctx(WizardMode::Create));
        assert!(report.contains(&BasicField::Images));

        let existing = ImageAsset::existing("https://cdn.example/trips/1.jpg");
        let report = validate_basic(&draft, &[existing], &ctx(WizardMode::Edit));
        assert!(report.is_valid());

        let report = validate_basic(&draft, &[], &ctx(WizardMode::Reactivate));
        assert!(report.contains(&BasicField::Images));
    }

    #[test]
    fn blank_itinerary_reports_every_control() {
        let itinerary = ItineraryModel::with_days(1);
        let report = validate_timeline(&itinerary);
        let fields: Vec<TimelineField> = report.keys().map(|key| key.field).collect();
        assert_eq!(
            fields,
            vec![
                TimelineField::Time,
                TimelineField::Title,
                TimelineField::Description,
                TimelineField::Location
            ]
        );
    }

    #[test]
    fn timeline_errors_point_at_the_offending_section() {
        let mut itinerary = ItineraryModel::from_timelines(vec![crate::domain::DayTimeline {
            day: 1,
            sections: vec![ActivitySection {
                time: "08:30".into(),
                title: "Breakfast".into(),
                description: vec!["Buffet".into()],
                latitude: Some("45.1".into()),
                longitude: Some("6.2".into()),
            }],
        }]);
        itinerary.resize_to_days(2);
        itinerary
            .set_section_field(
                SectionPath::new(1, 0),
                crate::domain::SectionField::Time,
                Some("25:99".into()),
            )
            .unwrap();

        let report = validate_timeline(&itinerary);
        assert!(report.keys().all(|key| key.path == SectionPath::new(1, 0)));
        assert_eq!(
            report
                .get(&TimelineKey::new(1, 0, TimelineField::Time))
                .unwrap()
                .message,
            "Use 24-hour HH:MM format"
        );
    }

    #[test]
    fn times_must_be_zero_padded() {
        for time in ["9:5", "9:05", "09:5", "0905", "09:05:00", "24:00"] {
            assert!(!is_clock_time(time), "{time} accepted");
        }
        for time in ["00:00", "09:05", "23:59"] {
            assert!(is_clock_time(time), "{time} rejected");
        }

        let mut itinerary = ItineraryModel::with_days(1);
        itinerary
            .set_section_field(
                SectionPath::new(0, 0),
                crate::domain::SectionField::Time,
                Some("9:5".into()),
            )
            .unwrap();
        let report = validate_timeline(&itinerary);
        assert_eq!(
            report
                .get(&TimelineKey::new(0, 0, TimelineField::Time))
                .unwrap()
                .message,
            "Use 24-hour HH:MM format"
        );
    }

    #[test]
    fn a_blank_description_line_fails_even_next_to_filled_ones() {
        let mut itinerary = ItineraryModel::from_timelines(vec![crate::domain::DayTimeline {
            day: 1,
            sections: vec![ActivitySection {
                time: "08:30".into(),
                title: "Breakfast".into(),
                description: vec!["Buffet".into(), "   ".into()],
                latitude: Some("45.1".into()),
                longitude: Some("6.2".into()),
            }],
        }]);
        let report = validate_timeline(&itinerary);
        assert_eq!(report.len(), 1);
        assert!(report.contains(&TimelineKey::new(0, 0, TimelineField::Description)));

        itinerary
            .remove_description_line(SectionPath::new(0, 0), 1)
            .unwrap();
        assert!(validate_timeline(&itinerary).is_valid());
    }

    #[test]
    fn improvements_never_fail() {
        assert!(validate_improvements("").is_valid());
        assert!(validate_improvements("\n\n").is_valid());
    }
}
