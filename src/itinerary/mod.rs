//! Day-by-day itinerary collection.
//!
//! Every structural change to the list of days goes through
//! [`ItineraryModel::resize_to_days`], so the day count and the number of
//! timelines can never be observed out of step. Days and sections are addressed
//! through [`SectionPath`] and positional mistakes come back as
//! [`ItineraryError`] values.

use tracing::debug;

use crate::domain::{ActivitySection, DayTimeline, SectionField, SectionPath};
use crate::errors::ItineraryError;

/// Result of a resize: how many days were appended and which ones were cut.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResizeOutcome {
    pub added: usize,
    pub discarded: Vec<DayTimeline>,
}

impl ResizeOutcome {
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.discarded.is_empty()
    }

    /// Number of discarded sections that carried user input.
    pub fn discarded_filled_sections(&self) -> usize {
        self.discarded
            .iter()
            .flat_map(|day| day.sections.iter())
            .filter(|section| !section.is_blank())
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItineraryModel {
    days: Vec<DayTimeline>,
}

impl ItineraryModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_days(count: usize) -> Self {
        let mut model = Self::new();
        model.resize_to_days(count);
        model
    }

    /// Adopts externally supplied timelines, renumbering them by position and
    /// restoring the one-section / one-line minimums.
    pub fn from_timelines(timelines: Vec<DayTimeline>) -> Self {
        let mut days = timelines;
        for (index, day) in days.iter_mut().enumerate() {
            day.day = day_number(index);
            if day.sections.is_empty() {
                day.sections.push(ActivitySection::default());
            }
            for section in &mut day.sections {
                section.normalize();
            }
        }
        Self { days }
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn days(&self) -> &[DayTimeline] {
        &self.days
    }

    pub fn day(&self, day: usize) -> Option<&DayTimeline> {
        self.days.get(day)
    }

    pub fn section(&self, path: SectionPath) -> Option<&ActivitySection> {
        self.days
            .get(path.day)
            .and_then(|day| day.sections.get(path.section))
    }

    pub fn contains(&self, path: SectionPath) -> bool {
        self.section(path).is_some()
    }

    pub fn paths(&self) -> impl Iterator<Item = SectionPath> + '_ {
        self.days.iter().enumerate().flat_map(|(day, timeline)| {
            (0..timeline.sections.len()).map(move |section| SectionPath::new(day, section))
        })
    }

    /// Grows or truncates the itinerary to exactly `count` days.
    ///
    /// New days carry one default section. Truncation drops the trailing days and
    /// hands them back in the outcome.
    pub fn resize_to_days(&mut self, count: usize) -> ResizeOutcome {
        let current = self.days.len();
        let mut outcome = ResizeOutcome::default();
        if count > current {
            self.days
                .extend((current..count).map(|index| DayTimeline::new(day_number(index))));
            outcome.added = count - current;
        } else if count < current {
            outcome.discarded = self.days.split_off(count);
        }
        if !outcome.is_noop() {
            debug!(
                from = current,
                to = count,
                added = outcome.added,
                discarded = outcome.discarded.len(),
                "itinerary resized"
            );
        }
        outcome
    }

    pub fn add_section(&mut self, day: usize) -> Result<SectionPath, ItineraryError> {
        let timeline = self.day_mut(day)?;
        timeline.sections.push(ActivitySection::default());
        Ok(SectionPath::new(day, timeline.sections.len() - 1))
    }

    pub fn remove_section(&mut self, path: SectionPath) -> Result<ActivitySection, ItineraryError> {
        let timeline = self.day_mut(path.day)?;
        if path.section >= timeline.sections.len() {
            return Err(ItineraryError::SectionOutOfRange(path));
        }
        if timeline.sections.len() == 1 {
            return Err(ItineraryError::LastSection(path.day));
        }
        Ok(timeline.sections.remove(path.section))
    }

    pub fn set_section_field(
        &mut self,
        path: SectionPath,
        field: SectionField,
        value: Option<String>,
    ) -> Result<(), ItineraryError> {
        self.section_mut(path)?.set_field(field, value);
        Ok(())
    }

    pub fn add_description_line(&mut self, path: SectionPath) -> Result<usize, ItineraryError> {
        let section = self.section_mut(path)?;
        section.description.push(String::new());
        Ok(section.description.len() - 1)
    }

    pub fn remove_description_line(
        &mut self,
        path: SectionPath,
        line: usize,
    ) -> Result<String, ItineraryError> {
        let section = self.section_mut(path)?;
        if line >= section.description.len() {
            return Err(ItineraryError::LineOutOfRange { path, line });
        }
        if section.description.len() == 1 {
            return Err(ItineraryError::LastDescriptionLine(path));
        }
        Ok(section.description.remove(line))
    }

    pub fn set_description_line(
        &mut self,
        path: SectionPath,
        line: usize,
        value: impl Into<String>,
    ) -> Result<(), ItineraryError> {
        let section = self.section_mut(path)?;
        let slot = section
            .description
            .get_mut(line)
            .ok_or(ItineraryError::LineOutOfRange { path, line })?;
        *slot = value.into();
        Ok(())
    }

    fn day_mut(&mut self, day: usize) -> Result<&mut DayTimeline, ItineraryError> {
        self.days
            .get_mut(day)
            .ok_or(ItineraryError::DayOutOfRange(day))
    }

    fn section_mut(&mut self, path: SectionPath) -> Result<&mut ActivitySection, ItineraryError> {
        self.day_mut(path.day)?
            .sections
            .get_mut(path.section)
            .ok_or(ItineraryError::SectionOutOfRange(path))
    }
}

fn day_number(index: usize) -> u32 {
    index as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_section(title: &str) -> ActivitySection {
        ActivitySection {
            time: "09:00".into(),
            title: title.into(),
            description: vec!["Meet at the lobby".into()],
            latitude: Some("46.68".into()),
            longitude: Some("7.86".into()),
        }
    }

    #[test]
    fn resize_matches_requested_length() {
        let mut model = ItineraryModel::new();
        for count in [1, 4, 7, 2, 9, 1] {
            model.resize_to_days(count);
            assert_eq!(model.len(), count);
            let numbers: Vec<u32> = model.days().iter().map(|day| day.day).collect();
            let expected: Vec<u32> = (1..=count as u32).collect();
            assert_eq!(numbers, expected);
        }
    }

    #[test]
    fn single_day_has_one_default_section() {
        let model = ItineraryModel::with_days(1);
        assert_eq!(model.len(), 1);
        assert_eq!(model.days()[0].sections, vec![ActivitySection::default()]);
    }

    #[test]
    fn resizing_twice_to_the_same_count_is_a_noop() {
        let mut model = ItineraryModel::with_days(3);
        model
            .set_section_field(SectionPath::new(1, 0), SectionField::Title, Some("Lake".into()))
            .unwrap();
        model.resize_to_days(3);
        let snapshot = model.clone();
        let outcome = model.resize_to_days(3);
        assert!(outcome.is_noop());
        assert_eq!(model, snapshot);
    }

    #[test]
    fn growing_keeps_existing_days_and_appends_defaults() {
        let mut model = ItineraryModel::with_days(2);
        model.days[0].sections[0] = filled_section("Arrival");
        model.days[1].sections[0] = filled_section("Glacier");
        let before = model.days()[..2].to_vec();

        let outcome = model.resize_to_days(5);

        assert_eq!(outcome.added, 3);
        assert_eq!(model.len(), 5);
        assert_eq!(&model.days()[..2], before.as_slice());
        for (index, day) in model.days()[2..].iter().enumerate() {
            assert_eq!(*day, DayTimeline::new(index as u32 + 3));
        }
    }

    #[test]
    fn shrinking_discards_trailing_days() {
        let mut model = ItineraryModel::with_days(5);
        model.days[3].sections[0] = filled_section("Wine tasting");

        let outcome = model.resize_to_days(2);

        assert_eq!(model.len(), 2);
        assert_eq!(outcome.discarded.len(), 3);
        assert_eq!(outcome.discarded[1].sections[0].title, "Wine tasting");
        assert_eq!(outcome.discarded_filled_sections(), 1);
    }

    #[test]
    fn last_section_cannot_be_removed() {
        let mut model = ItineraryModel::with_days(1);
        let err = model.remove_section(SectionPath::new(0, 0)).unwrap_err();
        assert_eq!(err, ItineraryError::LastSection(0));

        let added = model.add_section(0).unwrap();
        assert_eq!(added, SectionPath::new(0, 1));
        model.remove_section(SectionPath::new(0, 0)).unwrap();
        assert_eq!(model.days()[0].sections.len(), 1);
    }

    #[test]
    fn description_lines_keep_at_least_one_entry() {
        let mut model = ItineraryModel::with_days(1);
        let path = SectionPath::new(0, 0);
        let err = model.remove_description_line(path, 0).unwrap_err();
        assert_eq!(err, ItineraryError::LastDescriptionLine(path));

        let line = model.add_description_line(path).unwrap();
        model.set_description_line(path, line, "Lunch").unwrap();
        let removed = model.remove_description_line(path, 0).unwrap();
        assert_eq!(removed, "");
        assert_eq!(model.section(path).unwrap().description, vec!["Lunch"]);
    }

    #[test]
    fn out_of_range_addresses_are_reported() {
        let mut model = ItineraryModel::with_days(2);
        assert_eq!(model.add_section(4), Err(ItineraryError::DayOutOfRange(4)));
        let path = SectionPath::new(1, 3);
        assert_eq!(
            model.set_section_field(path, SectionField::Time, Some("10:00".into())),
            Err(ItineraryError::SectionOutOfRange(path))
        );
        assert_eq!(
            model.set_description_line(SectionPath::new(0, 0), 2, "x"),
            Err(ItineraryError::LineOutOfRange {
                path: SectionPath::new(0, 0),
                line: 2
            })
        );
    }

    #[test]
    fn adopted_timelines_are_renumbered_and_repaired() {
        let model = ItineraryModel::from_timelines(vec![
            DayTimeline {
                day: 7,
                sections: Vec::new(),
            },
            DayTimeline {
                day: 3,
                sections: vec![ActivitySection {
                    description: Vec::new(),
                    ..filled_section("Museum")
                }],
            },
        ]);
        assert_eq!(model.days()[0].day, 1);
        assert_eq!(model.days()[0].sections.len(), 1);
        assert_eq!(model.days()[1].day, 2);
        assert_eq!(model.days()[1].sections[0].description, vec![String::new()]);
    }

    #[test]
    fn paths_enumerate_every_section() {
        let mut model = ItineraryModel::with_days(2);
        model.add_section(1).unwrap();
        let paths: Vec<SectionPath> = model.paths().collect();
        assert_eq!(
            paths,
            vec![
                SectionPath::new(0, 0),
                SectionPath::new(1, 0),
                SectionPath::new(1, 1)
            ]
        );
    }
}
