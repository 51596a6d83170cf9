//! Step state machine for composing a trip.
//!
//! The controller owns the draft, the itinerary, and the attached images for
//! the lifetime of one wizard session. Forward moves run the full validation
//! for the step being left; a failed check is an ordinary
//! [`StepOutcome::Blocked`] and leaves the session where it was. The terminal
//! move builds a [`TripPayload`] and parks the session in a pending state until
//! the persistence collaborator reports back.

mod location;

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::assets::{AssetFetcher, ImageAssetManager, ImageFile, PreviewRegistry};
use crate::config::Config;
use crate::domain::{
    InitialTripData, Season, SectionField, SectionPath, TripDraft, WizardMode,
};
use crate::errors::{AssetError, SubmissionError, WizardError};
use crate::itinerary::{ItineraryModel, ResizeOutcome};
use crate::payload::{PayloadBuilder, TripPayload};
use crate::utils::time::Clock;
use crate::validation::{
    validate_basic, validate_improvements, validate_timeline, BasicField, StepErrors,
    TimelineField, TimelineKey, ValidationContext, ValidationReport,
};

pub use location::{LocationSelection, LocationTicket};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Basic,
    Timeline,
    Improvements,
    Closed,
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Basic => "Basic information",
            Self::Timeline => "Timeline",
            Self::Improvements => "Improvements",
            Self::Closed => "Closed",
        };
        f.write_str(label)
    }
}

/// What happened when the user asked to move forward.
#[derive(Debug)]
pub enum StepOutcome {
    /// The wizard now shows this step.
    Moved(WizardStep),
    /// Validation failed; the wizard stayed on its step.
    Blocked(StepErrors),
    /// The payload is ready for the persistence collaborator. The session is
    /// pending until [`WizardController::finish_submission`] is called.
    Submit(TripPayload),
    /// A submission is still in flight; nothing was done.
    Pending,
    /// The sink accepted the payload and the wizard closed.
    Saved(TripPayload),
    /// The sink refused the payload; the draft is untouched.
    Rejected(SubmissionError),
}

/// Receiver of the wizard's two terminal events.
pub trait TripSink {
    fn on_save(&mut self, payload: &TripPayload) -> Result<(), SubmissionError>;

    fn on_close(&mut self) {}
}

/// Rules and defaults that come from configuration rather than from the user.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardOptions {
    pub today: NaiveDate,
    pub require_tickets: bool,
    pub allowed_image_types: Vec<String>,
    pub default_season: Option<Season>,
    pub default_days: u32,
}

impl WizardOptions {
    pub fn new(today: NaiveDate) -> Self {
        Self::from_config(&Config::default(), today)
    }

    pub fn from_config(config: &Config, today: NaiveDate) -> Self {
        Self {
            today,
            require_tickets: config.require_tickets,
            allowed_image_types: config.allowed_image_types.clone(),
            default_season: config.default_season,
            default_days: config.default_days.max(1),
        }
    }

    pub fn with_clock(config: &Config, clock: &dyn Clock) -> Self {
        Self::from_config(config, clock.today())
    }
}

pub struct WizardController {
    mode: WizardMode,
    step: WizardStep,
    options: WizardOptions,
    draft: TripDraft,
    itinerary: ItineraryModel,
    improvements: String,
    assets: ImageAssetManager,
    fetcher: Option<Box<dyn AssetFetcher>>,
    basic_errors: ValidationReport<BasicField>,
    timeline_errors: ValidationReport<TimelineKey>,
    pending: bool,
    lookup_epoch: u64,
}

impl fmt::Debug for WizardController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WizardController")
            .field("mode", &self.mode)
            .field("step", &self.step)
            .field("draft", &self.draft)
            .field("days", &self.itinerary.len())
            .field("images", &self.assets.len())
            .field("pending", &self.pending)
            .finish()
    }
}

impl WizardController {
    /// Opens a create-mode session seeded from configuration defaults.
    pub fn create(options: WizardOptions, registry: Arc<dyn PreviewRegistry>) -> Self {
        Self::open(WizardMode::Create, None, options, registry)
    }

    /// Opens a session. Initial data is only consumed in edit and reactivate mode.
    pub fn open(
        mode: WizardMode,
        initial: Option<InitialTripData>,
        options: WizardOptions,
        registry: Arc<dyn PreviewRegistry>,
    ) -> Self {
        let mut assets = ImageAssetManager::new(registry, options.allowed_image_types.clone());
        let (draft, itinerary, improvements) = match (mode, initial) {
            (WizardMode::Create, initial) => {
                if initial.is_some() {
                    debug!("initial data ignored in create mode");
                }
                let draft = TripDraft {
                    season: options.default_season,
                    days: options.default_days,
                    ..TripDraft::default()
                };
                (draft, ItineraryModel::new(), String::new())
            }
            (_, Some(initial)) => {
                for source in &initial.images {
                    assets.add_existing(source.clone());
                }
                (
                    initial.to_draft(),
                    ItineraryModel::from_timelines(initial.timelines.clone()),
                    initial.improvements.join("\n"),
                )
            }
            (_, None) => (TripDraft::default(), ItineraryModel::new(), String::new()),
        };

        let mut controller = Self {
            mode,
            step: WizardStep::Basic,
            options,
            draft,
            itinerary,
            improvements,
            assets,
            fetcher: None,
            basic_errors: ValidationReport::new(),
            timeline_errors: ValidationReport::new(),
            pending: false,
            lookup_epoch: 0,
        };
        controller.sync_itinerary();
        info!(
            mode = %controller.mode,
            days = controller.draft.days,
            images = controller.assets.len(),
            "trip wizard opened"
        );
        controller
    }

    /// Supplies the collaborator used to fetch existing images before submission.
    pub fn with_asset_fetcher(mut self, fetcher: Box<dyn AssetFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn mode(&self) -> WizardMode {
        self.mode
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn is_open(&self) -> bool {
        self.step != WizardStep::Closed
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn draft(&self) -> &TripDraft {
        &self.draft
    }

    pub fn itinerary(&self) -> &ItineraryModel {
        &self.itinerary
    }

    pub fn improvements(&self) -> &str {
        &self.improvements
    }

    pub fn assets(&self) -> &ImageAssetManager {
        &self.assets
    }

    pub fn options(&self) -> &WizardOptions {
        &self.options
    }

    pub fn basic_errors(&self) -> &ValidationReport<BasicField> {
        &self.basic_errors
    }

    pub fn timeline_errors(&self) -> &ValidationReport<TimelineKey> {
        &self.timeline_errors
    }

    pub fn validation_context(&self) -> ValidationContext {
        ValidationContext {
            mode: self.mode,
            today: self.options.today,
            require_tickets: self.options.require_tickets,
        }
    }

    // Basic information

    pub fn set_name(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        self.edit_basic(BasicField::Name, |draft| draft.name = value.into())
    }

    pub fn set_description(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        self.edit_basic(BasicField::Description, |draft| {
            draft.description = value.into()
        })
    }

    pub fn set_season(&mut self, season: Option<Season>) -> Result<(), WizardError> {
        self.edit_basic(BasicField::Season, |draft| draft.season = season)
    }

    pub fn set_start_date(&mut self, date: Option<NaiveDate>) -> Result<(), WizardError> {
        self.edit_basic(BasicField::StartDate, |draft| draft.start_date = date)
    }

    /// Updates the day count and resizes the itinerary to match.
    ///
    /// A count of zero is recorded for validation but leaves the itinerary alone.
    pub fn set_days(&mut self, days: u32) -> Result<(), WizardError> {
        self.edit_basic(BasicField::Days, |draft| draft.days = days)?;
        self.sync_itinerary();
        Ok(())
    }

    pub fn set_tickets(&mut self, tickets: Option<u32>) -> Result<(), WizardError> {
        self.edit_basic(BasicField::Tickets, |draft| draft.tickets = tickets)
    }

    pub fn set_price(&mut self, price: Option<f64>) -> Result<(), WizardError> {
        self.edit_basic(BasicField::Price, |draft| draft.price = price)
    }

    pub fn set_discount(&mut self, discount: Option<f64>) -> Result<(), WizardError> {
        self.edit_basic(BasicField::Discount, |draft| draft.discount = discount)
    }

    pub fn set_discount_enabled(&mut self, enabled: bool) -> Result<(), WizardError> {
        self.edit_basic(BasicField::Discount, |draft| {
            draft.discount_enabled = enabled
        })
    }

    pub fn add_tag(&mut self, tag: &str) -> Result<bool, WizardError> {
        self.ensure_open()?;
        Ok(self.draft.add_tag(tag))
    }

    pub fn remove_tag(&mut self, tag: &str) -> Result<bool, WizardError> {
        self.ensure_open()?;
        Ok(self.draft.remove_tag(tag))
    }

    fn edit_basic(
        &mut self,
        field: BasicField,
        apply: impl FnOnce(&mut TripDraft),
    ) -> Result<(), WizardError> {
        self.ensure_open()?;
        apply(&mut self.draft);
        self.basic_errors.remove(&field);
        debug!(field = %field, "basic field updated");
        Ok(())
    }

    // Images

    /// Attaches local files; rejected files are returned and skipped.
    pub fn add_images(
        &mut self,
        files: impl IntoIterator<Item = ImageFile>,
    ) -> Result<Vec<AssetError>, WizardError> {
        self.ensure_open()?;
        let rejected = self.assets.add_files(files);
        if !self.assets.is_empty() {
            self.basic_errors.remove(&BasicField::Images);
        }
        Ok(rejected)
    }

    /// Removes an image and releases its preview. Unknown indexes are ignored.
    pub fn remove_image(&mut self, index: usize) -> Result<bool, WizardError> {
        self.ensure_open()?;
        Ok(self.assets.remove_at(index))
    }

    // Timeline

    pub fn add_section(&mut self, day: usize) -> Result<SectionPath, WizardError> {
        self.ensure_open()?;
        Ok(self.itinerary.add_section(day)?)
    }

    pub fn remove_section(&mut self, path: SectionPath) -> Result<(), WizardError> {
        self.ensure_open()?;
        self.itinerary.remove_section(path)?;
        self.timeline_errors.remap(|key| {
            if key.path.day != path.day || key.path.section < path.section {
                Some(*key)
            } else if key.path.section == path.section {
                None
            } else {
                Some(TimelineKey::new(key.path.day, key.path.section - 1, key.field))
            }
        });
        self.cancel_location_lookups();
        Ok(())
    }

    pub fn set_section_field(
        &mut self,
        path: SectionPath,
        field: SectionField,
        value: Option<String>,
    ) -> Result<(), WizardError> {
        self.ensure_open()?;
        self.itinerary.set_section_field(path, field, value)?;
        let error_field = match field {
            SectionField::Time => TimelineField::Time,
            SectionField::Title => TimelineField::Title,
            SectionField::Latitude | SectionField::Longitude => TimelineField::Location,
        };
        self.timeline_errors
            .remove(&TimelineKey { path, field: error_field });
        Ok(())
    }

    pub fn add_description_line(&mut self, path: SectionPath) -> Result<usize, WizardError> {
        self.ensure_open()?;
        Ok(self.itinerary.add_description_line(path)?)
    }

    pub fn remove_description_line(
        &mut self,
        path: SectionPath,
        line: usize,
    ) -> Result<(), WizardError> {
        self.ensure_open()?;
        self.itinerary.remove_description_line(path, line)?;
        self.clear_description_error(path);
        Ok(())
    }

    pub fn set_description_line(
        &mut self,
        path: SectionPath,
        line: usize,
        value: impl Into<String>,
    ) -> Result<(), WizardError> {
        self.ensure_open()?;
        self.itinerary.set_description_line(path, line, value)?;
        self.clear_description_error(path);
        Ok(())
    }

    fn clear_description_error(&mut self, path: SectionPath) {
        self.timeline_errors.remove(&TimelineKey {
            path,
            field: TimelineField::Description,
        });
    }

    /// Applies a map selection to a section right away.
    pub fn apply_location(
        &mut self,
        path: SectionPath,
        selection: &LocationSelection,
    ) -> Result<(), WizardError> {
        self.set_section_field(path, SectionField::Latitude, Some(selection.latitude.clone()))?;
        self.set_section_field(
            path,
            SectionField::Longitude,
            Some(selection.longitude.clone()),
        )
    }

    /// Starts a background lookup whose result may later be fed to
    /// [`resolve_location`](Self::resolve_location).
    pub fn begin_location_lookup(&self, path: SectionPath) -> Result<LocationTicket, WizardError> {
        self.ensure_open()?;
        if !self.itinerary.contains(path) {
            return Err(crate::errors::ItineraryError::SectionOutOfRange(path).into());
        }
        Ok(LocationTicket {
            path,
            epoch: self.lookup_epoch,
        })
    }

    /// Applies a finished lookup. Returns `false` when the ticket is stale.
    pub fn resolve_location(
        &mut self,
        ticket: LocationTicket,
        selection: &LocationSelection,
    ) -> bool {
        if !self.is_open() || ticket.epoch != self.lookup_epoch {
            debug!(path = %ticket.path, "stale location result dropped");
            return false;
        }
        self.apply_location(ticket.path, selection).is_ok()
    }

    /// Invalidates every outstanding lookup ticket.
    pub fn cancel_location_lookups(&mut self) {
        self.lookup_epoch = self.lookup_epoch.wrapping_add(1);
    }

    // Improvements

    pub fn set_improvements(&mut self, text: impl Into<String>) -> Result<(), WizardError> {
        self.ensure_open()?;
        self.improvements = text.into();
        Ok(())
    }

    // Navigation

    /// Tries to move forward from the current step.
    pub fn advance(&mut self) -> Result<StepOutcome, WizardError> {
        self.ensure_open()?;
        if self.pending {
            return Ok(StepOutcome::Pending);
        }

        match self.step {
            WizardStep::Basic => {
                let report = validate_basic(
                    &self.draft,
                    self.assets.assets(),
                    &self.validation_context(),
                );
                if !report.is_valid() {
                    self.basic_errors = report.clone();
                    return Ok(self.blocked(StepErrors::Basic(report)));
                }
                self.basic_errors.clear();
                self.sync_itinerary();
                Ok(self.move_to(WizardStep::Timeline))
            }
            WizardStep::Timeline => {
                if let Some(blocked) = self.check_timeline() {
                    return Ok(blocked);
                }
                if self.mode.has_improvements() {
                    Ok(self.move_to(WizardStep::Improvements))
                } else {
                    Ok(self.begin_submission())
                }
            }
            WizardStep::Improvements => {
                debug_assert!(validate_improvements(&self.improvements).is_valid());
                if let Some(blocked) = self.check_timeline() {
                    return Ok(blocked);
                }
                Ok(self.begin_submission())
            }
            WizardStep::Closed => Err(WizardError::Closed),
        }
    }

    /// Runs [`advance`](Self::advance) and, on the terminal step, hands the payload
    /// to `sink` synchronously.
    pub fn advance_with(&mut self, sink: &mut dyn TripSink) -> Result<StepOutcome, WizardError> {
        match self.advance()? {
            StepOutcome::Submit(payload) => match sink.on_save(&payload) {
                Ok(()) => {
                    self.finish_submission(Ok(()))?;
                    sink.on_close();
                    Ok(StepOutcome::Saved(payload))
                }
                Err(err) => {
                    warn!(error = %err, "trip submission failed");
                    self.pending = false;
                    Ok(StepOutcome::Rejected(err))
                }
            },
            other => Ok(other),
        }
    }

    /// Settles a submission started by [`advance`](Self::advance).
    pub fn finish_submission(
        &mut self,
        outcome: Result<(), SubmissionError>,
    ) -> Result<(), WizardError> {
        if !self.pending {
            return Err(WizardError::NoPendingSubmission);
        }
        self.pending = false;
        match outcome {
            Ok(()) => {
                info!(mode = %self.mode, "trip submission accepted");
                self.close();
            }
            Err(err) => warn!(error = %err, "trip submission failed"),
        }
        Ok(())
    }

    /// Steps back without touching any entered data.
    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        self.ensure_open()?;
        let previous = match self.step {
            WizardStep::Improvements => WizardStep::Timeline,
            WizardStep::Timeline | WizardStep::Basic => WizardStep::Basic,
            WizardStep::Closed => return Err(WizardError::Closed),
        };
        if previous != self.step {
            debug!(from = %self.step, to = %previous, "wizard moved back");
            self.step = previous;
        }
        Ok(previous)
    }

    /// Abandons the session from any step.
    pub fn cancel(&mut self) -> Result<(), WizardError> {
        if self.pending {
            return Err(WizardError::SubmissionPending);
        }
        if !self.is_open() {
            return Ok(());
        }
        info!(mode = %self.mode, step = %self.step, "trip wizard cancelled");
        self.close();
        Ok(())
    }

    /// Cancels and notifies `sink` that the wizard closed.
    pub fn cancel_with(&mut self, sink: &mut dyn TripSink) -> Result<(), WizardError> {
        let was_open = self.is_open();
        self.cancel()?;
        if was_open {
            sink.on_close();
        }
        Ok(())
    }

    fn close(&mut self) {
        self.assets.release_all();
        self.cancel_location_lookups();
        self.draft = TripDraft::default();
        self.itinerary = ItineraryModel::new();
        self.improvements.clear();
        self.basic_errors.clear();
        self.timeline_errors.clear();
        self.step = WizardStep::Closed;
        debug!("trip wizard closed");
    }

    fn check_timeline(&mut self) -> Option<StepOutcome> {
        let report = validate_timeline(&self.itinerary);
        if report.is_valid() {
            self.timeline_errors.clear();
            None
        } else {
            self.timeline_errors = report.clone();
            Some(self.blocked(StepErrors::Timeline(report)))
        }
    }

    fn begin_submission(&mut self) -> StepOutcome {
        if let Some(blocked) = self.check_image_binaries() {
            return blocked;
        }
        let improvements = self
            .mode
            .has_improvements()
            .then_some(self.improvements.as_str());
        let payload = PayloadBuilder::build(
            &self.draft,
            self.itinerary.days(),
            improvements,
            self.mode,
            self.assets.file_backed(),
        );
        self.pending = true;
        info!(
            mode = %self.mode,
            days = payload.timelines.len(),
            sections = payload.section_count(),
            images = payload.images.len(),
            "trip submission started"
        );
        StepOutcome::Submit(payload)
    }

    /// Fetches binaries for kept images. Any image left without one blocks
    /// the submission under [`BasicField::Images`].
    fn check_image_binaries(&mut self) -> Option<StepOutcome> {
        if let Some(fetcher) = self.fetcher.as_deref() {
            self.assets.materialize_existing(fetcher);
        }
        let missing: Vec<String> = self
            .assets
            .assets()
            .iter()
            .filter(|asset| asset.file().is_none())
            .map(|asset| asset.label())
            .collect();
        let message = if !missing.is_empty() {
            format!("Could not load image(s): {}", missing.join(", "))
        } else if self.assets.is_empty() {
            "Keep or attach at least one image".to_string()
        } else {
            return None;
        };
        self.basic_errors.insert(BasicField::Images, message.clone());
        let mut report = ValidationReport::new();
        report.insert(BasicField::Images, message);
        Some(self.blocked(StepErrors::Basic(report)))
    }

    fn blocked(&self, errors: StepErrors) -> StepOutcome {
        warn!(step = %self.step, errors = errors.len(), "step transition blocked");
        StepOutcome::Blocked(errors)
    }

    fn move_to(&mut self, next: WizardStep) -> StepOutcome {
        debug!(from = %self.step, to = %next, "wizard advanced");
        self.step = next;
        StepOutcome::Moved(next)
    }

    /// Brings the itinerary length in line with the day count.
    fn sync_itinerary(&mut self) {
        let target = self.draft.days as usize;
        if target == 0 || target == self.itinerary.len() {
            return;
        }
        let outcome = self.itinerary.resize_to_days(target);
        self.after_resize(&outcome);
    }

    fn after_resize(&mut self, outcome: &ResizeOutcome) {
        if outcome.discarded.is_empty() {
            return;
        }
        let lost = outcome.discarded_filled_sections();
        if lost > 0 {
            warn!(
                days = outcome.discarded.len(),
                sections = lost,
                "shrinking the trip discarded filled itinerary sections"
            );
        }
        let len = self.itinerary.len();
        self.timeline_errors.retain(|key| key.path.day < len);
        self.cancel_location_lookups();
    }

    fn ensure_open(&self) -> Result<(), WizardError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(WizardError::Closed)
        }
    }
}
