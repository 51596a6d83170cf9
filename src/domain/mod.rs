//! Draft data shared by the wizard, the validators, and the payload builder.

pub mod timeline;
pub mod trip;

pub use timeline::{ActivitySection, DayTimeline, SectionField, SectionPath};
pub use trip::{InitialTripData, Season, TripDraft, WizardMode};
