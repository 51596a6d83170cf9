#![doc(test(attr(deny(warnings))))]

//! Trip Composer drives the multi-step wizard that tourism operators use to
//! create, edit and reactivate trips: basic information, a day-by-day
//! itinerary, and optional improvement notes, ending in a normalised payload.

pub mod assets;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod itinerary;
pub mod payload;
pub mod storage;
pub mod utils;
pub mod validation;
pub mod wizard;

use std::sync::Once;

pub use domain::{InitialTripData, Season, SectionPath, TripDraft, WizardMode};
pub use payload::TripPayload;
pub use wizard::{StepOutcome, TripSink, WizardController, WizardOptions, WizardStep};

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Trip Composer tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
