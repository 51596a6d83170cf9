use std::path::PathBuf;

use thiserror::Error;

use crate::domain::SectionPath;

/// Positional misuse of the itinerary collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItineraryError {
    #[error("Day {0} does not exist")]
    DayOutOfRange(usize),
    #[error("Section {} of day {} does not exist", .0.section + 1, .0.day + 1)]
    SectionOutOfRange(SectionPath),
    #[error("Description line {line} does not exist in section {} of day {}", .path.section + 1, .path.day + 1)]
    LineOutOfRange { path: SectionPath, line: usize },
    #[error("Day {} must keep at least one section", .0 + 1)]
    LastSection(usize),
    #[error("Section {} of day {} must keep at least one description line", .0.section + 1, .0.day + 1)]
    LastDescriptionLine(SectionPath),
}

/// Failures raised by wizard operations that are not validation outcomes.
#[derive(Debug, Error)]
pub enum WizardError {
    #[error("The wizard has been closed")]
    Closed,
    #[error("A submission is already in progress")]
    SubmissionPending,
    #[error("No submission is in progress")]
    NoPendingSubmission,
    #[error(transparent)]
    Itinerary(#[from] ItineraryError),
}

/// Problems with a single image file. The offending file is skipped, never the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("Image `{0}` is empty")]
    Empty(String),
    #[error("Image `{name}` has unsupported type `{content_type}`")]
    Unsupported { name: String, content_type: String },
    #[error("Image `{name}` could not be read: {reason}")]
    Unreadable { name: String, reason: String },
}

/// Failure reported by the persistence collaborator.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Submission rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors raised by the on-disk outbox and trip files.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Trip file `{0}` not found")]
    NotFound(PathBuf),
    #[error("Image name `{0}` is not a plain file name")]
    InvalidFileName(String),
}

/// Errors raised while loading or storing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(String),
}
