//! File-based persistence for accepted trips.

pub mod json_backend;

use crate::errors::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;

pub use json_backend::{load_initial_data, FsAssetFetcher, JsonOutbox, PAYLOAD_FILE};
