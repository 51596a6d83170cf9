use serde::{Deserialize, Serialize};

use crate::domain::SectionPath;

/// A point chosen in the map picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSelection {
    pub latitude: String,
    pub longitude: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl LocationSelection {
    pub fn new(latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        Self {
            latitude: latitude.into(),
            longitude: longitude.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Claim on the result of one background location lookup.
///
/// Tickets carry the epoch of the session that issued them; once the wizard
/// closes or lookups are cancelled the epoch moves on and older tickets are
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationTicket {
    pub(crate) path: SectionPath,
    pub(crate) epoch: u64,
}

impl LocationTicket {
    pub fn path(&self) -> SectionPath {
        self.path
    }
}
