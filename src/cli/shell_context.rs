use std::path::PathBuf;

use dialoguer::theme::ColorfulTheme;

use crate::{
    config::ConfigManager,
    domain::WizardMode,
    storage::JsonOutbox,
    wizard::WizardController,
};

use super::commands::CommandRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

/// Which session the shell opens, as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    pub mode: WizardMode,
    pub trip_file: Option<PathBuf>,
}

impl Launch {
    pub fn create() -> Self {
        Self {
            mode: WizardMode::Create,
            trip_file: None,
        }
    }

    /// Parses `create`, `edit <trip.json>` or `reactivate <trip.json>`.
    pub fn from_args<I>(args: I) -> Option<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let mode = match args.next() {
            None => return Some(Self::create()),
            Some(raw) => WizardMode::parse(&raw)?,
        };
        let trip_file = args.next().map(PathBuf::from);
        if args.next().is_some() {
            return None;
        }
        match (mode, trip_file) {
            (WizardMode::Create, None) => Some(Self::create()),
            (WizardMode::Create, Some(_)) => None,
            (_, None) => None,
            (mode, Some(path)) => Some(Self {
                mode,
                trip_file: Some(path),
            }),
        }
    }
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub theme: ColorfulTheme,
    pub config_manager: ConfigManager,
    pub wizard: WizardController,
    pub outbox: JsonOutbox,
    pub running: bool,
}
