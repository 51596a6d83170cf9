//! Core CLI dispatch, errors and shell context helpers.

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use dialoguer::theme::ColorfulTheme;
use thiserror::Error;
use tracing::debug;

use crate::{
    assets::{PreviewRegistry, TrackingPreviewRegistry},
    config::{app_data_dir, ConfigManager},
    domain::SectionPath,
    errors::{ConfigError, StorageError, WizardError},
    storage::{load_initial_data, FsAssetFetcher, JsonOutbox},
    utils::time::{Clock, SystemClock},
    wizard::{WizardController, WizardOptions},
};

use super::commands::{self, CommandDefinition, CommandRegistry};
use super::io as cli_io;
pub use super::shell_context::{CliMode, Launch, ShellContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl ShellContext {
    pub fn new(mode: CliMode, launch: Launch) -> Result<Self, CliError> {
        Self::with_base_dir(mode, launch, app_data_dir(), &SystemClock)
    }

    /// Builds a shell whose configuration and outbox live under `base`.
    pub fn with_base_dir(
        mode: CliMode,
        launch: Launch,
        base: PathBuf,
        clock: &dyn Clock,
    ) -> Result<Self, CliError> {
        let config_manager = ConfigManager::with_base_dir(base)?;
        let config = config_manager.load()?;
        let outbox = JsonOutbox::new(config_manager.outbox_dir(&config))?;
        let options = WizardOptions::with_clock(&config, clock);
        let previews: Arc<dyn PreviewRegistry> = Arc::new(TrackingPreviewRegistry::new());

        let wizard = match &launch.trip_file {
            Some(path) => {
                let initial = load_initial_data(path)?;
                let base = path.parent().map(Path::to_path_buf);
                WizardController::open(launch.mode, Some(initial), options, previews)
                    .with_asset_fetcher(Box::new(FsAssetFetcher::new(base)))
            }
            None => WizardController::open(launch.mode, None, options, previews),
        };

        Ok(ShellContext {
            mode,
            registry: CommandRegistry::new(commands::all_definitions()),
            theme: ColorfulTheme::default(),
            config_manager,
            wizard,
            outbox,
            running: true,
        })
    }

    pub fn prompt(&self) -> String {
        format!("trip[{}:{}]", self.wizard.mode(), self.wizard.step())
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandDefinition> {
        self.registry.get(name)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.get(command).map(|entry| entry.handler) {
            debug!(command, "dispatching command");
            match handler(self, args) {
                Ok(()) if self.running => Ok(LoopControl::Continue),
                Ok(()) => Ok(LoopControl::Exit),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        super::shell::handle_line(self, line)
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_ascii_lowercase();
        let prefix: String = needle.chars().take(2).collect();
        if prefix.is_empty() {
            return;
        }
        if let Some(best) = self.registry.names().find(|name| name.starts_with(&prefix)) {
            cli_io::print_hint(format!("Did you mean `{}`?", best));
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script || !self.wizard.is_open() {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, "Discard this trip and exit?", false)
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(message);
                cli_io::print_hint("Use `help <command>` for usage details.");
            }
            CommandError::Wizard(WizardError::Closed) => {
                cli_io::print_error("The trip wizard is closed. Use `exit` to leave.");
            }
            other => cli_io::print_error(other.to_string()),
        }
    }
}

/// Parses a 1-based position typed by the user into a 0-based index.
pub(crate) fn parse_position(raw: &str, what: &str) -> Result<usize, CommandError> {
    match raw.trim().parse::<usize>() {
        Ok(value) if value >= 1 => Ok(value - 1),
        _ => Err(CommandError::InvalidArguments(format!(
            "{} must be a positive number, got `{}`",
            what, raw
        ))),
    }
}

pub(crate) fn parse_section_path(day: &str, section: &str) -> Result<SectionPath, CommandError> {
    Ok(SectionPath::new(
        parse_position(day, "day")?,
        parse_position(section, "section")?,
    ))
}

pub(crate) fn require_args(args: &[&str], count: usize, usage: &str) -> CommandResult {
    if args.len() < count {
        Err(CommandError::InvalidArguments(format!("usage: {}", usage)))
    } else {
        Ok(())
    }
}
