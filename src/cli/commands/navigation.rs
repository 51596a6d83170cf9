use crate::cli::commands::{trip::render_wizard, CommandDefinition};
use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::io;
use crate::wizard::{StepOutcome, WizardStep};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "next",
            "Validate this step and move on, saving on the last step",
            "next",
            cmd_next,
        ),
        CommandDefinition::new("back", "Return to the previous step", "back", cmd_back),
        CommandDefinition::new("cancel", "Discard the trip and close", "cancel", cmd_cancel),
    ]
}

fn cmd_next(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let outcome = context.wizard.advance_with(&mut context.outbox)?;
    match outcome {
        StepOutcome::Moved(step) => {
            io::print_success(format!("Moved to {}.", step));
            if step == WizardStep::Timeline {
                render_wizard(&context.wizard);
            }
        }
        StepOutcome::Blocked(errors) => {
            io::print_error(format!("{} field(s) need attention:", errors.len()));
            for message in errors.messages() {
                io::print_warning(format!("  {}", message));
            }
        }
        StepOutcome::Saved(payload) => {
            let location = context
                .outbox
                .last_entry()
                .map(|path| path.display().to_string())
                .unwrap_or_default();
            io::print_success(format!(
                "Trip `{}` saved with {} day(s) and {} image(s) to {}",
                payload.name,
                payload.timelines.len(),
                payload.images.len(),
                location
            ));
            context.running = false;
        }
        StepOutcome::Rejected(err) => {
            io::print_error(format!("Saving failed: {}", err));
            io::print_hint("Your changes are kept; try `next` again.");
        }
        StepOutcome::Pending => io::print_warning("A submission is already in progress."),
        StepOutcome::Submit(_) => io::print_warning("Submission handed off."),
    }
    Ok(())
}

fn cmd_back(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let step = context.wizard.back()?;
    io::print_info(format!("Now on {}.", step));
    Ok(())
}

fn cmd_cancel(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.wizard.cancel_with(&mut context.outbox)?;
    io::print_warning("Trip discarded.");
    context.running = false;
    Ok(())
}
