use crate::cli::commands::CommandDefinition;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::help;
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("version", "Show build metadata", "version", cmd_version),
        CommandDefinition::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandDefinition::new(
            "exit",
            "Leave the shell, discarding an unfinished trip",
            "exit",
            cmd_exit,
        ),
    ]
}

fn cmd_version(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output_section(format!("Trip Composer {}", meta.version));
    io::print_info(format!("  Build hash : {}", meta.git_hash));
    io::print_info(format!("  Built at   : {}", meta.timestamp));
    io::print_info(format!("  Profile    : {}", meta.profile));
    io::print_info(format!(
        "  Config     : {}",
        context.config_manager.config_path().display()
    ));
    io::print_info(format!("  Outbox     : {}", context.outbox.root().display()));
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first().map(|name| name.to_lowercase()) {
        match context.command(&name) {
            Some(command) => help::print_command(command),
            None => context.suggest_command(args[0]),
        }
        return Ok(());
    }

    help::print_overview(&context.registry);
    Ok(())
}

fn cmd_exit(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if !context.confirm_exit()? {
        return Ok(());
    }
    if context.wizard.is_open() {
        context.wizard.cancel_with(&mut context.outbox)?;
        io::print_warning("Unsaved trip discarded.");
    }
    Err(CommandError::ExitRequested)
}
