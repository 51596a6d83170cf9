use crate::cli::commands::CommandDefinition;
use crate::cli::core::{
    parse_position, parse_section_path, require_args, CommandError, CommandResult, ShellContext,
};
use crate::cli::io;
use crate::domain::SectionField;
use crate::wizard::LocationSelection;

const SECTION_USAGE: &str =
    "section add <day> | section remove <day> <n> | section set <day> <n> <time|title|lat|lng> <value>";
const LINE_USAGE: &str =
    "line add <day> <n> | line remove <day> <n> <line> | line set <day> <n> <line> <text>";
const LOCATION_USAGE: &str = "location <day> <n> <lat> <lng> [name]";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "section",
            "Add, remove or edit an activity section",
            SECTION_USAGE,
            cmd_section,
        ),
        CommandDefinition::new(
            "line",
            "Edit the description lines of a section",
            LINE_USAGE,
            cmd_line,
        ),
        CommandDefinition::new(
            "location",
            "Pick the location of a section",
            LOCATION_USAGE,
            cmd_location,
        ),
    ]
}

fn cmd_section(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    require_args(args, 2, SECTION_USAGE)?;
    match args[0] {
        "add" => {
            let day = parse_position(args[1], "day")?;
            let path = context.wizard.add_section(day)?;
            io::print_success(format!("Added {}.", path));
        }
        "remove" => {
            require_args(args, 3, SECTION_USAGE)?;
            let path = parse_section_path(args[1], args[2])?;
            context.wizard.remove_section(path)?;
            io::print_success(format!("Removed {}.", path));
        }
        "set" => {
            require_args(args, 4, SECTION_USAGE)?;
            let path = parse_section_path(args[1], args[2])?;
            let field = SectionField::parse(args[3]).ok_or_else(|| {
                CommandError::InvalidArguments(format!("unknown section field `{}`", args[3]))
            })?;
            let value = args[4..].join(" ");
            let value = (!value.trim().is_empty()).then_some(value);
            context.wizard.set_section_field(path, field, value)?;
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown section action `{other}`"
            )))
        }
    }
    Ok(())
}

fn cmd_line(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    require_args(args, 3, LINE_USAGE)?;
    let path = parse_section_path(args[1], args[2])?;
    match args[0] {
        "add" => {
            let line = context.wizard.add_description_line(path)?;
            io::print_success(format!("Added line {} to {}.", line + 1, path));
        }
        "remove" => {
            require_args(args, 4, LINE_USAGE)?;
            let line = parse_position(args[3], "line")?;
            context.wizard.remove_description_line(path, line)?;
        }
        "set" => {
            require_args(args, 4, LINE_USAGE)?;
            let line = parse_position(args[3], "line")?;
            context
                .wizard
                .set_description_line(path, line, args[4..].join(" "))?;
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown line action `{other}`"
            )))
        }
    }
    Ok(())
}

/// Feeds a picked point through the same ticketed path a map picker would use.
fn cmd_location(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    require_args(args, 4, LOCATION_USAGE)?;
    let path = parse_section_path(args[0], args[1])?;
    for (raw, what) in [(args[2], "latitude"), (args[3], "longitude")] {
        if raw.trim().parse::<f64>().is_err() {
            return Err(CommandError::InvalidArguments(format!(
                "{what} must be a number, got `{raw}`"
            )));
        }
    }

    let mut selection = LocationSelection::new(args[2].trim(), args[3].trim());
    if args.len() > 4 {
        selection = selection.with_display_name(args[4..].join(" "));
    }
    let ticket = context.wizard.begin_location_lookup(path)?;
    if context.wizard.resolve_location(ticket, &selection) {
        let label = selection.display_name.as_deref().unwrap_or("location");
        io::print_success(format!("Set {} of {}.", label, path));
        Ok(())
    } else {
        Err(CommandError::Message(format!(
            "Location for {} could not be applied.",
            path
        )))
    }
}
