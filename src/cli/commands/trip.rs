use std::path::Path;

use chrono::NaiveDate;

use crate::assets::ImageFile;
use crate::cli::commands::CommandDefinition;
use crate::cli::core::{parse_position, require_args, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::domain::Season;
use crate::wizard::{WizardController, WizardStep};

const SET_USAGE: &str = "set <name|description|season|start_date|days|tickets|price|discount|discount_enabled> <value>";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("show", "Show the trip being composed", "show", cmd_show),
        CommandDefinition::new("set", "Set a basic trip field", SET_USAGE, cmd_set),
        CommandDefinition::new(
            "tag",
            "Add or remove a tag",
            "tag <add|remove> <tag>",
            cmd_tag,
        ),
        CommandDefinition::new(
            "image",
            "Attach or remove images",
            "image add <path>... | image remove <n>",
            cmd_image,
        ),
        CommandDefinition::new(
            "improve",
            "Set improvement notes, one argument per line",
            "improve <line>...",
            cmd_improve,
        ),
    ]
}

fn cmd_show(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    render_wizard(&context.wizard);
    Ok(())
}

pub(crate) fn render_wizard(wizard: &WizardController) {
    output_section(format!("{} ({} mode)", wizard.step(), wizard.mode()));
    if !wizard.is_open() {
        io::print_info("The wizard is closed.");
        return;
    }

    let draft = wizard.draft();
    let or_dash = |value: Option<String>| value.unwrap_or_else(|| "-".into());
    io::print_info(format!("  Name        : {}", draft.name));
    io::print_info(format!("  Description : {}", draft.description));
    io::print_info(format!(
        "  Season      : {}",
        or_dash(draft.season.map(|s| s.to_string()))
    ));
    io::print_info(format!(
        "  Start date  : {}",
        or_dash(draft.start_date.map(|d| d.format("%Y-%m-%d").to_string()))
    ));
    io::print_info(format!("  Days        : {}", draft.days));
    io::print_info(format!(
        "  Tickets     : {}",
        or_dash(draft.tickets.map(|t| t.to_string()))
    ));
    io::print_info(format!(
        "  Price       : {}",
        or_dash(draft.price.map(|p| format!("{p:.2}")))
    ));
    io::print_info(format!(
        "  Discount    : {} ({})",
        or_dash(draft.discount.map(|d| format!("{d:.2}"))),
        if draft.discount_enabled { "on" } else { "off" }
    ));
    let tags: Vec<&str> = draft.tags.iter().map(String::as_str).collect();
    io::print_info(format!("  Tags        : {}", tags.join(", ")));
    for (index, asset) in wizard.assets().assets().iter().enumerate() {
        io::print_info(format!("  Image {:<5} : {}", index + 1, asset.label()));
    }

    if wizard.step() != WizardStep::Basic {
        for (day_index, day) in wizard.itinerary().days().iter().enumerate() {
            io::print_info(format!("  Day {}", day_index + 1));
            for (index, section) in day.sections.iter().enumerate() {
                let location = match (&section.latitude, &section.longitude) {
                    (Some(lat), Some(lng)) => format!("{lat}, {lng}"),
                    _ => "no location".into(),
                };
                io::print_info(format!(
                    "    {}. [{}] {} ({})",
                    index + 1,
                    section.time,
                    section.title,
                    location
                ));
                for line in &section.description {
                    io::print_info(format!("       - {}", line));
                }
            }
        }
    }
    if wizard.step() == WizardStep::Improvements {
        io::print_info(format!("  Improvements: {}", wizard.improvements()));
    }

    for (field, err) in wizard.basic_errors().iter() {
        io::print_warning(format!("{}: {}", field, err));
    }
    for (key, err) in wizard.timeline_errors().iter() {
        io::print_warning(format!("{}: {}", key, err));
    }
}

fn cmd_set(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    require_args(args, 1, SET_USAGE)?;
    let field = args[0].to_ascii_lowercase();
    let value = args[1..].join(" ");
    let wizard = &mut context.wizard;

    match field.as_str() {
        "name" => wizard.set_name(value)?,
        "description" => wizard.set_description(value)?,
        "season" => {
            let season = optional(&value, |raw| {
                Season::parse(raw).ok_or_else(|| {
                    let known: Vec<&str> = Season::ALL.iter().map(|s| s.as_str()).collect();
                    invalid(format!("unknown season `{raw}`; use one of {}", known.join(", ")))
                })
            })?;
            wizard.set_season(season)?
        }
        "start_date" | "start" => {
            let date = optional(&value, |raw| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| invalid(format!("`{raw}` is not a YYYY-MM-DD date")))
            })?;
            wizard.set_start_date(date)?
        }
        "days" => {
            let days = parse_number::<u32>(&value, "days")?;
            wizard.set_days(days)?
        }
        "tickets" => {
            let tickets = optional(&value, |raw| parse_number::<u32>(raw, "tickets"))?;
            wizard.set_tickets(tickets)?
        }
        "price" => {
            let price = optional(&value, |raw| parse_number::<f64>(raw, "price"))?;
            wizard.set_price(price)?
        }
        "discount" => {
            let discount = optional(&value, |raw| parse_number::<f64>(raw, "discount"))?;
            wizard.set_discount(discount)?
        }
        "discount_enabled" => wizard.set_discount_enabled(parse_flag(&value)?)?,
        other => return Err(invalid(format!("unknown field `{other}`; {SET_USAGE}"))),
    }
    Ok(())
}

fn cmd_tag(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    require_args(args, 2, "tag <add|remove> <tag>")?;
    let tag = args[1..].join(" ");
    match args[0] {
        "add" => {
            if !context.wizard.add_tag(&tag)? {
                io::print_warning(format!("Tag `{}` not added.", tag.trim()));
            }
        }
        "remove" => {
            if !context.wizard.remove_tag(&tag)? {
                io::print_warning(format!("Tag `{}` was not set.", tag.trim()));
            }
        }
        other => return Err(invalid(format!("unknown tag action `{other}`"))),
    }
    Ok(())
}

fn cmd_image(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    require_args(args, 2, "image add <path>... | image remove <n>")?;
    match args[0] {
        "add" => {
            let mut files = Vec::new();
            for raw in &args[1..] {
                match ImageFile::from_path(Path::new(raw)) {
                    Ok(file) => files.push(file),
                    Err(err) => io::print_warning(err),
                }
            }
            let offered = files.len();
            let rejected = context.wizard.add_images(files)?;
            for err in &rejected {
                io::print_warning(err);
            }
            let added = offered - rejected.len();
            if added > 0 {
                io::print_success(format!("Attached {} image(s).", added));
            }
        }
        "remove" => {
            let index = parse_position(args[1], "image")?;
            if context.wizard.remove_image(index)? {
                io::print_success(format!("Removed image {}.", index + 1));
            } else {
                io::print_warning(format!("There is no image {}.", index + 1));
            }
        }
        other => return Err(invalid(format!("unknown image action `{other}`"))),
    }
    Ok(())
}

fn cmd_improve(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    context.wizard.set_improvements(args.join("\n"))?;
    Ok(())
}

fn invalid(message: String) -> CommandError {
    CommandError::InvalidArguments(message)
}

/// Blank input clears the field.
fn optional<T>(
    raw: &str,
    parse: impl FnOnce(&str) -> Result<T, CommandError>,
) -> Result<Option<T>, CommandError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        parse(trimmed).map(Some)
    }
}

fn parse_number<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, CommandError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| invalid(format!("{what} must be a number, got `{raw}`")))
}

fn parse_flag(raw: &str) -> Result<bool, CommandError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(invalid(format!("expected on or off, got `{other}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_clear_optional_fields() {
        assert_eq!(
            optional("  ", |raw| parse_number::<u32>(raw, "tickets")).unwrap(),
            None
        );
        assert_eq!(
            optional("12", |raw| parse_number::<u32>(raw, "tickets")).unwrap(),
            Some(12)
        );
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert!(parse_flag("ON").unwrap());
        assert!(!parse_flag("no").unwrap());
        assert!(parse_flag("maybe").is_err());
    }
}
