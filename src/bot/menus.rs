//! Prompt and embed rendering.
//!
//! Everything the bot shows - step prompts, filed-plan summaries, the ATO
//! text block, cancellation notices, range info - is built here so the
//! command drivers and the notification sink share one look.

use crate::config::refdata::RangeData;
use crate::core::flow::{FlowKind, Step};
use crate::core::options::{MenuChoice, Reservation};
use crate::core::record::FinalRecord;
use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use poise::serenity_prelude::{
    ButtonStyle, Colour, CreateActionRow, CreateButton, CreateEmbed, CreateEmbedAuthor,
    CreateSelectMenu, CreateSelectMenuKind, CreateSelectMenuOption, Timestamp,
};

const COLOR_PROMPT: Colour = Colour(0x0099_ff);
const COLOR_PLAN: Colour = Colour(0x00ff_4400);
const COLOR_ATO: Colour = Colour(0x00ff_0044);
const COLOR_FLOW_CANCELLED: Colour = Colour(0x00dd_0000);
const COLOR_CANCELLED: Colour = Colour(0x00aa_0000);
const COLOR_ERROR: Colour = Colour(0x00ff_a0a0);
const COLOR_RANGE_INFO: Colour = Colour(0x00aa_bbcc);
const COLOR_RANGE_ERROR: Colour = Colour(0x00ff_0000);
const COLOR_ACTIVE: Colour = Colour(0x0000_00ff);
const COLOR_IDLE: Colour = Colour(0x00a1_a1a1);
const COLOR_ROUTE: Colour = Colour(0x00aa_aaaa);

const BLANK: &str = "\u{200b}";

fn step_meta(step: Step) -> (&'static str, &'static str, &'static str) {
    match step {
        Step::Tasking => ("New Flight Plan", "Select your tasking to begin.", "Tasking"),
        Step::Zone => ("Zone", "Select an available zone.", "Zone"),
        Step::Complex => (
            "Range Complex",
            "Select an available range complex.",
            "Range Complex",
        ),
        Step::Range => ("Range", "Select an available range.", "Range"),
        Step::Block => ("Altitude Block", "Select an altitude block.", "Altitude Block"),
        Step::JtacRange => ("Range", "Select a JTAC-capable range.", "Range"),
        Step::Duration => ("Duration", "Estimated mission duration.", "Estimated Duration"),
        Step::FlightSize => (
            "Element Size",
            "Number of aircraft in the element.",
            "Number of Aircraft",
        ),
        Step::Flight => ("Flight", "Select your flight.", "Flight"),
        Step::Routing => ("Routing", "How should your route be planned?", "Routing"),
        Step::Departure => ("Departure", "Select your departure.", "Departure"),
        Step::Approach => ("Approach", "Select your approach.", "Approach"),
        Step::Scl { .. } => (
            "Standard Conventional Load",
            "Select the SCL for this tasking.",
            "Select SCL",
        ),
        Step::Pilots => ("Pilots", "Assign pilots to the flight.", "Assign Pilots"),
    }
}

fn with_thumbnail(embed: CreateEmbed, icon: Option<&str>) -> CreateEmbed {
    match icon {
        Some(url) => embed.thumbnail(url.to_string()),
        None => embed,
    }
}

/// The generic prompt embed for a step.
#[must_use]
pub fn prompt_embed(step: Step, icon: Option<&str>) -> CreateEmbed {
    let (title, description, _) = step_meta(step);
    with_thumbnail(
        CreateEmbed::new()
            .colour(COLOR_PROMPT)
            .title(title)
            .description(description),
        icon,
    )
}

/// The select-menu row for a step.
#[must_use]
pub fn select_row(step: Step, choices: &[MenuChoice]) -> CreateActionRow {
    select_row_bounded(step, choices, 1, 1)
}

/// The select-menu row for a step that takes several values at once
/// (pilot assignment).
#[must_use]
pub fn select_row_bounded(
    step: Step,
    choices: &[MenuChoice],
    min: u8,
    max: u8,
) -> CreateActionRow {
    let (_, _, placeholder) = step_meta(step);
    // Discord renders at most 25 options per select menu
    let options: Vec<CreateSelectMenuOption> = choices
        .iter()
        .take(crate::core::options::MENU_LIMIT)
        .map(|choice| {
            let option = CreateSelectMenuOption::new(choice.label.clone(), choice.value.clone());
            match &choice.description {
                Some(description) => option.description(description.clone()),
                None => option,
            }
        })
        .collect();
    let menu = CreateSelectMenu::new(step.menu_id(), CreateSelectMenuKind::String { options })
        .placeholder(placeholder)
        .min_values(min)
        .max_values(max);
    CreateActionRow::SelectMenu(menu)
}

/// The cancel control attached to every public post, tagged with the serial.
#[must_use]
pub fn cancel_button_row(serial: &str) -> CreateActionRow {
    CreateActionRow::Buttons(vec![
        CreateButton::new(serial)
            .label("cancel")
            .style(ButtonStyle::Danger),
    ])
}

fn discord_time(at: DateTime<Utc>) -> String {
    format!("<t:{}:t>", at.timestamp())
}

/// The filed flight-plan summary embed.
#[must_use]
pub fn plan_embed(data: &RangeData, record: &FinalRecord, icon: Option<&str>) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .colour(COLOR_PLAN)
        .title(format!("Flight Plan - {}", record.serial))
        .description(BLANK)
        .author(CreateEmbedAuthor::new(record.owner.name.clone()))
        .timestamp(Timestamp::now());
    embed = with_thumbnail(embed, icon);

    for (key, value) in record.fields.iter() {
        embed = match key {
            "taskings" => embed.field("Tasking", value, true),
            "zones" => embed.field("Zone", value, true),
            "complex" => embed.field("Range Complex", value, true),
            "flight" => embed.field("Flight", value, true),
            "flight-size" => embed.field("Element Size", value, true),
            "duration" => embed.field("Duration", format!("{value} hrs"), true),
            "range" => embed.field("Range", value, true),
            "block" => embed.field("Alt Block", data.block_label(value), true),
            "departure" => embed.field("Departure", value, true),
            "approach" => embed.field("Approach", value, true),
            _ => embed,
        };
    }

    // pad the row so the takeoff/land times start a fresh one
    embed
        .field(BLANK, BLANK, false)
        .field(
            "Takeoff NLT",
            discord_time(record.created_at + Duration::minutes(20)),
            true,
        )
        .field("Land NLT", discord_time(record.expires_at), true)
        .field(BLANK, BLANK, true)
}

fn zulu_stamp(at: DateTime<Utc>) -> String {
    format!(
        "{:02}{:02}{:02}Z{}{}",
        at.day(),
        at.hour(),
        at.minute(),
        at.format("%b").to_string().to_uppercase(),
        at.year()
    )
}

/// The ATO summary embed, rendered as a USMTF-style text block.
#[must_use]
pub fn ato_embed(record: &FinalRecord, icon: Option<&str>) -> CreateEmbed {
    let get = |key: &str| record.fields.get(key).unwrap_or("-").to_string();
    let seq = record
        .serial
        .get(record.serial.len().saturating_sub(4)..)
        .unwrap_or("0001");

    let mut lines = vec![
        format!("{}/379thvAEW", get("type")),
        format!("MSGID/ATO/379CMD/{}", record.serial),
        "AKNLDG/YES//".to_string(),
        format!(
            "TIMEFRAM/FROM:{}/TO:{}",
            zulu_stamp(record.created_at),
            zulu_stamp(record.expires_at)
        ),
        format!("TASKUNIT/{}/{}//", get("unit"), get("takeoff")),
        format!("AMSNDAT/{seq}/{}", get("task")),
        format!(
            "MSNACFT/{}/ACTYP:{}/{}/{}",
            get("element-size"),
            get("airframe"),
            get("flight"),
            get("scl-list")
        ),
        format!(
            "AMSNLOC/{}/{}",
            get("target-area").to_uppercase(),
            get("altitude")
        ),
    ];

    // ground-attack taskings carry a target location line
    if record.fields.get("scl-type") == Some("AG") {
        let mut target = format!(
            "GTGTLOC/{}/DMPIS:{}{}",
            get("target-area").to_uppercase(),
            get("target-lat"),
            get("target-lon")
        );
        if let Some(elevation) = record.fields.get("target-elev") {
            target.push_str(&format!("/{elevation}FT"));
        }
        if let Some(intent) = record.fields.get("intent") {
            target.push_str(&format!("/{intent}"));
        }
        lines.push(target);
    }

    if let Some(gen_text) = record.fields.get("gen-text") {
        lines.push(format!("GENTEXT/{gen_text}"));
    }

    let mut embed = CreateEmbed::new()
        .colour(COLOR_ATO)
        .title(record.serial.clone())
        .author(CreateEmbedAuthor::new(record.owner.name.clone()))
        .timestamp(Timestamp::now())
        .description(format!("```\n{}\n```", lines.join("\n")));
    if let Some(pilots) = record.fields.get("pilots") {
        embed = embed.field("Pilots", pilots, false);
    }
    with_thumbnail(embed, icon)
}

/// The record summary for either flow kind.
#[must_use]
pub fn record_embed(data: &RangeData, record: &FinalRecord, icon: Option<&str>) -> CreateEmbed {
    match record.kind {
        FlowKind::FlightPlan => plan_embed(data, record, icon),
        FlowKind::Ato => ato_embed(record, icon),
    }
}

/// Shown in place of the prompt when the idle timeout fires.
#[must_use]
pub fn flow_cancelled_embed(kind: FlowKind, icon: Option<&str>) -> CreateEmbed {
    let (title, description) = match kind {
        FlowKind::FlightPlan => (
            "Flight Plan Cancelled",
            "Please re-submit your flight plan.",
        ),
        FlowKind::Ato => ("ATO Cancelled", "Please re-submit your ATO."),
    };
    with_thumbnail(
        CreateEmbed::new()
            .colour(COLOR_FLOW_CANCELLED)
            .title(title)
            .description(description),
        icon,
    )
}

/// Confirms a post-commit cancellation of a stored record.
#[must_use]
pub fn cancel_result_embed(serial: &str, author: &str, icon: Option<&str>) -> CreateEmbed {
    let title = if serial.starts_with("ATO") {
        "ATO Canceled"
    } else {
        "Flight Plan Canceled"
    };
    with_thumbnail(
        CreateEmbed::new()
            .colour(COLOR_CANCELLED)
            .title(title)
            .description(format!("**{serial}** has been cancelled."))
            .author(CreateEmbedAuthor::new(author.to_string()))
            .timestamp(Timestamp::now()),
        icon,
    )
}

/// Rendered when a post-commit cancellation is rejected or fails.
#[must_use]
pub fn cancel_error_embed(error: &str) -> CreateEmbed {
    CreateEmbed::new()
        .colour(COLOR_ERROR)
        .title("Error")
        .description(format!(
            "There was a problem cancelling this record.\n\n{error}"
        ))
}

/// The "active ranges" listing, one field triple per live plan.
#[must_use]
pub fn active_plans_embed(
    data: &RangeData,
    reservations: &[Reservation],
    icon: Option<&str>,
) -> CreateEmbed {
    if reservations.is_empty() {
        return with_thumbnail(
            CreateEmbed::new()
                .colour(COLOR_IDLE)
                .title("No Active Ranges")
                .description(BLANK),
            icon,
        );
    }

    let mut embed = CreateEmbed::new()
        .colour(COLOR_ACTIVE)
        .title("Active Ranges")
        .description(BLANK);
    embed = with_thumbnail(embed, icon);
    for reservation in reservations {
        let range = reservation.range.as_deref().unwrap_or("-");
        let block = reservation
            .block
            .as_deref()
            .map_or_else(|| "-".to_string(), |b| data.block_label(b).to_string());
        let flight = reservation.flight.as_deref().unwrap_or("-");
        embed = embed
            .field(range, block, true)
            .field("Flight", flight, true)
            .field("Expires", discord_time(reservation.expires_at), true);
    }
    embed
}

/// The range detail embed shown during the flow and by `/rangeinfo`.
///
/// # Errors
/// [`crate::errors::Error::UnknownRange`] when the id is not in the dataset;
/// callers render [`range_error_embed`] instead.
pub fn range_info_embed(
    data: &RangeData,
    id: &str,
    show_blocks: bool,
    icon: Option<&str>,
) -> crate::errors::Result<CreateEmbed> {
    let range = data.range(id)?;
    let restrictions: String = range
        .restrictions
        .iter()
        .map(|r| format!("`- {r}`\n"))
        .collect();
    let description = if show_blocks {
        let blocks: Vec<&str> = range
            .blocks
            .iter()
            .map(|b| data.block_label(b))
            .collect();
        format!(
            "**Restrictions**\n{restrictions}\n**Altitude Blocks**\n{}",
            blocks.join(", ")
        )
    } else {
        format!("**Restrictions**\n{restrictions}")
    };

    let points = |points: &[crate::config::refdata::Waypoint]| -> String {
        points
            .iter()
            .map(|p| format!("{}\n`{:.4} {:.4}`\n{}", p.name, p.lat, p.lon, p.desc))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let embed = CreateEmbed::new()
        .colour(COLOR_RANGE_INFO)
        .title(range.name.clone())
        .description(description)
        .field("Range Complex", range.complex.clone(), true)
        .field("Frequency", format!("CH{}", range.frequency), true)
        .field("JTAC", range.jtac.to_string(), true)
        .field("Active", range.active.to_string(), true)
        .field("Entry", points(&range.entries), true)
        .field("Exit", points(&range.exits), true);
    Ok(with_thumbnail(embed, icon))
}

/// The distinct error prompt for an unknown range id.
#[must_use]
pub fn range_error_embed(id: &str, icon: Option<&str>) -> CreateEmbed {
    with_thumbnail(
        CreateEmbed::new()
            .colour(COLOR_RANGE_ERROR)
            .title("Range Info Error")
            .description(format!(
                "There is a problem with this range ('{id}').\n\nPlease try a different range."
            )),
        icon,
    )
}

/// Terminal prompt for flows that upload their own route picture.
#[must_use]
pub fn upload_embed(duration: Option<&str>, icon: Option<&str>) -> CreateEmbed {
    let hours = duration.unwrap_or("1");
    with_thumbnail(
        CreateEmbed::new()
            .colour(COLOR_PLAN)
            .title("Flight Plan Filed")
            .description(format!(
                "Post your flight plan picture in the flight plans channel.\n\nYour range is reserved for {hours} hrs."
            )),
        icon,
    )
}

/// The routing-details embed DMed alongside the plotted route.
#[must_use]
pub fn route_embed(serial: &str, description: &str) -> CreateEmbed {
    CreateEmbed::new()
        .colour(COLOR_ROUTE)
        .title(format!("Routing Details - {serial}"))
        .description(format!("```\n{description}\n```"))
}
