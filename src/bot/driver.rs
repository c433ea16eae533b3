//! Interaction driver - advances a session from Discord component events.
//!
//! One ephemeral prompt message carries the whole flow; each select-menu
//! interaction is fed into the session and the prompt is updated in place.
//! The collector waits exactly as long as the session's idle deadline allows,
//! so a rejected interaction (wrong actor, stale menu) never extends the
//! flow's lifetime.

use crate::bot::{Context, menus};
use crate::config::refdata::Callsign;
use crate::core::collaborators::ReservationStore;
use crate::core::flow::{FlowKind, Step};
use crate::core::options::OptionResolver;
use crate::core::session::{Outcome, Selection, Session};
use crate::errors::{Error, Result};
use crate::store::PlanStore;
use chrono::Utc;
use poise::serenity_prelude::{
    self as serenity, ComponentInteraction, ComponentInteractionDataKind,
    CreateInteractionResponse, CreateInteractionResponseMessage,
};
use tracing::{debug, instrument};

fn selection_from(interaction: &ComponentInteraction) -> Selection {
    let values = match &interaction.data.kind {
        ComponentInteractionDataKind::StringSelect { values } => values.clone(),
        _ => Vec::new(),
    };
    Selection {
        menu: interaction.data.custom_id.clone(),
        values,
        actor: interaction.user.id.get(),
    }
}

fn pilots_bounds(session: &Session, roster_len: usize) -> (u8, u8) {
    let size = session
        .fields()
        .get("element-size")
        .and_then(|v| v.parse::<u8>().ok())
        .unwrap_or(1);
    #[allow(clippy::cast_possible_truncation)]
    let cap = roster_len.clamp(1, 25) as u8;
    let size = size.clamp(1, cap);
    (size, size)
}

fn prompt_row(
    session: &Session,
    step: Step,
    choices: &[crate::core::options::MenuChoice],
    roster_len: usize,
) -> serenity::CreateActionRow {
    if step == Step::Pilots {
        let (min, max) = pilots_bounds(session, roster_len);
        menus::select_row_bounded(step, choices, min, max)
    } else {
        menus::select_row(step, choices)
    }
}

fn step_embed(
    ctx: Context<'_>,
    step: Step,
    selection: &Selection,
    icon: Option<&str>,
) -> serenity::CreateEmbed {
    // entering the block step shows the chosen range's brief instead of a
    // bare prompt
    if step == Step::Block {
        if let Ok(embed) =
            menus::range_info_embed(&ctx.data().refdata, selection.value(), true, icon)
        {
            return embed;
        }
    }
    menus::prompt_embed(step, icon)
}

fn terminal_response(
    session: &Session,
    icon: Option<&str>,
) -> CreateInteractionResponseMessage {
    let base = CreateInteractionResponseMessage::new().components(vec![]);
    match session.kind() {
        FlowKind::FlightPlan => {
            if session.fields().get("approach").is_some() {
                base.content("Standby for routing.").embeds(vec![])
            } else {
                base.embed(menus::upload_embed(session.fields().get("duration"), icon))
            }
        }
        FlowKind::Ato => base.content("Standby for tasking.").embeds(vec![]),
    }
}

/// Runs a session to termination against the invoking interaction.
///
/// Returns the terminated session and the handle of the ephemeral prompt:
/// `Complete` when a terminal step was reached, `Cancelled` when the idle
/// window lapsed (the cancellation notice has already been rendered in that
/// case).
#[instrument(skip_all, fields(session = session.id(), kind = ?session.kind()))]
pub async fn drive<'a>(
    ctx: Context<'a>,
    mut session: Session,
    callsign: Option<&Callsign>,
    roster: &[String],
) -> Result<(Session, poise::ReplyHandle<'a>)> {
    let data = ctx.data();
    let resolver = OptionResolver::new(&data.refdata);
    let store = PlanStore::new(data.database.clone());
    let guild = session.guild();
    let icon: Option<String> = ctx.guild().and_then(|g| g.icon_url());

    // first prompt, against a fresh reservation snapshot
    let reservations = store.active_reservations(guild).await?;
    let choices = resolver.resolve(session.step(), session.fields(), &reservations, callsign, roster)?;
    let reply = ctx
        .send(
            poise::CreateReply::default()
                .embed(menus::prompt_embed(session.step(), icon.as_deref()))
                .components(vec![prompt_row(&session, session.step(), &choices, roster.len())])
                .ephemeral(true),
        )
        .await?;
    let prompt_id = reply.message().await?.id;

    loop {
        let remaining = session.idle_remaining(Utc::now());
        let interaction = serenity::ComponentInteractionCollector::new(ctx)
            .message_id(prompt_id)
            .timeout(remaining)
            .await;

        let Some(interaction) = interaction else {
            session.cancel();
            reply
                .edit(
                    ctx,
                    poise::CreateReply::default()
                        .embed(menus::flow_cancelled_embed(session.kind(), icon.as_deref()))
                        .components(vec![]),
                )
                .await?;
            return Ok((session, reply));
        };

        let selection = selection_from(&interaction);
        match session.preview(&selection, Utc::now()) {
            Outcome::Rejected => {
                debug!(actor = selection.actor, menu = %selection.menu, "selection rejected");
                interaction
                    .create_response(ctx.serenity_context(), CreateInteractionResponse::Acknowledge)
                    .await
                    .ok();
            }
            Outcome::Prompt(next) => {
                let reservations = store.active_reservations(guild).await?;
                // the next step's options may depend on the selection that
                // has not been recorded yet (complex -> range -> block)
                let mut pending = session.fields().clone();
                pending.insert(&selection.menu, &selection.joined());
                match resolver.resolve(next, &pending, &reservations, callsign, roster) {
                    Ok(choices) => {
                        session.advance(&selection, Utc::now());
                        let response = CreateInteractionResponseMessage::new()
                            .embed(step_embed(ctx, next, &selection, icon.as_deref()))
                            .components(vec![prompt_row(&session, next, &choices, roster.len())]);
                        interaction
                            .create_response(
                                ctx.serenity_context(),
                                CreateInteractionResponse::UpdateMessage(response),
                            )
                            .await?;
                    }
                    Err(Error::UnknownRange { id }) => {
                        // distinct error prompt; the session does not advance
                        let choices = resolver.resolve(
                            session.step(),
                            session.fields(),
                            &reservations,
                            callsign,
                            roster,
                        )?;
                        let response = CreateInteractionResponseMessage::new()
                            .embed(menus::range_error_embed(&id, icon.as_deref()))
                            .components(vec![prompt_row(
                                &session,
                                session.step(),
                                &choices,
                                roster.len(),
                            )]);
                        interaction
                            .create_response(
                                ctx.serenity_context(),
                                CreateInteractionResponse::UpdateMessage(response),
                            )
                            .await?;
                    }
                    Err(e) => return Err(e),
                }
            }
            Outcome::Complete => {
                session.advance(&selection, Utc::now());
                interaction
                    .create_response(
                        ctx.serenity_context(),
                        CreateInteractionResponse::UpdateMessage(terminal_response(
                            &session,
                            icon.as_deref(),
                        )),
                    )
                    .await?;
                return Ok((session, reply));
            }
        }
    }
}
