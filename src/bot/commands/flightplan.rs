//! The `/flightplan` command - the interactive flight-plan filing flow.

use crate::bot::{Context, driver, sink::DiscordSink};
use crate::core::collaborators::RoutePlanner;
use crate::core::commit::{CommitOutcome, CompletionHandler};
use crate::core::flow::FlowKind;
use crate::core::record::Owner;
use crate::core::session::{FlowStatus, Session};
use crate::errors::{Error, Result};
use crate::route::MapboxRouter;
use crate::store::PlanStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Names of the invoking member's roles, resolved against the guild cache.
pub(super) fn member_role_names(ctx: Context<'_>, role_ids: &[poise::serenity_prelude::RoleId]) -> Vec<String> {
    let Some(guild) = ctx.guild() else {
        return Vec::new();
    };
    role_ids
        .iter()
        .filter_map(|id| guild.roles.get(id).map(|role| role.name.clone()))
        .collect()
}

/// Display identity of the invoking member (nickname over username).
pub(super) async fn invoking_owner(ctx: Context<'_>) -> Owner {
    let name = match ctx.author_member().await {
        Some(member) => member
            .nick
            .clone()
            .unwrap_or_else(|| ctx.author().name.clone()),
        None => ctx.author().name.clone(),
    };
    Owner {
        id: ctx.author().id.get(),
        name,
    }
}

/// Runs the completion fan-out for a terminated session.
pub(super) async fn commit_session(ctx: Context<'_>, session: &Session) -> CommitOutcome {
    let data = ctx.data();
    let store = PlanStore::new(data.database.clone());
    let guild_icon: Option<String> = ctx.guild().and_then(|g| g.icon_url());
    let sink = DiscordSink::new(
        ctx.serenity_context().http.clone(),
        Arc::clone(&data.settings),
        Arc::clone(&data.refdata),
        guild_icon,
    );
    let router = data
        .settings
        .mapbox_token
        .clone()
        .map(|token| MapboxRouter::new(Arc::clone(&data.refdata), token));
    let router_ref = router.as_ref().map(|r| r as &dyn RoutePlanner);

    let handler = CompletionHandler::new(&store, &sink, router_ref);
    let owner = invoking_owner(ctx).await;
    handler.finish(session, owner, Utc::now()).await
}

/// Files a flight plan through the interactive menu flow.
///
/// The flow walks tasking, range/zone, duration, flight, and (for
/// air-to-ground taskings) routing selection, then posts the plan to the
/// flight-plan channel, DMs the owner, and reserves the chosen resources.
#[poise::command(slash_command, guild_only)]
pub async fn flightplan(ctx: Context<'_>) -> Result<()> {
    let guild_id = ctx.guild_id().ok_or_else(|| Error::Config {
        message: "flight plans can only be filed in a server".to_string(),
    })?;

    let member = ctx.author_member().await.ok_or_else(|| Error::Config {
        message: "could not resolve your server membership".to_string(),
    })?;
    let role_names = member_role_names(ctx, &member.roles);
    drop(member);

    let data = ctx.data();
    let Some(callsign) = data.refdata.callsign_for_roles(&role_names).cloned() else {
        ctx.send(
            poise::CreateReply::default()
                .content("None of your roles map to a flight callsign.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    };

    let session = Session::new(
        ctx.id(),
        ctx.author().id.get(),
        guild_id.get(),
        FlowKind::FlightPlan,
        data.settings.flow(),
        data.settings.idle_timeout,
        Utc::now(),
    );

    let (session, reply) = driver::drive(ctx, session, Some(&callsign), &[]).await?;
    if session.status() != FlowStatus::Complete {
        info!(session = session.id(), "flight plan flow idle-cancelled");
        return Ok(());
    }

    let outcome = commit_session(ctx, &session).await;
    if let CommitOutcome::Filed { record, route } = &outcome {
        info!(serial = %record.serial, "flight plan filed");
        if route.is_some() {
            // the prompt is ephemeral; it can only be dismissed by its owner
            reply
                .edit(
                    ctx,
                    poise::CreateReply::default()
                        .content("You may now dismiss this message.")
                        .components(vec![]),
                )
                .await?;
        }
    }
    Ok(())
}
