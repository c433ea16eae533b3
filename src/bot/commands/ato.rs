//! The `/ato` command - air tasking order filing.
//!
//! The order header comes from slash-command options; the interactive part is
//! the paginated SCL selection and the pilot assignment. The committed order
//! is rendered as a USMTF-style text block.

use crate::bot::commands::flightplan::{commit_session, member_role_names};
use crate::bot::{Context, driver};
use crate::config::refdata::Coords;
use crate::core::collaborators::RoutePlanner;
use crate::core::commit::CommitOutcome;
use crate::core::flow::FlowKind;
use crate::core::session::{FlowStatus, Session};
use crate::errors::{Error, Result};
use crate::route::MapboxRouter;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Order type for the ATO header.
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum AtoType {
    /// A standing operations order
    #[name = "OPORD"]
    Opord,
    /// A fragmentary change to a standing order
    #[name = "FRAGORD"]
    Fragord,
}

impl AtoType {
    const fn code(self) -> &'static str {
        match self {
            Self::Opord => "OPORD",
            Self::Fragord => "FRAGORD",
        }
    }
}

/// Mission task for the ATO header; air taskings skip the target block.
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum AtoTask {
    #[name = "CAP"]
    Cap,
    #[name = "ESCORT"]
    Escort,
    #[name = "AIRMOVE"]
    AirMove,
    #[name = "STRIKE"]
    Strike,
    #[name = "SEAD"]
    Sead,
    #[name = "CAS"]
    Cas,
}

impl AtoTask {
    const fn code(self) -> &'static str {
        match self {
            Self::Cap => "CAP",
            Self::Escort => "ESCORT",
            Self::AirMove => "AIRMOVE",
            Self::Strike => "STRIKE",
            Self::Sead => "SEAD",
            Self::Cas => "CAS",
        }
    }

    /// CAP/ESCORT/AIRMOVE fly air-to-air loads and carry no ground target.
    const fn is_air(self) -> bool {
        matches!(self, Self::Cap | Self::Escort | Self::AirMove)
    }
}

/// Nicknames of the members holding the callsign's role, for the pilot menu.
async fn squadron_roster(ctx: Context<'_>, role_name: &str) -> Result<Vec<String>> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(Vec::new());
    };
    let members = guild_id
        .members(ctx.serenity_context(), None, None)
        .await?;
    let role_id = ctx.guild().and_then(|guild| {
        guild
            .roles
            .iter()
            .find(|(_, role)| role.name == role_name)
            .map(|(id, _)| *id)
    });
    let Some(role_id) = role_id else {
        return Ok(Vec::new());
    };
    Ok(members
        .iter()
        .filter(|m| m.roles.contains(&role_id))
        .map(|m| m.nick.clone().unwrap_or_else(|| m.user.name.clone()))
        .collect())
}

/// Files an air tasking order.
#[allow(clippy::too_many_arguments)] // mirrors the order header line by line
#[poise::command(slash_command, guild_only)]
pub async fn ato(
    ctx: Context<'_>,
    #[description = "Order type"] order_type: AtoType,
    #[description = "Mission task"] task: AtoTask,
    #[description = "Days the order remains in effect"]
    #[min = 1]
    #[max = 14]
    timeframe: u32,
    #[description = "Aircraft in the element"]
    #[min = 1]
    #[max = 4]
    element_size: u32,
    #[description = "Target area"] target_area: String,
    #[description = "Assigned altitude"] altitude: String,
    #[description = "Takeoff base"] takeoff: String,
    #[description = "Commander's intent"] intent: Option<String>,
    #[description = "General text"] gen_text: Option<String>,
    #[description = "Target latitude"] target_lat: Option<f64>,
    #[description = "Target longitude"] target_lon: Option<f64>,
) -> Result<()> {
    let guild_id = ctx.guild_id().ok_or_else(|| Error::Config {
        message: "ATOs can only be filed in a server".to_string(),
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

    let roster = squadron_roster(ctx, &callsign.role).await?;
    if roster.is_empty() {
        ctx.send(
            poise::CreateReply::default()
                .content("No pilots hold your squadron role right now.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let mut session = Session::new(
        ctx.id(),
        ctx.author().id.get(),
        guild_id.get(),
        FlowKind::Ato,
        data.settings.flow(),
        data.settings.idle_timeout,
        Utc::now(),
    );

    session.seed("type", order_type.code());
    session.seed("task", task.code());
    session.seed("timeframe", &timeframe.to_string());
    session.seed("element-size", &element_size.to_string());
    session.seed("target-area", &target_area);
    session.seed("altitude", &altitude);
    session.seed("takeoff", &takeoff);
    session.seed("scl-type", if task.is_air() { "AA" } else { "AG" });
    session.seed("unit", &callsign.unit);
    session.seed("airframe", &callsign.airframe);
    session.seed("flight", &callsign.callsign);
    if let Some(intent) = &intent {
        session.seed("intent", intent);
    }
    if let Some(gen_text) = &gen_text {
        session.seed("gen-text", gen_text);
    }

    // ground targets get their coordinates and terrain elevation up front
    if !task.is_air() {
        if let (Some(lat), Some(lon)) = (target_lat, target_lon) {
            session.seed("target-lat", &format!("{lat:.4}"));
            session.seed("target-lon", &format!("{lon:.4}"));
            if let Some(token) = data.settings.mapbox_token.clone() {
                let router = MapboxRouter::new(Arc::clone(&data.refdata), token);
                match router.elevation(Coords { lat, lon }).await {
                    Ok(feet) => session.seed("target-elev", &feet.to_string()),
                    Err(e) => warn!(error = %e, "target elevation lookup failed"),
                }
            }
        }
    }

    let (session, _reply) = driver::drive(ctx, session, Some(&callsign), &roster).await?;
    if session.status() != FlowStatus::Complete {
        info!(session = session.id(), "ATO flow idle-cancelled");
        return Ok(());
    }

    if let CommitOutcome::Filed { record, .. } = commit_session(ctx, &session).await {
        info!(serial = %record.serial, "ATO filed");
    }
    Ok(())
}
