//! Range listing and detail commands.

use crate::bot::{Context, handlers::autocomplete, menus};
use crate::core::collaborators::ReservationStore;
use crate::errors::{Error, Result};
use crate::store::PlanStore;

/// Shows the ranges currently reserved by active flight plans.
#[poise::command(slash_command, guild_only)]
pub async fn ranges(ctx: Context<'_>) -> Result<()> {
    let guild_id = ctx.guild_id().ok_or_else(|| Error::Config {
        message: "range listings are per-server".to_string(),
    })?;
    let data = ctx.data();
    let store = PlanStore::new(data.database.clone());
    let reservations = store.active_reservations(guild_id.get()).await?;
    let icon: Option<String> = ctx.guild().and_then(|g| g.icon_url());

    ctx.send(
        poise::CreateReply::default()
            .embed(menus::active_plans_embed(&data.refdata, &reservations, icon.as_deref())),
    )
    .await?;
    Ok(())
}

/// Shows one range's brief: restrictions, blocks, frequency, entry and exit.
#[poise::command(slash_command)]
pub async fn rangeinfo(
    ctx: Context<'_>,
    #[description = "Range id"]
    #[autocomplete = "autocomplete::autocomplete_range_id"]
    range: String,
    #[description = "Include altitude blocks"] altitude: Option<bool>,
) -> Result<()> {
    let data = ctx.data();
    let icon: Option<String> = ctx.guild().and_then(|g| g.icon_url());
    let show_blocks = altitude.unwrap_or(false);

    let embed = match menus::range_info_embed(&data.refdata, &range, show_blocks, icon.as_deref()) {
        Ok(embed) => embed,
        Err(Error::UnknownRange { id }) => menus::range_error_embed(&id, icon.as_deref()),
        Err(e) => return Err(e),
    };
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
