//! Cancel-button handling on posted records.
//!
//! Every public post carries a danger button whose custom id is the record's
//! serial. Pressing it cancels the stored record after an ownership check and
//! replaces the posted summary with the cancellation embed; anyone else gets
//! a private rejection notice.

use crate::bot::{BotData, menus};
use crate::core::collaborators::ReservationStore;
use crate::errors::{Error, Result};
use crate::store::PlanStore;
use poise::serenity_prelude::{
    self as serenity, ComponentInteraction, ComponentInteractionDataKind,
    CreateInteractionResponse, CreateInteractionResponseMessage, FullEvent,
};
use tracing::{info, warn};

fn is_serial(custom_id: &str) -> bool {
    custom_id.starts_with("TR") || custom_id.starts_with("ATO")
}

/// Poise event hook; routes cancel-button presses, ignores everything else.
pub async fn handle_event(
    ctx: &serenity::Context,
    event: &FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    if let FullEvent::InteractionCreate {
        interaction: serenity::Interaction::Component(component),
    } = event
    {
        if matches!(component.data.kind, ComponentInteractionDataKind::Button)
            && is_serial(&component.data.custom_id)
        {
            handle_cancel(ctx, component, data).await?;
        }
    }
    Ok(())
}

async fn handle_cancel(
    ctx: &serenity::Context,
    component: &ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    let Some(guild_id) = component.guild_id else {
        return Ok(());
    };
    let serial = component.data.custom_id.clone();
    let store = PlanStore::new(data.database.clone());

    match store
        .cancel(guild_id.get(), &serial, component.user.id.get())
        .await
    {
        Ok(record) => {
            info!(%serial, "record cancelled");
            let author = component
                .member
                .as_ref()
                .and_then(|m| m.nick.clone())
                .unwrap_or_else(|| component.user.name.clone());
            let icon = guild_id
                .to_guild_cached(&ctx.cache)
                .and_then(|g| g.icon_url());
            let response = CreateInteractionResponseMessage::new()
                .embed(menus::cancel_result_embed(&record.serial, &author, icon.as_deref()))
                .components(vec![]);
            component
                .create_response(ctx, CreateInteractionResponse::UpdateMessage(response))
                .await?;
        }
        Err(Error::NotOwner { serial }) => {
            // rejection notice, visible only to the presser
            let response = CreateInteractionResponseMessage::new()
                .content(format!("Only the owner of **{serial}** can cancel it."))
                .ephemeral(true);
            component
                .create_response(ctx, CreateInteractionResponse::Message(response))
                .await?;
        }
        Err(e) => {
            warn!(%serial, error = %e, "cancellation failed");
            let response = CreateInteractionResponseMessage::new()
                .embed(menus::cancel_error_embed(&e.to_string()))
                .ephemeral(true);
            component
                .create_response(ctx, CreateInteractionResponse::Message(response))
                .await?;
        }
    }
    Ok(())
}
