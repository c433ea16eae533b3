//! Bot layer - Discord-specific interface and command handlers.
//!
//! This module wires the poise framework around the core flow: slash
//! commands start sessions, the interaction driver advances them, and the
//! event hook routes cancel buttons on posted records.

/// Discord command implementations (flight plan, ATO, ranges, general)
pub mod commands;
/// Interaction driver advancing sessions from component events
pub mod driver;
/// Discord interaction handlers (autocomplete, cancel buttons)
pub mod handlers;
/// Prompt and embed rendering
pub mod menus;
/// Discord implementation of the notification sink
pub mod sink;

use crate::config::refdata::RangeData;
use crate::config::settings::Settings;
use crate::errors;
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{info, instrument};

/// Shared data available to all bot commands: the database connection, the
/// reference dataset loaded at startup, and the runtime settings.
pub struct BotData {
    /// Database connection for all reservation-store operations
    pub database: DatabaseConnection,
    /// Process-wide read-only range reference data
    pub refdata: Arc<RangeData>,
    /// Channels, idle timeout, Mapbox token
    pub settings: Arc<Settings>,
}

/// The error type poise carries through command invocations.
pub type Error = errors::Error;
/// Command context alias.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            panic!("Failed to start bot: {error:?}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx.say(format!("An error occurred: {error}")).await {
                tracing::error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                tracing::error!("Error while handling error: {e}");
            }
        }
    }
}

/// Builds the poise framework and runs the client until shutdown.
///
/// # Errors
/// Returns the serenity error when the client cannot be created or drops out
/// of its gateway loop.
#[instrument(skip_all)]
pub async fn run_bot(
    token: String,
    database: DatabaseConnection,
    refdata: Arc<RangeData>,
    settings: Arc<Settings>,
) -> Result<(), serenity::Error> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::flightplan(),
                commands::ato(),
                commands::ranges(),
                commands::rangeinfo(),
                commands::ping(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::handle_event(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                ctx.set_activity(Some(serenity::ActivityData::watching(format!(
                    "{} servers for aviators",
                    ready.guilds.len()
                ))));
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(BotData {
                    database,
                    refdata,
                    settings,
                })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::DIRECT_MESSAGES;

    info!("Setting up Serenity client for Poise framework...");
    let client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await;

    match client {
        Ok(mut c) => {
            info!("Starting bot client...");
            if let Err(why) = c.start().await {
                tracing::error!("Client error: {why:?}");
                return Err(why);
            }
        }
        Err(e) => {
            tracing::error!("Error creating client: {e:?}");
            return Err(e);
        }
    }
    Ok(())
}
