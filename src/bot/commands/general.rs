//! General utility commands.

use crate::bot::Context;
use crate::errors::Result;

/// Checks that the bot is responsive.
#[poise::command(slash_command, prefix_command)]
pub async fn ping(ctx: Context<'_>) -> Result<()> {
    ctx.say("Pong!").await?;
    Ok(())
}
