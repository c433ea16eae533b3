//! Autocomplete handlers for Discord slash command parameters.

use crate::bot::{BotData, Context};

/// Suggests range ids for `/rangeinfo`, matched case-insensitively against
/// the partial input. Capped at Discord's 25-suggestion limit.
pub async fn autocomplete_range_id(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let data: &BotData = ctx.data();
    let partial_lower = partial.to_lowercase();

    let mut matching: Vec<String> = data
        .refdata
        .ranges
        .iter()
        .filter(|range| {
            range.id.to_lowercase().contains(&partial_lower)
                || range.name.to_lowercase().contains(&partial_lower)
        })
        .map(|range| range.id.clone())
        .take(25)
        .collect();

    matching.sort();
    matching
}
