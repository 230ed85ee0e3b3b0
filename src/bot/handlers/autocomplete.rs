//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggestions only ever come from what the author can see: global categories plus
//! their own, and their own budgets and accounts.

use crate::{
    bot::{BotData, user_context},
    core::{account, budget, category},
    errors::Error,
};

/// Discord autocomplete limit
const MAX_SUGGESTIONS: usize = 25;

/// Names containing `partial` (case-insensitive), sorted and capped at the Discord limit.
#[must_use]
pub fn matching_names(names: impl IntoIterator<Item = String>, partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    let mut matching: Vec<String> = names
        .into_iter()
        .filter(|name| name.to_lowercase().contains(&partial_lower))
        .collect();
    matching.sort();
    matching.dedup();
    matching.truncate(MAX_SUGGESTIONS);
    matching
}

/// Suggests category names visible to the author.
pub async fn autocomplete_category_name(ctx: poise::Context<'_, BotData, Error>, partial: &str) -> Vec<String> {
    let user = user_context(ctx);
    let Ok(categories) = category::list_categories(&ctx.data().database, &user).await else {
        return Vec::new();
    };
    matching_names(categories.into_iter().map(|c| c.name), partial)
}

/// Suggests the author's budget names.
pub async fn autocomplete_budget_name(ctx: poise::Context<'_, BotData, Error>, partial: &str) -> Vec<String> {
    let user = user_context(ctx);
    let Ok(budgets) = budget::list_budgets(&ctx.data().database, &user, None).await else {
        return Vec::new();
    };
    matching_names(budgets.into_iter().map(|b| b.name), partial)
}

/// Suggests the author's account names.
pub async fn autocomplete_account_name(ctx: poise::Context<'_, BotData, Error>, partial: &str) -> Vec<String> {
    let user = user_context(ctx);
    let Ok(accounts) = account::list_accounts(&ctx.data().database, &user).await else {
        return Vec::new();
    };
    matching_names(accounts.into_iter().map(|a| a.name), partial)
}
