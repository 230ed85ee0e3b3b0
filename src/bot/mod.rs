//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the `BudgetBuddy` application,
//! including all slash commands, autocomplete handlers, and bot context management.
//! Commands only translate between Discord and `core`: every operation receives a
//! [`UserContext`] built from the command author.

/// Discord command implementations (budget, expense, alert, goal, account, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    config::users,
    core::ownership::UserContext,
    errors::{Error, Result},
};
use chrono::NaiveDate;
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use tracing::{error, info, instrument};

/// Shared data available to all bot commands.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
}

impl BotData {
    /// Creates a new `BotData` instance with the given database connection.
    #[must_use]
    pub const fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

/// Poise context used by every command.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Builds the caller identity from the command author.
#[must_use]
pub fn user_context(ctx: Context<'_>) -> UserContext {
    let user_id = ctx.author().id.to_string();
    let is_admin = users::is_admin(&user_id);
    UserContext { user_id, is_admin }
}

/// Today's date as seen by the bot (UTC).
#[must_use]
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

/// Message shown to the user for a failed command.
///
/// Business errors are shown as-is; storage and framework errors are hidden
/// behind a generic message and only logged.
#[must_use]
pub fn user_facing_message(error: &Error) -> String {
    match error {
        Error::Database(_) | Error::Io(_) | Error::FrameworkError(_) | Error::Fmt(_) => {
            "❌ Something went wrong, please try again later.".to_string()
        }
        other => format!("❌ {other}"),
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx.say(user_facing_message(&error)).await {
                error!("Failed to send error message: {}", e);
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Every slash command the bot registers.
#[must_use]
pub fn all_commands() -> Vec<poise::Command<BotData, Error>> {
    vec![
        commands::ping(),
        commands::help(),
        commands::budget(),
        commands::monthly(),
        commands::spend(),
        commands::expenses(),
        commands::alerts(),
        commands::dismiss_alert(),
        commands::goals(),
        commands::income(),
        commands::accounts(),
    ]
}

/// Starts the Discord client and blocks until it stops.
#[instrument(skip(token, database))]
pub async fn run(token: String, database: DatabaseConnection) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands(),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Registered {} commands globally", framework.options().commands.len());
                Ok(BotData::new(database))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {:?}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {:?}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_user_facing_message_shows_business_errors() {
        let message = user_facing_message(&Error::AllocationSum { total: dec!(90) });
        assert!(message.starts_with("❌ "));
        assert!(message.contains("90"));
    }

    #[test]
    fn test_user_facing_message_hides_storage_errors() {
        let message = user_facing_message(&Error::Database(sea_orm::DbErr::Custom("disk".to_string())));
        assert!(!message.contains("disk"));
    }

    #[test]
    fn test_all_commands_registered() {
        let names: Vec<String> = all_commands().into_iter().map(|c| c.name).collect();
        for expected in ["ping", "budget", "spend", "dismiss_alert", "monthly"] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
        assert_eq!(names.len(), 11);
    }
}
