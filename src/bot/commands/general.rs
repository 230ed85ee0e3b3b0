//! General Discord commands - ping and help.
//! These commands don't touch the database.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**BudgetBuddy Help**\n\
        Here is a summary of all available commands.\n\n\
        **Budgets**\n\
        • `/budget [name]` - Spending summary of the current (or named) budget.\n\
        • `/monthly [year] [month]` - Income, spending and savings for a month.\n\n\
        **Spending**\n\
        • `/spend <category> <amount> [description]` - Records an expense in the current budget.\n\
        • `/expenses [category] [limit]` - Lists your latest expenses.\n\n\
        **Alerts and goals**\n\
        • `/alerts` - Shows your triggered alerts.\n\
        • `/dismiss_alert <id>` - Marks an alert as read.\n\
        • `/goals` - Progress of your goals.\n\n\
        **Money**\n\
        • `/income <account> <amount> [source]` - Records an income on an account.\n\
        • `/accounts` - Lists your accounts and balances.\n\n\
        **Utility**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
