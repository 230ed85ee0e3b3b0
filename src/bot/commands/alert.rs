//! Alert Discord commands - `alerts` and `dismiss_alert`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, user_context},
        core::alert,
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Shows your alerts that are currently triggered.
    #[poise::command(slash_command, prefix_command)]
    pub async fn alerts(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let user = user_context(ctx);
        let triggered = alert::triggered_alerts(&ctx.data().database, &user).await?;

        if triggered.is_empty() {
            ctx.say("✅ No alerts triggered.").await?;
            return Ok(());
        }

        let mut out = String::from("⚠️ **Triggered alerts**\n");
        for item in &triggered {
            writeln!(
                out,
                "`#{}` {} ({}: {:.2} of {:.2} spent)",
                item.alert.id, item.message, item.budget_name, item.total_spent, item.allocated
            )?;
        }
        out.push_str("\nUse `/dismiss_alert <id>` to mark one as read.");
        ctx.say(out).await?;
        Ok(())
    }

    /// Marks an alert as read so it stops triggering.
    #[poise::command(slash_command, prefix_command)]
    pub async fn dismiss_alert(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Alert ID shown by /alerts"] id: i64,
    ) -> Result<()> {
        let user = user_context(ctx);
        alert::mark_read(&ctx.data().database, &user, id).await?;
        ctx.say(format!("✅ Alert #{id} dismissed.")).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
