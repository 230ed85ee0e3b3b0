//! Goal Discord commands.

use crate::core::{goal::GoalProgress, report::format_progress_bar};

/// One line per goal: title, amounts, progress bar and days left.
#[must_use]
pub fn render_goal_line(progress: &GoalProgress) -> String {
    format!(
        "🎯 **{}**: {:.2} / {:.2} {} ({} days left)",
        progress.goal.title,
        progress.current_amount,
        progress.goal.target_amount,
        format_progress_bar(progress.amount_pct, Some(8)),
        progress.days_remaining,
    )
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::render_goal_line;
    use crate::{
        bot::{BotData, today, user_context},
        core::goal,
        errors::{Error, Result},
    };

    /// Shows the progress of your goals that are still in progress.
    #[poise::command(slash_command, prefix_command)]
    pub async fn goals(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let user = user_context(ctx);
        let progress = goal::goals_progress(&ctx.data().database, &user, today()).await?;

        if progress.is_empty() {
            ctx.say("No goals in progress.").await?;
            return Ok(());
        }

        let lines: Vec<String> = progress.iter().map(render_goal_line).collect();
        ctx.say(lines.join("\n")).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::goal::progress_of;
    use crate::entities::{GoalStatus, goal};
    use crate::test_utils::date;
    use rust_decimal_macros::dec;

    #[test]
    fn test_render_goal_line() {
        let model = goal::Model {
            id: 1,
            user_id: "alice".to_string(),
            category_id: 1,
            title: "Eat out less".to_string(),
            description: None,
            target_amount: dec!(200),
            start_date: date(2025, 5, 1),
            end_date: date(2025, 5, 31),
            status: GoalStatus::InProgress,
            created_at: chrono::Utc::now(),
        };
        let line = render_goal_line(&progress_of(model, dec!(50), date(2025, 5, 21)));
        assert!(line.starts_with("🎯 **Eat out less**: 50.00 / 200.00"));
        assert!(line.contains("25.0%"));
        assert!(line.ends_with("(10 days left)"));
    }
}
