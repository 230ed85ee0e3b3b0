//! Budget Discord commands - `budget` and `monthly`.

use crate::{
    core::{report::MonthlyReport, report::format_progress_bar, spending::BudgetSummary},
    errors::Result,
};
use std::fmt::Write;

/// Renders a budget summary as a Discord message.
pub fn render_budget_summary(summary: &BudgetSummary) -> Result<String> {
    let budget = &summary.budget;
    let mut out = format!(
        "📊 **{}** ({} → {})\nSpent {:.2} of {:.2}, {:.2} remaining\n{}\n",
        budget.name,
        budget.start_date,
        budget.end_date,
        summary.total_spent,
        budget.total_amount,
        summary.remaining,
        format_progress_bar(summary.percentage_spent, None),
    );
    for allocation in &summary.allocations {
        let marker = if allocation.remaining < rust_decimal::Decimal::ZERO {
            "🔴"
        } else {
            "🟢"
        };
        write!(
            out,
            "\n{marker} **{}**: {:.2} / {:.2} {}",
            allocation.category_name,
            allocation.total_spent,
            allocation.allocated,
            format_progress_bar(allocation.percentage_spent, Some(8)),
        )?;
    }
    Ok(out)
}

/// Renders a monthly report as a Discord message.
pub fn render_monthly_report(report: &MonthlyReport) -> Result<String> {
    let mut out = format!(
        "🗓️ **{:04}-{:02}**\nIncome: {:.2}\nExpenses: {:.2}\nSavings: {:.2} ({:.2}%)\n",
        report.year, report.month, report.income_total, report.expense_total, report.savings, report.savings_rate,
    );
    if report.expenses_by_category.is_empty() {
        out.push_str("\nNo expenses recorded.");
    }
    for total in &report.expenses_by_category {
        write!(out, "\n• {}: {:.2} ({})", total.category_name, total.total, total.count)?;
    }
    Ok(out)
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{render_budget_summary, render_monthly_report};
    use crate::{
        bot::{BotData, handlers::autocomplete, today, user_context},
        core::{budget, report, spending},
        errors::{Error, Result},
    };
    use chrono::Datelike;

    /// Shows the spending summary of the current budget, or of a named one.
    #[poise::command(slash_command, prefix_command)]
    pub async fn budget(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Budget name (defaults to the budget covering today)"]
        #[autocomplete = "autocomplete::autocomplete_budget_name"]
        name: Option<String>,
    ) -> Result<()> {
        let user = user_context(ctx);
        let db = &ctx.data().database;

        let found = match name.as_deref() {
            Some(name) => {
                let lowered = name.to_lowercase();
                budget::list_budgets(db, &user, None)
                    .await?
                    .into_iter()
                    .find(|b| b.name.to_lowercase() == lowered)
            }
            None => budget::current_budget(db, &user, today()).await?,
        };

        let Some(found) = found else {
            ctx.say("❌ No matching budget. Create one first.").await?;
            return Ok(());
        };

        let summary = spending::budget_summary(db, &user, found.id).await?;
        ctx.say(render_budget_summary(&summary)?).await?;
        Ok(())
    }

    /// Shows income, spending and savings for a month.
    #[poise::command(slash_command, prefix_command)]
    pub async fn monthly(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Year (defaults to the current year)"] year: Option<i32>,
        #[description = "Month 1-12 (defaults to the current month)"] month: Option<u32>,
    ) -> Result<()> {
        let user = user_context(ctx);
        let now = today();
        let report = report::monthly_report(
            &ctx.data().database,
            &user,
            year.unwrap_or_else(|| now.year()),
            month.unwrap_or_else(|| now.month()),
        )
        .await?;
        ctx.say(render_monthly_report(&report)?).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
