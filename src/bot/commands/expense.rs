//! Expense Discord commands - `spend` and `expenses`.

use crate::{
    core::{allocation, budget, category, ownership::UserContext},
    entities::category_allocation,
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Finds the allocation of `category_name` in the caller's budget covering `today`.
pub async fn resolve_allocation(
    db: &DatabaseConnection,
    user: &UserContext,
    category_name: &str,
    today: NaiveDate,
) -> Result<category_allocation::Model> {
    let Some(current) = budget::current_budget(db, user, today).await? else {
        return Err(Error::validation(format!("No budget covers {today}")));
    };
    let Some(category) = category::find_category_by_name(db, user, category_name).await? else {
        return Err(Error::validation(format!("Unknown category '{category_name}'")));
    };
    allocation::list_allocations(db, user, current.id)
        .await?
        .into_iter()
        .find(|a| a.category_id == category.id)
        .ok_or_else(|| {
            Error::validation(format!(
                "Budget '{}' has no allocation for '{}'",
                current.name, category.name
            ))
        })
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::resolve_allocation;
    use crate::{
        bot::{BotData, handlers::autocomplete, today, user_context},
        core::{
            alert,
            expense::{self, NewExpense},
            money::decimal_from_f64,
        },
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Records an expense in the current budget.
    ///
    /// The category must have an allocation in the budget covering today. Any
    /// alert on that allocation that is now triggered is reported back.
    #[poise::command(slash_command, prefix_command)]
    pub async fn spend(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Category to spend from"]
        #[autocomplete = "autocomplete::autocomplete_category_name"]
        category: String,
        #[description = "Amount spent"] amount: f64,
        #[description = "Optional description of the expense"] description: Option<String>,
    ) -> Result<()> {
        const DEFAULT_DESCRIPTION: &str = "Expense";

        let user = user_context(ctx);
        let db = &ctx.data().database;
        let amount = decimal_from_f64(amount)?;
        let day = today();

        let allocation = resolve_allocation(db, &user, &category, day).await?;
        let created = expense::create_expense(
            db,
            &user,
            NewExpense {
                allocation_id: allocation.id,
                description: description.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
                amount,
                spent_on: day,
                status: None,
            },
        )
        .await?;

        let mut reply = format!(
            "✅ Spent {:.2} on {} - {} (Expense ID: {})",
            created.amount, category, created.description, created.id
        );
        for triggered in alert::triggered_alerts(db, &user)
            .await?
            .into_iter()
            .filter(|t| t.alert.allocation_id == allocation.id)
        {
            write!(reply, "\n⚠️ {}", triggered.message)?;
        }

        ctx.say(reply).await?;
        Ok(())
    }

    /// Lists your latest expenses.
    #[poise::command(slash_command, prefix_command)]
    pub async fn expenses(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Only this category"]
        #[autocomplete = "autocomplete::autocomplete_category_name"]
        category: Option<String>,
        #[description = "How many expenses to show (default 10)"] limit: Option<usize>,
    ) -> Result<()> {
        let user = user_context(ctx);
        let db = &ctx.data().database;

        let mut filter = expense::ExpenseFilter::default();
        if let Some(name) = category.as_deref() {
            let Some(found) = crate::core::category::find_category_by_name(db, &user, name).await? else {
                ctx.say(format!("❌ Unknown category '{name}'")).await?;
                return Ok(());
            };
            filter.category_id = Some(found.id);
        }

        let listed = expense::list_expenses(db, &user, &filter).await?;
        if listed.is_empty() {
            ctx.say("No expenses recorded yet.").await?;
            return Ok(());
        }

        let mut out = String::from("🧾 **Latest expenses**\n");
        for item in listed.iter().take(limit.unwrap_or(10).min(25)) {
            writeln!(
                out,
                "`#{}` {} {:.2} - {} ({})",
                item.id,
                item.spent_on,
                item.amount,
                item.description,
                item.status.label()
            )?;
        }
        ctx.say(out).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
