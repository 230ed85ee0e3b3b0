//! Account Discord commands - `accounts` and `income`.

use crate::{
    core::{account, ownership::UserContext},
    entities::account as account_entity,
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Finds one of the caller's accounts by name, ignoring case.
pub async fn find_account_by_name(
    db: &DatabaseConnection,
    user: &UserContext,
    name: &str,
) -> Result<Option<account_entity::Model>> {
    let lowered = name.trim().to_lowercase();
    Ok(account::list_accounts(db, user)
        .await?
        .into_iter()
        .find(|a| a.name.to_lowercase() == lowered))
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::find_account_by_name;
    use crate::{
        bot::{BotData, handlers::autocomplete, today, user_context},
        core::{
            account, budget,
            income::{self, NewIncome},
            money::decimal_from_f64,
            report::format_money,
        },
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Lists your accounts and their balances.
    #[poise::command(slash_command, prefix_command)]
    pub async fn accounts(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let user = user_context(ctx);
        let db = &ctx.data().database;
        let listed = account::list_accounts(db, &user).await?;

        if listed.is_empty() {
            ctx.say("You have no accounts yet.").await?;
            return Ok(());
        }

        let mut out = String::from("🏦 **Accounts**\n");
        for item in &listed {
            writeln!(out, "• {}: {}", item.name, format_money(item.balance, &item.currency))?;
        }
        write!(out, "\nTotal: {:.2}", account::total_balance(db, &user).await?)?;
        ctx.say(out).await?;
        Ok(())
    }

    /// Records an income on one of your accounts.
    #[poise::command(slash_command, prefix_command)]
    pub async fn income(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Account receiving the income"]
        #[autocomplete = "autocomplete::autocomplete_account_name"]
        account_name: String,
        #[description = "Amount received"] amount: f64,
        #[description = "Where the money comes from"] source: Option<String>,
        #[description = "Also create this month's budget from the income"] create_budget: Option<bool>,
    ) -> Result<()> {
        const DEFAULT_SOURCE: &str = "Income";

        let user = user_context(ctx);
        let db = &ctx.data().database;
        let amount = decimal_from_f64(amount)?;
        let day = today();

        let Some(target) = find_account_by_name(db, &user, &account_name).await? else {
            ctx.say(format!(
                "❌ Account '{account_name}' not found. Use `/accounts` to see your accounts."
            ))
            .await?;
            return Ok(());
        };

        let recorded = income::create_income(
            db,
            &user,
            NewIncome {
                account_id: target.id,
                source: source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
                amount,
                received_on: day,
                periodicity: None,
            },
        )
        .await?;

        let mut reply = format!(
            "✅ Recorded {} from {} on '{}' (Income ID: {})",
            format_money(recorded.amount, &target.currency),
            recorded.source,
            target.name,
            recorded.id
        );
        if create_budget.unwrap_or(false) {
            let created = budget::create_budget_from_income(db, &user, amount, day).await?;
            write!(
                reply,
                "\n📊 Created budget '{}' with {} categories",
                created.budget.name,
                created.allocations.len()
            )?;
        }
        ctx.say(reply).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_find_account_by_name_is_scoped_and_case_insensitive() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = alice();
        let created = account::create_account(&db, &ctx, "Checking", dec!(10), "EUR").await?;
        account::create_account(&db, &bob(), "Savings", dec!(10), "EUR").await?;

        let found = find_account_by_name(&db, &ctx, " checking ").await?;
        assert_eq!(found.map(|a| a.id), Some(created.id));
        assert!(find_account_by_name(&db, &ctx, "Savings").await?.is_none());
        Ok(())
    }
}
