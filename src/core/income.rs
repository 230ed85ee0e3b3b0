//! Income business logic.
//!
//! Recording an income credits its account. Editing it reverses the previous
//! credit and applies the new one, moving it between accounts when the account
//! changes, and deleting it reverses the credit. Each of these runs in one
//! transaction with the balance adjustments.

use crate::{
    core::{
        account::{adjust_account_balance, find_owned_account},
        expense::DateRange,
        money::{ensure_non_negative, round2},
        ownership::{UserContext, ensure_owner},
        validation::required_text,
    },
    entities::{Income, Periodicity, income},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

const ENTITY: &str = "Income";

/// Input for recording an income.
#[derive(Debug, Clone)]
pub struct NewIncome {
    /// Account credited
    pub account_id: i64,
    /// Where the money comes from
    pub source: String,
    /// Amount received
    pub amount: Decimal,
    /// Day received
    pub received_on: NaiveDate,
    /// Defaults to monthly
    pub periodicity: Option<Periodicity>,
}

/// Fields that can be changed on an existing income.
#[derive(Debug, Clone, Default)]
pub struct IncomeUpdate {
    /// Moves the income to another account
    pub account_id: Option<i64>,
    /// New source
    pub source: Option<String>,
    /// New amount
    pub amount: Option<Decimal>,
    /// New day
    pub received_on: Option<NaiveDate>,
    /// New periodicity
    pub periodicity: Option<Periodicity>,
}

async fn find_owned_income<C>(conn: &C, ctx: &UserContext, income_id: i64) -> Result<income::Model>
where
    C: ConnectionTrait,
{
    let income = Income::find_by_id(income_id)
        .one(conn)
        .await?
        .ok_or_else(|| Error::not_found(ENTITY, income_id))?;
    ensure_owner(ctx, &income, ENTITY, income_id)?;
    Ok(income)
}

/// Records an income and credits its account.
#[instrument(skip(db, ctx, input), fields(user = %ctx.user_id))]
pub async fn create_income(db: &DatabaseConnection, ctx: &UserContext, input: NewIncome) -> Result<income::Model> {
    let source = required_text("Source", &input.source, 100)?;
    ensure_non_negative(input.amount)?;
    let amount = round2(input.amount);

    let txn = db.begin().await?;
    find_owned_account(&txn, ctx, input.account_id).await?;

    let income = income::ActiveModel {
        user_id: Set(ctx.user_id.clone()),
        account_id: Set(input.account_id),
        source: Set(source),
        amount: Set(amount),
        received_on: Set(input.received_on),
        periodicity: Set(input.periodicity.unwrap_or(Periodicity::Monthly)),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    let account = adjust_account_balance(&txn, input.account_id, amount).await?;
    txn.commit().await?;

    info!(
        "Recorded income {} of {} on account {} (balance {})",
        income.id, amount, account.id, account.balance
    );
    Ok(income)
}

/// Retrieves one of the caller's incomes.
pub async fn get_income(db: &DatabaseConnection, ctx: &UserContext, income_id: i64) -> Result<income::Model> {
    find_owned_income(db, ctx, income_id).await
}

/// Lists the caller's incomes, newest first.
pub async fn list_incomes(
    db: &DatabaseConnection,
    ctx: &UserContext,
    account_id: Option<i64>,
    range: Option<DateRange>,
) -> Result<Vec<income::Model>> {
    let mut query = Income::find().filter(income::Column::UserId.eq(&ctx.user_id));
    if let Some(account_id) = account_id {
        query = query.filter(income::Column::AccountId.eq(account_id));
    }
    if let Some((from, to)) = range {
        query = query.filter(income::Column::ReceivedOn.between(from, to));
    }
    query
        .order_by_desc(income::Column::ReceivedOn)
        .order_by_desc(income::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sum of the caller's incomes received in `range`.
pub async fn total_income(db: &DatabaseConnection, ctx: &UserContext, range: Option<DateRange>) -> Result<Decimal> {
    let incomes = list_incomes(db, ctx, None, range).await?;
    Ok(round2(incomes.iter().map(|i| i.amount).sum()))
}

/// Edits an income and moves its credit accordingly.
#[instrument(skip(db, ctx, update), fields(user = %ctx.user_id))]
pub async fn update_income(
    db: &DatabaseConnection,
    ctx: &UserContext,
    income_id: i64,
    update: IncomeUpdate,
) -> Result<income::Model> {
    let txn = db.begin().await?;
    let income = find_owned_income(&txn, ctx, income_id).await?;

    let old_account = income.account_id;
    let old_amount = income.amount;
    let new_account = update.account_id.unwrap_or(old_account);
    let new_amount = match update.amount {
        Some(amount) => {
            ensure_non_negative(amount)?;
            round2(amount)
        }
        None => old_amount,
    };

    let mut active: income::ActiveModel = income.into();
    if new_account != old_account {
        find_owned_account(&txn, ctx, new_account).await?;
        active.account_id = Set(new_account);
    }
    if let Some(source) = update.source {
        active.source = Set(required_text("Source", &source, 100)?);
    }
    if let Some(received_on) = update.received_on {
        active.received_on = Set(received_on);
    }
    if let Some(periodicity) = update.periodicity {
        active.periodicity = Set(periodicity);
    }
    active.amount = Set(new_amount);
    let updated = active.update(&txn).await?;

    if new_account == old_account {
        if new_amount != old_amount {
            adjust_account_balance(&txn, old_account, new_amount - old_amount).await?;
        }
    } else {
        adjust_account_balance(&txn, old_account, -old_amount).await?;
        adjust_account_balance(&txn, new_account, new_amount).await?;
    }
    txn.commit().await?;

    info!("Updated income {}", income_id);
    Ok(updated)
}

/// Deletes an income and reverses its credit.
#[instrument(skip(db, ctx), fields(user = %ctx.user_id))]
pub async fn delete_income(db: &DatabaseConnection, ctx: &UserContext, income_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let income = find_owned_income(&txn, ctx, income_id).await?;
    let (account_id, amount) = (income.account_id, income.amount);

    income.delete(&txn).await?;
    adjust_account_balance(&txn, account_id, -amount).await?;
    txn.commit().await?;

    info!("Deleted income {} and debited {} from account {}", income_id, amount, account_id);
    Ok(())
}
