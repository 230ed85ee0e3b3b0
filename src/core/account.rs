//! Account business logic - Handles all account-related operations.
//!
//! Accounts hold the money balances credited by incomes. Balance adjustments are
//! done with a single `UPDATE ... SET balance = balance + delta` statement so two
//! concurrent adjustments can never overwrite each other.

use crate::{
    core::{
        money::{ensure_non_negative, round2},
        ownership::{UserContext, ensure_owner},
        validation::{currency_code, required_text},
    },
    entities::{Account, Income, account, income},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*, sea_query::Expr};
use tracing::{debug, info};

const ENTITY: &str = "Account";

/// Fields that can be changed on an existing account.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    /// New display name
    pub name: Option<String>,
    /// New balance, replacing the current one
    pub balance: Option<Decimal>,
    /// New currency code
    pub currency: Option<String>,
}

/// Creates a new account for the calling user.
///
/// The name must be non-empty (at most 100 characters), the opening balance
/// non-negative and the currency a 3-letter code.
pub async fn create_account(
    db: &DatabaseConnection,
    ctx: &UserContext,
    name: &str,
    balance: Decimal,
    currency: &str,
) -> Result<account::Model> {
    let name = required_text("Account name", name, 100)?;
    ensure_non_negative(balance)?;
    let currency = currency_code(currency)?;

    let account = account::ActiveModel {
        user_id: Set(ctx.user_id.clone()),
        name: Set(name),
        balance: Set(round2(balance)),
        currency: Set(currency),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = account.insert(db).await?;
    info!("Created account {} for user {}", result.id, ctx.user_id);
    Ok(result)
}

/// Loads an account and checks it belongs to the caller.
pub async fn find_owned_account<C>(
    conn: &C,
    ctx: &UserContext,
    account_id: i64,
) -> Result<account::Model>
where
    C: ConnectionTrait,
{
    let account = Account::find_by_id(account_id)
        .one(conn)
        .await?
        .ok_or_else(|| Error::not_found(ENTITY, account_id))?;
    ensure_owner(ctx, &account, ENTITY, account_id)?;
    Ok(account)
}

/// Retrieves one of the caller's accounts.
pub async fn get_account(
    db: &DatabaseConnection,
    ctx: &UserContext,
    account_id: i64,
) -> Result<account::Model> {
    find_owned_account(db, ctx, account_id).await
}

/// Lists the caller's accounts ordered by name.
pub async fn list_accounts(db: &DatabaseConnection, ctx: &UserContext) -> Result<Vec<account::Model>> {
    Account::find()
        .filter(account::Column::UserId.eq(&ctx.user_id))
        .order_by_asc(account::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies an [`AccountUpdate`] to one of the caller's accounts.
pub async fn update_account(
    db: &DatabaseConnection,
    ctx: &UserContext,
    account_id: i64,
    update: AccountUpdate,
) -> Result<account::Model> {
    let account = find_owned_account(db, ctx, account_id).await?;
    let mut active: account::ActiveModel = account.into();

    if let Some(name) = update.name {
        active.name = Set(required_text("Account name", &name, 100)?);
    }
    if let Some(balance) = update.balance {
        ensure_non_negative(balance)?;
        active.balance = Set(round2(balance));
    }
    if let Some(currency) = update.currency {
        active.currency = Set(currency_code(&currency)?);
    }

    active.update(db).await.map_err(Into::into)
}

/// Deletes one of the caller's accounts.
///
/// Accounts still credited by incomes cannot be deleted; the incomes must be
/// removed (which also reverses their balance effect) first.
pub async fn delete_account(db: &DatabaseConnection, ctx: &UserContext, account_id: i64) -> Result<()> {
    let account = find_owned_account(db, ctx, account_id).await?;

    let income_count = Income::find()
        .filter(income::Column::AccountId.eq(account_id))
        .count(db)
        .await?;
    if income_count > 0 {
        return Err(Error::conflict(format!(
            "Account '{}' still has {income_count} income(s)",
            account.name
        )));
    }

    account.delete(db).await?;
    info!("Deleted account {} for user {}", account_id, ctx.user_id);
    Ok(())
}

/// Adds `delta` to an account balance in a single atomic statement.
///
/// Meant to run inside the transaction of the write that causes the adjustment
/// (income create/update/delete). Returns the updated account.
pub async fn adjust_account_balance<C>(conn: &C, account_id: i64, delta: Decimal) -> Result<account::Model>
where
    C: ConnectionTrait,
{
    let result = Account::update_many()
        .col_expr(
            account::Column::Balance,
            Expr::col(account::Column::Balance).add(delta),
        )
        .filter(account::Column::Id.eq(account_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found(ENTITY, account_id));
    }
    debug!("Adjusted account {} balance by {}", account_id, delta);

    let mut account = Account::find_by_id(account_id)
        .one(conn)
        .await?
        .ok_or_else(|| Error::not_found(ENTITY, account_id))?;
    account.balance = round2(account.balance);
    Ok(account)
}

/// Sum of the balances of all the caller's accounts.
pub async fn total_balance(db: &DatabaseConnection, ctx: &UserContext) -> Result<Decimal> {
    let accounts = list_accounts(db, ctx).await?;
    Ok(round2(accounts.iter().map(|a| a.balance).sum()))
}
