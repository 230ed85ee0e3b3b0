//! Shared test utilities for `BudgetBuddy`.
//!
//! Helpers for setting up an in-memory database and creating test entities with
//! sensible defaults. Callers pass the [`UserContext`] the entity belongs to.

use crate::{
    core::{
        account, alert,
        allocation::CategoryShare,
        budget::{self, BudgetWithAllocations, NewBudget},
        category::{self, NewCategory},
        expense::{self, NewExpense},
        income::{self, NewIncome},
        ownership::UserContext,
    },
    entities::{self, AlertType},
    errors::Result,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use std::sync::atomic::{AtomicUsize, Ordering};

static ACCOUNT_COUNTER: AtomicUsize = AtomicUsize::new(1);

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Regular user "alice".
pub fn alice() -> UserContext {
    UserContext::user("alice")
}

/// Regular user "bob".
pub fn bob() -> UserContext {
    UserContext::user("bob")
}

/// Administrator "root".
pub fn admin() -> UserContext {
    UserContext::admin("root")
}

/// Shorthand for building a date in tests.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

/// Creates a test account with a unique name.
///
/// # Defaults
/// * `name`: `"Account N"`
/// * `currency`: `"EUR"`
pub async fn create_test_account(
    db: &DatabaseConnection,
    ctx: &UserContext,
    balance: Decimal,
) -> Result<entities::account::Model> {
    let n = ACCOUNT_COUNTER.fetch_add(1, Ordering::Relaxed);
    account::create_account(db, ctx, &format!("Account {n}"), balance, "EUR").await
}

/// Records a monthly salary on `account_id`, received 2025-05-01.
pub async fn create_test_income(
    db: &DatabaseConnection,
    ctx: &UserContext,
    account_id: i64,
    amount: Decimal,
) -> Result<entities::income::Model> {
    income::create_income(
        db,
        ctx,
        NewIncome {
            account_id,
            source: "Salary".to_string(),
            amount,
            received_on: date(2025, 5, 1),
            periodicity: None,
        },
    )
    .await
}

/// Creates a personal category with no default percentage.
pub async fn create_test_category(
    db: &DatabaseConnection,
    ctx: &UserContext,
    name: &str,
) -> Result<entities::category::Model> {
    category::create_category(
        db,
        ctx,
        NewCategory {
            name: name.to_string(),
            ..Default::default()
        },
    )
    .await
}

/// Creates a global category as the test administrator.
pub async fn create_test_global_category(
    db: &DatabaseConnection,
    name: &str,
    default_percentage: Decimal,
) -> Result<entities::category::Model> {
    category::create_global_category(
        db,
        &admin(),
        NewCategory {
            name: name.to_string(),
            default_percentage,
            ..Default::default()
        },
    )
    .await
}

/// Creates a May 2025 budget split 100% into a personal "General" category.
pub async fn create_test_budget(
    db: &DatabaseConnection,
    ctx: &UserContext,
    total_amount: Decimal,
) -> Result<BudgetWithAllocations> {
    let general = create_test_category(db, ctx, "General").await?;
    budget::create_budget(
        db,
        ctx,
        NewBudget {
            name: "General".to_string(),
            start_date: date(2025, 5, 1),
            end_date: date(2025, 5, 31),
            total_amount,
            shares: vec![CategoryShare::new(general.id, dec!(100))],
        },
    )
    .await
}

/// Sets up the common allocation scenario.
///
/// Global "Food" and "Transport" categories, and alice's "May" budget
/// (2025-05-01 to 2025-05-31, total 1000) split 60/40 into 600 and 400.
/// Returns (db, alice, budget, food allocation, transport allocation).
pub async fn setup_food_transport_budget() -> Result<(
    DatabaseConnection,
    UserContext,
    entities::budget::Model,
    entities::category_allocation::Model,
    entities::category_allocation::Model,
)> {
    let db = setup_test_db().await?;
    let ctx = alice();
    let food = create_test_global_category(&db, "Food", dec!(0)).await?;
    let transport = create_test_global_category(&db, "Transport", dec!(0)).await?;

    let created = budget::create_budget(
        &db,
        &ctx,
        NewBudget {
            name: "May".to_string(),
            start_date: date(2025, 5, 1),
            end_date: date(2025, 5, 31),
            total_amount: dec!(1000),
            shares: vec![
                CategoryShare::new(food.id, dec!(60)),
                CategoryShare::new(transport.id, dec!(40)),
            ],
        },
    )
    .await?;

    let mut allocations = created.allocations.into_iter();
    let (Some(food_alloc), Some(transport_alloc)) = (allocations.next(), allocations.next()) else {
        return Err(crate::errors::Error::validation("expected two allocations"));
    };
    Ok((db, ctx, created.budget, food_alloc, transport_alloc))
}

/// Creates a validated expense dated 2025-05-10.
pub async fn create_test_expense(
    db: &DatabaseConnection,
    ctx: &UserContext,
    allocation_id: i64,
    amount: Decimal,
) -> Result<entities::expense::Model> {
    create_dated_expense(db, ctx, allocation_id, amount, date(2025, 5, 10)).await
}

/// Creates a validated expense on a specific day.
pub async fn create_dated_expense(
    db: &DatabaseConnection,
    ctx: &UserContext,
    allocation_id: i64,
    amount: Decimal,
    spent_on: NaiveDate,
) -> Result<entities::expense::Model> {
    expense::create_expense(
        db,
        ctx,
        NewExpense {
            allocation_id,
            description: "Test expense".to_string(),
            amount,
            spent_on,
            status: None,
        },
    )
    .await
}

/// Creates an active alert.
pub async fn create_test_alert(
    db: &DatabaseConnection,
    ctx: &UserContext,
    allocation_id: i64,
    alert_type: AlertType,
    threshold: Decimal,
) -> Result<entities::alert::Model> {
    alert::create_alert(db, ctx, allocation_id, alert_type, threshold).await
}
