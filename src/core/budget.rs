//! Budget business logic - Handles all budget-related operations.
//!
//! A budget is a total amount over a closed date range, split across categories
//! by its allocation set. Creating a budget and replacing its allocations always
//! happen in one database transaction.

use crate::{
    core::{
        allocation::{CategoryShare, allocations_of, expense_count, replace_allocation_set},
        category::list_global_categories,
        money::{ensure_non_negative, round2},
        ownership::{UserContext, ensure_owner},
        validation::{date_range, required_text},
    },
    entities::{Alert, Budget, CategoryAllocation, alert, budget, category_allocation},
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

const ENTITY: &str = "Budget";

/// Input for creating a budget.
#[derive(Debug, Clone)]
pub struct NewBudget {
    /// Display name
    pub name: String,
    /// First day covered
    pub start_date: NaiveDate,
    /// Last day covered
    pub end_date: NaiveDate,
    /// Amount split across the allocations
    pub total_amount: Decimal,
    /// Category shares; the global default shares are used when empty
    pub shares: Vec<CategoryShare>,
}

/// Fields that can be changed on an existing budget.
///
/// When `shares` is set the allocation set is replaced and amounts derive from the
/// new (or stored) total. Changing only the total leaves allocation amounts alone.
#[derive(Debug, Clone, Default)]
pub struct BudgetUpdate {
    /// New display name
    pub name: Option<String>,
    /// New first day
    pub start_date: Option<NaiveDate>,
    /// New last day
    pub end_date: Option<NaiveDate>,
    /// New total; allocation amounts are recomputed
    pub total_amount: Option<Decimal>,
    /// Replacement category shares
    pub shares: Option<Vec<CategoryShare>>,
}

/// A budget together with its allocation set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetWithAllocations {
    /// The stored budget
    pub budget: budget::Model,
    /// Its allocation rows
    pub allocations: Vec<category_allocation::Model>,
}

/// Share set built from the global categories with a positive default percentage.
pub async fn default_shares<C>(conn: &C) -> Result<Vec<CategoryShare>>
where
    C: ConnectionTrait,
{
    Ok(list_global_categories(conn)
        .await?
        .into_iter()
        .filter(|c| c.default_percentage > Decimal::ZERO)
        .map(|c| CategoryShare::new(c.id, c.default_percentage))
        .collect())
}

/// Loads a budget and checks the caller owns it.
pub async fn find_owned_budget<C>(conn: &C, ctx: &UserContext, budget_id: i64) -> Result<budget::Model>
where
    C: ConnectionTrait,
{
    let budget = Budget::find_by_id(budget_id)
        .one(conn)
        .await?
        .ok_or_else(|| Error::not_found(ENTITY, budget_id))?;
    ensure_owner(ctx, &budget, ENTITY, budget_id)?;
    Ok(budget)
}

/// Creates a budget and its allocation set atomically.
///
/// # Arguments
/// * `db` - Database connection
/// * `ctx` - Calling user
/// * `input` - Budget fields and category shares
///
/// # Errors
/// - `Validation` for a blank name or an end date not after the start date
/// - `InvalidAmount` for a negative total
/// - `AllocationSum` when the shares don't add up to 100
#[instrument(skip(db, ctx, input), fields(user = %ctx.user_id))]
pub async fn create_budget(
    db: &DatabaseConnection,
    ctx: &UserContext,
    input: NewBudget,
) -> Result<BudgetWithAllocations> {
    let name = required_text("Budget name", &input.name, 100)?;
    date_range(input.start_date, input.end_date)?;
    ensure_non_negative(input.total_amount)?;

    let txn = db.begin().await?;

    let shares = if input.shares.is_empty() {
        default_shares(&txn).await?
    } else {
        input.shares
    };

    let budget = budget::ActiveModel {
        user_id: Set(ctx.user_id.clone()),
        name: Set(name),
        start_date: Set(input.start_date),
        end_date: Set(input.end_date),
        total_amount: Set(round2(input.total_amount)),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let allocations = replace_allocation_set(&txn, ctx, &budget, &shares).await?;
    txn.commit().await?;

    info!(
        "Created budget '{}' ({}) with {} allocations",
        budget.name,
        budget.id,
        allocations.len()
    );
    Ok(BudgetWithAllocations {
        budget,
        allocations,
    })
}

/// Updates a budget, optionally replacing its allocation set, in one transaction.
#[instrument(skip(db, ctx, update), fields(user = %ctx.user_id))]
pub async fn update_budget(
    db: &DatabaseConnection,
    ctx: &UserContext,
    budget_id: i64,
    update: BudgetUpdate,
) -> Result<BudgetWithAllocations> {
    let txn = db.begin().await?;
    let budget = find_owned_budget(&txn, ctx, budget_id).await?;

    let start = update.start_date.unwrap_or(budget.start_date);
    let end = update.end_date.unwrap_or(budget.end_date);
    date_range(start, end)?;

    let mut active: budget::ActiveModel = budget.into();
    if let Some(name) = update.name {
        active.name = Set(required_text("Budget name", &name, 100)?);
    }
    if let Some(total) = update.total_amount {
        ensure_non_negative(total)?;
        active.total_amount = Set(round2(total));
    }
    active.start_date = Set(start);
    active.end_date = Set(end);
    let budget = active.update(&txn).await?;

    let allocations = match update.shares {
        Some(shares) => replace_allocation_set(&txn, ctx, &budget, &shares).await?,
        None => allocations_of(&txn, budget_id).await?,
    };
    txn.commit().await?;

    info!("Updated budget {}", budget_id);
    Ok(BudgetWithAllocations {
        budget,
        allocations,
    })
}

/// Deletes a budget with its allocations and alerts.
///
/// Refused with `Conflict` while any allocation has expenses.
#[instrument(skip(db, ctx), fields(user = %ctx.user_id))]
pub async fn delete_budget(db: &DatabaseConnection, ctx: &UserContext, budget_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let budget = find_owned_budget(&txn, ctx, budget_id).await?;
    let allocations = allocations_of(&txn, budget_id).await?;

    for allocation in &allocations {
        let expenses = expense_count(&txn, allocation.id).await?;
        if expenses > 0 {
            return Err(Error::conflict(format!(
                "Budget '{}' still has expenses",
                budget.name
            )));
        }
    }

    let allocation_ids: Vec<i64> = allocations.iter().map(|a| a.id).collect();
    Alert::delete_many()
        .filter(alert::Column::AllocationId.is_in(allocation_ids))
        .exec(&txn)
        .await?;
    CategoryAllocation::delete_many()
        .filter(category_allocation::Column::BudgetId.eq(budget_id))
        .exec(&txn)
        .await?;
    budget.delete(&txn).await?;
    txn.commit().await?;

    info!("Deleted budget {}", budget_id);
    Ok(())
}

/// Retrieves one of the caller's budgets with its allocations.
pub async fn get_budget(
    db: &DatabaseConnection,
    ctx: &UserContext,
    budget_id: i64,
) -> Result<BudgetWithAllocations> {
    let budget = find_owned_budget(db, ctx, budget_id).await?;
    let allocations = allocations_of(db, budget_id).await?;
    Ok(BudgetWithAllocations {
        budget,
        allocations,
    })
}

/// Lists the caller's budgets, newest start date first.
///
/// With a range, only budgets overlapping `[from, to]` are returned.
pub async fn list_budgets(
    db: &DatabaseConnection,
    ctx: &UserContext,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<Vec<budget::Model>> {
    let mut query = Budget::find().filter(budget::Column::UserId.eq(&ctx.user_id));
    if let Some((from, to)) = range {
        query = query
            .filter(budget::Column::StartDate.lte(to))
            .filter(budget::Column::EndDate.gte(from));
    }
    query
        .order_by_desc(budget::Column::StartDate)
        .order_by_desc(budget::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Budgets of the caller overlapping the given period.
pub async fn budgets_for_period(
    db: &DatabaseConnection,
    ctx: &UserContext,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<budget::Model>> {
    list_budgets(db, ctx, Some((from, to))).await
}

/// The caller's budget covering `today`, if any. The most recently started
/// one wins when several do.
pub async fn current_budget(
    db: &DatabaseConnection,
    ctx: &UserContext,
    today: NaiveDate,
) -> Result<Option<budget::Model>> {
    Ok(list_budgets(db, ctx, Some((today, today)))
        .await?
        .into_iter()
        .next())
}

/// First and last day of the calendar month containing `day`.
#[must_use]
pub fn month_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = day.with_day(1).unwrap_or(day);
    let next_month = first
        .checked_add_months(chrono::Months::new(1))
        .unwrap_or(first);
    let last = next_month.pred_opt().unwrap_or(first);
    (first, last)
}

/// Creates a budget spanning the calendar month of an income, using the
/// default category shares.
pub async fn create_budget_from_income(
    db: &DatabaseConnection,
    ctx: &UserContext,
    amount: Decimal,
    received_on: NaiveDate,
) -> Result<BudgetWithAllocations> {
    let (start_date, end_date) = month_bounds(received_on);
    create_budget(
        db,
        ctx,
        NewBudget {
            name: format!("Budget {}", received_on.format("%B %Y")),
            start_date,
            end_date,
            total_amount: amount,
            shares: Vec::new(),
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, PaginatorTrait};

    fn may_budget(shares: Vec<CategoryShare>) -> NewBudget {
        NewBudget {
            name: "May".to_string(),
            start_date: date(2025, 5, 1),
            end_date: date(2025, 5, 31),
            total_amount: dec!(1000),
            shares,
        }
    }

    #[tokio::test]
    async fn test_create_budget_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let ctx = alice();

        let mut input = may_budget(Vec::new());
        input.name = " ".to_string();
        assert!(matches!(
            create_budget(&db, &ctx, input).await,
            Err(Error::Validation { message: _ })
        ));

        let mut input = may_budget(Vec::new());
        input.end_date = input.start_date;
        assert!(matches!(
            create_budget(&db, &ctx, input).await,
            Err(Error::Validation { message: _ })
        ));

        let mut input = may_budget(Vec::new());
        input.total_amount = dec!(-5);
        assert!(matches!(
            create_budget(&db, &ctx, input).await,
            Err(Error::InvalidAmount { amount: _ })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_budget_with_shares() -> Result<()> {
        let db = setup_test_db().await?;
        let food = create_test_global_category(&db, "Food", dec!(0)).await?;
        let transport = create_test_global_category(&db, "Transport", dec!(0)).await?;

        let created = create_budget(
            &db,
            &alice(),
            may_budget(vec![
                CategoryShare::new(food.id, dec!(60)),
                CategoryShare::new(transport.id, dec!(40)),
            ]),
        )
        .await?;

        assert_eq!(created.allocations.len(), 2);
        assert_eq!(created.allocations[0].allocated_amount, dec!(600));
        assert_eq!(created.allocations[1].allocated_amount, dec!(400));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_budget_invalid_shares_rolls_back() -> Result<()> {
        let db = setup_test_db().await?;
        let food = create_test_global_category(&db, "Food", dec!(0)).await?;

        let result = create_budget(&db, &alice(), may_budget(vec![CategoryShare::new(food.id, dec!(95))])).await;
        assert!(matches!(result, Err(Error::AllocationSum { total: _ })));
        assert_eq!(Budget::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_budget_defaults_to_global_shares() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_global_category(&db, "Housing", dec!(70)).await?;
        create_test_global_category(&db, "Food", dec!(30)).await?;
        create_test_global_category(&db, "Unused", dec!(0)).await?;

        let created = create_budget(&db, &alice(), may_budget(Vec::new())).await?;
        let amounts: Vec<Decimal> = created.allocations.iter().map(|a| a.allocated_amount).collect();
        assert_eq!(amounts, vec![dec!(700), dec!(300)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_budget_with_other_users_category_forbidden() -> Result<()> {
        let db = setup_test_db().await?;
        let private = create_test_category(&db, &bob(), "Hobby").await?;

        let result = create_budget(&db, &alice(), may_budget(vec![CategoryShare::new(private.id, dec!(100))])).await;
        assert!(matches!(result, Err(Error::Forbidden { entity: "Category", id: _ })));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_budget_replaces_shares_with_new_total() -> Result<()> {
        let (db, ctx, budget, food, transport) = setup_food_transport_budget().await?;

        let updated = update_budget(
            &db,
            &ctx,
            budget.id,
            BudgetUpdate {
                name: Some("May (revised)".to_string()),
                total_amount: Some(dec!(2000)),
                shares: Some(vec![
                    CategoryShare::new(food.category_id, dec!(50)),
                    CategoryShare::new(transport.category_id, dec!(50)),
                ]),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.budget.name, "May (revised)");
        assert_eq!(updated.budget.total_amount, dec!(2000));
        assert_eq!(updated.allocations[0].allocated_amount, dec!(1000));
        assert_eq!(updated.allocations[1].allocated_amount, dec!(1000));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_budget_rejects_bad_dates() -> Result<()> {
        let (db, ctx, budget, _food, _transport) = setup_food_transport_budget().await?;

        let result = update_budget(
            &db,
            &ctx,
            budget.id,
            BudgetUpdate {
                end_date: Some(date(2025, 4, 1)),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));
        assert_eq!(get_budget(&db, &ctx, budget.id).await?.budget, budget);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_budget_with_expenses_conflicts() -> Result<()> {
        let (db, ctx, budget, food, transport) = setup_food_transport_budget().await?;
        let expense = create_test_expense(&db, &ctx, food.id, dec!(5)).await?;
        create_test_alert(&db, &ctx, transport.id, crate::entities::AlertType::Remaining, dec!(50)).await?;

        let result = delete_budget(&db, &ctx, budget.id).await;
        assert!(matches!(result, Err(Error::Conflict { message: _ })));
        assert_eq!(get_budget(&db, &ctx, budget.id).await?.allocations.len(), 2);

        crate::core::expense::delete_expense(&db, &ctx, expense.id).await?;
        delete_budget(&db, &ctx, budget.id).await?;
        assert_eq!(Budget::find().count(&db).await?, 0);
        assert_eq!(CategoryAllocation::find().count(&db).await?, 0);
        assert_eq!(Alert::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_budget_of_other_user_forbidden() -> Result<()> {
        let (db, _ctx, budget, _food, _transport) = setup_food_transport_budget().await?;
        assert!(matches!(
            get_budget(&db, &bob(), budget.id).await,
            Err(Error::Forbidden { entity: "Budget", id: _ })
        ));
        assert!(matches!(
            delete_budget(&db, &bob(), budget.id).await,
            Err(Error::Forbidden { entity: "Budget", id: _ })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_current_budget_and_period_overlap() -> Result<()> {
        let (db, ctx, budget, _food, _transport) = setup_food_transport_budget().await?;

        let current = current_budget(&db, &ctx, date(2025, 5, 15)).await?;
        assert_eq!(current.map(|b| b.id), Some(budget.id));
        assert!(current_budget(&db, &ctx, date(2025, 6, 1)).await?.is_none());
        assert!(current_budget(&db, &bob(), date(2025, 5, 15)).await?.is_none());

        let overlapping = budgets_for_period(&db, &ctx, date(2025, 5, 31), date(2025, 6, 30)).await?;
        assert_eq!(overlapping.len(), 1);
        assert!(budgets_for_period(&db, &ctx, date(2025, 6, 1), date(2025, 6, 30)).await?.is_empty());
        Ok(())
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(month_bounds(date(2024, 2, 14)), (date(2024, 2, 1), date(2024, 2, 29)));
        assert_eq!(month_bounds(date(2025, 12, 31)), (date(2025, 12, 1), date(2025, 12, 31)));
    }

    #[tokio::test]
    async fn test_create_budget_from_income() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_global_category(&db, "Housing", dec!(50)).await?;
        create_test_global_category(&db, "Food", dec!(50)).await?;

        let created = create_budget_from_income(&db, &alice(), dec!(3000), date(2025, 3, 10)).await?;
        assert_eq!(created.budget.name, "Budget March 2025");
        assert_eq!(created.budget.start_date, date(2025, 3, 1));
        assert_eq!(created.budget.end_date, date(2025, 3, 31));
        assert_eq!(created.allocations[0].allocated_amount, dec!(1500));
        Ok(())
    }
}
