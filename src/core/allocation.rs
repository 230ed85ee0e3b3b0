//! Category allocation business logic.
//!
//! An allocation stores both an amount and a percentage of its budget total.
//! The two are kept in step by these rules:
//!
//! - A whole set of shares is accepted only when its percentages add up to 100
//!   (within 0.01). Amounts are then derived from the budget total.
//! - Editing one allocation goes through [`AllocationEdit`]: the field that was
//!   not supplied is recomputed from the one that was.
//! - [`rebalance_allocations`] goes the other way and derives percentages from the
//!   current amounts.
//!
//! An allocation with expenses can never be deleted, whether directly or by
//! replacing the budget's share set.

use crate::{
    core::{
        budget::find_owned_budget,
        category::find_visible_category,
        money::{
            HUNDRED, amount_for_percentage, ensure_non_negative, ensure_percentage,
            percentage_of, round2, sums_to_hundred,
        },
        ownership::{UserContext, ensure_owner},
    },
    entities::{
        Alert, Budget, CategoryAllocation, Expense, alert, budget, category_allocation, expense,
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument};

const ENTITY: &str = "Allocation";

/// Requested share of a budget for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryShare {
    /// Category receiving the share
    pub category_id: i64,
    /// Share of the budget total, 0-100
    pub percentage: Decimal,
}

impl CategoryShare {
    /// Share of `percentage` for a category.
    #[must_use]
    pub const fn new(category_id: i64, percentage: Decimal) -> Self {
        Self {
            category_id,
            percentage,
        }
    }
}

/// An allocation row computed from a share and a budget total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedAllocation {
    /// Category of the allocation
    pub category_id: i64,
    /// Amount derived from the budget total
    pub allocated_amount: Decimal,
    /// Share of the budget total
    pub percentage: Decimal,
}

/// An edit of a single allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationEdit {
    /// New percentage; the amount follows from the budget total.
    ByPercentage(Decimal),
    /// New amount; the percentage follows from the budget total.
    ByAmount(Decimal),
    /// Both values, stored as given.
    ByBoth {
        /// Share of the budget total
        percentage: Decimal,
        /// Allocated amount
        amount: Decimal,
    },
}

impl AllocationEdit {
    /// Resolves the edit into the `(amount, percentage)` pair to store.
    ///
    /// With [`AllocationEdit::ByAmount`] and a zero budget total the percentage
    /// cannot be derived and `current_percentage` is kept.
    pub fn resolve(
        self,
        budget_total: Decimal,
        current_percentage: Decimal,
    ) -> Result<(Decimal, Decimal)> {
        match self {
            Self::ByPercentage(percentage) => {
                ensure_percentage(percentage)?;
                Ok((
                    amount_for_percentage(percentage, budget_total),
                    round2(percentage),
                ))
            }
            Self::ByAmount(amount) => {
                ensure_non_negative(amount)?;
                let percentage = if budget_total > Decimal::ZERO {
                    round2(percentage_of(amount, budget_total))
                } else {
                    current_percentage
                };
                Ok((round2(amount), percentage))
            }
            Self::ByBoth { percentage, amount } => {
                ensure_percentage(percentage)?;
                ensure_non_negative(amount)?;
                Ok((round2(amount), round2(percentage)))
            }
        }
    }
}

/// Checks a share set: each percentage in 0-100, no category twice, and a sum of
/// 100 within tolerance.
pub fn validate_shares(shares: &[CategoryShare]) -> Result<()> {
    let mut seen = HashSet::new();
    for share in shares {
        ensure_percentage(share.percentage)?;
        if !seen.insert(share.category_id) {
            return Err(Error::validation(format!(
                "Category {} appears more than once",
                share.category_id
            )));
        }
    }

    let total: Decimal = shares.iter().map(|s| s.percentage).sum();
    if !sums_to_hundred(total) {
        return Err(Error::AllocationSum { total });
    }
    Ok(())
}

/// Validates `shares` and derives each allocation amount from `budget_total`.
pub fn plan_allocations(
    shares: &[CategoryShare],
    budget_total: Decimal,
) -> Result<Vec<PlannedAllocation>> {
    validate_shares(shares)?;
    Ok(shares
        .iter()
        .map(|share| PlannedAllocation {
            category_id: share.category_id,
            allocated_amount: amount_for_percentage(share.percentage, budget_total),
            percentage: round2(share.percentage),
        })
        .collect())
}

/// Percentages proportional to `amounts`, or `None` when they sum to zero.
#[must_use]
pub fn rebalanced_percentages(amounts: &[Decimal]) -> Option<Vec<Decimal>> {
    let total: Decimal = amounts.iter().copied().sum();
    if total <= Decimal::ZERO {
        return None;
    }
    Some(
        amounts
            .iter()
            .map(|amount| round2(amount / total * HUNDRED))
            .collect(),
    )
}

pub(crate) async fn expense_count<C>(conn: &C, allocation_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    Expense::find()
        .filter(expense::Column::AllocationId.eq(allocation_id))
        .count(conn)
        .await
        .map_err(Into::into)
}

/// Deletes an allocation and its alerts, refusing when expenses reference it.
async fn remove_allocation<C>(conn: &C, allocation: category_allocation::Model) -> Result<()>
where
    C: ConnectionTrait,
{
    let expenses = expense_count(conn, allocation.id).await?;
    if expenses > 0 {
        return Err(Error::conflict(format!(
            "Allocation {} still has {expenses} expense(s)",
            allocation.id
        )));
    }

    Alert::delete_many()
        .filter(alert::Column::AllocationId.eq(allocation.id))
        .exec(conn)
        .await?;
    allocation.delete(conn).await?;
    Ok(())
}

pub(crate) async fn allocations_of<C>(conn: &C, budget_id: i64) -> Result<Vec<category_allocation::Model>>
where
    C: ConnectionTrait,
{
    CategoryAllocation::find()
        .filter(category_allocation::Column::BudgetId.eq(budget_id))
        .order_by_asc(category_allocation::Column::Id)
        .all(conn)
        .await
        .map_err(Into::into)
}

/// Replaces the allocation set of a budget with one derived from `shares`.
///
/// Keyed by category: allocations whose category stays are updated in place and
/// keep their expenses and alerts, new categories are inserted and dropped ones
/// are deleted with their alerts. Dropping a category that has expenses fails with
/// `Conflict`. Nothing is written when the shares are invalid; run this inside a
/// transaction so that a failure part-way leaves the previous set intact.
pub async fn replace_allocation_set<C>(
    conn: &C,
    ctx: &UserContext,
    budget: &budget::Model,
    shares: &[CategoryShare],
) -> Result<Vec<category_allocation::Model>>
where
    C: ConnectionTrait,
{
    let planned = plan_allocations(shares, budget.total_amount)?;
    for share in shares {
        find_visible_category(conn, ctx, share.category_id).await?;
    }

    let mut existing: HashMap<i64, category_allocation::Model> = allocations_of(conn, budget.id)
        .await?
        .into_iter()
        .map(|a| (a.category_id, a))
        .collect();

    for plan in &planned {
        match existing.remove(&plan.category_id) {
            Some(current) => {
                let mut active: category_allocation::ActiveModel = current.into();
                active.allocated_amount = Set(plan.allocated_amount);
                active.percentage = Set(plan.percentage);
                active.update(conn).await?;
            }
            None => {
                category_allocation::ActiveModel {
                    budget_id: Set(budget.id),
                    category_id: Set(plan.category_id),
                    allocated_amount: Set(plan.allocated_amount),
                    percentage: Set(plan.percentage),
                    ..Default::default()
                }
                .insert(conn)
                .await?;
            }
        }
    }

    for (_, dropped) in existing {
        remove_allocation(conn, dropped).await?;
    }

    debug!("Replaced allocation set of budget {}", budget.id);
    allocations_of(conn, budget.id).await
}

/// Replaces a budget's allocations in one transaction. See [`replace_allocation_set`].
#[instrument(skip(db, ctx, shares))]
pub async fn set_allocations(
    db: &DatabaseConnection,
    ctx: &UserContext,
    budget_id: i64,
    shares: &[CategoryShare],
) -> Result<Vec<category_allocation::Model>> {
    let txn = db.begin().await?;
    let budget = find_owned_budget(&txn, ctx, budget_id).await?;
    let allocations = replace_allocation_set(&txn, ctx, &budget, shares).await?;
    txn.commit().await?;

    info!(
        "Set {} allocations on budget {} for user {}",
        allocations.len(),
        budget_id,
        ctx.user_id
    );
    Ok(allocations)
}

/// Loads an allocation together with its budget, checking the caller owns the budget.
pub async fn find_owned_allocation<C>(
    conn: &C,
    ctx: &UserContext,
    allocation_id: i64,
) -> Result<(category_allocation::Model, budget::Model)>
where
    C: ConnectionTrait,
{
    let allocation = CategoryAllocation::find_by_id(allocation_id)
        .one(conn)
        .await?
        .ok_or_else(|| Error::not_found(ENTITY, allocation_id))?;
    let budget = Budget::find_by_id(allocation.budget_id)
        .one(conn)
        .await?
        .ok_or_else(|| Error::not_found("Budget", allocation.budget_id))?;
    ensure_owner(ctx, &budget, ENTITY, allocation_id)?;
    Ok((allocation, budget))
}

/// Adds one allocation to a budget.
///
/// The budget's percentage sum is not checked here; a budget being built one
/// category at a time is temporarily incomplete.
pub async fn add_allocation(
    db: &DatabaseConnection,
    ctx: &UserContext,
    budget_id: i64,
    category_id: i64,
    edit: AllocationEdit,
) -> Result<category_allocation::Model> {
    let budget = find_owned_budget(db, ctx, budget_id).await?;
    let category = find_visible_category(db, ctx, category_id).await?;

    let duplicate = allocations_of(db, budget_id)
        .await?
        .iter()
        .any(|a| a.category_id == category_id);
    if duplicate {
        return Err(Error::validation(format!(
            "Budget '{}' already has an allocation for '{}'",
            budget.name, category.name
        )));
    }

    let (allocated_amount, percentage) = edit.resolve(budget.total_amount, Decimal::ZERO)?;
    let allocation = category_allocation::ActiveModel {
        budget_id: Set(budget_id),
        category_id: Set(category_id),
        allocated_amount: Set(allocated_amount),
        percentage: Set(percentage),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        "Added allocation {} ({}) to budget {}",
        allocation.id, category.name, budget_id
    );
    Ok(allocation)
}

/// Retrieves an allocation of one of the caller's budgets.
pub async fn get_allocation(
    db: &DatabaseConnection,
    ctx: &UserContext,
    allocation_id: i64,
) -> Result<category_allocation::Model> {
    find_owned_allocation(db, ctx, allocation_id)
        .await
        .map(|(allocation, _)| allocation)
}

/// Lists the allocations of one of the caller's budgets.
pub async fn list_allocations(
    db: &DatabaseConnection,
    ctx: &UserContext,
    budget_id: i64,
) -> Result<Vec<category_allocation::Model>> {
    find_owned_budget(db, ctx, budget_id).await?;
    allocations_of(db, budget_id).await
}

/// Applies an [`AllocationEdit`] to a single allocation.
pub async fn update_allocation(
    db: &DatabaseConnection,
    ctx: &UserContext,
    allocation_id: i64,
    edit: AllocationEdit,
) -> Result<category_allocation::Model> {
    let (allocation, budget) = find_owned_allocation(db, ctx, allocation_id).await?;
    let (allocated_amount, percentage) = edit.resolve(budget.total_amount, allocation.percentage)?;

    let mut active: category_allocation::ActiveModel = allocation.into();
    active.allocated_amount = Set(allocated_amount);
    active.percentage = Set(percentage);
    let updated = active.update(db).await?;

    debug!(
        "Allocation {} now {} ({}%)",
        allocation_id, updated.allocated_amount, updated.percentage
    );
    Ok(updated)
}

/// Recomputes every percentage of a budget from the current amounts.
///
/// Leaves the allocations untouched when their amounts sum to zero.
#[instrument(skip(db, ctx))]
pub async fn rebalance_allocations(
    db: &DatabaseConnection,
    ctx: &UserContext,
    budget_id: i64,
) -> Result<Vec<category_allocation::Model>> {
    let txn = db.begin().await?;
    find_owned_budget(&txn, ctx, budget_id).await?;
    let allocations = allocations_of(&txn, budget_id).await?;

    let amounts: Vec<Decimal> = allocations.iter().map(|a| a.allocated_amount).collect();
    let Some(percentages) = rebalanced_percentages(&amounts) else {
        txn.commit().await?;
        return Ok(allocations);
    };

    for (allocation, percentage) in allocations.into_iter().zip(percentages) {
        let mut active: category_allocation::ActiveModel = allocation.into();
        active.percentage = Set(percentage);
        active.update(&txn).await?;
    }
    let rebalanced = allocations_of(&txn, budget_id).await?;
    txn.commit().await?;

    info!("Rebalanced allocations of budget {}", budget_id);
    Ok(rebalanced)
}

/// Recomputes every amount of a budget from its stored percentages and current total.
#[instrument(skip(db, ctx))]
pub async fn recompute_allocation_amounts(
    db: &DatabaseConnection,
    ctx: &UserContext,
    budget_id: i64,
) -> Result<Vec<category_allocation::Model>> {
    let txn = db.begin().await?;
    let budget = find_owned_budget(&txn, ctx, budget_id).await?;

    for allocation in allocations_of(&txn, budget_id).await? {
        let amount = amount_for_percentage(allocation.percentage, budget.total_amount);
        let mut active: category_allocation::ActiveModel = allocation.into();
        active.allocated_amount = Set(amount);
        active.update(&txn).await?;
    }
    let allocations = allocations_of(&txn, budget_id).await?;
    txn.commit().await?;

    info!("Recomputed allocation amounts of budget {}", budget_id);
    Ok(allocations)
}

/// Deletes an allocation and its alerts. Fails with `Conflict` when it has expenses.
pub async fn delete_allocation(db: &DatabaseConnection, ctx: &UserContext, allocation_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let (allocation, _) = find_owned_allocation(&txn, ctx, allocation_id).await?;
    remove_allocation(&txn, allocation).await?;
    txn.commit().await?;

    info!("Deleted allocation {}", allocation_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_plan_allocations_derives_amounts() -> Result<()> {
        let planned = plan_allocations(
            &[CategoryShare::new(1, dec!(60)), CategoryShare::new(2, dec!(40))],
            dec!(1000),
        )?;
        assert_eq!(planned[0].allocated_amount, dec!(600));
        assert_eq!(planned[1].allocated_amount, dec!(400));
        Ok(())
    }

    #[test]
    fn test_validate_shares_tolerance() {
        assert!(
            validate_shares(&[
                CategoryShare::new(1, dec!(33.33)),
                CategoryShare::new(2, dec!(33.33)),
                CategoryShare::new(3, dec!(33.33)),
            ])
            .is_ok()
        );
        assert!(matches!(
            validate_shares(&[CategoryShare::new(1, dec!(60)), CategoryShare::new(2, dec!(35))]),
            Err(Error::AllocationSum { total }) if total == dec!(95)
        ));
        assert!(matches!(
            validate_shares(&[]),
            Err(Error::AllocationSum { total: _ })
        ));
    }

    #[test]
    fn test_validate_shares_rejects_duplicates_and_bad_percentages() {
        assert!(matches!(
            validate_shares(&[CategoryShare::new(1, dec!(50)), CategoryShare::new(1, dec!(50))]),
            Err(Error::Validation { message: _ })
        ));
        assert!(matches!(
            validate_shares(&[CategoryShare::new(1, dec!(120)), CategoryShare::new(2, dec!(-20))]),
            Err(Error::InvalidPercentage { value: _ })
        ));
    }

    #[test]
    fn test_allocation_edit_resolve() -> Result<()> {
        assert_eq!(
            AllocationEdit::ByPercentage(dec!(25)).resolve(dec!(1000), dec!(60))?,
            (dec!(250), dec!(25))
        );
        assert_eq!(
            AllocationEdit::ByAmount(dec!(500)).resolve(dec!(1000), dec!(60))?,
            (dec!(500), dec!(50))
        );
        assert_eq!(
            AllocationEdit::ByBoth {
                percentage: dec!(10),
                amount: dec!(700)
            }
            .resolve(dec!(1000), dec!(60))?,
            (dec!(700), dec!(10))
        );
        Ok(())
    }

    #[test]
    fn test_allocation_edit_by_amount_zero_total_keeps_percentage() -> Result<()> {
        assert_eq!(
            AllocationEdit::ByAmount(dec!(50)).resolve(dec!(0), dec!(60))?,
            (dec!(50), dec!(60))
        );
        Ok(())
    }

    #[test]
    fn test_rebalanced_percentages() {
        assert_eq!(
            rebalanced_percentages(&[dec!(300), dec!(100)]),
            Some(vec![dec!(75), dec!(25)])
        );
        assert_eq!(rebalanced_percentages(&[dec!(0), dec!(0)]), None);
    }

    #[tokio::test]
    async fn test_rejected_share_set_leaves_state_unchanged() -> Result<()> {
        let (db, ctx, budget, food, transport) = setup_food_transport_budget().await?;
        create_test_expense(&db, &ctx, food.id, dec!(650)).await?;

        let result = set_allocations(
            &db,
            &ctx,
            budget.id,
            &[
                CategoryShare::new(food.category_id, dec!(60)),
                CategoryShare::new(transport.category_id, dec!(35)),
            ],
        )
        .await;
        assert!(matches!(result, Err(Error::AllocationSum { total: _ })));

        let allocations = list_allocations(&db, &ctx, budget.id).await?;
        assert_eq!(allocations, vec![food.clone(), transport]);
        assert_eq!(expense_count(&db, food.id).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_replace_keeps_allocations_with_same_category() -> Result<()> {
        let (db, ctx, budget, food, transport) = setup_food_transport_budget().await?;
        create_test_expense(&db, &ctx, food.id, dec!(100)).await?;
        let housing = create_test_global_category(&db, "Housing", dec!(0)).await?;

        let allocations = set_allocations(
            &db,
            &ctx,
            budget.id,
            &[
                CategoryShare::new(food.category_id, dec!(50)),
                CategoryShare::new(transport.category_id, dec!(25)),
                CategoryShare::new(housing.id, dec!(25)),
            ],
        )
        .await?;

        assert_eq!(allocations.len(), 3);
        assert_eq!(allocations[0].id, food.id);
        assert_eq!(allocations[0].allocated_amount, dec!(500));
        assert_eq!(allocations[1].id, transport.id);
        assert_eq!(allocations[2].category_id, housing.id);
        assert_eq!(allocations[2].allocated_amount, dec!(250));
        assert_eq!(expense_count(&db, food.id).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_replace_dropping_allocation_with_expenses_rolls_back() -> Result<()> {
        let (db, ctx, budget, food, transport) = setup_food_transport_budget().await?;
        create_test_expense(&db, &ctx, food.id, dec!(10)).await?;
        let housing = create_test_global_category(&db, "Housing", dec!(0)).await?;

        let result = set_allocations(
            &db,
            &ctx,
            budget.id,
            &[
                CategoryShare::new(transport.category_id, dec!(50)),
                CategoryShare::new(housing.id, dec!(50)),
            ],
        )
        .await;
        assert!(matches!(result, Err(Error::Conflict { message: _ })));

        let allocations = list_allocations(&db, &ctx, budget.id).await?;
        assert_eq!(allocations, vec![food, transport]);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_allocation_duplicate_category() -> Result<()> {
        let (db, ctx, budget, food, _transport) = setup_food_transport_budget().await?;

        let result = add_allocation(
            &db,
            &ctx,
            budget.id,
            food.category_id,
            AllocationEdit::ByPercentage(dec!(10)),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));

        let housing = create_test_global_category(&db, "Housing", dec!(0)).await?;
        let added = add_allocation(
            &db,
            &ctx,
            budget.id,
            housing.id,
            AllocationEdit::ByAmount(dec!(250)),
        )
        .await?;
        assert_eq!(added.percentage, dec!(25));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_allocation_by_amount() -> Result<()> {
        let (db, ctx, _budget, food, _transport) = setup_food_transport_budget().await?;

        let updated = update_allocation(&db, &ctx, food.id, AllocationEdit::ByAmount(dec!(700))).await?;
        assert_eq!(updated.allocated_amount, dec!(700));
        assert_eq!(updated.percentage, dec!(70));

        let result = update_allocation(&db, &bob(), food.id, AllocationEdit::ByAmount(dec!(1))).await;
        assert!(matches!(result, Err(Error::Forbidden { entity: "Allocation", id: _ })));
        Ok(())
    }

    #[tokio::test]
    async fn test_rebalance_after_manual_amount_edits() -> Result<()> {
        let (db, ctx, budget, food, transport) = setup_food_transport_budget().await?;
        update_allocation(
            &db,
            &ctx,
            food.id,
            AllocationEdit::ByBoth {
                percentage: dec!(60),
                amount: dec!(300),
            },
        )
        .await?;
        update_allocation(
            &db,
            &ctx,
            transport.id,
            AllocationEdit::ByBoth {
                percentage: dec!(40),
                amount: dec!(100),
            },
        )
        .await?;

        let allocations = rebalance_allocations(&db, &ctx, budget.id).await?;
        assert_eq!(allocations[0].percentage, dec!(75));
        assert_eq!(allocations[1].percentage, dec!(25));
        assert_eq!(allocations[0].allocated_amount, dec!(300));
        Ok(())
    }

    #[tokio::test]
    async fn test_recompute_allocation_amounts_after_total_change() -> Result<()> {
        let (db, ctx, budget, _food, _transport) = setup_food_transport_budget().await?;
        crate::core::budget::update_budget(
            &db,
            &ctx,
            budget.id,
            crate::core::budget::BudgetUpdate {
                total_amount: Some(dec!(2000)),
                ..Default::default()
            },
        )
        .await?;

        // A total change alone doesn't touch the amounts
        let allocations = list_allocations(&db, &ctx, budget.id).await?;
        assert_eq!(allocations[0].allocated_amount, dec!(600));

        let allocations = recompute_allocation_amounts(&db, &ctx, budget.id).await?;
        assert_eq!(allocations[0].allocated_amount, dec!(1200));
        assert_eq!(allocations[1].allocated_amount, dec!(800));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_allocation_with_expense_conflicts() -> Result<()> {
        let (db, ctx, budget, food, transport) = setup_food_transport_budget().await?;
        create_test_expense(&db, &ctx, food.id, dec!(20)).await?;
        create_test_alert(&db, &ctx, transport.id, crate::entities::AlertType::Amount, dec!(50)).await?;

        let result = delete_allocation(&db, &ctx, food.id).await;
        assert!(matches!(result, Err(Error::Conflict { message: _ })));
        assert_eq!(expense_count(&db, food.id).await?, 1);

        delete_allocation(&db, &ctx, transport.id).await?;
        let allocations = list_allocations(&db, &ctx, budget.id).await?;
        assert_eq!(allocations, vec![food]);
        assert_eq!(Alert::find().count(&db).await?, 0);
        Ok(())
    }
}
