//! Spend statistics for allocations and budgets.
//!
//! Nothing here is stored: every figure is derived from the expenses at the time
//! of the call.

use crate::{
    core::{
        allocation::{allocations_of, expense_count, find_owned_allocation},
        budget::find_owned_budget,
        expense::{SumScope, sum_expenses},
        money::{percentage_of, round2},
        ownership::UserContext,
    },
    entities::{Category, budget, category_allocation},
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait};

/// Spend figures for one allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationSummary {
    /// The allocation row
    pub allocation: category_allocation::Model,
    /// Its category name
    pub category_name: String,
    /// Allocated amount
    pub allocated: Decimal,
    /// Share of the budget total
    pub percentage: Decimal,
    /// Spent so far
    pub total_spent: Decimal,
    /// Allocated minus spent, negative when overspent
    pub remaining: Decimal,
    /// Spent as a percentage of allocated, 0 when nothing is allocated
    pub percentage_spent: Decimal,
    /// Number of expenses counted
    pub expense_count: u64,
}

impl AllocationSummary {
    /// Derives the summary figures from an allocation and its spend.
    #[must_use]
    pub fn new(
        allocation: category_allocation::Model,
        category_name: String,
        total_spent: Decimal,
        expense_count: u64,
    ) -> Self {
        let allocated = allocation.allocated_amount;
        Self {
            category_name,
            allocated,
            percentage: allocation.percentage,
            total_spent,
            remaining: round2(allocated - total_spent),
            percentage_spent: round2(percentage_of(total_spent, allocated)),
            expense_count,
            allocation,
        }
    }
}

/// Spend figures for a budget and each of its allocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetSummary {
    /// The budget summarized
    pub budget: budget::Model,
    /// One summary per allocation
    pub allocations: Vec<AllocationSummary>,
    /// Sum of the allocated amounts
    pub total_allocated: Decimal,
    /// Spent across all allocations
    pub total_spent: Decimal,
    /// Budget total minus spent
    pub remaining: Decimal,
    /// Spent as a percentage of the budget total
    pub percentage_spent: Decimal,
}

pub(crate) async fn summarize_allocation<C>(
    conn: &C,
    allocation: category_allocation::Model,
) -> Result<AllocationSummary>
where
    C: ConnectionTrait,
{
    let total_spent = sum_expenses(conn, &SumScope::Allocation(allocation.id), None).await?;
    let count = expense_count(conn, allocation.id).await?;
    let category_name = Category::find_by_id(allocation.category_id)
        .one(conn)
        .await?
        .map(|c| c.name)
        .unwrap_or_default();
    Ok(AllocationSummary::new(allocation, category_name, total_spent, count))
}

pub(crate) async fn summarize_budget<C>(conn: &C, budget: budget::Model) -> Result<BudgetSummary>
where
    C: ConnectionTrait,
{
    let mut allocations = Vec::new();
    for allocation in allocations_of(conn, budget.id).await? {
        allocations.push(summarize_allocation(conn, allocation).await?);
    }

    let total_allocated: Decimal = allocations.iter().map(|a| a.allocated).sum();
    let total_spent: Decimal = allocations.iter().map(|a| a.total_spent).sum();
    Ok(BudgetSummary {
        total_allocated: round2(total_allocated),
        total_spent: round2(total_spent),
        remaining: round2(budget.total_amount - total_spent),
        percentage_spent: round2(percentage_of(total_spent, budget.total_amount)),
        allocations,
        budget,
    })
}

/// Spend figures for one of the caller's allocations.
pub async fn allocation_summary(
    db: &DatabaseConnection,
    ctx: &UserContext,
    allocation_id: i64,
) -> Result<AllocationSummary> {
    let (allocation, _) = find_owned_allocation(db, ctx, allocation_id).await?;
    summarize_allocation(db, allocation).await
}

/// Spend figures for one of the caller's budgets.
pub async fn budget_summary(db: &DatabaseConnection, ctx: &UserContext, budget_id: i64) -> Result<BudgetSummary> {
    let budget = find_owned_budget(db, ctx, budget_id).await?;
    summarize_budget(db, budget).await
}
