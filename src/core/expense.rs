//! Expense business logic - Handles all expense-related operations.
//!
//! Expenses belong to an allocation and reach their budget, category and owner
//! through it. Every expense counts toward spend totals whatever its status.

use crate::{
    core::{
        allocation::find_owned_allocation,
        money::{ensure_non_negative, round2},
        ownership::UserContext,
        validation::required_text,
    },
    entities::{
        Expense, ExpenseStatus, budget, category, category_allocation, expense,
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{JoinType, QueryOrder, QuerySelect, RelationTrait, Select, Set, prelude::*};
use tracing::{debug, info};

const ENTITY: &str = "Expense";

/// Inclusive date range.
pub type DateRange = (NaiveDate, NaiveDate);

/// Input for recording an expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    /// Allocation the expense is charged to
    pub allocation_id: i64,
    /// What the money was spent on
    pub description: String,
    /// Amount spent
    pub amount: Decimal,
    /// Day of the expense
    pub spent_on: NaiveDate,
    /// Defaults to validated
    pub status: Option<ExpenseStatus>,
}

/// Fields that can be changed on an existing expense.
#[derive(Debug, Clone, Default)]
pub struct ExpenseUpdate {
    /// Moves the expense to another allocation
    pub allocation_id: Option<i64>,
    /// New description
    pub description: Option<String>,
    /// New amount
    pub amount: Option<Decimal>,
    /// New day
    pub spent_on: Option<NaiveDate>,
    /// New status
    pub status: Option<ExpenseStatus>,
}

/// Optional filters for [`list_expenses`]. Unset fields don't filter.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    /// Only expenses of this budget
    pub budget_id: Option<i64>,
    /// Only expenses in this category
    pub category_id: Option<i64>,
    /// Only expenses of this allocation
    pub allocation_id: Option<i64>,
    /// Only expenses in this date range
    pub range: Option<DateRange>,
    /// Only expenses with this status
    pub status: Option<ExpenseStatus>,
    /// Lowest amount included
    pub min_amount: Option<Decimal>,
    /// Highest amount included
    pub max_amount: Option<Decimal>,
    /// Substring searched in descriptions
    pub search: Option<String>,
}

/// What a spend sum covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SumScope {
    /// Expenses of one allocation
    Allocation(i64),
    /// Expenses of every allocation of one budget
    Budget(i64),
    /// Every expense of one user
    User(String),
    /// A user's expenses in one category, across budgets
    UserCategory {
        /// Owner of the expenses
        user_id: String,
        /// Category summed
        category_id: i64,
    },
}

/// Spend total for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    /// Category summed
    pub category_id: i64,
    /// Its display name
    pub category_name: String,
    /// Amount spent
    pub total: Decimal,
    /// Number of expenses
    pub count: i64,
}

/// Spend total for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTotal {
    /// Day summed
    pub day: NaiveDate,
    /// Amount spent that day
    pub total: Decimal,
}

/// Expenses joined up to their allocation and budget.
fn joined_expenses() -> Select<Expense> {
    Expense::find()
        .join(JoinType::InnerJoin, expense::Relation::Allocation.def())
        .join(JoinType::InnerJoin, category_allocation::Relation::Budget.def())
}

fn expenses_of_user(user_id: &str) -> Select<Expense> {
    joined_expenses().filter(budget::Column::UserId.eq(user_id))
}

fn within(query: Select<Expense>, range: Option<DateRange>) -> Select<Expense> {
    match range {
        Some((from, to)) => query.filter(expense::Column::SpentOn.between(from, to)),
        None => query,
    }
}

/// Sum of expense amounts in `scope`, optionally limited to an inclusive date range.
///
/// Ownership is not checked here; callers resolve the scope from entities they
/// already checked.
pub async fn sum_expenses<C>(conn: &C, scope: &SumScope, range: Option<DateRange>) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    let query = match scope {
        SumScope::Allocation(allocation_id) => {
            Expense::find().filter(expense::Column::AllocationId.eq(*allocation_id))
        }
        SumScope::Budget(budget_id) => {
            joined_expenses().filter(category_allocation::Column::BudgetId.eq(*budget_id))
        }
        SumScope::User(user_id) => expenses_of_user(user_id),
        SumScope::UserCategory {
            user_id,
            category_id,
        } => expenses_of_user(user_id)
            .filter(category_allocation::Column::CategoryId.eq(*category_id)),
    };

    let total = within(query, range)
        .select_only()
        .column_as(expense::Column::Amount.sum(), "total")
        .into_tuple::<Option<Decimal>>()
        .one(conn)
        .await?
        .flatten()
        .unwrap_or_default();
    Ok(round2(total))
}

/// Loads an expense and checks the caller owns its budget.
pub async fn find_owned_expense<C>(conn: &C, ctx: &UserContext, expense_id: i64) -> Result<expense::Model>
where
    C: ConnectionTrait,
{
    let expense = Expense::find_by_id(expense_id)
        .one(conn)
        .await?
        .ok_or_else(|| Error::not_found(ENTITY, expense_id))?;
    find_owned_allocation(conn, ctx, expense.allocation_id)
        .await
        .map_err(|e| match e {
            Error::Forbidden { .. } => Error::forbidden(ENTITY, expense_id),
            other => other,
        })?;
    Ok(expense)
}

/// Records an expense against one of the caller's allocations.
pub async fn create_expense(
    db: &DatabaseConnection,
    ctx: &UserContext,
    input: NewExpense,
) -> Result<expense::Model> {
    let description = required_text("Description", &input.description, 255)?;
    ensure_non_negative(input.amount)?;
    find_owned_allocation(db, ctx, input.allocation_id).await?;

    let expense = expense::ActiveModel {
        allocation_id: Set(input.allocation_id),
        description: Set(description),
        amount: Set(round2(input.amount)),
        spent_on: Set(input.spent_on),
        status: Set(input.status.unwrap_or(ExpenseStatus::Validated)),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        "Recorded expense {} of {} on allocation {} for user {}",
        expense.id, expense.amount, expense.allocation_id, ctx.user_id
    );
    Ok(expense)
}

/// Retrieves one of the caller's expenses.
pub async fn get_expense(db: &DatabaseConnection, ctx: &UserContext, expense_id: i64) -> Result<expense::Model> {
    find_owned_expense(db, ctx, expense_id).await
}

/// Applies an [`ExpenseUpdate`]. Moving an expense requires owning the target allocation.
pub async fn update_expense(
    db: &DatabaseConnection,
    ctx: &UserContext,
    expense_id: i64,
    update: ExpenseUpdate,
) -> Result<expense::Model> {
    let expense = find_owned_expense(db, ctx, expense_id).await?;
    let mut active: expense::ActiveModel = expense.into();

    if let Some(allocation_id) = update.allocation_id {
        find_owned_allocation(db, ctx, allocation_id).await?;
        active.allocation_id = Set(allocation_id);
    }
    if let Some(description) = update.description {
        active.description = Set(required_text("Description", &description, 255)?);
    }
    if let Some(amount) = update.amount {
        ensure_non_negative(amount)?;
        active.amount = Set(round2(amount));
    }
    if let Some(spent_on) = update.spent_on {
        active.spent_on = Set(spent_on);
    }
    if let Some(status) = update.status {
        active.status = Set(status);
    }

    let updated = active.update(db).await?;
    debug!("Updated expense {}", expense_id);
    Ok(updated)
}

/// Deletes one of the caller's expenses.
pub async fn delete_expense(db: &DatabaseConnection, ctx: &UserContext, expense_id: i64) -> Result<()> {
    let expense = find_owned_expense(db, ctx, expense_id).await?;
    expense.delete(db).await?;
    info!("Deleted expense {} for user {}", expense_id, ctx.user_id);
    Ok(())
}

/// Lists the caller's expenses matching `filter`, newest first.
pub async fn list_expenses(
    db: &DatabaseConnection,
    ctx: &UserContext,
    filter: &ExpenseFilter,
) -> Result<Vec<expense::Model>> {
    let mut query = within(expenses_of_user(&ctx.user_id), filter.range);

    if let Some(budget_id) = filter.budget_id {
        query = query.filter(category_allocation::Column::BudgetId.eq(budget_id));
    }
    if let Some(category_id) = filter.category_id {
        query = query.filter(category_allocation::Column::CategoryId.eq(category_id));
    }
    if let Some(allocation_id) = filter.allocation_id {
        query = query.filter(expense::Column::AllocationId.eq(allocation_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(expense::Column::Status.eq(status));
    }
    if let Some(min) = filter.min_amount {
        query = query.filter(expense::Column::Amount.gte(min));
    }
    if let Some(max) = filter.max_amount {
        query = query.filter(expense::Column::Amount.lte(max));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(expense::Column::Description.contains(search));
    }

    query
        .order_by_desc(expense::Column::SpentOn)
        .order_by_desc(expense::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The caller's `limit` most recent expenses.
pub async fn recent_expenses(db: &DatabaseConnection, ctx: &UserContext, limit: u64) -> Result<Vec<expense::Model>> {
    expenses_of_user(&ctx.user_id)
        .order_by_desc(expense::Column::SpentOn)
        .order_by_desc(expense::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The caller's spend per category, largest first.
pub async fn totals_by_category(
    db: &DatabaseConnection,
    ctx: &UserContext,
    range: Option<DateRange>,
) -> Result<Vec<CategoryTotal>> {
    let rows: Vec<(i64, String, Option<Decimal>, i64)> = within(expenses_of_user(&ctx.user_id), range)
        .join(JoinType::InnerJoin, category_allocation::Relation::Category.def())
        .select_only()
        .column(category::Column::Id)
        .column(category::Column::Name)
        .column_as(expense::Column::Amount.sum(), "total")
        .column_as(expense::Column::Id.count(), "count")
        .group_by(category::Column::Id)
        .group_by(category::Column::Name)
        .into_tuple()
        .all(db)
        .await?;

    let mut totals: Vec<CategoryTotal> = rows
        .into_iter()
        .map(|(category_id, category_name, total, count)| CategoryTotal {
            category_id,
            category_name,
            total: round2(total.unwrap_or_default()),
            count,
        })
        .collect();
    totals.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category_name.cmp(&b.category_name)));
    Ok(totals)
}

/// The caller's spend per day in `[from, to]`, for days with expenses.
pub async fn daily_totals(
    db: &DatabaseConnection,
    ctx: &UserContext,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DailyTotal>> {
    let rows: Vec<(NaiveDate, Option<Decimal>)> = within(expenses_of_user(&ctx.user_id), Some((from, to)))
        .select_only()
        .column(expense::Column::SpentOn)
        .column_as(expense::Column::Amount.sum(), "total")
        .group_by(expense::Column::SpentOn)
        .order_by_asc(expense::Column::SpentOn)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(day, total)| DailyTotal {
            day,
            total: round2(total.unwrap_or_default()),
        })
        .collect())
}
