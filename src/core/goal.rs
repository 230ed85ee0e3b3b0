//! Goal business logic.
//!
//! A goal targets an amount of spending in one category over a date window.
//! Progress is computed from expenses whenever it is asked for. Once a goal is
//! achieved, abandoned or failed it is frozen: edits fail with `GoalClosed`.

use crate::{
    core::{
        category::find_visible_category,
        expense::{SumScope, sum_expenses},
        money::{HUNDRED, ensure_non_negative, percentage_of, round2},
        ownership::{UserContext, ensure_owner},
        validation::{date_range, optional_text, required_text},
    },
    entities::{Goal, GoalStatus, goal},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

const ENTITY: &str = "Goal";

/// Input for creating a goal.
#[derive(Debug, Clone)]
pub struct NewGoal {
    /// Category whose spend is counted
    pub category_id: i64,
    /// Short title
    pub title: String,
    /// Optional description
    pub description: Option<String>,
    /// Spend that achieves the goal
    pub target_amount: Decimal,
    /// First day counted
    pub start_date: NaiveDate,
    /// Last day counted
    pub end_date: NaiveDate,
}

/// Fields that can be changed on a goal still in progress.
#[derive(Debug, Clone, Default)]
pub struct GoalUpdate {
    /// New category
    pub category_id: Option<i64>,
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New target
    pub target_amount: Option<Decimal>,
    /// New first day
    pub start_date: Option<NaiveDate>,
    /// New last day
    pub end_date: Option<NaiveDate>,
    /// New status, e.g. abandoned
    pub status: Option<GoalStatus>,
}

/// Computed progress of a goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalProgress {
    /// The goal, with its current status
    pub goal: goal::Model,
    /// Spend counted toward the goal so far
    pub current_amount: Decimal,
    /// Share of the target reached, 0-100
    pub amount_pct: Decimal,
    /// Share of the date window elapsed, 0-100
    pub time_pct: Decimal,
    /// Days until the end date, 0 once passed
    pub days_remaining: i64,
}

fn clamp_pct(value: Decimal) -> Decimal {
    round2(value.clamp(Decimal::ZERO, HUNDRED))
}

/// Share of the goal window elapsed on `today`.
///
/// A window of zero or negative length counts as fully elapsed.
#[must_use]
pub fn time_percentage(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Decimal {
    let total = (end - start).num_days();
    if total <= 0 {
        return HUNDRED;
    }
    let elapsed = (today - start).num_days();
    clamp_pct(Decimal::from(elapsed) / Decimal::from(total) * HUNDRED)
}

/// Share of the target reached, 0 when the target is 0.
#[must_use]
pub fn amount_percentage(current: Decimal, target: Decimal) -> Decimal {
    clamp_pct(percentage_of(current, target))
}

/// Status a goal should move to on `today` given its amount progress.
///
/// Only in-progress goals move: to achieved once the target is reached, or to
/// failed once the window is over without reaching it.
#[must_use]
pub fn next_status(goal: &goal::Model, amount_pct: Decimal, today: NaiveDate) -> GoalStatus {
    if goal.status != GoalStatus::InProgress {
        return goal.status;
    }
    if amount_pct >= HUNDRED {
        GoalStatus::Achieved
    } else if today > goal.end_date {
        GoalStatus::Failed
    } else {
        GoalStatus::InProgress
    }
}

/// Builds the progress figures of a goal from the spend counted toward it.
#[must_use]
pub fn progress_of(goal: goal::Model, current_amount: Decimal, today: NaiveDate) -> GoalProgress {
    GoalProgress {
        amount_pct: amount_percentage(current_amount, goal.target_amount),
        time_pct: time_percentage(goal.start_date, goal.end_date, today),
        days_remaining: (goal.end_date - today).num_days().max(0),
        current_amount,
        goal,
    }
}

/// Spend counted toward a goal: the owner's expenses in the goal's category
/// between its start and `min(today, end)`.
async fn counted_spend<C>(conn: &C, goal: &goal::Model, today: NaiveDate) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    let until = today.min(goal.end_date);
    if until < goal.start_date {
        return Ok(Decimal::ZERO);
    }
    sum_expenses(
        conn,
        &SumScope::UserCategory {
            user_id: goal.user_id.clone(),
            category_id: goal.category_id,
        },
        Some((goal.start_date, until)),
    )
    .await
}

async fn find_owned_goal<C>(conn: &C, ctx: &UserContext, goal_id: i64) -> Result<goal::Model>
where
    C: ConnectionTrait,
{
    let goal = Goal::find_by_id(goal_id)
        .one(conn)
        .await?
        .ok_or_else(|| Error::not_found(ENTITY, goal_id))?;
    ensure_owner(ctx, &goal, ENTITY, goal_id)?;
    Ok(goal)
}

/// Creates an in-progress goal for the caller.
pub async fn create_goal(db: &DatabaseConnection, ctx: &UserContext, input: NewGoal) -> Result<goal::Model> {
    let title = required_text("Goal title", &input.title, 100)?;
    ensure_non_negative(input.target_amount)?;
    date_range(input.start_date, input.end_date)?;
    find_visible_category(db, ctx, input.category_id).await?;

    let goal = goal::ActiveModel {
        user_id: Set(ctx.user_id.clone()),
        category_id: Set(input.category_id),
        title: Set(title),
        description: Set(optional_text("Description", input.description, 1000)?),
        target_amount: Set(round2(input.target_amount)),
        start_date: Set(input.start_date),
        end_date: Set(input.end_date),
        status: Set(GoalStatus::InProgress),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Created goal {} '{}' for user {}", goal.id, goal.title, ctx.user_id);
    Ok(goal)
}

/// Retrieves one of the caller's goals.
pub async fn get_goal(db: &DatabaseConnection, ctx: &UserContext, goal_id: i64) -> Result<goal::Model> {
    find_owned_goal(db, ctx, goal_id).await
}

/// Lists the caller's goals ordered by end date.
pub async fn list_goals(
    db: &DatabaseConnection,
    ctx: &UserContext,
    category_id: Option<i64>,
    status: Option<GoalStatus>,
) -> Result<Vec<goal::Model>> {
    let mut query = Goal::find().filter(goal::Column::UserId.eq(&ctx.user_id));
    if let Some(category_id) = category_id {
        query = query.filter(goal::Column::CategoryId.eq(category_id));
    }
    if let Some(status) = status {
        query = query.filter(goal::Column::Status.eq(status));
    }
    query
        .order_by_asc(goal::Column::EndDate)
        .order_by_asc(goal::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Computes a goal's progress on `today` and persists the status it moves to, if any.
async fn settle_status<C>(conn: &C, goal: goal::Model, today: NaiveDate) -> Result<GoalProgress>
where
    C: ConnectionTrait,
{
    let spent = counted_spend(conn, &goal, today).await?;
    let mut progress = progress_of(goal, spent, today);
    let status = next_status(&progress.goal, progress.amount_pct, today);

    if status != progress.goal.status {
        let goal_id = progress.goal.id;
        let mut active: goal::ActiveModel = progress.goal.clone().into();
        active.status = Set(status);
        progress.goal = active.update(conn).await?;
        info!("Goal {} is now {}", goal_id, status.label());
    }
    Ok(progress)
}

/// Edits a goal that is still in progress on `today`.
///
/// The goal's status is brought up to date first, so a goal whose window
/// has closed is failed (or achieved) and rejected with `GoalClosed`.
pub async fn update_goal(
    db: &DatabaseConnection,
    ctx: &UserContext,
    goal_id: i64,
    update: GoalUpdate,
    today: NaiveDate,
) -> Result<goal::Model> {
    let goal = find_owned_goal(db, ctx, goal_id).await?;
    let goal = settle_status(db, goal, today).await?.goal;
    if goal.status.is_terminal() {
        return Err(Error::GoalClosed {
            status: goal.status.label().to_string(),
        });
    }

    let start = update.start_date.unwrap_or(goal.start_date);
    let end = update.end_date.unwrap_or(goal.end_date);
    date_range(start, end)?;

    let mut active: goal::ActiveModel = goal.into();
    if let Some(category_id) = update.category_id {
        find_visible_category(db, ctx, category_id).await?;
        active.category_id = Set(category_id);
    }
    if let Some(title) = update.title {
        active.title = Set(required_text("Goal title", &title, 100)?);
    }
    if update.description.is_some() {
        active.description = Set(optional_text("Description", update.description, 1000)?);
    }
    if let Some(target) = update.target_amount {
        ensure_non_negative(target)?;
        active.target_amount = Set(round2(target));
    }
    if let Some(status) = update.status {
        active.status = Set(status);
    }
    active.start_date = Set(start);
    active.end_date = Set(end);

    active.update(db).await.map_err(Into::into)
}

/// Gives up on a goal.
pub async fn abandon_goal(
    db: &DatabaseConnection,
    ctx: &UserContext,
    goal_id: i64,
    today: NaiveDate,
) -> Result<goal::Model> {
    update_goal(
        db,
        ctx,
        goal_id,
        GoalUpdate {
            status: Some(GoalStatus::Abandoned),
            ..Default::default()
        },
        today,
    )
    .await
}

/// Deletes one of the caller's goals, whatever its status.
pub async fn delete_goal(db: &DatabaseConnection, ctx: &UserContext, goal_id: i64) -> Result<()> {
    let goal = find_owned_goal(db, ctx, goal_id).await?;
    goal.delete(db).await?;
    info!("Deleted goal {}", goal_id);
    Ok(())
}

/// Progress of one of the caller's goals on `today`.
pub async fn goal_progress(
    db: &DatabaseConnection,
    ctx: &UserContext,
    goal_id: i64,
    today: NaiveDate,
) -> Result<GoalProgress> {
    let goal = find_owned_goal(db, ctx, goal_id).await?;
    let spent = counted_spend(db, &goal, today).await?;
    Ok(progress_of(goal, spent, today))
}

/// Computes a goal's progress and persists the status it moves to, if any.
pub async fn refresh_goal_status(
    db: &DatabaseConnection,
    ctx: &UserContext,
    goal_id: i64,
    today: NaiveDate,
) -> Result<GoalProgress> {
    let goal = find_owned_goal(db, ctx, goal_id).await?;
    settle_status(db, goal, today).await
}

/// Progress of every goal of the caller still in progress on `today`.
///
/// Goals that reached or missed their target since the last look are moved
/// to their terminal status and left out.
pub async fn goals_progress(
    db: &DatabaseConnection,
    ctx: &UserContext,
    today: NaiveDate,
) -> Result<Vec<GoalProgress>> {
    let goals = list_goals(db, ctx, None, Some(GoalStatus::InProgress)).await?;
    let mut progress = Vec::with_capacity(goals.len());
    for goal in goals {
        let current = settle_status(db, goal, today).await?;
        if current.goal.status == GoalStatus::InProgress {
            progress.push(current);
        }
    }
    Ok(progress)
}
