//! Alert business logic.
//!
//! An alert watches the spend of one allocation. Whether it is triggered is
//! evaluated from the current expenses on every read and never stored; the only
//! state an alert carries besides its threshold is the `active` flag, which the
//! user clears by marking the alert as read.

use crate::{
    core::{
        allocation::find_owned_allocation,
        money::{ensure_non_negative, round2},
        ownership::UserContext,
        spending::{AllocationSummary, summarize_allocation},
    },
    entities::{Alert, AlertType, alert, budget, category_allocation},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{JoinType, QueryOrder, QuerySelect, RelationTrait, Set, prelude::*};
use tracing::{debug, info};

const ENTITY: &str = "Alert";

/// Optional filters for [`list_alerts`].
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    /// Only alerts on this budget
    pub budget_id: Option<i64>,
    /// Only alerts on this category
    pub category_id: Option<i64>,
    /// Only alerts of this type
    pub alert_type: Option<AlertType>,
    /// Only active or only inactive alerts
    pub active: Option<bool>,
}

/// Fields that can be changed on an existing alert.
#[derive(Debug, Clone, Default)]
pub struct AlertUpdate {
    /// New alert type
    pub alert_type: Option<AlertType>,
    /// New threshold, checked against the alert type
    pub threshold: Option<Decimal>,
    /// Turns the alert on or off
    pub active: Option<bool>,
}

/// An alert with its current evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertState {
    /// The stored alert
    pub alert: alert::Model,
    /// Whether its condition currently holds
    pub triggered: bool,
}

/// A triggered alert with the figures that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggeredAlert {
    /// The alert that fired
    pub alert: alert::Model,
    /// Budget of the watched allocation
    pub budget_name: String,
    /// Category of the watched allocation
    pub category_name: String,
    /// Allocated amount
    pub allocated: Decimal,
    /// Spent so far
    pub total_spent: Decimal,
    /// Allocated minus spent
    pub remaining: Decimal,
    /// Spent as a percentage of allocated
    pub percentage_spent: Decimal,
    /// Human-readable explanation
    pub message: String,
}

/// Evaluates an alert against the spend of its allocation.
///
/// Inactive alerts never trigger. A percentage alert on an allocation of zero
/// doesn't trigger either, since no percentage can be computed.
#[must_use]
pub fn is_triggered(alert: &alert::Model, allocated: Decimal, total_spent: Decimal) -> bool {
    if !alert.active {
        return false;
    }
    match alert.alert_type {
        AlertType::Percentage => {
            allocated > Decimal::ZERO && total_spent / allocated * Decimal::ONE_HUNDRED >= alert.threshold
        }
        AlertType::Amount => total_spent >= alert.threshold,
        AlertType::Remaining => allocated - total_spent <= alert.threshold,
    }
}

/// Human-readable description of a triggered alert.
#[must_use]
pub fn alert_message(alert_type: AlertType, summary: &AllocationSummary) -> String {
    let category = &summary.category_name;
    match alert_type {
        AlertType::Percentage => format!(
            "You have spent {:.2}% of your {category} budget",
            summary.percentage_spent
        ),
        AlertType::Amount => format!(
            "Your {category} spending has reached {:.2}",
            summary.total_spent
        ),
        AlertType::Remaining => format!(
            "Only {:.2} left in your {category} budget",
            summary.remaining
        ),
    }
}

fn evaluate(alert: alert::Model, summary: &AllocationSummary) -> AlertState {
    let triggered = is_triggered(&alert, summary.allocated, summary.total_spent);
    AlertState { alert, triggered }
}

async fn find_owned_alert<C>(conn: &C, ctx: &UserContext, alert_id: i64) -> Result<alert::Model>
where
    C: ConnectionTrait,
{
    let alert = Alert::find_by_id(alert_id)
        .one(conn)
        .await?
        .ok_or_else(|| Error::not_found(ENTITY, alert_id))?;
    find_owned_allocation(conn, ctx, alert.allocation_id)
        .await
        .map_err(|e| match e {
            Error::Forbidden { .. } => Error::forbidden(ENTITY, alert_id),
            other => other,
        })?;
    Ok(alert)
}

/// Creates an active alert on one of the caller's allocations.
pub async fn create_alert(
    db: &DatabaseConnection,
    ctx: &UserContext,
    allocation_id: i64,
    alert_type: AlertType,
    threshold: Decimal,
) -> Result<alert::Model> {
    ensure_non_negative(threshold)?;
    find_owned_allocation(db, ctx, allocation_id).await?;

    let alert = alert::ActiveModel {
        allocation_id: Set(allocation_id),
        alert_type: Set(alert_type),
        threshold: Set(round2(threshold)),
        active: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        "Created {:?} alert {} on allocation {} (threshold {})",
        alert.alert_type, alert.id, allocation_id, alert.threshold
    );
    Ok(alert)
}

/// Retrieves one of the caller's alerts with its current evaluation.
pub async fn get_alert(db: &DatabaseConnection, ctx: &UserContext, alert_id: i64) -> Result<AlertState> {
    let alert = find_owned_alert(db, ctx, alert_id).await?;
    let (allocation, _) = find_owned_allocation(db, ctx, alert.allocation_id).await?;
    let summary = summarize_allocation(db, allocation).await?;
    Ok(evaluate(alert, &summary))
}

/// Lists the caller's alerts matching `filter`, each with its evaluation.
pub async fn list_alerts(db: &DatabaseConnection, ctx: &UserContext, filter: &AlertFilter) -> Result<Vec<AlertState>> {
    let mut query = Alert::find()
        .join(JoinType::InnerJoin, alert::Relation::Allocation.def())
        .join(JoinType::InnerJoin, category_allocation::Relation::Budget.def())
        .filter(budget::Column::UserId.eq(&ctx.user_id));

    if let Some(budget_id) = filter.budget_id {
        query = query.filter(category_allocation::Column::BudgetId.eq(budget_id));
    }
    if let Some(category_id) = filter.category_id {
        query = query.filter(category_allocation::Column::CategoryId.eq(category_id));
    }
    if let Some(alert_type) = filter.alert_type {
        query = query.filter(alert::Column::AlertType.eq(alert_type));
    }
    if let Some(active) = filter.active {
        query = query.filter(alert::Column::Active.eq(active));
    }

    let alerts = query.order_by_asc(alert::Column::Id).all(db).await?;
    let mut states = Vec::with_capacity(alerts.len());
    for alert in alerts {
        let (allocation, _) = find_owned_allocation(db, ctx, alert.allocation_id).await?;
        let summary = summarize_allocation(db, allocation).await?;
        states.push(evaluate(alert, &summary));
    }
    Ok(states)
}

/// Applies an [`AlertUpdate`] to one of the caller's alerts.
pub async fn update_alert(
    db: &DatabaseConnection,
    ctx: &UserContext,
    alert_id: i64,
    update: AlertUpdate,
) -> Result<alert::Model> {
    let alert = find_owned_alert(db, ctx, alert_id).await?;
    let mut active: alert::ActiveModel = alert.into();

    if let Some(alert_type) = update.alert_type {
        active.alert_type = Set(alert_type);
    }
    if let Some(threshold) = update.threshold {
        ensure_non_negative(threshold)?;
        active.threshold = Set(round2(threshold));
    }
    if let Some(flag) = update.active {
        active.active = Set(flag);
    }

    active.update(db).await.map_err(Into::into)
}

/// Deletes one of the caller's alerts.
pub async fn delete_alert(db: &DatabaseConnection, ctx: &UserContext, alert_id: i64) -> Result<()> {
    let alert = find_owned_alert(db, ctx, alert_id).await?;
    alert.delete(db).await?;
    info!("Deleted alert {}", alert_id);
    Ok(())
}

/// Marks an alert as read by deactivating it.
pub async fn mark_read(db: &DatabaseConnection, ctx: &UserContext, alert_id: i64) -> Result<alert::Model> {
    let alert = update_alert(
        db,
        ctx,
        alert_id,
        AlertUpdate {
            active: Some(false),
            ..Default::default()
        },
    )
    .await?;
    debug!("Alert {} marked as read", alert_id);
    Ok(alert)
}

/// The caller's active alerts that are currently triggered, with context.
pub async fn triggered_alerts(db: &DatabaseConnection, ctx: &UserContext) -> Result<Vec<TriggeredAlert>> {
    let states = list_alerts(
        db,
        ctx,
        &AlertFilter {
            active: Some(true),
            ..Default::default()
        },
    )
    .await?;

    let mut triggered = Vec::new();
    for state in states.into_iter().filter(|s| s.triggered) {
        let (allocation, budget) = find_owned_allocation(db, ctx, state.alert.allocation_id).await?;
        let summary = summarize_allocation(db, allocation).await?;
        let message = alert_message(state.alert.alert_type, &summary);
        info!("Alert {} triggered for user {}: {}", state.alert.id, ctx.user_id, message);

        triggered.push(TriggeredAlert {
            alert: state.alert,
            budget_name: budget.name,
            category_name: summary.category_name,
            allocated: summary.allocated,
            total_spent: summary.total_spent,
            remaining: summary.remaining,
            percentage_spent: summary.percentage_spent,
            message,
        });
    }
    Ok(triggered)
}
