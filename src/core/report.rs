//! Report generation business logic.
//!
//! This module aggregates incomes, expenses, budgets and goals into the
//! statistics, periodic reports and dashboard shown to a user. All functions are
//! framework-agnostic and return structured data that the bot layer formats.
//! Functions that depend on the current date take it as `today`.

use crate::{
    core::{
        account::total_balance,
        budget::{budgets_for_period, current_budget, month_bounds},
        expense::{
            CategoryTotal, DailyTotal, DateRange, SumScope, daily_totals, recent_expenses,
            sum_expenses, totals_by_category,
        },
        goal::{GoalProgress, goals_progress},
        income::{list_incomes, total_income},
        money::{percentage_of, round2},
        ownership::UserContext,
        spending::{BudgetSummary, summarize_budget},
    },
    entities::{budget, expense, income},
    errors::{Error, Result},
};
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use sea_orm::DatabaseConnection;
use std::collections::BTreeMap;

/// Number of expenses shown on the dashboard.
pub const DASHBOARD_RECENT_EXPENSES: u64 = 5;

/// Income, expenses and their difference over a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeriodTotals {
    /// Income received
    pub income: Decimal,
    /// Money spent
    pub expenses: Decimal,
    /// Income minus expenses
    pub net: Decimal,
}

/// Month-to-date and year-to-date figures plus the balance of all accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalStatistics {
    /// Calendar month containing `today`, as `YYYY-MM`
    pub month_label: String,
    /// Totals of the current month
    pub month: PeriodTotals,
    /// Label of the current year
    pub year_label: String,
    /// Totals of the current year
    pub year: PeriodTotals,
    /// Sum of all account balances
    pub total_balance: Decimal,
}

/// Everything that happened in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyReport {
    /// Year reported
    pub year: i32,
    /// Month reported, 1-12
    pub month: u32,
    /// First day of the month
    pub start: NaiveDate,
    /// Last day of the month
    pub end: NaiveDate,
    /// Income received
    pub income_total: Decimal,
    /// Incomes of the month
    pub incomes: Vec<income::Model>,
    /// Money spent
    pub expense_total: Decimal,
    /// Spend per category, largest first
    pub expenses_by_category: Vec<CategoryTotal>,
    /// Spend per day
    pub daily_expenses: Vec<DailyTotal>,
    /// Budget covering the month, if any
    pub budget: Option<budget::Model>,
    /// Income minus expenses
    pub savings: Decimal,
    /// Savings as a percentage of income, 0 without income
    pub savings_rate: Decimal,
}

/// One month of a yearly report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRow {
    /// Month, 1-12
    pub month: u32,
    /// Income and expenses of the month
    pub totals: PeriodTotals,
}

/// Twelve monthly rows and the year's totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearlyReport {
    /// Year reported
    pub year: i32,
    /// One row per month
    pub months: Vec<MonthRow>,
    /// Totals of the year
    pub totals: PeriodTotals,
    /// Savings as a percentage of income, 0 without income
    pub savings_rate: Decimal,
}

/// Change of a value from one period to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variation {
    /// `second - first`
    pub difference: Decimal,
    /// Difference relative to `|first|`, 0 when `first` is 0
    pub percentage: Decimal,
}

impl Variation {
    /// Variation from `first` to `second`.
    #[must_use]
    pub fn between(first: Decimal, second: Decimal) -> Self {
        let difference = second - first;
        let percentage = if first.is_zero() {
            Decimal::ZERO
        } else {
            round2(difference / first.abs() * Decimal::ONE_HUNDRED)
        };
        Self {
            difference: round2(difference),
            percentage,
        }
    }
}

/// A value in two periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compared {
    /// Value in the first period
    pub first: Decimal,
    /// Value in the second period
    pub second: Decimal,
    /// Change from first to second
    pub variation: Variation,
}

impl Compared {
    /// Pairs two values with their variation.
    #[must_use]
    pub fn new(first: Decimal, second: Decimal) -> Self {
        Self {
            first,
            second,
            variation: Variation::between(first, second),
        }
    }
}

/// Spend in one category in two periods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryComparison {
    /// Category compared
    pub category_id: i64,
    /// Its display name
    pub category_name: String,
    /// Spend in both periods
    pub spend: Compared,
}

/// Income, expenses, savings and per-category spend of two periods side by side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparativeReport {
    /// Earlier period
    pub first_period: DateRange,
    /// Later period
    pub second_period: DateRange,
    /// Income in both periods
    pub income: Compared,
    /// Spend in both periods
    pub expenses: Compared,
    /// Savings in both periods
    pub savings: Compared,
    /// Spend per category in both periods
    pub categories: Vec<CategoryComparison>,
}

/// Total spend of one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyTrend {
    /// Year of the month
    pub year: i32,
    /// Month, 1-12
    pub month: u32,
    /// Amount spent
    pub total: Decimal,
}

/// Overview shown to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    /// Summary of the budget covering today
    pub current_budget: Option<BudgetSummary>,
    /// Month and year totals
    pub statistics: GlobalStatistics,
    /// Latest expenses
    pub recent_expenses: Vec<expense::Model>,
    /// Goals still in progress
    pub goals: Vec<GoalProgress>,
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::validation(format!("{year}-{month:02} is not a valid month")))
}

fn year_bounds(year: i32) -> Result<DateRange> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year, 12, 31);
    start
        .zip(end)
        .ok_or_else(|| Error::validation(format!("{year} is not a valid year")))
}

async fn period_totals(db: &DatabaseConnection, ctx: &UserContext, range: DateRange) -> Result<PeriodTotals> {
    let income = total_income(db, ctx, Some(range)).await?;
    let expenses = sum_expenses(db, &SumScope::User(ctx.user_id.clone()), Some(range)).await?;
    Ok(PeriodTotals {
        income,
        expenses,
        net: round2(income - expenses),
    })
}

fn savings_rate(totals: &PeriodTotals) -> Decimal {
    round2(percentage_of(totals.net, totals.income))
}

/// Month and year figures for the period containing `today`.
pub async fn global_statistics(
    db: &DatabaseConnection,
    ctx: &UserContext,
    today: NaiveDate,
) -> Result<GlobalStatistics> {
    let month = period_totals(db, ctx, month_bounds(today)).await?;
    let year = period_totals(db, ctx, year_bounds(today.year())?).await?;
    Ok(GlobalStatistics {
        month_label: today.format("%Y-%m").to_string(),
        month,
        year_label: today.year().to_string(),
        year,
        total_balance: total_balance(db, ctx).await?,
    })
}

/// Report for one calendar month.
pub async fn monthly_report(
    db: &DatabaseConnection,
    ctx: &UserContext,
    year: i32,
    month: u32,
) -> Result<MonthlyReport> {
    let (start, end) = month_bounds(first_of_month(year, month)?);
    let range = Some((start, end));

    let incomes = list_incomes(db, ctx, None, range).await?;
    let income_total = round2(incomes.iter().map(|i| i.amount).sum());
    let expenses_by_category = totals_by_category(db, ctx, range).await?;
    let expense_total = round2(expenses_by_category.iter().map(|c| c.total).sum());
    let daily_expenses = daily_totals(db, ctx, start, end).await?;
    let budget = budgets_for_period(db, ctx, start, end).await?.into_iter().next();

    let totals = PeriodTotals {
        income: income_total,
        expenses: expense_total,
        net: round2(income_total - expense_total),
    };
    Ok(MonthlyReport {
        year,
        month,
        start,
        end,
        income_total,
        incomes,
        expense_total,
        expenses_by_category,
        daily_expenses,
        budget,
        savings: totals.net,
        savings_rate: savings_rate(&totals),
    })
}

/// Report for one calendar year, month by month.
pub async fn yearly_report(db: &DatabaseConnection, ctx: &UserContext, year: i32) -> Result<YearlyReport> {
    let mut months = Vec::with_capacity(12);
    for month in 1..=12 {
        let range = month_bounds(first_of_month(year, month)?);
        months.push(MonthRow {
            month,
            totals: period_totals(db, ctx, range).await?,
        });
    }

    let income: Decimal = months.iter().map(|m| m.totals.income).sum();
    let expenses: Decimal = months.iter().map(|m| m.totals.expenses).sum();
    let totals = PeriodTotals {
        income: round2(income),
        expenses: round2(expenses),
        net: round2(income - expenses),
    };
    Ok(YearlyReport {
        year,
        months,
        savings_rate: savings_rate(&totals),
        totals,
    })
}

/// Compares two periods.
pub async fn comparative_report(
    db: &DatabaseConnection,
    ctx: &UserContext,
    first_period: DateRange,
    second_period: DateRange,
) -> Result<ComparativeReport> {
    let first = period_totals(db, ctx, first_period).await?;
    let second = period_totals(db, ctx, second_period).await?;

    let mut by_category: BTreeMap<(String, i64), (Decimal, Decimal)> = BTreeMap::new();
    for total in totals_by_category(db, ctx, Some(first_period)).await? {
        by_category
            .entry((total.category_name, total.category_id))
            .or_default()
            .0 = total.total;
    }
    for total in totals_by_category(db, ctx, Some(second_period)).await? {
        by_category
            .entry((total.category_name, total.category_id))
            .or_default()
            .1 = total.total;
    }

    let categories = by_category
        .into_iter()
        .map(|((category_name, category_id), (a, b))| CategoryComparison {
            category_id,
            category_name,
            spend: Compared::new(a, b),
        })
        .collect();

    Ok(ComparativeReport {
        first_period,
        second_period,
        income: Compared::new(first.income, second.income),
        expenses: Compared::new(first.expenses, second.expenses),
        savings: Compared::new(first.net, second.net),
        categories,
    })
}

/// Spend of the last `months` calendar months, oldest first, the month of
/// `today` included.
pub async fn spending_trends(
    db: &DatabaseConnection,
    ctx: &UserContext,
    months: u32,
    today: NaiveDate,
) -> Result<Vec<MonthlyTrend>> {
    let (current, _) = month_bounds(today);
    let mut trends = Vec::new();
    for back in (0..months).rev() {
        let first = current
            .checked_sub_months(Months::new(back))
            .ok_or_else(|| Error::validation(format!("Cannot go back {back} months")))?;
        let total = sum_expenses(db, &SumScope::User(ctx.user_id.clone()), Some(month_bounds(first))).await?;
        trends.push(MonthlyTrend {
            year: first.year(),
            month: first.month(),
            total,
        });
    }
    Ok(trends)
}

/// Builds the dashboard for `today`.
pub async fn dashboard(db: &DatabaseConnection, ctx: &UserContext, today: NaiveDate) -> Result<Dashboard> {
    let current_budget = match current_budget(db, ctx, today).await? {
        Some(budget) => Some(summarize_budget(db, budget).await?),
        None => None,
    };
    Ok(Dashboard {
        current_budget,
        statistics: global_statistics(db, ctx, today).await?,
        recent_expenses: recent_expenses(db, ctx, DASHBOARD_RECENT_EXPENSES).await?,
        goals: goals_progress(db, ctx, today).await?,
    })
}

/// Generates a progress bar string for visual representation.
///
/// Creates a text-based progress bar like: `[████████░░] 80.0%`
///
/// # Arguments
/// * `percent` - Progress percentage; the bar is clamped to 0-100 but the label is not
/// * `bar_length` - Length of the progress bar in characters (default 10)
#[must_use]
pub fn format_progress_bar(percent: Decimal, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);

    let filled = (clamped / Decimal::ONE_HUNDRED * Decimal::from(length))
        .round()
        .to_usize()
        .unwrap_or(0)
        .min(length);
    let empty = length - filled;

    format!(
        "[{}{}] {:.1}%",
        "█".repeat(filled),
        "░".repeat(empty),
        percent.round_dp(1)
    )
}

/// Formats an amount with an explicit sign, like "+50.00" or "-25.50".
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    if amount >= Decimal::ZERO {
        format!("+{:.2}", round2(amount))
    } else {
        format!("-{:.2}", round2(amount.abs()))
    }
}

/// Formats an amount with its currency, like "1250.00 EUR".
#[must_use]
pub fn format_money(amount: Decimal, currency: &str) -> String {
    format!("{:.2} {currency}", round2(amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::income::{NewIncome, create_income};
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_progress_bar_full() {
        assert_eq!(format_progress_bar(dec!(100), Some(10)), "[██████████] 100.0%");
    }

    #[test]
    fn test_format_progress_bar_half() {
        assert_eq!(format_progress_bar(dec!(50), Some(10)), "[█████░░░░░] 50.0%");
    }

    #[test]
    fn test_format_progress_bar_overspent() {
        // The bar is full, the label shows the real figure
        assert_eq!(format_progress_bar(dec!(108.33), Some(10)), "[██████████] 108.3%");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(50)), "+50.00");
        assert_eq!(format_amount(dec!(-25.5)), "-25.50");
        assert_eq!(format_amount(dec!(0)), "+0.00");
        assert_eq!(format_money(dec!(1250), "EUR"), "1250.00 EUR");
    }

    #[test]
    fn test_variation() {
        assert_eq!(
            Variation::between(dec!(200), dec!(250)),
            Variation {
                difference: dec!(50),
                percentage: dec!(25)
            }
        );
        assert_eq!(
            Variation::between(dec!(-100), dec!(-50)),
            Variation {
                difference: dec!(50),
                percentage: dec!(50)
            }
        );
        assert_eq!(Variation::between(dec!(0), dec!(80)).percentage, dec!(0));
    }

    async fn record_salary(
        db: &DatabaseConnection,
        ctx: &UserContext,
        amount: Decimal,
        received_on: NaiveDate,
    ) -> Result<()> {
        let account = create_test_account(db, ctx, dec!(0)).await?;
        create_income(
            db,
            ctx,
            NewIncome {
                account_id: account.id,
                source: "Salary".to_string(),
                amount,
                received_on,
                periodicity: None,
            },
        )
        .await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_monthly_report() -> Result<()> {
        let (db, ctx, budget, food, transport) = setup_food_transport_budget().await?;
        record_salary(&db, &ctx, dec!(2000), date(2025, 5, 1)).await?;
        create_dated_expense(&db, &ctx, food.id, dec!(300), date(2025, 5, 3)).await?;
        create_dated_expense(&db, &ctx, transport.id, dec!(200), date(2025, 5, 3)).await?;
        create_dated_expense(&db, &ctx, food.id, dec!(50), date(2025, 6, 1)).await?;

        let report = monthly_report(&db, &ctx, 2025, 5).await?;
        assert_eq!(report.end, date(2025, 5, 31));
        assert_eq!(report.income_total, dec!(2000));
        assert_eq!(report.expense_total, dec!(500));
        assert_eq!(report.expenses_by_category[0].category_name, "Food");
        assert_eq!(report.daily_expenses.len(), 1);
        assert_eq!(report.budget.map(|b| b.id), Some(budget.id));
        assert_eq!(report.savings, dec!(1500));
        assert_eq!(report.savings_rate, dec!(75));

        assert!(monthly_report(&db, &ctx, 2025, 13).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_yearly_report() -> Result<()> {
        let (db, ctx, _budget, food, _transport) = setup_food_transport_budget().await?;
        record_salary(&db, &ctx, dec!(1000), date(2025, 5, 1)).await?;
        create_dated_expense(&db, &ctx, food.id, dec!(250), date(2025, 5, 3)).await?;

        let report = yearly_report(&db, &ctx, 2025).await?;
        assert_eq!(report.months.len(), 12);
        assert_eq!(report.months[4].totals.expenses, dec!(250));
        assert_eq!(report.months[0].totals, PeriodTotals::default());
        assert_eq!(report.totals.net, dec!(750));
        assert_eq!(report.savings_rate, dec!(75));
        Ok(())
    }

    #[tokio::test]
    async fn test_comparative_report() -> Result<()> {
        let (db, ctx, _budget, food, transport) = setup_food_transport_budget().await?;
        create_dated_expense(&db, &ctx, food.id, dec!(100), date(2025, 5, 3)).await?;
        create_dated_expense(&db, &ctx, food.id, dec!(150), date(2025, 5, 20)).await?;
        create_dated_expense(&db, &ctx, transport.id, dec!(40), date(2025, 5, 21)).await?;

        let report = comparative_report(
            &db,
            &ctx,
            (date(2025, 5, 1), date(2025, 5, 15)),
            (date(2025, 5, 16), date(2025, 5, 31)),
        )
        .await?;

        assert_eq!(report.expenses.first, dec!(100));
        assert_eq!(report.expenses.second, dec!(190));
        assert_eq!(report.expenses.variation.percentage, dec!(90));
        assert_eq!(report.categories.len(), 2);
        assert_eq!(report.categories[0].category_name, "Food");
        assert_eq!(report.categories[1].spend.first, dec!(0));
        assert_eq!(report.categories[1].spend.variation.percentage, dec!(0));
        Ok(())
    }

    #[tokio::test]
    async fn test_spending_trends_and_statistics() -> Result<()> {
        let (db, ctx, _budget, food, _transport) = setup_food_transport_budget().await?;
        create_dated_expense(&db, &ctx, food.id, dec!(30), date(2025, 4, 30)).await?;
        create_dated_expense(&db, &ctx, food.id, dec!(70), date(2025, 5, 2)).await?;
        record_salary(&db, &ctx, dec!(500), date(2025, 5, 1)).await?;

        let trends = spending_trends(&db, &ctx, 3, date(2025, 5, 20)).await?;
        assert_eq!(
            trends.iter().map(|t| (t.month, t.total)).collect::<Vec<_>>(),
            vec![(3, dec!(0)), (4, dec!(30)), (5, dec!(70))]
        );

        let stats = global_statistics(&db, &ctx, date(2025, 5, 20)).await?;
        assert_eq!(stats.month_label, "2025-05");
        assert_eq!(stats.month.expenses, dec!(70));
        assert_eq!(stats.month.net, dec!(430));
        assert_eq!(stats.year.expenses, dec!(100));
        assert_eq!(stats.total_balance, dec!(500));
        Ok(())
    }

    #[tokio::test]
    async fn test_dashboard() -> Result<()> {
        let (db, ctx, budget, food, _transport) = setup_food_transport_budget().await?;
        for day in 1..=6 {
            create_dated_expense(&db, &ctx, food.id, dec!(10), date(2025, 5, day)).await?;
        }

        let board = dashboard(&db, &ctx, date(2025, 5, 20)).await?;
        let summary = board.current_budget.expect("budget covers the day");
        assert_eq!(summary.budget.id, budget.id);
        assert_eq!(summary.total_spent, dec!(60));
        assert_eq!(board.recent_expenses.len(), 5);
        assert!(board.goals.is_empty());

        let empty = dashboard(&db, &bob(), date(2025, 5, 20)).await?;
        assert!(empty.current_budget.is_none());
        assert!(empty.recent_expenses.is_empty());
        Ok(())
    }
}
