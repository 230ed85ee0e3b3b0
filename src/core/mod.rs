/// Bank accounts and their balances
pub mod account;
/// Spending alerts on allocations
pub mod alert;
/// Splitting a budget total across categories
pub mod allocation;
/// Budgets over a date range
pub mod budget;
/// Global and personal spending categories
pub mod category;
/// Expenses recorded against allocations
pub mod expense;
/// Savings and spending goals
pub mod goal;
/// Incomes credited to accounts
pub mod income;
/// Decimal money helpers
pub mod money;
/// Caller identity and ownership checks
pub mod ownership;
/// Reports, statistics and display formatting
pub mod report;
/// Derived spend figures for budgets and allocations
pub mod spending;
/// Input validation helpers
pub mod validation;
