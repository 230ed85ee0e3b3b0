//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod account;
pub mod alert;
pub mod budget;
pub mod category;
pub mod category_allocation;
pub mod expense;
pub mod goal;
pub mod income;

// Re-export specific types to avoid conflicts
pub use account::{Column as AccountColumn, Entity as Account, Model as AccountModel};
pub use alert::{AlertType, Column as AlertColumn, Entity as Alert, Model as AlertModel};
pub use budget::{Column as BudgetColumn, Entity as Budget, Model as BudgetModel};
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use category_allocation::{
    Column as CategoryAllocationColumn, Entity as CategoryAllocation,
    Model as CategoryAllocationModel,
};
pub use expense::{Column as ExpenseColumn, Entity as Expense, ExpenseStatus, Model as ExpenseModel};
pub use goal::{Column as GoalColumn, Entity as Goal, GoalStatus, Model as GoalModel};
pub use income::{Column as IncomeColumn, Entity as Income, Model as IncomeModel, Periodicity};
