//! Discord command implementations organized by concept.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Account and income commands
pub mod account;

/// Alert commands
pub mod alert;

/// Budget summary and monthly report commands
pub mod budget;

/// Expense commands
pub mod expense;

/// General utility commands
pub mod general;

/// Goal commands
pub mod goal;

// Export commands
pub use account::*;
pub use alert::*;
pub use budget::*;
pub use expense::*;
pub use general::*;
pub use goal::*;
