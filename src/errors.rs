use rust_decimal::Decimal;
use thiserror::Error;

/// Everything that can go wrong in the ledger or the bot
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed settings
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong with the configuration
        message: String,
    },

    /// Input that breaks a field rule
    #[error("Validation error: {message}")]
    Validation {
        /// Which rule was broken
        message: String,
    },

    /// A negative money amount
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// A percentage outside 0-100
    #[error("Invalid percentage: {value} (must be between 0 and 100)")]
    InvalidPercentage {
        /// The rejected percentage
        value: Decimal,
    },

    /// Budget shares that do not add up to 100
    #[error("Allocation percentages must add up to 100 (got {total})")]
    AllocationSum {
        /// Sum of the shares given
        total: Decimal,
    },

    /// A record that does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record looked up
        entity: &'static str,
        /// Id or name that was looked up
        id: String,
    },

    /// A record owned by another user
    #[error("{entity} {id} does not belong to you")]
    Forbidden {
        /// Kind of record
        entity: &'static str,
        /// Id of the record
        id: String,
    },

    /// An operation that clashes with existing data
    #[error("Conflict: {message}")]
    Conflict {
        /// What it clashes with
        message: String,
    },

    /// An edit to an achieved, failed or abandoned goal
    #[error("Goal is {status} and can no longer be edited")]
    GoalClosed {
        /// Label of the goal's terminal status
        status: String,
    },

    /// Database driver or query failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// File system failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unreadable environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Failure while building a message
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// A number that does not fit a decimal
    #[error("Decimal conversion error: {0}")]
    Decimal(#[from] rust_decimal::Error),

    /// Discord client or command framework failure
    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),
}

impl Error {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn forbidden(entity: &'static str, id: impl ToString) -> Self {
        Self::Forbidden {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Error::FrameworkError(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
