/// Database configuration and connection management
pub mod database;

/// Global category seeding configuration from config.toml
pub mod categories;

/// Administrator identities from environment variables
pub mod users;
