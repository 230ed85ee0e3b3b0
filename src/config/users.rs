//! User configuration module for loading administrator identities from environment variables.
//!
//! Administrators are the only users allowed to create or edit global categories.
//! They are listed in `ADMIN_USER_IDS` as a comma-separated list of Discord user IDs.

use std::collections::HashSet;

/// Parses a comma-separated list of user IDs, ignoring blanks and surrounding whitespace.
#[must_use]
pub fn parse_admin_ids(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Gets the set of administrator user IDs from the `ADMIN_USER_IDS` environment variable.
///
/// # Returns
///
/// An empty set when the variable is not configured.
#[must_use]
pub fn get_admin_ids() -> HashSet<String> {
    std::env::var("ADMIN_USER_IDS")
        .map(|raw| parse_admin_ids(&raw))
        .unwrap_or_default()
}

/// Whether the given user ID is configured as an administrator.
#[must_use]
pub fn is_admin(user_id: &str) -> bool {
    get_admin_ids().contains(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_ids_trims_and_skips_blanks() {
        let ids = parse_admin_ids(" 123 ,456,, ,789");
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("123"));
        assert!(ids.contains("456"));
        assert!(ids.contains("789"));
    }

    #[test]
    fn test_parse_admin_ids_empty() {
        assert!(parse_admin_ids("").is_empty());
        assert!(parse_admin_ids(" , ").is_empty());
    }
}
