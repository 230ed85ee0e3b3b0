//! Caller identity and ownership checks.
//!
//! Every owner-scoped operation in `core` receives a [`UserContext`] built by the
//! boundary layer. Entities expose their owner through [`Owned`] so the check is the
//! same everywhere.

use crate::{
    entities::{account, budget, category, goal, income},
    errors::{Error, Result},
};

/// Identity of the user performing an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    /// External user identity (Discord user ID)
    pub user_id: String,
    /// Administrators may manage global categories
    pub is_admin: bool,
}

impl UserContext {
    /// Context for a regular user.
    #[must_use]
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_admin: false,
        }
    }

    /// Context for an administrator.
    #[must_use]
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_admin: true,
        }
    }
}

/// An entity with an owner.
pub trait Owned {
    /// Owner identity, or `None` for shared entities.
    fn owner_id(&self) -> Option<&str>;
}

impl Owned for account::Model {
    fn owner_id(&self) -> Option<&str> {
        Some(&self.user_id)
    }
}

impl Owned for budget::Model {
    fn owner_id(&self) -> Option<&str> {
        Some(&self.user_id)
    }
}

impl Owned for goal::Model {
    fn owner_id(&self) -> Option<&str> {
        Some(&self.user_id)
    }
}

impl Owned for income::Model {
    fn owner_id(&self) -> Option<&str> {
        Some(&self.user_id)
    }
}

impl Owned for category::Model {
    fn owner_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

/// Fails with `Forbidden` unless `ctx` owns `entity`.
///
/// Shared entities (no owner) are only accepted for administrators.
pub fn ensure_owner<T: Owned>(
    ctx: &UserContext,
    entity: &T,
    kind: &'static str,
    id: i64,
) -> Result<()> {
    match entity.owner_id() {
        Some(owner) if owner == ctx.user_id => Ok(()),
        None if ctx.is_admin => Ok(()),
        _ => Err(Error::forbidden(kind, id)),
    }
}

/// Fails with `Forbidden` unless `ctx` can read `entity`: owners always can,
/// and shared entities are readable by everyone.
pub fn ensure_visible<T: Owned>(
    ctx: &UserContext,
    entity: &T,
    kind: &'static str,
    id: i64,
) -> Result<()> {
    match entity.owner_id() {
        None => Ok(()),
        Some(owner) if owner == ctx.user_id => Ok(()),
        Some(_) => Err(Error::forbidden(kind, id)),
    }
}
