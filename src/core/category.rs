//! Category business logic.
//!
//! Global categories are shared by all users and managed by administrators.
//! Personal categories belong to one user. A user sees both kinds, and names
//! must be unique (case-insensitive) among the categories a user sees.

use crate::{
    config::categories::Config,
    core::{
        money::{ensure_percentage, round2},
        ownership::{UserContext, ensure_owner, ensure_visible},
        validation::{optional_text, required_text},
    },
    entities::{Category, CategoryAllocation, Goal, category, category_allocation, goal},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{Condition, PaginatorTrait, QueryOrder, Set, prelude::*};
use tracing::info;

const ENTITY: &str = "Category";

/// Input for creating a category.
#[derive(Debug, Clone, Default)]
pub struct NewCategory {
    /// Display name, unique among visible categories
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Optional icon or emoji
    pub icon: Option<String>,
    /// Share used when a budget is built from defaults
    pub default_percentage: Decimal,
}

/// Fields that can be changed on an existing category.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    /// New display name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New icon
    pub icon: Option<String>,
    /// New default share
    pub default_percentage: Option<Decimal>,
}

/// Categories visible to `owner`: global ones plus the owner's personal ones.
fn visible_to(owner: Option<&str>) -> Condition {
    let condition = Condition::any().add(category::Column::UserId.is_null());
    match owner {
        Some(owner) => condition.add(category::Column::UserId.eq(owner)),
        None => condition,
    }
}

async fn ensure_name_available<C>(
    conn: &C,
    owner: Option<&str>,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    // A global name is visible to every user, so it must not clash with any category.
    let query = match owner {
        Some(_) => Category::find().filter(visible_to(owner)),
        None => Category::find(),
    };
    let existing = query.all(conn).await?;
    let lowered = name.to_lowercase();
    let taken = existing
        .iter()
        .any(|c| Some(c.id) != exclude_id && c.name.to_lowercase() == lowered);
    if taken {
        return Err(Error::validation(format!("Category '{name}' already exists")));
    }
    Ok(())
}

async fn insert_category<C>(conn: &C, owner: Option<String>, input: NewCategory) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    let name = required_text("Category name", &input.name, 100)?;
    ensure_percentage(input.default_percentage)?;
    ensure_name_available(conn, owner.as_deref(), &name, None).await?;

    let category = category::ActiveModel {
        user_id: Set(owner),
        name: Set(name),
        description: Set(optional_text("Description", input.description, 255)?),
        icon: Set(optional_text("Icon", input.icon, 50)?),
        default_percentage: Set(round2(input.default_percentage)),
        ..Default::default()
    };
    category.insert(conn).await.map_err(Into::into)
}

/// Creates a personal category for the caller.
pub async fn create_category(
    db: &DatabaseConnection,
    ctx: &UserContext,
    input: NewCategory,
) -> Result<category::Model> {
    let category = insert_category(db, Some(ctx.user_id.clone()), input).await?;
    info!("Created category '{}' for user {}", category.name, ctx.user_id);
    Ok(category)
}

/// Creates a global category. Only administrators may do this.
pub async fn create_global_category(
    db: &DatabaseConnection,
    ctx: &UserContext,
    input: NewCategory,
) -> Result<category::Model> {
    if !ctx.is_admin {
        return Err(Error::forbidden(ENTITY, "global"));
    }
    let category = insert_category(db, None, input).await?;
    info!("Created global category '{}'", category.name);
    Ok(category)
}

/// Loads a category the caller can see (global or their own).
pub async fn find_visible_category<C>(
    conn: &C,
    ctx: &UserContext,
    category_id: i64,
) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    let category = Category::find_by_id(category_id)
        .one(conn)
        .await?
        .ok_or_else(|| Error::not_found(ENTITY, category_id))?;
    ensure_visible(ctx, &category, ENTITY, category_id)?;
    Ok(category)
}

/// Retrieves a category visible to the caller.
pub async fn get_category(
    db: &DatabaseConnection,
    ctx: &UserContext,
    category_id: i64,
) -> Result<category::Model> {
    find_visible_category(db, ctx, category_id).await
}

/// Finds a visible category by name, ignoring case.
pub async fn find_category_by_name(
    db: &DatabaseConnection,
    ctx: &UserContext,
    name: &str,
) -> Result<Option<category::Model>> {
    let lowered = name.trim().to_lowercase();
    Ok(list_categories(db, ctx)
        .await?
        .into_iter()
        .find(|c| c.name.to_lowercase() == lowered))
}

/// Lists the global categories and the caller's personal ones, ordered by name.
pub async fn list_categories(db: &DatabaseConnection, ctx: &UserContext) -> Result<Vec<category::Model>> {
    Category::find()
        .filter(visible_to(Some(&ctx.user_id)))
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists global categories only.
pub async fn list_global_categories<C>(conn: &C) -> Result<Vec<category::Model>>
where
    C: ConnectionTrait,
{
    Category::find()
        .filter(category::Column::UserId.is_null())
        .order_by_asc(category::Column::Id)
        .all(conn)
        .await
        .map_err(Into::into)
}

/// Updates a category. Personal categories may be edited by their owner,
/// global ones by administrators.
pub async fn update_category(
    db: &DatabaseConnection,
    ctx: &UserContext,
    category_id: i64,
    update: CategoryUpdate,
) -> Result<category::Model> {
    let category = Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found(ENTITY, category_id))?;
    ensure_owner(ctx, &category, ENTITY, category_id)?;

    let owner = category.user_id.clone();
    let mut active: category::ActiveModel = category.into();

    if let Some(name) = update.name {
        let name = required_text("Category name", &name, 100)?;
        ensure_name_available(db, owner.as_deref(), &name, Some(category_id)).await?;
        active.name = Set(name);
    }
    if update.description.is_some() {
        active.description = Set(optional_text("Description", update.description, 255)?);
    }
    if update.icon.is_some() {
        active.icon = Set(optional_text("Icon", update.icon, 50)?);
    }
    if let Some(pct) = update.default_percentage {
        ensure_percentage(pct)?;
        active.default_percentage = Set(round2(pct));
    }

    active.update(db).await.map_err(Into::into)
}

/// Deletes a category that no allocation or goal references.
pub async fn delete_category(db: &DatabaseConnection, ctx: &UserContext, category_id: i64) -> Result<()> {
    let category = Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found(ENTITY, category_id))?;
    ensure_owner(ctx, &category, ENTITY, category_id)?;

    let allocations = CategoryAllocation::find()
        .filter(category_allocation::Column::CategoryId.eq(category_id))
        .count(db)
        .await?;
    let goals = Goal::find()
        .filter(goal::Column::CategoryId.eq(category_id))
        .count(db)
        .await?;
    if allocations > 0 || goals > 0 {
        return Err(Error::conflict(format!(
            "Category '{}' is used by {allocations} allocation(s) and {goals} goal(s)",
            category.name
        )));
    }

    category.delete(db).await?;
    info!("Deleted category {}", category_id);
    Ok(())
}

/// Inserts the configured global categories that don't exist yet.
///
/// Returns the number of categories created. A configured name already used by
/// any category, global or personal (ignoring case), is skipped.
pub async fn seed_global_categories(db: &DatabaseConnection, config: &Config) -> Result<usize> {
    let existing: Vec<String> = Category::find()
        .all(db)
        .await?
        .into_iter()
        .map(|c| c.name.to_lowercase())
        .collect();

    let mut created = 0;
    for entry in &config.categories {
        if existing.contains(&entry.name.to_lowercase()) {
            continue;
        }
        insert_category(
            db,
            None,
            NewCategory {
                name: entry.name.clone(),
                description: entry.description.clone(),
                icon: entry.icon.clone(),
                default_percentage: entry.default_percentage,
            },
        )
        .await?;
        created += 1;
    }

    if created > 0 {
        info!("Seeded {} global categories", created);
    }
    Ok(created)
}
