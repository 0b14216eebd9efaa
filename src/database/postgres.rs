use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::filter::{EntityKind, FilterData};

use super::manager::DatabaseError;
use super::models::{Account, AccountChanges, Attribute, AttributeKind, NewAccount, Recipe, RecipeChanges, RecipeDraft};
use super::query_builder::QueryBuilder;
use super::store::Store;

const ATTRIBUTE_KINDS: [AttributeKind; 2] = [AttributeKind::Tag, AttributeKind::Ingredient];

/// Postgres-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load link ids for the given recipes from one join table
    async fn load_links(
        conn: &mut PgConnection,
        kind: AttributeKind,
        recipe_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Uuid>>, DatabaseError> {
        if recipe_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT recipe_id, {col} FROM {table} WHERE recipe_id = ANY($1) ORDER BY {col}",
            col = kind.link_column(),
            table = kind.link_table(),
        );
        let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(&sql)
            .bind(recipe_ids)
            .fetch_all(&mut *conn)
            .await?;

        let mut links: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for (recipe_id, attribute_id) in rows {
            links.entry(recipe_id).or_default().push(attribute_id);
        }
        Ok(links)
    }

    async fn attach_links(conn: &mut PgConnection, recipes: &mut [Recipe]) -> Result<(), DatabaseError> {
        let ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();
        let mut tags = Self::load_links(conn, AttributeKind::Tag, &ids).await?;
        let mut ingredients = Self::load_links(conn, AttributeKind::Ingredient, &ids).await?;
        for recipe in recipes.iter_mut() {
            recipe.tags = tags.remove(&recipe.id).unwrap_or_default();
            recipe.ingredients = ingredients.remove(&recipe.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn replace_links(
        conn: &mut PgConnection,
        kind: AttributeKind,
        recipe_id: Uuid,
        attribute_ids: &[Uuid],
    ) -> Result<(), DatabaseError> {
        let delete = format!("DELETE FROM {} WHERE recipe_id = $1", kind.link_table());
        sqlx::query(&delete).bind(recipe_id).execute(&mut *conn).await?;

        if attribute_ids.is_empty() {
            return Ok(());
        }
        let insert = format!(
            "INSERT INTO {table} (recipe_id, {col}) SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
            table = kind.link_table(),
            col = kind.link_column(),
        );
        sqlx::query(&insert)
            .bind(recipe_id)
            .bind(attribute_ids)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

fn map_unique_violation(err: sqlx::Error, field: &str) -> DatabaseError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.kind() == sqlx::error::ErrorKind::UniqueViolation {
            return DatabaseError::Conflict { field: field.to_string() };
        }
    }
    DatabaseError::Sqlx(err)
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_account(&self, account: NewAccount) -> Result<Account, DatabaseError> {
        sqlx::query_as::<_, Account>(
            "INSERT INTO accounts (id, email, name, password_hash, is_active, created_at)
             VALUES ($1, $2, $3, $4, TRUE, $5)
             RETURNING id, email, name, password_hash, is_active, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&account.email)
        .bind(&account.name)
        .bind(&account.password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "email"))
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, DatabaseError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, email, name, password_hash, is_active, created_at
             FROM accounts
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, email, name, password_hash, is_active, created_at
             FROM accounts
             WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn update_account(&self, id: Uuid, changes: AccountChanges) -> Result<Account, DatabaseError> {
        sqlx::query_as::<_, Account>(
            "UPDATE accounts
             SET name = COALESCE($2, name), password_hash = COALESCE($3, password_hash)
             WHERE id = $1
             RETURNING id, email, name, password_hash, is_active, created_at",
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.password_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("account {}", id)))
    }

    async fn count_accounts(&self) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn select_attributes(&self, kind: AttributeKind, filter: FilterData) -> Result<Vec<Attribute>, DatabaseError> {
        QueryBuilder::<Attribute>::new(kind.table())?
            .filter(filter)?
            .select_all(&self.pool)
            .await
    }

    async fn insert_attribute(&self, kind: AttributeKind, owner: Uuid, name: String) -> Result<Attribute, DatabaseError> {
        let sql = format!(
            "INSERT INTO {} (id, user_id, name) VALUES ($1, $2, $3) RETURNING id, user_id, name",
            kind.table()
        );
        let attribute = sqlx::query_as::<_, Attribute>(&sql)
            .bind(Uuid::new_v4())
            .bind(owner)
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(attribute)
    }

    async fn attribute_ids_in_use(&self, kind: AttributeKind, owner: Uuid) -> Result<Vec<Uuid>, DatabaseError> {
        let sql = format!(
            "SELECT DISTINCT l.{col} FROM {table} l JOIN recipes r ON r.id = l.recipe_id WHERE r.user_id = $1",
            col = kind.link_column(),
            table = kind.link_table(),
        );
        let ids = sqlx::query_scalar::<_, Uuid>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn select_recipes(&self, filter: FilterData) -> Result<Vec<Recipe>, DatabaseError> {
        // Rows and links from one snapshot
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let mut recipes = QueryBuilder::<Recipe>::new(EntityKind::Recipe.table())?
            .filter(filter)?
            .select_all(&mut *tx)
            .await?;
        Self::attach_links(&mut tx, &mut recipes).await?;

        tx.commit().await?;
        Ok(recipes)
    }

    async fn insert_recipe(&self, owner: Uuid, draft: RecipeDraft) -> Result<Recipe, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let mut recipe = sqlx::query_as::<_, Recipe>(
            "INSERT INTO recipes (id, user_id, title, time_minutes, price, link)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, user_id, title, time_minutes, price, link",
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&draft.title)
        .bind(draft.time_minutes)
        .bind(draft.price)
        .bind(&draft.link)
        .fetch_one(&mut *tx)
        .await?;

        Self::replace_links(&mut tx, AttributeKind::Tag, recipe.id, &draft.tags).await?;
        Self::replace_links(&mut tx, AttributeKind::Ingredient, recipe.id, &draft.ingredients).await?;
        Self::attach_links(&mut tx, std::slice::from_mut(&mut recipe)).await?;

        tx.commit().await?;
        Ok(recipe)
    }

    async fn update_recipe(&self, id: Uuid, changes: RecipeChanges) -> Result<Recipe, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let mut recipe = sqlx::query_as::<_, Recipe>(
            "UPDATE recipes
             SET title = COALESCE($2, title),
                 time_minutes = COALESCE($3, time_minutes),
                 price = COALESCE($4, price),
                 link = COALESCE($5, link)
             WHERE id = $1
             RETURNING id, user_id, title, time_minutes, price, link",
        )
        .bind(id)
        .bind(&changes.title)
        .bind(changes.time_minutes)
        .bind(changes.price)
        .bind(&changes.link)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("recipe {}", id)))?;

        for kind in ATTRIBUTE_KINDS {
            if let Some(ids) = changes.attribute_ids(kind) {
                Self::replace_links(&mut tx, kind, id, ids).await?;
            }
        }
        Self::attach_links(&mut tx, std::slice::from_mut(&mut recipe)).await?;

        tx.commit().await?;
        Ok(recipe)
    }

    async fn delete_recipe(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, kind: EntityKind, filter: FilterData) -> Result<i64, DatabaseError> {
        match kind {
            EntityKind::Recipe => QueryBuilder::<Recipe>::new(kind.table())?.filter(filter)?.count(&self.pool).await,
            EntityKind::Tag | EntityKind::Ingredient => {
                QueryBuilder::<Attribute>::new(kind.table())?.filter(filter)?.count(&self.pool).await
            }
        }
    }
}
