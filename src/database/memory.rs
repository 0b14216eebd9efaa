use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::filter::{EntityKind, FilterData, FilterMatcher};

use super::manager::DatabaseError;
use super::models::{Account, AccountChanges, Attribute, AttributeKind, NewAccount, Recipe, RecipeChanges, RecipeDraft};
use super::store::Store;

#[derive(Debug, Default)]
struct Tables {
    accounts: Vec<Account>,
    tags: Vec<Attribute>,
    ingredients: Vec<Attribute>,
    recipes: Vec<Recipe>,
}

impl Tables {
    fn attributes(&self, kind: AttributeKind) -> &Vec<Attribute> {
        match kind {
            AttributeKind::Tag => &self.tags,
            AttributeKind::Ingredient => &self.ingredients,
        }
    }

    fn attributes_mut(&mut self, kind: AttributeKind) -> &mut Vec<Attribute> {
        match kind {
            AttributeKind::Tag => &mut self.tags,
            AttributeKind::Ingredient => &mut self.ingredients,
        }
    }
}

/// In-process store evaluating the same filter objects as `PgStore`.
/// A single lock around all tables makes each call atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Dedupe ids while keeping first-seen order
fn distinct(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut out: Vec<Uuid> = Vec::new();
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn insert_account(&self, account: NewAccount) -> Result<Account, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.accounts.iter().any(|a| a.email == account.email) {
            return Err(DatabaseError::Conflict { field: "email".to_string() });
        }
        let row = Account {
            id: Uuid::new_v4(),
            email: account.email,
            name: account.name,
            password_hash: account.password_hash,
            is_active: true,
            created_at: Utc::now(),
        };
        tables.accounts.push(row.clone());
        Ok(row)
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.iter().find(|a| a.email == email).cloned())
    }

    async fn update_account(&self, id: Uuid, changes: AccountChanges) -> Result<Account, DatabaseError> {
        let mut tables = self.tables.write().await;
        let account = tables
            .accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| DatabaseError::NotFound(format!("account {}", id)))?;
        if let Some(name) = changes.name {
            account.name = name;
        }
        if let Some(password_hash) = changes.password_hash {
            account.password_hash = password_hash;
        }
        Ok(account.clone())
    }

    async fn count_accounts(&self) -> Result<i64, DatabaseError> {
        Ok(self.tables.read().await.accounts.len() as i64)
    }

    async fn select_attributes(&self, kind: AttributeKind, filter: FilterData) -> Result<Vec<Attribute>, DatabaseError> {
        let matcher = FilterMatcher::new(filter)?;
        let tables = self.tables.read().await;
        Ok(matcher.apply(tables.attributes(kind).iter().cloned())?)
    }

    async fn insert_attribute(&self, kind: AttributeKind, owner: Uuid, name: String) -> Result<Attribute, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.accounts.iter().any(|a| a.id == owner) {
            return Err(DatabaseError::NotFound(format!("account {}", owner)));
        }
        let row = Attribute { id: Uuid::new_v4(), user_id: owner, name };
        tables.attributes_mut(kind).push(row.clone());
        Ok(row)
    }

    async fn attribute_ids_in_use(&self, kind: AttributeKind, owner: Uuid) -> Result<Vec<Uuid>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(distinct(
            tables
                .recipes
                .iter()
                .filter(|r| r.user_id == owner)
                .flat_map(|r| r.attribute_ids(kind).iter().copied()),
        ))
    }

    async fn select_recipes(&self, filter: FilterData) -> Result<Vec<Recipe>, DatabaseError> {
        let matcher = FilterMatcher::new(filter)?;
        let tables = self.tables.read().await;
        Ok(matcher.apply(tables.recipes.iter().cloned())?)
    }

    async fn insert_recipe(&self, owner: Uuid, draft: RecipeDraft) -> Result<Recipe, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.accounts.iter().any(|a| a.id == owner) {
            return Err(DatabaseError::NotFound(format!("account {}", owner)));
        }
        let row = Recipe {
            id: Uuid::new_v4(),
            user_id: owner,
            title: draft.title,
            time_minutes: draft.time_minutes,
            price: draft.price,
            link: draft.link,
            tags: distinct(draft.tags),
            ingredients: distinct(draft.ingredients),
        };
        tables.recipes.push(row.clone());
        Ok(row)
    }

    async fn update_recipe(&self, id: Uuid, changes: RecipeChanges) -> Result<Recipe, DatabaseError> {
        let mut tables = self.tables.write().await;
        let recipe = tables
            .recipes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| DatabaseError::NotFound(format!("recipe {}", id)))?;

        if let Some(title) = changes.title {
            recipe.title = title;
        }
        if let Some(time_minutes) = changes.time_minutes {
            recipe.time_minutes = time_minutes;
        }
        if let Some(price) = changes.price {
            recipe.price = price;
        }
        if let Some(link) = changes.link {
            recipe.link = link;
        }
        if let Some(tags) = changes.tags {
            recipe.tags = distinct(tags);
        }
        if let Some(ingredients) = changes.ingredients {
            recipe.ingredients = distinct(ingredients);
        }
        Ok(recipe.clone())
    }

    async fn delete_recipe(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        let before = tables.recipes.len();
        tables.recipes.retain(|r| r.id != id);
        Ok(tables.recipes.len() < before)
    }

    async fn count(&self, kind: EntityKind, filter: FilterData) -> Result<i64, DatabaseError> {
        let matcher = FilterMatcher::new(filter)?;
        let tables = self.tables.read().await;
        let count = match kind {
            EntityKind::Tag => matcher.apply(tables.tags.iter())?.len(),
            EntityKind::Ingredient => matcher.apply(tables.ingredients.iter())?.len(),
            EntityKind::Recipe => matcher.apply(tables.recipes.iter())?.len(),
        };
        Ok(count as i64)
    }
}
