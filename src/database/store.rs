use async_trait::async_trait;
use uuid::Uuid;

use crate::filter::{EntityKind, FilterData};

use super::manager::DatabaseError;
use super::models::{Account, AccountChanges, Attribute, AttributeKind, NewAccount, Recipe, RecipeChanges, RecipeDraft};

/// Persistent store behind every request. Each method is its own
/// transaction boundary; filters arrive already ownership-scoped.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    /// Fails with `DatabaseError::Conflict { field: "email" }` when the email is taken
    async fn insert_account(&self, account: NewAccount) -> Result<Account, DatabaseError>;

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, DatabaseError>;

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError>;

    async fn update_account(&self, id: Uuid, changes: AccountChanges) -> Result<Account, DatabaseError>;

    async fn count_accounts(&self) -> Result<i64, DatabaseError>;

    async fn select_attributes(&self, kind: AttributeKind, filter: FilterData) -> Result<Vec<Attribute>, DatabaseError>;

    async fn insert_attribute(&self, kind: AttributeKind, owner: Uuid, name: String) -> Result<Attribute, DatabaseError>;

    /// Distinct ids of `kind` referenced by at least one recipe owned by `owner`
    async fn attribute_ids_in_use(&self, kind: AttributeKind, owner: Uuid) -> Result<Vec<Uuid>, DatabaseError>;

    /// Recipes with their tag and ingredient ids loaded
    async fn select_recipes(&self, filter: FilterData) -> Result<Vec<Recipe>, DatabaseError>;

    async fn insert_recipe(&self, owner: Uuid, draft: RecipeDraft) -> Result<Recipe, DatabaseError>;

    async fn update_recipe(&self, id: Uuid, changes: RecipeChanges) -> Result<Recipe, DatabaseError>;

    /// Returns false when no row was removed
    async fn delete_recipe(&self, id: Uuid) -> Result<bool, DatabaseError>;

    async fn count(&self, kind: EntityKind, filter: FilterData) -> Result<i64, DatabaseError>;
}
