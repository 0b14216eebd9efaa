//! Ownership scoping: every read or write of a user-owned row goes through
//! a filter produced here, so the owner predicate can never be dropped or
//! overridden by caller-supplied conditions.

use serde_json::{json, Value};
use uuid::Uuid;

use super::types::FilterData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Tag,
    Ingredient,
    Recipe,
}

impl EntityKind {
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Tag => "tags",
            EntityKind::Ingredient => "ingredients",
            EntityKind::Recipe => "recipes",
        }
    }

    /// Default listing order
    pub fn order(&self) -> &'static str {
        match self {
            EntityKind::Tag | EntityKind::Ingredient => "name desc",
            EntityKind::Recipe => "title desc",
        }
    }

    /// Singular label used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Tag => "Tag",
            EntityKind::Ingredient => "Ingredient",
            EntityKind::Recipe => "Recipe",
        }
    }
}

/// `scope(kind, owner)` composed with any number of extra predicates
#[derive(Debug, Clone)]
pub struct Scope {
    kind: EntityKind,
    owner: Uuid,
    extra: Vec<Value>,
}

pub fn scope(kind: EntityKind, owner: Uuid) -> Scope {
    Scope { kind, owner, extra: vec![] }
}

impl Scope {
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn and(mut self, predicate: Value) -> Self {
        self.extra.push(predicate);
        self
    }

    pub fn with_id(self, id: Uuid) -> Self {
        self.and(json!({ "id": id }))
    }

    pub fn with_ids(self, ids: &[Uuid]) -> Self {
        self.and(json!({ "id": { "$in": ids } }))
    }

    pub fn into_filter(self) -> FilterData {
        let owner = json!({ "user_id": self.owner });
        let where_clause = if self.extra.is_empty() {
            owner
        } else {
            let mut all = Vec::with_capacity(self.extra.len() + 1);
            all.push(owner);
            all.extend(self.extra);
            json!({ "$and": all })
        };

        FilterData {
            where_clause: Some(where_clause),
            order: Some(Value::String(self.kind.order().to_string())),
            ..Default::default()
        }
    }
}
