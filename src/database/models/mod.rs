pub mod account;
pub mod attribute;
pub mod recipe;

pub use account::{Account, AccountChanges, NewAccount};
pub use attribute::{Attribute, AttributeKind};
pub use recipe::{Recipe, RecipeChanges, RecipeDraft};
