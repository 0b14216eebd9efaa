use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::{Attribute, Recipe, RecipeChanges, RecipeDraft};

use super::attribute::AttributeDto;
use super::{Payload, Presence, Text, ValidationErrors};

/// List representation; tags and ingredients are bare ids
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeDto {
    pub id: Uuid,
    pub title: String,
    pub ingredients: Vec<Uuid>,
    pub tags: Vec<Uuid>,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
}

/// Detail representation with tags and ingredients expanded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeDetailDto {
    pub id: Uuid,
    pub title: String,
    pub ingredients: Vec<AttributeDto>,
    pub tags: Vec<AttributeDto>,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
}

pub fn encode(recipe: &Recipe) -> RecipeDto {
    RecipeDto {
        id: recipe.id,
        title: recipe.title.clone(),
        ingredients: recipe.ingredients.clone(),
        tags: recipe.tags.clone(),
        time_minutes: recipe.time_minutes,
        price: recipe.price,
        link: recipe.link.clone(),
    }
}

pub fn encode_detail(recipe: &Recipe, tags: &[Attribute], ingredients: &[Attribute]) -> RecipeDetailDto {
    RecipeDetailDto {
        id: recipe.id,
        title: recipe.title.clone(),
        ingredients: ingredients.iter().map(AttributeDto::from).collect(),
        tags: tags.iter().map(AttributeDto::from).collect(),
        time_minutes: recipe.time_minutes,
        price: recipe.price,
        link: recipe.link.clone(),
    }
}

/// Create or PUT body. Link and id lists default to empty.
pub fn decode(body: &Value) -> Result<RecipeDraft, ValidationErrors> {
    let mut payload = Payload::new(body)?;
    let title = payload.string("title", Text::short(), Presence::Required);
    let time_minutes = payload.integer("time_minutes", Presence::Required);
    let price = payload.price("price", Presence::Required);
    let link = payload.string("link", Text::blank_ok(), Presence::Optional);
    let tags = payload.id_list("tags", Presence::Optional);
    let ingredients = payload.id_list("ingredients", Presence::Optional);
    payload.finish()?;

    Ok(RecipeDraft {
        title: title.unwrap_or_default(),
        time_minutes: time_minutes.unwrap_or_default(),
        price: price.unwrap_or_default(),
        link: link.unwrap_or_default(),
        tags: tags.unwrap_or_default(),
        ingredients: ingredients.unwrap_or_default(),
    })
}

/// PATCH body; absent keys stay `None`
pub fn decode_partial(body: &Value) -> Result<RecipeChanges, ValidationErrors> {
    let mut payload = Payload::new(body)?;
    let changes = RecipeChanges {
        title: payload.string("title", Text::short(), Presence::Optional),
        time_minutes: payload.integer("time_minutes", Presence::Optional),
        price: payload.price("price", Presence::Optional),
        link: payload.string("link", Text::blank_ok(), Presence::Optional),
        tags: payload.id_list("tags", Presence::Optional),
        ingredients: payload.id_list("ingredients", Presence::Optional),
    };
    payload.finish()?;
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_defaults() {
        let draft = decode(&json!({"title": "Toast", "time_minutes": 5, "price": "1.5"})).unwrap();
        assert_eq!(draft.link, "");
        assert!(draft.tags.is_empty());
        assert!(draft.ingredients.is_empty());
        assert_eq!(draft.price.to_string(), "1.50");
    }

    #[test]
    fn test_decode_reports_all_fields() {
        let errors = decode(&json!({"title": "", "time_minutes": "soon"})).unwrap_err();
        assert_eq!(errors.get("title").unwrap(), ["This field may not be blank."]);
        assert_eq!(errors.get("time_minutes").unwrap(), ["A valid integer is required."]);
        assert_eq!(errors.get("price").unwrap(), ["This field is required."]);
    }

    #[test]
    fn test_partial_keeps_absent_fields_none() {
        let tag = Uuid::new_v4();
        let changes = decode_partial(&json!({"title": "Soup", "tags": [tag]})).unwrap();
        assert_eq!(changes.title.as_deref(), Some("Soup"));
        assert_eq!(changes.tags, Some(vec![tag]));
        assert!(changes.price.is_none());
        assert!(changes.ingredients.is_none());
    }

    #[test]
    fn test_encode_price_as_string() {
        let recipe = Recipe {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Soup".into(),
            time_minutes: 20,
            price: Decimal::new(500, 2),
            link: String::new(),
            tags: vec![],
            ingredients: vec![],
        };
        let value = serde_json::to_value(encode(&recipe)).unwrap();
        assert_eq!(value["price"], json!("5.00"));
        assert_eq!(value["tags"], json!([]));
    }
}
