use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::Attribute;

use super::{Payload, Presence, Text, ValidationErrors};

/// `{id, name}` for tags and ingredients alike
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeDto {
    pub id: Uuid,
    pub name: String,
}

impl From<&Attribute> for AttributeDto {
    fn from(attribute: &Attribute) -> Self {
        Self { id: attribute.id, name: attribute.name.clone() }
    }
}

pub fn encode(rows: &[Attribute]) -> Vec<AttributeDto> {
    rows.iter().map(AttributeDto::from).collect()
}

/// Returns the validated name. `id` and any owner field in the body are ignored.
pub fn decode(body: &Value) -> Result<String, ValidationErrors> {
    let mut payload = Payload::new(body)?;
    let name = payload.string("name", Text::short(), Presence::Required);
    payload.finish()?;
    Ok(name.unwrap_or_default())
}
