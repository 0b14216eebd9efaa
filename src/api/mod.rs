//! Wire representations: payload decoding with field-keyed validation
//! messages, and the JSON shapes returned for each entity.

pub mod account;
pub mod attribute;
pub mod recipe;

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

pub const NON_FIELD_ERRORS: &str = "non_field_errors";
pub const MAX_TEXT_LENGTH: usize = 255;

const PRICE_MAX_DIGITS: u32 = 5;
const PRICE_DECIMAL_PLACES: u32 = 2;

/// Field name to messages, serialized as a plain JSON object
#[derive(Debug, Clone, Default, PartialEq, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("Invalid input")]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// First field with its first message, used as the summary line
    pub fn first(&self) -> Option<(&str, &str)> {
        self.0
            .iter()
            .find_map(|(field, messages)| messages.first().map(|m| (field.as_str(), m.as_str())))
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }
}

/// Python-style type name, matching the messages clients already parse
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Length and blank rules for a text field
#[derive(Debug, Clone, Copy)]
pub(crate) struct Text {
    pub max_len: Option<usize>,
    pub min_len: Option<usize>,
    pub allow_blank: bool,
    pub trim: bool,
}

impl Text {
    /// Required, trimmed, non-blank, at most 255 characters
    pub const fn short() -> Self {
        Self { max_len: Some(MAX_TEXT_LENGTH), min_len: None, allow_blank: false, trim: true }
    }

    pub const fn blank_ok() -> Self {
        Self { max_len: Some(MAX_TEXT_LENGTH), min_len: None, allow_blank: true, trim: true }
    }

    pub const fn password(min_len: usize) -> Self {
        Self { max_len: Some(128), min_len: Some(min_len), allow_blank: false, trim: false }
    }
}

/// Whether an absent key is an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Presence {
    Required,
    Optional,
}

/// A JSON object being decoded field by field. Errors accumulate so a
/// single response lists every offending field.
pub(crate) struct Payload<'a> {
    fields: &'a Map<String, Value>,
    errors: ValidationErrors,
}

impl<'a> Payload<'a> {
    pub fn new(value: &'a Value) -> Result<Self, ValidationErrors> {
        match value {
            Value::Object(fields) => Ok(Self { fields, errors: ValidationErrors::new() }),
            other => Err(ValidationErrors::single(
                NON_FIELD_ERRORS,
                format!("Invalid data. Expected a dictionary, but got {}.", type_name(other)),
            )),
        }
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    /// Look up a present, non-null value, recording the missing/null message otherwise
    fn value(&mut self, field: &str, presence: Presence) -> Option<&'a Value> {
        let fields = self.fields;
        match fields.get(field) {
            None => {
                if presence == Presence::Required {
                    self.error(field, "This field is required.");
                }
                None
            }
            Some(Value::Null) => {
                self.error(field, "This field may not be null.");
                None
            }
            Some(value) => Some(value),
        }
    }

    pub fn string(&mut self, field: &str, rules: Text, presence: Presence) -> Option<String> {
        let value = self.value(field, presence)?;
        match decode_text(value, rules) {
            Ok(text) => Some(text),
            Err(message) => {
                self.error(field, message);
                None
            }
        }
    }

    pub fn integer(&mut self, field: &str, presence: Presence) -> Option<i32> {
        let value = self.value(field, presence)?;
        match decode_integer(value) {
            Ok(n) => Some(n),
            Err(message) => {
                self.error(field, message);
                None
            }
        }
    }

    pub fn price(&mut self, field: &str, presence: Presence) -> Option<Decimal> {
        let value = self.value(field, presence)?;
        match decode_decimal(value, PRICE_MAX_DIGITS, PRICE_DECIMAL_PLACES) {
            Ok(price) => Some(price),
            Err(message) => {
                self.error(field, message);
                None
            }
        }
    }

    pub fn id_list(&mut self, field: &str, presence: Presence) -> Option<Vec<Uuid>> {
        let value = self.value(field, presence)?;
        match decode_id_list(value) {
            Ok(ids) => Some(ids),
            Err(message) => {
                self.error(field, message);
                None
            }
        }
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

fn decode_text(value: &Value, rules: Text) -> Result<String, String> {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return Err("Not a valid string.".to_string()),
    };
    let text = if rules.trim { raw.trim().to_string() } else { raw };

    if text.is_empty() {
        return if rules.allow_blank { Ok(text) } else { Err("This field may not be blank.".to_string()) };
    }

    let length = text.chars().count();
    if let Some(max) = rules.max_len {
        if length > max {
            return Err(format!("Ensure this field has no more than {} characters.", max));
        }
    }
    if let Some(min) = rules.min_len {
        if length < min {
            return Err(format!("Ensure this field has at least {} characters.", min));
        }
    }
    Ok(text)
}

fn decode_integer(value: &Value) -> Result<i32, String> {
    const INVALID: &str = "A valid integer is required.";

    let parsed: i64 = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < 1e18 => f as i64,
                _ => return Err(INVALID.to_string()),
            },
        },
        Value::String(s) => {
            // "12.0" is accepted as 12
            let s = s.trim();
            let s = match s.split_once('.') {
                Some((whole, frac)) if frac.chars().all(|c| c == '0') => whole,
                _ => s,
            };
            s.parse().map_err(|_| INVALID.to_string())?
        }
        _ => return Err(INVALID.to_string()),
    };

    if parsed > i32::MAX as i64 {
        return Err(format!("Ensure this value is less than or equal to {}.", i32::MAX));
    }
    if parsed < i32::MIN as i64 {
        return Err(format!("Ensure this value is greater than or equal to {}.", i32::MIN));
    }
    Ok(parsed as i32)
}

/// Parse a decimal and enforce total/fractional digit limits, counting
/// digits the way a decimal tuple would (trailing zeros count).
fn decode_decimal(value: &Value, max_digits: u32, decimal_places: u32) -> Result<Decimal, String> {
    const INVALID: &str = "A valid number is required.";

    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(INVALID.to_string()),
    };
    let mut parsed = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| INVALID.to_string())?;

    let scale = parsed.scale();
    let digits = match parsed.mantissa().unsigned_abs() {
        0 => 1,
        m => m.to_string().len() as u32,
    };
    let (total, places) = if digits > scale { (digits, scale) } else { (scale, scale) };
    let whole = total - places;

    if total > max_digits {
        return Err(format!("Ensure that there are no more than {} digits in total.", max_digits));
    }
    if places > decimal_places {
        return Err(format!("Ensure that there are no more than {} decimal places.", decimal_places));
    }
    if whole > max_digits - decimal_places {
        return Err(format!(
            "Ensure that there are no more than {} digits before the decimal point.",
            max_digits - decimal_places
        ));
    }

    parsed.rescale(decimal_places);
    Ok(parsed)
}

/// A list of primary keys. Repeated ids collapse to one.
fn decode_id_list(value: &Value) -> Result<Vec<Uuid>, String> {
    let items = match value {
        Value::Array(items) => items,
        other => return Err(format!("Expected a list of items but got type \"{}\".", type_name(other))),
    };

    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        let id = match item {
            Value::String(s) => Uuid::parse_str(s.trim()).map_err(|_| format!("“{}” is not a valid UUID.", s))?,
            other => return Err(format!("Incorrect type. Expected pk value, received {}.", type_name(other))),
        };
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}
