use serde::Serialize;
use serde_json::Value;

use crate::database::models::Account;

use super::{Payload, Presence, Text, ValidationErrors};

/// Public account shape; the password never leaves the server
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountDto {
    pub name: String,
    pub email: String,
}

impl From<&Account> for AccountDto {
    fn from(account: &Account) -> Self {
        Self { name: account.name.clone(), email: account.email.clone() }
    }
}

#[derive(Debug, Clone)]
pub struct Signup {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Plain-text changes for the caller's own account
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// PUT: name and password are required
    Full,
    /// PATCH: only supplied fields change
    Partial,
}

/// Lower-case the domain part; the local part is kept as typed
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

fn email_field(payload: &mut Payload<'_>) -> Option<String> {
    let email = payload.string("email", Text::short(), Presence::Required)?;
    if !is_valid_email(&email) {
        payload.error("email", "Enter a valid email address.");
        return None;
    }
    Some(normalize_email(&email))
}

pub fn decode_signup(body: &Value, min_password_length: usize) -> Result<Signup, ValidationErrors> {
    let mut payload = Payload::new(body)?;
    let email = email_field(&mut payload);
    let password = payload.string("password", Text::password(min_password_length), Presence::Required);
    let name = payload.string("name", Text::blank_ok(), Presence::Optional);
    payload.finish()?;

    // required fields are present once finish() succeeds
    Ok(Signup {
        email: email.unwrap_or_default(),
        name: name.unwrap_or_default(),
        password: password.unwrap_or_default(),
    })
}

pub fn decode_credentials(body: &Value) -> Result<Credentials, ValidationErrors> {
    let mut payload = Payload::new(body)?;
    let email = payload.string("email", Text::short(), Presence::Required);
    let password = payload.string(
        "password",
        Text { max_len: None, min_len: None, allow_blank: false, trim: false },
        Presence::Required,
    );
    payload.finish()?;

    Ok(Credentials {
        email: normalize_email(&email.unwrap_or_default()),
        password: password.unwrap_or_default(),
    })
}

/// Email is not writable here; it is ignored when supplied
pub fn decode_update(body: &Value, mode: UpdateMode, min_password_length: usize) -> Result<AccountUpdate, ValidationErrors> {
    let presence = match mode {
        UpdateMode::Full => Presence::Required,
        UpdateMode::Partial => Presence::Optional,
    };

    let mut payload = Payload::new(body)?;
    let name = payload.string("name", Text::blank_ok(), presence);
    let password = payload.string("password", Text::password(min_password_length), presence);
    payload.finish()?;

    Ok(AccountUpdate { name, password })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_signup_defaults_name() {
        let signup = decode_signup(&json!({"email": "cook@Example.COM", "password": "secret"}), 5).unwrap();
        assert_eq!(signup.email, "cook@example.com");
        assert_eq!(signup.name, "");
    }

    #[test]
    fn test_signup_short_password() {
        let errors = decode_signup(&json!({"email": "cook@example.com", "password": "pw"}), 5).unwrap_err();
        assert_eq!(errors.get("password").unwrap(), ["Ensure this field has at least 5 characters."]);
    }

    #[test]
    fn test_signup_collects_every_field() {
        let errors = decode_signup(&json!({"email": "not-an-email"}), 5).unwrap_err();
        assert_eq!(errors.get("email").unwrap(), ["Enter a valid email address."]);
        assert_eq!(errors.get("password").unwrap(), ["This field is required."]);
    }

    #[test]
    fn test_credentials_blank_password() {
        let errors = decode_credentials(&json!({"email": "cook@example.com", "password": ""})).unwrap_err();
        assert_eq!(errors.get("password").unwrap(), ["This field may not be blank."]);
    }

    #[test]
    fn test_update_modes() {
        let patch = decode_update(&json!({"name": "Chef"}), UpdateMode::Partial, 5).unwrap();
        assert_eq!(patch.name.as_deref(), Some("Chef"));
        assert!(patch.password.is_none());

        let errors = decode_update(&json!({"name": "Chef"}), UpdateMode::Full, 5).unwrap_err();
        assert_eq!(errors.get("password").unwrap(), ["This field is required."]);
    }

    #[test]
    fn test_dto_has_no_password() {
        let account = Account {
            id: uuid::Uuid::new_v4(),
            email: "cook@example.com".into(),
            name: "Cook".into(),
            password_hash: "hash".into(),
            is_active: true,
            created_at: chrono::Utc::now(),
        };
        let value = serde_json::to_value(AccountDto::from(&account)).unwrap();
        assert_eq!(value, json!({"name": "Cook", "email": "cook@example.com"}));
    }
}
