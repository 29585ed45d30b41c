use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

pub const MAX_NAME_LENGTH: usize = 200;
pub const MAX_PERSON_NAME_LENGTH: usize = 150;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_PASSWORD_LENGTH: usize = 128;
pub const MIN_COOKING_TIME: i64 = 1;
pub const MAX_COOKING_TIME: i64 = 32_000;
pub const MIN_AMOUNT: i64 = 1;
pub const MAX_AMOUNT: i64 = 32_000;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));
static COLOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid color regex"));
static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug regex"));

/// Usernames that collide with `/api/users/<segment>/` routes
const RESERVED_USERNAMES: &[&str] = &["me", "subscriptions", "set_password"];

/// Validation failures keyed by field name, in stable (sorted) order
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub const NON_FIELD: &'static str = "non_field_errors";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn remove(&mut self, field: &str) -> Option<Vec<String>> {
        self.0.remove(field)
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// `Ok(())` when nothing was collected, otherwise a validation `ApiError`
    pub fn into_result(self) -> Result<(), crate::error::ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(crate::error::ApiError::validation_error(self))
        }
    }

    pub fn to_json(&self) -> Value {
        json!(self.0)
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, field_errors) in errors.field_errors() {
            let field = field.to_string();
            let field = if field == "__all__" { Self::NON_FIELD.to_string() } else { field };
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({}).", error.code));
                out.add(&field, message);
            }
        }
        out
    }
}

/// Text presence and length check: not missing, not blank, within `max` characters
pub fn check_text(errors: &mut FieldErrors, field: &str, value: Option<&str>, max: Option<usize>) {
    match value {
        None => errors.add(field, REQUIRED),
        Some(v) if v.trim().is_empty() => errors.add(field, BLANK),
        Some(v) => {
            if let Some(max) = max {
                if v.chars().count() > max {
                    errors.add(field, format!("Ensure this field has no more than {} characters.", max));
                }
            }
        }
    }
}

pub fn check_range(errors: &mut FieldErrors, field: &str, value: i64, min: i64, max: i64) {
    if value < min {
        errors.add(field, format!("Ensure this value is greater than or equal to {}.", min));
    } else if value > max {
        errors.add(field, format!("Ensure this value is less than or equal to {}.", max));
    }
}

/// Integer field that also accepts numeric strings, as form-driven clients send them
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IntInput {
    Int(i64),
    Text(String),
}

impl IntInput {
    pub fn resolve(&self) -> Option<i64> {
        match self {
            IntInput::Int(n) => Some(*n),
            IntInput::Text(s) => s.trim().parse().ok(),
        }
    }
}

pub const INVALID_INT: &str = "A valid integer is required.";

/// Resolve an integer and check its range, recording problems under `field`
pub fn check_int(errors: &mut FieldErrors, field: &str, value: &IntInput, min: i64, max: i64) -> Option<i64> {
    match value.resolve() {
        Some(n) => {
            let before = errors.get(field).map_or(0, <[String]>::len);
            check_range(errors, field, n, min, max);
            (errors.get(field).map_or(0, <[String]>::len) == before).then_some(n)
        }
        None => {
            errors.add(field, INVALID_INT);
            None
        }
    }
}

pub fn validate_username(username: &str) -> Result<(), String> {
    if !USERNAME_RE.is_match(username) {
        return Err("Enter a valid username. It may contain only letters, numbers, and @/./+/-/_ characters.".to_string());
    }
    if RESERVED_USERNAMES.iter().any(|r| r.eq_ignore_ascii_case(username)) {
        return Err(format!("Username '{}' is reserved.", username));
    }
    Ok(())
}

pub fn validate_color(color: &str) -> Result<(), String> {
    if COLOR_RE.is_match(color) {
        Ok(())
    } else {
        Err(format!("'{}' is not a HEX color (#RRGGBB).", color))
    }
}

pub fn validate_slug(slug: &str) -> Result<(), String> {
    if SLUG_RE.is_match(slug) {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid slug.", slug))
    }
}

/// First value that occurs more than once, if any
pub fn first_duplicate<T: Eq + Hash + Copy>(values: impl IntoIterator<Item = T>) -> Option<T> {
    let mut seen = HashSet::new();
    values.into_iter().find(|v| !seen.insert(*v))
}
