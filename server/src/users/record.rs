use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::schema::{Bound, Charset, FieldRule, Outcome, Schema, SchemaError, Violation};

/// Display form of the password rule, as reported in violations.
pub const PASSWORD_PATTERN: &str = "^[a-zA-Z0-9]{3,30}$";

/// Earliest accepted `birth_year`.
pub const MIN_BIRTH_YEAR: i64 = 1900;

/// A user record that passed every rule of [`user_schema`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserRecord {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,
}

// Keeps the password out of logs.
impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("birth_year", &self.birth_year)
            .finish()
    }
}

/// Why a raw payload did not become a [`UserRecord`].
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The payload broke one or more rules; every broken rule is listed.
    #[error("record rejected with {} violation(s)", .0.len())]
    Rejected(Vec<Violation>),

    /// The schema could not be evaluated at all.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl ValidationError {
    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationError::Rejected(violations) => violations,
            ValidationError::Schema(_) => &[],
        }
    }
}

/// Field rules for the user-creation payload:
/// - `username`: required, alphanumeric, 3–30 characters
/// - `password`: required, `^[a-zA-Z0-9]{3,30}$`
/// - `birth_year`: optional integer in `[1900, current year]`
pub fn user_schema() -> Result<Schema, SchemaError> {
    Schema::new(vec![
        FieldRule::string("username")
            .alphanumeric()
            .min_length(3)
            .max_length(30)
            .required(),
        FieldRule::string("password")
            .pattern(Charset::AsciiAlphanumeric, 3, 30, PASSWORD_PATTERN)
            .required(),
        FieldRule::integer("birth_year")
            .min(Bound::Fixed(MIN_BIRTH_YEAR))
            .max(Bound::CurrentYear),
    ])
}

/// Validate an untrusted payload. The `birth_year` upper bound is read from the
/// wall clock on every call.
pub fn validate(schema: &Schema, raw: &Value) -> Result<UserRecord, ValidationError> {
    into_record(schema.evaluate(raw)?)
}

/// [`validate`] with a fixed "current year".
pub fn validate_at(
    schema: &Schema,
    raw: &Value,
    current_year: i32,
) -> Result<UserRecord, ValidationError> {
    into_record(schema.evaluate_at(raw, current_year)?)
}

fn into_record(outcome: Outcome) -> Result<UserRecord, ValidationError> {
    match outcome {
        Outcome::Accepted(fields) => serde_json::from_value(Value::Object(fields))
            .map_err(|e| ValidationError::Schema(SchemaError::Normalize(e))),
        Outcome::Rejected(violations) => Err(ValidationError::Rejected(violations)),
    }
}
