//! Validated user intake: schema rules, the accepted record type, and the
//! `POST /api/users` handler.

pub mod create;
pub mod record;
pub mod schema;

pub use record::{user_schema, validate, UserRecord, ValidationError};
pub use schema::{Schema, SchemaError, Violation};
