//! Declarative field rules and the engine that evaluates them.
//!
//! A [`Schema`] is plain data: one [`FieldRule`] per accepted key, each with a
//! type, a required flag and a list of [`Constraint`]s. [`Schema::evaluate`]
//! walks every rule and collects every [`Violation`] in one pass, so callers
//! always see the complete list of problems with a record.

use chrono::Datelike;
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Label the root object is reported under when it is not an object at all.
const ROOT_LABEL: &str = "value";

/// Largest integer an IEEE-754 double represents exactly (2^53 - 1).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Errors raised when the schema itself is unusable. These are server faults,
/// never a judgement on the caller's input.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A constraint doesn't apply to the field's type, or its bounds are inverted.
    #[error("field \"{field}\" is misconfigured: {reason}")]
    Misconfigured { field: String, reason: String },

    /// Accepted values didn't fit the target record type.
    #[error("accepted values could not be normalized: {0}")]
    Normalize(#[from] serde_json::Error),
}

/// Value type a field must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
}

/// Numeric bound, either fixed or resolved at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Fixed(i64),
    /// Calendar year of the local wall clock when the record is evaluated.
    CurrentYear,
}

impl Bound {
    fn resolve(&self, current_year: i32) -> i64 {
        match self {
            Bound::Fixed(n) => *n,
            Bound::CurrentYear => i64::from(current_year),
        }
    }
}

/// Character class accepted by a [`Constraint::Pattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// `[a-zA-Z0-9]`
    AsciiAlphanumeric,
}

impl Charset {
    fn matches(&self, c: char) -> bool {
        match self {
            Charset::AsciiAlphanumeric => c.is_ascii_alphanumeric(),
        }
    }
}

/// A single rule attached to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    MinLength(usize),
    MaxLength(usize),
    /// Only ASCII letters and digits.
    Alphanumeric,
    /// Whole-value match of `charset{min,max}`; `source` is the pattern as
    /// shown to callers.
    Pattern {
        charset: Charset,
        min: usize,
        max: usize,
        source: &'static str,
    },
    Min(Bound),
    Max(Bound),
}

impl Constraint {
    fn applies_to(&self, kind: FieldKind) -> bool {
        match self {
            Constraint::MinLength(_)
            | Constraint::MaxLength(_)
            | Constraint::Alphanumeric
            | Constraint::Pattern { .. } => kind == FieldKind::String,
            Constraint::Min(_) | Constraint::Max(_) => kind == FieldKind::Integer,
        }
    }
}

/// Declarative rule for one key of the incoming object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub constraints: Vec<Constraint>,
}

// Builder methods
impl FieldRule {
    pub fn string(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::String,
            required: false,
            constraints: Vec::new(),
        }
    }

    pub fn integer(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Integer,
            required: false,
            constraints: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.constraints.push(Constraint::MinLength(len));
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.constraints.push(Constraint::MaxLength(len));
        self
    }

    pub fn alphanumeric(mut self) -> Self {
        self.constraints.push(Constraint::Alphanumeric);
        self
    }

    pub fn pattern(
        mut self,
        charset: Charset,
        min: usize,
        max: usize,
        source: &'static str,
    ) -> Self {
        self.constraints.push(Constraint::Pattern {
            charset,
            min,
            max,
            source,
        });
        self
    }

    pub fn min(mut self, bound: Bound) -> Self {
        self.constraints.push(Constraint::Min(bound));
        self
    }

    pub fn max(mut self, bound: Bound) -> Self {
        self.constraints.push(Constraint::Max(bound));
        self
    }

    fn misconfigured(&self, reason: impl Into<String>) -> SchemaError {
        SchemaError::Misconfigured {
            field: self.name.to_string(),
            reason: reason.into(),
        }
    }

    fn check_config(&self) -> Result<(), SchemaError> {
        let mut min_len = None;
        let mut max_len = None;
        let mut min = None;
        let mut max = None;

        for constraint in &self.constraints {
            if !constraint.applies_to(self.kind) {
                return Err(self.misconfigured(format!(
                    "{:?} cannot constrain a {:?} field",
                    constraint, self.kind
                )));
            }
            match constraint {
                Constraint::MinLength(n) => min_len = Some(*n),
                Constraint::MaxLength(n) => max_len = Some(*n),
                Constraint::Pattern { min, max, .. } if min > max => {
                    return Err(self.misconfigured("pattern length range is inverted"));
                }
                Constraint::Min(Bound::Fixed(n)) => min = Some(*n),
                Constraint::Max(Bound::Fixed(n)) => max = Some(*n),
                _ => {}
            }
        }

        if let (Some(lo), Some(hi)) = (min_len, max_len) {
            if lo > hi {
                return Err(self.misconfigured("min length exceeds max length"));
            }
        }
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(self.misconfigured("min exceeds max"));
            }
        }
        Ok(())
    }

    /// Check one present value. Returns the normalized value, or every
    /// violation this field produced.
    fn check(&self, value: &Value, current_year: i32) -> Result<Checked, SchemaError> {
        match self.kind {
            FieldKind::String => self.check_string(value),
            FieldKind::Integer => self.check_integer(value, current_year),
        }
    }

    fn check_string(&self, value: &Value) -> Result<Checked, SchemaError> {
        let Some(s) = value.as_str() else {
            return Ok(Checked::Invalid(vec![Violation::new(
                self.name,
                "string.base",
                format!("\"{}\" must be a string", self.name),
            )
            .with_value(value.clone())]));
        };

        if s.is_empty() {
            return Ok(Checked::Invalid(vec![Violation::new(
                self.name,
                "string.empty",
                format!("\"{}\" is not allowed to be empty", self.name),
            )
            .with_value(value.clone())]));
        }

        let len = s.chars().count();
        let mut violations = Vec::new();

        for constraint in &self.constraints {
            let violation = match constraint {
                Constraint::MinLength(min) if len < *min => Violation::new(
                    self.name,
                    "string.min",
                    format!(
                        "\"{}\" length must be at least {} characters long",
                        self.name, min
                    ),
                )
                .with_limit(*min),
                Constraint::MaxLength(max) if len > *max => Violation::new(
                    self.name,
                    "string.max",
                    format!(
                        "\"{}\" length must be less than or equal to {} characters long",
                        self.name, max
                    ),
                )
                .with_limit(*max),
                Constraint::Alphanumeric if !s.chars().all(|c| c.is_ascii_alphanumeric()) => {
                    Violation::new(
                        self.name,
                        "string.alphanum",
                        format!(
                            "\"{}\" must only contain alpha-numeric characters",
                            self.name
                        ),
                    )
                }
                Constraint::Pattern {
                    charset,
                    min,
                    max,
                    source,
                } if !(len >= *min && len <= *max && s.chars().all(|c| charset.matches(c))) => {
                    Violation::new(
                        self.name,
                        "string.pattern.base",
                        format!(
                            "\"{}\" with value \"{}\" fails to match the required pattern: /{}/",
                            self.name, s, source
                        ),
                    )
                    .with_regex(source)
                }
                Constraint::Min(_) | Constraint::Max(_) => {
                    return Err(self.misconfigured("numeric bound on a string field"));
                }
                _ => continue,
            };
            violations.push(violation.with_value(value.clone()));
        }

        if violations.is_empty() {
            Ok(Checked::Valid(value.clone()))
        } else {
            Ok(Checked::Invalid(violations))
        }
    }

    fn check_integer(&self, value: &Value, current_year: i32) -> Result<Checked, SchemaError> {
        let Some(number) = coerce_number(value) else {
            return Ok(Checked::Invalid(vec![Violation::new(
                self.name,
                "number.base",
                format!("\"{}\" must be a number", self.name),
            )
            .with_value(value.clone())]));
        };

        if number.abs() > MAX_SAFE_INTEGER {
            return Ok(Checked::Invalid(vec![Violation::new(
                self.name,
                "number.unsafe",
                format!("\"{}\" must be a safe number", self.name),
            )
            .with_value(value.clone())]));
        }

        let mut violations = Vec::new();

        if number.fract() != 0.0 {
            violations.push(
                Violation::new(
                    self.name,
                    "number.integer",
                    format!("\"{}\" must be an integer", self.name),
                )
                .with_value(value.clone()),
            );
        }

        for constraint in &self.constraints {
            let violation = match constraint {
                Constraint::Min(bound) => {
                    let limit = bound.resolve(current_year);
                    if number >= limit as f64 {
                        continue;
                    }
                    Violation::new(
                        self.name,
                        "number.min",
                        format!(
                            "\"{}\" must be greater than or equal to {}",
                            self.name, limit
                        ),
                    )
                    .with_limit(limit)
                }
                Constraint::Max(bound) => {
                    let limit = bound.resolve(current_year);
                    if number <= limit as f64 {
                        continue;
                    }
                    Violation::new(
                        self.name,
                        "number.max",
                        format!("\"{}\" must be less than or equal to {}", self.name, limit),
                    )
                    .with_limit(limit)
                }
                _ => return Err(self.misconfigured("string constraint on an integer field")),
            };
            violations.push(violation.with_value(value.clone()));
        }

        if !violations.is_empty() {
            return Ok(Checked::Invalid(violations));
        }

        // Integral and within the safe range, so the cast is exact.
        Ok(Checked::Valid(Value::Number(Number::from(number as i64))))
    }
}

enum Checked {
    Valid(Value),
    Invalid(Vec<Violation>),
}

/// Numbers pass through; numeric strings are converted. Anything else is
/// not a number.
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// One violated constraint, in the shape existing clients of this endpoint
/// already parse: `{ message, path, type, context }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub message: String,
    pub path: Vec<String>,
    #[serde(rename = "type")]
    pub rule: String,
    pub context: ViolationContext,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolationContext {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Violation {
    fn new(field: &str, rule: &str, message: String) -> Self {
        Self {
            message,
            path: vec![field.to_string()],
            rule: rule.to_string(),
            context: ViolationContext {
                label: field.to_string(),
                key: Some(field.to_string()),
                limit: None,
                regex: None,
                value: None,
            },
        }
    }

    fn required(field: &str) -> Self {
        Self::new(field, "any.required", format!("\"{}\" is required", field))
    }

    fn unknown(field: &str, value: &Value) -> Self {
        Self::new(field, "object.unknown", format!("\"{}\" is not allowed", field))
            .with_value(value.clone())
    }

    fn not_an_object(value: &Value) -> Self {
        Self {
            message: format!("\"{}\" must be of type object", ROOT_LABEL),
            path: Vec::new(),
            rule: "object.base".to_string(),
            context: ViolationContext {
                label: ROOT_LABEL.to_string(),
                key: None,
                limit: None,
                regex: None,
                value: Some(value.clone()),
            },
        }
    }

    fn with_limit(mut self, limit: impl Into<Value>) -> Self {
        self.context.limit = Some(limit.into());
        self
    }

    fn with_regex(mut self, source: &str) -> Self {
        self.context.regex = Some(format!("/{}/", source));
        self
    }

    fn with_value(mut self, value: Value) -> Self {
        self.context.value = Some(value);
        self
    }

    /// Name of the offending field, `None` for a whole-record violation.
    pub fn field(&self) -> Option<&str> {
        self.path.first().map(String::as_str)
    }
}

/// Result of evaluating a record against a [`Schema`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Every rule passed; holds exactly the declared fields that were present,
    /// with values coerced to their declared types.
    Accepted(Map<String, Value>),
    /// At least one rule failed; holds every violation found.
    Rejected(Vec<Violation>),
}

/// An ordered set of field rules for one object shape. Keys without a rule
/// are rejected.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldRule>,
}

impl Schema {
    pub fn new(fields: Vec<FieldRule>) -> Result<Self, SchemaError> {
        for field in &fields {
            field.check_config()?;
        }
        Ok(Self { fields })
    }

    /// Evaluate `raw` against the wall-clock year read right now.
    pub fn evaluate(&self, raw: &Value) -> Result<Outcome, SchemaError> {
        self.evaluate_at(raw, current_year())
    }

    /// Evaluate `raw` with an explicit value for [`Bound::CurrentYear`].
    pub fn evaluate_at(&self, raw: &Value, current_year: i32) -> Result<Outcome, SchemaError> {
        let Some(object) = raw.as_object() else {
            return Ok(Outcome::Rejected(vec![Violation::not_an_object(raw)]));
        };

        let mut accepted = Map::new();
        let mut violations = Vec::new();

        for rule in &self.fields {
            match object.get(rule.name) {
                None if rule.required => violations.push(Violation::required(rule.name)),
                None => {}
                Some(value) => match rule.check(value, current_year)? {
                    Checked::Valid(normalized) => {
                        accepted.insert(rule.name.to_string(), normalized);
                    }
                    Checked::Invalid(mut found) => violations.append(&mut found),
                },
            }
        }

        for (key, value) in object {
            if !self.fields.iter().any(|rule| rule.name == key) {
                violations.push(Violation::unknown(key, value));
            }
        }

        if violations.is_empty() {
            Ok(Outcome::Accepted(accepted))
        } else {
            Ok(Outcome::Rejected(violations))
        }
    }
}

/// Calendar year of the local wall clock.
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules(rejected: &Outcome) -> Vec<(&str, &str)> {
        match rejected {
            Outcome::Rejected(v) => v
                .iter()
                .map(|v| (v.field().unwrap_or(""), v.rule.as_str()))
                .collect(),
            Outcome::Accepted(map) => panic!("expected rejection, got {:?}", map),
        }
    }

    #[test]
    fn test_string_reports_every_failing_constraint() {
        let schema = Schema::new(vec![FieldRule::string("name")
            .alphanumeric()
            .min_length(3)
            .max_length(5)])
        .unwrap();

        let outcome = schema.evaluate_at(&json!({"name": "a!"}), 2024).unwrap();
        assert_eq!(
            rules(&outcome),
            vec![("name", "string.alphanum"), ("name", "string.min")]
        );
    }

    #[test]
    fn test_wrong_type_reports_only_the_type() {
        let schema = Schema::new(vec![FieldRule::string("name").min_length(3)]).unwrap();
        let outcome = schema.evaluate_at(&json!({"name": 7}), 2024).unwrap();
        assert_eq!(rules(&outcome), vec![("name", "string.base")]);
    }

    #[test]
    fn test_empty_string_is_its_own_violation() {
        let schema = Schema::new(vec![FieldRule::string("name").min_length(3)]).unwrap();
        let outcome = schema.evaluate_at(&json!({"name": ""}), 2024).unwrap();
        assert_eq!(rules(&outcome), vec![("name", "string.empty")]);
    }

    #[test]
    fn test_pattern_message_includes_source() {
        let schema = Schema::new(vec![FieldRule::string("pw").pattern(
            Charset::AsciiAlphanumeric,
            3,
            30,
            "^[a-zA-Z0-9]{3,30}$",
        )])
        .unwrap();

        match schema.evaluate_at(&json!({"pw": "ab"}), 2024).unwrap() {
            Outcome::Rejected(v) => {
                assert_eq!(v.len(), 1);
                assert_eq!(v[0].rule, "string.pattern.base");
                assert_eq!(
                    v[0].message,
                    "\"pw\" with value \"ab\" fails to match the required pattern: /^[a-zA-Z0-9]{3,30}$/"
                );
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_current_year_bound_follows_evaluation_year() {
        let schema =
            Schema::new(vec![FieldRule::integer("year").max(Bound::CurrentYear)]).unwrap();
        let raw = json!({"year": 2030});

        assert!(matches!(
            schema.evaluate_at(&raw, 2029).unwrap(),
            Outcome::Rejected(_)
        ));
        assert!(matches!(
            schema.evaluate_at(&raw, 2030).unwrap(),
            Outcome::Accepted(_)
        ));
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let schema = Schema::new(vec![FieldRule::integer("n").min(Bound::Fixed(0))]).unwrap();
        match schema.evaluate_at(&json!({"n": " 42 "}), 2024).unwrap() {
            Outcome::Accepted(map) => assert_eq!(map["n"], json!(42)),
            other => panic!("expected acceptance, got {:?}", other),
        }
    }

    #[test]
    fn test_huge_numbers_are_unsafe() {
        let schema = Schema::new(vec![FieldRule::integer("n")]).unwrap();
        let outcome = schema.evaluate_at(&json!({"n": 1e300}), 2024).unwrap();
        assert_eq!(rules(&outcome), vec![("n", "number.unsafe")]);
    }

    #[test]
    fn test_fractional_number_is_not_an_integer() {
        let schema = Schema::new(vec![FieldRule::integer("n")]).unwrap();
        let outcome = schema.evaluate_at(&json!({"n": 1.5}), 2024).unwrap();
        assert_eq!(rules(&outcome), vec![("n", "number.integer")]);
    }

    #[test]
    fn test_non_numeric_values_fail_number_base() {
        let schema = Schema::new(vec![FieldRule::integer("n")]).unwrap();
        for raw in [json!({"n": null}), json!({"n": true}), json!({"n": ""}), json!({"n": "x1"})] {
            let outcome = schema.evaluate_at(&raw, 2024).unwrap();
            assert_eq!(rules(&outcome), vec![("n", "number.base")], "input {}", raw);
        }
    }

    #[test]
    fn test_unknown_keys_and_missing_required_reported_together() {
        let schema = Schema::new(vec![FieldRule::string("a").required()]).unwrap();
        let outcome = schema.evaluate_at(&json!({"b": 1}), 2024).unwrap();
        assert_eq!(
            rules(&outcome),
            vec![("a", "any.required"), ("b", "object.unknown")]
        );
    }

    #[test]
    fn test_non_object_root() {
        let schema = Schema::new(vec![FieldRule::string("a")]).unwrap();
        match schema.evaluate_at(&json!([1, 2]), 2024).unwrap() {
            Outcome::Rejected(v) => {
                assert_eq!(v.len(), 1);
                assert_eq!(v[0].rule, "object.base");
                assert_eq!(v[0].field(), None);
                assert_eq!(v[0].message, "\"value\" must be of type object");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_misconfigured_rules_are_refused() {
        assert!(Schema::new(vec![FieldRule::string("a").min(Bound::Fixed(1))]).is_err());
        assert!(Schema::new(vec![FieldRule::integer("a").min_length(1)]).is_err());
        assert!(Schema::new(vec![FieldRule::string("a").min_length(5).max_length(2)]).is_err());
        assert!(Schema::new(vec![FieldRule::integer("a")
            .min(Bound::Fixed(10))
            .max(Bound::Fixed(1))])
        .is_err());
    }

    #[test]
    fn test_misconfigured_rule_surfaces_at_evaluation() {
        // Bypasses Schema::new on purpose.
        let schema = Schema {
            fields: vec![FieldRule::integer("a").alphanumeric()],
        };
        assert!(matches!(
            schema.evaluate_at(&json!({"a": 1}), 2024),
            Err(SchemaError::Misconfigured { .. })
        ));
    }
}
