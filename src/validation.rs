//! Client-side field validation
//!
//! Rules run before any create or update request; a payload with a single
//! violation never reaches the network.

use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::LazyLock;

use crate::schema::{FieldKind, FieldSpec};

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{4}$").expect("valid phone regex"));
static DUI_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{8}-\d$").expect("valid DUI regex"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid e-mail regex"));
static RECOVERY_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{5}$").expect("valid code regex"));

/// Fixed formats checked with a regular expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// `####-####`
    Phone,
    /// `########-#`
    Dui,
    Email,
    /// Five digit password recovery code
    RecoveryCode,
}

impl Pattern {
    fn regex(&self) -> &'static Regex {
        match self {
            Pattern::Phone => &PHONE_RE,
            Pattern::Dui => &DUI_RE,
            Pattern::Email => &EMAIL_RE,
            Pattern::RecoveryCode => &RECOVERY_CODE_RE,
        }
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex().is_match(value)
    }

    fn message(&self) -> &'static str {
        match self {
            Pattern::Phone => "must match ####-####",
            Pattern::Dui => "must match ########-#",
            Pattern::Email => "must be a valid e-mail address",
            Pattern::RecoveryCode => "must be exactly 5 digits",
        }
    }
}

/// A single constraint on a form field
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Required,
    MinLength(usize),
    Matches(Pattern),
    NonNegativeNumber,
    OneOf(&'static [&'static str]),
}

impl Rule {
    /// Returns the violation message for a non-empty value, if any
    fn check(&self, value: &str) -> Option<String> {
        match self {
            Rule::Required => None,
            Rule::MinLength(min) => {
                (value.chars().count() < *min).then(|| format!("must be at least {} characters", min))
            }
            Rule::Matches(pattern) => (!pattern.is_match(value)).then(|| pattern.message().to_string()),
            Rule::NonNegativeNumber => match value.parse::<f64>() {
                Ok(n) if n.is_finite() && n >= 0.0 => None,
                _ => Some("must be a non-negative number".to_string()),
            },
            Rule::OneOf(options) => {
                (!options.contains(&value)).then(|| format!("must be one of: {}", options.join(", ")))
            }
        }
    }
}

/// Which fields a payload is expected to carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Every declared field is checked; missing required fields fail
    Create,
    /// Only the fields present in the payload are checked
    Update,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "Invalid input: {}", parts.join("; "))
    }
}

/// Textual form of a JSON value as entered by a user, `None` when blank
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => (!items.is_empty()).then(|| value.to_string()),
        Value::Object(obj) => obj
            .get("_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| (!obj.is_empty()).then(|| value.to_string())),
    }
}

/// Check a single field value against its rules
pub fn validate_field(spec: &FieldSpec, value: Option<&Value>) -> Option<FieldError> {
    if spec.kind == FieldKind::JsonArray && value.is_some_and(|v| !v.is_array() && !v.is_null()) {
        return Some(FieldError::new(spec.key, "must be a JSON list"));
    }
    let text = value.and_then(value_text);
    match text {
        None => spec
            .is_required()
            .then(|| FieldError::new(spec.key, "is required")),
        Some(text) => spec
            .rules
            .iter()
            .find_map(|rule| rule.check(&text))
            .map(|message| FieldError::new(spec.key, &message)),
    }
}

/// Validate a request payload against a resource's field specs
pub fn validate_payload(
    fields: &[FieldSpec],
    payload: &Map<String, Value>,
    mode: ValidationMode,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    for spec in fields {
        let value = payload.get(spec.key);
        if mode == ValidationMode::Update && value.is_none() {
            continue;
        }
        if mode == ValidationMode::Update && spec.secret && value.and_then(value_text).is_none() {
            continue;
        }
        if let Some(error) = validate_field(spec, value) {
            errors.push(error);
        }
    }

    errors.into_result()
}
