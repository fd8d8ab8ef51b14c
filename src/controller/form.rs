//! Detail form state for creating or editing one item

use serde_json::{Map, Number, Value};

use crate::api::ResourceApi;
use crate::controller::list::ResourceListController;
use crate::errors::ApiError;
use crate::models::{Resource, ResourceItem};
use crate::schema::{FieldKind, FieldSpec, ResourceSchema};
use crate::validation::{validate_field, FieldError, ValidationErrors};

/// Placeholder shown instead of a stored password
pub const MASKED_PASSWORD: &str = "**********";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(String),
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub spec: FieldSpec,
    pub value: String,
    pub validation_error: Option<String>,
}

impl FormField {
    pub fn new(spec: FieldSpec) -> Self {
        Self {
            spec,
            value: String::new(),
            validation_error: None,
        }
    }

    pub fn with_value(mut self, value: String) -> Self {
        self.value = value;
        self
    }

    pub fn set(&mut self, value: &str) {
        self.value = value.to_string();
        self.validation_error = None;
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }

    /// A secret that was left blank or still shows the mask is not sent
    fn is_untouched_secret(&self) -> bool {
        self.spec.secret && (self.is_empty() || self.value == MASKED_PASSWORD)
    }

    fn validate(&mut self, mode: &FormMode) -> bool {
        if matches!(mode, FormMode::Edit(_)) && self.is_untouched_secret() {
            self.validation_error = None;
            return true;
        }
        let encoded = self.encoded();
        self.validation_error = validate_field(&self.spec, encoded.as_ref()).map(|e| e.message);
        self.validation_error.is_none()
    }

    /// JSON value sent for this field; `None` when left blank
    pub fn encoded(&self) -> Option<Value> {
        let text = self.value.trim();
        match &self.spec.kind {
            FieldKind::Boolean => Some(Value::String(parse_flag(text).to_string())),
            FieldKind::JsonArray if text.is_empty() => Some(Value::Array(Vec::new())),
            FieldKind::JsonArray => Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))),
            _ if text.is_empty() => None,
            FieldKind::Number => Some(parse_number(text).unwrap_or_else(|| Value::String(text.to_string()))),
            FieldKind::Text | FieldKind::Choice(_) | FieldKind::Reference(_) => Some(Value::String(text.to_string())),
        }
    }
}

fn parse_flag(text: &str) -> bool {
    matches!(text.to_lowercase().as_str(), "true" | "yes" | "y" | "1" | "si" | "sí")
}

fn parse_number(text: &str) -> Option<Value> {
    if let Ok(int) = text.parse::<i64>() {
        return Some(Value::Number(int.into()));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
}

/// Text a stored value is edited as
fn initial_text(spec: &FieldSpec, value: Option<&Value>) -> String {
    if spec.secret {
        return if value.is_some() { MASKED_PASSWORD.to_string() } else { String::new() };
    }
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        // populated references carry the whole document
        Some(Value::Object(obj)) => obj
            .get("_id")
            .or_else(|| obj.get("id"))
            .map(|id| id.as_str().map(str::to_string).unwrap_or_else(|| id.to_string()))
            .unwrap_or_default(),
        Some(other) => other.to_string(),
    }
}

/// Create/edit form bound to one resource schema
#[derive(Debug, Clone)]
pub struct ResourceForm {
    resource: Resource,
    mode: FormMode,
    fields: Vec<FormField>,
}

impl ResourceForm {
    pub fn for_create(schema: &ResourceSchema) -> Self {
        Self {
            resource: schema.resource,
            mode: FormMode::Create,
            fields: schema.fields.iter().cloned().map(FormField::new).collect(),
        }
    }

    /// Pre-fill from an existing item; the item must carry an id
    pub fn for_edit(schema: &ResourceSchema, item: &ResourceItem) -> Result<Self, ApiError> {
        let id = item.id().ok_or_else(|| {
            ApiError::InvalidState(format!("Cannot edit a {} without an id", schema.resource.singular()))
        })?;
        let fields = schema
            .fields
            .iter()
            .map(|spec| {
                let text = initial_text(spec, item.get(spec.key));
                FormField::new(spec.clone()).with_value(text)
            })
            .collect();
        Ok(Self {
            resource: schema.resource,
            mode: FormMode::Edit(id),
            fields,
        })
    }

    /// Edit form when an item is given, create form otherwise
    pub fn new(schema: &ResourceSchema, item: Option<&ResourceItem>) -> Result<Self, ApiError> {
        match item {
            Some(item) => Self::for_edit(schema, item),
            None => Ok(Self::for_create(schema)),
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, FormMode::Edit(_))
    }

    pub fn title(&self) -> String {
        match self.mode {
            FormMode::Create => format!("New {}", self.resource.singular()),
            FormMode::Edit(_) => format!("Edit {}", self.resource.singular()),
        }
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.iter().find(|f| f.spec.key == key).map(|f| f.value.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ApiError> {
        match self.fields.iter_mut().find(|f| f.spec.key == key) {
            Some(field) => {
                field.set(value);
                Ok(())
            }
            None => Err(ApiError::Validation(ValidationErrors::from(vec![FieldError::new(
                key,
                "is not a field of this form",
            )]))),
        }
    }

    /// Run every field's rules, recording per-field messages
    pub fn validate_all(&mut self) -> bool {
        let mode = self.mode.clone();
        let mut valid = true;
        for field in &mut self.fields {
            valid &= field.validate(&mode);
        }
        valid
    }

    pub fn errors(&self) -> ValidationErrors {
        self.fields
            .iter()
            .filter_map(|f| f.validation_error.as_deref().map(|m| FieldError::new(f.spec.key, m)))
            .collect::<Vec<_>>()
            .into()
    }

    /// Request body built from the current field values
    pub fn payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        for field in &self.fields {
            if self.is_edit() && field.is_untouched_secret() {
                continue;
            }
            if let Some(value) = field.encoded() {
                payload.insert(field.spec.key.to_string(), value);
            }
        }
        payload
    }

    /// Validate and build the payload, or return every field error
    pub fn validated_payload(&mut self) -> Result<Map<String, Value>, ApiError> {
        if self.validate_all() {
            Ok(self.payload())
        } else {
            Err(ApiError::Validation(self.errors()))
        }
    }

    /// Save through the list controller so its collection stays in sync
    pub async fn submit<A: ResourceApi>(
        &mut self,
        controller: &mut ResourceListController<A>,
    ) -> Result<Option<ResourceItem>, ApiError> {
        let payload = self.validated_payload()?;
        match self.mode.clone() {
            FormMode::Create => controller.create(payload).await,
            FormMode::Edit(id) => controller.update(&id, payload).await,
        }
    }
}
