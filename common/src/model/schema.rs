use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of value the extraction service should produce for a field.
///
/// Known kinds are matched exactly; anything else is kept verbatim in `Other`
/// so a schema produced by a newer extractor still round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Checkbox,
    Signature,
    Other(String),
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "text" => FieldType::Text,
            "number" => FieldType::Number,
            "date" => FieldType::Date,
            "checkbox" => FieldType::Checkbox,
            "signature" => FieldType::Signature,
            _ => FieldType::Other(value),
        }
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        match value {
            FieldType::Text => "text".to_string(),
            FieldType::Number => "number".to_string(),
            FieldType::Date => "date".to_string(),
            FieldType::Checkbox => "checkbox".to_string(),
            FieldType::Signature => "signature".to_string(),
            FieldType::Other(other) => other,
        }
    }
}

/// One entry of a form schema: a field the extractor must fill on the template.
///
/// The `description` doubles as the source hint (e.g. `"SHIP TO: Company Name"`)
/// that tells the extractor where on the purchase order the value comes from.
/// Entries straight from the extraction service carry no `name`; those fields
/// are identified by their description. Attributes this model does not name
/// (layout boxes, sample values) are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldDefinition {
            name: Some(name.into()),
            field_type,
            description: None,
            extra: Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// MD5 hex digest of the canonical JSON encoding of `fields`.
///
/// Two schemas with equal fingerprints extract exactly the same fields, which
/// is how a regenerated schema is told apart from the one it replaced.
pub fn fingerprint(fields: &[FieldDefinition]) -> String {
    // `Map` is ordered by key, so the encoding is canonical.
    let bytes = serde_json::to_vec(fields).unwrap_or_default();
    let mut hasher = md5::Context::new();
    hasher.consume(&bytes);
    format!("{:x}", hasher.finalize())
}

/// A named field-extraction contract for one document template
/// (e.g. `BOL_Template.pdf`).
///
/// Only `description` changes after creation; `template_name` and
/// `field_definitions` are replaced only by deleting and regenerating the
/// schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    pub template_name: String,
    pub description: String,
    pub field_definitions: Vec<FieldDefinition>,
    /// Always `field_definitions.len()`.
    pub num_fields: usize,
    /// File id the extraction service assigned to the template upload.
    pub template_file_id: Option<String>,
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FormSchema {
    /// Assembles a schema, deriving `num_fields` and `fingerprint` from the
    /// field list.
    pub fn from_parts(
        template_name: String,
        description: String,
        field_definitions: Vec<FieldDefinition>,
        template_file_id: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        FormSchema {
            num_fields: field_definitions.len(),
            fingerprint: fingerprint(&field_definitions),
            template_name,
            description,
            field_definitions,
            template_file_id,
            created_at,
            updated_at,
        }
    }
}

/// One item of a schema listing.
///
/// A record whose stored field definitions cannot be decoded shows up as
/// `Malformed` instead of failing the whole listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SchemaListing {
    Ok(FormSchema),
    Malformed { template_name: String, error: String },
}

impl SchemaListing {
    pub fn template_name(&self) -> &str {
        match self {
            SchemaListing::Ok(schema) => &schema.template_name,
            SchemaListing::Malformed { template_name, .. } => template_name,
        }
    }

    pub fn schema(&self) -> Option<&FormSchema> {
        match self {
            SchemaListing::Ok(schema) => Some(schema),
            SchemaListing::Malformed { .. } => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, SchemaListing::Malformed { .. })
    }
}
