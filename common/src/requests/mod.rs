use crate::model::schema::FieldDefinition;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Payload for `POST /api/schemas`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSchemaRequest {
    pub template_name: String,
    pub field_definitions: Vec<FieldDefinition>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub template_file_id: Option<String>,
}

/// Payload for `PUT /api/schemas/{template_name}/description`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDescriptionRequest {
    pub description: String,
}

/// Payload for `POST /api/identifiers/next`.
///
/// `customer_id` only matters when identifiers are scoped per customer;
/// `date` defaults to today's local date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NextIdentifierRequest {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteSchemaResponse {
    pub deleted: bool,
}
