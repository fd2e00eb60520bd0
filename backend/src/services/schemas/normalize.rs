//! Turns a stored schema row into a [`FormSchema`].
//!
//! `field_definitions` reaches us either as a structured JSON value or as text
//! holding its serialized form. This is the only place that tells the two
//! apart. Text is decoded exactly once; a value that is still a string after
//! that decode is rejected rather than decoded again.

use crate::error::{Error, Result};
use crate::store::{RawFieldDefinitions, StoredSchema};
use common::model::schema::{FieldDefinition, FormSchema};
use serde_json::Value;

pub fn normalize(record: StoredSchema) -> Result<FormSchema> {
    let field_definitions = decode_fields(&record.template_name, record.field_definitions)?;
    Ok(FormSchema::from_parts(
        record.template_name,
        record.description,
        field_definitions,
        record.template_file_id,
        record.created_at,
        record.updated_at,
    ))
}

fn decode_fields(template_name: &str, raw: RawFieldDefinitions) -> Result<Vec<FieldDefinition>> {
    let malformed = |reason: String| Error::MalformedSchema {
        template_name: template_name.to_string(),
        reason,
    };

    let value = match raw {
        RawFieldDefinitions::Text(text)
        | RawFieldDefinitions::Structured(Value::String(text)) => {
            serde_json::from_str::<Value>(&text).map_err(|e| malformed(e.to_string()))?
        }
        RawFieldDefinitions::Structured(value) => value,
    };

    if !value.is_array() {
        return Err(malformed(format!(
            "expected a list of field definitions, found {}",
            kind_of(&value)
        )));
    }
    serde_json::from_value(value).map_err(|e| malformed(e.to_string()))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::model::schema::FieldType;
    use serde_json::json;

    fn stored(raw: RawFieldDefinitions) -> StoredSchema {
        let now = Utc::now();
        StoredSchema {
            template_name: "BOL_Template.pdf".to_string(),
            description: "Bill of Lading".to_string(),
            field_definitions: raw,
            template_file_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn fields_json() -> Value {
        json!([
            {"name": "bol_number", "type": "text", "description": "BOL Number"},
            {"name": "total_weight", "type": "number"},
        ])
    }

    #[test]
    fn structured_value_is_used_as_is() {
        let schema = normalize(stored(RawFieldDefinitions::Structured(fields_json()))).unwrap();
        assert_eq!(schema.num_fields, 2);
        assert_eq!(schema.field_definitions[1].field_type, FieldType::Number);
    }

    #[test]
    fn text_and_structured_forms_agree() {
        let text = fields_json().to_string();
        let from_text = normalize(stored(RawFieldDefinitions::Text(text.clone()))).unwrap();
        let from_string_value =
            normalize(stored(RawFieldDefinitions::Structured(Value::String(text)))).unwrap();
        let from_structured =
            normalize(stored(RawFieldDefinitions::Structured(fields_json()))).unwrap();

        assert_eq!(from_text, from_structured);
        assert_eq!(from_string_value, from_structured);
    }

    #[test]
    fn normalizing_twice_gives_the_same_schema() {
        let record = stored(RawFieldDefinitions::Text(fields_json().to_string()));
        assert_eq!(normalize(record.clone()).unwrap(), normalize(record).unwrap());
    }

    #[test]
    fn doubly_encoded_text_is_not_decoded_twice() {
        let twice = Value::String(fields_json().to_string()).to_string();
        let err = normalize(stored(RawFieldDefinitions::Text(twice))).unwrap_err();
        assert!(matches!(err, Error::MalformedSchema { .. }));
    }

    #[test]
    fn unparseable_text_is_malformed() {
        let err = normalize(stored(RawFieldDefinitions::Text("[{\"name\":".into()))).unwrap_err();
        match err {
            Error::MalformedSchema { template_name, .. } => {
                assert_eq!(template_name, "BOL_Template.pdf")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_list_values_are_malformed() {
        let err = normalize(stored(RawFieldDefinitions::Structured(json!({"name": "x"}))))
            .unwrap_err();
        assert!(err.to_string().contains("an object"));
    }

    #[test]
    fn entries_missing_required_keys_are_malformed() {
        let err = normalize(stored(RawFieldDefinitions::Structured(json!([{"name": "x"}]))))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedSchema { .. }));
    }

    #[test]
    fn extractor_output_without_names_is_accepted() {
        let text = json!([
            {
                "bbox": {"page": 1, "left": 0.07, "top": 0.22},
                "description": "SHIP TO: Company Name",
                "type": "text",
            },
            {"description": "HAZMAT", "type": "checkbox", "value": false},
        ])
        .to_string();

        let schema = normalize(stored(RawFieldDefinitions::Text(text))).unwrap();
        assert_eq!(schema.num_fields, 2);
        assert_eq!(schema.field_definitions[0].name, None);
        assert_eq!(
            schema.field_definitions[0].description.as_deref(),
            Some("SHIP TO: Company Name")
        );
        assert_eq!(schema.field_definitions[1].field_type, FieldType::Checkbox);
        assert_eq!(schema.field_definitions[1].extra["value"], json!(false));
    }
}
