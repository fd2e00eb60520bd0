//! Named, versioned field-extraction contracts ("form schemas").
//!
//! The registry owns the update rules: a schema is created once per template
//! name, after which only its description may change. Names are compared with
//! surrounding whitespace trimmed in every operation. Replacing the field
//! definitions means deleting the schema and creating it again.

use super::normalize::normalize;
use crate::error::{Error, Result};
use crate::store::{RawFieldDefinitions, SchemaStore, StoredSchema};
use chrono::{DateTime, Duration, Utc};
use common::model::schema::{FieldDefinition, FormSchema, SchemaListing};
use log::{info, warn};

pub struct SchemaRegistry<S> {
    store: S,
}

impl<S: SchemaStore> SchemaRegistry<S> {
    pub fn new(store: S) -> Self {
        SchemaRegistry { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetches and normalizes one schema.
    pub fn get_schema(&self, template_name: &str) -> Result<FormSchema> {
        let template_name = template_name.trim();
        let record = self
            .store
            .fetch(template_name)?
            .ok_or_else(|| not_found(template_name))?;
        normalize(record)
    }

    /// Every schema, ordered by name. A record that fails to normalize becomes
    /// a `SchemaListing::Malformed` entry; the rest are still returned.
    pub fn list_schemas(&self) -> Result<Vec<SchemaListing>> {
        let listing = self
            .store
            .fetch_all()?
            .into_iter()
            .map(|record| {
                let template_name = record.template_name.clone();
                match normalize(record) {
                    Ok(schema) => SchemaListing::Ok(schema),
                    Err(err) => {
                        warn!("Skipping malformed form schema {}: {}", template_name, err);
                        SchemaListing::Malformed {
                            template_name,
                            error: err.to_string(),
                        }
                    }
                }
            })
            .collect();
        Ok(listing)
    }

    /// Replaces the description of an existing schema and refreshes
    /// `updated_at`. Field definitions and name are left alone.
    pub fn update_description(
        &self,
        template_name: &str,
        new_description: &str,
    ) -> Result<FormSchema> {
        let template_name = template_name.trim();
        let current = self
            .store
            .fetch(template_name)?
            .ok_or_else(|| not_found(template_name))?;
        let updated_at = advance(current.updated_at);

        let record = self
            .store
            .set_description(template_name, new_description, updated_at)?
            // Deleted between the read and the write.
            .ok_or_else(|| not_found(template_name))?;
        info!("Updated description of form schema {}", template_name);
        normalize(record)
    }

    /// Registers a new schema. Fails with `Conflict` if the name is taken.
    pub fn create_schema(
        &self,
        template_name: &str,
        field_definitions: Vec<FieldDefinition>,
        description: &str,
    ) -> Result<FormSchema> {
        self.create_schema_for_file(template_name, field_definitions, description, None)
    }

    /// `create_schema`, also recording the extraction service's file id for
    /// the template.
    pub fn create_schema_for_file(
        &self,
        template_name: &str,
        field_definitions: Vec<FieldDefinition>,
        description: &str,
        template_file_id: Option<&str>,
    ) -> Result<FormSchema> {
        let template_name = template_name.trim();
        if template_name.is_empty() {
            return Err(Error::InvalidInput("template_name must not be empty".into()));
        }
        let value = serde_json::to_value(&field_definitions)
            .map_err(|e| Error::InvalidInput(e.to_string()))?;

        let now = Utc::now();
        let record = StoredSchema {
            template_name: template_name.to_string(),
            description: description.to_string(),
            field_definitions: RawFieldDefinitions::Structured(value),
            template_file_id: template_file_id.map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        self.store.insert(record)?;
        info!(
            "Created form schema {} ({} fields)",
            template_name,
            field_definitions.len()
        );

        Ok(FormSchema::from_parts(
            template_name.to_string(),
            description.to_string(),
            field_definitions,
            template_file_id.map(str::to_string),
            now,
            now,
        ))
    }

    /// Removes a schema. Returns `false` when there was nothing to remove.
    pub fn delete_schema(&self, template_name: &str) -> Result<bool> {
        let template_name = template_name.trim();
        let removed = self.store.remove(template_name)?;
        if removed {
            info!("Deleted form schema {}", template_name);
        } else {
            warn!("Form schema {} not found, nothing deleted", template_name);
        }
        Ok(removed)
    }
}

/// Current time, or one microsecond past `previous` if the clock has not
/// moved beyond it.
fn advance(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

fn not_found(template_name: &str) -> Error {
    Error::NotFound {
        template_name: template_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FieldStorage, SqliteStore};
    use common::model::schema::FieldType;
    use tempfile::TempDir;

    fn setup() -> (TempDir, SchemaRegistry<SqliteStore>) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(
            dir.path().join("schemas.sqlite"),
            std::time::Duration::from_secs(5),
            FieldStorage::Structured,
        )
        .unwrap();
        (dir, SchemaRegistry::new(store))
    }

    fn bol_fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("bol_number", FieldType::Text).with_description("BOL Number"),
            FieldDefinition::new("ship_date", FieldType::Date),
        ]
    }

    #[test]
    fn create_then_get() {
        let (_dir, registry) = setup();
        let created = registry
            .create_schema_for_file("BOL_Template.pdf", bol_fields(), "Bill of Lading", Some("f-1"))
            .unwrap();
        let fetched = registry.get_schema("BOL_Template.pdf").unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.template_file_id.as_deref(), Some("f-1"));
        assert_eq!(fetched.num_fields, 2);
    }

    #[test]
    fn get_missing_is_not_found() {
        let (_dir, registry) = setup();
        let err = registry.get_schema("nope.pdf").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn create_rejects_blank_names() {
        let (_dir, registry) = setup();
        let err = registry.create_schema("  ", bol_fields(), "").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn surrounding_whitespace_names_the_same_schema_everywhere() {
        let (_dir, registry) = setup();
        let created = registry
            .create_schema(" BOL_Template.pdf ", bol_fields(), "first")
            .unwrap();
        assert_eq!(created.template_name, "BOL_Template.pdf");

        assert_eq!(registry.get_schema(" BOL_Template.pdf ").unwrap(), created);
        assert_eq!(registry.get_schema("BOL_Template.pdf").unwrap(), created);
        let updated = registry
            .update_description("BOL_Template.pdf  ", "second")
            .unwrap();
        assert_eq!(updated.description, "second");

        let err = registry
            .create_schema("BOL_Template.pdf", bol_fields(), "again")
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));

        assert!(registry.delete_schema("\tBOL_Template.pdf ").unwrap());
        assert!(matches!(
            registry.get_schema("BOL_Template.pdf"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn create_over_existing_name_conflicts_and_keeps_original() {
        let (_dir, registry) = setup();
        registry
            .create_schema("BOL_Template.pdf", bol_fields(), "tuned")
            .unwrap();

        let err = registry
            .create_schema("BOL_Template.pdf", vec![], "regenerated")
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));

        let kept = registry.get_schema("BOL_Template.pdf").unwrap();
        assert_eq!(kept.description, "tuned");
        assert_eq!(kept.field_definitions, bol_fields());
    }

    #[test]
    fn update_description_keeps_fields_and_advances_timestamp() {
        let (_dir, registry) = setup();
        let created = registry
            .create_schema("BOL_Template.pdf", bol_fields(), "first")
            .unwrap();

        let updated = registry
            .update_description("BOL_Template.pdf", "second")
            .unwrap();
        assert_eq!(updated.description, "second");
        assert_eq!(updated.template_name, created.template_name);
        assert_eq!(updated.field_definitions, created.field_definitions);
        assert_eq!(updated.fingerprint, created.fingerprint);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
    }

    #[test]
    fn update_description_accepts_empty_text() {
        let (_dir, registry) = setup();
        registry
            .create_schema("BOL_Template.pdf", bol_fields(), "first")
            .unwrap();
        let updated = registry.update_description("BOL_Template.pdf", "").unwrap();
        assert_eq!(updated.description, "");
    }

    #[test]
    fn update_description_of_missing_schema_does_not_create_it() {
        let (_dir, registry) = setup();
        let err = registry
            .update_description("nope.pdf", "text")
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(matches!(
            registry.get_schema("nope.pdf"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn delete_is_idempotent() {
        let (_dir, registry) = setup();
        registry
            .create_schema("BOL_Template.pdf", bol_fields(), "")
            .unwrap();

        assert!(registry.delete_schema("BOL_Template.pdf").unwrap());
        assert!(!registry.delete_schema("BOL_Template.pdf").unwrap());
    }

    #[test]
    fn delete_then_create_regenerates() {
        let (_dir, registry) = setup();
        let original = registry
            .create_schema("BOL_Template.pdf", bol_fields(), "")
            .unwrap();
        registry.delete_schema("BOL_Template.pdf").unwrap();

        let regenerated = registry
            .create_schema(
                "BOL_Template.pdf",
                vec![FieldDefinition::new("carrier", FieldType::Text)],
                "",
            )
            .unwrap();
        assert_ne!(regenerated.fingerprint, original.fingerprint);
    }

    #[test]
    fn advance_is_strictly_increasing() {
        let future = Utc::now() + Duration::hours(1);
        assert!(advance(future) > future);
        let past = Utc::now() - Duration::hours(1);
        assert!(advance(past) > past);
    }
}
