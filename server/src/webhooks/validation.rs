//! Payload Validation
//!
//! The pipeline hands the payload and the webhook's schema to a
//! [`PayloadValidator`] and treats any returned violation as terminal.

use serde_json::Value;

/// Checks a payload against a webhook's schema.
pub trait PayloadValidator: Send + Sync {
    /// Return every violation found. Empty means valid.
    fn validate(&self, payload: &Value, schema: &Value) -> Vec<String>;
}

/// JSON Schema validator backed by the `jsonschema` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSchemaValidator;

impl PayloadValidator for JsonSchemaValidator {
    fn validate(&self, payload: &Value, schema: &Value) -> Vec<String> {
        let validator = match jsonschema::validator_for(schema) {
            Ok(v) => v,
            // A payload cannot be judged against a schema that does not compile.
            Err(e) => return vec![format!("invalid webhook schema: {e}")],
        };

        validator
            .iter_errors(payload)
            .map(|err| {
                let path = err.instance_path.to_string();
                if path.is_empty() {
                    err.to_string()
                } else {
                    format!("{path}: {err}")
                }
            })
            .collect()
    }
}
