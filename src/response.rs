//! External JSON document rendering
//!
//! Engine outcomes cross to hosts as JSON: list results as top-level arrays,
//! scalars as bare values, and every failure as an
//! `{"is_error":true,"error":"..."}` envelope with no other keys. Floats are
//! emitted at full roundtrip precision; rounding belongs to presentation
//! layers, not here.
use crate::error::Result;
use serde::Serialize;
use serde_json::{json, Value};

/// A rendered query result ready to hand off.
///
/// Move-only on purpose: `into_json` consumes the document, so each result
/// leaves the engine exactly once.
#[derive(Debug, PartialEq)]
pub struct Document {
    value: Value,
    is_error: bool,
}

impl Document {
    pub fn is_error(&self) -> bool {
        self.is_error
    }

    /// The document as a JSON value, for callers embedding it elsewhere.
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    /// Serialize and consume the document.
    pub fn into_json(self) -> String {
        self.value.to_string()
    }
}

/// Render an engine outcome into its external document.
pub fn render<T: Serialize>(result: Result<T>) -> Document {
    match result {
        Ok(payload) => match serde_json::to_value(payload) {
            Ok(value) => Document {
                value,
                is_error: false,
            },
            Err(err) => error_document(err.to_string()),
        },
        Err(err) => error_document(err.to_string()),
    }
}

fn error_document(message: String) -> Document {
    Document {
        value: json!({ "is_error": true, "error": message }),
        is_error: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{NgramVector, ScoredLabel};
    use crate::error::QueryError;

    #[test]
    fn test_ranked_results_render_as_object_array() {
        let results = vec![
            ScoredLabel {
                score: 0.75,
                label: "queen".to_string(),
            },
            ScoredLabel {
                score: 0.5,
                label: "princess".to_string(),
            },
        ];

        let doc = render(Ok(results));
        assert!(!doc.is_error());
        assert_eq!(
            doc.as_value(),
            &json!([
                { "score": 0.75, "label": "queen" },
                { "score": 0.5, "label": "princess" }
            ])
        );
    }

    #[test]
    fn test_ngram_results_keep_key_names_and_order() {
        let results = vec![NgramVector {
            word: "ca".to_string(),
            vector: vec![0.5, -1.25],
        }];

        let doc = render(Ok(results));
        let value = doc.as_value();
        assert_eq!(value[0]["word"], "ca");
        assert_eq!(value[0]["vector"], json!([0.5, -1.25]));
    }

    #[test]
    fn test_vector_renders_as_float_array() {
        let doc = render(Ok(vec![0.1f32, -2.5, 0.0]));
        assert_eq!(doc.into_json(), "[0.10000000149011612,-2.5,0.0]");
    }

    #[test]
    fn test_scalars_render_bare() {
        assert_eq!(render(Ok(42usize)).into_json(), "42");
        assert_eq!(render(Ok("queen".to_string())).into_json(), "\"queen\"");
    }

    #[test]
    fn test_error_envelope_has_exactly_two_keys() {
        let doc = render::<Vec<ScoredLabel>>(Err(QueryError::ModelNotLoaded));
        assert!(doc.is_error());

        let value = doc.as_value();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["is_error"], json!(true));
        assert_eq!(
            object["error"],
            json!("model not loaded - call load_model() first")
        );
    }

    #[test]
    fn test_success_payload_never_carries_error_flag() {
        let doc = render(Ok(Vec::<ScoredLabel>::new()));
        assert!(!doc.is_error());
        assert_eq!(doc.into_json(), "[]");
    }
}
