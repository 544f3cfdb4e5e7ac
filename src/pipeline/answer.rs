//! The Answer Extractor: completion body → field mapping.
//!
//! The response is first classified into a [`CompletionBody`], a closed sum
//! type covering every shape we care about. Only the `Text` case goes on to
//! a second JSON parse; the three "shape absent" cases become an empty
//! [`Answer`] rather than an error.
//!
//! Two failures are never absorbed: an outer body that is not JSON at all
//! ([`Pdf2FieldsError::MalformedResponse`]) and a `text` field whose content
//! is not a JSON object ([`Pdf2FieldsError::MalformedAnswer`]).

use crate::error::Pdf2FieldsError;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// What a completion response body contains, as far as extraction cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionBody {
    /// No `choices` key, or its value is not an array.
    NoChoices,
    /// `choices` is an empty array.
    EmptyChoices,
    /// The first choice has no usable `text` field.
    NoText,
    /// The first choice's generated text.
    Text(String),
}

impl CompletionBody {
    /// Classify a raw response body.
    ///
    /// Fails only when `body` is not valid JSON.
    pub fn from_response(body: &str) -> Result<Self, Pdf2FieldsError> {
        let value: Value = serde_json::from_str(body).map_err(Pdf2FieldsError::MalformedResponse)?;
        Self::from_value(&value)
    }

    fn from_value(value: &Value) -> Result<Self, Pdf2FieldsError> {
        let Some(choices) = value.get("choices").and_then(Value::as_array) else {
            return Ok(Self::NoChoices);
        };
        let Some(first) = choices.first() else {
            return Ok(Self::EmptyChoices);
        };

        match first.get("text") {
            None | Some(Value::Null) => Ok(Self::NoText),
            Some(Value::String(s)) => Ok(Self::Text(s.clone())),
            // A present but non-string `text` cannot hold an encoded object.
            Some(other) => Err(Pdf2FieldsError::MalformedAnswer(
                <serde_json::Error as serde::de::Error>::custom(format!(
                    "expected `text` to be a string, found {}",
                    json_kind(other)
                )),
            )),
        }
    }
}

/// Extracted fields: field name → value, sorted by name.
///
/// String values are kept verbatim; any other JSON value is kept in its JSON
/// rendering (`50`, `true`, `["a","b"]`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Answer {
    fields: BTreeMap<String, String>,
}

impl Answer {
    /// Build an answer from a raw completion response body.
    pub fn from_completion(body: &str) -> Result<Self, Pdf2FieldsError> {
        match CompletionBody::from_response(body)? {
            CompletionBody::Text(text) => Self::from_answer_text(&text),
            CompletionBody::NoChoices | CompletionBody::EmptyChoices | CompletionBody::NoText => {
                Ok(Self::default())
            }
        }
    }

    /// Parse the model's generated text as a JSON object.
    pub fn from_answer_text(text: &str) -> Result<Self, Pdf2FieldsError> {
        let object: serde_json::Map<String, Value> =
            serde_json::from_str(text).map_err(Pdf2FieldsError::MalformedAnswer)?;

        let fields = object
            .into_iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, v)
            })
            .collect();

        Ok(Self { fields })
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.fields
    }
}

impl From<BTreeMap<String, String>> for Answer {
    fn from(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }
}

impl fmt::Display for Answer {
    /// One `name: value` line per field, or `{}` when empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fields.is_empty() {
            return f.write_str("{}");
        }
        let width = self.fields.keys().map(|k| k.chars().count()).max().unwrap_or(0);
        for (i, (k, v)) in self.fields.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{:<width$}  {}", format!("{k}:"), v, width = width + 1)?;
        }
        Ok(())
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields() -> BTreeMap<String, String> {
        [
            ("PO Number", "123"),
            ("Total Amount", "$50"),
            ("Delivery Address", "1 Main St"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn well_formed_response_yields_inner_mapping() {
        let inner = serde_json::to_string(&sample_fields()).unwrap();
        let body = serde_json::json!({
            "id": "cmpl-1",
            "object": "text_completion",
            "choices": [{ "text": inner, "index": 0, "finish_reason": "stop" }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 20 }
        })
        .to_string();

        let answer = Answer::from_completion(&body).unwrap();
        assert_eq!(answer.into_map(), sample_fields());
    }

    #[test]
    fn leading_whitespace_in_text_is_fine() {
        let body = r#"{"choices":[{"text":"\n\n{\"PO Number\": \"PO-7\"}"}]}"#;
        let answer = Answer::from_completion(body).unwrap();
        assert_eq!(answer.get("PO Number"), Some("PO-7"));
    }

    #[test]
    fn missing_choices_is_empty() {
        let answer = Answer::from_completion(r#"{"other": 1}"#).unwrap();
        assert!(answer.is_empty());
        assert_eq!(
            CompletionBody::from_response(r#"{"other": 1}"#).unwrap(),
            CompletionBody::NoChoices
        );
    }

    #[test]
    fn non_array_choices_is_empty() {
        let answer = Answer::from_completion(r#"{"choices": "nope"}"#).unwrap();
        assert!(answer.is_empty());
    }

    #[test]
    fn api_error_body_is_empty() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert!(Answer::from_completion(body).unwrap().is_empty());
    }

    #[test]
    fn empty_choices_is_empty() {
        assert_eq!(
            CompletionBody::from_response(r#"{"choices": []}"#).unwrap(),
            CompletionBody::EmptyChoices
        );
        assert!(Answer::from_completion(r#"{"choices": []}"#).unwrap().is_empty());
    }

    #[test]
    fn missing_text_is_empty() {
        assert_eq!(
            CompletionBody::from_response(r#"{"choices":[{"foo": 1}]}"#).unwrap(),
            CompletionBody::NoText
        );
        assert!(Answer::from_completion(r#"{"choices":[{"foo": 1}]}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn null_text_and_non_object_choice_are_empty() {
        assert!(Answer::from_completion(r#"{"choices":[{"text": null}]}"#)
            .unwrap()
            .is_empty());
        assert!(Answer::from_completion(r#"{"choices":["just a string"]}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn only_first_choice_is_consulted() {
        let body = r#"{"choices":[{"foo":1},{"text":"{\"a\":\"b\"}"}]}"#;
        assert!(Answer::from_completion(body).unwrap().is_empty());
    }

    #[test]
    fn malformed_inner_json_is_an_error() {
        let err = Answer::from_completion(r#"{"choices":[{"text": "not json"}]}"#).unwrap_err();
        assert!(matches!(err, Pdf2FieldsError::MalformedAnswer(_)));
    }

    #[test]
    fn inner_array_is_an_error() {
        let err = Answer::from_completion(r#"{"choices":[{"text": "[1,2]"}]}"#).unwrap_err();
        assert!(matches!(err, Pdf2FieldsError::MalformedAnswer(_)));
    }

    #[test]
    fn non_string_text_is_an_error() {
        let err = Answer::from_completion(r#"{"choices":[{"text": 42}]}"#).unwrap_err();
        assert!(err.to_string().contains("a number"), "got: {err}");
    }

    #[test]
    fn malformed_outer_json_is_an_error() {
        let err = Answer::from_completion("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, Pdf2FieldsError::MalformedResponse(_)));
    }

    #[test]
    fn non_string_values_keep_json_rendering() {
        let answer =
            Answer::from_answer_text(r#"{"Total Amount": 50.5, "Paid": false, "Lines": [1,2]}"#)
                .unwrap();
        assert_eq!(answer.get("Total Amount"), Some("50.5"));
        assert_eq!(answer.get("Paid"), Some("false"));
        assert_eq!(answer.get("Lines"), Some("[1,2]"));
    }

    #[test]
    fn display_aligns_names() {
        let answer = Answer::from(sample_fields());
        let shown = answer.to_string();
        assert_eq!(
            shown,
            "Delivery Address:  1 Main St\n\
PO Number:         123\n\
Total Amount:      $50"
        );
        assert_eq!(Answer::default().to_string(), "{}");
    }

    #[test]
    fn serializes_as_plain_object() {
        let answer = Answer::from(sample_fields());
        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["PO Number"], "123");
        assert_eq!(json.as_object().unwrap().len(), 3);
    }
}
