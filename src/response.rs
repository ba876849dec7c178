//! Decoding of Encoding.com replies.
//!
//! A successful transport status says nothing about the action itself: the
//! service reports failures inside the body, as
//!
//! ```json
//! { "response": { "errors": { "error": "Wrong user id or key!" } } }
//! ```
//!
//! where each value under `errors` is a string or a list of strings. This is
//! the only place that knows that shape.

use serde_json::Value;

use crate::errors::{EncodingError, Result};

/// A decoded reply body.
#[derive(Debug, Clone, PartialEq)]
pub enum VendorReply {
    /// No embedded errors. Holds the full body.
    Success(Value),
    /// One or more application-level errors, in the order they were sent.
    Errors(Vec<String>),
}

impl VendorReply {
    /// Parse a raw body.
    pub fn parse(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body).map_err(|source| EncodingError::Decode {
            source,
            body: body.to_string(),
        })?;
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        match embedded_errors(&value) {
            Some(errors) => VendorReply::Errors(errors),
            None => VendorReply::Success(value),
        }
    }

    /// Turn embedded errors into [`EncodingError::Service`].
    pub fn into_result(self) -> Result<Value> {
        match self {
            VendorReply::Success(value) => Ok(value),
            VendorReply::Errors(errors) => Err(EncodingError::Service { errors }),
        }
    }
}

fn embedded_errors(body: &Value) -> Option<Vec<String>> {
    let sections = body.as_object()?;

    // Only the first section carrying `errors` counts.
    let errors = sections
        .values()
        .find_map(|section| section.as_object()?.get("errors"))?;

    let mut out = Vec::new();
    collect_messages(errors, &mut out);
    if out.is_empty() {
        return None;
    }
    Some(out)
}

fn collect_messages(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|v| collect_messages(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_messages(v, out)),
        Value::Null => {}
        other => out.push(other.to_string()),
    }
}

/// The `response` object of a reply, or an empty object if there is none.
pub fn inner_response(body: &Value) -> Value {
    match body.get("response") {
        Some(resp @ Value::Object(_)) => resp.clone(),
        _ => Value::Object(Default::default()),
    }
}

/// `MediaID` of an AddMedia-style reply, or `""`.
pub fn media_id(body: &Value) -> String {
    inner_response(body)
        .get("MediaID")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// `format` section of a reply, or an empty object.
pub fn format(body: &Value) -> Value {
    match inner_response(body).get("format") {
        Some(f) if !f.is_null() => f.clone(),
        _ => Value::Object(Default::default()),
    }
}
