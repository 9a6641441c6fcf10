//! Policy context: the caller's description of one outbound request.
//!
//! The context is kept as the raw JSON object the caller supplied so that a
//! delegated evaluator sees it unmodified. Well-known keys (`tenant_id`,
//! `forward_url`, `host`, `method`, `headers`, `payload_cid`, `attrs`) are
//! exposed through typed accessors; a key holding a non-string value reads
//! as absent.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{HelError, Result};

/// Immutable input to one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PolicyContext {
    fields: Map<String, Value>,
}

impl PolicyContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate that `value` is a JSON object and wrap it.
    ///
    /// This is the single contract channel of the engine: anything other
    /// than an object (null, arrays, numbers, strings, booleans) is rejected
    /// with [`HelError::InvalidPolicyContext`].
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(HelError::InvalidPolicyContext(format!(
                "policy context must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.str_field("tenant_id")
    }
    pub fn forward_url(&self) -> Option<&str> {
        self.str_field("forward_url")
    }
    pub fn host(&self) -> Option<&str> {
        self.str_field("host")
    }
    pub fn method(&self) -> Option<&str> {
        self.str_field("method")
    }
    pub fn payload_cid(&self) -> Option<&str> {
        self.str_field("payload_cid")
    }

    /// Request header value by exact name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.fields
            .get("headers")
            .and_then(Value::as_object)
            .and_then(|h| h.get(name))
            .and_then(Value::as_str)
    }

    /// Opaque caller attributes, passed through to delegated evaluation.
    pub fn attrs(&self) -> Option<&Value> {
        self.fields.get("attrs")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Canonical UTF-8 JSON: compact, object keys sorted at every depth.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.fields)?)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_tenant_id(self, tenant_id: impl Into<String>) -> Self {
        self.with("tenant_id", Value::String(tenant_id.into()))
    }

    pub fn with_forward_url(self, url: impl Into<String>) -> Self {
        self.with("forward_url", Value::String(url.into()))
    }

    pub fn with_host(self, host: impl Into<String>) -> Self {
        self.with("host", Value::String(host.into()))
    }

    pub fn with_method(self, method: impl Into<String>) -> Self {
        self.with("method", Value::String(method.into()))
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let headers = self
            .fields
            .entry("headers")
            .or_insert_with(|| Value::Object(Map::new()));
        // A caller-supplied non-object `headers` is replaced.
        if !headers.is_object() {
            *headers = Value::Object(Map::new());
        }
        if let Value::Object(h) = headers {
            h.insert(name.into(), Value::String(value.into()));
        }
        self
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

impl TryFrom<Value> for PolicyContext {
    type Error = HelError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

impl From<Map<String, Value>> for PolicyContext {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_every_non_object_shape() {
        for bad in [json!(null), json!([]), json!(123), json!("host"), json!(true)] {
            let err = PolicyContext::from_value(bad).unwrap_err();
            assert!(matches!(err, HelError::InvalidPolicyContext(_)));
        }
    }

    #[test]
    fn empty_object_is_a_valid_context() {
        let ctx = PolicyContext::from_value(json!({})).unwrap();
        assert!(ctx.host().is_none());
        assert!(ctx.forward_url().is_none());
    }

    #[test]
    fn non_string_fields_read_as_absent() {
        let ctx = PolicyContext::from_value(json!({"host": 42, "method": ["GET"]})).unwrap();
        assert!(ctx.host().is_none());
        assert!(ctx.method().is_none());
        assert_eq!(ctx.get("host"), Some(&json!(42)));
    }

    #[test]
    fn canonical_json_sorts_keys_and_is_compact() {
        let ctx = PolicyContext::from_value(json!({
            "method": "POST",
            "attrs": {"z": 1, "a": [true, null]},
            "host": "api.example.com"
        }))
        .unwrap();
        let s = String::from_utf8(ctx.to_canonical_json().unwrap()).unwrap();
        assert_eq!(
            s,
            r#"{"attrs":{"a":[true,null],"z":1},"host":"api.example.com","method":"POST"}"#
        );
    }

    #[test]
    fn builder_sets_headers() {
        let ctx = PolicyContext::new()
            .with_tenant_id("acme")
            .with_header("content-type", "application/json")
            .with_header("x-trace", "abc");
        assert_eq!(ctx.tenant_id(), Some("acme"));
        assert_eq!(ctx.header("x-trace"), Some("abc"));
        assert_eq!(ctx.header("missing"), None);
    }
}
