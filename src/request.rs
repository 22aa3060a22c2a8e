use crate::auth::Identity;
use crate::handler::Payload;

use std::collections::HashMap;

use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Everything the service needs to know about one incoming request.
///
/// Built once per request by the transport adapter.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    method: Option<Method>,
    uri: String,
    fields: HashMap<String, String>,
    identity: Option<Identity>,
}

/// Where the route path of a request is read from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchStrategy {
    /// The request URI is the route.
    PathBased,
    /// The route is the value of the request field `key`.
    QueryParam { key: String },
}

impl Default for DispatchStrategy {
    fn default() -> Self {
        Self::PathBased
    }
}

impl RequestContext {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Adds a request field (query, form or body parameter).
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Request method; `POST` when the transport did not report one.
    pub fn method(&self) -> Method {
        self.method.clone().unwrap_or(Method::POST)
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// The raw route according to `strategy`. Empty when the field is missing.
    pub fn route<'a>(&'a self, strategy: &DispatchStrategy) -> &'a str {
        match strategy {
            DispatchStrategy::PathBased => &self.uri,
            DispatchStrategy::QueryParam { key } => self.field(key).unwrap_or(""),
        }
    }
}

/// Decodes a JSON payload field.
///
/// When the first attempt fails, backslash escaping added by the platform is
/// stripped and decoding is retried. Anything that is not a non-empty JSON
/// object yields an empty payload.
pub fn decode_payload(raw: Option<&str>) -> Payload {
    let raw = match raw {
        Some(s) if !s.is_empty() && s != "0" => s,
        _ => return Payload::new(),
    };

    let value = match serde_json::from_str::<Value>(raw) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "payload is not valid JSON, retrying unescaped");
            match serde_json::from_str::<Value>(&strip_slashes(raw)) {
                Ok(v) => v,
                Err(e) => {
                    debug!(error = %e, "payload could not be decoded");
                    return Payload::new();
                }
            }
        }
    };

    match value {
        Value::Object(map) => map,
        _ => Payload::new(),
    }
}

/// Removes one level of backslash escaping: `\x` becomes `x`, `\\` becomes `\`,
/// `\0` becomes NUL and a trailing lone `\` is dropped.
pub fn strip_slashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('\0'),
            Some(next) => out.push(next),
            None => {}
        }
    }
    out
}
