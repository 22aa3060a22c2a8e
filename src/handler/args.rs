use crate::route::Params;

use std::sync::Arc;

use serde_json::{Map, Value};

/// Decoded JSON request payload.
pub type Payload = Map<String, Value>;

/// Arguments shared by every callable of one route invocation.
#[derive(Debug, Clone, Default)]
pub struct RouteArgs {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    params: Params,
    payload: Payload,
}

impl RouteArgs {
    pub fn new(params: Params, payload: Payload) -> Self {
        Self {
            inner: Arc::new(Inner { params, payload }),
        }
    }

    pub fn params(&self) -> &Params {
        &self.inner.params
    }

    pub fn payload(&self) -> &Payload {
        &self.inner.payload
    }

    /// Shortcut for `self.params().get(name)`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.inner.params.get(name)
    }
}
