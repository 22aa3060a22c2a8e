//! Service configuration.
//!
//! Every type derives Serde traits so integrators can load it from whatever
//! format their application already uses.

use crate::compiler::DEFAULT_CHUNK_SIZE;
use crate::request::DispatchStrategy;

use serde::{Deserialize, Serialize};

/// Default request field holding the JSON payload.
pub const DEFAULT_PAYLOAD_FIELD: &str = "payload";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Prefix all declared routes fall under, e.g. `/myplugin`.
    pub route_prefix: String,

    /// Path of the site home URL (e.g. `/blog`), prepended for path-based
    /// dispatch only.
    pub home_path: String,

    /// Nonce field and action. Routes requiring a nonce are rejected without it.
    pub nonce: Option<NonceConfig>,

    pub strategy: DispatchStrategy,

    /// Request field holding the JSON payload.
    pub payload_field: String,

    /// Approximate number of dynamic routes per combined regex.
    pub chunk_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NonceConfig {
    /// Request field carrying the token.
    pub key: String,
    /// Action the token was issued for.
    pub name: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            route_prefix: String::from("/"),
            home_path: String::new(),
            nonce: None,
            strategy: DispatchStrategy::PathBased,
            payload_field: DEFAULT_PAYLOAD_FIELD.to_owned(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl NonceConfig {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }
}

impl RouterConfig {
    pub fn new(route_prefix: &str) -> Self {
        Self {
            route_prefix: route_prefix.to_owned(),
            ..Self::default()
        }
    }

    pub fn with_nonce(mut self, key: impl Into<String>, name: impl Into<String>) -> Self {
        self.nonce = Some(NonceConfig::new(key, name));
        self
    }

    pub fn with_home_path(mut self, home_path: impl Into<String>) -> Self {
        self.home_path = home_path.into();
        self
    }

    pub fn with_strategy(mut self, strategy: DispatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_payload_field(mut self, field: impl Into<String>) -> Self {
        self.payload_field = field.into();
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// `route_prefix` with exactly one leading slash and no trailing slash.
    pub fn normalized_prefix(&self) -> String {
        format!("/{}", self.route_prefix.trim_matches('/'))
    }

    /// Prefix of the group all declared routes are registered under.
    pub fn group_prefix(&self) -> String {
        let prefix = self.normalized_prefix();
        let prefix = if prefix == "/" { "" } else { prefix.as_str() };
        match self.strategy {
            DispatchStrategy::PathBased => {
                let home = self.home_path.trim_end_matches('/');
                format!("{}{}", home, prefix)
            }
            DispatchStrategy::QueryParam { .. } => prefix.to_owned(),
        }
    }
}
