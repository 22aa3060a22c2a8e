use crate::auth::{Access, JwtDecoder, Role};
use crate::compiler::RouteCollector;
use crate::handler::{is_empty_value, Endpoint, Payload};
use crate::response::Response;
use crate::route::BadRoutePattern;

use std::fmt;
use std::sync::Arc;

use http::Method;
use serde_json::Value;
use tracing::warn;

/// Payload field carrying the token of a JWT route.
pub const JWT_FIELD: &str = "jwt";

/// A registered endpoint and the access policy guarding it.
pub struct Route {
    endpoint: Endpoint,
    access: Access,
    jwt: Option<Arc<dyn JwtDecoder>>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("endpoint", &self.endpoint)
            .field("access", &self.access)
            .field("jwt", &self.jwt.is_some())
            .finish()
    }
}

impl Route {
    pub fn new(endpoint: Endpoint, access: Access) -> Self {
        Self {
            endpoint,
            access,
            jwt: None,
        }
    }

    /// Replaces the request payload with the claims of its `jwt` field.
    pub fn with_jwt(mut self, decoder: Arc<dyn JwtDecoder>) -> Self {
        self.jwt = Some(decoder);
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn access(&self) -> &Access {
        &self.access
    }

    pub fn is_jwt(&self) -> bool {
        self.jwt.is_some()
    }

    /// The payload handed to the endpoint. For JWT routes a token that fails
    /// to decode yields the response to send instead.
    pub fn payload(&self, raw: Payload) -> Result<Payload, Response> {
        let decoder = match &self.jwt {
            Some(decoder) => decoder,
            None => return Ok(raw),
        };

        let token = match raw.get(JWT_FIELD) {
            Some(v) if !is_empty_value(v) => match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
            _ => String::new(),
        };

        decoder.decode(&token).map_err(|e| {
            warn!(error = %e, "jwt decoding failed");
            Response::jwt_unauthorized(&e.to_string())
        })
    }
}

/// Registration surface handed to route declarations.
///
/// Unless stated otherwise, routes require a valid nonce.
#[derive(Debug)]
pub struct Routes<'a> {
    collector: &'a mut RouteCollector<Route>,
}

impl<'a> Routes<'a> {
    pub(crate) fn new(collector: &'a mut RouteCollector<Route>) -> Self {
        Self { collector }
    }

    pub fn add_with_access(
        &mut self,
        methods: &[Method],
        pattern: &str,
        access: Access,
        endpoint: Endpoint,
    ) -> Result<&mut Self, BadRoutePattern> {
        self.collector
            .add_route(methods, pattern, Route::new(endpoint, access))?;
        Ok(self)
    }

    /// Nonce-verified route.
    pub fn add(
        &mut self,
        methods: &[Method],
        pattern: &str,
        endpoint: Endpoint,
    ) -> Result<&mut Self, BadRoutePattern> {
        self.add_with_access(methods, pattern, Access::nonce(), endpoint)
    }

    /// Nonce-verified route restricted to callers holding any of `roles`.
    pub fn add_with_roles<I, S>(
        &mut self,
        methods: &[Method],
        pattern: &str,
        roles: I,
        endpoint: Endpoint,
    ) -> Result<&mut Self, BadRoutePattern>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_with_access(methods, pattern, Access::roles(roles), endpoint)
    }

    /// Nonce-verified route restricted to one built-in role.
    pub fn add_for_role(
        &mut self,
        methods: &[Method],
        pattern: &str,
        role: Role,
        endpoint: Endpoint,
    ) -> Result<&mut Self, BadRoutePattern> {
        self.add_with_roles(methods, pattern, Some(role.as_str()), endpoint)
    }

    /// Route without nonce or role checks.
    pub fn add_public(
        &mut self,
        methods: &[Method],
        pattern: &str,
        endpoint: Endpoint,
    ) -> Result<&mut Self, BadRoutePattern> {
        self.add_with_access(methods, pattern, Access::public(), endpoint)
    }

    /// Route without nonce or role checks whose payload is the decoded `jwt`
    /// field of the request payload. Only `POST` and `PUT` are accepted.
    pub fn add_public_jwt(
        &mut self,
        methods: &[Method],
        pattern: &str,
        decoder: Arc<dyn JwtDecoder>,
        endpoint: Endpoint,
    ) -> Result<&mut Self, BadRoutePattern> {
        if let Some(m) = methods
            .iter()
            .find(|&m| *m != Method::POST && *m != Method::PUT)
        {
            return Err(BadRoutePattern::UnsupportedMethod {
                pattern: format!("{}{}", self.collector.prefix(), pattern).into(),
                method: m.clone(),
            });
        }
        let route = Route::new(endpoint, Access::public()).with_jwt(decoder);
        self.collector.add_route(methods, pattern, route)?;
        Ok(self)
    }

    /// Registers everything `f` declares under `prefix`.
    pub fn group<F>(&mut self, prefix: &str, f: F) -> Result<&mut Self, BadRoutePattern>
    where
        F: FnOnce(&mut Routes<'_>) -> Result<(), BadRoutePattern>,
    {
        self.collector
            .add_group(prefix, |c| f(&mut Routes::new(c)))?;
        Ok(self)
    }
}

macro_rules! define_method {
    ($name:tt, $method:tt) => {
        pub fn $name(
            &mut self,
            pattern: &str,
            endpoint: Endpoint,
        ) -> Result<&mut Self, BadRoutePattern> {
            self.add(&[Method::$method], pattern, endpoint)
        }
    };
}

impl Routes<'_> {
    define_method!(get, GET);
    define_method!(post, POST);
    define_method!(put, PUT);
    define_method!(delete, DELETE);
    define_method!(patch, PATCH);
    define_method!(head, HEAD);
}
