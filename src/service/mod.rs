//! Request pipeline: match, gate, decode the payload, run the endpoint.

mod routes;

pub use self::routes::{Route, Routes, JWT_FIELD};

use crate::auth::NonceVerifier;
use crate::compiler::RouteCollector;
use crate::config::RouterConfig;
use crate::dispatcher::{DispatchResult, Dispatcher};
use crate::handler::{BoxError, RouteArgs};
use crate::request::{decode_payload, DispatchStrategy, RequestContext};
use crate::response::Response;
use crate::route::BadRoutePattern;

use std::fmt;
use std::sync::Arc;

use http::{Method, StatusCode};
use serde_json::json;
use tracing::debug;

/// What the transport should do with a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A route ran, or its gate rejected the caller.
    Reply(Response),
    /// The path exists for these methods only.
    MethodNotAllowed(Vec<Method>),
    /// No route matched. The request belongs to someone else.
    NotFound,
}

impl Outcome {
    pub fn is_reply(&self) -> bool {
        matches!(self, Self::Reply(_))
    }

    pub fn reply(self) -> Option<Response> {
        match self {
            Self::Reply(res) => Some(res),
            _ => None,
        }
    }

    /// Converts the outcome into a response for transports that answer every
    /// request themselves.
    pub fn into_response(self) -> Response {
        match self {
            Self::Reply(res) => res,
            Self::MethodNotAllowed(allowed) => {
                let allowed: Vec<&str> = allowed.iter().map(Method::as_str).collect();
                Response::new(
                    StatusCode::METHOD_NOT_ALLOWED,
                    json!({
                        "errorcode": "MethodNotAllowed",
                        "status": 405,
                        "message": "Method Not Allowed",
                        "allowed": allowed,
                    }),
                )
            }
            Self::NotFound => Response::new(
                StatusCode::NOT_FOUND,
                json!({
                    "errorcode": "NotFound",
                    "status": 404,
                    "message": "Not Found",
                }),
            ),
        }
    }
}

pub struct RouterService {
    config: RouterConfig,
    dispatcher: Dispatcher<Route>,
    verifier: Option<Arc<dyn NonceVerifier>>,
}

impl fmt::Debug for RouterService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterService")
            .field("config", &self.config)
            .field("routes", &self.dispatcher.routes().len())
            .field("verifier", &self.verifier.is_some())
            .finish()
    }
}

impl RouterService {
    /// Collects the routes `declare` registers under the configured prefix and
    /// compiles them.
    pub fn build<F>(
        config: RouterConfig,
        verifier: Option<Arc<dyn NonceVerifier>>,
        declare: F,
    ) -> Result<Self, BadRoutePattern>
    where
        F: FnOnce(&mut Routes<'_>) -> Result<(), BadRoutePattern>,
    {
        let mut collector = RouteCollector::new().with_chunk_size(config.chunk_size);
        collector.add_group(&config.group_prefix(), |c| declare(&mut Routes::new(c)))?;

        debug!(
            prefix = %config.group_prefix(),
            endpoints = collector.len(),
            "router service built"
        );

        Ok(Self {
            dispatcher: Dispatcher::from_collector(collector)?,
            config,
            verifier,
        })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher<Route> {
        &self.dispatcher
    }

    /// Public path of `route` below the configured prefix.
    pub fn endpoint_path(&self, route: &str) -> String {
        let prefix = self.config.normalized_prefix();
        let route = route.trim_matches('/');
        if route.is_empty() {
            return prefix;
        }
        if prefix == "/" {
            format!("/{}", route)
        } else {
            format!("{}/{}", prefix, route)
        }
    }

    /// Absolute URL of `route`, given the site home URL.
    ///
    /// Path-based routes are appended to `home_url`. For query-parameter
    /// dispatch the percent-encoded path is passed in the configured field.
    pub fn endpoint_url(&self, home_url: &str, route: &str) -> String {
        let path = self.endpoint_path(route);
        match &self.config.strategy {
            DispatchStrategy::PathBased => {
                format!("{}{}", home_url.trim_end_matches('/'), path)
            }
            DispatchStrategy::QueryParam { key } => {
                let sep = if home_url.contains('?') { '&' } else { '?' };
                format!(
                    "{}{}{}={}",
                    home_url,
                    sep,
                    urlencoding::encode(key),
                    urlencoding::encode(&path)
                )
            }
        }
    }

    /// Handles one request.
    ///
    /// Gate rejections are replies; only errors raised by handlers or
    /// middleware are returned as `Err`.
    pub async fn serve(&self, ctx: &RequestContext) -> Result<Outcome, BoxError> {
        let method = ctx.method();
        let uri = ctx.route(&self.config.strategy);

        let (route, params) = match self.dispatcher.dispatch(&method, uri) {
            DispatchResult::Found { endpoint, params } => (endpoint, params),
            DispatchResult::MethodNotAllowed(allowed) => {
                return Ok(Outcome::MethodNotAllowed(allowed))
            }
            DispatchResult::NotFound => return Ok(Outcome::NotFound),
        };

        if let Err(res) = route.access().check(
            ctx,
            self.config.nonce.as_ref(),
            self.verifier.as_deref(),
        ) {
            return Ok(Outcome::Reply(res));
        }

        let raw = decode_payload(ctx.field(&self.config.payload_field));
        let payload = match route.payload(raw) {
            Ok(payload) => payload,
            Err(res) => return Ok(Outcome::Reply(res)),
        };
        let args = RouteArgs::new(params, payload);

        let body = route.endpoint().run(args).await?;
        Ok(Outcome::Reply(Response::ok(body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_paths() {
        let svc = RouterService::build(RouterConfig::new("/shop/"), None, |_| Ok(())).unwrap();
        assert_eq!(svc.endpoint_path("/cart/"), "/shop/cart");
        assert_eq!(svc.endpoint_path(""), "/shop");

        let root = RouterService::build(RouterConfig::default(), None, |_| Ok(())).unwrap();
        assert_eq!(root.endpoint_path("cart"), "/cart");
        assert_eq!(root.endpoint_path("/"), "/");
    }

    #[test]
    fn endpoint_urls() {
        let config = RouterConfig::new("/shop").with_home_path("/blog");
        let svc = RouterService::build(config.clone(), None, |_| Ok(())).unwrap();
        assert_eq!(
            svc.endpoint_url("https://example.com/blog/", "/items/3"),
            "https://example.com/blog/shop/items/3"
        );

        let config = config.with_strategy(DispatchStrategy::QueryParam {
            key: "route".to_owned(),
        });
        let svc = RouterService::build(config, None, |_| Ok(())).unwrap();
        assert_eq!(
            svc.endpoint_url("https://example.com/blog", "items/a b"),
            "https://example.com/blog?route=%2Fshop%2Fitems%2Fa%20b"
        );
        assert_eq!(
            svc.endpoint_url("https://example.com/?lang=en", ""),
            "https://example.com/?lang=en&route=%2Fshop"
        );
    }

    #[test]
    fn fallback_responses() {
        let res = Outcome::MethodNotAllowed(vec![Method::GET, Method::PUT]).into_response();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.body()["allowed"], json!(["GET", "PUT"]));
        assert_eq!(Outcome::NotFound.into_response().status(), StatusCode::NOT_FOUND);
    }
}
