use crate::compiler::{CompiledRoutes, RouteCollector};
use crate::route::{BadRoutePattern, Params};

use std::borrow::Cow;
use std::sync::Arc;

use http::Method;
use smallvec::SmallVec;
use tracing::trace;

/// Resolves `(method, uri)` pairs against a compiled route set.
///
/// Cloning is cheap; clones share the same [`CompiledRoutes`].
#[derive(Debug)]
pub struct Dispatcher<T> {
    routes: Arc<CompiledRoutes<T>>,
}

#[derive(Debug)]
pub enum DispatchResult<'a, T> {
    Found { endpoint: &'a T, params: Params },
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            routes: Arc::clone(&self.routes),
        }
    }
}

impl<T> From<CompiledRoutes<T>> for Dispatcher<T> {
    fn from(routes: CompiledRoutes<T>) -> Self {
        Self::new(routes)
    }
}

impl<T> Dispatcher<T> {
    pub fn new(routes: CompiledRoutes<T>) -> Self {
        Self {
            routes: Arc::new(routes),
        }
    }

    /// Compiles `collector` and wraps the result.
    pub fn from_collector(collector: RouteCollector<T>) -> Result<Self, BadRoutePattern> {
        collector.compile().map(Self::new)
    }

    pub fn routes(&self) -> &CompiledRoutes<T> {
        &self.routes
    }

    /// Strips the query string, percent-decodes the rest and matches it.
    pub fn dispatch(&self, method: &Method, raw_uri: &str) -> DispatchResult<'_, T> {
        let path = decode_path(raw_uri);
        self.match_path(method, &path)
    }

    /// Matches an already decoded path.
    pub fn match_path(&self, method: &Method, path: &str) -> DispatchResult<'_, T> {
        let routes = &*self.routes;

        let found = routes.find(method, path).or_else(|| {
            if *method == Method::HEAD {
                routes.find(&Method::GET, path)
            } else {
                None
            }
        });

        if let Some((idx, params)) = found {
            trace!(%method, path, endpoint = idx, "route found");
            return DispatchResult::Found {
                endpoint: routes.endpoint(idx),
                params,
            };
        }

        let allowed: SmallVec<[Method; 4]> = routes
            .methods()
            .iter()
            .filter(|&m| m != method && routes.is_match(m, path))
            .cloned()
            .collect();

        if allowed.is_empty() {
            trace!(%method, path, "route not found");
            DispatchResult::NotFound
        } else {
            trace!(%method, path, allowed = ?allowed, "method not allowed");
            DispatchResult::MethodNotAllowed(allowed.into_vec())
        }
    }
}

impl<'a, T> DispatchResult<'a, T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    pub fn found(self) -> Option<(&'a T, Params)> {
        match self {
            Self::Found { endpoint, params } => Some((endpoint, params)),
            _ => None,
        }
    }
}

/// Drops everything from the first `?`, then decodes `%XX` escapes.
///
/// Decoding happens after the query string is removed, so a literal `?`
/// inside the path must arrive encoded. A decoded `%2F` is an ordinary `/`
/// and therefore a segment boundary for matching.
pub fn decode_path(raw_uri: &str) -> Cow<'_, str> {
    let path = match raw_uri.find('?') {
        Some(pos) => &raw_uri[..pos],
        None => raw_uri,
    };
    if !path.contains('%') {
        return Cow::Borrowed(path);
    }
    match urlencoding::decode_binary(path.as_bytes()) {
        Cow::Borrowed(bytes) => String::from_utf8_lossy(bytes),
        Cow::Owned(bytes) => Cow::Owned(String::from_utf8_lossy(&bytes).into_owned()),
    }
}
