//! Route registration and compilation.
//!
//! A [`RouteCollector`] accepts `(methods, pattern, data)` triples, validates them
//! eagerly and finally compiles into an immutable [`CompiledRoutes`].

mod collector_macro;
mod data;

pub use self::data::CompiledRoutes;

use crate::route::{BadRoutePattern, RoutePattern, RouteVariant};

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use tracing::debug;

/// Default number of dynamic routes combined into one regex.
pub const DEFAULT_CHUNK_SIZE: usize = 10;

#[derive(Debug)]
pub struct RouteCollector<T> {
    prefix: String,
    chunk_size: usize,
    methods: Vec<Method>,
    entries: Vec<RouteEntry>,
    static_routes: HashMap<Method, HashMap<Box<str>, usize>>,
    dynamic_routes: HashMap<Method, Vec<DynamicRoute>>,
    endpoints: Vec<T>,
}

/// One registered `(method, variant)` pair.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    method: Method,
    pattern: Box<str>,
    variant: RouteVariant,
    endpoint: usize,
}

#[derive(Debug, Clone)]
struct DynamicRoute {
    pattern: Box<str>,
    regex_src: Box<str>,
    matcher: Regex,
    names: Arc<[Arc<str>]>,
    endpoint: usize,
}

enum Pending {
    Static(Box<str>),
    Dynamic {
        regex_src: Box<str>,
        matcher: Regex,
        names: Arc<[Arc<str>]>,
    },
}

impl RouteEntry {
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Full pattern text, group prefixes included.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn variant(&self) -> &RouteVariant {
        &self.variant
    }

    pub fn is_static(&self) -> bool {
        self.variant.is_static()
    }

    /// Index of the stored data, shared by every entry of one `add_route` call.
    pub fn endpoint(&self) -> usize {
        self.endpoint
    }
}

impl<T> Default for RouteCollector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RouteCollector<T> {
    pub fn new() -> Self {
        Self {
            prefix: String::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            methods: Vec::new(),
            entries: Vec::new(),
            static_routes: HashMap::new(),
            dynamic_routes: HashMap::new(),
            endpoints: Vec::new(),
        }
    }

    /// Sets the approximate number of dynamic routes per combined regex.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Registers `data` for every method in `methods`.
    ///
    /// The pattern is validated completely before anything is inserted, so a
    /// failing call leaves the collector unchanged.
    pub fn add_route(
        &mut self,
        methods: &[Method],
        pattern: &str,
        data: T,
    ) -> Result<(), BadRoutePattern> {
        let full: String = format!("{}{}", self.prefix, pattern);
        let parsed = RoutePattern::parse(&full)?;

        if methods.is_empty() {
            return Err(BadRoutePattern::NoMethod {
                pattern: full.into(),
            });
        }

        let mut pending: SmallVec<[(&Method, &RouteVariant, Pending); 4]> = SmallVec::new();

        for method in methods {
            for variant in parsed.variants() {
                let p = self.prepare(method, &full, variant, &pending)?;
                pending.push((method, variant, p));
            }
        }

        let endpoint = self.endpoints.len();
        self.endpoints.push(data);

        for (method, variant, p) in pending {
            if !self.methods.contains(method) {
                self.methods.push(method.clone());
            }
            match p {
                Pending::Static(path) => {
                    self.static_routes
                        .entry(method.clone())
                        .or_insert_with(HashMap::new)
                        .insert(path, endpoint);
                }
                Pending::Dynamic {
                    regex_src,
                    matcher,
                    names,
                } => {
                    self.dynamic_routes
                        .entry(method.clone())
                        .or_insert_with(Vec::new)
                        .push(DynamicRoute {
                            pattern: full.as_str().into(),
                            regex_src,
                            matcher,
                            names,
                            endpoint,
                        });
                }
            }
            self.entries.push(RouteEntry {
                method: method.clone(),
                pattern: full.as_str().into(),
                variant: variant.clone(),
                endpoint,
            });
        }

        debug!(pattern = %full, methods = ?methods, endpoint, "route added");
        Ok(())
    }

    /// Runs `f` with `prefix` appended to the current group prefix.
    pub fn add_group<F>(&mut self, prefix: &str, f: F) -> Result<(), BadRoutePattern>
    where
        F: FnOnce(&mut Self) -> Result<(), BadRoutePattern>,
    {
        let len = self.prefix.len();
        self.prefix.push_str(prefix);
        let ret = f(self);
        self.prefix.truncate(len);
        ret
    }

    /// Prefix of the group currently being declared.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Number of registered endpoints (one per successful `add_route`).
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Builds the matching structure. Consumes the collector.
    pub fn compile(self) -> Result<CompiledRoutes<T>, BadRoutePattern> {
        CompiledRoutes::build(
            self.methods,
            self.static_routes,
            self.dynamic_routes,
            self.endpoints,
            self.chunk_size,
        )
    }
}

impl<T> RouteCollector<T> {
    fn prepare(
        &self,
        method: &Method,
        pattern: &str,
        variant: &RouteVariant,
        pending: &[(&Method, &RouteVariant, Pending)],
    ) -> Result<Pending, BadRoutePattern> {
        let same_method = pending.iter().filter(|&&(m, _, _)| m == method);

        if let Some(path) = variant.static_path() {
            let exists = self
                .static_routes
                .get(method)
                .map_or(false, |m| m.contains_key(path.as_str()))
                || same_method
                    .clone()
                    .any(|(_, _, p)| matches!(p, Pending::Static(s) if **s == *path));
            if exists {
                return Err(BadRoutePattern::Duplicate {
                    pattern: pattern.into(),
                    route: path.into(),
                    method: method.clone(),
                });
            }

            let shadowed_by = self
                .dynamic_routes
                .get(method)
                .and_then(|routes| routes.iter().find(|r| r.matcher.is_match(&path)))
                .map(|r| r.pattern.clone());
            if let Some(shadowed_by) = shadowed_by {
                return Err(BadRoutePattern::ShadowedStatic {
                    route: path.into(),
                    shadowed_by,
                    method: method.clone(),
                });
            }

            return Ok(Pending::Static(path.into()));
        }

        let regex_src: Box<str> = variant.to_regex().into();

        let exists = self
            .dynamic_routes
            .get(method)
            .map_or(false, |routes| routes.iter().any(|r| r.regex_src == regex_src))
            || same_method.clone().any(|(_, _, p)| match p {
                Pending::Dynamic { regex_src: s, .. } => *s == regex_src,
                Pending::Static(_) => false,
            });
        if exists {
            return Err(BadRoutePattern::Duplicate {
                pattern: pattern.into(),
                route: regex_src,
                method: method.clone(),
            });
        }

        let matcher = Regex::new(&format!("^{}$", regex_src)).map_err(|source| {
            BadRoutePattern::Compile {
                method: method.clone(),
                source,
            }
        })?;
        let names: Arc<[Arc<str>]> = variant.names().map(Arc::<str>::from).collect();

        Ok(Pending::Dynamic {
            regex_src,
            matcher,
            names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_groups() {
        let mut c: RouteCollector<usize> = RouteCollector::new();
        c.add_group("/v1", |c| {
            c.add_route(&[Method::GET], "/info", 1)?;
            c.add_group("/u/{uid}", |c| c.add_route(&[Method::POST], "/p", 2))
        })
        .unwrap();
        c.add_route(&[Method::GET], "/top", 3).unwrap();

        let patterns: Vec<&str> = c.entries().iter().map(RouteEntry::pattern).collect();
        assert_eq!(patterns, ["/v1/info", "/v1/u/{uid}/p", "/top"]);
        assert!(c.entries()[0].is_static());
        assert!(!c.entries()[1].is_static());
    }

    #[test]
    fn group_prefix_restored_on_error() {
        let mut c: RouteCollector<usize> = RouteCollector::new();
        let ret = c.add_group("/v1", |c| c.add_route(&[Method::GET], "/{id}/{id}", 1));
        assert!(matches!(ret, Err(BadRoutePattern::DuplicatePlaceholder { .. })));
        c.add_route(&[Method::GET], "/x", 2).unwrap();
        assert_eq!(c.entries()[0].pattern(), "/x");
    }

    #[test]
    fn failed_add_leaves_no_entry() {
        let mut c: RouteCollector<usize> = RouteCollector::new();
        c.add_route(&[Method::GET], "/a", 1).unwrap();
        assert!(c.add_route(&[Method::POST, Method::GET], "/a", 2).is_err());
        assert_eq!(c.len(), 1);
        assert_eq!(c.entries().len(), 1);
    }

    #[test]
    fn one_endpoint_per_call() {
        let mut c: RouteCollector<usize> = RouteCollector::new();
        c.add_route(&[Method::GET, Method::POST], "/user[/{id}]", 1)
            .unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(c.entries().len(), 4);
        assert_eq!(c.entries()[2].method(), &Method::POST);
        assert!(c.entries().iter().all(|e| e.endpoint() == 0));

        c.add_route(&[Method::GET], "/other", 2).unwrap();
        assert_eq!(c.entries()[4].endpoint(), 1);
    }

    #[test]
    fn empty_method_list_is_rejected() {
        let mut c: RouteCollector<usize> = RouteCollector::new();
        let err = c.add_route(&[], "/a", 1).unwrap_err();
        assert!(matches!(err, BadRoutePattern::NoMethod { .. }));
        assert_eq!(err.pattern(), "/a");
        assert!(c.is_empty());
        assert!(c.entries().is_empty());
    }

    #[test]
    fn duplicate_and_shadowed() {
        let mut c: RouteCollector<usize> = RouteCollector::new();
        c.add_route(&[Method::GET], "/u/{id}", 1).unwrap();
        assert!(matches!(
            c.add_route(&[Method::GET], "/u/{name}", 2),
            Err(BadRoutePattern::Duplicate { .. })
        ));
        assert!(matches!(
            c.add_route(&[Method::GET], "/u/me", 3),
            Err(BadRoutePattern::ShadowedStatic { .. })
        ));
        assert!(c.add_route(&[Method::POST], "/u/me", 4).is_ok());
        assert!(matches!(
            c.add_route(&[Method::PUT, Method::PUT], "/x", 5),
            Err(BadRoutePattern::Duplicate { .. })
        ));
    }
}
