use super::DynamicRoute;

use crate::route::{BadRoutePattern, Params};

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use regex::Regex;
use tracing::debug;

/// The immutable matching structure produced by
/// [`RouteCollector::compile`](super::RouteCollector::compile).
#[derive(Debug)]
pub struct CompiledRoutes<T> {
    methods: Vec<Method>,
    static_map: HashMap<Method, HashMap<Box<str>, usize>>,
    dynamic_map: HashMap<Method, Vec<Chunk>>,
    endpoints: Vec<T>,
}

/// Several dynamic routes combined into one anchored regex.
#[derive(Debug)]
struct Chunk {
    regex: Regex,
    alternatives: Vec<Alternative>,
}

#[derive(Debug)]
struct Alternative {
    // index of the group wrapping the whole alternative;
    // its placeholders follow at marker + 1 ..
    marker: usize,
    names: Arc<[Arc<str>]>,
    endpoint: usize,
}

impl<T> CompiledRoutes<T> {
    pub(super) fn build(
        methods: Vec<Method>,
        static_map: HashMap<Method, HashMap<Box<str>, usize>>,
        dynamic_routes: HashMap<Method, Vec<DynamicRoute>>,
        endpoints: Vec<T>,
        chunk_size: usize,
    ) -> Result<Self, BadRoutePattern> {
        let mut dynamic_map: HashMap<Method, Vec<Chunk>> = HashMap::new();

        for (method, routes) in dynamic_routes {
            let size = compute_chunk_size(routes.len(), chunk_size);
            let chunks = routes
                .chunks(size)
                .map(build_chunk)
                .collect::<Result<Vec<Chunk>, regex::Error>>()
                .map_err(|source| BadRoutePattern::Compile {
                    method: method.clone(),
                    source,
                })?;
            debug!(%method, routes = routes.len(), chunks = chunks.len(), "dynamic routes compiled");
            dynamic_map.insert(method, chunks);
        }

        Ok(Self {
            methods,
            static_map,
            dynamic_map,
            endpoints,
        })
    }

    /// Methods in the order they were first registered.
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn endpoints(&self) -> &[T] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub(crate) fn endpoint(&self, idx: usize) -> &T {
        &self.endpoints[idx]
    }

    /// Static table first, then dynamic chunks in registration order.
    pub(crate) fn find(&self, method: &Method, path: &str) -> Option<(usize, Params)> {
        if let Some(&idx) = self.static_map.get(method).and_then(|m| m.get(path)) {
            return Some((idx, Params::empty()));
        }
        self.find_dynamic(method, path)
    }

    pub(crate) fn is_match(&self, method: &Method, path: &str) -> bool {
        if self.static_map.get(method).map_or(false, |m| m.contains_key(path)) {
            return true;
        }
        self.dynamic_map
            .get(method)
            .map_or(false, |chunks| chunks.iter().any(|c| c.regex.is_match(path)))
    }

    fn find_dynamic(&self, method: &Method, path: &str) -> Option<(usize, Params)> {
        let chunks = self.dynamic_map.get(method)?;
        for chunk in chunks {
            let caps = match chunk.regex.captures(path) {
                Some(caps) => caps,
                None => continue,
            };
            let alt = chunk
                .alternatives
                .iter()
                .find(|a| caps.get(a.marker).is_some())?;
            let ranges = alt
                .names
                .iter()
                .enumerate()
                .filter_map(|(i, name)| caps.get(alt.marker + 1 + i).map(|m| (name, m.range())));
            return Some((alt.endpoint, Params::new(path, ranges)));
        }
        None
    }
}

/// Splits `count` routes into parts of roughly `approx` routes each.
fn compute_chunk_size(count: usize, approx: usize) -> usize {
    let num_parts = ((count as f64 / approx as f64).round() as usize).max(1);
    ((count + num_parts - 1) / num_parts).max(1)
}

fn build_chunk(routes: &[DynamicRoute]) -> Result<Chunk, regex::Error> {
    let mut src = String::from("^(?:");
    let mut alternatives: Vec<Alternative> = Vec::with_capacity(routes.len());
    let mut group: usize = 1;

    for (i, route) in routes.iter().enumerate() {
        if i > 0 {
            src.push('|');
        }
        src.push('(');
        src.push_str(&route.regex_src);
        src.push(')');

        alternatives.push(Alternative {
            marker: group,
            names: Arc::clone(&route.names),
            endpoint: route.endpoint,
        });
        group += 1 + route.names.len();
    }
    src.push_str(")$");

    Ok(Chunk {
        regex: Regex::new(&src)?,
        alternatives,
    })
}
