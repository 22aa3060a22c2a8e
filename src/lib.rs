//! Regex-chunked HTTP route matching with an optional request pipeline.
//!
//! The core ([`RouteCollector`], [`CompiledRoutes`], [`Dispatcher`]) maps a
//! method and path to registered data. With the `service` feature,
//! [`RouterService`] adds access gates, payload decoding and middleware
//! around async handlers.

#![forbid(unsafe_code)]

mod compiler;
mod dispatcher;
mod route;

pub use http::Method;

pub use crate::compiler::{CompiledRoutes, RouteCollector, RouteEntry, DEFAULT_CHUNK_SIZE};
pub use crate::dispatcher::{decode_path, DispatchResult, Dispatcher};
pub use crate::route::{
    BadRoutePattern, IntoIter, Iter, Params, Part, RoutePattern, RouteVariant,
    DEFAULT_PLACEHOLDER_REGEX,
};

#[cfg(feature = "service")]
mod auth;
#[cfg(feature = "service")]
mod config;
#[cfg(feature = "service")]
pub mod handler;
#[cfg(feature = "service")]
mod request;
#[cfg(feature = "service")]
mod response;
#[cfg(feature = "service")]
mod service;

#[cfg(feature = "service")]
pub use crate::{
    auth::{Access, Identity, JwtDecoder, NonceVerifier, Role},
    config::{NonceConfig, RouterConfig, DEFAULT_PAYLOAD_FIELD},
    handler::{BoxError, Endpoint, Payload, RouteArgs},
    request::{decode_payload, strip_slashes, DispatchStrategy, RequestContext},
    response::Response,
    service::{Outcome, Route, RouterService, Routes, JWT_FIELD},
};

#[cfg(feature = "service")]
pub use http::StatusCode;
