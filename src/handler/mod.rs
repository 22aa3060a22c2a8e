mod args;
mod chain;

pub use self::args::{Payload, RouteArgs};
pub use self::chain::{is_empty_value, Endpoint};

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// The main callable of a route.
pub trait Handler: Send + Sync {
    fn call(&self, args: RouteArgs) -> BoxFuture<'static, Result<Value, BoxError>>;
}

/// Runs before the handler. A non-empty result short-circuits the route.
pub trait Middleware: Send + Sync {
    fn call(&self, args: RouteArgs) -> BoxFuture<'static, Result<Value, BoxError>>;
}

/// Runs after the handler and may replace its result.
pub trait AfterMiddleware: Send + Sync {
    fn call(&self, res: Value, args: RouteArgs) -> BoxFuture<'static, Result<Value, BoxError>>;
}

pub type BoxHandler = Box<dyn Handler>;
pub type BoxMiddleware = Box<dyn Middleware>;
pub type BoxAfterMiddleware = Box<dyn AfterMiddleware>;

impl<F, E, Fut> Handler for F
where
    F: Fn(RouteArgs) -> Fut + Send + Sync,
    E: Into<BoxError>,
    Fut: Future<Output = Result<Value, E>> + Send + 'static,
{
    fn call(&self, args: RouteArgs) -> BoxFuture<'static, Result<Value, BoxError>> {
        let fut = (self)(args);
        Box::pin(async move { fut.await.map_err(Into::into) })
    }
}

impl<F, E, Fut> Middleware for F
where
    F: Fn(RouteArgs) -> Fut + Send + Sync,
    E: Into<BoxError>,
    Fut: Future<Output = Result<Value, E>> + Send + 'static,
{
    fn call(&self, args: RouteArgs) -> BoxFuture<'static, Result<Value, BoxError>> {
        let fut = (self)(args);
        Box::pin(async move { fut.await.map_err(Into::into) })
    }
}

impl<F, E, Fut> AfterMiddleware for F
where
    F: Fn(Value, RouteArgs) -> Fut + Send + Sync,
    E: Into<BoxError>,
    Fut: Future<Output = Result<Value, E>> + Send + 'static,
{
    fn call(&self, res: Value, args: RouteArgs) -> BoxFuture<'static, Result<Value, BoxError>> {
        let fut = (self)(res, args);
        Box::pin(async move { fut.await.map_err(Into::into) })
    }
}
