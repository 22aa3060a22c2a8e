use super::{
    AfterMiddleware, BoxAfterMiddleware, BoxError, BoxHandler, BoxMiddleware, Handler, Middleware,
    RouteArgs,
};

use std::fmt;

use serde_json::Value;
use tracing::trace;

/// A handler together with its ordered pre- and post-middleware.
pub struct Endpoint {
    handler: BoxHandler,
    before: Vec<BoxMiddleware>,
    after: Vec<BoxAfterMiddleware>,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .finish()
    }
}

impl Endpoint {
    pub fn new(handler: impl Handler + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    /// Appends a middleware that runs before the handler.
    pub fn before(mut self, m: impl Middleware + 'static) -> Self {
        self.before.push(Box::new(m));
        self
    }

    /// Appends a middleware that runs after the handler.
    pub fn after(mut self, m: impl AfterMiddleware + 'static) -> Self {
        self.after.push(Box::new(m));
        self
    }

    /// Runs the chain.
    ///
    /// The first `before` middleware returning a non-empty value ends the run
    /// with that value. Otherwise the handler result is passed through every
    /// `after` middleware in order. Errors are returned as they are.
    pub async fn run(&self, args: RouteArgs) -> Result<Value, BoxError> {
        for (i, m) in self.before.iter().enumerate() {
            let res = m.call(args.clone()).await?;
            if !is_empty_value(&res) {
                trace!(middleware = i, "short-circuited by middleware");
                return Ok(res);
            }
        }

        let mut res = self.handler.call(args.clone()).await?;

        for m in &self.after {
            res = m.call(res, args.clone()).await?;
        }

        Ok(res)
    }
}

/// `null`, `false`, `0`, `""`, `"0"`, `[]` and `{}` count as empty.
pub fn is_empty_value(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Bool(b) => !*b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_values() {
        for v in &[
            json!(null),
            json!(false),
            json!(0),
            json!(0.0),
            json!(""),
            json!("0"),
            json!([]),
            json!({}),
        ] {
            assert!(is_empty_value(v), "{}", v);
        }
        for v in &[json!(true), json!(1), json!("a"), json!([0]), json!({"a": 0})] {
            assert!(!is_empty_value(v), "{}", v);
        }
    }
}
