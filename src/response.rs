use http::StatusCode;
use serde_json::{json, Value};

/// The value a route produced plus the status to send it with.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    body: Value,
}

impl Response {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// The caller is not logged in.
    pub fn unauthorized() -> Self {
        Self::error(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    /// The caller is logged in but may not use this route.
    pub fn forbidden() -> Self {
        Self::error(StatusCode::FORBIDDEN, "Forbidden")
    }

    /// The JSON web token of a JWT route could not be decoded.
    pub fn jwt_unauthorized(message: &str) -> Self {
        Self::with_message(StatusCode::UNAUTHORIZED, "JWTUnauthorized", message)
    }

    fn error(status: StatusCode, code: &str) -> Self {
        let message = status.canonical_reason().unwrap_or(code);
        Self::with_message(status, code, message)
    }

    fn with_message(status: StatusCode, code: &str, message: &str) -> Self {
        Self::new(
            status,
            json!({
                "errorcode": code,
                "status": status.as_u16(),
                "message": message,
            }),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn into_body(self) -> Value {
        self.body
    }

    /// Serializes the body for the wire.
    ///
    /// A string body that already holds JSON is sent as is; anything else is
    /// JSON-encoded.
    pub fn encode(&self) -> String {
        if let Value::String(s) = &self.body {
            if serde_json::from_str::<Value>(s).is_ok() {
                return s.clone();
            }
        }
        self.body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_passthrough() {
        let raw = Response::ok(json!(r#"{"already":"json"}"#));
        assert_eq!(raw.encode(), r#"{"already":"json"}"#);

        let text = Response::ok(json!("plain text"));
        assert_eq!(text.encode(), r#""plain text""#);

        let obj = Response::ok(json!({"a": [1, 2]}));
        assert_eq!(obj.encode(), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn auth_errors() {
        let r = Response::unauthorized();
        assert_eq!(r.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(r.body()["errorcode"], "Unauthorized");
        assert_eq!(Response::forbidden().body()["status"], 403);

        let jwt = Response::jwt_unauthorized("Signature verification failed");
        assert_eq!(jwt.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(jwt.body()["errorcode"], "JWTUnauthorized");
        assert_eq!(jwt.body()["message"], "Signature verification failed");
    }
}
