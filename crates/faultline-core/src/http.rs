//! Transport-neutral HTTP model that policies operate on.

use bytes::Bytes;
use std::fmt;
use std::str::FromStr;
use url::Url;
use uuid::Uuid;

use crate::PolicyError;

/// Outcome of one trip through a policy pipeline.
pub type HttpResult = Result<HttpResponse, PolicyError>;

/// HTTP verbs an outbound request step may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    /// Canonical upper-case token.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Whether requests with this verb carry a synthesized body.
    pub fn carries_body(&self) -> bool {
        matches!(self, HttpMethod::Put | HttpMethod::Post)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a method name is outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method '{0}'")]
pub struct UnsupportedMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let method = match s.trim().to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "PUT" => HttpMethod::Put,
            "POST" => HttpMethod::Post,
            "DELETE" => HttpMethod::Delete,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            "TRACE" => HttpMethod::Trace,
            _ => return Err(UnsupportedMethod(s.to_string())),
        };
        Ok(method)
    }
}

/// Per-call metadata that travels with a request through the pipeline.
///
/// The cache policy reads its key from here; every call gets its own
/// `operation_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    operation_id: Uuid,
    cache_key: Option<String>,
}

impl ExecutionContext {
    /// Fresh context with a random operation id and no cache key.
    pub fn new() -> Self {
        Self {
            operation_id: Uuid::new_v4(),
            cache_key: None,
        }
    }

    /// Sets the key the cache policy stores responses under.
    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn operation_id(&self) -> Uuid {
        self.operation_id
    }

    pub fn cache_key(&self) -> Option<&str> {
        self.cache_key.as_deref()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Outbound request. Cloned once per retry attempt, so the body is a
/// reference-counted [`Bytes`].
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub body: Option<Bytes>,
    pub context: ExecutionContext,
}

impl HttpRequest {
    /// Request without a body and with a fresh context.
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            body: None,
            context: ExecutionContext::new(),
        }
    }

    /// Attaches a JSON body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Replaces the execution context.
    pub fn with_context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }
}

/// Response as seen by the policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: Option<String>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Empty response with the given status.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            reason: None,
            body: Bytes::new(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Whether an outcome counts as a failure that retry, circuit breaker and
/// fallback react to: a handled [`PolicyError`] or a non-2xx response.
pub fn is_handled_failure(result: &HttpResult) -> bool {
    match result {
        Ok(response) => !response.is_success(),
        Err(err) => err.is_handled(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn methods_parse_case_insensitively() {
        assert_eq!("get".parse::<HttpMethod>(), Ok(HttpMethod::Get));
        assert_eq!("Options".parse::<HttpMethod>(), Ok(HttpMethod::Options));
        assert_eq!(" TRACE ".parse::<HttpMethod>(), Ok(HttpMethod::Trace));
        assert_eq!(
            "PATCH".parse::<HttpMethod>(),
            Err(UnsupportedMethod("PATCH".to_string()))
        );
        assert!(HttpMethod::Post.carries_body());
        assert!(!HttpMethod::Delete.carries_body());
    }

    #[test]
    fn success_range() {
        assert!(HttpResponse::new(200).is_success());
        assert!(HttpResponse::new(299).is_success());
        assert!(!HttpResponse::new(199).is_success());
        assert!(!HttpResponse::new(300).is_success());
        assert!(!HttpResponse::new(503).is_success());
    }

    #[test]
    fn handled_failures() {
        assert!(!is_handled_failure(&Ok(HttpResponse::new(204))));
        assert!(is_handled_failure(&Ok(HttpResponse::new(500))));
        assert!(is_handled_failure(&Err(PolicyError::transport("reset"))));
        assert!(!is_handled_failure(&Err(PolicyError::Cancelled)));
    }

    #[test]
    fn contexts_are_unique_per_call() {
        let a = ExecutionContext::new();
        let b = ExecutionContext::new().with_cache_key("users");
        assert_ne!(a.operation_id(), b.operation_id());
        assert_eq!(a.cache_key(), None);
        assert_eq!(b.cache_key(), Some("users"));
    }
}
