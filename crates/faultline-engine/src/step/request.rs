use super::{ParallelOptions, Step, StepKind};
use crate::error::EntryKind;
use crate::http::HttpClientFactory;
use crate::payload;
use crate::status::{ExecutionStatus, GroupClause};
use crate::EngineError;
use bytes::Bytes;
use faultline_core::{
    ExecutionContext, HttpMethod, HttpRequest, HttpResponse, Policy, PolicyError,
};
use futures::future::BoxFuture;
use serde::Deserialize;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tower::ServiceExt;
use url::Url;

/// How a request step derives the cache key from its `cacheId`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CacheUniqueness {
    /// Every call shares the `cacheId` key.
    #[default]
    #[serde(alias = "Shared")]
    Shared,
    /// Each call gets its own key, `cacheId` plus the operation id.
    #[serde(alias = "PerCall", alias = "percall")]
    PerCall,
}

/// `{ clientName, path, method, payloadSize, reuseHttpMessageHandler,
/// asynchronous, cacheId?, cacheUniqueness? }`
///
/// Values are checked when the step runs, not when it is loaded.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestConfig {
    pub client_name: String,
    /// Relative to the client's base address.
    pub path: String,
    pub method: String,
    /// Approximate JSON body size for PUT and POST.
    pub payload_size: i64,
    /// Send through the shared, policy-carrying client pipeline instead of
    /// a private client wrapped by this step.
    pub reuse_http_message_handler: bool,
    /// Report success immediately and let the call finish in the background.
    pub asynchronous: bool,
    pub cache_id: Option<String>,
    pub cache_uniqueness: CacheUniqueness,
    #[serde(flatten)]
    pub parallel: ParallelOptions,
}

enum Binding {
    Pooled(Arc<dyn HttpClientFactory>),
    Owned {
        factory: Arc<dyn HttpClientFactory>,
        policy: Option<Policy>,
    },
}

/// Calls a named client and reports whether it answered with a 2xx.
///
/// The step must be given exactly one client factory before it runs:
/// [`configure_pooled`](Self::configure_pooled) when
/// `reuseHttpMessageHandler` is set, otherwise
/// [`configure_owned`](Self::configure_owned).
pub struct RequestStep {
    name: String,
    config: RequestConfig,
    binding: OnceLock<Binding>,
}

struct Call {
    method: HttpMethod,
    body: Option<Bytes>,
}

/// `//host` and `\\host` name another authority once joined.
fn is_protocol_relative(path: &str) -> bool {
    let mut lead = path.chars();
    matches!(
        (lead.next(), lead.next()),
        (Some('/' | '\\'), Some('/' | '\\'))
    )
}

impl RequestStep {
    pub fn new(name: &str, config: RequestConfig) -> Self {
        Self {
            name: name.to_string(),
            config,
            binding: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    pub fn client_name(&self) -> &str {
        &self.config.client_name
    }

    pub fn reuses_handler(&self) -> bool {
        self.config.reuse_http_message_handler
    }

    pub fn is_configured(&self) -> bool {
        self.binding.get().is_some()
    }

    /// Sends through `factory`, whose clients already carry their policies.
    pub fn configure_pooled(&self, factory: Arc<dyn HttpClientFactory>) -> Result<(), EngineError> {
        if !self.reuses_handler() {
            return Err(self.mode_mismatch());
        }
        self.bind(Binding::Pooled(factory))
    }

    /// Sends through a client from `factory`, wrapped in `policy`.
    pub fn configure_owned(
        &self,
        factory: Arc<dyn HttpClientFactory>,
        policy: Option<Policy>,
    ) -> Result<(), EngineError> {
        if self.reuses_handler() {
            return Err(self.mode_mismatch());
        }
        self.bind(Binding::Owned { factory, policy })
    }

    fn bind(&self, binding: Binding) -> Result<(), EngineError> {
        self.binding
            .set(binding)
            .map_err(|_| EngineError::AlreadyConfigured(self.name.clone()))
    }

    fn mode_mismatch(&self) -> EngineError {
        EngineError::ReuseModeMismatch {
            step: self.name.clone(),
            reuse: self.reuses_handler(),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> EngineError {
        EngineError::invalid(EntryKind::Step, &self.name, reason)
    }

    fn validate(&self) -> Result<Call, EngineError> {
        if self.config.client_name.trim().is_empty() {
            return Err(self.invalid("clientName must not be blank"));
        }
        if is_protocol_relative(&self.config.path) {
            return Err(self.invalid(format!(
                "path '{}' must be relative to the client's base address",
                self.config.path
            )));
        }
        match Url::parse(&self.config.path) {
            Err(url::ParseError::RelativeUrlWithoutBase) => {}
            Ok(_) => {
                return Err(self.invalid(format!(
                    "path '{}' must be relative to the client's base address",
                    self.config.path
                )))
            }
            Err(err) => {
                return Err(self.invalid(format!("path '{}' is not a URI: {err}", self.config.path)))
            }
        }
        let method = self
            .config
            .method
            .parse::<HttpMethod>()
            .map_err(|err| self.invalid(err.to_string()))?;
        let payload_size = usize::try_from(self.config.payload_size).map_err(|_| {
            self.invalid(format!(
                "payloadSize must not be negative, got {}",
                self.config.payload_size
            ))
        })?;
        let body = if method.carries_body() {
            let payload = payload::generate(payload_size).map_err(|err| {
                self.invalid(format!("payloadSize {payload_size} cannot be allocated: {err}"))
            })?;
            Some(payload)
        } else {
            None
        };
        Ok(Call { method, body })
    }

    fn context(&self) -> ExecutionContext {
        let context = ExecutionContext::new();
        match (&self.config.cache_id, self.config.cache_uniqueness) {
            (Some(id), CacheUniqueness::Shared) => context.with_cache_key(id.clone()),
            (Some(id), CacheUniqueness::PerCall) => {
                let key = format!("{id}-{}", context.operation_id());
                context.with_cache_key(key)
            }
            (None, _) => context,
        }
    }

    async fn run(&self) -> Result<ExecutionStatus, EngineError> {
        let call = self.validate()?;
        let binding = self
            .binding
            .get()
            .ok_or_else(|| EngineError::NotConfigured(self.name.clone()))?;

        let (service, client) = match binding {
            Binding::Pooled(factory) => {
                let client = factory.create_client(&self.config.client_name)?;
                (client.service(), client)
            }
            Binding::Owned { factory, policy } => {
                let client = factory.create_client(&self.config.client_name)?;
                let raw = client.service();
                let service = match policy {
                    Some(policy) => policy.wrap(raw),
                    None => raw,
                };
                (service, client)
            }
        };

        let url = client
            .url_for(&self.config.path)
            .map_err(|err| self.invalid(format!("path '{}': {err}", self.config.path)))?;
        if url.origin() != client.base_address().origin() {
            return Err(self.invalid(format!(
                "path '{}' leaves the base address {}",
                self.config.path,
                client.base_address()
            )));
        }
        let mut request = HttpRequest::new(call.method, url).with_context(self.context());
        if let Some(body) = call.body {
            request = request.with_body(body);
        }

        let operation_id = request.context.operation_id();
        tracing::debug!(
            step = %self.name,
            client = %client.name(),
            method = %call.method,
            url = %request.url,
            %operation_id,
            "Sending request"
        );

        let pending = service.oneshot(request);

        if self.config.asynchronous {
            let step = self.name.clone();
            tokio::spawn(async move {
                let outcome = pending.await;
                if let Some(reason) = failure(&outcome) {
                    tracing::warn!(%step, %operation_id, %reason, "Background request failed");
                }
            });
            return Ok(ExecutionStatus::Success);
        }

        let outcome = pending.await;
        Ok(match failure(&outcome) {
            None => ExecutionStatus::Success,
            Some(reason) => {
                tracing::warn!(step = %self.name, %operation_id, %reason, "Request failed");
                ExecutionStatus::Fail
            }
        })
    }
}

/// Why an outcome counts as a failed call, if it does.
fn failure(outcome: &Result<HttpResponse, PolicyError>) -> Option<String> {
    match outcome {
        Ok(response) if response.is_success() => None,
        Ok(response) => Some(format!("status {}", response.status)),
        Err(err) => Some(err.to_string()),
    }
}

impl fmt::Debug for RequestStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestStep")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl Step for RequestStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StepKind {
        StepKind::Request
    }

    fn parallel_count(&self) -> Option<u32> {
        self.config.parallel.parallel_count()
    }

    fn fail_on_parallel_failures(&self) -> GroupClause {
        self.config.parallel.fail_on_parallel_failures()
    }

    fn execute(&self) -> BoxFuture<'_, Result<ExecutionStatus, EngineError>> {
        Box::pin(self.run())
    }

    fn as_request_step(&self) -> Option<&RequestStep> {
        Some(self)
    }
}
