//! HTTP client factories.
//!
//! A [`HttpClientFactory`] hands out [`HttpClient`]s by client name. The
//! reqwest-backed factory comes in two flavours:
//!
//! - pooled: one connection pool shared by every client, with each client's
//!   policies already applied inside the returned service
//! - non-pooled: idle connections are never kept, and no policies are
//!   applied (the request step wraps the service itself)

use crate::client::ClientConfig;
use crate::error::EntryKind;
use crate::EngineError;
use faultline_core::{HttpMethod, HttpRequest, HttpResponse, HttpService, Policy, PolicyError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tower::service_fn;
use tower::util::BoxCloneService;
use url::Url;

/// A named client: where requests go and the service that sends them.
#[derive(Clone)]
pub struct HttpClient {
    name: Arc<str>,
    base_address: Url,
    service: HttpService,
}

impl HttpClient {
    pub fn new(name: &str, base_address: Url, service: HttpService) -> Self {
        Self {
            name: Arc::from(name),
            base_address,
            service,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_address(&self) -> &Url {
        &self.base_address
    }

    /// Resolves a relative path against the base address.
    pub fn url_for(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_address.join(path)
    }

    pub fn service(&self) -> HttpService {
        self.service.clone()
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("name", &self.name)
            .field("base_address", &self.base_address.as_str())
            .finish_non_exhaustive()
    }
}

/// Hands out HTTP clients by name.
pub trait HttpClientFactory: Send + Sync {
    fn create_client(&self, name: &str) -> Result<HttpClient, EngineError>;
}

struct ClientEntry {
    config: Arc<ClientConfig>,
    headers: HeaderMap,
    policy: Option<Policy>,
}

/// [`HttpClientFactory`] over a shared [`reqwest::Client`].
pub struct ReqwestClientFactory {
    client: reqwest::Client,
    pooled: bool,
    clients: HashMap<String, ClientEntry>,
}

impl ReqwestClientFactory {
    /// A factory whose clients share one connection pool.
    pub fn pooled() -> Result<Self, EngineError> {
        Self::build(reqwest::Client::builder(), true)
    }

    /// A factory that never reuses idle connections.
    pub fn non_pooled() -> Result<Self, EngineError> {
        Self::build(reqwest::Client::builder().pool_max_idle_per_host(0), false)
    }

    fn build(builder: reqwest::ClientBuilder, pooled: bool) -> Result<Self, EngineError> {
        let client = builder
            .build()
            .map_err(|err| EngineError::HttpClient(err.to_string()))?;
        Ok(Self {
            client,
            pooled,
            clients: HashMap::new(),
        })
    }

    /// Registers a client. `policy` wraps every call made through it.
    pub fn register(
        &mut self,
        config: Arc<ClientConfig>,
        policy: Option<Policy>,
    ) -> Result<(), EngineError> {
        let mut headers = HeaderMap::new();
        for (name, value) in config.headers() {
            let header = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                EngineError::invalid(EntryKind::Client, config.name(), format!("header '{name}': {err}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|err| {
                EngineError::invalid(EntryKind::Client, config.name(), format!("header '{name}': {err}"))
            })?;
            headers.append(header, value);
        }

        self.clients.insert(
            config.name().to_string(),
            ClientEntry {
                config,
                headers,
                policy,
            },
        );
        Ok(())
    }

    pub fn is_pooled(&self) -> bool {
        self.pooled
    }
}

impl HttpClientFactory for ReqwestClientFactory {
    fn create_client(&self, name: &str) -> Result<HttpClient, EngineError> {
        let entry = self
            .clients
            .get(name)
            .ok_or_else(|| EngineError::not_found(EntryKind::Client, name))?;

        let transport = transport(self.client.clone(), entry.headers.clone());
        let service = match &entry.policy {
            Some(policy) => policy.wrap(transport),
            None => transport,
        };
        Ok(HttpClient::new(
            name,
            entry.config.base_address().clone(),
            service,
        ))
    }
}

impl fmt::Debug for ReqwestClientFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.clients.keys().collect();
        names.sort();
        f.debug_struct("ReqwestClientFactory")
            .field("pooled", &self.pooled)
            .field("clients", &names)
            .finish()
    }
}

fn transport(client: reqwest::Client, headers: HeaderMap) -> HttpService {
    BoxCloneService::new(service_fn(move |req: HttpRequest| {
        send(client.clone(), headers.clone(), req)
    }))
}

fn method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Options => reqwest::Method::OPTIONS,
        HttpMethod::Trace => reqwest::Method::TRACE,
    }
}

async fn send(
    client: reqwest::Client,
    headers: HeaderMap,
    req: HttpRequest,
) -> Result<HttpResponse, PolicyError> {
    let mut builder = client
        .request(method(req.method), req.url)
        .headers(headers);
    if let Some(body) = req.body {
        builder = builder
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body);
    }

    let response = builder.send().await.map_err(PolicyError::transport)?;
    let status = response.status();
    let body = response.bytes().await.map_err(PolicyError::transport)?;

    let mut converted = HttpResponse::new(status.as_u16()).with_body(body);
    if let Some(reason) = status.canonical_reason() {
        converted = converted.with_reason(reason);
    }
    Ok(converted)
}
