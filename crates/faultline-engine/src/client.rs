//! Named outbound HTTP clients.

use crate::error::EntryKind;
use crate::EngineError;
use serde::Deserialize;
use std::collections::BTreeMap;
use url::Url;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientSettings {
    base_address: String,
    #[serde(default, alias = "headers")]
    request_headers: BTreeMap<String, Option<String>>,
    #[serde(default)]
    policies: Option<Vec<Option<String>>>,
}

/// A validated client registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    name: String,
    base_address: Url,
    headers: Vec<(String, String)>,
    policies: Option<Vec<Option<String>>>,
}

impl ClientConfig {
    /// Creates a client with no headers and an empty policy list.
    ///
    /// The base address must be an absolute `http` or `https` URI.
    pub fn new(name: impl Into<String>, base_address: &str) -> Result<Self, EngineError> {
        let name = name.into();
        let base_address = parse_base_address(&name, base_address)?;
        Ok(Self {
            name,
            base_address,
            headers: Vec::new(),
            policies: Some(Vec::new()),
        })
    }

    /// Adds a header sent with every request. `None` sends it empty.
    pub fn with_header(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.headers.push((name.into(), value.unwrap_or_default()));
        self
    }

    /// Replaces the policy list. `None` models a client configured without
    /// one, which wiring rejects.
    pub fn with_policies(mut self, policies: Option<Vec<Option<String>>>) -> Self {
        self.policies = policies;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base address; its path always ends with `/` so relative paths
    /// resolve beneath it.
    pub fn base_address(&self) -> &Url {
        &self.base_address
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Policy names, outermost first.
    pub fn policies(&self) -> Option<&[Option<String>]> {
        self.policies.as_deref()
    }
}

fn parse_base_address(client: &str, raw: &str) -> Result<Url, EngineError> {
    let mut url = Url::parse(raw.trim()).map_err(|err| {
        EngineError::invalid(
            EntryKind::Client,
            client,
            format!("baseAddress '{raw}' is not an absolute URI: {err}"),
        )
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(EngineError::invalid(
            EntryKind::Client,
            client,
            format!("baseAddress '{raw}' must use http or https"),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Builds client registrations from raw configuration entries.
pub trait ClientFactory: Send + Sync {
    /// `Ok(None)` marks a malformed entry; errors are fatal.
    fn create(&self, name: &str, raw: &str) -> Result<Option<ClientConfig>, EngineError>;
}

/// Reads `{ baseAddress, requestHeaders, policies }` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClientFactory;

impl ClientFactory for DefaultClientFactory {
    fn create(&self, name: &str, raw: &str) -> Result<Option<ClientConfig>, EngineError> {
        crate::error::ensure_not_blank(name, "client name")?;

        let settings: ClientSettings = match serde_json::from_str(raw) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!(client = %name, error = %err, "Ignoring malformed client configuration");
                return Ok(None);
            }
        };

        let mut config = ClientConfig::new(name, &settings.base_address)?
            .with_policies(settings.policies);
        for (header, value) in settings.request_headers {
            config = config.with_header(header, value);
        }
        Ok(Some(config))
    }
}
