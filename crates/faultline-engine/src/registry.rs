//! Name → instance lookup built once from configuration.

use crate::client::{ClientConfig, ClientFactory, DefaultClientFactory};
use crate::error::{ensure_not_blank, EntryKind};
use crate::http::{HttpClientFactory, ReqwestClientFactory};
use crate::processor::{DefaultProcessorFactory, Processor, ProcessorFactory};
use crate::source::{ConfigurationSource, Section};
use crate::step::{DefaultStepFactory, Step, StepFactory};
use crate::EngineError;
use faultline_core::Policy;
use faultline_policy::{DefaultPolicyFactory, PolicyFactory};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The four factories a [`Registry`] reads configuration through.
#[derive(Clone)]
pub struct Factories {
    pub steps: Arc<dyn StepFactory>,
    pub processors: Arc<dyn ProcessorFactory>,
    pub policies: Arc<dyn PolicyFactory>,
    pub clients: Arc<dyn ClientFactory>,
}

impl Default for Factories {
    fn default() -> Self {
        Self {
            steps: Arc::new(DefaultStepFactory::new()),
            processors: Arc::new(DefaultProcessorFactory),
            policies: Arc::new(DefaultPolicyFactory::new()),
            clients: Arc::new(DefaultClientFactory),
        }
    }
}

impl Factories {
    /// Default factories whose error steps and retry jitter draw from
    /// seeded generators unless an entry sets its own seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            steps: Arc::new(DefaultStepFactory::with_seed(seed)),
            policies: Arc::new(DefaultPolicyFactory::with_seed(seed)),
            ..Self::default()
        }
    }
}

/// Named entries in registration order. `None` marks an entry whose
/// configuration was malformed.
struct Table<T> {
    index: HashMap<String, usize>,
    entries: Vec<(String, Option<T>)>,
}

impl<T> Table<T> {
    fn load(
        source: &dyn ConfigurationSource,
        section: Section,
        mut create: impl FnMut(&str, &str) -> Result<Option<T>, EngineError>,
    ) -> Result<Self, EngineError> {
        let raw_entries = source
            .section(section)
            .ok_or(EngineError::MissingSection(section))?;

        let mut table = Self {
            index: HashMap::with_capacity(raw_entries.len()),
            entries: Vec::with_capacity(raw_entries.len()),
        };
        for (name, raw) in raw_entries {
            let entry = create(&name, &raw)?;
            match table.index.get(&name) {
                Some(&at) => table.entries[at].1 = entry,
                None => {
                    table.index.insert(name.clone(), table.entries.len());
                    table.entries.push((name, entry));
                }
            }
        }
        Ok(table)
    }

    fn get(&self, kind: EntryKind, name: &str) -> Result<&T, EngineError> {
        ensure_not_blank(name, blank_name(kind))?;
        self.index
            .get(name)
            .and_then(|&at| self.entries[at].1.as_ref())
            .ok_or_else(|| EngineError::not_found(kind, name))
    }

    fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().filter_map(|(_, entry)| entry.as_ref())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }
}

fn blank_name(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Step => "step name",
        EntryKind::Processor => "processor name",
        EntryKind::Policy => "policy name",
        EntryKind::Client => "client name",
    }
}

/// Steps, processors, policies and clients by name.
///
/// Built once by [`Registry::new`] and read-only afterwards, apart from the
/// one-time client binding done by [`Registry::configure_http_clients`].
/// Policies are shared: every client listing the same policy name shares
/// one circuit, one bulkhead and one cache.
pub struct Registry {
    steps: Table<Arc<dyn Step>>,
    processors: Table<Arc<Processor>>,
    policies: Table<Policy>,
    clients: Table<Arc<ClientConfig>>,
}

impl Registry {
    /// Reads all four sections. A missing section is fatal, an empty one is
    /// not. Malformed entries are kept as null registrations and only fail
    /// when looked up.
    pub fn new(source: &dyn ConfigurationSource, factories: &Factories) -> Result<Self, EngineError> {
        let processors = Table::load(source, Section::Processors, |name, raw| {
            Ok(factories.processors.create(name, raw)?.map(Arc::new))
        })?;
        let steps = Table::load(source, Section::Steps, |name, raw| {
            factories.steps.create(name, raw)
        })?;
        let policies = Table::load(source, Section::Policies, |name, raw| {
            Ok(factories.policies.create(name, raw)?)
        })?;
        let clients = Table::load(source, Section::Clients, |name, raw| {
            Ok(factories.clients.create(name, raw)?.map(Arc::new))
        })?;

        tracing::info!(
            processors = processors.len(),
            steps = steps.len(),
            policies = policies.len(),
            clients = clients.len(),
            "Registry loaded"
        );

        Ok(Self {
            steps,
            processors,
            policies,
            clients,
        })
    }

    pub fn get_step(&self, name: &str) -> Result<Arc<dyn Step>, EngineError> {
        self.steps.get(EntryKind::Step, name).cloned()
    }

    /// Looks a processor up. With `require_request`, startup processors are
    /// rejected.
    pub fn get_processor(&self, name: &str, require_request: bool) -> Result<Arc<Processor>, EngineError> {
        let processor = self.processors.get(EntryKind::Processor, name)?;
        if require_request && !processor.is_request() {
            return Err(EngineError::NotRequestProcessor(name.to_string()));
        }
        Ok(Arc::clone(processor))
    }

    pub fn get_policy(&self, name: &str) -> Result<Policy, EngineError> {
        self.policies.get(EntryKind::Policy, name).cloned()
    }

    pub fn get_client(&self, name: &str) -> Result<Arc<ClientConfig>, EngineError> {
        self.clients.get(EntryKind::Client, name).cloned()
    }

    /// Startup processors in registration order.
    pub fn startup_processors(&self) -> Vec<Arc<Processor>> {
        self.processors
            .values()
            .filter(|processor| processor.is_startup())
            .cloned()
            .collect()
    }

    /// The policy stack of a client, first listed outermost.
    ///
    /// Fails when the client has no policy list, lists a null entry or names
    /// an unknown policy.
    pub fn client_policy(&self, client: &ClientConfig) -> Result<Option<Policy>, EngineError> {
        let names = client
            .policies()
            .ok_or_else(|| EngineError::MissingClientPolicies(client.name().to_string()))?;

        let policies = names
            .iter()
            .map(|name| match name {
                Some(name) => self.get_policy(name),
                None => Err(EngineError::invalid(
                    EntryKind::Client,
                    client.name(),
                    "policy list contains a null entry",
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Policy::wrap_all(format!("{}-policies", client.name()), policies))
    }

    /// A pooled reqwest factory serving every registered client with its
    /// policy stack inside the client pipeline.
    pub fn pooled_client_factory(&self) -> Result<ReqwestClientFactory, EngineError> {
        let mut factory = ReqwestClientFactory::pooled()?;
        for client in self.clients.values() {
            factory.register(Arc::clone(client), self.client_policy(client)?)?;
        }
        Ok(factory)
    }

    fn non_pooled_client_factory(&self) -> Result<ReqwestClientFactory, EngineError> {
        let mut factory = ReqwestClientFactory::non_pooled()?;
        for client in self.clients.values() {
            factory.register(Arc::clone(client), None)?;
        }
        Ok(factory)
    }

    /// Binds every request step to an HTTP client factory.
    ///
    /// Steps reusing handlers get `pooled` as is. Every other step gets a
    /// fresh non-pooling reqwest factory plus its client's composed policy.
    pub fn configure_http_clients(&self, pooled: Arc<dyn HttpClientFactory>) -> Result<(), EngineError> {
        let owned_steps = self
            .steps
            .values()
            .filter_map(|step| step.as_request_step())
            .any(|step| !step.reuses_handler());

        if owned_steps {
            let non_pooled: Arc<dyn HttpClientFactory> = Arc::new(self.non_pooled_client_factory()?);
            self.configure_http_clients_with(pooled, non_pooled)
        } else {
            self.configure_http_clients_with(pooled, Arc::new(Unused))
        }
    }

    /// Like [`configure_http_clients`](Self::configure_http_clients) with an
    /// explicit non-pooling factory.
    ///
    /// Stops at the first failure. Steps bound before it stay bound.
    pub fn configure_http_clients_with(
        &self,
        pooled: Arc<dyn HttpClientFactory>,
        non_pooled: Arc<dyn HttpClientFactory>,
    ) -> Result<(), EngineError> {
        for step in self.steps.values() {
            let Some(request) = step.as_request_step() else {
                continue;
            };

            if request.reuses_handler() {
                request.configure_pooled(Arc::clone(&pooled))?;
            } else {
                let client = self.get_client(request.client_name())?;
                let policy = self.client_policy(&client)?;
                request.configure_owned(Arc::clone(&non_pooled), policy)?;
            }
            tracing::debug!(
                step = %request.name(),
                client = %request.client_name(),
                pooled = request.reuses_handler(),
                "Configured request step"
            );
        }
        Ok(())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("processors", &self.processors.names())
            .field("steps", &self.steps.names())
            .field("policies", &self.policies.names())
            .field("clients", &self.clients.names())
            .finish()
    }
}

/// Stands in for the non-pooling factory when every request step reuses
/// handlers.
struct Unused;

impl HttpClientFactory for Unused {
    fn create_client(&self, name: &str) -> Result<crate::http::HttpClient, EngineError> {
        Err(EngineError::not_found(EntryKind::Client, name))
    }
}
