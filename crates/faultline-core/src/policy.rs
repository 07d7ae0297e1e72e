//! Compiled, composable policies.
//!
//! A [`Policy`] is a type-erased tower [`Layer`] over [`HttpService`]. Every
//! policy crate produces a concrete layer; [`Policy::from_layer`] erases it so
//! that policies read from configuration can be stored by name and stacked in
//! whatever order a client lists them.
//!
//! ```rust
//! use faultline_core::{HttpRequest, HttpResponse, HttpService, Policy, PolicyError};
//! use tower::{service_fn, Layer};
//! use tower::util::BoxCloneService;
//!
//! let passthrough = Policy::from_layer("noop", tower::layer::util::Identity::new());
//! let inner: HttpService = BoxCloneService::new(service_fn(|_req: HttpRequest| async {
//!     Ok::<_, PolicyError>(HttpResponse::new(200))
//! }));
//! let _svc = passthrough.layer(inner);
//! ```

use std::fmt;
use std::sync::Arc;
use tower::util::BoxCloneService;
use tower::{Layer, Service};

use crate::{HttpRequest, HttpResponse, PolicyError};

/// The service shape every policy wraps and produces.
pub type HttpService = BoxCloneService<HttpRequest, HttpResponse, PolicyError>;

type WrapFn = dyn Fn(HttpService) -> HttpService + Send + Sync;

/// A named executable policy.
///
/// Cloning is cheap and clones share the underlying layer, so stateful
/// policies (circuit breaker, bulkhead, cache) keep one state no matter how
/// many services they wrap.
#[derive(Clone)]
pub struct Policy {
    name: Arc<str>,
    wrap: Arc<WrapFn>,
}

impl Policy {
    /// Erases a concrete policy layer.
    pub fn from_layer<L>(name: impl Into<String>, layer: L) -> Self
    where
        L: Layer<HttpService> + Send + Sync + 'static,
        L::Service: Service<HttpRequest, Response = HttpResponse, Error = PolicyError>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<HttpRequest>>::Future: Send + 'static,
    {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            wrap: Arc::new(move |inner: HttpService| BoxCloneService::new(layer.layer(inner))),
        }
    }

    /// Combines `policies` into one, the first entry outermost.
    ///
    /// Returns `None` for an empty list and the policy itself for a single
    /// entry.
    pub fn wrap_all(name: impl Into<String>, mut policies: Vec<Policy>) -> Option<Policy> {
        match policies.len() {
            0 => None,
            1 => policies.pop(),
            _ => {
                let name: String = name.into();
                let chain: Arc<[Policy]> = Arc::from(policies);
                Some(Self {
                    name: Arc::from(name),
                    wrap: Arc::new(move |inner: HttpService| {
                        chain.iter().rev().fold(inner, |svc, policy| policy.wrap(svc))
                    }),
                })
            }
        }
    }

    /// Wraps `inner` with this policy.
    pub fn wrap(&self, inner: HttpService) -> HttpService {
        (self.wrap)(inner)
    }

    /// Name the policy was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Layer<HttpService> for Policy {
    type Service = HttpService;

    fn layer(&self, inner: HttpService) -> Self::Service {
        self.wrap(inner)
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policy").field("name", &self.name).finish()
    }
}
