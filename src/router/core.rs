use super::operation::Invoker;
use crate::content::ParamDescriptor;
use crate::render::ReturnKind;
use crate::service::{ServiceDeclaration, ServiceId};
use http::Method;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An immutable binding from a normalized path to one operation.
#[derive(Debug)]
pub struct Route {
    path: String,
    declared_path: String,
    method: Method,
    secured: bool,
    service: ServiceId,
    returns: ReturnKind,
    invoker: Invoker,
}

impl Route {
    pub(crate) fn new(
        path: String,
        declared_path: String,
        method: Method,
        secured: bool,
        service: ServiceId,
        returns: ReturnKind,
        invoker: Invoker,
    ) -> Self {
        Self {
            path,
            declared_path,
            method,
            secured,
            service,
            returns,
            invoker,
        }
    }

    /// Normalized path, the registry key
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path as written in the operation declaration
    #[must_use]
    pub fn declared_path(&self) -> &str {
        &self.declared_path
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn secured(&self) -> bool {
        self.secured
    }

    #[must_use]
    pub fn service(&self) -> ServiceId {
        self.service
    }

    #[must_use]
    pub fn returns(&self) -> ReturnKind {
        self.returns
    }

    #[must_use]
    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.invoker.arity()
    }

    #[must_use]
    pub fn params(&self) -> Vec<&ParamDescriptor> {
        self.invoker.params()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{} {} -> {}(", self.method, path, self.service)?;
        match &self.invoker {
            Invoker::Unsupported { arity } => write!(f, "<{arity} unbindable>")?,
            _ => {
                for (index, param) in self.params().iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
            }
        }
        f.write_str(")")?;
        if self.returns == ReturnKind::Void {
            f.write_str(" -> ()")?;
        }
        if self.secured {
            f.write_str(" [secured]")?;
        }
        Ok(())
    }
}

/// Non-fatal problem found while registering routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// A second operation normalized to an already registered path. The
    /// first registration is kept.
    DuplicatePath {
        path: String,
        existing: ServiceId,
        rejected: ServiceId,
    },
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::DuplicatePath {
                path,
                existing,
                rejected,
            } => write!(
                f,
                "duplicate route path '{path}': already registered by {existing}, skipped for {rejected}"
            ),
        }
    }
}

impl std::error::Error for RegistrationError {}

/// Routes keyed by normalized path.
///
/// Built once at startup and read-only afterwards, so it can be shared by
/// every request unit through an `Arc` without locking.
#[derive(Default)]
pub struct RouteRegistry {
    routes: HashMap<String, Arc<Route>>,
}

impl RouteRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `services`, discarding registration errors
    /// after they have been logged.
    #[must_use]
    pub fn from_services<I>(services: I) -> Self
    where
        I: IntoIterator<Item = ServiceDeclaration>,
    {
        let mut registry = Self::new();
        let _errors = registry.register(services);
        registry
    }

    /// Register every operation of every service.
    ///
    /// Path collisions do not stop registration: the later route is skipped
    /// and reported, everything else is registered.
    pub fn register<I>(&mut self, services: I) -> Vec<RegistrationError>
    where
        I: IntoIterator<Item = ServiceDeclaration>,
    {
        let mut errors = Vec::new();
        let mut service_count = 0usize;
        for declaration in services {
            service_count += 1;
            for route in declaration.into_routes() {
                if let Err(err) = self.insert(route) {
                    errors.push(err);
                }
            }
        }

        info!(
            services_count = service_count,
            routes_count = self.routes.len(),
            errors_count = errors.len(),
            "Route registry loaded"
        );
        debug!(routes = %self, "Registered routes");
        errors
    }

    /// Add a single route.
    pub fn insert(&mut self, route: Route) -> Result<(), RegistrationError> {
        if let Some(existing) = self.routes.get(route.path()) {
            let err = RegistrationError::DuplicatePath {
                path: route.path().to_string(),
                existing: existing.service(),
                rejected: route.service(),
            };
            warn!(
                path = %route.path(),
                declared_path = %route.declared_path(),
                existing_service = %existing.service(),
                rejected_service = %route.service(),
                "Duplicate route path skipped"
            );
            return Err(err);
        }
        self.routes.insert(route.path().to_string(), Arc::new(route));
        Ok(())
    }

    /// Look up a route by already normalized path.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<Arc<Route>> {
        self.routes.get(path).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes sorted by path.
    #[must_use]
    pub fn routes(&self) -> Vec<Arc<Route>> {
        let mut routes: Vec<Arc<Route>> = self.routes.values().map(Arc::clone).collect();
        routes.sort_by(|a, b| a.path().cmp(b.path()));
        routes
    }
}

impl fmt::Display for RouteRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for route in self.routes() {
            writeln!(f, "{route}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for RouteRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRegistry")
            .field("routes", &self.routes())
            .finish()
    }
}
