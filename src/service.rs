//! Service instances and their declaration.
//!
//! Handler operations are methods on service types. The dispatcher never
//! constructs services itself: it asks a [`ServiceLocator`] for the instance
//! owning the matched route. [`ServiceRegistry`] is the plain map-backed
//! locator; hosts with a real container implement the trait over it.

use crate::router::{Operation, Route};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

/// Identity of a service type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceId {
    type_id: TypeId,
    name: &'static str,
}

impl ServiceId {
    #[must_use]
    pub fn of<S: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            name: std::any::type_name::<S>(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Supplies service instances to the dispatcher. Must be safe to call from
/// every request unit concurrently.
pub trait ServiceLocator: Send + Sync {
    fn get(&self, id: ServiceId) -> Option<ServiceInstance>;
}

/// A type whose methods are exposed as routes.
///
/// ```rust
/// use routegate::router::Operation;
/// use routegate::render::JsonResult;
/// use routegate::service::HttpService;
///
/// struct Ping;
///
/// impl HttpService for Ping {
///     fn operations() -> Vec<Operation<Self>> {
///         vec![Operation::get("/ping").handle0(|_svc: &Ping| {
///             Ok(JsonResult::ok(serde_json::json!({"pong": true})))
///         })]
///     }
/// }
/// ```
pub trait HttpService: Send + Sync + Sized + 'static {
    fn operations() -> Vec<Operation<Self>>;
}

/// The routes one service type contributes, ready for registration.
pub struct ServiceDeclaration {
    service: ServiceId,
    routes: Vec<Route>,
}

impl ServiceDeclaration {
    #[must_use]
    pub fn of<S: HttpService>() -> Self {
        Self {
            service: ServiceId::of::<S>(),
            routes: S::operations()
                .into_iter()
                .map(Operation::into_route)
                .collect(),
        }
    }

    #[must_use]
    pub fn service(&self) -> ServiceId {
        self.service
    }

    pub(crate) fn into_routes(self) -> Vec<Route> {
        self.routes
    }
}

/// Map-backed [`ServiceLocator`].
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: HashMap<ServiceId, ServiceInstance>,
}

impl ServiceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `service`, replacing any previous instance of the same type.
    #[must_use]
    pub fn with<S: Send + Sync + 'static>(mut self, service: S) -> Self {
        self.insert(Arc::new(service));
        self
    }

    pub fn insert<S: Send + Sync + 'static>(&mut self, service: Arc<S>) {
        self.services.insert(ServiceId::of::<S>(), service);
    }

    #[must_use]
    pub fn contains(&self, id: ServiceId) -> bool {
        self.services.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl ServiceLocator for ServiceRegistry {
    fn get(&self, id: ServiceId) -> Option<ServiceInstance> {
        self.services.get(&id).cloned()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.services.keys().map(ServiceId::name).collect();
        names.sort_unstable();
        f.debug_struct("ServiceRegistry")
            .field("services", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Alpha(u32);
    struct Beta;

    #[test]
    fn test_registry_lookup_by_type() {
        let registry = ServiceRegistry::new().with(Alpha(7));
        assert!(registry.contains(ServiceId::of::<Alpha>()));
        assert!(registry.get(ServiceId::of::<Beta>()).is_none());
        let instance = registry.get(ServiceId::of::<Alpha>()).unwrap();
        assert_eq!(instance.downcast_ref::<Alpha>().map(|a| a.0), Some(7));
    }

    #[test]
    fn test_service_id_name() {
        assert!(ServiceId::of::<Beta>().name().ends_with("Beta"));
    }
}
