//! # Router Module
//!
//! Routes are registered once at startup from [`HttpService`] declarations
//! and looked up per request by normalized path.
//!
//! ## Architecture
//!
//! 1. **Declaration**: each service lists its operations with the
//!    [`Operation`] builder. The handler closure's shape (0, 1 or 2 bound
//!    parameters) is captured in an [`Invoker`] variant, so nothing about the
//!    signature is inspected per request.
//!
//! 2. **Registration**: [`RouteRegistry::register`] keys every route by its
//!    normalized path. A second route on the same path is skipped and
//!    reported as a [`RegistrationError`].
//!
//! 3. **Lookup**: [`RouteRegistry::resolve`] is a single hash map lookup.
//!
//! ## Example
//!
//! ```rust
//! use routegate::content::field;
//! use routegate::render::JsonResult;
//! use routegate::router::{Operation, RouteRegistry};
//! use routegate::service::{HttpService, ServiceDeclaration};
//! use serde_json::json;
//!
//! struct Users;
//!
//! impl HttpService for Users {
//!     fn operations() -> Vec<Operation<Self>> {
//!         vec![Operation::get("/Users/Find/")
//!             .secured()
//!             .handle1(field::<u64>("id"), |_svc: &Users, id| {
//!                 Ok(JsonResult::ok(json!({ "id": id })))
//!             })]
//!     }
//! }
//!
//! let mut registry = RouteRegistry::new();
//! let errors = registry.register([ServiceDeclaration::of::<Users>()]);
//! assert!(errors.is_empty());
//! assert!(registry.resolve("/users/find").is_some());
//! ```
//!
//! [`HttpService`]: crate::service::HttpService

mod core;
mod operation;

pub use core::{RegistrationError, Route, RouteRegistry};
pub use operation::{BoundParam, Invoker, Operation, OperationBuilder};

pub(crate) use operation::Arg;
