//! # Dispatcher Module
//!
//! The dispatcher runs the request pipeline: it resolves the route, checks
//! the method and the session, parses content, binds arguments, calls the
//! operation on its service instance and renders the result.
//!
//! ## Request Flow
//!
//! 1. Path, method and content type are normalized
//! 2. The route is looked up by path; its method and `secured` flag are checked
//! 3. The body and query are parsed by the content reader
//! 4. The service instance is fetched from the [`ServiceLocator`], the
//!    route's binders produce the arguments and the operation is called
//! 5. The returned result is rendered by the renderer for its variant
//!
//! ## Error Handling
//!
//! - Every failure is answered with `400 Bad Request` and a localized
//!   message as `text/plain`
//! - Routing, content and contract failures carry their own message code
//! - Handler failures are reduced to the innermost error in their chain
//! - Handler panics are caught and reported as `application.handler.panic`
//!
//! ## Example
//!
//! ```rust
//! use routegate::config::Settings;
//! use routegate::dispatcher::Dispatcher;
//! use routegate::messages::Messages;
//! use routegate::render::JsonResult;
//! use routegate::router::{Operation, RouteRegistry};
//! use routegate::server::Request;
//! use routegate::service::{HttpService, ServiceDeclaration, ServiceRegistry};
//! use std::sync::Arc;
//!
//! struct Health;
//!
//! impl HttpService for Health {
//!     fn operations() -> Vec<Operation<Self>> {
//!         vec![Operation::get("/health").handle0(|_: &Health| {
//!             Ok(JsonResult::ok(serde_json::json!({"up": true})))
//!         })]
//!     }
//! }
//!
//! let registry = RouteRegistry::from_services([ServiceDeclaration::of::<Health>()]);
//! let dispatcher = Dispatcher::new(
//!     Arc::new(registry),
//!     Arc::new(ServiceRegistry::new().with(Health)),
//!     Arc::new(Messages::new("en")),
//!     Arc::new(Settings::default()),
//! );
//!
//! let response = dispatcher.dispatch(&Request::new("GET", "/Health/"));
//! assert_eq!(response.status.as_u16(), 200);
//! assert_eq!(response.body_str(), Some(r#"{"up":true}"#));
//! ```
//!
//! [`ServiceLocator`]: crate::service::ServiceLocator

mod core;

pub use core::{DispatchFailure, Dispatcher, FAILURE_STATUS};
