//! # routegate
//!
//! **routegate** is a request dispatch engine: it maps an inbound HTTP-shaped
//! request to an operation of a registered service, checks the request
//! against the route's contract, binds typed arguments from the request
//! content, calls the operation and renders its result.
//!
//! ## Architecture
//!
//! - **[`normalize`]** - canonical forms of path, method and content type
//! - **[`router`]** - operation declaration and the path-keyed route registry
//! - **[`service`]** - service declaration and the [`ServiceLocator`] seam
//! - **[`security`]** - session gating for `secured` routes
//! - **[`content`]** - body/query parsing and per-parameter binders
//! - **[`render`]** - JSON, CSV and plain-text result renderers
//! - **[`dispatcher`]** - the request pipeline tying the above together
//! - **[`error`]** / **[`messages`]** - coded errors, root-cause reduction and
//!   localized message resolution
//! - **[`config`]**, **[`logging`]**, **[`runtime`]** - settings, tracing
//!   setup and per-request `may` coroutines
//!
//! ### Request Handling Flow
//!
//! ```text
//! Request ─▶ normalize ─▶ registry.resolve ─▶ method? ─▶ session? ─▶ content
//!                                                                      │
//!        HttpResponse ◀── render ◀── operation(service, args…) ◀── bind
//! ```
//!
//! Any stage may stop the pipeline. Every failure is answered with
//! `400 Bad Request` and a message resolved from its code.
//!
//! ## Quick Start
//!
//! ```rust
//! use routegate::content::{body, field};
//! use routegate::render::{JsonResult, ServletResult};
//! use routegate::{
//!     Dispatcher, HttpService, Messages, Operation, Request, RouteRegistry, ServiceDeclaration,
//!     ServiceRegistry, Settings,
//! };
//! use serde::Deserialize;
//! use std::sync::Arc;
//!
//! #[derive(Deserialize)]
//! struct Greeting {
//!     name: String,
//! }
//!
//! struct Greeter {
//!     prefix: String,
//! }
//!
//! impl HttpService for Greeter {
//!     fn operations() -> Vec<Operation<Self>> {
//!         vec![
//!             Operation::post("/greet").handle1(body::<Greeting>(), |svc: &Greeter, g| {
//!                 Ok(JsonResult::ok(serde_json::json!({
//!                     "text": format!("{} {}", svc.prefix, g.name)
//!                 })))
//!             }),
//!             Operation::get("/shout").handle1(field::<String>("word"), |_svc: &Greeter, w| {
//!                 Ok(ServletResult::message(http::StatusCode::OK, w.to_uppercase()))
//!             }),
//!         ]
//!     }
//! }
//!
//! let registry = RouteRegistry::from_services([ServiceDeclaration::of::<Greeter>()]);
//! let services = ServiceRegistry::new().with(Greeter { prefix: "Hello".into() });
//! let dispatcher = Dispatcher::new(
//!     Arc::new(registry),
//!     Arc::new(services),
//!     Arc::new(Messages::new("en")),
//!     Arc::new(Settings::default()),
//! );
//!
//! let request = Request::new("POST", "/greet").with_json(&serde_json::json!({"name": "Ada"}));
//! let response = dispatcher.dispatch(&request);
//! assert_eq!(response.body_str(), Some(r#"{"text":"Hello Ada"}"#));
//!
//! let response = dispatcher.dispatch(&Request::new("GET", "/shout?word=hi"));
//! assert_eq!(response.body_str(), Some("HI"));
//! ```
//!
//! ## Runtime Considerations
//!
//! The dispatcher is synchronous and `Send + Sync`. It can be called from any
//! thread; [`runtime::spawn_request`] runs each request on its own `may`
//! coroutine with the stack size from `ROUTEGATE_STACK_SIZE`.

pub mod config;
pub mod content;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod messages;
pub mod normalize;
pub mod render;
pub mod router;
pub mod runtime;
pub mod security;
pub mod server;
pub mod service;

pub use config::Settings;
pub use dispatcher::{DispatchFailure, Dispatcher};
pub use error::{root_cause, root_cause_message, MessageError};
pub use messages::Messages;
pub use render::{CsvResult, HandlerResult, JsonResult, Reply, ServletResult};
pub use router::{Operation, RegistrationError, Route, RouteRegistry};
pub use server::{HttpResponse, Request};
pub use service::{HttpService, ServiceDeclaration, ServiceLocator, ServiceRegistry};
