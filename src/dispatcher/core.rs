use crate::config::Settings;
use crate::content::{ContentError, ContentReader, RequestContext};
use crate::error::{codes, root_cause_message_of, MessageError};
use crate::ids::RequestId;
use crate::messages::Messages;
use crate::normalize::{normalize_content_type, normalize_method, normalize_path};
use crate::render::{render_result, RenderContext, Reply, ReturnKind};
use crate::router::{Arg, Invoker, Route, RouteRegistry};
use crate::security::{RequireSessionId, SessionValidator};
use crate::server::{HttpResponse, Request, ResponseSink};
use crate::service::ServiceLocator;
use http::{Method, StatusCode};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Span};

/// Every client-visible failure uses this status.
pub const FAILURE_STATUS: StatusCode = StatusCode::BAD_REQUEST;

/// Why a dispatch ended without a rendered result.
#[derive(Debug)]
pub enum DispatchFailure {
    UnknownPath { path: String },
    MethodMismatch {
        path: String,
        method: Method,
        expected: Method,
    },
    Unauthorized { path: String },
    Content { path: String, error: ContentError },
    /// Result operation whose parameters cannot be bound
    UnsupportedArity { path: String, arity: usize },
    /// The operation produced no renderable result
    NoResult { path: String },
    /// Binding, service lookup, the handler itself, or rendering failed
    Execution(anyhow::Error),
}

impl DispatchFailure {
    /// Message code for failures the pipeline classifies itself.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            DispatchFailure::UnknownPath { .. } => Some(codes::PATH),
            DispatchFailure::MethodMismatch { .. } => Some(codes::HTTP_METHOD),
            DispatchFailure::Unauthorized { .. } => Some(codes::UNAUTHORIZED),
            DispatchFailure::Content { error, .. } => match error {
                ContentError::Message(err) => err.code(),
                ContentError::Malformed { .. } => Some(codes::CONTENT),
            },
            DispatchFailure::UnsupportedArity { .. } => Some(codes::RESPONSE_TYPE),
            DispatchFailure::NoResult { .. } => Some(codes::METHOD_PARAMETER),
            DispatchFailure::Execution(_) => None,
        }
    }

    /// The text reported to the client.
    #[must_use]
    pub fn message(&self, messages: &Messages) -> String {
        match self {
            DispatchFailure::UnknownPath { path }
            | DispatchFailure::Unauthorized { path }
            | DispatchFailure::UnsupportedArity { path, .. }
            | DispatchFailure::NoResult { path } => {
                messages.resolve(self.code().unwrap_or_default(), &[path])
            }
            DispatchFailure::MethodMismatch {
                path,
                method,
                expected,
            } => messages.resolve(
                codes::HTTP_METHOD,
                &[path.as_str(), method.as_str(), expected.as_str()],
            ),
            DispatchFailure::Content { path, error } => match error {
                ContentError::Message(err) => err.resolve(messages),
                ContentError::Malformed { detail, .. } => {
                    messages.resolve(codes::CONTENT, &[path, detail])
                }
            },
            DispatchFailure::Execution(err) => root_cause_message_of(err, messages),
        }
    }
}

impl fmt::Display for DispatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchFailure::UnknownPath { path } => write!(f, "no route for path '{path}'"),
            DispatchFailure::MethodMismatch {
                path,
                method,
                expected,
            } => write!(f, "{path} expects {expected}, got {method}"),
            DispatchFailure::Unauthorized { path } => write!(f, "no valid session for {path}"),
            DispatchFailure::Content { path, error } => {
                write!(f, "content of {path} unreadable: {error}")
            }
            DispatchFailure::UnsupportedArity { path, arity } => {
                write!(f, "{path} declares {arity} parameters")
            }
            DispatchFailure::NoResult { path } => write!(f, "{path} produced no result"),
            DispatchFailure::Execution(err) => write!(f, "{err:#}"),
        }
    }
}

impl std::error::Error for DispatchFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchFailure::Content { error, .. } => Some(error),
            DispatchFailure::Execution(err) => {
                let err: &(dyn std::error::Error + 'static) = err.as_ref();
                Some(err)
            }
            _ => None,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs the dispatch pipeline for one request at a time; share it across
/// request units with an `Arc`.
///
/// Stages, each a possible exit: path lookup, method check, session check,
/// content parsing, invocation, rendering. Every failure becomes a `400`
/// response whose body is the resolved message; nothing escapes
/// [`dispatch`](Self::dispatch).
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<RouteRegistry>,
    services: Arc<dyn ServiceLocator>,
    messages: Arc<Messages>,
    settings: Arc<Settings>,
    session_validator: Arc<dyn SessionValidator>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        registry: Arc<RouteRegistry>,
        services: Arc<dyn ServiceLocator>,
        messages: Arc<Messages>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            registry,
            services,
            messages,
            settings,
            session_validator: Arc::new(RequireSessionId),
        }
    }

    #[must_use]
    pub fn with_session_validator(mut self, validator: Arc<dyn SessionValidator>) -> Self {
        self.session_validator = validator;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    #[must_use]
    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Dispatch `request` and push the response into `sink`.
    pub fn dispatch_to<K: ResponseSink + ?Sized>(&self, request: &Request, sink: &mut K) {
        sink.send(self.dispatch(request));
    }

    /// Dispatch `request` and return the response.
    #[must_use]
    pub fn dispatch(&self, request: &Request) -> HttpResponse {
        let request_id = RequestId::for_request(request);
        let path = normalize_path(request.path());
        let method = normalize_method(request.method());

        let span = info_span!(
            "dispatch",
            request_id = %request_id,
            method = %method,
            path = %path
        );
        let start = Instant::now();

        // Operations may yield the coroutine, so the span is only entered
        // around sections that cannot.
        let mut response = match self.run(request, request_id, &path, method, &span) {
            Ok(response) => response,
            Err(failure) => span.in_scope(|| self.report(failure)),
        };
        request_id.stamp(&mut response);

        span.in_scope(|| {
            info!(
                status = response.status.as_u16(),
                latency_ms = start.elapsed().as_millis() as u64,
                body_size_bytes = response.body.len(),
                "Request dispatched"
            );
        });
        response
    }

    fn run(
        &self,
        request: &Request,
        request_id: RequestId,
        path: &str,
        method: Method,
        span: &Span,
    ) -> Result<HttpResponse, DispatchFailure> {
        let (route, ctx) = span.in_scope(|| self.prepare(request, request_id, path, method))?;

        let outcome = catch_unwind(AssertUnwindSafe(|| self.invoke(&route, &ctx, span)));
        let reply = match outcome {
            Ok(Ok(Some(reply))) => reply,
            Ok(Ok(None)) => return Ok(HttpResponse::new(StatusCode::OK)),
            Ok(Err(failure)) => return Err(failure),
            Err(payload) => {
                let panic_message = panic_message(payload.as_ref());
                span.in_scope(|| {
                    error!(
                        service = %route.service(),
                        panic_message = %panic_message,
                        "Operation panicked"
                    );
                });
                return Err(DispatchFailure::Execution(
                    MessageError::coded(codes::HANDLER_PANIC, [path, panic_message.as_str()])
                        .into(),
                ));
            }
        };

        match reply {
            Reply::Result(result) => {
                let render_ctx = RenderContext {
                    path,
                    messages: &self.messages,
                };
                span.in_scope(|| {
                    catch_unwind(AssertUnwindSafe(|| render_result(&result, &render_ctx)))
                        .unwrap_or_else(|payload| {
                            Err(anyhow::anyhow!(
                                "renderer panicked: {}",
                                panic_message(payload.as_ref())
                            ))
                        })
                })
                .map_err(DispatchFailure::Execution)
            }
            Reply::Nothing => Err(DispatchFailure::NoResult {
                path: path.to_string(),
            }),
        }
    }

    /// Stages ahead of the call: lookup, method, session and content.
    fn prepare<'r>(
        &self,
        request: &'r Request,
        request_id: RequestId,
        path: &str,
        method: Method,
    ) -> Result<(Arc<Route>, RequestContext<'r>), DispatchFailure> {
        let route = self
            .registry
            .resolve(path)
            .ok_or_else(|| DispatchFailure::UnknownPath {
                path: path.to_string(),
            })?;

        if route.method() != &method {
            return Err(DispatchFailure::MethodMismatch {
                path: path.to_string(),
                method,
                expected: route.method().clone(),
            });
        }

        if route.secured() && !self.session_validator.validate(&route, request.session()) {
            return Err(DispatchFailure::Unauthorized {
                path: path.to_string(),
            });
        }

        let content_type = normalize_content_type(request.content_type());
        let content = ContentReader::new(&self.settings)
            .read(request, path, content_type)
            .map_err(|error| DispatchFailure::Content {
                path: path.to_string(),
                error,
            })?;

        let ctx = RequestContext {
            request_id,
            path: path.to_string(),
            method,
            content,
            headers: request.headers(),
            session: request.session(),
        };

        debug!(
            route = %route,
            content_type = %content_type,
            "Invoking operation"
        );
        Ok((route, ctx))
    }

    /// Call the route's operation. `Ok(None)` is the unbindable void case,
    /// answered with an empty response.
    fn invoke(
        &self,
        route: &Route,
        ctx: &RequestContext<'_>,
        span: &Span,
    ) -> Result<Option<Reply>, DispatchFailure> {
        let bind_failed = |err: MessageError| DispatchFailure::Execution(err.into());

        if let Invoker::Unsupported { arity } = route.invoker() {
            return match route.returns() {
                ReturnKind::Result => Err(DispatchFailure::UnsupportedArity {
                    path: ctx.path.clone(),
                    arity: *arity,
                }),
                ReturnKind::Void => {
                    span.in_scope(|| {
                        error!(
                            service = %route.service(),
                            arity = *arity,
                            "Void operation with unsupported parameter count not invoked"
                        );
                    });
                    Ok(None)
                }
            };
        }

        let service = self.services.get(route.service()).ok_or_else(|| {
            DispatchFailure::Execution(
                MessageError::coded(codes::SERVICE, [route.service().name()]).into(),
            )
        })?;
        let instance = service.as_ref();

        let reply = match route.invoker() {
            Invoker::Nullary(call) => call(instance),
            Invoker::Unary { param, call } => {
                let arg: Arg = param.bind(ctx).map_err(bind_failed)?;
                call(instance, arg)
            }
            Invoker::Binary { params, call } => {
                let [first, second] = params;
                let a: Arg = first.bind(ctx).map_err(bind_failed)?;
                let b: Arg = second.bind(ctx).map_err(bind_failed)?;
                call(instance, a, b)
            }
            Invoker::Unsupported { .. } => return Ok(None),
        }
        .map_err(DispatchFailure::Execution)?;
        Ok(Some(reply))
    }

    fn report(&self, failure: DispatchFailure) -> HttpResponse {
        let message = failure.message(&self.messages);
        match &failure {
            DispatchFailure::Execution(err) => {
                error!(error = %message, "Operation failed");
                debug!(error_chain = ?err, "Operation failure chain");
            }
            DispatchFailure::Content { error, .. } => {
                warn!(code = ?failure.code(), error = %error, "Request content rejected");
            }
            other => {
                warn!(code = ?other.code(), reason = %other, "Request rejected");
            }
        }
        HttpResponse::text(FAILURE_STATUS, &message)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.registry.len())
            .field("language", &self.messages.language())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
