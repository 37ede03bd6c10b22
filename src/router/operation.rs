use super::core::Route;
use crate::content::{Binder, ParamDescriptor, RequestContext};
use crate::error::{codes, MessageError};
use crate::normalize::{normalize_method, normalize_path};
use crate::render::{IntoReply, Reply, ReturnKind};
use crate::service::{HttpService, ServiceId};
use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// One bound argument, type-erased between binding and the call.
pub(crate) type Arg = Box<dyn Any + Send>;

type BindFn = dyn Fn(&RequestContext<'_>) -> Result<Arg, MessageError> + Send + Sync;
type Call0 = dyn Fn(&(dyn Any + Send + Sync)) -> anyhow::Result<Reply> + Send + Sync;
type Call1 = dyn Fn(&(dyn Any + Send + Sync), Arg) -> anyhow::Result<Reply> + Send + Sync;
type Call2 = dyn Fn(&(dyn Any + Send + Sync), Arg, Arg) -> anyhow::Result<Reply> + Send + Sync;

/// A parameter binder with its output boxed.
#[derive(Clone)]
pub struct BoundParam {
    descriptor: ParamDescriptor,
    bind: Arc<BindFn>,
}

impl BoundParam {
    fn new<B: Binder>(binder: B) -> Self {
        Self {
            descriptor: binder.descriptor(),
            bind: Arc::new(move |ctx: &RequestContext<'_>| {
                binder.bind(ctx).map(|value| Box::new(value) as Arg)
            }),
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> &ParamDescriptor {
        &self.descriptor
    }

    pub(crate) fn bind(&self, ctx: &RequestContext<'_>) -> Result<Arg, MessageError> {
        (self.bind)(ctx)
    }
}

impl fmt::Debug for BoundParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundParam").field(&self.descriptor).finish()
    }
}

/// How a route's operation is called, fixed at registration.
#[derive(Clone)]
pub enum Invoker {
    Nullary(Arc<Call0>),
    Unary {
        param: BoundParam,
        call: Arc<Call1>,
    },
    Binary {
        params: [BoundParam; 2],
        call: Arc<Call2>,
    },
    /// Declared with a parameter count that cannot be bound
    Unsupported { arity: usize },
}

impl Invoker {
    #[must_use]
    pub fn arity(&self) -> usize {
        match self {
            Invoker::Nullary(_) => 0,
            Invoker::Unary { .. } => 1,
            Invoker::Binary { .. } => 2,
            Invoker::Unsupported { arity } => *arity,
        }
    }

    #[must_use]
    pub fn params(&self) -> Vec<&ParamDescriptor> {
        match self {
            Invoker::Unary { param, .. } => vec![param.descriptor()],
            Invoker::Binary { params, .. } => params.iter().map(BoundParam::descriptor).collect(),
            Invoker::Nullary(_) | Invoker::Unsupported { .. } => Vec::new(),
        }
    }
}

impl fmt::Debug for Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invoker::Nullary(_) => f.write_str("Nullary"),
            Invoker::Unary { param, .. } => f.debug_struct("Unary").field("param", param).finish(),
            Invoker::Binary { params, .. } => {
                f.debug_struct("Binary").field("params", params).finish()
            }
            Invoker::Unsupported { arity } => {
                f.debug_struct("Unsupported").field("arity", arity).finish()
            }
        }
    }
}

fn downcast_service<S: 'static>(instance: &(dyn Any + Send + Sync)) -> anyhow::Result<&S> {
    instance
        .downcast_ref::<S>()
        .ok_or_else(|| MessageError::coded(codes::SERVICE, [type_name::<S>()]).into())
}

fn downcast_arg<T: 'static>(arg: Arg) -> anyhow::Result<T> {
    arg.downcast::<T>()
        .map(|value| *value)
        .map_err(|_| anyhow::anyhow!("bound argument is not a {}", type_name::<T>()))
}

/// Route declaration awaiting its handler.
#[must_use = "an operation needs a handler before it can be registered"]
pub struct OperationBuilder<S> {
    method: String,
    path: String,
    secured: bool,
    _service: PhantomData<fn() -> S>,
}

impl<S: HttpService> OperationBuilder<S> {
    /// Only dispatch when the request carries a valid session.
    pub fn secured(mut self) -> Self {
        self.secured = true;
        self
    }

    fn finish(self, returns: ReturnKind, invoker: Invoker) -> Operation<S> {
        Operation {
            method: self.method,
            path: self.path,
            secured: self.secured,
            returns,
            invoker,
            _service: PhantomData,
        }
    }

    /// Handler taking no request parameters.
    pub fn handle0<R, F>(self, handler: F) -> Operation<S>
    where
        R: IntoReply,
        F: Fn(&S) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        let call = move |instance: &(dyn Any + Send + Sync)| -> anyhow::Result<Reply> {
            let service = downcast_service::<S>(instance)?;
            handler(service).map(IntoReply::into_reply)
        };
        self.finish(R::RETURNS, Invoker::Nullary(Arc::new(call)))
    }

    /// Handler taking one argument produced by `binder`.
    pub fn handle1<B, R, F>(self, binder: B, handler: F) -> Operation<S>
    where
        B: Binder,
        R: IntoReply,
        F: Fn(&S, B::Output) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        let call = move |instance: &(dyn Any + Send + Sync), arg: Arg| -> anyhow::Result<Reply> {
            let service = downcast_service::<S>(instance)?;
            let value = downcast_arg::<B::Output>(arg)?;
            handler(service, value).map(IntoReply::into_reply)
        };
        self.finish(
            R::RETURNS,
            Invoker::Unary {
                param: BoundParam::new(binder),
                call: Arc::new(call),
            },
        )
    }

    /// Handler taking two arguments, bound in declaration order.
    pub fn handle2<A, B, R, F>(self, first: A, second: B, handler: F) -> Operation<S>
    where
        A: Binder,
        B: Binder,
        R: IntoReply,
        F: Fn(&S, A::Output, B::Output) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        let call = move |instance: &(dyn Any + Send + Sync),
                         a: Arg,
                         b: Arg|
              -> anyhow::Result<Reply> {
            let service = downcast_service::<S>(instance)?;
            let a = downcast_arg::<A::Output>(a)?;
            let b = downcast_arg::<B::Output>(b)?;
            handler(service, a, b).map(IntoReply::into_reply)
        };
        self.finish(
            R::RETURNS,
            Invoker::Binary {
                params: [BoundParam::new(first), BoundParam::new(second)],
                call: Arc::new(call),
            },
        )
    }

    /// Declare an operation whose parameter list has `arity` entries and
    /// therefore cannot be bound. Requests to it are answered without
    /// calling anything: void operations get an empty response, result
    /// operations get `application.response.type.error`.
    pub fn unbindable(self, arity: usize, returns: ReturnKind) -> Operation<S> {
        self.finish(returns, Invoker::Unsupported { arity })
    }
}

/// A complete operation of service `S`.
pub struct Operation<S> {
    method: String,
    path: String,
    secured: bool,
    returns: ReturnKind,
    invoker: Invoker,
    _service: PhantomData<fn() -> S>,
}

impl<S: HttpService> Operation<S> {
    /// Start an operation for `method` and `path` as declared. Both are
    /// normalized when the route is built.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> OperationBuilder<S> {
        OperationBuilder {
            method: method.into(),
            path: path.into(),
            secured: false,
            _service: PhantomData,
        }
    }

    pub fn get(path: impl Into<String>) -> OperationBuilder<S> {
        Self::new("GET", path)
    }

    pub fn post(path: impl Into<String>) -> OperationBuilder<S> {
        Self::new("POST", path)
    }

    pub fn put(path: impl Into<String>) -> OperationBuilder<S> {
        Self::new("PUT", path)
    }

    pub fn delete(path: impl Into<String>) -> OperationBuilder<S> {
        Self::new("DELETE", path)
    }

    pub fn into_route(self) -> Route {
        Route::new(
            normalize_path(Some(&self.path)),
            self.path,
            normalize_method(Some(&self.method)),
            self.secured,
            ServiceId::of::<S>(),
            self.returns,
            self.invoker,
        )
    }
}
