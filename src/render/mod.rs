//! # Result rendering
//!
//! An operation produces a [`Reply`]: either one of the closed set of
//! [`HandlerResult`] variants, or nothing at all. Each variant has exactly one
//! renderer, selected by an exhaustive `match` in [`render_result`]:
//!
//! | Variant | Renderer | Content type |
//! |---------|----------|--------------|
//! | [`JsonResult`] | [`JsonRenderer`] | `application/json` |
//! | [`CsvResult`] | [`CsvRenderer`] | `text/csv` |
//! | [`ServletResult`] | [`PlainRenderer`] | `text/plain; charset=utf-8` |
//!
//! Renderers only build an [`HttpResponse`]; a rendering failure is returned
//! as an error and reported by the dispatcher like any handler failure.

mod csv;
mod json;
mod plain;

pub use csv::{write_csv, CsvRenderer, CsvResult};
pub use json::{JsonRenderer, JsonResult};
pub use plain::{PlainRenderer, ServletMessage, ServletResult};

use crate::messages::Messages;
use crate::server::HttpResponse;

/// What a renderer needs besides the result itself.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Normalized path of the route being rendered
    pub path: &'a str,
    pub messages: &'a Messages,
}

/// Converts one result variant into a response.
pub trait Renderer {
    type Output;

    fn render(&self, output: &Self::Output, ctx: &RenderContext<'_>) -> anyhow::Result<HttpResponse>;
}

/// The closed set of renderable results.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerResult {
    Json(JsonResult),
    Csv(CsvResult),
    Servlet(ServletResult),
}

/// Render any [`HandlerResult`] with its renderer.
pub fn render_result(result: &HandlerResult, ctx: &RenderContext<'_>) -> anyhow::Result<HttpResponse> {
    match result {
        HandlerResult::Json(json) => JsonRenderer.render(json, ctx),
        HandlerResult::Csv(csv) => CsvRenderer.render(csv, ctx),
        HandlerResult::Servlet(servlet) => PlainRenderer.render(servlet, ctx),
    }
}

/// What an operation returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Result(HandlerResult),
    /// The operation returned no result (a void operation, or `None`)
    Nothing,
}

/// Declared return shape of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    Result,
    Void,
}

/// Conversion from an operation's return value into a [`Reply`].
pub trait IntoReply {
    const RETURNS: ReturnKind;

    fn into_reply(self) -> Reply;
}

impl IntoReply for () {
    const RETURNS: ReturnKind = ReturnKind::Void;

    fn into_reply(self) -> Reply {
        Reply::Nothing
    }
}

impl IntoReply for Reply {
    const RETURNS: ReturnKind = ReturnKind::Result;

    fn into_reply(self) -> Reply {
        self
    }
}

impl IntoReply for HandlerResult {
    const RETURNS: ReturnKind = ReturnKind::Result;

    fn into_reply(self) -> Reply {
        Reply::Result(self)
    }
}

impl<T: IntoReply> IntoReply for Option<T> {
    const RETURNS: ReturnKind = T::RETURNS;

    fn into_reply(self) -> Reply {
        self.map_or(Reply::Nothing, IntoReply::into_reply)
    }
}

macro_rules! result_variant {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for HandlerResult {
            fn from(value: $ty) -> Self {
                HandlerResult::$variant(value)
            }
        }

        impl IntoReply for $ty {
            const RETURNS: ReturnKind = ReturnKind::Result;

            fn into_reply(self) -> Reply {
                Reply::Result(HandlerResult::$variant(self))
            }
        }
    };
}

result_variant!(JsonResult, Json);
result_variant!(CsvResult, Csv);
result_variant!(ServletResult, Servlet);
