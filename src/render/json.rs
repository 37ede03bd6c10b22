use super::{RenderContext, Renderer};
use crate::server::HttpResponse;
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// A JSON payload and its status.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResult {
    pub status: StatusCode,
    pub payload: Value,
}

impl JsonResult {
    #[must_use]
    pub fn new(status: StatusCode, payload: Value) -> Self {
        Self { status, payload }
    }

    /// `200 OK` with `payload`.
    #[must_use]
    pub fn ok(payload: Value) -> Self {
        Self::new(StatusCode::OK, payload)
    }

    /// Serialize any value into a JSON result.
    pub fn from_serialize<T: Serialize>(status: StatusCode, payload: &T) -> serde_json::Result<Self> {
        Ok(Self::new(status, serde_json::to_value(payload)?))
    }
}

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    type Output = JsonResult;

    fn render(&self, output: &JsonResult, ctx: &RenderContext<'_>) -> anyhow::Result<HttpResponse> {
        let body = serde_json::to_vec(&output.payload)?;
        debug!(
            path = %ctx.path,
            status = output.status.as_u16(),
            body_size_bytes = body.len(),
            "JSON result rendered"
        );
        Ok(HttpResponse::with_body(output.status, "application/json", body))
    }
}
