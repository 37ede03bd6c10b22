use super::{RenderContext, Renderer};
use crate::server::HttpResponse;
use http::StatusCode;

/// Text carried by a [`ServletResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServletMessage {
    /// Sent verbatim
    Literal(String),
    /// Resolved through the message table at render time
    Coded { code: String, args: Vec<String> },
}

/// A status line plus a short text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServletResult {
    pub status: StatusCode,
    pub message: ServletMessage,
}

impl ServletResult {
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: ServletMessage::Literal(message.into()),
        }
    }

    pub fn coded<I, S>(status: StatusCode, code: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self {
            status,
            message: ServletMessage::Coded {
                code: code.into(),
                args: args.into_iter().map(|a| a.to_string()).collect(),
            },
        }
    }
}

pub struct PlainRenderer;

impl Renderer for PlainRenderer {
    type Output = ServletResult;

    fn render(&self, output: &ServletResult, ctx: &RenderContext<'_>) -> anyhow::Result<HttpResponse> {
        let text = match &output.message {
            ServletMessage::Literal(text) => text.clone(),
            ServletMessage::Coded { code, args } => ctx.messages.resolve(code, args),
        };
        Ok(HttpResponse::text(output.status, &text))
    }
}
