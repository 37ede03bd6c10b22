//! Reportable errors and root-cause classification.
//!
//! [`MessageError`] is the error type that carries an optional message code
//! and positional arguments so a failure can be rendered through the
//! [`Messages`] table instead of leaking a raw error string. Its cause
//! relation is the standard [`Error::source`] chain, and
//! [`root_cause_message`] walks that chain to the innermost failure.

use crate::messages::Messages;
use std::error::Error;
use std::fmt;

/// Message codes emitted by the dispatcher itself.
pub mod codes {
    pub const PATH: &str = "application.path.error";
    pub const HTTP_METHOD: &str = "application.httpMethod.error";
    pub const UNAUTHORIZED: &str = "application.unauthorized.error";
    pub const CONTENT: &str = "application.content.error";
    pub const RESPONSE_TYPE: &str = "application.response.type.error";
    pub const METHOD_PARAMETER: &str = "application.method.parameter.error";
    pub const CONTENT_SIZE: &str = "application.content.size.error";
    pub const FILE_SIZE: &str = "application.content.file.size.error";
    pub const PARAMETER_MISSING: &str = "application.parameter.missing";
    pub const PARAMETER_INVALID: &str = "application.parameter.invalid";
    pub const BODY_INVALID: &str = "application.body.invalid";
    pub const SERVICE: &str = "application.service.error";
    pub const HANDLER_PANIC: &str = "application.handler.panic";
}

type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// An error that surfaces a localized, parameterized explanation.
///
/// When `code` is set the client sees `messages.resolve(code, args)`;
/// otherwise it sees `message` verbatim.
#[derive(Debug)]
pub struct MessageError {
    code: Option<String>,
    args: Vec<String>,
    message: String,
    cause: Option<BoxError>,
}

impl MessageError {
    /// An uncoded error whose text is shown as-is.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            args: Vec::new(),
            message: message.into(),
            cause: None,
        }
    }

    /// A coded error. The code doubles as the fallback message text.
    pub fn coded<I, S>(code: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let code = code.into();
        Self {
            message: code.clone(),
            code: Some(code),
            args: args.into_iter().map(|a| a.to_string()).collect(),
            cause: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach the error that caused this one.
    #[must_use]
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        self.cause = Some(cause.into());
        self
    }

    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Resolve this error alone, ignoring its cause chain.
    #[must_use]
    pub fn resolve(&self, messages: &Messages) -> String {
        match &self.code {
            Some(code) => messages.resolve(code, &self.args),
            None => self.message.clone(),
        }
    }
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for MessageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn Error + 'static))
    }
}

/// Follow `source()` to the innermost error.
#[must_use]
pub fn root_cause<'a>(err: &'a (dyn Error + 'static)) -> &'a (dyn Error + 'static) {
    match err.source() {
        Some(inner) => root_cause(inner),
        None => err,
    }
}

/// Reduce an error chain to the single message a client should see.
///
/// The innermost error wins. If it is a coded [`MessageError`] the code is
/// resolved with its arguments; otherwise its display text is used.
#[must_use]
pub fn root_cause_message(err: &(dyn Error + 'static), messages: &Messages) -> String {
    let innermost = root_cause(err);
    match innermost.downcast_ref::<MessageError>() {
        Some(message_error) => message_error.resolve(messages),
        None => innermost.to_string(),
    }
}

/// [`root_cause_message`] for handler failures carried as `anyhow::Error`.
#[must_use]
pub fn root_cause_message_of(err: &anyhow::Error, messages: &Messages) -> String {
    let err: &(dyn Error + 'static) = err.as_ref();
    root_cause_message(err, messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    fn messages() -> Messages {
        Messages::empty("en").with_message("x.y.z", "bad value {0}")
    }

    #[test]
    fn test_innermost_coded_error_is_resolved() {
        let inner = MessageError::coded("x.y.z", ["q"]);
        let middle = MessageError::new("middle").with_cause(inner);
        let outer = MessageError::new("outer").with_cause(middle);
        assert_eq!(root_cause_message(&outer, &messages()), "bad value q");
    }

    #[test]
    fn test_uncoded_root_uses_display_text() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let outer = MessageError::coded("x.y.z", ["ignored"]).with_cause(io);
        assert_eq!(root_cause_message(&outer, &messages()), "disk gone");
    }

    #[test]
    fn test_anyhow_context_chain() {
        let result: anyhow::Result<()> = Err(MessageError::coded("x.y.z", ["q"]))
            .context("loading record")
            .context("handling request");
        let err = result.unwrap_err();
        assert_eq!(root_cause_message_of(&err, &messages()), "bad value q");
    }

    #[test]
    fn test_plain_anyhow_message() {
        let err = anyhow::anyhow!("nothing to see");
        assert_eq!(root_cause_message_of(&err, &messages()), "nothing to see");
    }
}
