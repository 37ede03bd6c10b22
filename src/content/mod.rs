//! # Content Reader
//!
//! Request content is handled in two steps:
//!
//! 1. [`ContentReader::read`] parses the raw body and query string according
//!    to the normalized content type into a [`Content`] value. This happens
//!    once per request, before the handler is looked up.
//! 2. Each declared handler parameter owns a [`Binder`] chosen at
//!    registration time. The binder extracts and converts its argument from
//!    the [`RequestContext`]. The parameter type drives how it is read: a
//!    request model deserializes the whole body, a scalar reads one named
//!    field.
//!
//! Conversion failures are coded [`MessageError`](crate::error::MessageError)s
//! so clients get a localized message rather than a parser's error text.

pub mod binder;
mod reader;

pub use binder::{
    body, content, field, files, optional_field, request_info, session, Binder, ParamDescriptor,
    ParamSource, RequestInfo,
};
pub use reader::{ContentError, ContentReader};

use crate::ids::RequestId;
use crate::normalize::ContentType;
use crate::security::Session;
use crate::server::{last_field, FieldVec, HeaderVec, Part};
use http::Method;
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Parsed request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Form(FieldVec),
    Multipart { fields: FieldVec, files: Vec<Part> },
    Text(String),
}

/// Parsed request content: body plus query parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub content_type: ContentType,
    pub query: FieldVec,
    pub body: Body,
}

impl Content {
    /// Look up a single named value.
    ///
    /// Query parameters are checked first, then form or multipart fields,
    /// then top-level fields of a JSON object body. JSON `null` counts as
    /// absent; non-string JSON values are returned in their JSON text form.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        if let Some(value) = last_field(&self.query, name) {
            return Some(Cow::Borrowed(value));
        }
        match &self.body {
            Body::Form(fields) | Body::Multipart { fields, .. } => {
                last_field(fields, name).map(Cow::Borrowed)
            }
            Body::Json(Value::Object(map)) => match map.get(name)? {
                Value::Null => None,
                Value::String(s) => Some(Cow::Borrowed(s.as_str())),
                other => Some(Cow::Owned(other.to_string())),
            },
            Body::Json(_) | Body::Text(_) => None,
        }
    }

    /// The whole body as a JSON value, for deserializing request models.
    ///
    /// Form and multipart fields become an object of strings (last value
    /// wins); text becomes a JSON string.
    #[must_use]
    pub fn body_value(&self) -> Value {
        match &self.body {
            Body::Json(value) => value.clone(),
            Body::Form(fields) | Body::Multipart { fields, .. } => {
                let mut map = Map::new();
                for (name, value) in fields {
                    map.insert(name.clone(), Value::String(value.clone()));
                }
                Value::Object(map)
            }
            Body::Text(text) => Value::String(text.clone()),
        }
    }

    /// Uploaded file parts, empty unless the body is multipart.
    #[must_use]
    pub fn files(&self) -> &[Part] {
        match &self.body {
            Body::Multipart { files, .. } => files,
            _ => &[],
        }
    }
}

/// Everything a binder may read for one request.
#[derive(Debug)]
pub struct RequestContext<'r> {
    pub request_id: RequestId,
    pub path: String,
    pub method: Method,
    pub content: Content,
    pub headers: &'r HeaderVec,
    pub session: Option<&'r Session>,
}
