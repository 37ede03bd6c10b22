//! Parameter binders.
//!
//! A binder turns the parsed request into one typed handler argument. Which
//! binder a parameter uses is fixed when the operation is registered, so
//! per-request binding is a direct call with no type inspection.
//!
//! | Constructor | Argument type | Reads |
//! |-------------|---------------|-------|
//! | [`body::<T>()`](body) | `T: DeserializeOwned` | the whole body |
//! | [`field::<T>(name)`](field) | `T: FromStr` | one named value |
//! | [`optional_field::<T>(name)`](optional_field) | `Option<T>` | one named value, if present |
//! | [`files()`](files) | `Vec<Part>` | multipart file parts |
//! | [`session()`](session) | `Option<Session>` | the request session |
//! | [`content()`](content) | [`Content`] | the parsed content as-is |
//! | [`request_info()`](request_info) | [`RequestInfo`] | normalized request metadata |

use super::{Body, Content, RequestContext};
use crate::error::{codes, MessageError};
use crate::ids::RequestId;
use crate::normalize::ContentType;
use crate::security::Session;
use crate::server::Part;
use http::Method;
use serde::de::DeserializeOwned;
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

/// Where a bound parameter comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSource {
    Body,
    Field(String),
    OptionalField(String),
    Files,
    Session,
    Content,
    RequestInfo,
}

/// Declared parameter: its source and Rust type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
    pub source: ParamSource,
    pub type_name: &'static str,
}

impl ParamDescriptor {
    fn of<T>(source: ParamSource) -> Self {
        Self {
            source,
            type_name: type_name::<T>(),
        }
    }
}

impl fmt::Display for ParamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            ParamSource::Body => write!(f, "body: {}", self.type_name),
            ParamSource::Field(name) => write!(f, "{name}: {}", self.type_name),
            ParamSource::OptionalField(name) => write!(f, "{name}?: {}", self.type_name),
            ParamSource::Files => f.write_str("files"),
            ParamSource::Session => f.write_str("session"),
            ParamSource::Content => f.write_str("content"),
            ParamSource::RequestInfo => f.write_str("request"),
        }
    }
}

/// Extracts one typed argument from a request.
pub trait Binder: Send + Sync + 'static {
    type Output: Send + 'static;

    fn descriptor(&self) -> ParamDescriptor;

    fn bind(&self, ctx: &RequestContext<'_>) -> Result<Self::Output, MessageError>;
}

pub struct BodyBinder<T>(PhantomData<fn() -> T>);

/// Deserialize the whole request body into `T`.
///
/// Text bodies are first offered to `T` as a JSON string, then parsed as JSON
/// text, so both `String` and structured models can be read from
/// `text/plain`.
#[must_use]
pub fn body<T>() -> BodyBinder<T>
where
    T: DeserializeOwned + Send + 'static,
{
    BodyBinder(PhantomData)
}

impl<T> Binder for BodyBinder<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Output = T;

    fn descriptor(&self) -> ParamDescriptor {
        ParamDescriptor::of::<T>(ParamSource::Body)
    }

    fn bind(&self, ctx: &RequestContext<'_>) -> Result<T, MessageError> {
        let result = match &ctx.content.body {
            Body::Text(text) => serde_json::from_value(serde_json::Value::String(text.clone()))
                .or_else(|_| serde_json::from_str(text)),
            _ => serde_json::from_value(ctx.content.body_value()),
        };
        result.map_err(|e| {
            MessageError::coded(codes::BODY_INVALID, [type_name::<T>().to_string(), e.to_string()])
        })
    }
}

pub struct FieldBinder<T> {
    name: String,
    _value: PhantomData<fn() -> T>,
}

/// Read the named value and parse it with `FromStr`.
#[must_use]
pub fn field<T>(name: impl Into<String>) -> FieldBinder<T>
where
    T: FromStr + Send + 'static,
    T::Err: fmt::Display,
{
    FieldBinder {
        name: name.into(),
        _value: PhantomData,
    }
}

fn parse_field<T>(name: &str, raw: &str) -> Result<T, MessageError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse::<T>().map_err(|e| {
        MessageError::coded(codes::PARAMETER_INVALID, [name, raw, type_name::<T>()])
            .with_message(format!("invalid value for {name}: {e}"))
    })
}

impl<T> Binder for FieldBinder<T>
where
    T: FromStr + Send + 'static,
    T::Err: fmt::Display,
{
    type Output = T;

    fn descriptor(&self) -> ParamDescriptor {
        ParamDescriptor::of::<T>(ParamSource::Field(self.name.clone()))
    }

    fn bind(&self, ctx: &RequestContext<'_>) -> Result<T, MessageError> {
        let raw = ctx
            .content
            .field(&self.name)
            .ok_or_else(|| MessageError::coded(codes::PARAMETER_MISSING, [&self.name]))?;
        parse_field(&self.name, &raw)
    }
}

pub struct OptionalFieldBinder<T> {
    name: String,
    _value: PhantomData<fn() -> T>,
}

/// Like [`field`], but an absent value binds as `None`. A present value that
/// does not parse is still an error.
#[must_use]
pub fn optional_field<T>(name: impl Into<String>) -> OptionalFieldBinder<T>
where
    T: FromStr + Send + 'static,
    T::Err: fmt::Display,
{
    OptionalFieldBinder {
        name: name.into(),
        _value: PhantomData,
    }
}

impl<T> Binder for OptionalFieldBinder<T>
where
    T: FromStr + Send + 'static,
    T::Err: fmt::Display,
{
    type Output = Option<T>;

    fn descriptor(&self) -> ParamDescriptor {
        ParamDescriptor::of::<T>(ParamSource::OptionalField(self.name.clone()))
    }

    fn bind(&self, ctx: &RequestContext<'_>) -> Result<Option<T>, MessageError> {
        ctx.content
            .field(&self.name)
            .map(|raw| parse_field(&self.name, &raw))
            .transpose()
    }
}

pub struct FilesBinder;

/// Multipart file parts, in request order.
#[must_use]
pub fn files() -> FilesBinder {
    FilesBinder
}

impl Binder for FilesBinder {
    type Output = Vec<Part>;

    fn descriptor(&self) -> ParamDescriptor {
        ParamDescriptor::of::<Vec<Part>>(ParamSource::Files)
    }

    fn bind(&self, ctx: &RequestContext<'_>) -> Result<Vec<Part>, MessageError> {
        Ok(ctx.content.files().to_vec())
    }
}

pub struct SessionBinder;

/// The request's session, if the host resolved one.
#[must_use]
pub fn session() -> SessionBinder {
    SessionBinder
}

impl Binder for SessionBinder {
    type Output = Option<Session>;

    fn descriptor(&self) -> ParamDescriptor {
        ParamDescriptor::of::<Option<Session>>(ParamSource::Session)
    }

    fn bind(&self, ctx: &RequestContext<'_>) -> Result<Option<Session>, MessageError> {
        Ok(ctx.session.cloned())
    }
}

pub struct ContentBinder;

/// The parsed content, for handlers that inspect it themselves.
#[must_use]
pub fn content() -> ContentBinder {
    ContentBinder
}

impl Binder for ContentBinder {
    type Output = Content;

    fn descriptor(&self) -> ParamDescriptor {
        ParamDescriptor::of::<Content>(ParamSource::Content)
    }

    fn bind(&self, ctx: &RequestContext<'_>) -> Result<Content, MessageError> {
        Ok(ctx.content.clone())
    }
}

/// Normalized metadata of the request being dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub request_id: RequestId,
    pub path: String,
    pub method: Method,
    pub content_type: ContentType,
    pub headers: Vec<(String, String)>,
}

impl RequestInfo {
    /// Get a header by name (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub struct RequestInfoBinder;

#[must_use]
pub fn request_info() -> RequestInfoBinder {
    RequestInfoBinder
}

impl Binder for RequestInfoBinder {
    type Output = RequestInfo;

    fn descriptor(&self) -> ParamDescriptor {
        ParamDescriptor::of::<RequestInfo>(ParamSource::RequestInfo)
    }

    fn bind(&self, ctx: &RequestContext<'_>) -> Result<RequestInfo, MessageError> {
        Ok(RequestInfo {
            request_id: ctx.request_id,
            path: ctx.path.clone(),
            method: ctx.method.clone(),
            content_type: ctx.content.content_type,
            headers: ctx
                .headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        })
    }
}
