use crate::security::Session;
use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Maximum inline query/form fields before heap allocation
pub const MAX_INLINE_FIELDS: usize = 8;

/// Header storage: lower-cased names shared as `Arc<str>`, per-request values.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Ordered name/value pairs from a query string or form body. Lookups use
/// "last write wins" semantics.
pub type FieldVec = SmallVec<[(String, String); MAX_INLINE_FIELDS]>;

/// One part of a `multipart/form-data` body, as handed over by the host
/// container after it has spooled the upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    /// Present for file uploads, absent for plain form fields
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Part {
    pub fn field(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            data: value.into().into_bytes(),
        }
    }

    pub fn file(name: impl Into<String>, filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            filename: Some(filename.into()),
            content_type: None,
            data,
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }
}

/// An inbound HTTP-shaped request.
///
/// Every field is raw: nothing is normalized here. Path, method and content
/// type are optional because hosts may not supply them, and the dispatcher
/// defines what a missing value means.
#[derive(Debug, Clone, Default)]
pub struct Request {
    path: Option<String>,
    query: Option<String>,
    method: Option<String>,
    content_type: Option<String>,
    headers: HeaderVec,
    body: Vec<u8>,
    parts: Vec<Part>,
    session: Option<Session>,
}

impl Request {
    /// Build a request from a method and a target. A `?query` suffix on the
    /// target is split off into the query string.
    pub fn new(method: &str, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (target, None),
        };
        Self {
            path: Some(path.to_string()),
            query,
            method: Some(method.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: Option<&str>) -> Self {
        self.path = path.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: Option<&str>) -> Self {
        self.method = method.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Add a header; `content-type` also sets the raw content type.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        if name == "content-type" {
            self.content_type = Some(value.clone());
        }
        self.headers.push((Arc::from(name), value));
        self
    }

    #[must_use]
    pub fn with_content_type(self, content_type: &str) -> Self {
        self.with_header("content-type", content_type)
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a JSON body and the matching content type.
    #[must_use]
    pub fn with_json(self, body: &serde_json::Value) -> Self {
        self.with_content_type("application/json")
            .with_body(body.to_string())
    }

    /// Add a multipart part and, if not already set, the multipart content type.
    #[must_use]
    pub fn with_part(mut self, part: Part) -> Self {
        if self.content_type.is_none() {
            self = self.with_content_type("multipart/form-data");
        }
        self.parts.push(part);
        self
    }

    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }
}

/// Parse an `application/x-www-form-urlencoded` string (query or body),
/// preserving order.
#[must_use]
pub fn parse_form_fields(encoded: &str) -> FieldVec {
    url::form_urlencoded::parse(encoded.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Last value for `name`, if any.
#[must_use]
pub fn last_field<'a>(fields: &'a FieldVec, name: &str) -> Option<&'a str> {
    fields
        .iter()
        .rfind(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}
