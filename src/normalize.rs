//! Request normalization.
//!
//! Every inbound request is reduced to a canonical path, method and content
//! type before the route registry is consulted. The functions here are pure
//! and total: malformed input is folded into a default instead of rejected,
//! and rejection happens later by comparing against the matched route.

use http::Method;
use std::fmt;

/// Methods the dispatcher recognizes. Anything else is treated as `GET`.
pub const SUPPORTED_METHODS: [Method; 8] = [
    Method::GET,
    Method::POST,
    Method::DELETE,
    Method::HEAD,
    Method::PUT,
    Method::CONNECT,
    Method::TRACE,
    Method::OPTIONS,
];

/// Canonical request content types.
///
/// Raw `Content-Type` headers are matched against [`ContentType::ALL`] in
/// declaration order; the first allow-listed value contained in the header
/// wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    MultipartFormData,
    TextHtml,
    TextPlain,
    TextCsv,
    ApplicationJson,
    FormUrlEncoded,
}

impl ContentType {
    /// Allow-list in matching order.
    pub const ALL: [ContentType; 6] = [
        ContentType::MultipartFormData,
        ContentType::TextHtml,
        ContentType::TextPlain,
        ContentType::TextCsv,
        ContentType::ApplicationJson,
        ContentType::FormUrlEncoded,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ContentType::MultipartFormData => "multipart/form-data",
            ContentType::TextHtml => "text/html",
            ContentType::TextPlain => "text/plain",
            ContentType::TextCsv => "text/csv",
            ContentType::ApplicationJson => "application/json",
            ContentType::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }

    /// True for the content types whose body is read as text.
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(
            self,
            ContentType::TextHtml | ContentType::TextPlain | ContentType::TextCsv
        )
    }
}

impl Default for ContentType {
    fn default() -> Self {
        ContentType::TextPlain
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a raw request path.
///
/// `None`, empty and `/` all map to the root key `""`. Otherwise the path is
/// lower-cased, stripped of surrounding whitespace and trailing slashes, and
/// given a leading slash. The result is a fixed point: normalizing it again
/// returns it unchanged.
#[must_use]
pub fn normalize_path(raw: Option<&str>) -> String {
    let lower = raw.unwrap_or_default().to_lowercase();
    let trimmed = lower
        .trim_start()
        .trim_end_matches(|c: char| c == '/' || c.is_whitespace());
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Normalize a raw request method, defaulting to `GET`.
///
/// Matching is case-insensitive but exact, so a padded name such as `" POST"`
/// is unrecognized and falls back to `GET`.
#[must_use]
pub fn normalize_method(raw: Option<&str>) -> Method {
    let Some(raw) = raw else {
        return Method::GET;
    };
    let upper = raw.to_ascii_uppercase();
    SUPPORTED_METHODS
        .iter()
        .find(|m| m.as_str() == upper)
        .cloned()
        .unwrap_or(Method::GET)
}

/// Normalize a raw `Content-Type` header, defaulting to `text/plain`.
#[must_use]
pub fn normalize_content_type(raw: Option<&str>) -> ContentType {
    let Some(raw) = raw else {
        return ContentType::TextPlain;
    };
    let lower = raw.to_lowercase();
    ContentType::ALL
        .into_iter()
        .find(|ct| lower.contains(ct.as_str()))
        .unwrap_or(ContentType::TextPlain)
}
