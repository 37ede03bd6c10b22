//! Request correlation ids.
//!
//! A caller may supply its own id in the `x-request-id` header. A well-formed
//! ULID is adopted as is, anything else is replaced by a fresh one. The id is
//! written back on the response so both sides can correlate log lines.

use crate::server::{HttpResponse, Request};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::SystemTime;

/// Header used to carry a request id in and out of the dispatcher.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request correlation id backed by ULID.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(ulid::Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// The id carried by `request`, or a fresh one when it has none or it
    /// is malformed.
    #[must_use]
    pub fn for_request(request: &Request) -> Self {
        request
            .header(REQUEST_ID_HEADER)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or_default()
    }

    /// Write this id to the response header, replacing any previous value.
    pub fn stamp(&self, response: &mut HttpResponse) {
        response.set_header(REQUEST_ID_HEADER, self.to_string());
    }

    /// Millisecond time at which the id was minted.
    #[must_use]
    pub fn issued_at(&self) -> SystemTime {
        self.0.datetime()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(RequestId)
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid request id '{s}'")))
    }
}
