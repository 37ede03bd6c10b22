//! HTTP-shaped request and response types exchanged with the host container.
//!
//! The dispatcher does not own a socket. A host parses the wire request into
//! a [`Request`], calls the dispatcher, and writes the returned
//! [`HttpResponse`] (or receives it through a [`ResponseSink`]).

pub mod request;
pub mod response;

pub use request::{
    last_field, parse_form_fields, FieldVec, HeaderVec, Part, Request, MAX_INLINE_FIELDS,
    MAX_INLINE_HEADERS,
};
pub use response::{status_reason, HttpResponse, ResponseSink, TEXT_PLAIN_UTF8};
