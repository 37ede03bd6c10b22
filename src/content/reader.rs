use super::{Body, Content};
use crate::config::Settings;
use crate::error::{codes, MessageError};
use crate::normalize::ContentType;
use crate::server::{parse_form_fields, FieldVec, Request};
use std::error::Error;
use std::fmt;
use tracing::debug;

type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Why request content could not be read.
#[derive(Debug)]
pub enum ContentError {
    /// A reportable failure: coded errors are resolved, uncoded ones are sent
    /// verbatim
    Message(MessageError),
    /// The body is not what its content type claims
    Malformed { detail: String, source: BoxError },
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentError::Message(err) => write!(f, "{err}"),
            ContentError::Malformed { detail, .. } => f.write_str(detail),
        }
    }
}

impl Error for ContentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ContentError::Message(err) => Some(err),
            ContentError::Malformed { source, .. } => Some(source.as_ref()),
        }
    }
}

impl From<MessageError> for ContentError {
    fn from(err: MessageError) -> Self {
        ContentError::Message(err)
    }
}

fn malformed<E>(detail: impl Into<String>, source: E) -> ContentError
where
    E: Into<BoxError>,
{
    ContentError::Malformed {
        detail: detail.into(),
        source: source.into(),
    }
}

/// Parses raw request content according to its normalized content type.
#[derive(Debug, Clone, Copy)]
pub struct ContentReader<'s> {
    settings: &'s Settings,
}

impl<'s> ContentReader<'s> {
    #[must_use]
    pub fn new(settings: &'s Settings) -> Self {
        Self { settings }
    }

    /// Read `request` into a [`Content`].
    ///
    /// `path` is the normalized route path, used as a message argument.
    pub fn read(
        &self,
        request: &Request,
        path: &str,
        content_type: ContentType,
    ) -> Result<Content, ContentError> {
        let raw = request.body();
        if raw.len() > self.settings.max_request_size {
            return Err(MessageError::coded(
                codes::CONTENT_SIZE,
                [path.to_string(), self.settings.max_request_size.to_string()],
            )
            .into());
        }

        let query = request.query().map(parse_form_fields).unwrap_or_default();

        let body = match content_type {
            ContentType::ApplicationJson => {
                if raw.iter().all(u8::is_ascii_whitespace) {
                    Body::Json(serde_json::Value::Null)
                } else {
                    let value = serde_json::from_slice(raw)
                        .map_err(|e| malformed(format!("invalid JSON body: {e}"), e))?;
                    Body::Json(value)
                }
            }
            ContentType::FormUrlEncoded => {
                let text = std::str::from_utf8(raw)
                    .map_err(|e| malformed(format!("form body is not UTF-8: {e}"), e))?;
                Body::Form(parse_form_fields(text))
            }
            ContentType::MultipartFormData => self.read_multipart(request, path)?,
            ContentType::TextPlain | ContentType::TextHtml | ContentType::TextCsv => {
                let text = String::from_utf8(raw.to_vec())
                    .map_err(|e| malformed(format!("text body is not UTF-8: {e}"), e))?;
                Body::Text(text)
            }
        };

        debug!(
            path = %path,
            content_type = %content_type,
            body_size_bytes = raw.len(),
            query_count = query.len(),
            "Request content parsed"
        );

        Ok(Content {
            content_type,
            query,
            body,
        })
    }

    fn read_multipart(&self, request: &Request, path: &str) -> Result<Body, ContentError> {
        let mut fields = FieldVec::new();
        let mut files = Vec::new();
        let mut total = 0usize;
        for part in request.parts() {
            total = total.saturating_add(part.data.len());
            if total > self.settings.max_request_size {
                return Err(MessageError::coded(
                    codes::CONTENT_SIZE,
                    [path.to_string(), self.settings.max_request_size.to_string()],
                )
                .into());
            }
            if part.is_file() {
                if part.data.len() > self.settings.max_file_size {
                    return Err(MessageError::coded(
                        codes::FILE_SIZE,
                        [
                            path.to_string(),
                            part.name.clone(),
                            self.settings.max_file_size.to_string(),
                        ],
                    )
                    .into());
                }
                files.push(part.clone());
            } else {
                let value = String::from_utf8(part.data.clone()).map_err(|e| {
                    malformed(format!("multipart field {} is not UTF-8: {e}", part.name), e)
                })?;
                fields.push((part.name.clone(), value));
            }
        }
        Ok(Body::Multipart { fields, files })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::Part;
    use serde_json::json;

    fn settings() -> Settings {
        Settings {
            max_request_size: 64,
            max_file_size: 8,
            ..Settings::default()
        }
    }

    #[test]
    fn test_json_body_and_query() {
        let settings = settings();
        let req = Request::new("POST", "/a?x=1").with_json(&json!({"k": "v"}));
        let content = ContentReader::new(&settings)
            .read(&req, "/a", ContentType::ApplicationJson)
            .unwrap();
        assert_eq!(content.body, Body::Json(json!({"k": "v"})));
        assert_eq!(content.field("x").as_deref(), Some("1"));
    }

    #[test]
    fn test_empty_json_is_null() {
        let settings = settings();
        let req = Request::new("POST", "/a").with_body("  ");
        let content = ContentReader::new(&settings)
            .read(&req, "/a", ContentType::ApplicationJson)
            .unwrap();
        assert_eq!(content.body, Body::Json(serde_json::Value::Null));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let settings = settings();
        let req = Request::new("POST", "/a").with_body("{nope");
        let err = ContentReader::new(&settings)
            .read(&req, "/a", ContentType::ApplicationJson)
            .unwrap_err();
        assert!(matches!(err, ContentError::Malformed { .. }));
        assert!(err.to_string().starts_with("invalid JSON body"));
    }

    #[test]
    fn test_request_size_limit() {
        let settings = settings();
        let req = Request::new("POST", "/a").with_body(vec![b'a'; 65]);
        let err = ContentReader::new(&settings)
            .read(&req, "/a", ContentType::TextPlain)
            .unwrap_err();
        match err {
            ContentError::Message(m) => {
                assert_eq!(m.code(), Some(codes::CONTENT_SIZE));
                assert_eq!(m.args(), ["/a", "64"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_multipart_split_and_file_limit() {
        let settings = settings();
        let req = Request::new("POST", "/up")
            .with_part(Part::field("title", "hello"))
            .with_part(Part::file("doc", "a.txt", b"small".to_vec()));
        let content = ContentReader::new(&settings)
            .read(&req, "/up", ContentType::MultipartFormData)
            .unwrap();
        assert_eq!(content.field("title").as_deref(), Some("hello"));
        assert_eq!(content.files().len(), 1);

        let req = Request::new("POST", "/up").with_part(Part::file("doc", "b.bin", vec![0; 9]));
        let err = ContentReader::new(&settings)
            .read(&req, "/up", ContentType::MultipartFormData)
            .unwrap_err();
        match err {
            ContentError::Message(m) => assert_eq!(m.code(), Some(codes::FILE_SIZE)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_form_body() {
        let settings = settings();
        let req = Request::new("POST", "/f").with_body("name=a+b&age=3");
        let content = ContentReader::new(&settings)
            .read(&req, "/f", ContentType::FormUrlEncoded)
            .unwrap();
        assert_eq!(content.field("name").as_deref(), Some("a b"));
        assert_eq!(content.field("age").as_deref(), Some("3"));
    }
}
