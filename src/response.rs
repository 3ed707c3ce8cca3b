//! Outgoing HTTP response type.
//!
//! A [`Response`] is an immutable value: constructors build one, and stages
//! that need to add or override a header (the session middleware setting its
//! cookie, for example) call [`Response::with_header`] to produce a new
//! value. Nothing mutates a response in place.

use std::collections::HashMap;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::status::Status;

/// An outgoing HTTP response.
///
/// ```rust
/// use trellis::{Response, Status};
///
/// Response::text("hello");
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::no_content();
/// Response::text("created").with_status(Status::Created);
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: Status,
    headers: HashMap<String, String>,
    body: Option<Vec<u8>>,
}

impl Response {
    /// An empty response with the given status and no headers.
    pub fn empty(status: Status) -> Self {
        Self { status, headers: HashMap::new(), body: None }
    }

    /// `200 OK` — `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::with_content_type("text/plain; charset=utf-8", body.into().into_bytes())
    }

    /// `200 OK` — `text/html; charset=utf-8`.
    pub fn html(body: impl Into<String>) -> Self {
        Self::with_content_type("text/html; charset=utf-8", body.into().into_bytes())
    }

    /// `200 OK` — `application/json`. Pass bytes from your serializer.
    pub fn json(body: Vec<u8>) -> Self {
        Self::with_content_type("application/json", body)
    }

    /// A redirect to `location` — 308 when `permanent`, 307 otherwise.
    pub fn redirect(location: &str, permanent: bool) -> Self {
        let status = if permanent {
            Status::PermanentRedirect
        } else {
            Status::TemporaryRedirect
        };
        Self::empty(status).with_header("Location", location)
    }

    /// `404 Not Found` with a plain-text body.
    pub fn not_found() -> Self {
        Self::text("Not Found").with_status(Status::NotFound)
    }

    /// `400 Bad Request` with a plain-text body.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::text(message).with_status(Status::BadRequest)
    }

    /// `401 Unauthorized` with a plain-text body.
    pub fn unauthorized() -> Self {
        Self::text("Unauthorized").with_status(Status::Unauthorized)
    }

    /// `403 Forbidden` with a plain-text body.
    pub fn forbidden() -> Self {
        Self::text("Forbidden").with_status(Status::Forbidden)
    }

    /// `204 No Content`.
    pub fn no_content() -> Self {
        Self::empty(Status::NoContent)
    }

    fn with_content_type(content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status: Status::Ok,
            headers: HashMap::from([("Content-Type".to_owned(), content_type.to_owned())]),
            body: Some(body),
        }
    }

    /// Produces a new response with `status` replaced.
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Produces a new response with `name: value` added, overwriting any
    /// existing value under that header name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Serializes the response onto the wire as HTTP/1.1.
    pub(crate) async fn write_to<W: AsyncWrite + Unpin>(
        &self,
        writer: &mut W,
    ) -> std::io::Result<()> {
        let head = format!(
            "HTTP/1.1 {} {}\r\n",
            self.status.code(),
            self.status.reason()
        );
        writer.write_all(head.as_bytes()).await?;
        let body_len = self.body.as_ref().map_or(0, Vec::len);
        writer
            .write_all(format!("content-length: {body_len}\r\n").as_bytes())
            .await?;
        for (name, value) in &self.headers {
            writer.write_all(format!("{name}: {value}\r\n").as_bytes()).await?;
        }
        writer.write_all(b"\r\n").await?;
        if let Some(body) = &self.body {
            writer.write_all(body).await?;
        }
        writer.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_sets_content_type_and_ok() {
        let res = Response::text("hi");
        assert_eq!(res.status(), Status::Ok);
        assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(res.body(), Some(&b"hi"[..]));
    }

    #[test]
    fn with_header_overwrites_existing_value() {
        let res = Response::text("x")
            .with_header("Set-Cookie", "a=1")
            .with_header("Set-Cookie", "b=2");
        assert_eq!(res.header("set-cookie"), Some("b=2"));
    }

    #[test]
    fn redirect_sets_location() {
        let res = Response::redirect("/login", false);
        assert_eq!(res.status(), Status::TemporaryRedirect);
        assert_eq!(res.header("location"), Some("/login"));
        assert!(res.body().is_none());
    }

    #[tokio::test]
    async fn write_to_emits_status_line_and_length() {
        let res = Response::text("ok");
        let mut out = Vec::new();
        res.write_to(&mut out).await.unwrap();
        let wire = String::from_utf8(out).unwrap();
        assert!(wire.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(wire.contains("content-length: 2\r\n"));
        assert!(wire.ends_with("\r\n\r\nok"));
    }
}
