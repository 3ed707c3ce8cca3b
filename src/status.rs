//! HTTP status codes as a typed enum.
//!
//! Use [`Status`] anywhere a status code is accepted — `Response::with_status`,
//! the response constructors, or [`Error::status`](crate::Error::status).

/// The status codes the framework and typical applications emit.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                  // 200
    Created,             // 201
    Accepted,            // 202
    NoContent,           // 204
    // ── 3xx Redirection ───────────────────────────────────────────────────────
    MovedPermanently,    // 301
    Found,               // 302
    SeeOther,            // 303
    NotModified,         // 304
    TemporaryRedirect,   // 307
    PermanentRedirect,   // 308
    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,          // 400
    Unauthorized,        // 401
    Forbidden,           // 403
    NotFound,            // 404
    MethodNotAllowed,    // 405
    Conflict,            // 409
    Gone,                // 410
    ContentTooLarge,     // 413
    UnprocessableContent, // 422
    TooManyRequests,     // 429
    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError, // 500
    NotImplemented,      // 501
    BadGateway,          // 502
    ServiceUnavailable,  // 503
}

impl Status {
    /// The numeric status code.
    pub fn code(self) -> u16 {
        match self {
            Self::Ok                   => 200,
            Self::Created              => 201,
            Self::Accepted             => 202,
            Self::NoContent            => 204,
            Self::MovedPermanently     => 301,
            Self::Found                => 302,
            Self::SeeOther             => 303,
            Self::NotModified          => 304,
            Self::TemporaryRedirect    => 307,
            Self::PermanentRedirect    => 308,
            Self::BadRequest           => 400,
            Self::Unauthorized         => 401,
            Self::Forbidden            => 403,
            Self::NotFound             => 404,
            Self::MethodNotAllowed     => 405,
            Self::Conflict             => 409,
            Self::Gone                 => 410,
            Self::ContentTooLarge      => 413,
            Self::UnprocessableContent => 422,
            Self::TooManyRequests      => 429,
            Self::InternalServerError  => 500,
            Self::NotImplemented       => 501,
            Self::BadGateway           => 502,
            Self::ServiceUnavailable   => 503,
        }
    }

    /// The RFC 9110 reason phrase, used on the wire status line.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Ok                   => "OK",
            Self::Created              => "Created",
            Self::Accepted             => "Accepted",
            Self::NoContent            => "No Content",
            Self::MovedPermanently     => "Moved Permanently",
            Self::Found                => "Found",
            Self::SeeOther             => "See Other",
            Self::NotModified          => "Not Modified",
            Self::TemporaryRedirect    => "Temporary Redirect",
            Self::PermanentRedirect    => "Permanent Redirect",
            Self::BadRequest           => "Bad Request",
            Self::Unauthorized         => "Unauthorized",
            Self::Forbidden            => "Forbidden",
            Self::NotFound             => "Not Found",
            Self::MethodNotAllowed     => "Method Not Allowed",
            Self::Conflict             => "Conflict",
            Self::Gone                 => "Gone",
            Self::ContentTooLarge      => "Content Too Large",
            Self::UnprocessableContent => "Unprocessable Content",
            Self::TooManyRequests      => "Too Many Requests",
            Self::InternalServerError  => "Internal Server Error",
            Self::NotImplemented       => "Not Implemented",
            Self::BadGateway           => "Bad Gateway",
            Self::ServiceUnavailable   => "Service Unavailable",
        }
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        s.code()
    }
}
