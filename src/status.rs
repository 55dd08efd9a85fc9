//! HTTP status codes as a typed enum.
//!
//! Use [`Status`] anywhere a status code is accepted: `Response::status()`,
//! `Response::builder().status()`, or as a bare handler return value.
//!
//! ```rust
//! use quire::{Response, Status};
//!
//! Response::status(Status::NoContent);
//!
//! Response::builder()
//!     .status(Status::UnprocessableContent)
//!     .html("<p>title is required</p>");
//! ```

/// The status codes this site answers with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                   // 200
    NoContent,            // 204

    // ── 3xx Redirection ───────────────────────────────────────────────────────
    Found,                // 302
    SeeOther,             // 303

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,           // 400
    Forbidden,            // 403
    NotFound,             // 404
    MethodNotAllowed,     // 405
    UnprocessableContent, // 422

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError,  // 500
    ServiceUnavailable,   // 503
}

impl Status {
    /// Numeric code, e.g. `404`.
    pub fn code(self) -> u16 {
        self.into()
    }

    /// Canonical reason phrase, e.g. `"Not Found"`.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Ok                   => "OK",
            Self::NoContent            => "No Content",
            Self::Found                => "Found",
            Self::SeeOther             => "See Other",
            Self::BadRequest           => "Bad Request",
            Self::Forbidden            => "Forbidden",
            Self::NotFound             => "Not Found",
            Self::MethodNotAllowed     => "Method Not Allowed",
            Self::UnprocessableContent => "Unprocessable Content",
            Self::InternalServerError  => "Internal Server Error",
            Self::ServiceUnavailable   => "Service Unavailable",
        }
    }

    pub fn is_redirect(self) -> bool {
        matches!(self, Self::Found | Self::SeeOther)
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        match s {
            Status::Ok                   => 200,
            Status::NoContent            => 204,
            Status::Found                => 302,
            Status::SeeOther             => 303,
            Status::BadRequest           => 400,
            Status::Forbidden            => 403,
            Status::NotFound             => 404,
            Status::MethodNotAllowed     => 405,
            Status::UnprocessableContent => 422,
            Status::InternalServerError  => 500,
            Status::ServiceUnavailable   => 503,
        }
    }
}
