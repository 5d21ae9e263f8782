//! HTTP error responses.
//!
//! Handlers return [`AppError`]; its `IntoResponse` impl renders the flat
//! `{"code", "message"}` JSON body the dashboard and gate clients parse.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gatekeeper_ticketing::TicketingError;
use serde::Serialize;
use std::fmt;

/// Failure classes this API answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    /// Missing or rejected admin credentials.
    Unauthorized,
    /// The requested record does not exist.
    NotFound,
    /// Anything the client cannot fix.
    Internal,
}

impl Kind {
    const fn status(self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn code(self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound => "NOT_FOUND",
            Self::Internal => "INTERNAL_SERVER_ERROR",
        }
    }
}

/// Error type returned by HTTP handlers.
///
/// Carries the client-facing class and message plus an optional internal
/// source. The source is logged on 5xx answers and never serialized.
///
/// # Examples
///
/// ```ignore
/// async fn handler(Path(code): Path<String>) -> Result<Json<Ticket>, AppError> {
///     let ticket = lookup(&code)
///         .await?
///         .ok_or_else(|| AppError::not_found("Ticket", &code))?;
///     Ok(Json(ticket))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    kind: Kind,
    message: String,
    source: Option<anyhow::Error>,
}

impl AppError {
    const fn new(kind: Kind, message: String) -> Self {
        Self {
            kind,
            message,
            source: None,
        }
    }

    fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// 401 with the given message.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(Kind::Unauthorized, message.into())
    }

    /// 404 for a named resource.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(Kind::NotFound, format!("{resource} {id} not found"))
    }

    /// 500 with a client-safe message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Kind::Internal, message.into())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.code(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.source {
            Some(source) => Some(source.as_ref()),
            None => None,
        }
    }
}

/// Wire shape of every error answer.
#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.kind == Kind::Internal {
            match &self.source {
                Some(source) => {
                    tracing::error!(code = self.kind.code(), error = %source, "{}", self.message);
                }
                None => tracing::error!(code = self.kind.code(), "{}", self.message),
            }
        }

        let status = self.kind.status();
        let body = ErrorBody {
            code: self.kind.code(),
            message: self.message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An unexpected error occurred").with_source(err)
    }
}

/// Domain failures surface as 500 by default. Handlers that can answer
/// more precisely (404 on a missing ticket, say) match before converting.
impl From<TicketingError> for AppError {
    fn from(err: TicketingError) -> Self {
        Self::internal("An unexpected error occurred").with_source(anyhow::Error::new(err))
    }
}
