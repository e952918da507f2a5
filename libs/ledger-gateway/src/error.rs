use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use ledger_api::{ErrorKind, LedgerError};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serve: {0}")]
    Serve(#[from] std::io::Error),
}

/// A [`LedgerError`] on its way out as an HTTP response.
///
/// The body is the serialized error so the HTTP transport can rebuild it
/// with its kind intact.
#[derive(Debug)]
pub(crate) struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        Self(e)
    }
}

pub(crate) fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Encoding
        | ErrorKind::QuerySyntax
        | ErrorKind::KeyConstruction
        | ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::LedgerWrite => StatusCode::CONFLICT,
        ErrorKind::LedgerCommunication => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Serialization | ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.kind());
        if status.is_server_error() {
            tracing::warn!(kind = %self.0.kind(), error = %self.0, "request failed");
        }
        (status, Json(self.0)).into_response()
    }
}
