//! Root handler.
//!
//! `GET /` answers `ok`, or the result of `SELECT 1` when a database is
//! configured. `GET /?error=<msg>` records `<msg>` as an error on the
//! request span and returns an empty 200.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::Span;

use crate::observability::tracing::record_error;
use crate::server::AppState;

/// Query parameters accepted by the root handler.
#[derive(Debug, Default)]
pub struct RootParams {
    /// Message to record as a simulated failure.
    pub error: Option<String>,
}

impl RootParams {
    /// Pick the parameters out of decoded query pairs.
    ///
    /// Only the first `error` pair counts; later repeats are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let error = pairs
            .into_iter()
            .find(|(key, _)| key == "error")
            .map(|(_, value)| value);
        Self { error }
    }
}

/// Handle `GET /`.
pub async fn root(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let span = Span::current();
    let params = RootParams::from_pairs(pairs);

    if let Some(message) = params.error.filter(|m| !m.is_empty()) {
        record_error(&span, &message);
        return StatusCode::OK.into_response();
    }

    let Some(database) = &state.database else {
        return "ok".into_response();
    };

    match database.select_one().await {
        Ok(value) => value.to_string().into_response(),
        Err(e) => {
            let message = e.to_string();
            tracing::error!(error = %message, "health query failed");
            record_error(&span, &message);
            (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
        }
    }
}
