//! `POST /email`
//!
//! JSON callers get a status code and a short text; form callers get a
//! `303 See Other` to the configured success or failure page. Failure detail
//! is logged here and never written to the response.

use crate::error::{RelayError, RelayResult};
use crate::state::AppState;
use crate::submission::{DecodeError, SubmissionDecoder};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Redirect, Response},
    routing::post,
    Router,
};
use contact_sanitize::ValidationError;
use serde_json::json;
use tracing::{error, info_span, warn, Instrument};

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 256 * 1024;

pub const SUCCESS_MESSAGE: &str = "Email sent successfully";

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/email",
        post(send_email).layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
    )
}

async fn send_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let decoder = SubmissionDecoder::for_content_type(headers.get(header::CONTENT_TYPE));
    let span = info_span!("contact_request", decoder = decoder.as_str());

    let result = handle(&state, decoder, &headers, body)
        .instrument(span.clone())
        .await;

    span.in_scope(|| match result {
        Ok(()) => match decoder {
            SubmissionDecoder::Json => (StatusCode::OK, SUCCESS_MESSAGE).into_response(),
            SubmissionDecoder::Form => Redirect::to(&state.redirects.success).into_response(),
        },
        Err(err) => {
            log_failure(&err);
            match decoder {
                SubmissionDecoder::Json => (
                    err.status(),
                    Json(json!({ "error": err.public_message() })),
                )
                    .into_response(),
                // An unreadable form body never reached the pipeline
                SubmissionDecoder::Form if matches!(err, RelayError::Decode(_)) => {
                    (StatusCode::BAD_REQUEST, "Invalid form data").into_response()
                }
                SubmissionDecoder::Form => Redirect::to(&state.redirects.failure).into_response(),
            }
        }
    })
}

async fn handle(
    state: &AppState,
    decoder: SubmissionDecoder,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> RelayResult<()> {
    let body = body.map_err(|rejection| body_error(headers, rejection))?;
    let submission = decoder.decode(&body)?;
    state.pipeline.process(submission).await
}

/// An over-limit body is an oversized message; any other read failure is
/// an undecodable request.
fn body_error(headers: &HeaderMap, rejection: BytesRejection) -> RelayError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        let actual = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(MAX_BODY_BYTES + 1);
        return ValidationError::TooLarge {
            actual,
            max: MAX_BODY_BYTES,
        }
        .into();
    }
    DecodeError::Body(rejection.body_text()).into()
}

fn log_failure(err: &RelayError) {
    if err.is_client_error() {
        warn!(error = %err, status = %err.status(), "Submission refused");
    } else {
        error!(error = %err, status = %err.status(), "Submission failed");
    }
}
