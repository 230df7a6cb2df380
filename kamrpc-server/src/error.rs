//! REST error replies
//!
//! Every error leaves the gateway as a JSON string body with a status code:
//! 400 for a malformed request, 404 for a missing key or route, 405 for a
//! wrong method and 500 for anything that went wrong upstream.

use kamrpc_core::Error;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Rejection, Reply};

/// Failure of one REST request
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed input
    #[error("{0}")]
    BadRequest(String),

    /// The upstream call failed
    #[error(transparent)]
    Upstream(#[from] Error),
}

impl ApiError {
    /// Shorthand for a 400
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    /// HTTP status of this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(Error::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Reply for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed upstream");
        }
        error_reply(status, &self.to_string())
    }
}

/// Final reply of a handler
///
/// A handler that fails still answers, so sibling routes are never tried
/// after its upstream call.
pub(crate) fn finish(result: Result<Response, ApiError>) -> Response {
    result.unwrap_or_else(Reply::into_response)
}

/// JSON string body with `status`
pub(crate) fn error_reply(status: StatusCode, message: &str) -> Response {
    warp::reply::with_status(warp::reply::json(&message), status).into_response()
}

/// Map every rejection to a JSON error reply
///
/// Rejections only come from filters that run before a handler: unknown
/// paths, wrong methods, unreadable queries or bodies.
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "payload too large".to_string())
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported media type".to_string())
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "length required".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else {
        tracing::error!(rejection = ?err, "Unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
    };

    Ok(error_reply(status, &message))
}
