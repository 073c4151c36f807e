use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use roster_parser::{InvalidEvent, ReplyError};
use serde::Serialize;

use crate::rules_file::RulesError;
use crate::store::StoreError;
use crate::vision::{ImageError, VisionError};

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request could not be parsed: {0}")]
    Body(String),
    #[error("request body is too large")]
    TooLarge,
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    InvalidEvent(#[from] InvalidEvent),
    #[error("nothing to update")]
    EmptyPatch,
    #[error("there are no events to export")]
    NothingToExport,
    #[error(transparent)]
    Vision(#[from] VisionError),
    #[error(transparent)]
    Reply(#[from] ReplyError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Rules(#[from] RulesError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Body(_)
            | ApiError::Image(_)
            | ApiError::InvalidEvent(_)
            | ApiError::EmptyPatch => StatusCode::BAD_REQUEST,
            ApiError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NothingToExport | ApiError::Store(StoreError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Vision(VisionError::Authentication(_)) => StatusCode::UNAUTHORIZED,
            ApiError::Vision(_) | ApiError::Reply(_) | ApiError::Store(_) | ApiError::Rules(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{self}");
        } else {
            log::debug!("Rejected request: {self}");
        }

        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
