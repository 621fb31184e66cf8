use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use seatlock_core::SeatError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    Seat(SeatError),
    ValidationError(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Seat(err) => match err {
                SeatError::NotFound(_) => StatusCode::NOT_FOUND,
                SeatError::AlreadyBooked(_) | SeatError::AlreadyLocked(_) | SeatError::NotLocked(_) => {
                    StatusCode::CONFLICT
                }
                SeatError::NotLockOwner(_) => StatusCode::FORBIDDEN,
                SeatError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            },
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (kind, message) = match self {
            AppError::Seat(err) => (err.kind(), err.to_string()),
            AppError::ValidationError(msg) => ("invalid_input", msg),
        };

        let body = Json(json!({
            "error": kind,
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl From<SeatError> for AppError {
    fn from(err: SeatError) -> Self {
        Self::Seat(err)
    }
}
