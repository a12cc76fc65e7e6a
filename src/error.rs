// Error types for the booking client
use thiserror::Error;

use crate::client::BookingId;

pub type BookingResult<T> = Result<T, BookingError>;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error: {status_code} - {message}")]
    HttpStatus { status_code: u16, message: String },

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error("Booking {booking_id} was closed before it became ready")]
    BookingClosed { booking_id: BookingId },

    #[error("Booking {booking_id} not ready after {waited_ms}ms")]
    WaitTimeout { booking_id: BookingId, waited_ms: u64 },

    #[error("Wait for booking {booking_id} was cancelled")]
    WaitCancelled { booking_id: BookingId },
}

impl BookingError {
    /// True for failures where the request never produced a usable reply:
    /// connectivity problems and non-success HTTP statuses alike.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            BookingError::Network(_) | BookingError::HttpStatus { .. }
        )
    }
}

impl From<reqwest::Error> for BookingError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return BookingError::HttpStatus {
                status_code: status.as_u16(),
                message: err.to_string(),
            };
        }
        BookingError::Network(err.to_string())
    }
}

impl From<quick_xml::Error> for BookingError {
    fn from(err: quick_xml::Error) -> Self {
        BookingError::Parse(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}
