// Client library for the remote compute-node booking service

pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod transport;

// Re-export key types for convenience
pub use client::{BookingClient, BookingDetails, BookingId, BookingStatus};
pub use config::{ClientConfig, PollConfig};
pub use error::{BookingError, BookingResult, ClientError};
pub use request::{BookingOperation, NodeRequirements, ParamValue, QueryParams};
pub use transport::{HttpTransport, Transport};
pub use tokio_util::sync::CancellationToken;
