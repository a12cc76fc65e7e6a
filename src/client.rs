// Booking client: the public method surface over the booking service
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{BookingError, BookingResult, ClientError};
use crate::request::{booking_params, BookingOperation, NodeRequirements, QueryParams};
use crate::response::{all_fields, first_field, parse_number, INT_FIELD_TAG};
use crate::transport::{HttpTransport, Transport};

pub type BookingId = i64;

/// Status reported by the service for a booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingStatus {
    Unknown,
    Ready,
    Closed,
    /// Any other state, kept verbatim
    Other(String),
}

impl BookingStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BookingStatus::Unknown => "Unknown",
            BookingStatus::Ready => "Ready",
            BookingStatus::Closed => "Closed",
            BookingStatus::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for BookingStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Unknown" => BookingStatus::Unknown,
            "Ready" => BookingStatus::Ready,
            "Closed" => BookingStatus::Closed,
            _ => BookingStatus::Other(value),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for BookingStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Snapshot of a booking's attributes, gathered with one call per field.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    pub booking_id: BookingId,
    pub status: BookingStatus,
    pub machine_spec: String,
    pub core_count: i64,
    pub ecu: i64,
    pub fetched_at: DateTime<Utc>,
}

pub struct BookingClient<T: Transport = HttpTransport> {
    config: ClientConfig,
    transport: T,
}

impl BookingClient<HttpTransport> {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self { config, transport })
    }
}

impl<T: Transport> BookingClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, ClientError> {
        config.validate()?;
        Ok(Self { config, transport })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Book a machine matching `requirements`. The booking is made
    /// immediately if a machine is available; the returned ID identifies it
    /// in every other call.
    pub async fn book_node(&self, requirements: &NodeRequirements) -> BookingResult<BookingId> {
        requirements.validate()?;

        let body = self
            .transport
            .send(BookingOperation::BookMachine, &requirements.to_params())
            .await?;
        let booking_id = parse_number(BookingOperation::BookMachine.as_str(), &first_field(&body)?)?;

        info!(booking_id, "booked node");
        Ok(booking_id)
    }

    /// IDs of all bookings currently active for this account.
    pub async fn get_active_booking_ids(&self) -> BookingResult<Vec<BookingId>> {
        let body = self
            .transport
            .send(BookingOperation::GetActiveBookingIds, &QueryParams::new())
            .await?;

        all_fields(&body, INT_FIELD_TAG)?
            .iter()
            .map(|id| parse_number("booking ID", id))
            .collect()
    }

    pub async fn get_booking_status(&self, booking_id: BookingId) -> BookingResult<BookingStatus> {
        self.query_booking(BookingOperation::GetBookingStatus, booking_id)
            .await
            .map(BookingStatus::from)
    }

    /// SSH login password for the booked machine.
    pub async fn get_booking_password(&self, booking_id: BookingId) -> BookingResult<String> {
        self.query_booking(BookingOperation::GetBookingPassword, booking_id)
            .await
    }

    /// Root password for the booked machine.
    pub async fn get_sudo_password(&self, booking_id: BookingId) -> BookingResult<String> {
        self.query_booking(BookingOperation::GetSudoPassword, booking_id)
            .await
    }

    /// Description of the hardware the machine runs on.
    pub async fn get_machine_spec(&self, booking_id: BookingId) -> BookingResult<String> {
        self.query_booking(BookingOperation::GetMachineSpec, booking_id)
            .await
    }

    /// Hardware cores assigned to the machine.
    pub async fn get_core_count(&self, booking_id: BookingId) -> BookingResult<i64> {
        let cores = self
            .query_booking(BookingOperation::GetCoreCount, booking_id)
            .await?;
        parse_number("core count", &cores)
    }

    /// Approximate ECU benchmark of the machine.
    pub async fn get_ecu(&self, booking_id: BookingId) -> BookingResult<i64> {
        let ecu = self
            .query_booking(BookingOperation::GetEcu, booking_id)
            .await?;
        parse_number("ECU", &ecu)
    }

    pub async fn get_close_reason(&self, booking_id: BookingId) -> BookingResult<String> {
        self.query_booking(BookingOperation::GetCloseReason, booking_id)
            .await
    }

    pub async fn cancel_booking(&self, booking_id: BookingId) -> BookingResult<()> {
        self.run_booking_operation(BookingOperation::CancelBooking, booking_id, false)
            .await?;
        info!(booking_id, "cancelled booking");
        Ok(())
    }

    pub async fn booking_details(&self, booking_id: BookingId) -> BookingResult<BookingDetails> {
        let status = self.get_booking_status(booking_id).await?;
        let machine_spec = self.get_machine_spec(booking_id).await?;
        let core_count = self.get_core_count(booking_id).await?;
        let ecu = self.get_ecu(booking_id).await?;

        Ok(BookingDetails {
            booking_id,
            status,
            machine_spec,
            core_count,
            ecu,
            fetched_at: Utc::now(),
        })
    }

    /// Wait until the booking is `Ready`, polling its status.
    ///
    /// Fails with `BookingClosed` if the booking closes first, and with
    /// `WaitTimeout` once the configured maximum wait has elapsed. With the
    /// default configuration this polls every 10 seconds without limit.
    pub async fn wait_ready(&self, booking_id: BookingId) -> BookingResult<()> {
        self.wait_ready_with_cancel(booking_id, &CancellationToken::new())
            .await
    }

    /// Same as [`wait_ready`](Self::wait_ready), but returns
    /// `WaitCancelled` as soon as `cancel` fires.
    pub async fn wait_ready_with_cancel(
        &self,
        booking_id: BookingId,
        cancel: &CancellationToken,
    ) -> BookingResult<()> {
        booking_params(booking_id)?;

        let poll = &self.config.poll;
        let started = Instant::now();
        let mut status = BookingStatus::Unknown;
        let mut attempt: u32 = 0;

        loop {
            match status {
                BookingStatus::Ready => {
                    info!(booking_id, polls = attempt, "booking ready");
                    return Ok(());
                }
                BookingStatus::Closed => {
                    warn!(booking_id, polls = attempt, "booking closed before becoming ready");
                    return Err(BookingError::BookingClosed { booking_id });
                }
                _ => (),
            }

            let mut interval = poll.interval_for(attempt);
            if let Some(max_wait) = poll.max_wait() {
                let elapsed = started.elapsed();
                if elapsed >= max_wait {
                    warn!(booking_id, polls = attempt, "gave up waiting for booking");
                    return Err(BookingError::WaitTimeout {
                        booking_id,
                        waited_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                    });
                }
                interval = interval.min(max_wait - elapsed);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(BookingError::WaitCancelled { booking_id });
                }
                _ = sleep(interval) => (),
            }

            status = self.get_booking_status(booking_id).await?;
            attempt = attempt.saturating_add(1);
            debug!(booking_id, attempt, %status, "polled booking status");
        }
    }

    async fn query_booking(
        &self,
        operation: BookingOperation,
        booking_id: BookingId,
    ) -> BookingResult<String> {
        self.run_booking_operation(operation, booking_id, true)
            .await?
            .ok_or_else(|| BookingError::Parse(format!("{} returned no value", operation)))
    }

    async fn run_booking_operation(
        &self,
        operation: BookingOperation,
        booking_id: BookingId,
        expect_result: bool,
    ) -> BookingResult<Option<String>> {
        let params = booking_params(booking_id)?;
        let body = self.transport.send(operation, &params).await?;

        if !expect_result {
            return Ok(None);
        }
        first_field(&body).map(Some)
    }
}
