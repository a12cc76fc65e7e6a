// Typed operations and request parameters for the booking service
use std::fmt;
use url::form_urlencoded;

use crate::error::{BookingError, BookingResult};

pub const MAX_CORES: u32 = 64;
pub const MAX_RAM_MB: u32 = 256 * 1024;
pub const MAX_PRICE_PER_HOUR: f64 = 2.0;

/// Every operation the booking service exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingOperation {
    BookMachine,
    GetActiveBookingIds,
    GetBookingStatus,
    GetBookingPassword,
    GetSudoPassword,
    GetMachineSpec,
    GetCoreCount,
    GetEcu,
    GetCloseReason,
    CancelBooking,
}

impl BookingOperation {
    /// Name of the operation as it appears in the service URL.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingOperation::BookMachine => "BookMachine",
            BookingOperation::GetActiveBookingIds => "GetActiveBookingIDs",
            BookingOperation::GetBookingStatus => "GetBookingStatus",
            BookingOperation::GetBookingPassword => "GetBookingPassword",
            BookingOperation::GetSudoPassword => "GetSudoPassword",
            BookingOperation::GetMachineSpec => "GetMachineSpec",
            BookingOperation::GetCoreCount => "GetCoreCount",
            BookingOperation::GetEcu => "GetECU",
            BookingOperation::GetCloseReason => "GetCloseReason",
            BookingOperation::CancelBooking => "CancelBooking",
        }
    }
}

impl fmt::Display for BookingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

/// Ordered query parameters for a single request. Pairs are serialized in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pairs: Vec<(&'static str, ParamValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, value: impl Into<ParamValue>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: &'static str, value: impl Into<ParamValue>) {
        self.pairs.push((key, value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `key=value` pairs joined by `&`, form-urlencoded.
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            serializer.append_pair(key, &value.to_string());
        }
        serializer.finish()
    }
}

/// Constraints for a machine to book.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRequirements {
    pub min_cores: u32,
    /// Megabytes
    pub min_ram: u32,
    /// Currency units per hour
    pub max_price: f64,
    pub bits: u32,
    pub min_ecu: u32,
}

impl Default for NodeRequirements {
    fn default() -> Self {
        Self {
            min_cores: 1,
            min_ram: 0,
            max_price: MAX_PRICE_PER_HOUR,
            bits: 64,
            min_ecu: 1,
        }
    }
}

impl NodeRequirements {
    pub fn new(min_cores: u32, min_ram: u32, max_price: f64, bits: u32, min_ecu: u32) -> Self {
        Self {
            min_cores,
            min_ram,
            max_price,
            bits,
            min_ecu,
        }
    }

    pub fn validate(&self) -> BookingResult<()> {
        if self.min_cores < 1 || self.min_cores > MAX_CORES {
            return Err(BookingError::InvalidArgument(format!(
                "minimum cores must be between 1 and {}, got {}",
                MAX_CORES, self.min_cores
            )));
        }
        if self.min_ram > MAX_RAM_MB {
            return Err(BookingError::InvalidArgument(format!(
                "minimum RAM must be between 0 and {} (MB), got {}",
                MAX_RAM_MB, self.min_ram
            )));
        }
        // NaN fails the range check too
        if !(0.0..=MAX_PRICE_PER_HOUR).contains(&self.max_price) {
            return Err(BookingError::InvalidArgument(format!(
                "maximum price must be between 0 and {} per hour, got {}",
                MAX_PRICE_PER_HOUR, self.max_price
            )));
        }
        if self.bits != 32 && self.bits != 64 {
            return Err(BookingError::InvalidArgument(format!(
                "bits must be either 32 or 64, got {}",
                self.bits
            )));
        }
        if self.min_ecu < 1 {
            return Err(BookingError::InvalidArgument(
                "minimum ECU must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .with("minCores", self.min_cores)
            .with("minRam", self.min_ram)
            .with("maxPrice", self.max_price)
            .with("bits", self.bits)
            .with("minECU", self.min_ecu)
    }
}

pub fn booking_params(booking_id: i64) -> BookingResult<QueryParams> {
    if booking_id < 0 {
        return Err(BookingError::InvalidArgument(format!(
            "booking ID must not be negative, got {}",
            booking_id
        )));
    }
    Ok(QueryParams::new().with("bookingID", booking_id))
}
