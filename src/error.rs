//! Unified error types for the edge firmware.
//!
//! Startup failures (`DiscoveryError`, `IdentityError`, `ConfigError`) are
//! fatal and bubble up to `main`.  Per-device problems during a poll cycle
//! never surface here: they become a [`ReadStatus`](crate::poll::ReadStatus)
//! on that device's reading instead.
//!
//! All variants are `Copy` so they can be logged and passed around without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fatal startup path funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The 1-Wire bus could not be brought up or searched.
    Discovery(DiscoveryError),
    /// The hardware MAC address could not be read.
    Identity(IdentityError),
    /// A topic could not be built from the configured root.
    Topic(TopicError),
    /// Configuration is invalid.
    Config(ConfigError),
    /// A payload could not be encoded.
    Codec(CodecError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery(e) => write!(f, "discovery: {e}"),
            Self::Identity(e) => write!(f, "identity: {e}"),
            Self::Topic(e) => write!(f, "topic: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Codec(e) => write!(f, "codec: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

/// Electrical / driver level failure on the 1-Wire line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The line stayed low when released (short to ground or missing pull-up).
    LineStuckLow,
    /// Reading or driving the GPIO failed.
    PinFault,
    /// The GPIO driver could not be created.
    DriverInit,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LineStuckLow => write!(f, "bus line stuck low"),
            Self::PinFault => write!(f, "GPIO access failed"),
            Self::DriverInit => write!(f, "GPIO driver init failed"),
        }
    }
}

impl std::error::Error for BusError {}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryError {
    /// The bus driver failed to initialise.
    BusInit(BusError),
    /// The bus failed while the ROM search was in progress.
    Search(BusError),
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusInit(e) => write!(f, "bus init failed: {e}"),
            Self::Search(e) => write!(f, "ROM search failed: {e}"),
        }
    }
}

impl std::error::Error for DiscoveryError {}

impl From<DiscoveryError> for Error {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// Identity errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityError {
    /// `esp_read_mac` returned the contained ESP-IDF error code.
    MacUnreadable(i32),
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacUnreadable(code) => write!(f, "MAC address unreadable (esp_err={code})"),
        }
    }
}

impl std::error::Error for IdentityError {}

impl From<IdentityError> for Error {
    fn from(e: IdentityError) -> Self {
        Self::Identity(e)
    }
}

// ---------------------------------------------------------------------------
// Topic / address errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicError {
    /// The configured publish root is empty.
    EmptyRoot,
    /// The root contains an MQTT wildcard (`+`, `#`) or a NUL.
    InvalidRoot,
    /// The finished topic would not fit its bounded buffer.
    TooLong,
}

impl fmt::Display for TopicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRoot => write!(f, "publish root is empty"),
            Self::InvalidRoot => write!(f, "publish root contains '+', '#' or NUL"),
            Self::TooLong => write!(f, "topic exceeds capacity"),
        }
    }
}

impl std::error::Error for TopicError {}

impl From<TopicError> for Error {
    fn from(e: TopicError) -> Self {
        Self::Topic(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressError {
    /// Not exactly 16 characters.
    Length,
    /// Contains a character outside `[0-9A-Fa-f]`.
    NotHex,
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length => write!(f, "address must be 16 hex digits"),
            Self::NotHex => write!(f, "address contains a non-hex character"),
        }
    }
}

impl std::error::Error for AddressError {}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Neither the 1-Wire nor the actuator component is enabled.
    NoComponents,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// The JSON overlay could not be parsed.
    Malformed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoComponents => write!(f, "no components enabled"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::Malformed => write!(f, "malformed config overlay"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// `serde_json` refused to encode the payload.
    Encode,
    /// A reading referenced an ordinal with no registered device.
    UnknownOrdinal(usize),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode => write!(f, "JSON encoding failed"),
            Self::UnknownOrdinal(n) => write!(f, "no device at ordinal {n}"),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

// ---------------------------------------------------------------------------
// Non-fatal conditions
// ---------------------------------------------------------------------------

/// More devices answered the ROM search than the registry can hold.
/// The first `capacity` devices in discovery order were kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityExceeded {
    pub found: usize,
    pub capacity: usize,
}

impl fmt::Display for CapacityExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "found {} devices, capacity {}; {} ignored",
            self.found,
            self.capacity,
            self.found - self.capacity
        )
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
