//! Meshclock Core Library
//!
//! Hybrid logical clock primitives for causal event ordering across a cluster
//! of loosely synchronized nodes. This library provides the clock engine used
//! to stamp cross-node events (conflict detection, recency comparisons,
//! expiry windows) without depending on tightly synchronized wall clocks.

pub mod clock;
pub mod types;

pub use clock::{
    HlcClock, HlcTimestamp, ManualTimeSource, MsgTimestamp, OrderResult, SystemTimeSource,
    TimeSource,
};
pub use types::NodeId;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types
///
/// The clock operations themselves are infallible; errors only arise at the
/// text parsing boundary (CLI input, config values).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid node id: {0}")]
    InvalidNodeId(String),
}
