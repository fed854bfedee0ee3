//! Hybrid logical clock module
//!
//! An HLC timestamp combines a coarse physical component (milliseconds since
//! the Unix epoch, upper 48 bits) with a logical tie-breaking counter (lower
//! 16 bits) in a single `u64`. The packed layout makes a plain unsigned
//! compare equivalent to the lexicographic (physical, logical) order, so
//! timestamps can be stored, shipped and compared as raw scalars.
//!
//! The module is split into:
//! - [`timestamp`]: the packed codec, ordering, diff and shift operations
//! - [`source`]: the wall clock abstraction (possibly non-monotonic)
//! - [`engine`]: the shared-state clock that issues and merges timestamps

pub mod engine;
pub mod source;
pub mod timestamp;


pub use engine::HlcClock;
pub use source::{ManualTimeSource, SystemTimeSource, TimeSource};
pub use timestamp::{HlcTimestamp, MsgTimestamp, OrderResult};
