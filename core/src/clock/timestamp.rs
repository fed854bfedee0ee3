//! Packed HLC timestamp representation and pure operations on it

use crate::Error;
use minicbor::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bits reserved for the logical tie-breaking counter.
pub(crate) const LOGICAL_BITS: u32 = 16;
pub(crate) const LOGICAL_MASK: u64 = (1 << LOGICAL_BITS) - 1;

/// The physical component occupies the remaining 48 bits and wraps at 2^48.
pub(crate) const PHYSICAL_MASK: u64 = (1 << 48) - 1;

/// Hybrid logical clock timestamp
///
/// Packs milliseconds since the Unix epoch into the upper 48 bits and a
/// logical counter into the lower 16 bits. The derived `Ord` on the packed
/// value is exactly the lexicographic (physical, logical) order.
///
/// On the wire this is a single `u64`; both the CBOR and serde encodings are
/// transparent over the raw scalar.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, Serialize, Deserialize,
)]
#[cbor(transparent)]
#[serde(transparent)]
pub struct HlcTimestamp(#[n(0)] u64);

/// Result of ordering two HLC timestamps.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum OrderResult {
    /// The event with the first timestamp happened before.
    HappensBefore,
    /// The event with the first timestamp happened after.
    HappensAfter,
    /// The timestamps are bit-identical; nothing distinguishes them.
    Indeterminate,
}

impl HlcTimestamp {
    /// Pack a physical millisecond value and a logical counter.
    ///
    /// The physical component is truncated to 48 bits.
    #[inline]
    pub const fn new(physical_ms: u64, logical: u16) -> Self {
        Self(((physical_ms & PHYSICAL_MASK) << LOGICAL_BITS) | logical as u64)
    }

    /// Reconstruct a timestamp from its raw wire scalar.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw wire scalar.
    #[inline]
    pub const fn as_raw(&self) -> u64 {
        self.0
    }

    /// Physical component: milliseconds since the Unix epoch (upper 48 bits).
    #[inline]
    pub const fn physical(&self) -> u64 {
        self.0 >> LOGICAL_BITS
    }

    /// Logical tie-breaking counter (lower 16 bits).
    #[inline]
    pub const fn logical(&self) -> u16 {
        (self.0 & LOGICAL_MASK) as u16
    }

    /// The smallest timestamp strictly greater than `self`.
    ///
    /// Incrementing the packed value carries an exhausted logical counter
    /// into the physical field: (p, 65535) advances to (p + 1, 0). The
    /// engine relies on this to keep issuing strictly increasing values when
    /// the counter saturates within one millisecond.
    #[inline]
    pub(crate) const fn advance(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Classify the causal order of two same-origin timestamps.
    ///
    /// Physical components are compared first, logical counters break ties.
    /// [`OrderResult::Indeterminate`] is returned only for bit-identical
    /// inputs; identical timestamps are never silently treated as before or
    /// after one another.
    #[inline]
    pub fn order(self, other: HlcTimestamp) -> OrderResult {
        match self.0.cmp(&other.0) {
            std::cmp::Ordering::Less => OrderResult::HappensBefore,
            std::cmp::Ordering::Greater => OrderResult::HappensAfter,
            std::cmp::Ordering::Equal => OrderResult::Indeterminate,
        }
    }

    /// Order this local timestamp against a received message.
    ///
    /// `recv_ts` is constructed to always be causally after `send_ts`, so
    /// the comparison reduces to the send timestamp.
    #[inline]
    pub fn send_order(self, msg_ts: &MsgTimestamp) -> OrderResult {
        self.order(msg_ts.send_ts)
    }

    /// Difference between the physical components, in milliseconds.
    ///
    /// This is an estimate, not an exact interval: logical counter overflow
    /// and remote merges can advance the physical component past real wall
    /// time. Use it for threshold checks ("at least N ms apart"), never for
    /// interval accounting.
    #[inline]
    pub fn diff_ms(self, other: HlcTimestamp) -> i64 {
        self.physical() as i64 - other.physical() as i64
    }

    /// Shift the timestamp `ms` milliseconds into the past.
    ///
    /// The physical component saturates at zero; the logical counter is
    /// left unchanged. Pure; does not touch any clock state.
    #[inline]
    pub fn subtract_ms(self, ms: u64) -> HlcTimestamp {
        Self::new(self.physical().saturating_sub(ms), self.logical())
    }
}

/// Timestamp pair for a message receive event.
///
/// `recv_ts` is the local clock value computed at receipt and is guaranteed
/// to order strictly after `send_ts`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize, Debug)]
pub struct MsgTimestamp {
    /// The sender's HLC timestamp at the time the message was sent.
    #[n(0)]
    pub send_ts: HlcTimestamp,
    /// Local HLC timestamp at message receipt.
    #[n(1)]
    pub recv_ts: HlcTimestamp,
}

impl fmt::Debug for HlcTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HlcTimestamp({}:{})", self.physical(), self.logical())
    }
}

impl fmt::Display for HlcTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.physical(), self.logical())
    }
}

impl FromStr for HlcTimestamp {
    type Err = Error;

    /// Parses either the `physical:logical` display form or a bare raw
    /// scalar as carried on the wire.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidTimestamp(s.to_string());

        match s.split_once(':') {
            Some((physical, logical)) => {
                let physical: u64 = physical.parse().map_err(|_| invalid())?;
                let logical: u16 = logical.parse().map_err(|_| invalid())?;
                if physical > PHYSICAL_MASK {
                    return Err(invalid());
                }
                Ok(Self::new(physical, logical))
            }
            None => s.parse::<u64>().map(Self::from_raw).map_err(|_| invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_and_unpack() {
        let ts = HlcTimestamp::new(1000, 7);
        assert_eq!(ts.physical(), 1000);
        assert_eq!(ts.logical(), 7);
        assert_eq!(ts.as_raw(), (1000 << 16) | 7);
    }

    #[test]
    fn physical_truncates_to_48_bits() {
        let ts = HlcTimestamp::new(PHYSICAL_MASK + 5, 0);
        assert_eq!(ts.physical(), 4);
    }

    #[test]
    fn packed_compare_is_lexicographic() {
        let a = HlcTimestamp::new(1000, 9);
        let b = HlcTimestamp::new(1001, 0);
        let c = HlcTimestamp::new(1001, 1);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn advance_carries_into_physical() {
        let ts = HlcTimestamp::new(1000, u16::MAX);
        let next = ts.advance();
        assert_eq!(next.physical(), 1001);
        assert_eq!(next.logical(), 0);
    }

    #[test]
    fn order_classification() {
        let a = HlcTimestamp::new(1000, 2);
        let b = HlcTimestamp::new(1000, 3);
        assert_eq!(a.order(b), OrderResult::HappensBefore);
        assert_eq!(b.order(a), OrderResult::HappensAfter);
        assert_eq!(a.order(a), OrderResult::Indeterminate);
    }

    #[test]
    fn send_order_uses_send_timestamp() {
        let msg = MsgTimestamp {
            send_ts: HlcTimestamp::new(1000, 0),
            recv_ts: HlcTimestamp::new(1000, 1),
        };
        assert_eq!(
            HlcTimestamp::new(999, 5).send_order(&msg),
            OrderResult::HappensBefore
        );
        assert_eq!(
            HlcTimestamp::new(1000, 1).send_order(&msg),
            OrderResult::HappensAfter
        );
        assert_eq!(
            HlcTimestamp::new(1000, 0).send_order(&msg),
            OrderResult::Indeterminate
        );
    }

    #[test]
    fn diff_is_signed_physical_difference() {
        let a = HlcTimestamp::new(1500, 9);
        let b = HlcTimestamp::new(1000, 0);
        assert_eq!(a.diff_ms(b), 500);
        assert_eq!(b.diff_ms(a), -500);
        assert_eq!(a.diff_ms(a), 0);
    }

    #[test]
    fn subtract_shifts_and_saturates() {
        let ts = HlcTimestamp::new(1000, 3);
        let shifted = ts.subtract_ms(500);
        assert_eq!(shifted.physical(), 500);
        assert_eq!(shifted.logical(), 3);

        let saturated = ts.subtract_ms(2000);
        assert_eq!(saturated.physical(), 0);
        assert_eq!(saturated.logical(), 3);
    }

    #[test]
    fn parse_display_form_and_raw_form() {
        let ts = HlcTimestamp::new(1000, 3);
        assert_eq!(ts.to_string(), "1000:3");
        assert_eq!("1000:3".parse::<HlcTimestamp>().unwrap(), ts);
        assert_eq!(ts.as_raw().to_string().parse::<HlcTimestamp>().unwrap(), ts);

        assert!("".parse::<HlcTimestamp>().is_err());
        assert!("1000:".parse::<HlcTimestamp>().is_err());
        assert!("1000:70000".parse::<HlcTimestamp>().is_err());
        assert!("281474976710656:0".parse::<HlcTimestamp>().is_err());
    }
}
