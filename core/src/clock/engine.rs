//! Shared-state hybrid logical clock engine
//!
//! One [`HlcClock`] instance per process, shared between every thread that
//! stamps or merges events (typically behind an `Arc`). All mutation goes
//! through a compare-and-swap retry loop on a single packed `u64`, so every
//! operation completes in bounded time without blocking.

use crate::clock::source::{SystemTimeSource, TimeSource};
use crate::clock::timestamp::{HlcTimestamp, MsgTimestamp};
use crate::types::NodeId;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hybrid logical clock engine
///
/// Issues strictly increasing [`HlcTimestamp`]s and merges timestamps
/// received from remote nodes so that local state never orders before
/// anything it has causally observed.
///
/// Construction seeds the state from the time source; the value must be
/// constructed before it is shared, which gives the required
/// initialize-before-use sequencing for free.
pub struct HlcClock<S: TimeSource = SystemTimeSource> {
    /// Last issued packed timestamp; the only mutable clock state.
    last: AtomicU64,
    source: S,
    stats: ClockStats,
}

/// Diagnostic counters, updated with relaxed atomics off the hot path.
#[derive(Debug, Default)]
struct ClockStats {
    /// Number of remote merges via `update_on_receive`.
    remote_updates: AtomicU64,
    /// Number of logical counter exhaustions that advanced physical time.
    logical_overflows: AtomicU64,
    /// Node id of the most recent remote sender.
    last_remote_node: AtomicU64,
    /// Raw send timestamp of the most recent remote merge.
    last_remote_send: AtomicU64,
}

impl HlcClock<SystemTimeSource> {
    /// Create a clock driven by the system wall clock.
    pub fn new() -> Self {
        Self::with_source(SystemTimeSource)
    }
}

impl Default for HlcClock<SystemTimeSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TimeSource> HlcClock<S> {
    /// Create a clock driven by the given time source, seeded to the
    /// source's current time with a zero logical counter.
    pub fn with_source(source: S) -> Self {
        let seed = HlcTimestamp::new(source.now_ms(), 0);
        Self {
            last: AtomicU64::new(seed.as_raw()),
            source,
            stats: ClockStats::default(),
        }
    }

    /// Issue the next local timestamp.
    ///
    /// Every returned value is strictly greater than every value previously
    /// issued by this clock, across all concurrent callers, even while the
    /// wall clock stalls or moves backward.
    pub fn now(&self) -> HlcTimestamp {
        loop {
            let last = self.load_last();
            let candidate = self.local_candidate(last);
            if self.try_install(last, candidate) {
                return candidate;
            }
        }
    }

    /// Merge a remote sender's timestamp on message receipt.
    ///
    /// The returned `recv_ts` orders strictly after `send_ts`, after the
    /// previous clock state and after the local wall clock reading, so the
    /// clock only ever moves forward regardless of how far ahead or behind
    /// the sender is. `source` is recorded for diagnostics only.
    pub fn update_on_receive(&self, source: NodeId, send_ts: HlcTimestamp) -> MsgTimestamp {
        let recv_ts = loop {
            let last = self.load_last();
            // Classical HLC combine rule, expressed on the packed scalar:
            // strictly after the sender, the previous state and local time.
            // On a physical tie the max picks the larger logical counter.
            let candidate = self.local_candidate(last).max(self.bump(send_ts));
            if self.try_install(last, candidate) {
                break candidate;
            }
        };

        self.stats.remote_updates.fetch_add(1, Ordering::Relaxed);
        self.stats
            .last_remote_node
            .store(source.as_u64(), Ordering::Relaxed);
        self.stats
            .last_remote_send
            .store(send_ts.as_raw(), Ordering::Relaxed);

        tracing::debug!(
            source = %source,
            send_ts = %send_ts,
            recv_ts = %recv_ts,
            "merged remote timestamp"
        );

        MsgTimestamp { send_ts, recv_ts }
    }

    /// The most recently issued timestamp, without advancing the clock.
    pub fn current(&self) -> HlcTimestamp {
        self.load_last()
    }

    /// Write a read-only snapshot of the clock state to the log.
    ///
    /// With `verbose`, adds the decomposed fields and the provenance of the
    /// most recent remote merge. Never fails and never mutates state.
    pub fn dump(&self, verbose: bool) {
        let now = self.current();
        if !verbose {
            tracing::info!(hlc = %now, "hlc state");
            return;
        }

        let last_node = NodeId(self.stats.last_remote_node.load(Ordering::Relaxed));
        let last_send =
            HlcTimestamp::from_raw(self.stats.last_remote_send.load(Ordering::Relaxed));
        tracing::info!(
            hlc = %now,
            physical = now.physical(),
            logical = now.logical(),
            remote_updates = self.stats.remote_updates.load(Ordering::Relaxed),
            logical_overflows = self.stats.logical_overflows.load(Ordering::Relaxed),
            last_remote_node = %last_node,
            last_remote_send = %last_send,
            "hlc state"
        );
    }

    /// The value a local `now()` would install given the state `last`.
    fn local_candidate(&self, last: HlcTimestamp) -> HlcTimestamp {
        let physical_now = self.source.now_ms();
        if physical_now > last.physical() {
            HlcTimestamp::new(physical_now, 0)
        } else {
            // Wall clock tied or regressed: take the next logical tick.
            self.bump(last)
        }
    }

    /// Smallest timestamp strictly after `ts`, accounting for counter
    /// exhaustion: an exhausted counter carries into the physical field,
    /// trading exact wall-time fidelity for strict monotonicity. That trade
    /// is never silent.
    fn bump(&self, ts: HlcTimestamp) -> HlcTimestamp {
        if ts.logical() == u16::MAX {
            self.stats.logical_overflows.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                at = %ts,
                "logical counter exhausted, advancing physical component"
            );
        }
        ts.advance()
    }

    fn load_last(&self) -> HlcTimestamp {
        HlcTimestamp::from_raw(self.last.load(Ordering::Acquire))
    }

    /// Install `candidate` if the state is still `last`. Returns false when
    /// another caller won the race and the operation must retry.
    fn try_install(&self, last: HlcTimestamp, candidate: HlcTimestamp) -> bool {
        self.last
            .compare_exchange_weak(
                last.as_raw(),
                candidate.as_raw(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

impl<S: TimeSource> fmt::Debug for HlcClock<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HlcClock")
            .field("last", &self.current())
            .finish()
    }
}
