//! Cross-node causal ordering: merging remote timestamps and classifying
//! send/receive order between two clock instances.

use meshclock_core::{HlcClock, HlcTimestamp, ManualTimeSource, NodeId, OrderResult};
use std::sync::Arc;

const NODE_A: NodeId = NodeId(0xa);
const NODE_B: NodeId = NodeId(0xb);

#[test]
fn sender_ahead_scenario() {
    // Local state sits at physical 1000; a message arrives stamped 1005.
    let source = Arc::new(ManualTimeSource::new(1_000));
    let clock = HlcClock::with_source(Arc::clone(&source));

    let send_ts = HlcTimestamp::new(1_005, 0);
    let msg = clock.update_on_receive(NODE_B, send_ts);

    // The sender's physical wins and the logical counter advances past it.
    assert_eq!(msg.recv_ts.physical(), 1_005);
    assert_eq!(msg.recv_ts.logical(), 1);
    assert_eq!(msg.send_ts, send_ts);
}

#[test]
fn recv_ts_always_happens_after_send_ts() {
    let local_source = Arc::new(ManualTimeSource::new(1_000));
    let local = HlcClock::with_source(Arc::clone(&local_source));

    let remote_source = Arc::new(ManualTimeSource::new(950));
    let remote = HlcClock::with_source(Arc::clone(&remote_source));

    // Drift the two wall clocks apart in both directions while messages
    // keep flowing from remote to local.
    for round in 0..1_000u64 {
        remote_source.set(950 + round * 3);
        local_source.set(1_000 + round);

        let send_ts = remote.now();
        let msg = local.update_on_receive(NODE_B, send_ts);
        assert_eq!(msg.recv_ts.order(msg.send_ts), OrderResult::HappensAfter);
        assert_eq!(msg.send_ts.order(msg.recv_ts), OrderResult::HappensBefore);
    }
}

#[test]
fn receive_establishes_causal_edge_for_later_now() {
    let source = Arc::new(ManualTimeSource::new(1_000));
    let clock = HlcClock::with_source(Arc::clone(&source));

    let msg = clock.update_on_receive(NODE_B, HlcTimestamp::new(5_000, 123));
    let after = clock.now();
    assert!(after > msg.recv_ts);
    assert!(clock.current() >= msg.recv_ts);
}

#[test]
fn state_never_regresses_on_stale_messages() {
    let source = Arc::new(ManualTimeSource::new(1_000));
    let clock = HlcClock::with_source(Arc::clone(&source));
    let high = clock.update_on_receive(NODE_B, HlcTimestamp::new(9_000, 0)).recv_ts;

    // A flood of old timestamps must not pull the clock backward.
    for physical in (0..100u64).map(|i| 100 + i) {
        let msg = clock.update_on_receive(NODE_A, HlcTimestamp::new(physical, 0));
        assert!(msg.recv_ts > high);
    }
}

#[test]
fn send_order_classifies_against_the_send_timestamp() {
    let source = Arc::new(ManualTimeSource::new(1_000));
    let clock = HlcClock::with_source(Arc::clone(&source));

    let early_local = clock.now();
    let msg = clock.update_on_receive(NODE_B, HlcTimestamp::new(2_000, 4));
    let late_local = clock.now();

    assert_eq!(early_local.send_order(&msg), OrderResult::HappensBefore);
    assert_eq!(late_local.send_order(&msg), OrderResult::HappensAfter);
    assert_eq!(msg.send_ts.send_order(&msg), OrderResult::Indeterminate);
}

#[test]
fn two_clocks_converge_through_exchange() {
    let source_a = Arc::new(ManualTimeSource::new(1_000));
    let source_b = Arc::new(ManualTimeSource::new(4_000));
    let a = HlcClock::with_source(Arc::clone(&source_a));
    let b = HlcClock::with_source(Arc::clone(&source_b));

    // A's clock is far behind B's. After one message from B, A's timestamps
    // order after everything B had issued at send time.
    let send_ts = b.now();
    let msg = a.update_on_receive(NODE_B, send_ts);
    assert!(msg.recv_ts > send_ts);

    // And the reply from A now orders after B's own state too.
    let reply_ts = a.now();
    let reply = b.update_on_receive(NODE_A, reply_ts);
    assert!(reply.recv_ts > reply_ts);
    assert!(reply.recv_ts > send_ts);
}
