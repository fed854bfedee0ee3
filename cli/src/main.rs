//! Meshclock CLI - Operator tool for inspecting HLC timestamps
//!
//! Usage:
//!   meshclock decode 65536003
//!   meshclock order 1000:3 1000:4
//!   meshclock diff 1500:0 1000:9
//!   meshclock shift 1000:3 500
//!   meshclock gen -n 5
//!   meshclock merge 1005:0 --node 0xb

use anyhow::Result;
use chrono::DateTime;
use clap::{Parser, Subcommand};
use meshclock_core::{HlcClock, HlcTimestamp, NodeId, OrderResult};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Emit machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a timestamp into its physical and logical components
    Decode {
        /// Timestamp, as `physical:logical` or a raw 64-bit scalar
        ts: HlcTimestamp,
    },

    /// Classify the causal order of two timestamps
    Order {
        ts1: HlcTimestamp,
        ts2: HlcTimestamp,
    },

    /// Signed physical difference `ts1 - ts2` in milliseconds (an estimate)
    Diff {
        ts1: HlcTimestamp,
        ts2: HlcTimestamp,
    },

    /// Shift a timestamp into the past, saturating at physical zero
    Shift {
        ts: HlcTimestamp,
        /// Milliseconds to subtract
        ms: u64,
    },

    /// Generate a run of timestamps from a fresh clock
    Gen {
        /// Number of timestamps to issue
        #[arg(short, long, default_value_t = 1)]
        count: usize,
    },

    /// Merge a remote send timestamp into a fresh clock and show the pair
    Merge {
        send_ts: HlcTimestamp,
        /// Sender node id (hex)
        #[arg(long, default_value = "0")]
        node: NodeId,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Decode { ts } => decode(ts, args.json),
        Command::Order { ts1, ts2 } => order(ts1, ts2, args.json),
        Command::Diff { ts1, ts2 } => {
            let diff = ts1.diff_ms(ts2);
            if args.json {
                println!("{}", json!({ "diff_ms": diff }));
            } else {
                println!("{diff} ms");
            }
        }
        Command::Shift { ts, ms } => decode(ts.subtract_ms(ms), args.json),
        Command::Gen { count } => {
            let clock = HlcClock::new();
            for _ in 0..count {
                let ts = clock.now();
                if args.json {
                    println!("{}", json!({ "ts": ts, "display": ts.to_string() }));
                } else {
                    println!("{ts}");
                }
            }
        }
        Command::Merge { send_ts, node } => {
            let clock = HlcClock::new();
            let msg = clock.update_on_receive(node, send_ts);
            if args.json {
                println!(
                    "{}",
                    json!({
                        "send_ts": msg.send_ts,
                        "recv_ts": msg.recv_ts,
                        "display": {
                            "send_ts": msg.send_ts.to_string(),
                            "recv_ts": msg.recv_ts.to_string(),
                        },
                    })
                );
            } else {
                println!("send: {}", msg.send_ts);
                println!("recv: {}", msg.recv_ts);
            }
        }
    }

    Ok(())
}

fn decode(ts: HlcTimestamp, as_json: bool) {
    let wall = DateTime::from_timestamp_millis(ts.physical() as i64)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| "out of range".to_string());

    if as_json {
        println!(
            "{}",
            json!({
                "raw": ts.as_raw(),
                "physical_ms": ts.physical(),
                "logical": ts.logical(),
                "wall_time": wall,
            })
        );
    } else {
        println!("raw:      {}", ts.as_raw());
        println!("physical: {} ms ({wall})", ts.physical());
        println!("logical:  {}", ts.logical());
    }
}

fn order(ts1: HlcTimestamp, ts2: HlcTimestamp, as_json: bool) {
    let verdict = match ts1.order(ts2) {
        OrderResult::HappensBefore => "happens-before",
        OrderResult::HappensAfter => "happens-after",
        OrderResult::Indeterminate => "indeterminate",
    };
    if as_json {
        println!("{}", json!({ "order": verdict }));
    } else {
        println!("{ts1} {verdict} {ts2}");
    }
}
