//! # Loka Fixed Metrics
//!
//! Prometheus counters and gauges backed by a fixed-precision `i64` that is
//! only ever touched with atomic loads, stores and adds.
//!
//! ## Overview
//!
//! The stock `prometheus::Gauge` keeps an `f64` and updates it with a
//! compare-and-swap loop. Under contention every writer retries. A fixed
//! precision cell instead stores `value * 10^precision` as an integer, so
//! every update is a single `fetch_add` and never retries. The price is a
//! small, bounded precision loss: each write is truncated toward zero to
//! `precision` fractional digits.
//!
//! - [`FixedPrecisionGauge`]: may go up and down (`set`, `inc`, `dec`, `add`, `sub`)
//! - [`FixedPrecisionCounter`]: wraps a gauge, exposes only `inc` and a
//!   non-negative `add`, and panics on negative adds
//!
//! Both implement [`prometheus::core::Collector`], so they can be registered
//! in a [`prometheus::Registry`], and the `metrics` facade traits
//! (`GaugeFn`, `CounterFn`), so a [`Recorder`] can hand them out from
//! `counter!` and `gauge!`.
//!
//! ## Quick Start
//!
//! ```rust
//! use loka_fixed_metrics::{FixedPrecisionCounter, FixedPrecisionGauge};
//! use prometheus::{Opts, Registry};
//!
//! let requests = FixedPrecisionCounter::with_opts(
//!     Opts::new("requests_total", "Requests served").namespace("loka"),
//!     3,
//! )
//! .expect("valid descriptor");
//! let in_flight = FixedPrecisionGauge::with_opts(Opts::new("in_flight", "Requests in flight"), 0)
//!     .expect("valid descriptor");
//!
//! let registry = Registry::new();
//! registry.register(Box::new(requests.clone())).unwrap();
//! registry.register(Box::new(in_flight.clone())).unwrap();
//!
//! in_flight.inc();
//! requests.add(0.25);
//! in_flight.dec();
//!
//! assert_eq!(requests.value(), 0.25);
//! assert_eq!(in_flight.value(), 0.0);
//! ```
//!
//! ## Precision
//!
//! | operation            | conversion                                 |
//! |----------------------|--------------------------------------------|
//! | `add(d)` / `sub(d)`  | `(d * 10^p) as i64`, scale then truncate   |
//! | `set(v)`             | `(v as i64) * 10^p`, truncate then scale   |
//! | `inc()` / `dec()`    | `±10^p`, no float conversion               |
//! | `value()`            | `raw as f64 / 10^p as f64`                 |
//!
//! `set` drops the fractional part of its argument entirely, so `set(0.5)`
//! stores 0 even at precision 3.
//!
//! Nothing is checked for overflow. With precision `p` the cell holds values
//! up to roughly `9.2e18 / 10^p`; beyond that it wraps. Precisions above 9
//! make [`FixedPrecisionGauge::set_to_current_time`] unsafe, and above 18 the
//! scale factor itself wraps.
//!
//! ## Thread Safety
//!
//! Every operation is a single atomic instruction on one `AtomicI64`:
//!
//! ```rust
//! use std::thread;
//! use loka_fixed_metrics::FixedPrecisionGauge;
//! use prometheus::Opts;
//!
//! let gauge = FixedPrecisionGauge::with_opts(Opts::new("workers", "Busy workers"), 0).unwrap();
//! let mut handles = vec![];
//!
//! for _ in 0..8 {
//!     let gauge = gauge.clone();
//!     handles.push(thread::spawn(move || {
//!         for _ in 0..1000 {
//!             gauge.inc();
//!         }
//!     }));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//!
//! assert_eq!(gauge.value(), 8000.0);
//! ```
//!
//! ## Examples
//!
//! - **`usage`**: registry export and `metrics` facade integration
//!
//! Run with: `cargo run --example usage`

pub(crate) mod cell;
pub(crate) mod key;
pub(crate) mod recorder;

pub mod config;
pub mod error;
pub mod types;

pub use config::MetricsConfig;
pub use error::{Error, Result};
pub use recorder::Recorder;
pub use types::{Counter, FixedPrecisionCounter, FixedPrecisionGauge, Gauge};

use prometheus::Opts;

/// Returns a [`Gauge`] backed by a fixed-precision `i64`.
pub fn new_gauge(opts: Opts, precision: u32) -> Result<Box<dyn Gauge>> {
    Ok(Box::new(FixedPrecisionGauge::with_opts(opts, precision)?))
}

/// Returns a [`Counter`] backed by a fixed-precision `i64`.
pub fn new_counter(opts: Opts, precision: u32) -> Result<Box<dyn Counter>> {
    Ok(Box::new(FixedPrecisionCounter::with_opts(opts, precision)?))
}
