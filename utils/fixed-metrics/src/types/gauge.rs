use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use prometheus::core::{Collector, Desc, Describer, Metric};
use prometheus::proto;
use prometheus::Opts;
use tracing::warn;

use crate::cell::FixedCell;
use crate::error::Result;
use crate::types::{family, snapshot};

/// Precision above which [`FixedPrecisionGauge::set_to_current_time`] can
/// overflow the underlying `i64`.
pub const TIME_SAFE_PRECISION: u32 = 9;

#[derive(Debug)]
struct GaugeCore {
    cell: FixedCell,
    desc: Desc,
}

/// A Prometheus gauge backed by a fixed-precision `i64` updated with atomic
/// stores and adds.
///
/// Clones share the same cell, so one handle can be registered with a
/// [`prometheus::Registry`] while another stays on the hot path.
#[derive(Debug, Clone)]
pub struct FixedPrecisionGauge {
    core: Arc<GaugeCore>,
}

impl FixedPrecisionGauge {
    pub fn new(desc: Desc, precision: u32) -> Self {
        if precision > TIME_SAFE_PRECISION {
            warn!(
                metric = %desc.fq_name,
                precision,
                "Precision above {} may overflow the underlying i64",
                TIME_SAFE_PRECISION
            );
        }

        Self {
            core: Arc::new(GaugeCore {
                cell: FixedCell::new(precision),
                desc,
            }),
        }
    }

    /// Builds the descriptor from `opts`: fully-qualified name, help and const labels.
    pub fn with_opts(opts: Opts, precision: u32) -> Result<Self> {
        Ok(Self::new(opts.describe()?, precision))
    }

    /// Stores `value`, truncated to a whole number before scaling.
    ///
    /// `set(0.5)` therefore stores 0 at any precision, while `add(0.5)` keeps
    /// the fraction.
    pub fn set(&self, value: f64) {
        self.core.cell.set(value);
    }

    pub fn inc(&self) {
        self.core.cell.add_whole(1);
    }

    pub fn dec(&self) {
        self.core.cell.add_whole(-1);
    }

    /// Adds `delta` after scaling it, truncating whatever falls below one unit
    /// of precision.
    pub fn add(&self, delta: f64) {
        self.core.cell.add(delta);
    }

    pub fn sub(&self, value: f64) {
        self.add(-value);
    }

    pub fn value(&self) -> f64 {
        self.core.cell.get()
    }

    /// Sets the gauge to the current Unix time in seconds.
    ///
    /// With a precision greater than 9 this can overflow the underlying `i64`.
    pub fn set_to_current_time(&self) {
        let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_secs() as f64,
            Err(before) => -(before.duration().as_secs() as f64),
        };

        self.set(now);
    }

    pub fn precision(&self) -> u32 {
        self.core.cell.precision()
    }

    pub fn descriptor(&self) -> &Desc {
        &self.core.desc
    }

    pub(crate) fn add_whole(&self, delta: i64) {
        self.core.cell.add_whole(delta);
    }

    pub(crate) fn raise_to_whole(&self, value: i64) {
        self.core.cell.raise_to_whole(value);
    }
}

impl Metric for FixedPrecisionGauge {
    fn metric(&self) -> proto::Metric {
        snapshot(&self.core.desc, self.value())
    }
}

impl Collector for FixedPrecisionGauge {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.core.desc]
    }

    fn collect(&self) -> Vec<proto::MetricFamily> {
        vec![family(&self.core.desc, self.metric())]
    }
}

impl metrics::GaugeFn for FixedPrecisionGauge {
    fn increment(&self, value: f64) {
        self.add(value);
    }

    fn decrement(&self, value: f64) {
        self.sub(value);
    }

    fn set(&self, value: f64) {
        FixedPrecisionGauge::set(self, value);
    }
}
