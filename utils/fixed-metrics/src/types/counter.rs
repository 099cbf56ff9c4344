use prometheus::core::{Collector, Desc, Metric};
use prometheus::proto;
use prometheus::Opts;
use tracing::error;

use crate::error::Result;
use crate::types::{family, snapshot, FixedPrecisionGauge};

/// A Prometheus counter backed by a [`FixedPrecisionGauge`].
///
/// Only the non-decreasing half of the gauge surface is exposed, and adding a
/// negative value panics the way `prometheus::Counter` does.
#[derive(Debug, Clone)]
pub struct FixedPrecisionCounter {
    gauge: FixedPrecisionGauge,
}

impl FixedPrecisionCounter {
    pub fn new(desc: Desc, precision: u32) -> Self {
        Self {
            gauge: FixedPrecisionGauge::new(desc, precision),
        }
    }

    pub fn with_opts(opts: Opts, precision: u32) -> Result<Self> {
        Ok(Self {
            gauge: FixedPrecisionGauge::with_opts(opts, precision)?,
        })
    }

    /// Adds `value` to the counter.
    ///
    /// # Panics
    ///
    /// Panics if `value` is negative. The counter is left untouched.
    pub fn add(&self, value: f64) {
        if value < 0.0 {
            error!(
                metric = %self.gauge.descriptor().fq_name,
                value,
                "Rejected negative add on counter"
            );
            panic!("counter cannot decrease in value");
        }

        self.gauge.add(value);
    }

    pub fn inc(&self) {
        self.gauge.inc();
    }

    pub fn value(&self) -> f64 {
        self.gauge.value()
    }

    pub fn precision(&self) -> u32 {
        self.gauge.precision()
    }

    pub fn descriptor(&self) -> &Desc {
        self.gauge.descriptor()
    }
}

impl Metric for FixedPrecisionCounter {
    fn metric(&self) -> proto::Metric {
        snapshot(self.descriptor(), self.value())
    }
}

impl Collector for FixedPrecisionCounter {
    fn desc(&self) -> Vec<&Desc> {
        vec![self.descriptor()]
    }

    fn collect(&self) -> Vec<proto::MetricFamily> {
        vec![family(self.descriptor(), self.metric())]
    }
}

impl metrics::CounterFn for FixedPrecisionCounter {
    fn increment(&self, value: u64) {
        self.gauge.add_whole(i64::try_from(value).unwrap_or(i64::MAX));
    }

    /// Raises the counter to `value`; a lower `value` leaves it unchanged.
    fn absolute(&self, value: u64) {
        self.gauge.raise_to_whole(i64::try_from(value).unwrap_or(i64::MAX));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};

    fn counter(precision: u32) -> FixedPrecisionCounter {
        FixedPrecisionCounter::with_opts(Opts::new("test", "test help"), precision).unwrap()
    }

    #[test]
    fn test_counter_add() {
        let c = counter(3);

        c.add(1.0);
        assert_eq!(c.value(), 1.0);

        c.inc();
        c.add(0.125);
        assert_eq!(c.value(), 2.125);
    }

    #[test]
    #[should_panic(expected = "counter cannot decrease in value")]
    fn test_counter_direction() {
        let c = counter(3);

        c.add(1.0);
        c.add(-1.0);
    }

    #[test]
    fn test_rejected_add_leaves_value_unchanged() {
        let c = counter(3);
        c.add(1.0);

        let result = panic::catch_unwind(AssertUnwindSafe(|| c.add(-1.0)));

        assert!(result.is_err());
        assert_eq!(c.value(), 1.0);
    }

    #[test]
    fn test_zero_add_is_allowed() {
        let c = counter(2);

        c.add(0.0);
        c.add(-0.0);
        assert_eq!(c.value(), 0.0);
    }

    #[test]
    fn test_counter_fn() {
        use metrics::CounterFn;

        let c = counter(2);

        c.increment(3);
        assert_eq!(c.value(), 3.0);

        c.absolute(10);
        assert_eq!(c.value(), 10.0);

        c.absolute(4);
        assert_eq!(c.value(), 10.0);
    }

    #[test]
    fn test_counter_fn_large_values_stay_positive() {
        use metrics::CounterFn;

        let c = counter(0);
        c.increment(1 << 63);
        assert_eq!(c.value(), i64::MAX as f64);

        let c = counter(3);
        c.increment(u64::MAX);
        assert!(c.value() > 0.0);

        let c = counter(3);
        c.absolute(u64::MAX);
        assert!(c.value() > 0.0);
    }

    #[test]
    fn test_collect() {
        let c = counter(3);
        c.add(2.5);

        let families = c.collect();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].get_name(), "test");
        assert_eq!(families[0].get_metric()[0].get_counter().get_value(), 2.5);
    }
}
