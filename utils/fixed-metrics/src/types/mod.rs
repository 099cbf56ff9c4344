use prometheus::core::{Collector, Desc};
use prometheus::proto;

mod counter;
mod gauge;

pub use counter::FixedPrecisionCounter;
pub use gauge::{FixedPrecisionGauge, TIME_SAFE_PRECISION};

/// A metric that can move in both directions.
///
/// Implementors also answer [`Collector::desc`] with their descriptor and
/// [`Collector::collect`] with a snapshot of their current value.
pub trait Gauge: Collector {
    fn set(&self, value: f64);
    fn inc(&self);
    fn dec(&self);
    fn add(&self, delta: f64);
    fn sub(&self, value: f64);
    fn set_to_current_time(&self);
    fn value(&self) -> f64;
}

/// A metric that never decreases.
pub trait Counter: Collector {
    fn inc(&self);
    /// Panics if `value` is negative.
    fn add(&self, value: f64);
    fn value(&self) -> f64;
}

impl Gauge for FixedPrecisionGauge {
    fn set(&self, value: f64) {
        FixedPrecisionGauge::set(self, value);
    }

    fn inc(&self) {
        FixedPrecisionGauge::inc(self);
    }

    fn dec(&self) {
        FixedPrecisionGauge::dec(self);
    }

    fn add(&self, delta: f64) {
        FixedPrecisionGauge::add(self, delta);
    }

    fn sub(&self, value: f64) {
        FixedPrecisionGauge::sub(self, value);
    }

    fn set_to_current_time(&self) {
        FixedPrecisionGauge::set_to_current_time(self);
    }

    fn value(&self) -> f64 {
        FixedPrecisionGauge::value(self)
    }
}

impl Counter for FixedPrecisionCounter {
    fn inc(&self) {
        FixedPrecisionCounter::inc(self);
    }

    fn add(&self, value: f64) {
        FixedPrecisionCounter::add(self, value);
    }

    fn value(&self) -> f64 {
        FixedPrecisionCounter::value(self)
    }
}

/// Point-in-time snapshot slotted into the `counter` field of a Prometheus metric.
pub(crate) fn snapshot(desc: &Desc, value: f64) -> proto::Metric {
    let mut counter = proto::Counter::default();
    counter.set_value(value);

    let mut metric = proto::Metric::default();
    for label in &desc.const_label_pairs {
        metric.mut_label().push(label.clone());
    }
    metric.set_counter(counter);
    metric
}

pub(crate) fn family(desc: &Desc, metric: proto::Metric) -> proto::MetricFamily {
    let mut family = proto::MetricFamily::default();
    family.set_name(desc.fq_name.clone());
    family.set_help(desc.help.clone());
    family.set_field_type(proto::MetricType::COUNTER);
    family.mut_metric().push(metric);
    family
}
