use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::OnceLock;

use dashmap::DashMap;
use metrics::Key;
use prometheus::core::{Collector, Desc, Describer};
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, TextEncoder};
use tracing::{debug, warn};

use crate::config::MetricsConfig;
use crate::error::{Error, Result};
use crate::types::{FixedPrecisionCounter, FixedPrecisionGauge};

static RECORDER: OnceLock<Recorder> = OnceLock::new();

/// A [`metrics::Recorder`] that backs every counter and gauge with a
/// fixed-precision cell.
///
/// Cells are keyed by the series a key lands on after sanitizing, so
/// `app.hits` and `app_hits` share one cell. Histograms are not supported and
/// register as no-ops.
#[derive(Debug, Default)]
pub struct Recorder {
    config: MetricsConfig,
    descriptions: DashMap<String, String>,
    counters: DashMap<String, FixedPrecisionCounter>,
    gauges: DashMap<String, FixedPrecisionGauge>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::with_config(MetricsConfig::default())
    }

    pub fn with_config(config: MetricsConfig) -> Self {
        Self {
            config,
            descriptions: DashMap::new(),
            counters: DashMap::new(),
            gauges: DashMap::new(),
        }
    }

    pub fn init() -> Result<&'static Self> {
        Self::init_with(MetricsConfig::default())
    }

    /// Installs a process-wide recorder built from `config`.
    ///
    /// Only the first call installs; later calls fail because a global
    /// recorder is already set.
    pub fn init_with(config: MetricsConfig) -> Result<&'static Self> {
        config.validate()?;

        let recorder = RECORDER.get_or_init(|| Self::with_config(config));

        metrics::set_global_recorder(recorder)
            .map(|_| recorder)
            .map_err(|err| Error::Config {
                message: err.to_string(),
            })
    }

    pub fn current() -> Option<&'static Self> {
        RECORDER.get()
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Counter values keyed by `fq_name{label="value",...}`, as rendered.
    pub fn counters(&self) -> HashMap<String, f64> {
        self.counters
            .iter()
            .map(|entry| {
                let counter = entry.value();
                (crate::key::snapshot_key(counter.descriptor()), counter.value())
            })
            .collect()
    }

    pub fn gauges(&self) -> HashMap<String, f64> {
        self.gauges
            .iter()
            .map(|entry| {
                let gauge = entry.value();
                (crate::key::snapshot_key(gauge.descriptor()), gauge.value())
            })
            .collect()
    }

    /// Snapshots every metric, one family per name, sorted by name.
    pub fn gather(&self) -> Vec<MetricFamily> {
        let mut families: BTreeMap<String, MetricFamily> = BTreeMap::new();

        let collected = self
            .counters
            .iter()
            .flat_map(|entry| entry.value().collect())
            .chain(self.gauges.iter().flat_map(|entry| entry.value().collect()));

        for family in collected {
            match families.get_mut(family.get_name()) {
                Some(existing) => {
                    for metric in family.get_metric() {
                        existing.mut_metric().push(metric.clone());
                    }
                }
                None => {
                    families.insert(family.get_name().to_string(), family);
                }
            }
        }

        families.into_values().collect()
    }

    /// Renders [`gather`](Self::gather) in the Prometheus text format.
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&self.gather(), &mut buffer)
            .map_err(|err| Error::Encode {
                message: err.to_string(),
            })?;

        Ok(String::from_utf8(buffer)?)
    }

    fn describe(&self, key: &Key) -> Result<Desc> {
        let name = crate::key::metric_name(key.name());
        let help = self
            .descriptions
            .get(&name)
            .map(|help| help.value().clone())
            .filter(|help| !help.trim().is_empty())
            .unwrap_or_else(|| key.name().to_string());

        let mut opts = self.config.opts(&name, &help);
        opts.const_labels.extend(crate::key::labels(key));

        Ok(opts.describe()?)
    }

    fn counter(&self, key: &Key) -> Option<FixedPrecisionCounter> {
        let id = crate::key::series_id(key);

        if let Some(counter) = self.counters.get(&id) {
            return Some(counter.value().clone());
        }

        if self.gauges.contains_key(&id) {
            warn!(key = %key.name(), series = %id, "Series already registered as a gauge");
            return None;
        }

        let desc = match self.describe(key) {
            Ok(desc) => desc,
            Err(err) => {
                warn!(key = %key.name(), error = %err, "Cannot register counter");
                return None;
            }
        };

        let counter = self
            .counters
            .entry(id)
            .or_insert_with(|| {
                debug!(metric = %desc.fq_name, "Registered counter");
                FixedPrecisionCounter::new(desc, self.config.precision)
            })
            .value()
            .clone();

        Some(counter)
    }

    fn gauge(&self, key: &Key) -> Option<FixedPrecisionGauge> {
        let id = crate::key::series_id(key);

        if let Some(gauge) = self.gauges.get(&id) {
            return Some(gauge.value().clone());
        }

        if self.counters.contains_key(&id) {
            warn!(key = %key.name(), series = %id, "Series already registered as a counter");
            return None;
        }

        let desc = match self.describe(key) {
            Ok(desc) => desc,
            Err(err) => {
                warn!(key = %key.name(), error = %err, "Cannot register gauge");
                return None;
            }
        };

        let gauge = self
            .gauges
            .entry(id)
            .or_insert_with(|| {
                debug!(metric = %desc.fq_name, "Registered gauge");
                FixedPrecisionGauge::new(desc, self.config.precision)
            })
            .value()
            .clone();

        Some(gauge)
    }
}

impl metrics::Recorder for Recorder {
    fn describe_counter(
        &self,
        key: metrics::KeyName,
        _unit: Option<metrics::Unit>,
        description: metrics::SharedString,
    ) {
        self.descriptions
            .insert(crate::key::metric_name(key.as_str()), description.to_string());
    }

    fn describe_gauge(
        &self,
        key: metrics::KeyName,
        _unit: Option<metrics::Unit>,
        description: metrics::SharedString,
    ) {
        self.descriptions
            .insert(crate::key::metric_name(key.as_str()), description.to_string());
    }

    fn describe_histogram(
        &self,
        _key: metrics::KeyName,
        _unit: Option<metrics::Unit>,
        _description: metrics::SharedString,
    ) {
        //
    }

    fn register_counter(&self, key: &Key, _metadata: &metrics::Metadata<'_>) -> metrics::Counter {
        match self.counter(key) {
            Some(counter) => metrics::Counter::from_arc(Arc::new(counter)),
            None => metrics::Counter::noop(),
        }
    }

    fn register_gauge(&self, key: &Key, _metadata: &metrics::Metadata<'_>) -> metrics::Gauge {
        match self.gauge(key) {
            Some(gauge) => metrics::Gauge::from_arc(Arc::new(gauge)),
            None => metrics::Gauge::noop(),
        }
    }

    fn register_histogram(
        &self,
        key: &Key,
        _metadata: &metrics::Metadata<'_>,
    ) -> metrics::Histogram {
        debug!(key = %key.name(), "Histograms are not supported, ignoring");
        metrics::Histogram::noop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics::Recorder as _;

    static METADATA: metrics::Metadata<'static> =
        metrics::Metadata::new(module_path!(), metrics::Level::INFO, None);

    #[test]
    fn test_register_counter_returns_same_cell() {
        let recorder = Recorder::new();
        let key = Key::from_name("app.requests");

        recorder.register_counter(&key, &METADATA).increment(2);
        recorder.register_counter(&key, &METADATA).increment(3);

        assert_eq!(recorder.counters().get("app_requests"), Some(&5.0));
    }

    #[test]
    fn test_register_gauge_uses_configured_precision() {
        let recorder = Recorder::with_config(MetricsConfig {
            precision: 1,
            ..Default::default()
        });
        let key = Key::from_name("app.memory");

        let gauge = recorder.register_gauge(&key, &METADATA);
        gauge.increment(1.25);

        assert_eq!(recorder.gauges().get("app_memory"), Some(&1.2));
    }

    #[test]
    fn test_description_becomes_help() {
        let recorder = Recorder::new();

        recorder.describe_counter("app.jobs".into(), None, "Jobs processed".into());
        recorder
            .register_counter(&Key::from_name("app.jobs"), &METADATA)
            .increment(1);

        let families = recorder.gather();
        assert_eq!(families[0].get_help(), "Jobs processed");
    }

    #[test]
    fn test_gather_merges_labelled_series() {
        let recorder = Recorder::new();
        let get = Key::from_parts("api.calls", vec![metrics::Label::new("method", "GET")]);
        let post = Key::from_parts("api.calls", vec![metrics::Label::new("method", "POST")]);

        recorder.register_counter(&get, &METADATA).increment(1);
        recorder.register_counter(&post, &METADATA).increment(2);

        let families = recorder.gather();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].get_name(), "api_calls");
        assert_eq!(families[0].get_metric().len(), 2);
    }

    #[test]
    fn test_empty_description_falls_back_to_name() {
        let recorder = Recorder::new();

        recorder.describe_counter("jobs.done".into(), None, "".into());
        recorder
            .register_counter(&Key::from_name("jobs.done"), &METADATA)
            .increment(3);

        assert_eq!(recorder.counters().get("jobs_done"), Some(&3.0));
        assert_eq!(recorder.gather()[0].get_help(), "jobs.done");
    }

    #[test]
    fn test_sanitized_names_share_a_cell() {
        let recorder = Recorder::new();

        recorder
            .register_counter(&Key::from_name("app.hits"), &METADATA)
            .increment(1);
        recorder
            .register_counter(&Key::from_name("app_hits"), &METADATA)
            .increment(2);

        assert_eq!(recorder.counters().len(), 1);
        assert_eq!(recorder.counters().get("app_hits"), Some(&3.0));

        let families = recorder.gather();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].get_metric().len(), 1);
    }

    #[test]
    fn test_label_order_does_not_split_series() {
        let recorder = Recorder::new();
        let ab = Key::from_parts(
            "api.calls",
            vec![metrics::Label::new("a", "1"), metrics::Label::new("b", "2")],
        );
        let ba = Key::from_parts(
            "api.calls",
            vec![metrics::Label::new("b", "2"), metrics::Label::new("a", "1")],
        );

        recorder.register_counter(&ab, &METADATA).increment(1);
        recorder.register_counter(&ba, &METADATA).increment(1);

        assert_eq!(recorder.counters().get(r#"api_calls{a="1",b="2"}"#), Some(&2.0));
    }

    #[test]
    fn test_gauge_cannot_shadow_counter() {
        let recorder = Recorder::new();

        recorder
            .register_counter(&Key::from_name("app.load"), &METADATA)
            .increment(1);
        recorder
            .register_gauge(&Key::from_name("app_load"), &METADATA)
            .set(5.0);

        assert!(recorder.gauges().is_empty());
        assert_eq!(recorder.counters().get("app_load"), Some(&1.0));
    }

    #[test]
    fn test_snapshot_keys_match_exposition() {
        let recorder = Recorder::with_config(MetricsConfig {
            namespace: Some("loka".to_string()),
            subsystem: Some("proxy".to_string()),
            ..Default::default()
        });

        recorder
            .register_counter(&Key::from_name("shares"), &METADATA)
            .increment(4);

        assert_eq!(recorder.counters().get("loka_proxy_shares"), Some(&4.0));
        assert!(recorder.render().unwrap().contains("loka_proxy_shares 4"));
    }

    #[test]
    fn test_histograms_are_ignored() {
        let recorder = Recorder::new();

        recorder
            .register_histogram(&Key::from_name("app.latency"), &METADATA)
            .record(1.0);

        assert!(recorder.gather().is_empty());
    }
}
