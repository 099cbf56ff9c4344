use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use dashmap::DashMap;
use prometheus::core::Desc;

static KEYS: OnceLock<DashMap<metrics::Key, String>> = OnceLock::new();

/// Identifies the Prometheus series a key lands on: sanitized name plus
/// sanitized labels in name order. Keys that differ only in characters
/// Prometheus cannot express share an id.
pub(crate) fn series_id(key: &metrics::Key) -> String {
    let keys = KEYS.get_or_init(Default::default);

    keys.entry(key.clone())
        .or_insert_with(|| {
            let name = metric_name(key.name());
            let labels: BTreeMap<String, String> = labels(key).into_iter().collect();

            if labels.is_empty() {
                name
            } else {
                format!("{}{{{}}}", name, render_labels(labels.iter()))
            }
        })
        .value()
        .to_string()
}

/// Renders a descriptor as `fq_name{label="value",...}` for snapshots, the
/// same way the text exposition names the series.
pub(crate) fn snapshot_key(desc: &Desc) -> String {
    if desc.const_label_pairs.is_empty() {
        return desc.fq_name.clone();
    }

    let labels = desc
        .const_label_pairs
        .iter()
        .map(|pair| (pair.get_name(), pair.get_value()));

    format!("{}{{{}}}", desc.fq_name, render_labels(labels))
}

fn render_labels<K, V>(labels: impl Iterator<Item = (K, V)>) -> String
where
    K: std::fmt::Display,
    V: std::fmt::Display,
{
    labels
        .map(|(name, value)| format!(r#"{}="{}""#, name, value))
        .collect::<Vec<String>>()
        .join(",")
}

/// Turns a `metrics` key name such as `app.requests.total` into a valid
/// Prometheus metric name (`app_requests_total`).
pub(crate) fn metric_name(name: &str) -> String {
    sanitize(name, true)
}

pub(crate) fn label_name(name: &str) -> String {
    sanitize(name, false)
}

/// Key labels as Prometheus const labels.
pub(crate) fn labels(key: &metrics::Key) -> HashMap<String, String> {
    key.labels()
        .map(|label| (label_name(label.key()), label.value().to_string()))
        .collect()
}

fn sanitize(name: &str, allow_colon: bool) -> String {
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || (allow_colon && c == ':') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }

    out
}
