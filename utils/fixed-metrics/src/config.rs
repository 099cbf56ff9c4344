use std::collections::HashMap;

use prometheus::Opts;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Highest precision whose scale factor (`10^precision`) still fits an `i64`.
pub const MAX_PRECISION: u32 = 18;

/// Settings shared by every metric a [`Recorder`](crate::Recorder) creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Number of fractional digits kept by each cell (default 3)
    pub precision: u32,
    /// Prefix prepended to every metric name
    pub namespace: Option<String>,
    /// Second-level prefix placed between namespace and name
    pub subsystem: Option<String>,
    /// Labels attached to every metric
    pub const_labels: HashMap<String, String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            precision: 3,
            namespace: None,
            subsystem: None,
            const_labels: HashMap::new(),
        }
    }
}

impl MetricsConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: MetricsConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.precision > MAX_PRECISION {
            return Err(Error::Config {
                message: format!(
                    "precision {} exceeds maximum of {}",
                    self.precision, MAX_PRECISION
                ),
            });
        }

        if matches!(&self.namespace, Some(namespace) if namespace.trim().is_empty()) {
            return Err(Error::Config {
                message: "namespace must not be empty".to_string(),
            });
        }

        if matches!(&self.subsystem, Some(subsystem) if subsystem.trim().is_empty()) {
            return Err(Error::Config {
                message: "subsystem must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Build [`Opts`] for `name`, applying namespace, subsystem and const labels.
    pub fn opts(&self, name: &str, help: &str) -> Opts {
        let mut opts = Opts::new(name, help).const_labels(self.const_labels.clone());

        if let Some(namespace) = &self.namespace {
            opts = opts.namespace(namespace.as_str());
        }

        if let Some(subsystem) = &self.subsystem {
            opts = opts.subsystem(subsystem.as_str());
        }

        opts
    }
}
