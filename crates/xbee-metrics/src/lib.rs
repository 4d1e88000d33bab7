//! Metric declarations for the XBee sensor node.
//!
//! Every metric the node records is declared once as a [`Metric`] constant in
//! [`metric_defs`], so names and label keys cannot drift between the places
//! that record them. The `metrics` crate is re-exported; without an installed
//! recorder all recording is a no-op.
//!
//! ```rust,ignore
//! use xbee_metrics::{describe_metrics, metric_defs, MetricLabels};
//!
//! describe_metrics();
//! let labels = MetricLabels::new("sensor-01", "sensor");
//! metrics::counter!(metric_defs::FRAMES_RECEIVED.name, &labels.to_labels()).increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// The kind of metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric declaration with its metadata.
///
/// ```rust
/// use xbee_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const FRAMES: Metric = Metric::counter("xbee.api.frames")
///     .with_description("Frames seen")
///     .with_unit(Unit::Count)
///     .with_labels(&["node"]);
///
/// assert_eq!(FRAMES.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    pub name: &'static str,
    pub kind: MetricKind,
    pub description: &'static str,
    pub unit: Option<Unit>,
    /// Label keys the metric is recorded with.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    pub const fn gauge(name: &'static str) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Register the description with the installed recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => describe_counter!(self.name, unit, self.description),
            (MetricKind::Counter, None) => describe_counter!(self.name, self.description),
            (MetricKind::Gauge, Some(unit)) => describe_gauge!(self.name, unit, self.description),
            (MetricKind::Gauge, None) => describe_gauge!(self.name, self.description),
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description)
            }
            (MetricKind::Histogram, None) => describe_histogram!(self.name, self.description),
        }
    }

    /// Unit name, or an empty string for unitless metrics.
    pub fn unit_str(&self) -> &'static str {
        self.unit.map(|unit| unit.as_str()).unwrap_or("")
    }
}

/// All metrics recorded by the node.
pub mod metric_defs {
    use super::{Metric, Unit};

    /// Labels present on every metric.
    pub const NODE_LABELS: &[&str] = &["node", "node_type"];

    // ========================================================================
    // API Frames
    // ========================================================================

    /// Frames that passed the checksum. Extra label: `api_id`.
    pub const FRAMES_RECEIVED: Metric = Metric::counter("xbee.api.frames_received")
        .with_description("API frames received with a valid checksum")
        .with_unit(Unit::Count)
        .with_labels(&["node", "node_type", "api_id"]);

    /// Frames written to the UART. Extra label: `api_id`.
    pub const FRAMES_SENT: Metric = Metric::counter("xbee.api.frames_sent")
        .with_description("API frames written to the UART")
        .with_unit(Unit::Count)
        .with_labels(&["node", "node_type", "api_id"]);

    /// Bytes written to the UART, escaping included.
    pub const BYTES_SENT: Metric = Metric::counter("xbee.api.bytes_sent")
        .with_description("Bytes written to the UART")
        .with_unit(Unit::Bytes)
        .with_labels(&["node", "node_type"]);

    /// Frames dropped by the decoder. Extra label: `error`.
    pub const DECODE_ERRORS: Metric = Metric::counter("xbee.api.decode_errors")
        .with_description("Frames dropped by the decoder")
        .with_unit(Unit::Count)
        .with_labels(&["node", "node_type", "error"]);

    /// Size of extracted Receive Packet messages.
    pub const MESSAGE_SIZE: Metric = Metric::histogram("xbee.api.message_size_bytes")
        .with_description("Size of received command messages")
        .with_unit(Unit::Bytes)
        .with_labels(&["node", "node_type"]);

    // ========================================================================
    // Commands
    // ========================================================================

    /// Commands that ran. Extra label: `command`.
    pub const COMMANDS_EXECUTED: Metric = Metric::counter("xbee.cmd.executed")
        .with_description("Commands executed")
        .with_unit(Unit::Count)
        .with_labels(&["node", "node_type", "command"]);

    /// Commands rejected by the processor. Extra label: `error`.
    pub const COMMANDS_REJECTED: Metric = Metric::counter("xbee.cmd.rejected")
        .with_description("Commands rejected by the command processor")
        .with_unit(Unit::Count)
        .with_labels(&["node", "node_type", "error"]);

    // ========================================================================
    // Sensor Reports
    // ========================================================================

    pub const REPORTS_SENT: Metric = Metric::counter("xbee.report.sent")
        .with_description("Sensor reports sent to the coordinator")
        .with_unit(Unit::Count)
        .with_labels(&["node", "node_type"]);

    /// Latest reading per sensor. Extra label: `sensor`.
    pub const SENSOR_VALUE: Metric = Metric::gauge("xbee.report.sensor_value")
        .with_description("Latest sensor reading")
        .with_labels(&["node", "node_type", "sensor"]);

    /// All metric definitions.
    pub const ALL: &[&Metric] = &[
        &FRAMES_RECEIVED,
        &FRAMES_SENT,
        &BYTES_SENT,
        &DECODE_ERRORS,
        &MESSAGE_SIZE,
        &COMMANDS_EXECUTED,
        &COMMANDS_REJECTED,
        &REPORTS_SENT,
        &SENSOR_VALUE,
    ];
}

/// Labels identifying the node a metric was recorded on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricLabels {
    pub node: String,
    pub node_type: String,
}

impl MetricLabels {
    pub fn new(node: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            node_type: node_type.into(),
        }
    }

    /// Labels in the `metrics` crate format.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![
            ("node", self.node.clone()),
            ("node_type", self.node_type.clone()),
        ]
    }

    /// Node labels plus one extra pair.
    pub fn with(&self, key: &'static str, value: impl Into<String>) -> Vec<(&'static str, String)> {
        let mut labels = self.to_labels();
        labels.push((key, value.into()));
        labels
    }
}

/// Register every metric description. Call once after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}
