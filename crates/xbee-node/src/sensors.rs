//! Sensor readings and the report string sent to the coordinator.

use std::fmt::Write;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SensorConfig;
use crate::error::NodeResult;

/// One set of readings from the node's sensors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReadings {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Hectopascals.
    pub pressure: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Lux.
    pub light: f64,
}

impl SensorReadings {
    /// Report string: `t<temp>|p<pres>|h<hum>|l<light>`.
    pub fn to_report(&self) -> String {
        let mut report = String::with_capacity(48);
        for (tag, value) in [
            ('t', self.temperature),
            ('p', self.pressure),
            ('h', self.humidity),
            ('l', self.light),
        ] {
            if !report.is_empty() {
                report.push('|');
            }
            report.push(tag);
            push_truncated(&mut report, value);
        }
        report
    }

    /// `(name, value)` pairs, for logs and gauges.
    pub fn values(&self) -> [(&'static str, f64); 4] {
        [
            ("temperature", self.temperature),
            ("pressure", self.pressure),
            ("humidity", self.humidity),
            ("light", self.light),
        ]
    }
}

/// Format `value` with two decimals, truncating toward zero.
pub fn format_truncated(value: f64) -> String {
    let mut out = String::new();
    push_truncated(&mut out, value);
    out
}

fn push_truncated(out: &mut String, value: f64) {
    let hundredths = (value * 100.0).trunc() as i64;
    let sign = if hundredths < 0 { "-" } else { "" };
    let magnitude = hundredths.unsigned_abs();
    // Fraction is zero-padded ("7.06"), never a bare integer ("7.6").
    let _ = write!(out, "{}{}.{:02}", sign, magnitude / 100, magnitude % 100);
}

/// Something that can read the node's sensors.
pub trait SensorSource {
    fn read(&mut self) -> NodeResult<SensorReadings>;
}

impl<S: SensorSource + ?Sized> SensorSource for Box<S> {
    fn read(&mut self) -> NodeResult<SensorReadings> {
        (**self).read()
    }
}

/// Always returns the same readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSensors(pub SensorReadings);

impl SensorSource for FixedSensors {
    fn read(&mut self) -> NodeResult<SensorReadings> {
        Ok(self.0)
    }
}

/// Readings that wander randomly around configured baselines.
#[derive(Debug)]
pub struct SimulatedSensors {
    baseline: SensorReadings,
    jitter: f64,
    rng: StdRng,
}

impl SimulatedSensors {
    pub fn new(config: &SensorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        SimulatedSensors {
            baseline: SensorReadings {
                temperature: config.temperature,
                pressure: config.pressure,
                humidity: config.humidity,
                light: config.light,
            },
            // Non-finite jitter would panic in `gen_range`.
            jitter: if config.jitter.is_finite() {
                config.jitter.abs()
            } else {
                0.0
            },
            rng,
        }
    }

    fn vary(&mut self, baseline: f64) -> f64 {
        if self.jitter == 0.0 {
            return baseline;
        }
        baseline * (1.0 + self.rng.gen_range(-self.jitter..=self.jitter))
    }
}

impl SensorSource for SimulatedSensors {
    fn read(&mut self) -> NodeResult<SensorReadings> {
        let baseline = self.baseline;
        Ok(SensorReadings {
            temperature: self.vary(baseline.temperature),
            pressure: self.vary(baseline.pressure),
            humidity: self.vary(baseline.humidity).clamp(0.0, 100.0),
            light: self.vary(baseline.light).max(0.0),
        })
    }
}
