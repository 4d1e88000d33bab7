//! The sensor node run loop.
//!
//! The node drains received bytes through the frame decoder. Command strings
//! arriving in Receive Packet frames go to the command table; replies travel
//! back to the sender in Transmit Request frames. Every report interval the
//! node reads its sensors and sends a report to the configured destination.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};
use xbee_api::{
    Address64, ApiId, ByteSink, ByteSource, DecoderEvent, FrameDecoder, FrameEncoder, FrameError,
    ReceivePacket, TransmitRequest, MAX_DECLARED_LENGTH, TRANSMIT_REQUEST_OVERHEAD,
};
use xbee_cmdline::{line_of, standard_commands, CmdLineError, CommandTable, LedColor, StatusIndicator};
use xbee_metrics::{metric_defs, MetricLabels};

use crate::config::NodeConfig;
use crate::error::NodeResult;
use crate::sensors::SensorSource;

/// Largest payload a Transmit Request can carry.
pub const MAX_TX_PAYLOAD: usize = MAX_DECLARED_LENGTH - TRANSMIT_REQUEST_OVERHEAD;

/// Counters kept by the node alongside the recorded metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub frames_received: u64,
    pub frames_sent: u64,
    pub bytes_sent: u64,
    pub decode_errors: u64,
    pub commands_executed: u64,
    pub commands_rejected: u64,
    pub reports_sent: u64,
}

/// A ZigBee sensor node.
pub struct SensorNode<R, W, S, I> {
    name: String,
    rx: R,
    decoder: FrameDecoder,
    encoder: FrameEncoder<W>,
    commands: CommandTable<I>,
    status: I,
    sensors: S,
    destination: Address64,
    report_interval: Duration,
    poll_interval: Duration,
    next_report: Option<Instant>,
    labels: MetricLabels,
    stats: NodeStats,
}

impl<R, W, S, I> SensorNode<R, W, S, I>
where
    R: ByteSource,
    W: ByteSink,
    S: SensorSource,
    I: StatusIndicator,
{
    pub fn new(config: &NodeConfig, rx: R, tx: W, sensors: S, status: I) -> NodeResult<Self> {
        Ok(SensorNode {
            name: config.name.clone(),
            rx,
            decoder: FrameDecoder::new()
                .with_mode(config.api_mode)
                .with_start_recovery(config.start_recovery),
            encoder: FrameEncoder::new(tx).with_mode(config.api_mode),
            commands: standard_commands().with_max_args(config.max_args),
            status,
            sensors,
            destination: config.destination()?,
            report_interval: config.report_interval(),
            poll_interval: config.poll_interval(),
            next_report: None,
            labels: MetricLabels::new(config.name.as_str(), "sensor"),
            stats: NodeStats::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stats(&self) -> NodeStats {
        self.stats
    }

    pub fn status(&self) -> &I {
        &self.status
    }

    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }

    pub fn rx_mut(&mut self) -> &mut R {
        &mut self.rx
    }

    pub fn tx(&self) -> &W {
        self.encoder.sink()
    }

    pub fn tx_mut(&mut self) -> &mut W {
        self.encoder.sink_mut()
    }

    /// Decode and handle every complete frame waiting in the receive source.
    ///
    /// Returns the number of valid frames handled.
    pub fn poll(&mut self) -> NodeResult<usize> {
        let mut handled = 0;
        loop {
            let outcome = match self.decoder.poll(&mut self.rx) {
                DecoderEvent::NeedMore => return Ok(handled),
                DecoderEvent::Error(e) => Err(e),
                DecoderEvent::FrameReady(frame) => Ok((frame.api_id, frame.data.to_vec())),
            };
            match outcome {
                Ok((api_id, data)) => {
                    handled += 1;
                    self.handle_frame(api_id, &data)?;
                }
                Err(e) => self.record_decode_error(e),
            }
        }
    }

    fn record_decode_error(&mut self, error: FrameError) {
        self.stats.decode_errors += 1;
        metrics::counter!(
            metric_defs::DECODE_ERRORS.name,
            &self.labels.with("error", error.kind_str())
        )
        .increment(1);
        debug!(node = %self.name, %error, "Dropped frame");
    }

    fn handle_frame(&mut self, api_id: ApiId, data: &[u8]) -> NodeResult<()> {
        self.stats.frames_received += 1;
        metrics::counter!(
            metric_defs::FRAMES_RECEIVED.name,
            &self.labels.with("api_id", api_id.name())
        )
        .increment(1);
        trace!(node = %self.name, %api_id, len = data.len(), "Frame received");

        match api_id {
            ApiId::ReceivePacket => match ReceivePacket::from_frame_data(data) {
                Ok(packet) => self.handle_command(&packet),
                Err(e) => {
                    warn!(node = %self.name, error = %e, "Malformed receive packet");
                    Ok(())
                }
            },
            ApiId::ModemStatus => {
                if let Some(status) = data.get(4) {
                    info!(node = %self.name, status = %format!("0x{:02X}", status), "Modem status");
                }
                Ok(())
            }
            ApiId::TransmitStatus => {
                if let (Some(frame_id), Some(delivery)) = (data.get(4), data.get(8)) {
                    debug!(node = %self.name, frame_id, delivery, "Transmit status");
                }
                Ok(())
            }
            other => {
                debug!(node = %self.name, api_id = %other, "Ignoring frame");
                Ok(())
            }
        }
    }

    fn handle_command(&mut self, packet: &ReceivePacket) -> NodeResult<()> {
        let line = line_of(&packet.data);
        metrics::histogram!(metric_defs::MESSAGE_SIZE.name, &self.labels.to_labels())
            .record(line.len() as f64);

        match self.commands.process(&mut self.status, line) {
            Ok(reply) => {
                self.stats.commands_executed += 1;
                let command = command_label(line);
                metrics::counter!(
                    metric_defs::COMMANDS_EXECUTED.name,
                    &self.labels.with("command", command.as_str())
                )
                .increment(1);
                debug!(node = %self.name, source = %packet.source, %command, "Command executed");

                if let Some(text) = reply {
                    self.reply(packet, text.as_bytes())?;
                }
            }
            Err(e) => {
                self.stats.commands_rejected += 1;
                metrics::counter!(
                    metric_defs::COMMANDS_REJECTED.name,
                    &self.labels.with("error", e.kind_str())
                )
                .increment(1);
                match e {
                    CmdLineError::BadCommand(_) => {
                        warn!(node = %self.name, source = %packet.source, "Bad command!")
                    }
                    CmdLineError::TooManyArgs { max } => warn!(
                        node = %self.name,
                        source = %packet.source,
                        max,
                        "Too many arguments for command processor!"
                    ),
                    other => warn!(node = %self.name, source = %packet.source, error = %other, "Command failed"),
                }
            }
        }
        Ok(())
    }

    fn reply(&mut self, packet: &ReceivePacket, text: &[u8]) -> NodeResult<()> {
        let payload = &text[..text.len().min(MAX_TX_PAYLOAD)];
        if payload.len() < text.len() {
            debug!(node = %self.name, len = text.len(), "Reply truncated");
        }
        let mut request = TransmitRequest::to_coordinator(payload.to_vec()).with_destination(packet.source);
        request.network_address = packet.network_address;
        self.send(&request)
    }

    fn send(&mut self, request: &TransmitRequest) -> NodeResult<()> {
        let written = self.encoder.send(request)?;
        self.stats.frames_sent += 1;
        self.stats.bytes_sent += written as u64;
        metrics::counter!(
            metric_defs::FRAMES_SENT.name,
            &self.labels.with("api_id", ApiId::TransmitRequest.name())
        )
        .increment(1);
        metrics::counter!(metric_defs::BYTES_SENT.name, &self.labels.to_labels())
            .increment(written as u64);
        Ok(())
    }

    /// Read the sensors and send a report to the destination.
    ///
    /// The status LED shows blue while the report is sent. Returns the report.
    pub fn send_report(&mut self) -> NodeResult<String> {
        let readings = self.sensors.read()?;
        let report = readings.to_report();

        let previous = self.status.color();
        self.status.set_color(LedColor::Blue);
        let request = TransmitRequest::to_coordinator(report.clone()).with_destination(self.destination);
        let sent = self.send(&request);
        self.status.set_color(previous);
        sent?;

        self.stats.reports_sent += 1;
        metrics::counter!(metric_defs::REPORTS_SENT.name, &self.labels.to_labels()).increment(1);
        for (sensor, value) in readings.values() {
            metrics::gauge!(metric_defs::SENSOR_VALUE.name, &self.labels.with("sensor", sensor)).set(value);
        }
        info!(node = %self.name, destination = %self.destination, %report, "Sensor report sent");
        Ok(report)
    }

    /// Send a report if one is due at `now`. The first report is due one
    /// interval after the first call.
    pub fn tick(&mut self, now: Instant) -> NodeResult<bool> {
        let due = *self.next_report.get_or_insert(now + self.report_interval);
        if now < due {
            return Ok(false);
        }
        self.send_report()?;
        // Skip missed intervals rather than sending a burst.
        let mut next = due + self.report_interval;
        while next <= now {
            next += self.report_interval;
        }
        self.next_report = Some(next);
        Ok(true)
    }

    /// Run until `shutdown` is set or the receive source closes.
    pub fn run(&mut self, shutdown: &AtomicBool) -> NodeResult<()> {
        info!(
            node = %self.name,
            destination = %self.destination,
            interval_secs = self.report_interval.as_secs(),
            "Sensor node running"
        );
        while !shutdown.load(Ordering::Relaxed) {
            let handled = self.poll()?;
            if self.rx.is_closed() {
                info!(node = %self.name, "Receive source closed");
                break;
            }
            self.tick(Instant::now())?;
            if handled == 0 && !self.rx.bytes_available() {
                thread::sleep(self.poll_interval);
            }
        }
        info!(node = %self.name, stats = ?self.stats, "Sensor node stopped");
        Ok(())
    }
}

/// Command name for metric labels; long test payloads are abbreviated.
fn command_label(line: &[u8]) -> String {
    let name = line
        .split(|&b| b == b' ')
        .find(|token| !token.is_empty())
        .unwrap_or_default();
    let name = String::from_utf8_lossy(name);
    let length = name.chars().count();
    if length > 16 {
        format!("{}..({})", name.chars().take(8).collect::<String>(), length)
    } else {
        name.into_owned()
    }
}
