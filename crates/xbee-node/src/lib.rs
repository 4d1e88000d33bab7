//! ZigBee sensor node.
//!
//! Runs the node side of an XBee ZigBee network on a host: commands from the
//! coordinator drive a status indicator, and sensor readings are reported on
//! a fixed interval. The radio is reached through a TCP bridge to its UART.
//!
//! ```rust,ignore
//! use xbee_node::{NodeConfig, SensorNode, SimulatedSensors, LogIndicator, UartLink};
//!
//! let config = NodeConfig::default();
//! let link = UartLink::connect(&config.uart)?;
//! let mut node = SensorNode::new(
//!     &config,
//!     link.rx,
//!     link.tx,
//!     SimulatedSensors::new(&config.sensors),
//!     LogIndicator::new(&config.name),
//! )?;
//! node.run(&shutdown)?;
//! ```

pub mod config;
pub mod error;
pub mod node;
pub mod sensors;
pub mod status;
pub mod uart;

pub use config::{NodeConfig, SensorConfig, UartConfig};
pub use error::{NodeError, NodeResult};
pub use node::{NodeStats, SensorNode, MAX_TX_PAYLOAD};
pub use sensors::{FixedSensors, SensorReadings, SensorSource, SimulatedSensors};
pub use status::LogIndicator;
pub use uart::{rx_queue, RxProducer, RxQueue, UartLink, UartReader, UartSink};
