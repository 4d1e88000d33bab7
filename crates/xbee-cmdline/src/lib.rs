//! ZigBee Command Line Processing
//!
//! Command strings arrive from the coordinator as the data of ZigBee Receive
//! Packet frames. This crate turns such a string into arguments and runs the
//! matching entry of a command table.
//!
//! # Processing Overview
//!
//! - The line ends at the first NUL byte or at the end of the data.
//! - Arguments are separated by one or more spaces.
//! - The first argument names the command; it is looked up in the table.
//! - At most `max_args` arguments (command included) are accepted.
//!
//! # Example
//!
//! ```rust,ignore
//! use xbee_cmdline::{standard_commands, CmdLineError};
//!
//! let table = standard_commands();
//! match table.process(&mut leds, b"on") {
//!     Ok(reply) => { /* send reply back, if any */ }
//!     Err(CmdLineError::BadCommand(_)) => log::warn!("Bad command!"),
//!     Err(e) => log::warn!("{}", e),
//! }
//! ```

mod commands;
mod error;
mod parser;
mod table;

pub use commands::*;
pub use error::*;
pub use parser::*;
pub use table::*;
