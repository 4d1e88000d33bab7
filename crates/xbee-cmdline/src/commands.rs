//! Built-in node commands.
//!
//! The node answers four commands from the coordinator:
//!
//! | Command | Effect |
//! |---------|--------|
//! | `help`  | Replies with the command list |
//! | `on`    | Status LED green |
//! | `off`   | Status LED red |
//! | 100 × `a` | Status LED blue; checks a full-size payload got through |

use std::fmt;

use crate::error::{CmdLineError, CmdResult};
use crate::table::{help_text, CommandTable, Invocation, Reply};

/// Status LED colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LedColor {
    /// LED dark; the state at power-up.
    #[default]
    Off,
    /// Set by `off`.
    Red,
    /// Set by `on`.
    Green,
    /// Set by the payload test and pulsed on each sensor report.
    Blue,
}

impl LedColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedColor::Off => "off",
            LedColor::Red => "red",
            LedColor::Green => "green",
            LedColor::Blue => "blue",
        }
    }
}

impl fmt::Display for LedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that can show the node's status colour.
pub trait StatusIndicator {
    /// Show `color`.
    fn set_color(&mut self, color: LedColor);
    /// Colour currently shown.
    fn color(&self) -> LedColor;
}

/// Name of the payload test command: 100 lowercase `a`.
pub const PAYLOAD_TEST_COMMAND: &str = concat!(
    "aaaaaaaaaaaaaaaaaaaaaaaaa",
    "aaaaaaaaaaaaaaaaaaaaaaaaa",
    "aaaaaaaaaaaaaaaaaaaaaaaaa",
    "aaaaaaaaaaaaaaaaaaaaaaaaa",
);

fn single_arg<C>(inv: &Invocation<'_, C>) -> CmdResult<()> {
    if inv.args.len() > 1 {
        return Err(CmdLineError::TooManyArgs { max: 1 });
    }
    Ok(())
}

fn cmd_help<C>(inv: &mut Invocation<'_, C>) -> CmdResult<Reply> {
    Ok(Some(help_text(inv.commands)))
}

fn cmd_on<C: StatusIndicator>(inv: &mut Invocation<'_, C>) -> CmdResult<Reply> {
    single_arg(inv)?;
    inv.target.set_color(LedColor::Green);
    Ok(None)
}

fn cmd_off<C: StatusIndicator>(inv: &mut Invocation<'_, C>) -> CmdResult<Reply> {
    single_arg(inv)?;
    inv.target.set_color(LedColor::Red);
    Ok(None)
}

fn cmd_payload_test<C: StatusIndicator>(inv: &mut Invocation<'_, C>) -> CmdResult<Reply> {
    single_arg(inv)?;
    inv.target.set_color(LedColor::Blue);
    Ok(None)
}

/// The node's command table.
pub fn standard_commands<C: StatusIndicator>() -> CommandTable<C> {
    CommandTable::new()
        .with_command("help", cmd_help::<C>, "Display list of commands")
        .with_command("on", cmd_on::<C>, "Turn on")
        .with_command("off", cmd_off::<C>, "Turn off")
        .with_command(PAYLOAD_TEST_COMMAND, cmd_payload_test::<C>, "Test data payload")
}
