//! Status indicator for hosts without an RGB LED.

use xbee_cmdline::{LedColor, StatusIndicator};

/// Logs colour changes and remembers the current colour.
#[derive(Debug, Clone)]
pub struct LogIndicator {
    node: String,
    color: LedColor,
    changes: u64,
}

impl LogIndicator {
    pub fn new(node: impl Into<String>) -> Self {
        LogIndicator {
            node: node.into(),
            color: LedColor::Off,
            changes: 0,
        }
    }

    /// Number of colour changes so far.
    pub fn changes(&self) -> u64 {
        self.changes
    }
}

impl StatusIndicator for LogIndicator {
    fn set_color(&mut self, color: LedColor) {
        if color != self.color {
            tracing::info!(node = %self.node, from = %self.color, to = %color, "Status LED");
            self.changes += 1;
        }
        self.color = color;
    }

    fn color(&self) -> LedColor {
        self.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remembers_color() {
        let mut led = LogIndicator::new("test");
        assert_eq!(led.color(), LedColor::Off);
        led.set_color(LedColor::Green);
        led.set_color(LedColor::Green);
        assert_eq!(led.color(), LedColor::Green);
        assert_eq!(led.changes(), 1);
    }
}
