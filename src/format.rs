//! Display formats for leaderboard scores and rich presence values

use serde::{Deserialize, Serialize};
use std::fmt;

const SECONDS_PER_MINUTE: u32 = 60;

/// How a computed value is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValueFormat {
    /// Plain integer
    #[default]
    Value,
    /// Six-digit zero-padded with a " Points" suffix
    Score,
    /// Frame count shown as MM:SS.hh
    TimeFrames,
    /// Seconds shown as MM:SS
    TimeSecs,
    /// Hundredths of a second shown as MM:SS.hh
    TimeMillisecs,
    /// Six-digit zero-padded
    Other,
}

impl ValueFormat {
    /// Parse a format name. Unknown names fall back to `Value`.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "VALUE" => ValueFormat::Value,
            "SECS" | "TIMESECS" => ValueFormat::TimeSecs,
            "FRAMES" | "TIME" => ValueFormat::TimeFrames,
            "POINTS" | "SCORE" => ValueFormat::Score,
            "MILLISECS" => ValueFormat::TimeMillisecs,
            "OTHER" => ValueFormat::Other,
            _ => ValueFormat::Value,
        }
    }

    /// Canonical name, accepted by `from_name`
    pub fn name(&self) -> &'static str {
        match self {
            ValueFormat::Value => "VALUE",
            ValueFormat::Score => "POINTS",
            ValueFormat::TimeFrames => "FRAMES",
            ValueFormat::TimeSecs => "SECS",
            ValueFormat::TimeMillisecs => "MILLISECS",
            ValueFormat::Other => "OTHER",
        }
    }

    /// Format a value, counting frames at 60 per second
    pub fn format(&self, value: u32) -> String {
        self.format_with_frame_rate(value, 60)
    }

    pub fn format_with_frame_rate(&self, value: u32, frames_per_second: u32) -> String {
        match self {
            ValueFormat::TimeFrames => {
                let fps = frames_per_second.max(1);
                let secs = value / fps;
                let mins = secs / SECONDS_PER_MINUTE;
                let hundredths = ((value % fps) as u64 * 100 / fps as u64) as u32;
                format!("{:02}:{:02}.{:02}", mins, secs % SECONDS_PER_MINUTE, hundredths)
            }
            ValueFormat::TimeSecs => {
                format!(
                    "{:02}:{:02}",
                    value / SECONDS_PER_MINUTE,
                    value % SECONDS_PER_MINUTE
                )
            }
            ValueFormat::TimeMillisecs => {
                let secs = value / 100;
                format!(
                    "{:02}:{:02}.{:02}",
                    secs / SECONDS_PER_MINUTE,
                    secs % SECONDS_PER_MINUTE,
                    value % 100
                )
            }
            // Scores are signed 32-bit quantities
            ValueFormat::Score => format!("{:06} Points", value as i32),
            ValueFormat::Value => format!("{}", value as i32),
            ValueFormat::Other => format!("{:06}", value as i32),
        }
    }
}

impl fmt::Display for ValueFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Format a value at 60 frames per second
pub fn format_value(value: u32, format: ValueFormat) -> String {
    format.format(value)
}
