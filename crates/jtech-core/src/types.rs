//! Core types shared by every matrix client.

use std::fmt;

/// Observed state of one output zone of the matrix.
///
/// Built fresh for every status query. When `power` is `false` both
/// routing fields are `None`; use [`ZoneStatus::on`] and [`ZoneStatus::off`]
/// to construct values that respect that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoneStatus {
    zone: i32,
    power: bool,
    av: Option<u8>,
    ir: Option<u8>,
}

impl ZoneStatus {
    /// A zone that is routed: `av` is the audio/video source, `ir` the
    /// infrared source if the matrix reported one.
    pub fn on(zone: i32, av: u8, ir: Option<u8>) -> Self {
        ZoneStatus {
            zone,
            power: true,
            av: Some(av),
            ir,
        }
    }

    /// A zone that is switched off.
    pub fn off(zone: i32) -> Self {
        ZoneStatus {
            zone,
            power: false,
            av: None,
            ir: None,
        }
    }

    /// The zone (output) number, exactly as passed to the query.
    pub fn zone(&self) -> i32 {
        self.zone
    }

    /// Whether the zone is currently active.
    pub fn power(&self) -> bool {
        self.power
    }

    /// Source routed to the audio/video path.
    pub fn av(&self) -> Option<u8> {
        self.av
    }

    /// Source routed to the infrared path.
    pub fn ir(&self) -> Option<u8> {
        self.ir
    }
}

impl fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.power {
            return write!(f, "Zone {}: off", self.zone);
        }
        write!(f, "Zone {}: on", self.zone)?;
        if let Some(av) = self.av {
            write!(f, ", AV {av}")?;
        }
        if let Some(ir) = self.ir {
            write!(f, ", IR {ir}")?;
        }
        Ok(())
    }
}
