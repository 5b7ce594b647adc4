//! J-Tech matrix command builders.
//!
//! All functions are pure: they produce frame bytes without performing any
//! I/O. Zone numbers are written exactly as given; source numbers are clamped
//! into the matrix's input range first.
//!
//! | Command | Frame |
//! |---|---|
//! | zone status | `Status{zone}.` |
//! | zone on / off | `{zone}@.` / `{zone}$.` |
//! | route source to zone | `{source}B{zone}.` |
//! | route source to all zones | `{source}All.` |

use crate::protocol::encode_frame;

/// Lowest input number on the matrix.
pub const MIN_SOURCE: i32 = 1;

/// Highest input number on the matrix.
pub const MAX_SOURCE: i32 = 8;

/// Clamp a source number into `MIN_SOURCE..=MAX_SOURCE`.
pub fn clamp_source(source: i32) -> i32 {
    source.clamp(MIN_SOURCE, MAX_SOURCE)
}

/// Build a "query zone status" command (`Status{zone}.`).
///
/// ```
/// use jtech::commands::cmd_zone_status;
///
/// assert_eq!(cmd_zone_status(1), b"Status1.\r");
/// ```
pub fn cmd_zone_status(zone: i32) -> Vec<u8> {
    encode_frame(&format!("Status{zone}."))
}

/// Build a "zone power" command.
///
/// - `{zone}@.` switches the zone on.
/// - `{zone}$.` switches it off.
pub fn cmd_set_zone_power(zone: i32, power: bool) -> Vec<u8> {
    let marker = if power { '@' } else { '$' };
    encode_frame(&format!("{zone}{marker}."))
}

/// Build a "route source to zone" command (`{source}B{zone}.`).
///
/// ```
/// use jtech::commands::cmd_set_zone_source;
///
/// assert_eq!(cmd_set_zone_source(1, 100), b"8B1.\r");
/// ```
pub fn cmd_set_zone_source(zone: i32, source: i32) -> Vec<u8> {
    encode_frame(&format!("{}B{zone}.", clamp_source(source)))
}

/// Build a "route source to every zone" command (`{source}All.`).
pub fn cmd_set_all_zone_source(source: i32) -> Vec<u8> {
    encode_frame(&format!("{}All.", clamp_source(source)))
}
