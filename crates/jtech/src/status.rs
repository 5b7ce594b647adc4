//! Zone status reply parser.
//!
//! A routed zone answers `Status{zone}.` with one or two routing lines, the
//! audio/video route first and the infrared route second:
//!
//! ```text
//! AV: 02->01
//! IR: 02->01
//! ```
//!
//! Each line is `<label>: <source>-><zone>`. A zone that is switched off
//! reports `OFF` in place of the source:
//!
//! ```text
//! AV:OFF->01
//! IR:OFF->01
//! ```
//!
//! The patterns below match that structure (a label run, two-digit fields,
//! whitespace runs) rather than the exact label text, so small firmware
//! differences in labels and spacing still parse.

use std::sync::OnceLock;

use regex_lite::Regex;

use jtech_core::types::ZoneStatus;

/// Label, colon, two-digit source, `->`, two-digit zone, whitespace; the
/// second (infrared) line is optional.
const ACTIVE_PATTERN: &str =
    r"[^\d\s:]+:\s*(\d{2})->\d{2}\s+(?:[^\d\s:]+:\s*(\d{2})->\d{2}\s)?";

/// `OFF` marker inside the first line, followed by a second line.
const INACTIVE_PATTERN: &str = r"[^\d\s]*OFF[^\d\s]*\d{2}\s+[^\d\s]+\d{2}\s";

fn active_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(ACTIVE_PATTERN).expect("active zone pattern is valid"))
}

fn inactive_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(INACTIVE_PATTERN).expect("inactive zone pattern is valid"))
}

/// Parse the reply to a zone status query.
///
/// Returns `None` when `text` is empty or matches neither the routed nor the
/// switched-off shape. `zone` is copied into the result unchanged.
///
/// # Example
///
/// ```
/// use jtech::status::parse_zone_status;
///
/// let status = parse_zone_status(1, "AV: 02->01\r\nIR: 03->01\r").unwrap();
/// assert!(status.power());
/// assert_eq!(status.av(), Some(2));
/// assert_eq!(status.ir(), Some(3));
///
/// assert!(parse_zone_status(1, "VA: 09-<01\r").is_none());
/// ```
pub fn parse_zone_status(zone: i32, text: &str) -> Option<ZoneStatus> {
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = active_pattern().captures(text) {
        let av = caps.get(1)?;
        // The AV record is the first arrow in the reply. A match further on
        // means the first record did not fit the routed shape (e.g. `OFF`).
        if text.find("->") != Some(av.end()) {
            return None;
        }
        let av = av.as_str().parse().ok()?;
        let ir = match caps.get(2) {
            Some(m) => Some(m.as_str().parse().ok()?),
            None => None,
        };
        return Some(ZoneStatus::on(zone, av, ir));
    }

    if inactive_pattern().is_match(text) {
        return Some(ZoneStatus::off(zone));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_compile() {
        assert!(Regex::new(ACTIVE_PATTERN).is_ok());
        assert!(Regex::new(INACTIVE_PATTERN).is_ok());
    }

    #[test]
    fn single_av_line() {
        assert_eq!(
            parse_zone_status(1, "AV: 02->01\r"),
            Some(ZoneStatus::on(1, 2, None))
        );
    }

    #[test]
    fn av_and_ir_lines() {
        assert_eq!(
            parse_zone_status(1, "AV: 02->01\r\nIR: 02->01\r"),
            Some(ZoneStatus::on(1, 2, Some(2)))
        );
    }

    #[test]
    fn av_and_ir_can_differ() {
        assert_eq!(
            parse_zone_status(4, "AV: 07->04\r\nIR: 03->04\r"),
            Some(ZoneStatus::on(4, 7, Some(3)))
        );
    }

    #[test]
    fn blank_line_between_records() {
        assert_eq!(
            parse_zone_status(2, "AV: 05->02\r\n\r\nIR: 06->02\r"),
            Some(ZoneStatus::on(2, 5, Some(6)))
        );
    }

    #[test]
    fn tolerates_label_and_spacing_variance() {
        assert_eq!(
            parse_zone_status(3, "HDMI:01->03\r\nIRX:  08->03\r"),
            Some(ZoneStatus::on(3, 1, Some(8)))
        );
    }

    #[test]
    fn leading_echo_is_skipped() {
        assert_eq!(
            parse_zone_status(1, "Status1.\r\nAV: 02->01\r\nIR: 02->01\r"),
            Some(ZoneStatus::on(1, 2, Some(2)))
        );
    }

    #[test]
    fn switched_off_zone() {
        let status = parse_zone_status(5, "AV:OFF->05\r\nIR:OFF->05\r").unwrap();
        assert_eq!(status, ZoneStatus::off(5));
        assert_eq!(status.av(), None);
        assert_eq!(status.ir(), None);
    }

    #[test]
    fn zone_is_copied_verbatim() {
        assert_eq!(parse_zone_status(42, "AV: 02->01\r").unwrap().zone(), 42);
    }

    #[test]
    fn ir_route_behind_off_av_is_rejected() {
        assert_eq!(parse_zone_status(1, "AV:OFF->01\r\nIR: 02->01\r"), None);
        assert_eq!(parse_zone_status(6, "AV:OFF->06\r\n\r\nIR:  03->06\r"), None);
    }

    #[test]
    fn malformed_arrow_is_rejected() {
        assert_eq!(parse_zone_status(1, "VA: 09-<01\r"), None);
    }

    #[test]
    fn blank_lines_are_rejected() {
        assert_eq!(parse_zone_status(10, "\r\n\r\n"), None);
    }

    #[test]
    fn empty_text_is_rejected() {
        assert_eq!(parse_zone_status(1, ""), None);
        assert_eq!(parse_zone_status(7, ""), None);
    }

    #[test]
    fn missing_terminator_is_rejected() {
        assert_eq!(parse_zone_status(1, "AV: 02->01"), None);
    }

    #[test]
    fn set_acknowledgements_are_not_status() {
        assert_eq!(parse_zone_status(1, "01 Open.\r"), None);
        assert_eq!(parse_zone_status(1, "01 Closed.\r"), None);
        assert_eq!(parse_zone_status(1, "01 To All.\r"), None);
    }
}
