//! Receive-range and operating-mode tables for FT-817 class radios.
//!
//! Frequencies on this protocol are eight BCD digits in 10 Hz units, so
//! every range below is expressed in 10 Hz units as well
//! (`14_575_000` = 145.750.00 MHz).

use std::ops::RangeInclusive;

/// Receivable frequency ranges, in 10 Hz units.
///
/// - 100 kHz to 56 MHz (general coverage HF + 6 m)
/// - 76 MHz to 154 MHz (broadcast FM, airband, 2 m)
/// - 420 MHz to 470 MHz (70 cm)
pub const RX_RANGES: &[RangeInclusive<u32>] = &[
    10_000..=5_600_000,
    7_600_000..=15_400_000,
    42_000_000..=47_000_000,
];

/// Whether the radio can tune to `freq_10hz`.
pub fn is_valid_rx_frequency(freq_10hz: u32) -> bool {
    RX_RANGES.iter().any(|range| range.contains(&freq_10hz))
}

/// One entry of the operating-mode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeEntry {
    /// Mode byte as reported in byte 4 of a frequency/mode reply.
    pub code: u8,
    /// Display name.
    pub name: &'static str,
    /// Whether the mode can be selected with the set-mode command. Narrow
    /// variants are reported but are chosen through the radio's filter menu.
    pub settable: bool,
}

const fn mode(code: u8, name: &'static str, settable: bool) -> ModeEntry {
    ModeEntry {
        code,
        name,
        settable,
    }
}

pub const MODES: &[ModeEntry] = &[
    mode(0x00, "LSB", true),
    mode(0x01, "USB", true),
    mode(0x02, "CW", true),
    mode(0x03, "CWR", true),
    mode(0x04, "AM", true),
    mode(0x06, "WFM", false),
    mode(0x08, "FM", true),
    mode(0x0A, "DIG", true),
    mode(0x0C, "PKT", true),
    mode(0x82, "CW-N", false),
    mode(0x83, "CWR-N", false),
    mode(0x88, "FM-N", false),
    mode(0x8A, "DIG-N", false),
];

/// Resolve a two-character hex mode id (`"08"`, `"0a"`) to its name.
///
/// Unknown or malformed ids come back unchanged; name resolution never fails.
pub fn mode_name_by_id(id: &str) -> String {
    Some(id)
        .filter(|id| id.len() == 2 && id.bytes().all(|b| b.is_ascii_hexdigit()))
        .and_then(|id| u8::from_str_radix(id, 16).ok())
        .and_then(|code| MODES.iter().find(|m| m.code == code))
        .map(|m| m.name.to_string())
        .unwrap_or_else(|| id.to_string())
}

/// Look up the code of a settable mode by name (case-insensitive).
pub fn settable_mode_by_name(name: &str) -> Option<u8> {
    MODES
        .iter()
        .find(|m| m.settable && m.name.eq_ignore_ascii_case(name))
        .map(|m| m.code)
}

/// Whether `code` may be sent with the set-mode command.
pub fn is_settable_mode(code: u8) -> bool {
    MODES.iter().any(|m| m.settable && m.code == code)
}
