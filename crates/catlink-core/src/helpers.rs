//! Formatting helpers for applications that display CAT values.

/// Format a frequency given in 10 Hz units as a human-readable MHz string.
///
/// The 5-byte CAT protocol carries eight BCD digits with 10 Hz resolution,
/// so `14_575_000` is 145.750.00 MHz.
///
/// # Example
///
/// ```
/// use catlink_core::format_freq_10hz;
///
/// assert_eq!(format_freq_10hz(14_575_000), "145.75000 MHz");
/// assert_eq!(format_freq_10hz(707_400), "7.07400 MHz");
/// ```
pub fn format_freq_10hz(freq_10hz: u32) -> String {
    let mhz = freq_10hz / 100_000;
    let rest = freq_10hz % 100_000;
    format!("{mhz}.{rest:05} MHz")
}
