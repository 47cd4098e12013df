/// Normalises server timestamps to `YYYY-MM-DD HH:MM:SS`.
///
/// Accepts ISO 8601 (`2025-10-15T14:30:45.123`) or space-separated forms and
/// reads the wall-clock fields as-is, without any timezone conversion.
/// Anything else is returned unchanged.
pub fn format_timestamp(raw: &str) -> String {
    let b = raw.as_bytes();
    let digits = |range: std::ops::Range<usize>| b[range].iter().all(u8::is_ascii_digit);

    let well_formed = b.len() >= 19
        && digits(0..4)
        && b[4] == b'-'
        && digits(5..7)
        && b[7] == b'-'
        && digits(8..10)
        && (b[10] == b'T' || b[10] == b' ')
        && digits(11..13)
        && b[13] == b':'
        && digits(14..16)
        && b[16] == b':'
        && digits(17..19);

    if well_formed {
        format!("{} {}", &raw[0..10], &raw[11..19])
    } else {
        raw.to_string()
    }
}
