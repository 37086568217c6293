//! The NMEA transport checksum: XOR of every byte strictly between `$` and
//! `*`, asserted as two ASCII hex digits after the `*`.

/// XOR of all bytes of `body` (the span between `$` and `*`, exclusive).
pub fn compute(body: &[u8]) -> u8 {
    body.iter().fold(0, |acc, b| acc ^ b)
}

/// Renders a checksum the way instruments do: two uppercase hex digits.
pub fn to_hex(checksum: u8) -> String {
    format!("{checksum:02X}")
}

/// Parses the two bytes after `*`. Case-insensitive; `None` when either
/// byte is not a hex digit.
pub fn parse_hex_pair(high: u8, low: u8) -> Option<u8> {
    let h = (high as char).to_digit(16)?;
    let l = (low as char).to_digit(16)?;
    Some(((h << 4) | l) as u8)
}
