//! Scanners for the free-form unit strings upstream payloads carry.

/// Extracts the first `<number> kg` weight from a string, e.g. `"7 kg"` or
/// `"20kg checked"`. Returns `None` when no weight can be found.
pub(crate) fn parse_weight_kg(s: &str) -> Option<f64> {
    let lower = s.to_lowercase();
    let kg = lower.find("kg")?;
    number_ending_at(&lower, kg)
}

/// Extracts the `<number> kg` weight immediately preceding `label`, used
/// for combined allowance strings like `"7 kg cabin, 20 kg checked"`.
pub(crate) fn parse_weight_kg_before(s: &str, label: &str) -> Option<f64> {
    let lower = s.to_lowercase();
    let label_at = lower.find(label)?;
    let kg = lower[..label_at].rfind("kg")?;
    number_ending_at(&lower, kg)
}

/// Parses an `"Nh Mm"` travel-time string into total minutes. Either part
/// may be absent; anything unparseable counts as zero.
pub(crate) fn parse_travel_time(s: &str) -> u32 {
    let mut hours = 0;
    let mut minutes = 0;
    for token in s.split_whitespace() {
        if let Some(value) = token.strip_suffix('h') {
            hours = value.parse().unwrap_or(0);
        } else if let Some(value) = token.strip_suffix('m') {
            minutes = value.parse().unwrap_or(0);
        }
    }
    hours * 60 + minutes
}

fn number_ending_at(s: &str, end: usize) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut stop = end;
    while stop > 0 && bytes[stop - 1].is_ascii_whitespace() {
        stop -= 1;
    }
    let mut start = stop;
    while start > 0 && (bytes[start - 1].is_ascii_digit() || bytes[start - 1] == b'.') {
        start -= 1;
    }
    if start == stop {
        return None;
    }
    s[start..stop].parse().ok()
}
