//! Duration strings: `"30"`, `"1.5"`, `"30s"`, `"500ms"`, `"2m"`.

use std::time::Duration;

/// Parse a duration string.
///
/// A bare number is read as seconds and may be fractional. Returns `None`
/// for anything unparseable, negative, or non-finite.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        parse_seconds(secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        parse_seconds(s)
    }
}

fn parse_seconds(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let secs = s.parse::<f64>().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}
