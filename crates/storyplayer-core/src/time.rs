pub const DEFAULT_EVENT_DURATION_SECONDS: f64 = 10.0;

/// Parses `"SS"`, `"MM:SS"` or `"HH:MM:SS"` into seconds.
///
/// Every field may be fractional. Input that is neither colon-separated nor numeric yields 0.
#[must_use]
pub fn parse_time(input: &str) -> f64 {
    if input.is_empty() {
        return 0.0;
    }

    let parts: Vec<&str> = input.split(':').collect();
    let seconds = match parts.as_slice() {
        [minutes, seconds] => weighted_sum(&[(minutes, 60.0), (seconds, 1.0)]),
        [hours, minutes, seconds] => {
            weighted_sum(&[(hours, 3_600.0), (minutes, 60.0), (seconds, 1.0)])
        }
        _ => coerce_number(input),
    };

    seconds.filter(|value| value.is_finite()).unwrap_or(0.0)
}

/// Duration of a timeline event; anything that does not parse to a positive length falls back
/// to [`DEFAULT_EVENT_DURATION_SECONDS`].
#[must_use]
pub fn event_duration_seconds(raw: Option<&str>) -> f64 {
    let parsed = raw.map_or(0.0, parse_time);
    if parsed > 0.0 {
        parsed
    } else {
        DEFAULT_EVENT_DURATION_SECONDS
    }
}

/// Renders seconds as `HH:MM:SS:mmm`.
#[must_use]
pub fn format_timecode(seconds: f64) -> String {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1_000.0).floor() as u64
    } else {
        0
    };

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1_000;
    let millis = total_ms % 1_000;
    format!("{hours:02}:{minutes:02}:{secs:02}:{millis:03}")
}

fn weighted_sum(fields: &[(&&str, f64)]) -> Option<f64> {
    fields
        .iter()
        .map(|(field, weight)| coerce_number(field).map(|value| value * weight))
        .sum()
}

// Blank fields count as zero, so "1:" reads as one minute.
fn coerce_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }

    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
