//! ISO-8601 video durations (`PT1H2M3S`).

use std::sync::LazyLock;

use regex::Regex;

/// Day/hour/minute/second components. Live streams report `P0D`.
static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$").expect("valid regex")
});

/// Parse an ISO-8601 duration into whole seconds.
///
/// Returns `None` for anything that is not a `P[nD][T[nH][nM][nS]]` value.
pub fn parse_iso8601(raw: &str) -> Option<u64> {
    let caps = ISO_DURATION.captures(raw.trim())?;

    let part = |index: usize, scale: u64| -> Option<u64> {
        match caps.get(index) {
            Some(m) => m.as_str().parse::<u64>().ok()?.checked_mul(scale),
            None => Some(0),
        }
    };

    [part(1, 86_400)?, part(2, 3_600)?, part(3, 60)?, part(4, 1)?]
        .into_iter()
        .try_fold(0u64, u64::checked_add)
}

/// Render seconds as `m:ss`, or `h:mm:ss` from one hour up.
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
