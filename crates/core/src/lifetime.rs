const MINUTE: i64 = 60;
const HOUR: i64 = 3600;
const DAY: i64 = 86400;

/// Renders a remaining lifetime in seconds using the largest unit that
/// fits, with floor division. Unit names match the console output of the
/// original tooling, uninflected plural included ("1 horas").
///
/// Panics when `secs` is negative: a negative remaining lifetime is a
/// caller bug, not a runtime condition.
pub fn human_lifetime(secs: i64) -> String {
    assert!(secs >= 0, "remaining lifetime must be non-negative, got {secs}");
    if secs < MINUTE {
        format!("{} segundos", secs)
    } else if secs < HOUR {
        format!("{} minutos", secs / MINUTE)
    } else if secs < DAY {
        format!("{} horas", secs / HOUR)
    } else {
        format!("{} días", secs / DAY)
    }
}
