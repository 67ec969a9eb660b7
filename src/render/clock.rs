//! Wall clock and uptime formatting.

use chrono::Timelike;
use std::time::Duration;

/// Renders hours, minutes and seconds, zero padded, one `<div>` each.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use kernel_host::render::render_clock;
///
/// let time = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
/// assert_eq!(render_clock(&time), "<div>09</div><div>05</div><div>00</div>");
/// ```
#[must_use]
pub fn render_clock<T: Timelike>(time: &T) -> String {
    format!(
        "<div>{:02}</div><div>{:02}</div><div>{:02}</div>",
        time.hour(),
        time.minute(),
        time.second()
    )
}

/// Renders the local wall clock.
#[must_use]
pub fn render_local_clock() -> String {
    render_clock(&chrono::Local::now())
}

/// Formats elapsed time as `Hh Mm Ss`, dropping leading zero units.
///
/// # Examples
///
/// ```
/// use kernel_host::render::format_uptime;
/// use std::time::Duration;
///
/// assert_eq!(format_uptime(Duration::from_secs(42)), "42s");
/// assert_eq!(format_uptime(Duration::from_secs(3723)), "1h 2m 3s");
/// ```
#[must_use]
pub fn format_uptime(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
