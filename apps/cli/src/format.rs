use std::time::Duration;

use clicktrail_core::TrackedEvent;

/// Format page time in milliseconds as MM:SS.mmm
pub fn format_timestamp(ms: f64) -> String {
    let total_ms = ms.max(0.0) as u64;
    let mins = total_ms / 60_000;
    let secs = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}.{:03}", mins, secs, millis)
}

pub fn format_duration(d: Duration) -> String {
    if d.as_secs() < 60 {
        format!("{:.1}s", (d.as_millis() / 100) as f64 / 10.0)
    } else {
        let secs = d.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// One line per reported event, e.g. `[00:01.250] mousemove (10, 20)`
pub fn format_event(event: &TrackedEvent) -> String {
    format!(
        "[{}] {} ({}, {})",
        format_timestamp(event.time_stamp),
        event.kind,
        event.client_x,
        event.client_y
    )
}

#[cfg(test)]
mod tests {
    use clicktrail_core::EventKind;

    use super::*;

    #[test]
    fn timestamp_rolls_over_minutes() {
        assert_eq!(format_timestamp(0.0), "00:00.000");
        assert_eq!(format_timestamp(1250.7), "00:01.250");
        assert_eq!(format_timestamp(61_005.0), "01:01.005");
        assert_eq!(format_timestamp(-3.0), "00:00.000");
    }

    #[test]
    fn duration_switches_to_minutes() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn duration_truncates_to_whole_seconds_past_a_minute() {
        assert_eq!(format_duration(Duration::from_millis(119_600)), "1m 59s");
        assert_eq!(format_duration(Duration::from_millis(60_000)), "1m 0s");
        assert_eq!(format_duration(Duration::from_millis(59_999)), "59.9s");
    }

    #[test]
    fn event_line_shows_kind_and_coordinates() {
        let event = TrackedEvent {
            kind: EventKind::MouseMove,
            client_x: 10.0,
            client_y: 20.0,
            time_stamp: 1250.0,
        };
        assert_eq!(format_event(&event), "[00:01.250] mousemove (10, 20)");
    }
}
