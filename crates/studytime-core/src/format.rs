/// Stopwatch display, `HH:MM:SS`.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Compact duration, `2h 5m` or `45m`.
pub fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_pads() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(3_725), "01:02:05");
        assert_eq!(format_clock(43_200), "12:00:00");
    }

    #[test]
    fn duration_drops_zero_hours() {
        assert_eq!(format_duration(59), "0m");
        assert_eq!(format_duration(2_700), "45m");
        assert_eq!(format_duration(7_500), "2h 5m");
    }
}
