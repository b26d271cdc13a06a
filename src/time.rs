/// Formats a time in seconds as `m:ss`, or `h:mm:ss` from one hour up.
///
/// Sub-second precision is truncated; negative inputs clamp to `0:00`.
pub fn format_time(time_sec: f64) -> String {
    let total = if time_sec.is_finite() && time_sec > 0.0 {
        time_sec as u64
    } else {
        0
    };
    let seconds = total % 60;
    let minutes = total / 60;
    if minutes >= 60 {
        let hours = minutes / 60;
        format!("{}:{:02}:{:02}", hours, minutes % 60, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_and_seconds() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(7.9), "0:07");
        assert_eq!(format_time(62.0), "1:02");
        assert_eq!(format_time(599.0), "9:59");
    }

    #[test]
    fn hours_roll_over() {
        assert_eq!(format_time(3600.0), "1:00:00");
        assert_eq!(format_time(3723.5), "1:02:03");
        assert_eq!(format_time(36_000.0 + 61.0), "10:01:01");
    }

    #[test]
    fn degenerate_inputs_clamp_to_zero() {
        assert_eq!(format_time(-3.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
    }
}
