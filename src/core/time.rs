use time::{format_description::well_known::Rfc3339, OffsetDateTime};

pub(crate) fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

pub(crate) fn format_offset(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_else(|_| value.to_string())
}

/// Human-readable distance to a due date, e.g. "due in 2d 3h" or "overdue by 45m".
pub(crate) fn describe_due(due: OffsetDateTime, now: OffsetDateTime) -> String {
    let delta = due - now;
    let (prefix, delta) =
        if delta.is_negative() { ("overdue by", -delta) } else { ("due in", delta) };

    let days = delta.whole_days();
    let hours = delta.whole_hours() % 24;
    let minutes = delta.whole_minutes() % 60;

    if days > 0 {
        format!("{prefix} {days}d {hours}h")
    } else if hours > 0 {
        format!("{prefix} {hours}h {minutes}m")
    } else {
        format!("{prefix} {minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use time::Duration;

    #[test]
    fn format_offset_preserves_offset() {
        let value = datetime!(2026-01-02 13:20:30 +03:00);
        assert_eq!(format_offset(value), "2026-01-02T13:20:30+03:00");
        assert_eq!(format_offset(datetime!(2026-01-02 10:20:30 UTC)), "2026-01-02T10:20:30Z");
    }

    #[test]
    fn describe_due_future_and_past() {
        let now = datetime!(2026-10-18 12:00 UTC);
        assert_eq!(describe_due(now + Duration::hours(51), now), "due in 2d 3h");
        assert_eq!(describe_due(now + Duration::minutes(90), now), "due in 1h 30m");
        assert_eq!(describe_due(now - Duration::minutes(45), now), "overdue by 45m");
    }
}
