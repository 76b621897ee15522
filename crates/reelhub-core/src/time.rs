use time::OffsetDateTime;

/// Current UTC time, the single timestamp source for the workspace.
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Seconds in one day, for freshness-threshold arithmetic.
pub const SECONDS_PER_DAY: i64 = 86_400;
