//! Conversions between Discord snowflakes and instants.
//!
//! The top 42 bits of a snowflake are milliseconds since the Discord epoch
//! (2015-01-01T00:00:00Z).

use chrono::{DateTime, Utc};

pub const DISCORD_EPOCH_MILLIS: i64 = 1_420_070_400_000;
const TIMESTAMP_SHIFT: u32 = 22;

/// Creation instant encoded in a snowflake.
pub fn instant_from_snowflake(id: u64) -> DateTime<Utc> {
    let millis = (id >> TIMESTAMP_SHIFT) as i64 + DISCORD_EPOCH_MILLIS;
    DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_default()
}

/// Smallest snowflake created at `instant`, usable as an `after` cursor.
///
/// Instants before the Discord epoch map to 0.
pub fn snowflake_from_instant(instant: DateTime<Utc>) -> u64 {
    let millis = instant.timestamp_millis() - DISCORD_EPOCH_MILLIS;
    if millis <= 0 {
        return 0;
    }
    (millis as u64) << TIMESTAMP_SHIFT
}
