// src/schedule/clock.rs

//! Trigger-time arithmetic and the small string formats the config uses.

use std::time::Duration;

use chrono::{DateTime, LocalResult, NaiveTime, TimeZone};

/// Parse a daily trigger time like `"08:00"`.
pub fn parse_daily_at(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|e| format!("invalid trigger time '{}': {} (expected HH:MM)", s, e))
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}

/// The next occurrence of `daily_at` strictly after `after`.
///
/// Later today if the trigger time is still ahead, otherwise tomorrow. On a
/// day where the local clock skips the trigger time (DST gap), the trigger
/// slides forward to the next day it exists.
pub fn next_trigger<Tz: TimeZone>(after: &DateTime<Tz>, daily_at: NaiveTime) -> DateTime<Tz> {
    let tz = after.timezone();

    let mut date = after.date_naive();
    if after.time() >= daily_at {
        date = date.succ_opt().unwrap_or(date);
    }

    loop {
        match tz.from_local_datetime(&date.and_time(daily_at)) {
            LocalResult::Single(at) => return at,
            LocalResult::Ambiguous(earliest, _) => return earliest,
            LocalResult::None => match date.succ_opt() {
                Some(next) => date = next,
                // Only reachable at chrono's far-future date limit.
                None => return after.clone(),
            },
        }
    }
}
