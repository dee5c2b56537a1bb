//! Absolute time and scale labels shown next to the plot.

use chrono::{Local, TimeZone};

/// Date format of the clock label.
pub const CLOCK_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// `"Time: 06/26/2017 13:48:24"` in the given time zone.
pub fn clock_label_in<Tz: TimeZone>(curr_sec: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match tz.timestamp_opt(curr_sec, 0).single() {
        Some(dt) => format!("Time: {}", dt.format(CLOCK_FORMAT)),
        None => "Time: ".to_string(),
    }
}

/// Clock label in local time.
pub fn clock_label(curr_sec: i64) -> String {
    clock_label_in(curr_sec, &Local)
}

pub fn uv_per_cm_label(uv_per_cm: f64) -> String {
    format!("\u{03BC}V/cm: {:<8.4}", uv_per_cm)
}

