use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};

use studycore_config::schema::TimeConfig;

/// In-game wall clock: `start_of_day + wall_elapsed * speed`, wrapped to a
/// 24h/60m clock face. `speed` is a multiplier on real seconds, so a
/// `speed` of 60 makes one real second pass as one in-game minute.
pub fn in_game_time(now: DateTime<Utc>, session_start: DateTime<Utc>, time: &TimeConfig) -> DateTime<Utc> {
    let start_of_day = session_start
        .date_naive()
        .and_hms_opt(time.start_time.hour % 24, time.start_time.minute % 60, 0)
        .expect("hour/minute already reduced to valid ranges");
    let start_of_day = Utc.from_utc_datetime(&start_of_day);

    let wall_elapsed = now - session_start;
    let scaled_seconds = wall_elapsed.num_milliseconds() as f64 / 1000.0 * time.speed;
    start_of_day + Duration::milliseconds((scaled_seconds * 1000.0) as i64)
}

pub fn game_clock_face(game_time: DateTime<Utc>) -> (u32, u32) {
    (game_time.hour(), game_time.minute())
}

/// Renders as `HH:MM`, zero-padded so lexicographic and `<`/`>` string
/// comparisons against a configured `value` agree with clock-time order.
pub fn game_clock_string(game_time: DateTime<Utc>) -> String {
    let (hour, minute) = game_clock_face(game_time);
    format!("{hour:02}:{minute:02}")
}
