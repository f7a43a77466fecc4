//! Wall-clock, date, and countdown rendering for presentation surfaces.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;

use crate::types::Prayer;

/// `"HH:mm"` rendering of an instant in the given zone.
pub fn format_time(time: DateTime<Utc>, tz: Tz) -> String {
    time.with_timezone(&tz).format("%H:%M").to_string()
}

/// Albanian long date, e.g. `"e shtunë, 22 gusht 2026"`.
pub fn format_date(date: NaiveDate) -> String {
    format!(
        "{}, {} {} {}",
        weekday_name(date.weekday()),
        date.day(),
        month_name(date.month()),
        date.year()
    )
}

/// `"Tani"` once the moment has passed, `"2h 5m"` above an hour, `"42m"`
/// below it. Minutes are floored so the text ticks down, never ahead.
pub fn format_countdown(remaining: Duration) -> String {
    if remaining.num_seconds() <= 0 {
        return "Tani".to_string();
    }
    let hours = remaining.num_hours();
    let minutes = remaining.num_minutes() % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Compact countdown for the menu bar: `"2:05"` above an hour, `"42m"`
/// below it, `"Tani"` once passed.
pub fn short_countdown(remaining: Duration) -> String {
    if remaining.num_seconds() <= 0 {
        return "Tani".to_string();
    }
    let hours = remaining.num_hours();
    let minutes = remaining.num_minutes() % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}")
    } else {
        format!("{minutes}m")
    }
}

/// The status line next to the menu bar icon: the countdown, optionally
/// prefixed with the prayer's name.
pub fn menu_bar_text(prayer: Prayer, remaining: Duration, show_full_name: bool) -> String {
    let countdown = short_countdown(remaining);
    if show_full_name {
        format!("{} {}", prayer.display_name(), countdown)
    } else {
        countdown
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "e hënë",
        Weekday::Tue => "e martë",
        Weekday::Wed => "e mërkurë",
        Weekday::Thu => "e enjte",
        Weekday::Fri => "e premte",
        Weekday::Sat => "e shtunë",
        Weekday::Sun => "e diel",
    }
}

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "janar",
        2 => "shkurt",
        3 => "mars",
        4 => "prill",
        5 => "maj",
        6 => "qershor",
        7 => "korrik",
        8 => "gusht",
        9 => "shtator",
        10 => "tetor",
        11 => "nëntor",
        12 => "dhjetor",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe;

    #[test]
    fn test_format_time_follows_local_zone() {
        let instant = Utc.with_ymd_and_hms(2026, 8, 22, 10, 0, 0).unwrap();
        assert_eq!(format_time(instant, Europe::Belgrade), "12:00");
        assert_eq!(format_time(instant, Europe::London), "11:00");

        // Winter, when central Europe is one hour ahead of UTC.
        let instant = Utc.with_ymd_and_hms(2026, 1, 10, 10, 0, 0).unwrap();
        assert_eq!(format_time(instant, Europe::Belgrade), "11:00");
    }

    #[test]
    fn test_format_date_albanian() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 22).unwrap();
        assert_eq!(format_date(date), "e shtunë, 22 gusht 2026");
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(format_date(date), "e enjte, 1 janar 2026");
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(Duration::minutes(-3)), "Tani");
        assert_eq!(format_countdown(Duration::zero()), "Tani");
        assert_eq!(format_countdown(Duration::seconds(90)), "1m");
        assert_eq!(format_countdown(Duration::minutes(59) + Duration::seconds(59)), "59m");
        assert_eq!(format_countdown(Duration::hours(2) + Duration::minutes(5)), "2h 5m");
    }

    #[test]
    fn test_short_countdown() {
        assert_eq!(short_countdown(Duration::seconds(-1)), "Tani");
        assert_eq!(short_countdown(Duration::minutes(45)), "45m");
        assert_eq!(short_countdown(Duration::hours(2) + Duration::minutes(5)), "2:05");
        assert_eq!(short_countdown(Duration::hours(1)), "1:00");
    }

    #[test]
    fn test_menu_bar_text() {
        let remaining = Duration::hours(1) + Duration::minutes(23);
        assert_eq!(menu_bar_text(Prayer::Maghrib, remaining, true), "Akshami 1:23");
        assert_eq!(menu_bar_text(Prayer::Maghrib, remaining, false), "1:23");
    }
}
