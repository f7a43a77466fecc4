//! Hijri calendar labels for days served from the embedded table.
//!
//! Remote schedules carry the service's own label; this module fills the
//! same slot for official-table days, where no service response exists.

use chrono::{Datelike, NaiveDate};
use hijri_date::HijriDate;

/// Gregorian range the conversion tables cover.
const HIJRI_MIN_YEAR: i32 = 1938;
const HIJRI_MAX_YEAR: i32 = 2076;

/// Builds the Hijri label for a Gregorian date, e.g. `"12 Ramadhan 1447"`.
///
/// Returns `None` outside the supported conversion range. A missing label
/// is decoration, not a failure, so there is no error variant for it.
pub fn hijri_label(date: NaiveDate) -> Option<String> {
    if date.year() < HIJRI_MIN_YEAR || date.year() > HIJRI_MAX_YEAR {
        return None;
    }
    let hijri = HijriDate::from_gr(
        date.year() as usize,
        date.month() as usize,
        date.day() as usize,
    )
    .ok()?;
    Some(format!(
        "{} {} {}",
        hijri.day(),
        hijri_month_name(hijri.month()),
        hijri.year()
    ))
}

/// English Hijri month name.
pub fn hijri_month_name(month: usize) -> &'static str {
    match month {
        1 => "Muharram",
        2 => "Safar",
        3 => "Rabi' al-Awwal",
        4 => "Rabi' al-Thani",
        5 => "Jumada al-Ula",
        6 => "Jumada al-Akhirah",
        7 => "Rajab",
        8 => "Sha'ban",
        9 => "Ramadhan",
        10 => "Shawwal",
        11 => "Dhu al-Qi'dah",
        12 => "Dhu al-Hijjah",
        _ => "Unknown",
    }
}
