//! The embedded official table: Takvimi i Kosovës 2026.
//!
//! Day rows are published for Prishtina and compiled in from a CSV asset.
//! The remaining Kosovo cities apply the fixed minute offsets printed in
//! the takvim, four minutes per degree of longitude, westward positive.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use std::collections::HashMap;
use std::sync::LazyLock;

/// The single year the embedded table covers.
pub const OFFICIAL_YEAR: i32 = 2026;

const TABLE_CSV: &str = include_str!("prishtina_2026.csv");

/// One published day: the six source times as local wall clock.
/// Sabahu is not published separately; it is derived downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRow {
    pub imsak: NaiveTime,
    pub sunrise: NaiveTime,
    pub dhuhr: NaiveTime,
    pub asr: NaiveTime,
    pub maghrib: NaiveTime,
    pub isha: NaiveTime,
}

impl DayRow {
    fn shifted(self, minutes: i64) -> Self {
        let delta = Duration::minutes(minutes);
        Self {
            imsak: self.imsak + delta,
            sunrise: self.sunrise + delta,
            dhuhr: self.dhuhr + delta,
            asr: self.asr + delta,
            maghrib: self.maghrib + delta,
            isha: self.isha + delta,
        }
    }
}

static TABLE: LazyLock<HashMap<NaiveDate, DayRow>> =
    LazyLock::new(|| TABLE_CSV.lines().filter_map(parse_row).collect());

// Row format: MM-DD,imsak,sunrise,dhuhr,asr,maghrib,isha
fn parse_row(line: &str) -> Option<(NaiveDate, DayRow)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let mut fields = line.split(',');
    let (month, day) = fields.next()?.split_once('-')?;
    let date = NaiveDate::from_ymd_opt(OFFICIAL_YEAR, month.parse().ok()?, day.parse().ok()?)?;
    let mut time = || NaiveTime::parse_from_str(fields.next()?, "%H:%M").ok();
    let row = DayRow {
        imsak: time()?,
        sunrise: time()?,
        dhuhr: time()?,
        asr: time()?,
        maghrib: time()?,
        isha: time()?,
    };
    Some((date, row))
}

/// Publication offset from the Prishtina column, by city id.
fn city_offset_minutes(city_id: &str) -> Option<i64> {
    match city_id {
        "prishtina" => Some(0),
        "prizren" => Some(2),
        "peja" => Some(4),
        "gjakova" => Some(3),
        "mitrovica" => Some(1),
        "ferizaj" => Some(0),
        "gjilan" => Some(-1),
        _ => None,
    }
}

/// Looks up the official row for a city and exact date.
///
/// `None` is a fall-through signal (unlisted city, date outside the covered
/// year, or a gap in the table), never an error.
pub fn lookup(city_id: &str, date: NaiveDate) -> Option<DayRow> {
    if date.year() != OFFICIAL_YEAR {
        return None;
    }
    let offset = city_offset_minutes(city_id)?;
    let base = TABLE.get(&date)?;
    Some(base.shifted(offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn every_day_2026() -> impl Iterator<Item = NaiveDate> {
        let first = NaiveDate::from_ymd_opt(OFFICIAL_YEAR, 1, 1).unwrap();
        first.iter_days().take_while(|d| d.year() == OFFICIAL_YEAR)
    }

    #[test]
    fn test_table_covers_the_whole_year() {
        for date in every_day_2026() {
            assert!(lookup("prishtina", date).is_some(), "missing row for {date}");
        }
    }

    #[test]
    fn test_known_first_of_january() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let row = lookup("prishtina", date).unwrap();
        assert_eq!(row.imsak, NaiveTime::from_hms_opt(5, 23, 0).unwrap());
        assert_eq!(row.sunrise, NaiveTime::from_hms_opt(7, 5, 0).unwrap());
        assert_eq!(row.dhuhr, NaiveTime::from_hms_opt(11, 38, 0).unwrap());
        assert_eq!(row.asr, NaiveTime::from_hms_opt(13, 53, 0).unwrap());
        assert_eq!(row.maghrib, NaiveTime::from_hms_opt(16, 11, 0).unwrap());
        assert_eq!(row.isha, NaiveTime::from_hms_opt(17, 48, 0).unwrap());
    }

    #[test]
    fn test_city_offsets_shift_the_row() {
        let date = NaiveDate::from_ymd_opt(2026, 5, 10).unwrap();
        let base = lookup("prishtina", date).unwrap();
        let peja = lookup("peja", date).unwrap();
        let gjilan = lookup("gjilan", date).unwrap();
        assert_eq!(peja.imsak, base.imsak + Duration::minutes(4));
        assert_eq!(peja.isha, base.isha + Duration::minutes(4));
        assert_eq!(gjilan.maghrib, base.maghrib - Duration::minutes(1));
        assert_eq!(lookup("ferizaj", date).unwrap(), base);
    }

    #[test]
    fn test_misses_are_not_errors() {
        let date = NaiveDate::from_ymd_opt(2026, 5, 10).unwrap();
        assert_eq!(lookup("zurich", date), None);
        assert_eq!(lookup("dragash", date), None);
        let other_year = NaiveDate::from_ymd_opt(2027, 5, 10).unwrap();
        assert_eq!(lookup("prishtina", other_year), None);
    }

    #[test]
    fn test_rows_are_ordered_with_room_for_sabahu() {
        for date in every_day_2026() {
            let row = lookup("prishtina", date).unwrap();
            let sabahu = row.imsak + Duration::minutes(crate::types::IMSAK_TO_FAJR_MIN);
            assert!(sabahu < row.sunrise, "{date}: Sabahu overlaps sunrise");
            assert!(row.sunrise < row.dhuhr, "{date}");
            assert!(row.dhuhr < row.asr, "{date}");
            assert!(row.asr < row.maghrib, "{date}");
            assert!(row.maghrib < row.isha, "{date}");
        }
    }
}
