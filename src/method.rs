//! Source resolution: which data source serves a (city, date) pair, and
//! with which calculation parameters when the remote service is asked.

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;

use crate::official::{self, DayRow};
use crate::types::{City, Country};

/// Minute offsets in service order:
/// imsak, fajr, sunrise, dhuhr, asr, maghrib, sunset, isha.
pub type TuneOffsets = [i8; 8];

/// High-latitude corrections for Norway outside the dark half of the year,
/// when depression-angle times degenerate.
const TUNE_NORWAY_BRIGHT: TuneOffsets = [0, 20, 0, 0, 0, 0, 0, -40];
/// Norway inside the dark half: angles work, only small adjustments remain.
const TUNE_NORWAY_DARK: TuneOffsets = [0, 5, 0, 0, 0, 0, 0, 10];
const TUNE_SWEDEN: TuneOffsets = [0, 5, 0, 0, 0, 0, 0, 5];
const TUNE_FINLAND: TuneOffsets = [0, 5, 0, 0, 0, 0, 0, 8];

/// Parameters sent to the remote calculation service.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationParams {
    /// Solar depression angle for dawn, in degrees.
    pub fajr_angle: f64,
    /// Solar depression angle for nightfall, in degrees.
    pub isha_angle: f64,
    /// Per-field minute tuning, when the country needs one.
    pub tune: Option<TuneOffsets>,
    /// IANA zone the service should render times in.
    pub timezone: Tz,
}

/// The resolved data source for one (city, date) pair.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// Serve from the embedded official table.
    Official(DayRow),
    /// Ask the remote service with these parameters.
    Remote(CalculationParams),
}

/// Picks the data source for a (city, date) pair.
///
/// The official table wins whenever it has a row for the city and exact
/// date. A missing row falls through to the remote service; it is never an
/// error.
pub fn resolve(city: &City, date: NaiveDate) -> Source {
    if city.has_official_data() && date.year() == official::OFFICIAL_YEAR {
        if let Some(row) = official::lookup(&city.id, date) {
            return Source::Official(row);
        }
        tracing::debug!(
            city = %city.id,
            %date,
            "no official row, falling through to remote service"
        );
    }
    Source::Remote(params_for(city.country, date))
}

/// Per-country calculation parameters.
///
/// Every country uses the 18°/17° pair except France, where the national
/// convention is 12°/12°. Norway switches its tuning with the season;
/// Sweden and Finland carry constant high-latitude tunes.
pub fn params_for(country: Country, date: NaiveDate) -> CalculationParams {
    let (fajr_angle, isha_angle) = match country {
        Country::France => (12.0, 12.0),
        _ => (18.0, 17.0),
    };
    let tune = match country {
        Country::Norway => Some(if in_dark_half(date) {
            TUNE_NORWAY_DARK
        } else {
            TUNE_NORWAY_BRIGHT
        }),
        Country::Sweden => Some(TUNE_SWEDEN),
        Country::Finland => Some(TUNE_FINLAND),
        _ => None,
    };
    CalculationParams {
        fajr_angle,
        isha_angle,
        tune,
        timezone: country.timezone(),
    }
}

/// The dark half of the year: September 23 through March 20, both days
/// inclusive, compared at calendar-day granularity.
fn in_dark_half(date: NaiveDate) -> bool {
    let month_day = (date.month(), date.day());
    month_day >= (9, 23) || month_day <= (3, 20)
}
