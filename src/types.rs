use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::error::TakvimError;

/// Minutes between Imsak and the dawn prayer (Sabahu).
///
/// Sabahu is always derived from Imsak with this offset. It is never stored,
/// parsed, or accepted from any source on its own.
pub const IMSAK_TO_FAJR_MIN: i64 = 35;

/// One of the seven daily events, in day order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prayer {
    /// Imsaku, the pre-dawn marker and base of the derived dawn prayer.
    Imsak,
    /// Sabahu, the dawn prayer. Always `Imsak + 35min`.
    Fajr,
    /// Lindja e Diellit. Not a prayer; marks the end of Sabahu.
    Sunrise,
    /// Dreka, the midday prayer.
    Dhuhr,
    /// Ikindia, the afternoon prayer.
    Asr,
    /// Akshami, the sunset prayer.
    Maghrib,
    /// Jacia, the night prayer.
    Isha,
}

impl Prayer {
    /// All kinds in their fixed real-world sequence.
    pub const IN_ORDER: [Prayer; 7] = [
        Prayer::Imsak,
        Prayer::Fajr,
        Prayer::Sunrise,
        Prayer::Dhuhr,
        Prayer::Asr,
        Prayer::Maghrib,
        Prayer::Isha,
    ];

    /// Albanian display name, as printed in the takvim.
    pub fn display_name(&self) -> &'static str {
        match self {
            Prayer::Imsak => "Imsaku",
            Prayer::Fajr => "Sabahu",
            Prayer::Sunrise => "Lindja e Diellit",
            Prayer::Dhuhr => "Dreka",
            Prayer::Asr => "Ikindia",
            Prayer::Maghrib => "Akshami",
            Prayer::Isha => "Jacia",
        }
    }

    /// Symbolic icon name for presentation layers.
    pub fn icon(&self) -> &'static str {
        match self {
            Prayer::Imsak => "moon.haze",
            Prayer::Fajr => "sunrise",
            Prayer::Sunrise => "sun.horizon",
            Prayer::Dhuhr => "sun.max",
            Prayer::Asr => "sun.min",
            Prayer::Maghrib => "sunset",
            Prayer::Isha => "moon.stars",
        }
    }

    /// Stable ASCII name, used in notification identifiers.
    pub fn slug(&self) -> &'static str {
        match self {
            Prayer::Imsak => "imsak",
            Prayer::Fajr => "fajr",
            Prayer::Sunrise => "sunrise",
            Prayer::Dhuhr => "dhuhr",
            Prayer::Asr => "asr",
            Prayer::Maghrib => "maghrib",
            Prayer::Isha => "isha",
        }
    }

    /// Whether reminders are armed for this kind. Imsak and sunrise are
    /// markers, not prayers, and get no triggers.
    pub fn requires_reminder(&self) -> bool {
        !matches!(self, Prayer::Imsak | Prayer::Sunrise)
    }
}

impl fmt::Display for Prayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Supported countries, identified by ISO 3166-1 alpha-2 code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "XK")]
    Kosovo,
    #[serde(rename = "CH")]
    Switzerland,
    #[serde(rename = "DE")]
    Germany,
    #[serde(rename = "AT")]
    Austria,
    #[serde(rename = "FR")]
    France,
    #[serde(rename = "NL")]
    Netherlands,
    #[serde(rename = "BE")]
    Belgium,
    #[serde(rename = "SE")]
    Sweden,
    #[serde(rename = "NO")]
    Norway,
    #[serde(rename = "DK")]
    Denmark,
    #[serde(rename = "GB")]
    UnitedKingdom,
    #[serde(rename = "IT")]
    Italy,
    #[serde(rename = "FI")]
    Finland,
}

impl Country {
    pub const ALL: [Country; 13] = [
        Country::Kosovo,
        Country::Switzerland,
        Country::Germany,
        Country::Austria,
        Country::France,
        Country::Netherlands,
        Country::Belgium,
        Country::Sweden,
        Country::Norway,
        Country::Denmark,
        Country::UnitedKingdom,
        Country::Italy,
        Country::Finland,
    ];

    /// ISO 3166-1 alpha-2 code.
    pub fn code(&self) -> &'static str {
        match self {
            Country::Kosovo => "XK",
            Country::Switzerland => "CH",
            Country::Germany => "DE",
            Country::Austria => "AT",
            Country::France => "FR",
            Country::Netherlands => "NL",
            Country::Belgium => "BE",
            Country::Sweden => "SE",
            Country::Norway => "NO",
            Country::Denmark => "DK",
            Country::UnitedKingdom => "GB",
            Country::Italy => "IT",
            Country::Finland => "FI",
        }
    }

    /// Albanian country name.
    pub fn name(&self) -> &'static str {
        match self {
            Country::Kosovo => "Kosova",
            Country::Switzerland => "Zvicra",
            Country::Germany => "Gjermania",
            Country::Austria => "Austria",
            Country::France => "Franca",
            Country::Netherlands => "Holanda",
            Country::Belgium => "Belgjika",
            Country::Sweden => "Suedia",
            Country::Norway => "Norvegjia",
            Country::Denmark => "Danimarka",
            Country::UnitedKingdom => "Britania",
            Country::Italy => "Italia",
            Country::Finland => "Finlanda",
        }
    }

    pub fn flag(&self) -> &'static str {
        match self {
            Country::Kosovo => "🇽🇰",
            Country::Switzerland => "🇨🇭",
            Country::Germany => "🇩🇪",
            Country::Austria => "🇦🇹",
            Country::France => "🇫🇷",
            Country::Netherlands => "🇳🇱",
            Country::Belgium => "🇧🇪",
            Country::Sweden => "🇸🇪",
            Country::Norway => "🇳🇴",
            Country::Denmark => "🇩🇰",
            Country::UnitedKingdom => "🇬🇧",
            Country::Italy => "🇮🇹",
            Country::Finland => "🇫🇮",
        }
    }

    /// IANA zone used for every city of the country. Country granularity is
    /// an accepted simplification; all supported countries span one zone.
    pub fn timezone(&self) -> Tz {
        match self {
            Country::Kosovo => Tz::Europe__Belgrade,
            Country::Switzerland => Tz::Europe__Zurich,
            Country::Germany => Tz::Europe__Berlin,
            Country::Austria => Tz::Europe__Vienna,
            Country::France => Tz::Europe__Paris,
            Country::Netherlands => Tz::Europe__Amsterdam,
            Country::Belgium => Tz::Europe__Brussels,
            Country::Sweden => Tz::Europe__Stockholm,
            Country::Norway => Tz::Europe__Oslo,
            Country::Denmark => Tz::Europe__Copenhagen,
            Country::UnitedKingdom => Tz::Europe__London,
            Country::Italy => Tz::Europe__Rome,
            Country::Finland => Tz::Europe__Helsinki,
        }
    }

    /// Whether the embedded official table covers this country.
    pub fn has_official_data(&self) -> bool {
        matches!(self, Country::Kosovo)
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A selectable city. The id is stable across runs and doubles as the
/// cache-key and notification-identifier component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub name: String,
    pub country: Country,
    pub latitude: f64,
    pub longitude: f64,
}

impl City {
    /// `"{name}, {country}"`, e.g. `"Prishtina, Kosova"`.
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.name, self.country.name())
    }

    /// Whether the embedded official table applies to this city.
    pub fn has_official_data(&self) -> bool {
        self.country.has_official_data()
    }

    /// The full static catalog, grouped by country in selection order.
    pub fn all() -> &'static [City] {
        &CITIES
    }

    /// Looks a city up by its stable id.
    pub fn find(id: &str) -> Option<&'static City> {
        CITIES.iter().find(|c| c.id == id)
    }

    /// Cities of one country, in catalog order.
    pub fn in_country(country: Country) -> impl Iterator<Item = &'static City> {
        CITIES.iter().filter(move |c| c.country == country)
    }
}

impl Default for City {
    /// Prishtina, the capital.
    fn default() -> Self {
        CITIES[0].clone()
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

static CITIES: LazyLock<Vec<City>> = LazyLock::new(|| {
    let c = |id: &str, name: &str, country: Country, latitude: f64, longitude: f64| City {
        id: id.to_string(),
        name: name.to_string(),
        country,
        latitude,
        longitude,
    };
    vec![
        // Kosovo (covered by the official BIM table for 2026)
        c("prishtina", "Prishtina", Country::Kosovo, 42.6629, 21.1655),
        c("prizren", "Prizren", Country::Kosovo, 42.2139, 20.7397),
        c("peja", "Peja", Country::Kosovo, 42.6592, 20.2883),
        c("gjakova", "Gjakova", Country::Kosovo, 42.3803, 20.4308),
        c("mitrovica", "Mitrovica", Country::Kosovo, 42.8914, 20.8660),
        c("ferizaj", "Ferizaj", Country::Kosovo, 42.3702, 21.1553),
        c("gjilan", "Gjilan", Country::Kosovo, 42.4635, 21.4694),
        // Switzerland
        c("zurich", "Zürich", Country::Switzerland, 47.3769, 8.5417),
        c("geneva", "Genève", Country::Switzerland, 46.2044, 6.1432),
        c("basel", "Basel", Country::Switzerland, 47.5596, 7.5886),
        c("bern", "Bern", Country::Switzerland, 46.9480, 7.4474),
        c("lausanne", "Lausanne", Country::Switzerland, 46.5197, 6.6323),
        c("winterthur", "Winterthur", Country::Switzerland, 47.5001, 8.7240),
        c("stgallen", "St. Gallen", Country::Switzerland, 47.4245, 9.3767),
        c("lugano", "Lugano", Country::Switzerland, 46.0037, 8.9511),
        // Germany
        c("berlin", "Berlin", Country::Germany, 52.5200, 13.4050),
        c("munich", "München", Country::Germany, 48.1351, 11.5820),
        c("frankfurt", "Frankfurt", Country::Germany, 50.1109, 8.6821),
        c("hamburg", "Hamburg", Country::Germany, 53.5511, 9.9937),
        c("cologne", "Köln", Country::Germany, 50.9375, 6.9603),
        c("dusseldorf", "Düsseldorf", Country::Germany, 51.2277, 6.7735),
        c("stuttgart", "Stuttgart", Country::Germany, 48.7758, 9.1829),
        c("dortmund", "Dortmund", Country::Germany, 51.5136, 7.4653),
        // Austria
        c("vienna", "Wien", Country::Austria, 48.2082, 16.3738),
        c("graz", "Graz", Country::Austria, 47.0707, 15.4395),
        c("linz", "Linz", Country::Austria, 48.3069, 14.2858),
        c("salzburg", "Salzburg", Country::Austria, 47.8095, 13.0550),
        c("innsbruck", "Innsbruck", Country::Austria, 47.2692, 11.4041),
        // France
        c("paris", "Paris", Country::France, 48.8566, 2.3522),
        c("marseille", "Marseille", Country::France, 43.2965, 5.3698),
        c("lyon", "Lyon", Country::France, 45.7640, 4.8357),
        c("strasbourg", "Strasbourg", Country::France, 48.5734, 7.7521),
        c("toulouse", "Toulouse", Country::France, 43.6047, 1.4442),
        // Netherlands
        c("amsterdam", "Amsterdam", Country::Netherlands, 52.3676, 4.9041),
        c("rotterdam", "Rotterdam", Country::Netherlands, 51.9244, 4.4777),
        c("hague", "Den Haag", Country::Netherlands, 52.0705, 4.3007),
        c("utrecht", "Utrecht", Country::Netherlands, 52.0907, 5.1214),
        // Belgium
        c("brussels", "Bruxelles", Country::Belgium, 50.8503, 4.3517),
        c("antwerp", "Antwerpen", Country::Belgium, 51.2194, 4.4025),
        c("ghent", "Gent", Country::Belgium, 51.0543, 3.7174),
        c("liege", "Liège", Country::Belgium, 50.6292, 5.5797),
        // Sweden
        c("stockholm", "Stockholm", Country::Sweden, 59.3293, 18.0686),
        c("gothenburg", "Göteborg", Country::Sweden, 57.7089, 11.9746),
        c("malmo", "Malmö", Country::Sweden, 55.6050, 13.0038),
        // Norway
        c("oslo", "Oslo", Country::Norway, 59.9139, 10.7522),
        c("bergen", "Bergen", Country::Norway, 60.3913, 5.3221),
        // Denmark
        c("copenhagen", "København", Country::Denmark, 55.6761, 12.5683),
        c("aarhus", "Aarhus", Country::Denmark, 56.1629, 10.2039),
        // United Kingdom
        c("london", "London", Country::UnitedKingdom, 51.5074, -0.1278),
        c("birmingham", "Birmingham", Country::UnitedKingdom, 52.4862, -1.8904),
        c("manchester", "Manchester", Country::UnitedKingdom, 53.4808, -2.2426),
        c("leeds", "Leeds", Country::UnitedKingdom, 53.8008, -1.5491),
        // Italy
        c("rome", "Roma", Country::Italy, 41.9028, 12.4964),
        c("milan", "Milano", Country::Italy, 45.4642, 9.1900),
        c("turin", "Torino", Country::Italy, 45.0703, 7.6869),
        c("florence", "Firenze", Country::Italy, 43.7696, 11.2558),
        // Finland
        c("helsinki", "Helsinki", Country::Finland, 60.1699, 24.9384),
        c("vantaa", "Vantaa", Country::Finland, 60.2934, 25.0378),
    ]
});

/// Resolves a wall-clock time on `date` in `tz` to an instant.
///
/// The repeated autumn hour takes its earlier occurrence; a time inside the
/// spring gap does not exist and yields `None`.
pub(crate) fn local_instant(date: NaiveDate, time: NaiveTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The six source timestamps a day's schedule is built from.
///
/// There is no Sabahu field: the dawn prayer is derived during construction
/// and cannot be supplied from outside.
#[derive(Debug, Clone, Copy)]
pub struct SourceTimes {
    pub imsak: DateTime<Utc>,
    pub sunrise: DateTime<Utc>,
    pub dhuhr: DateTime<Utc>,
    pub asr: DateTime<Utc>,
    pub maghrib: DateTime<Utc>,
    pub isha: DateTime<Utc>,
}

/// One calendar day's schedule for one city.
///
/// Immutable after construction; a new day requires a new value. Construction
/// and every deserialization path enforce the same invariants: Sabahu is
/// exactly [`IMSAK_TO_FAJR_MIN`] minutes after Imsak, the kinds are in
/// non-decreasing day order, and every timestamp falls on `date` in the
/// city's local zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DailyPrayerTimesRepr")]
pub struct DailyPrayerTimes {
    date: NaiveDate,
    city: City,
    imsak: DateTime<Utc>,
    fajr: DateTime<Utc>,
    sunrise: DateTime<Utc>,
    dhuhr: DateTime<Utc>,
    asr: DateTime<Utc>,
    maghrib: DateTime<Utc>,
    isha: DateTime<Utc>,
    hijri_date: Option<String>,
}

impl DailyPrayerTimes {
    /// Builds a day's schedule from its six source timestamps, deriving
    /// Sabahu from Imsak.
    ///
    /// # Errors
    /// Returns `Parse` if the kinds are out of order or any timestamp falls
    /// outside `date` in the city's local zone.
    pub fn new(
        city: City,
        date: NaiveDate,
        times: SourceTimes,
        hijri_date: Option<String>,
    ) -> Result<Self, TakvimError> {
        let model = Self {
            date,
            city,
            imsak: times.imsak,
            fajr: times.imsak + Duration::minutes(IMSAK_TO_FAJR_MIN),
            sunrise: times.sunrise,
            dhuhr: times.dhuhr,
            asr: times.asr,
            maghrib: times.maghrib,
            isha: times.isha,
            hijri_date,
        };
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), TakvimError> {
        if self.fajr - self.imsak != Duration::minutes(IMSAK_TO_FAJR_MIN) {
            return Err(TakvimError::parse(format!(
                "Sabahu must be {IMSAK_TO_FAJR_MIN} minutes after Imsaku"
            )));
        }
        for pair in Prayer::IN_ORDER.windows(2) {
            if self.time_for(pair[0]) > self.time_for(pair[1]) {
                return Err(TakvimError::parse(format!(
                    "{} must not come after {}",
                    pair[0], pair[1]
                )));
            }
        }
        let tz = self.city.country.timezone();
        for kind in Prayer::IN_ORDER {
            let local_day = self.time_for(kind).with_timezone(&tz).date_naive();
            if local_day != self.date {
                return Err(TakvimError::parse(format!(
                    "{} falls on {} instead of {}",
                    kind, local_day, self.date
                )));
            }
        }
        Ok(())
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn city(&self) -> &City {
        &self.city
    }

    /// Hijri calendar label, e.g. `"5 Ramadan 1447"`, when known.
    pub fn hijri_date(&self) -> Option<&str> {
        self.hijri_date.as_deref()
    }

    /// The timestamp of one event kind. Total over the closed enumeration.
    pub fn time_for(&self, kind: Prayer) -> DateTime<Utc> {
        match kind {
            Prayer::Imsak => self.imsak,
            Prayer::Fajr => self.fajr,
            Prayer::Sunrise => self.sunrise,
            Prayer::Dhuhr => self.dhuhr,
            Prayer::Asr => self.asr,
            Prayer::Maghrib => self.maghrib,
            Prayer::Isha => self.isha,
        }
    }

    /// First event strictly after `after`, in day order. `None` when the
    /// whole day has passed; the caller then asks for tomorrow's schedule.
    pub fn next_event(&self, after: DateTime<Utc>) -> Option<(Prayer, DateTime<Utc>)> {
        Prayer::IN_ORDER
            .iter()
            .map(|&kind| (kind, self.time_for(kind)))
            .find(|&(_, time)| time > after)
    }

    /// Last event at or before `before`, scanning in reverse day order.
    /// `None` only when `before` precedes Imsaku.
    pub fn previous_event(&self, before: DateTime<Utc>) -> Option<(Prayer, DateTime<Utc>)> {
        Prayer::IN_ORDER
            .iter()
            .rev()
            .map(|&kind| (kind, self.time_for(kind)))
            .find(|&(_, time)| time <= before)
    }

    /// A provisional schedule for the following day: the base event (Imsaku)
    /// is shifted by exactly 24 hours and Sabahu re-derived from it, the
    /// remaining kinds shifted likewise. Stands in until a real fetch for
    /// that day replaces it; the Hijri label is not carried over.
    pub fn next_day_estimate(&self) -> Self {
        let shift = Duration::hours(24);
        let imsak = self.imsak + shift;
        let tz = self.city.country.timezone();
        Self {
            date: imsak.with_timezone(&tz).date_naive(),
            city: self.city.clone(),
            imsak,
            fajr: imsak + Duration::minutes(IMSAK_TO_FAJR_MIN),
            sunrise: self.sunrise + shift,
            dhuhr: self.dhuhr + shift,
            asr: self.asr + shift,
            maghrib: self.maghrib + shift,
            isha: self.isha + shift,
            hijri_date: None,
        }
    }
}

/// Mirror of the persisted field layout. Deserialization funnels through
/// this so tampered or drifted payloads are rejected before a
/// `DailyPrayerTimes` exists.
#[derive(Deserialize)]
struct DailyPrayerTimesRepr {
    date: NaiveDate,
    city: City,
    imsak: DateTime<Utc>,
    fajr: DateTime<Utc>,
    sunrise: DateTime<Utc>,
    dhuhr: DateTime<Utc>,
    asr: DateTime<Utc>,
    maghrib: DateTime<Utc>,
    isha: DateTime<Utc>,
    hijri_date: Option<String>,
}

impl TryFrom<DailyPrayerTimesRepr> for DailyPrayerTimes {
    type Error = TakvimError;

    fn try_from(repr: DailyPrayerTimesRepr) -> Result<Self, Self::Error> {
        let model = Self {
            date: repr.date,
            city: repr.city,
            imsak: repr.imsak,
            fajr: repr.fajr,
            sunrise: repr.sunrise,
            dhuhr: repr.dhuhr,
            asr: repr.asr,
            maghrib: repr.maghrib,
            isha: repr.isha,
            hijri_date: repr.hijri_date,
        };
        model.validate()?;
        Ok(model)
    }
}
