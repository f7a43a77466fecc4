//! Client for the Aladhan-compatible timings service.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use std::time::Duration;

use crate::error::TakvimError;
use crate::method::{CalculationParams, TuneOffsets};
use crate::types::{local_instant, City, DailyPrayerTimes, SourceTimes};

/// Public production endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.aladhan.com/v1";

/// Custom-method selector; the angles travel in `methodSettings` instead of
/// being implied by a preset.
const METHOD_CUSTOM: &str = "99";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for one day's timings.
#[derive(Debug, Clone)]
pub struct AladhanClient {
    http: reqwest::Client,
    base_url: String,
}

impl AladhanClient {
    /// Creates a client against the public service.
    pub fn new() -> Result<Self, TakvimError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a client against a specific endpoint. Tests point this at a
    /// local mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, TakvimError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("takvim/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(TakvimError::Network)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetches and parses one day's schedule for a city.
    ///
    /// # Errors
    /// `Network` for transport failures, `Response` for non-success answers,
    /// `Parse` when the payload is malformed or misses a timing field.
    pub async fn fetch(
        &self,
        city: &City,
        date: NaiveDate,
        params: &CalculationParams,
    ) -> Result<DailyPrayerTimes, TakvimError> {
        let url = format!("{}/timings/{}", self.base_url, date.format("%d-%m-%Y"));
        let method_settings = format!(
            "{},null,{}",
            format_angle(params.fajr_angle),
            format_angle(params.isha_angle)
        );

        let mut request = self.http.get(&url).query(&[
            ("latitude", city.latitude.to_string()),
            ("longitude", city.longitude.to_string()),
            ("method", METHOD_CUSTOM.to_string()),
            ("methodSettings", method_settings),
            ("timezonestring", params.timezone.name().to_string()),
        ]);
        if let Some(tune) = &params.tune {
            request = request.query(&[("tune", format_tune(tune))]);
        }

        tracing::debug!(city = %city.id, %date, "requesting timings");
        let response = request.send().await.map_err(TakvimError::Network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TakvimError::Response { status: status.as_u16() });
        }
        let envelope: AladhanResponse = response
            .json()
            .await
            .map_err(|e| TakvimError::parse(format!("invalid payload: {e}")))?;
        if envelope.code != 200 {
            return Err(TakvimError::Response { status: envelope.code });
        }

        assemble(city, date, params, envelope.data)
    }
}

/// Maps a decoded payload onto that calendar date in the city's local zone.
/// Sabahu is derived from the Imsak field during construction; the
/// service's own dawn-prayer value is never consulted.
fn assemble(
    city: &City,
    date: NaiveDate,
    params: &CalculationParams,
    data: AladhanData,
) -> Result<DailyPrayerTimes, TakvimError> {
    let tz = params.timezone;
    let at = |label: &str, raw: &str| {
        let time = parse_clock(raw)
            .ok_or_else(|| TakvimError::parse(format!("bad {label} time {raw:?}")))?;
        local_instant(date, time, tz).ok_or_else(|| {
            TakvimError::parse(format!("{label} time {raw:?} does not exist on {date}"))
        })
    };
    let times = SourceTimes {
        imsak: at("Imsak", &data.timings.imsak)?,
        sunrise: at("Sunrise", &data.timings.sunrise)?,
        dhuhr: at("Dhuhr", &data.timings.dhuhr)?,
        asr: at("Asr", &data.timings.asr)?,
        maghrib: at("Maghrib", &data.timings.maghrib)?,
        isha: at("Isha", &data.timings.isha)?,
    };
    let hijri = data
        .date
        .and_then(|d| d.hijri)
        .map(|h| format!("{} {} {}", h.day, h.month.en, h.year));

    DailyPrayerTimes::new(city.clone(), date, times, hijri)
}

/// Parses `HH:MM`, discarding stray trailing text such as `" (CEST)"`.
fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let clock = raw.split_whitespace().next()?;
    NaiveTime::parse_from_str(clock, "%H:%M").ok()
}

/// Whole angles travel without a decimal point: `18`, not `18.0`.
fn format_angle(angle: f64) -> String {
    if angle.fract() == 0.0 {
        format!("{}", angle as i64)
    } else {
        angle.to_string()
    }
}

fn format_tune(tune: &TuneOffsets) -> String {
    tune.iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Deserialize)]
struct AladhanResponse {
    code: u16,
    data: AladhanData,
}

#[derive(Debug, Deserialize)]
struct AladhanData {
    timings: Timings,
    date: Option<DateInfo>,
}

/// The consumed timing fields. The service reports more (including its own
/// dawn prayer and midnight); undeclared fields are ignored.
#[derive(Debug, Deserialize)]
struct Timings {
    #[serde(rename = "Imsak")]
    imsak: String,
    #[serde(rename = "Sunrise")]
    sunrise: String,
    #[serde(rename = "Dhuhr")]
    dhuhr: String,
    #[serde(rename = "Asr")]
    asr: String,
    #[serde(rename = "Maghrib")]
    maghrib: String,
    #[serde(rename = "Isha")]
    isha: String,
}

#[derive(Debug, Deserialize)]
struct DateInfo {
    hijri: Option<HijriInfo>,
}

#[derive(Debug, Deserialize)]
struct HijriInfo {
    day: String,
    month: HijriMonth,
    year: String,
}

#[derive(Debug, Deserialize)]
struct HijriMonth {
    en: String,
}
