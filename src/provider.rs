//! The orchestrator: one operation that returns a day's schedule for a
//! city, composed from the official table, the cache, and the remote
//! service with a fixed precedence.

use chrono::{NaiveDate, NaiveTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::TakvimError;
use crate::hijri;
use crate::method::{self, Source};
use crate::network::AladhanClient;
use crate::official::DayRow;
use crate::store::{cache_key, CacheStore};
use crate::types::{local_instant, City, DailyPrayerTimes, SourceTimes};

/// The calendar date "today" currently has in the city's local zone.
pub fn local_today(city: &City) -> NaiveDate {
    Utc::now().with_timezone(&city.country.timezone()).date_naive()
}

/// Schedule provider with the precedence: official table, then fresh
/// cache, then remote service, then same-key stale fallback.
///
/// Explicitly constructed and owned; consumers receive it by reference or
/// behind an `Arc`, there is no global instance.
pub struct PrayerTimeProvider {
    client: AladhanClient,
    store: Arc<CacheStore>,
    epoch: AtomicU64,
}

impl PrayerTimeProvider {
    pub fn new(client: AladhanClient, store: Arc<CacheStore>) -> Self {
        Self {
            client,
            store,
            epoch: AtomicU64::new(0),
        }
    }

    /// Invalidates in-flight work. A fetch that started before this call
    /// still returns its result to its own caller, but will not write the
    /// cache: the context it was fetched for is gone.
    pub fn invalidate(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// One day's schedule for a city.
    ///
    /// # Errors
    /// Remote failures surface only when the same-key stale fallback also
    /// misses. Official-table days never touch the network.
    pub async fn fetch_prayer_times(
        &self,
        city: &City,
        date: NaiveDate,
    ) -> Result<DailyPrayerTimes, TakvimError> {
        let epoch = self.epoch.load(Ordering::SeqCst);

        match method::resolve(city, date) {
            Source::Official(row) => {
                let model = official_model(city, date, row)?;
                // Official data overwrites whatever the cache holds for
                // this key; a stale remote entry never shadows it.
                self.commit(epoch, model.clone()).await;
                tracing::info!(city = %city.id, %date, "serving official schedule");
                Ok(model)
            }
            Source::Remote(params) => {
                if let Some(cached) = self.store.validated_get(&city.id, date).await {
                    tracing::debug!(city = %city.id, %date, "serving cached schedule");
                    return Ok(cached);
                }
                match self.client.fetch(city, date, &params).await {
                    Ok(model) => {
                        self.commit(epoch, model.clone()).await;
                        tracing::info!(city = %city.id, %date, "serving remote schedule");
                        Ok(model)
                    }
                    Err(err) => {
                        // Same exact key only. An entry for another date or
                        // city is not an acceptable stand-in.
                        if let Some(stale) = self.store.validated_get(&city.id, date).await {
                            tracing::warn!(
                                city = %city.id,
                                %date,
                                error = %err,
                                "remote fetch failed, serving stale cache"
                            );
                            return Ok(stale);
                        }
                        Err(err)
                    }
                }
            }
        }
    }

    /// What the cache holds for the key, without any source resolution or
    /// network traffic.
    ///
    /// # Errors
    /// `CacheMiss` when no usable entry exists.
    pub async fn cached_schedule(
        &self,
        city: &City,
        date: NaiveDate,
    ) -> Result<DailyPrayerTimes, TakvimError> {
        self.store
            .validated_get(&city.id, date)
            .await
            .ok_or_else(|| TakvimError::cache_miss(cache_key(&city.id, date)))
    }

    /// Drops all cached schedules.
    pub async fn clear_cache(&self) {
        self.store.clear().await;
    }

    async fn commit(&self, epoch: u64, model: DailyPrayerTimes) {
        if self.epoch.load(Ordering::SeqCst) == epoch {
            self.store.put(model).await;
        } else {
            tracing::debug!(
                city = %model.city().id,
                date = %model.date(),
                "discarding result of a superseded fetch"
            );
        }
    }
}

/// Builds the schedule for an official-table day. The row carries local
/// wall-clock times; the Hijri label is computed locally because no service
/// response exists on this path.
fn official_model(
    city: &City,
    date: NaiveDate,
    row: DayRow,
) -> Result<DailyPrayerTimes, TakvimError> {
    let tz = city.country.timezone();
    let at = |label: &str, time: NaiveTime| {
        local_instant(date, time, tz)
            .ok_or_else(|| TakvimError::parse(format!("{label} does not exist on {date}")))
    };
    let times = SourceTimes {
        imsak: at("Imsak", row.imsak)?,
        sunrise: at("Sunrise", row.sunrise)?,
        dhuhr: at("Dhuhr", row.dhuhr)?,
        asr: at("Asr", row.asr)?,
        maghrib: at("Maghrib", row.maghrib)?,
        isha: at("Isha", row.isha)?,
    };
    DailyPrayerTimes::new(city.clone(), date, times, hijri::hijri_label(date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::official;
    use crate::types::Prayer;
    use chrono::{Datelike, Duration, TimeZone};

    // Never answers: official-table days must not need it, and cache hits
    // must short-circuit before any request is attempted.
    fn dead_client() -> AladhanClient {
        AladhanClient::with_base_url("http://127.0.0.1:9").unwrap()
    }

    fn provider_in(dir: &std::path::Path) -> (PrayerTimeProvider, Arc<CacheStore>) {
        let store = Arc::new(CacheStore::open(dir));
        (PrayerTimeProvider::new(dead_client(), store.clone()), store)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn divergent_entry(city_id: &str, date: NaiveDate) -> DailyPrayerTimes {
        let city = City::find(city_id).unwrap().clone();
        let tz = city.country.timezone();
        let at = |h, m| {
            tz.with_ymd_and_hms(date.year(), date.month(), date.day(), h, m, 0)
                .unwrap()
                .with_timezone(&Utc)
        };
        let times = SourceTimes {
            imsak: at(4, 0),
            sunrise: at(6, 0),
            dhuhr: at(12, 0),
            asr: at(15, 0),
            maghrib: at(18, 0),
            isha: at(19, 30),
        };
        DailyPrayerTimes::new(city, date, times, None).unwrap()
    }

    #[tokio::test]
    async fn test_official_day_overrides_seeded_cache() {
        let dir = tempfile::tempdir().unwrap();
        let (provider, store) = provider_in(dir.path());
        let seeded = divergent_entry("prishtina", date());
        store.put(seeded.clone()).await;

        let city = City::find("prishtina").unwrap();
        let model = provider.fetch_prayer_times(city, date()).await.unwrap();

        let row = official::lookup("prishtina", date()).unwrap();
        let expected_imsak =
            local_instant(date(), row.imsak, city.country.timezone()).unwrap();
        assert_eq!(model.time_for(Prayer::Imsak), expected_imsak);
        assert_ne!(model.time_for(Prayer::Imsak), seeded.time_for(Prayer::Imsak));

        // And the override is written through.
        let cached = store.validated_get("prishtina", date()).await.unwrap();
        assert_eq!(cached, model);
    }

    #[tokio::test]
    async fn test_official_day_carries_hijri_label() {
        let dir = tempfile::tempdir().unwrap();
        let (provider, _) = provider_in(dir.path());
        let city = City::find("gjilan").unwrap();
        let model = provider.fetch_prayer_times(city, date()).await.unwrap();
        assert!(model.hijri_date().is_some());
    }

    #[tokio::test]
    async fn test_cache_hit_needs_no_remote() {
        let dir = tempfile::tempdir().unwrap();
        let (provider, store) = provider_in(dir.path());
        let entry = divergent_entry("zurich", date());
        store.put(entry.clone()).await;

        let city = City::find("zurich").unwrap();
        let model = provider.fetch_prayer_times(city, date()).await.unwrap();
        assert_eq!(model, entry);
    }

    #[tokio::test]
    async fn test_remote_failure_without_cache_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        let (provider, store) = provider_in(dir.path());
        // An entry for a different date must not soften the failure.
        store
            .put(divergent_entry("zurich", date() - Duration::days(1)))
            .await;

        let city = City::find("zurich").unwrap();
        let result = provider.fetch_prayer_times(city, date()).await;
        assert!(matches!(result, Err(TakvimError::Network(_))));
    }

    #[tokio::test]
    async fn test_cached_schedule_reports_miss() {
        let dir = tempfile::tempdir().unwrap();
        let (provider, store) = provider_in(dir.path());
        let city = City::find("zurich").unwrap();

        let miss = provider.cached_schedule(city, date()).await;
        assert!(matches!(miss, Err(TakvimError::CacheMiss { .. })));

        let entry = divergent_entry("zurich", date());
        store.put(entry.clone()).await;
        let hit = provider.cached_schedule(city, date()).await.unwrap();
        assert_eq!(hit, entry);
    }

    #[tokio::test]
    async fn test_invalidate_blocks_late_commit() {
        let dir = tempfile::tempdir().unwrap();
        let (provider, store) = provider_in(dir.path());

        // Snapshot an epoch, invalidate, then try to commit under the old
        // epoch the way a late fetch would.
        let epoch = provider.epoch.load(Ordering::SeqCst);
        provider.invalidate();
        provider.commit(epoch, divergent_entry("zurich", date())).await;
        assert!(store.is_empty().await);

        // A commit under the current epoch still lands.
        let epoch = provider.epoch.load(Ordering::SeqCst);
        provider.commit(epoch, divergent_entry("zurich", date())).await;
        assert_eq!(store.len().await, 1);
    }
}
