pub mod error;
pub mod format;
pub mod hijri;
pub mod method;
pub mod network;
pub mod official;
pub mod provider;
pub mod scheduler;
pub mod store;
pub mod types;

pub use error::TakvimError;
pub use provider::PrayerTimeProvider;
pub use scheduler::{
    NotificationRequest, Preferences, ReminderDelivery, ReminderScheduler, REMINDER_LEAD_MIN,
};
pub use store::CacheStore;
pub use types::{City, Country, DailyPrayerTimes, Prayer, IMSAK_TO_FAJR_MIN};

pub mod prelude {
    pub use crate::format;
    pub use crate::provider::local_today;
    pub use crate::types::*;
    pub use crate::{CacheStore, PrayerTimeProvider, ReminderScheduler, TakvimError};
}

use chrono::{DateTime, Utc};

/// The next event relative to `now`, reaching into the provisional next
/// day once today's list is exhausted. Total: after Jacia the answer is
/// tomorrow's estimated Imsaku.
pub fn upcoming_event(schedule: &DailyPrayerTimes, now: DateTime<Utc>) -> (Prayer, DateTime<Utc>) {
    schedule.next_event(now).unwrap_or_else(|| {
        let estimate = schedule.next_day_estimate();
        estimate
            .next_event(now)
            .unwrap_or((Prayer::Imsak, estimate.time_for(Prayer::Imsak)))
    })
}
