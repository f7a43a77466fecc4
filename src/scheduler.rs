//! Reminder scheduling against the local clock.
//!
//! Every eligible prayer gets up to two triggers: a lead reminder fifteen
//! minutes ahead and one at the prayer time itself. A generation counter
//! guards each armed trigger; rescheduling or switching city bumps it, and
//! a trigger whose generation went stale fires into nothing. A rollover
//! task re-arms the whole set shortly after each city-local midnight.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use crate::error::TakvimError;
use crate::provider::{local_today, PrayerTimeProvider};
use crate::types::{local_instant, City, DailyPrayerTimes, Prayer};

/// Minutes between the lead reminder and the prayer itself.
pub const REMINDER_LEAD_MIN: i64 = 15;

/// Outcome of a single delivery attempt. Backends report their own error
/// types; the scheduler only logs them.
pub type DeliveryResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Presentation backend for reminders. Called at fire time, never ahead
/// of it.
pub trait ReminderDelivery: Send + Sync {
    /// Presents one notification.
    fn notify(&self, request: &NotificationRequest) -> DeliveryResult;

    /// Plays or speaks the call for one prayer.
    fn play_cue(&self, prayer: Prayer) -> DeliveryResult;
}

/// The user's stored settings, read fresh on every decision that depends
/// on them.
pub trait Preferences: Send + Sync {
    /// Id of the selected city. Unknown ids resolve to the capital.
    fn selected_city_id(&self) -> String;

    fn notifications_enabled(&self) -> bool;

    /// Whether the lead reminder also plays the spoken cue. Read at fire
    /// time, not at arming time.
    fn voice_reminder_enabled(&self) -> bool;

    /// Menu bar shows the full prayer name instead of the short form.
    fn show_full_name(&self) -> bool;
}

/// One concrete notification, fully rendered at arming time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub identifier: String,
    pub fire_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TriggerClass {
    Lead,
    AtEvent,
}

#[derive(Default)]
struct SchedulerState {
    generation: u64,
    armed: HashMap<Prayer, SmallVec<[NotificationRequest; 2]>>,
    tasks: Vec<JoinHandle<()>>,
}

struct SchedulerInner {
    provider: Arc<PrayerTimeProvider>,
    delivery: Arc<dyn ReminderDelivery>,
    preferences: Arc<dyn Preferences>,
    state: Mutex<SchedulerState>,
    shutdown: Notify,
}

/// Arms, fires, and cancels prayer reminders for the selected city.
///
/// Cheap to clone; all clones share one trigger set.
#[derive(Clone)]
pub struct ReminderScheduler {
    inner: Arc<SchedulerInner>,
}

impl ReminderScheduler {
    pub fn new(
        provider: Arc<PrayerTimeProvider>,
        delivery: Arc<dyn ReminderDelivery>,
        preferences: Arc<dyn Preferences>,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                provider,
                delivery,
                preferences,
                state: Mutex::new(SchedulerState::default()),
                shutdown: Notify::new(),
            }),
        }
    }

    /// Cancels everything armed, fetches today's schedule for `city`, and
    /// arms the remaining triggers of the day.
    ///
    /// # Errors
    /// On a fetch failure nothing is re-armed; the cancel still happened.
    pub async fn refresh(&self, city: &City) -> Result<(), TakvimError> {
        let generation = self.reset().await;
        let schedule = self
            .inner
            .provider
            .fetch_prayer_times(city, local_today(city))
            .await?;
        self.arm(&schedule, generation).await;
        Ok(())
    }

    /// Switches to another city. Pending reminders for the old city are
    /// cancelled before any fetch starts, and results of fetches already
    /// in flight are barred from the cache.
    ///
    /// # Errors
    /// Propagates the fetch failure from [`refresh`](Self::refresh).
    pub async fn set_city(&self, city: &City) -> Result<(), TakvimError> {
        self.reset().await;
        self.inner.provider.invalidate();
        self.refresh(city).await
    }

    /// Cancels every pending trigger.
    pub async fn cancel_all(&self) {
        self.reset().await;
    }

    /// Snapshot of the pending requests, ordered by fire time.
    pub async fn armed(&self) -> Vec<NotificationRequest> {
        let state = self.inner.state.lock().await;
        let mut all: Vec<NotificationRequest> = state
            .armed
            .values()
            .flat_map(|list| list.iter().cloned())
            .collect();
        all.sort_by(|a, b| {
            a.fire_at
                .cmp(&b.fire_at)
                .then_with(|| a.identifier.cmp(&b.identifier))
        });
        all
    }

    /// Runs the day-rollover loop until [`shutdown`](Self::shutdown): a
    /// little after each city-local midnight the schedule is refetched and
    /// the triggers re-armed for the new day. The city is re-read from
    /// preferences at every fire.
    pub fn spawn_rollover(&self) -> JoinHandle<()> {
        let scheduler = self.clone();
        tokio::spawn(async move {
            loop {
                let tz = scheduler.current_city().country.timezone();
                let at = next_rollover(Utc::now(), tz);
                let delay = (at - Utc::now()).to_std().unwrap_or_default();
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {
                        let city = scheduler.current_city();
                        tracing::info!(city = %city.id, "new day, rescheduling");
                        if let Err(err) = scheduler.refresh(&city).await {
                            tracing::warn!(error = %err, "rollover refresh failed");
                        }
                    }
                    _ = scheduler.inner.shutdown.notified() => break,
                }
            }
        })
    }

    /// Stops the rollover loop.
    pub fn shutdown(&self) {
        self.inner.shutdown.notify_one();
    }

    fn current_city(&self) -> City {
        let id = self.inner.preferences.selected_city_id();
        City::find(&id).cloned().unwrap_or_default()
    }

    /// Bumps the generation, aborts pending trigger tasks, and empties the
    /// armed set. Returns the new generation for a follow-up arm.
    async fn reset(&self) -> u64 {
        let mut state = self.inner.state.lock().await;
        state.generation += 1;
        for task in state.tasks.drain(..) {
            task.abort();
        }
        let dropped: usize = state.armed.values().map(SmallVec::len).sum();
        state.armed.clear();
        if dropped > 0 {
            tracing::debug!(dropped, "cancelled pending reminders");
        }
        state.generation
    }

    async fn arm(&self, schedule: &DailyPrayerTimes, generation: u64) {
        if !self.inner.preferences.notifications_enabled() {
            tracing::debug!("notifications disabled, nothing armed");
            return;
        }
        let now = Utc::now();
        let city = schedule.city().clone();
        let mut pending = Vec::new();
        for kind in Prayer::IN_ORDER {
            if !kind.requires_reminder() {
                continue;
            }
            let at = schedule.time_for(kind);
            let lead = at - Duration::minutes(REMINDER_LEAD_MIN);
            if lead > now {
                pending.push((kind, TriggerClass::Lead, lead_request(kind, &city, lead, generation)));
            } else {
                tracing::debug!(prayer = kind.slug(), "lead time already passed, skipped");
            }
            if at > now {
                pending.push((kind, TriggerClass::AtEvent, event_request(kind, &city, at, generation)));
            } else {
                tracing::debug!(prayer = kind.slug(), "prayer time already passed, skipped");
            }
        }

        let mut state = self.inner.state.lock().await;
        if state.generation != generation {
            tracing::debug!(generation, "arming superseded, dropped");
            return;
        }
        let count = pending.len();
        for (kind, class, request) in pending {
            state
                .tasks
                .push(self.spawn_trigger(kind, class, request.clone(), generation));
            state.armed.entry(kind).or_default().push(request);
        }
        tracing::info!(city = %city.id, count, generation, "reminders armed");
    }

    fn spawn_trigger(
        &self,
        kind: Prayer,
        class: TriggerClass,
        request: NotificationRequest,
        generation: u64,
    ) -> JoinHandle<()> {
        let scheduler = self.clone();
        tokio::spawn(async move {
            let delay = (request.fire_at - Utc::now()).to_std().unwrap_or_default();
            tokio::time::sleep(delay).await;
            scheduler.fire(kind, class, request, generation).await;
        })
    }

    async fn fire(
        &self,
        kind: Prayer,
        class: TriggerClass,
        request: NotificationRequest,
        generation: u64,
    ) {
        {
            let mut state = self.inner.state.lock().await;
            if state.generation != generation {
                return;
            }
            if let Some(list) = state.armed.get_mut(&kind) {
                list.retain(|pending| pending.identifier != request.identifier);
                if list.is_empty() {
                    state.armed.remove(&kind);
                }
            }
        }
        if let Err(err) = self.inner.delivery.notify(&request) {
            tracing::warn!(identifier = %request.identifier, error = %err, "notification delivery failed");
        }
        // The cue must not depend on the notification having worked, and
        // the other way round.
        if class == TriggerClass::Lead && self.inner.preferences.voice_reminder_enabled() {
            if let Err(err) = self.inner.delivery.play_cue(kind) {
                tracing::warn!(prayer = kind.slug(), error = %err, "voice cue failed");
            }
        }
    }
}

fn lead_request(
    kind: Prayer,
    city: &City,
    fire_at: DateTime<Utc>,
    generation: u64,
) -> NotificationRequest {
    NotificationRequest {
        title: format!("🕌 {} për {REMINDER_LEAD_MIN} minuta!", kind.display_name()),
        body: format!(
            "Ndalo punën tani. Merr abdest dhe përgatitu për namaz. Mos e vono!\n\n📍 {}",
            city.name
        ),
        identifier: format!("prayer_reminder_{}_{}", kind.slug(), generation),
        fire_at,
    }
}

fn event_request(
    kind: Prayer,
    city: &City,
    fire_at: DateTime<Utc>,
    generation: u64,
) -> NotificationRequest {
    NotificationRequest {
        title: format!("🕋 Koha e {} ka hyrë!", kind.display_name()),
        body: format!("Allahu Ekber - Fale namazin tani.\n\n📍 {}", city.name),
        identifier: format!("prayer_time_{}_{}", kind.slug(), generation),
        fire_at,
    }
}

/// Next city-local 00:01 strictly after `now`, as an instant. Around DST
/// shifts the distance from midnight to midnight is 23 or 25 hours; the
/// result follows the local clock, not a fixed 24-hour stride.
fn next_rollover(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let mut date = now.with_timezone(&tz).date_naive();
    // Today, tomorrow, and one spare round for zones without a midnight.
    for _ in 0..3 {
        if let Some(at) = rollover_instant(date, tz) {
            if at > now {
                return at;
            }
        }
        date = date.succ_opt().unwrap_or(date);
    }
    now + Duration::days(1)
}

fn rollover_instant(date: NaiveDate, tz: Tz) -> Option<DateTime<Utc>> {
    let midnight = local_instant(date, NaiveTime::MIN, tz)?;
    Some(midnight + Duration::minutes(1))
}
