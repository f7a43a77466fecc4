//! Dry-run reminder daemon: arms today's triggers for one city and prints
//! each notification to the console as it fires. Runs until the day's
//! reminders are exhausted.
//!
//! ```sh
//! cargo run --example reminders -- gjilan
//! ```

use std::sync::Arc;

use takvim::network::AladhanClient;
use takvim::scheduler::DeliveryResult;
use takvim::{
    format, CacheStore, City, NotificationRequest, Prayer, PrayerTimeProvider, Preferences,
    ReminderDelivery, ReminderScheduler,
};

struct ConsoleDelivery;

impl ReminderDelivery for ConsoleDelivery {
    fn notify(&self, request: &NotificationRequest) -> DeliveryResult {
        println!("\n{}\n{}\n", request.title, request.body);
        Ok(())
    }

    fn play_cue(&self, prayer: Prayer) -> DeliveryResult {
        println!("♪ ezan for {}", prayer.display_name());
        Ok(())
    }
}

struct DemoPrefs {
    city: String,
}

impl Preferences for DemoPrefs {
    fn selected_city_id(&self) -> String {
        self.city.clone()
    }
    fn notifications_enabled(&self) -> bool {
        true
    }
    fn voice_reminder_enabled(&self) -> bool {
        true
    }
    fn show_full_name(&self) -> bool {
        true
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let id = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "prishtina".to_string());
    let Some(city) = City::find(&id) else {
        anyhow::bail!("unknown city {id:?}");
    };

    let store = Arc::new(CacheStore::open(std::env::temp_dir().join("takvim-demo")));
    let provider = Arc::new(PrayerTimeProvider::new(AladhanClient::new()?, store));
    let scheduler = ReminderScheduler::new(
        provider,
        Arc::new(ConsoleDelivery),
        Arc::new(DemoPrefs { city: id.clone() }),
    );

    scheduler.set_city(city).await?;
    let rollover = scheduler.spawn_rollover();

    let tz = city.country.timezone();
    let armed = scheduler.armed().await;
    println!("{} pending reminders for {}:", armed.len(), city.display_name());
    for request in &armed {
        println!("  {}  {}", format::format_time(request.fire_at, tz), request.title);
    }

    while !scheduler.armed().await.is_empty() {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
    }
    println!("all reminders for today have fired");

    scheduler.shutdown();
    rollover.await?;
    Ok(())
}
