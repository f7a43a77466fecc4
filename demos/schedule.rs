//! Prints today's takvim for one city.
//!
//! ```sh
//! cargo run --example schedule -- zurich
//! ```

use std::sync::Arc;

use chrono::Utc;
use takvim::format;
use takvim::network::AladhanClient;
use takvim::provider::local_today;
use takvim::{upcoming_event, CacheStore, City, Prayer, PrayerTimeProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let id = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "prishtina".to_string());
    let Some(city) = City::find(&id) else {
        eprintln!("unknown city {id:?}; pick one of:");
        for c in City::all() {
            eprintln!("  {:12} {} {}", c.id, c.country.flag(), c.display_name());
        }
        std::process::exit(1);
    };

    let store = Arc::new(CacheStore::open(std::env::temp_dir().join("takvim-demo")));
    let provider = PrayerTimeProvider::new(AladhanClient::new()?, store);

    let date = local_today(city);
    let schedule = provider.fetch_prayer_times(city, date).await?;

    let tz = city.country.timezone();
    println!("{} {}", city.country.flag(), city.display_name());
    println!("{}", format::format_date(date));
    if let Some(hijri) = schedule.hijri_date() {
        println!("{hijri}");
    }
    println!();
    for kind in Prayer::IN_ORDER {
        println!(
            "  {:16} {}",
            kind.display_name(),
            format::format_time(schedule.time_for(kind), tz)
        );
    }

    let now = Utc::now();
    let (next, at) = upcoming_event(&schedule, now);
    println!();
    println!(
        "Next: {} ({})",
        next.display_name(),
        format::format_countdown(at - now)
    );
    Ok(())
}
