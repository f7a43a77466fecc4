use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use proptest::prelude::*;

use takvim::format::{format_countdown, short_countdown};
use takvim::types::SourceTimes;
use takvim::{City, DailyPrayerTimes, Prayer, IMSAK_TO_FAJR_MIN};

/// A well-formed schedule on an arbitrary 2026 day. Times stay between
/// 03:00 and 23:59 local so no generated instant can land inside a DST
/// transition window.
fn build_schedule(days: i64, imsak_min: i64, gaps: [i64; 5]) -> DailyPrayerTimes {
    let city = City::find("prishtina").unwrap().clone();
    let tz = city.country.timezone();
    let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + Duration::days(days);
    let at = |minute: i64| -> DateTime<Utc> {
        let time =
            NaiveTime::from_hms_opt((minute / 60) as u32, (minute % 60) as u32, 0).unwrap();
        tz.from_local_datetime(&date.and_time(time))
            .earliest()
            .unwrap()
            .with_timezone(&Utc)
    };
    let sunrise = imsak_min + gaps[0];
    let dhuhr = sunrise + gaps[1];
    let asr = dhuhr + gaps[2];
    let maghrib = asr + gaps[3];
    let isha = maghrib + gaps[4];
    let times = SourceTimes {
        imsak: at(imsak_min),
        sunrise: at(sunrise),
        dhuhr: at(dhuhr),
        asr: at(asr),
        maghrib: at(maghrib),
        isha: at(isha),
    };
    DailyPrayerTimes::new(city, date, times, None).unwrap()
}

proptest! {
    /// Invariant: the dawn prayer sits exactly 35 minutes after Imsaku,
    /// and the offset survives a serialization round trip.
    #[test]
    fn dawn_offset_always_holds(days in 0i64..365, imsak in 185i64..300,
                                g1 in 36i64..180, g2 in 36i64..180, g3 in 36i64..180,
                                g4 in 36i64..180, g5 in 36i64..180) {
        let model = build_schedule(days, imsak, [g1, g2, g3, g4, g5]);
        assert_eq!(
            model.time_for(Prayer::Fajr) - model.time_for(Prayer::Imsak),
            Duration::minutes(IMSAK_TO_FAJR_MIN)
        );

        let json = serde_json::to_string(&model).unwrap();
        let back: DailyPrayerTimes = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
    }

    /// Invariant: for any probe instant, `previous_event` is at or before
    /// it and `next_event` strictly after it; the endpoints are Imsaku
    /// and Jacia.
    #[test]
    fn events_partition_the_day(days in 0i64..365, imsak in 185i64..300,
                                g1 in 36i64..180, g2 in 36i64..180, g3 in 36i64..180,
                                g4 in 36i64..180, g5 in 36i64..180,
                                offset in 0i64..1700) {
        let model = build_schedule(days, imsak, [g1, g2, g3, g4, g5]);
        let probe = model.time_for(Prayer::Imsak) + Duration::minutes(offset - 200);

        match model.previous_event(probe) {
            Some((_, time)) => assert!(time <= probe),
            None => assert!(probe < model.time_for(Prayer::Imsak)),
        }
        match model.next_event(probe) {
            Some((_, time)) => assert!(time > probe),
            None => assert!(probe >= model.time_for(Prayer::Isha)),
        }
    }

    /// Invariant: a stored schedule whose dawn time was moved by any
    /// nonzero amount no longer deserializes.
    #[test]
    fn shifted_dawn_is_rejected(days in 0i64..365, delta in -120i64..=120) {
        prop_assume!(delta != 0);
        let model = build_schedule(days, 240, [90, 300, 200, 150, 90]);

        let mut value = serde_json::to_value(&model).unwrap();
        let fajr: DateTime<Utc> = serde_json::from_value(value["fajr"].clone()).unwrap();
        value["fajr"] = serde_json::to_value(fajr + Duration::minutes(delta)).unwrap();

        assert!(serde_json::from_value::<DailyPrayerTimes>(value).is_err());
    }

    /// Invariant: the official table answers every 2026 day for every
    /// Kosovo city, with the six times in strict day order.
    #[test]
    fn official_rows_are_total_and_ordered(days in 0i64..365, city_idx in 0usize..7) {
        let cities = ["prishtina", "prizren", "peja", "gjakova", "mitrovica", "ferizaj", "gjilan"];
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + Duration::days(days);

        let row = takvim::official::lookup(cities[city_idx], date).unwrap();
        assert!(row.imsak < row.sunrise);
        assert!(row.sunrise < row.dhuhr);
        assert!(row.dhuhr < row.asr);
        assert!(row.asr < row.maghrib);
        assert!(row.maghrib < row.isha);
    }

    /// Invariant: countdown text says "Tani" exactly when the moment has
    /// passed, and switches format at the one-hour mark.
    #[test]
    fn countdown_text_matches_the_remaining_time(secs in -100_000i64..200_000) {
        let remaining = Duration::seconds(secs);
        let long = format_countdown(remaining);
        let short = short_countdown(remaining);

        if secs <= 0 {
            assert_eq!(long, "Tani");
            assert_eq!(short, "Tani");
        } else if secs < 3600 {
            assert!(!long.contains('h'));
            assert!(!short.contains(':'));
        } else {
            assert!(long.contains('h'));
            assert!(short.contains(':'));
        }
    }
}
