// tests/token_uniqueness.rs

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;

use cartodb_backup::types::{RunFlags, TimestampToken};
use cartodb_backup_test_utils::builders::{ConfigFileBuilder, context};

// Seconds between 2000-01-01 and roughly 2090.
fn instant_strategy() -> impl Strategy<Value = i64> {
    0i64..2_840_000_000
}

fn token_at(offset_secs: i64) -> TimestampToken {
    let base = NaiveDate::from_ymd_opt(2000, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let dt = Utc.from_utc_datetime(&(base + Duration::seconds(offset_secs)));
    TimestampToken::from_datetime(&dt)
}

proptest! {
    #[test]
    fn distinct_seconds_give_distinct_artifact_names(a in instant_strategy(), b in instant_strategy()) {
        prop_assume!(a != b);

        let dir = tempfile::tempdir().unwrap();
        let cfg = ConfigFileBuilder::new(dir.path()).build();

        let ta = token_at(a);
        let tb = token_at(b);
        prop_assert_ne!(&ta, &tb);

        let ca = context(&cfg, RunFlags::default(), ta.as_str());
        let cb = context(&cfg, RunFlags::default(), tb.as_str());

        prop_assert_ne!(ca.dump_filename(), cb.dump_filename());
        prop_assert_ne!(ca.archive_path(), cb.archive_path());
        prop_assert_ne!(ca.target_database("mirror"), cb.target_database("mirror"));
    }

    #[test]
    fn token_order_follows_time_order(a in instant_strategy(), b in instant_strategy()) {
        prop_assume!(a < b);
        prop_assert!(token_at(a) < token_at(b));
    }
}
