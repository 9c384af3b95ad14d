//! Release identifiers
//!
//! Multi-module releases are identified by the current UTC date, with a
//! numeric suffix distinguishing multiple same-day releases. Prior release
//! tags follow the `release-YYYY-MM-DD(.N)` convention.

use chrono::{DateTime, Utc};

/// Prefix of repository-wide release tags.
pub const RELEASE_TAG_PREFIX: &str = "release-";

/// A source of the current time, injectable for testing.
pub trait Clock {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The next release identifier: the current UTC date, suffixed with `.N`
/// when releases for the same date already exist.
///
/// First release of the day is `YYYY-MM-DD`, the second `YYYY-MM-DD.2`.
pub fn next_release_id(tags: &[String], clock: &impl Clock) -> String {
    let date = clock.now_utc().date_naive().format("%Y-%m-%d").to_string();

    let mut latest = 0u64;
    for tag in tags {
        let Some(rest) = tag.strip_prefix(RELEASE_TAG_PREFIX) else {
            continue;
        };

        let (day, suffix) = match rest.split_once('.') {
            Some((day, suffix)) => (day, Some(suffix)),
            None => (rest, None),
        };
        if day != date {
            continue;
        }

        match suffix {
            None => latest = latest.max(1),
            Some(suffix) => {
                if let Ok(n) = suffix.parse::<u64>() {
                    latest = latest.max(n);
                }
            }
        }
    }

    if latest == 0 {
        date
    } else {
        format!("{date}.{}", latest + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now_utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2021, 5, 6, 12, 30, 0).unwrap())
    }

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_first_release_of_the_day() {
        assert_eq!(next_release_id(&[], &clock()), "2021-05-06");
        assert_eq!(
            next_release_id(&tags(&["release-2021-05-05", "v1.0.0"]), &clock()),
            "2021-05-06"
        );
    }

    #[test]
    fn test_same_day_releases() {
        assert_eq!(
            next_release_id(&tags(&["release-2021-05-06"]), &clock()),
            "2021-05-06.2"
        );
        assert_eq!(
            next_release_id(
                &tags(&["release-2021-05-06", "release-2021-05-06.2"]),
                &clock()
            ),
            "2021-05-06.3"
        );
        assert_eq!(
            next_release_id(
                &tags(&["release-2021-05-06.4", "release-2021-05-06.2"]),
                &clock()
            ),
            "2021-05-06.5"
        );
    }

    #[test]
    fn test_unrelated_tags_ignored() {
        assert_eq!(
            next_release_id(
                &tags(&["config/v1.0.0", "release-garbage", "release-2021-05-06.x"]),
                &clock()
            ),
            "2021-05-06"
        );
    }
}
