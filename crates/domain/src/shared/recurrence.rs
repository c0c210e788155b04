use chrono::{offset::LocalResult, prelude::*, Duration, Offset};
use chrono_tz::Tz;
use cron::Schedule;
use serde::{de::Visitor, Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum InvalidCronError {
    #[error("Cron expression: `{0}` must have 5 or 6 fields")]
    FieldCount(String),
    #[error("Cron expression: `{0}` is malformed. Error message: `{1}`")]
    Malformed(String, String),
}

#[derive(Error, Debug, PartialEq)]
pub enum InvalidTimezoneError {
    #[error("Timezone: `{0}` is not a known IANA timezone")]
    Unknown(String),
}

pub fn parse_timezone(name: &str) -> Result<Tz, InvalidTimezoneError> {
    name.parse::<Tz>()
        .map_err(|_| InvalidTimezoneError::Unknown(name.to_string()))
}

/// A validated cron expression.
///
/// Accepts the classic 5 field form (`min hour dom month dow`) and the
/// 6 field form with a leading seconds field. The expression is kept in the
/// form it was given so that it round trips through storage unchanged.
#[derive(Clone, Debug)]
pub struct CronSchedule {
    expression: String,
    schedule: Schedule,
}

impl CronSchedule {
    pub fn as_str(&self) -> &str {
        &self.expression
    }

    /// The first occurrence strictly after `after`, evaluated on the wall
    /// clock of `timezone`.
    ///
    /// Wall clock times that do not map to exactly one instant are resolved
    /// like this:
    /// - inside a spring-forward gap the time is read with the offset in
    ///   force before the gap, so it lands later by the length of the gap
    /// - inside a fall-back overlap the earlier offset wins and the repeated
    ///   wall clock time fires only once
    ///
    /// `None` means the expression has no further occurrences.
    pub fn next_fire_after(&self, timezone: &Tz, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let local_after = after.with_timezone(timezone).naive_local();
        // The cron iterator walks wall clock fields, UTC only carries them.
        let carrier = Utc.from_utc_datetime(&local_after);

        self.schedule
            .after(&carrier)
            .map(|candidate| resolve_local(timezone, &candidate.naive_utc()))
            .find(|instant| *instant > after)
    }

    pub fn next_fire_after_millis(&self, timezone: &Tz, after_millis: i64) -> Option<i64> {
        let after = Utc.timestamp_millis_opt(after_millis).single()?;
        self.next_fire_after(timezone, after)
            .map(|instant| instant.timestamp_millis())
    }
}

fn resolve_local(timezone: &Tz, local: &NaiveDateTime) -> DateTime<Utc> {
    match timezone.from_local_datetime(local) {
        LocalResult::Single(instant) => instant.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            // Transitions are never a day apart
            let offset_before_gap = timezone
                .offset_from_utc_datetime(&(*local - Duration::days(1)))
                .fix();
            Utc.from_utc_datetime(
                &(*local - Duration::seconds(offset_before_gap.local_minus_utc() as i64)),
            )
        }
    }
}

fn normalize(expression: &str) -> Result<String, InvalidCronError> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    match fields.len() {
        5 => Ok(format!("0 {}", fields.join(" "))),
        6 => Ok(fields.join(" ")),
        _ => Err(InvalidCronError::FieldCount(expression.to_string())),
    }
}

impl FromStr for CronSchedule {
    type Err = InvalidCronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s)?;
        let schedule = Schedule::from_str(&normalized)
            .map_err(|e| InvalidCronError::Malformed(s.to_string(), e.to_string()))?;

        Ok(Self {
            expression: s.trim().to_string(),
            schedule,
        })
    }
}

impl PartialEq for CronSchedule {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression
    }
}

impl Display for CronSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.expression)
    }
}

impl Serialize for CronSchedule {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.expression)
    }
}

impl<'de> Deserialize<'de> for CronSchedule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct CronScheduleVisitor;

        impl<'de> Visitor<'de> for CronScheduleVisitor {
            type Value = CronSchedule;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("A valid cron expression")
            }

            fn visit_str<E>(self, value: &str) -> Result<CronSchedule, E>
            where
                E: serde::de::Error,
            {
                value
                    .parse::<CronSchedule>()
                    .map_err(|e| E::custom(e.to_string()))
            }
        }

        deserializer.deserialize_str(CronScheduleVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::{America::New_York, Asia::Dhaka, Europe::London};

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse::<DateTime<Utc>>().unwrap()
    }

    fn cron(s: &str) -> CronSchedule {
        s.parse().unwrap()
    }

    #[test]
    fn accepts_five_and_six_field_expressions() {
        assert!("* * * * *".parse::<CronSchedule>().is_ok());
        assert!("30 8 * * *".parse::<CronSchedule>().is_ok());
        assert!("0 30 8 * * *".parse::<CronSchedule>().is_ok());
        assert!("0 0 9 * * MON-FRI".parse::<CronSchedule>().is_ok());
    }

    #[test]
    fn rejects_invalid_expressions() {
        assert!(matches!(
            "".parse::<CronSchedule>(),
            Err(InvalidCronError::FieldCount(_))
        ));
        assert!(matches!(
            "* * *".parse::<CronSchedule>(),
            Err(InvalidCronError::FieldCount(_))
        ));
        assert!(matches!(
            "0 0 0 0 0 0 0 0".parse::<CronSchedule>(),
            Err(InvalidCronError::FieldCount(_))
        ));
        assert!(matches!(
            "invalid * * * *".parse::<CronSchedule>(),
            Err(InvalidCronError::Malformed(_, _))
        ));
        assert!(matches!(
            "0 99 * * * *".parse::<CronSchedule>(),
            Err(InvalidCronError::Malformed(_, _))
        ));
    }

    #[test]
    fn parses_timezones() {
        assert_eq!(parse_timezone("Asia/Dhaka"), Ok(Dhaka));
        assert!(parse_timezone("Mars/Olympus_Mons").is_err());
    }

    #[test]
    fn five_field_expression_fires_on_local_wall_clock() {
        // 08:30 in Dhaka (UTC+6) is 02:30 UTC
        let next = cron("30 8 * * *").next_fire_after(&Dhaka, utc("2024-01-01T00:00:00Z"));
        assert_eq!(next, Some(utc("2024-01-01T02:30:00Z")));

        let next = cron("30 8 * * *").next_fire_after(&Dhaka, utc("2024-01-01T02:30:00Z"));
        assert_eq!(next, Some(utc("2024-01-02T02:30:00Z")));
    }

    #[test]
    fn spring_forward_gap_moves_later_by_gap_length() {
        // 2024-03-10 02:00 EST jumps to 03:00 EDT in New York
        let schedule = cron("0 30 2 * * *");
        let first = schedule
            .next_fire_after(&New_York, utc("2024-03-10T05:00:00Z"))
            .unwrap();
        // 03:30 EDT
        assert_eq!(first, utc("2024-03-10T07:30:00Z"));

        let second = schedule.next_fire_after(&New_York, first).unwrap();
        // 02:30 EDT the day after
        assert_eq!(second, utc("2024-03-11T06:30:00Z"));
    }

    #[test]
    fn spring_forward_gap_does_not_fire_twice() {
        // Hourly at half past: 01:30 EST, then 02:30 (gap) and 03:30 EDT are the same instant
        let schedule = cron("0 30 * * * *");
        let at_0130 = schedule
            .next_fire_after(&New_York, utc("2024-03-10T06:00:00Z"))
            .unwrap();
        assert_eq!(at_0130, utc("2024-03-10T06:30:00Z"));
        let at_0330 = schedule.next_fire_after(&New_York, at_0130).unwrap();
        assert_eq!(at_0330, utc("2024-03-10T07:30:00Z"));
        let at_0430 = schedule.next_fire_after(&New_York, at_0330).unwrap();
        assert_eq!(at_0430, utc("2024-03-10T08:30:00Z"));
    }

    #[test]
    fn fall_back_overlap_picks_earlier_offset() {
        // 2024-11-03 02:00 EDT falls back to 01:00 EST in New York
        let schedule = cron("0 30 1 * * *");
        let first = schedule
            .next_fire_after(&New_York, utc("2024-11-03T04:00:00Z"))
            .unwrap();
        // 01:30 EDT
        assert_eq!(first, utc("2024-11-03T05:30:00Z"));

        // The repeated 01:30 EST is not a second occurrence
        let second = schedule.next_fire_after(&New_York, first).unwrap();
        assert_eq!(second, utc("2024-11-04T06:30:00Z"));
    }

    #[test]
    fn fall_back_overlap_from_inside_the_repeated_hour() {
        // 01:10 EST, the second pass through the repeated hour
        let next = cron("0 30 1 * * *")
            .next_fire_after(&New_York, utc("2024-11-03T06:10:00Z"))
            .unwrap();
        assert_eq!(next, utc("2024-11-04T06:30:00Z"));
    }

    #[test]
    fn is_strictly_increasing_when_fed_its_own_result() {
        let expressions = ["*/7 * * * *", "0 15 * * * *", "0 30 1 * * *", "0 0 2 * * *"];
        for expression in expressions.iter() {
            let schedule = cron(expression);
            for tz in [London, New_York, Dhaka].iter() {
                // Spans the October transition in both London and New York
                let mut after = utc("2024-10-26T00:00:00Z");
                for _ in 0..200 {
                    let next = schedule.next_fire_after(tz, after).unwrap();
                    assert!(next > after, "{} in {:?} went backwards", expression, tz);
                    after = next;
                }
            }
        }
    }

    #[test]
    fn millis_variant_matches() {
        let schedule = cron("30 8 * * *");
        let after = utc("2024-01-01T00:00:00Z");
        assert_eq!(
            schedule.next_fire_after_millis(&Dhaka, after.timestamp_millis()),
            Some(utc("2024-01-01T02:30:00Z").timestamp_millis())
        );
    }

    #[test]
    fn serializes_as_the_given_expression() {
        let schedule = cron("30 8 * * *");
        let json = serde_json::to_string(&schedule).unwrap();
        assert_eq!(json, "\"30 8 * * *\"");
        let parsed: CronSchedule = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, schedule);
        assert!(serde_json::from_str::<CronSchedule>("\"nope\"").is_err());
    }
}
