//! Maps timestamps onto the discrete time slots charts are grouped by.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Timelike, Utc};

use crate::error::Error;

/// Time resolution a chart is requested at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Minute,
    TenMinutes,
    Hour,
    HalfDay,
    Day,
}

impl Granularity {
    pub const ALL: [Granularity; 5] = [
        Granularity::Minute,
        Granularity::TenMinutes,
        Granularity::Hour,
        Granularity::HalfDay,
        Granularity::Day,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Minute => "minute",
            Granularity::TenMinutes => "ten_minutes",
            Granularity::Hour => "hour",
            Granularity::HalfDay => "half_day",
            Granularity::Day => "day",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Granularity::Minute => "Minute",
            Granularity::TenMinutes => "10 Minutes",
            Granularity::Hour => "Hour",
            Granularity::HalfDay => "½ Day",
            Granularity::Day => "Day",
        }
    }

    /// Primary truncation format of the period id.
    fn period_format(&self) -> &'static str {
        match self {
            Granularity::Minute => "%Y%m%d%H%M",
            Granularity::TenMinutes | Granularity::Hour => "%Y%m%d%H",
            Granularity::HalfDay | Granularity::Day => "%Y%m%d",
        }
    }

    /// Secondary offset inside the primary period; only part of the group key.
    fn sub_offset(&self, ts: DateTime<Utc>) -> Option<u32> {
        match self {
            Granularity::TenMinutes => Some(ts.minute() - ts.minute() % 10),
            Granularity::HalfDay => Some(ts.hour() - ts.hour() % 12),
            Granularity::Minute | Granularity::Hour | Granularity::Day => None,
        }
    }

    pub fn bucket(self, ts: DateTime<Utc>) -> BucketKey {
        BucketKey {
            granularity: self,
            period_id: ts.format(self.period_format()).to_string(),
            sub_offset: self.sub_offset(ts),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Granularity::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| Error::InvalidGranularity(s.to_owned()))
    }
}

/// Time component of a group key. Timestamps are bucketed in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketKey {
    pub granularity: Granularity,
    pub period_id: String,
    pub sub_offset: Option<u32>,
}

pub fn bucket(ts: DateTime<Utc>, granularity: Granularity) -> BucketKey {
    granularity.bucket(ts)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 3, 14, h, m, s).unwrap()
    }

    #[test]
    fn keys_for_each_granularity() {
        let ts = at(13, 47, 21);
        let cases = [
            (Granularity::Minute, "201603141347", None),
            (Granularity::TenMinutes, "2016031413", Some(40)),
            (Granularity::Hour, "2016031413", None),
            (Granularity::HalfDay, "20160314", Some(12)),
            (Granularity::Day, "20160314", None),
        ];
        for (granularity, period_id, sub_offset) in cases {
            let key = bucket(ts, granularity);
            assert_eq!(key.period_id, period_id, "{granularity}");
            assert_eq!(key.sub_offset, sub_offset, "{granularity}");
        }
    }

    #[test]
    fn half_day_splits_at_noon() {
        let morning = bucket(at(3, 0, 0), Granularity::HalfDay);
        let late_morning = bucket(at(10, 0, 0), Granularity::HalfDay);
        let afternoon = bucket(at(13, 0, 0), Granularity::HalfDay);

        assert_eq!(morning.sub_offset, Some(0));
        assert_eq!(morning, late_morning);
        assert_eq!(afternoon.sub_offset, Some(12));
        assert_ne!(morning, afternoon);
    }

    #[test]
    fn ten_minute_slots_do_not_leak_across_hours() {
        let before = bucket(at(9, 55, 0), Granularity::TenMinutes);
        let after = bucket(at(10, 5, 0), Granularity::TenMinutes);
        assert_eq!(before.sub_offset, Some(50));
        assert_eq!(after.sub_offset, Some(0));
        assert_ne!(before, after);

        assert_eq!(
            bucket(at(10, 1, 0), Granularity::TenMinutes),
            bucket(at(10, 9, 59), Granularity::TenMinutes)
        );
    }

    #[test]
    fn parses_known_names_only() {
        for granularity in Granularity::ALL {
            assert_eq!(granularity.as_str().parse::<Granularity>().unwrap(), granularity);
        }
        assert!(matches!(
            "fortnight".parse::<Granularity>(),
            Err(Error::InvalidGranularity(name)) if name == "fortnight"
        ));
        assert!("".parse::<Granularity>().is_err());
        assert!("Minute".parse::<Granularity>().is_err());
    }
}
