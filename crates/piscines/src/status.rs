//! Whether a pool is open at a given moment, read from its harvested
//! schedule text.

use std::fmt::Display;
use std::sync::LazyLock;

use chrono::{NaiveTime, Timelike};
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::types::{Day, Schedule};

/// Entry stops this long before closing.
pub const LAST_ENTRY_MINUTES: u16 = 45;

const END_OF_DAY: u16 = 24 * 60;

static RE_TIME_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})\s*h\s*(\d{2})\s*[–-]\s*(\d{1,2})\s*h\s*(\d{2})")
        .expect("invalid regex: time range")
});

/// Minutes since midnight. `24h00` is a valid closing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockTime(u16);

impl ClockTime {
    pub fn new(hour: u16, minute: u16) -> Option<Self> {
        if minute >= 60 {
            return None;
        }
        let minutes = hour.checked_mul(60)?.checked_add(minute)?;
        (minutes <= END_OF_DAY).then_some(Self(minutes))
    }

    pub fn minutes(&self) -> u16 {
        self.0
    }

    fn saturating_sub(self, minutes: u16) -> Self {
        Self(self.0.saturating_sub(minutes))
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(time: NaiveTime) -> Self {
        Self((time.hour() * 60 + time.minute()) as u16)
    }
}

impl Display for ClockTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}h{:02}", self.0 / 60, self.0 % 60)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("{:02}:{:02}", self.0 / 60, self.0 % 60))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TimeRange {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeRange {
    pub fn last_entry(&self) -> ClockTime {
        self.end.saturating_sub(LAST_ENTRY_MINUTES)
    }
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

/// Every `HH h MM – HH h MM` in a schedule value, earliest first.
pub fn parse_ranges(text: &str) -> Vec<TimeRange> {
    let mut ranges: Vec<TimeRange> = RE_TIME_RANGE
        .captures_iter(text)
        .filter_map(|caps| {
            let start = time(&caps[1], &caps[2])?;
            let end = time(&caps[3], &caps[4])?;
            Some(TimeRange { start, end })
        })
        .collect();
    ranges.sort();
    ranges
}

fn time(hour: &str, minute: &str) -> Option<ClockTime> {
    ClockTime::new(hour.parse().ok()?, minute.parse().ok()?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosedReason {
    NoScheduleForDay,
    Unrecognized,
    DayOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PoolStatus {
    Open {
        closes_at: ClockTime,
        last_entry: ClockTime,
    },
    /// Open, but past the last entry time.
    ClosingSoon {
        closes_at: ClockTime,
        last_entry: ClockTime,
    },
    OpeningSoon {
        opens_at: ClockTime,
        closes_at: ClockTime,
    },
    /// Opens at some point on a day other than today.
    OpenThatDay { first: TimeRange, more: bool },
    Closed { reason: ClosedReason },
}

impl PoolStatus {
    /// Status at `time` on `day`, with `day` taken to be today.
    pub fn at(schedule: &Schedule, day: Day, time: impl Into<ClockTime>) -> Self {
        let ranges = match day_ranges(schedule, day) {
            Ok(ranges) => ranges,
            Err(closed) => return closed,
        };
        let now = time.into();

        for range in ranges {
            if now >= range.start && now < range.end {
                let last_entry = range.last_entry();
                return if now >= last_entry {
                    PoolStatus::ClosingSoon {
                        closes_at: range.end,
                        last_entry,
                    }
                } else {
                    PoolStatus::Open {
                        closes_at: range.end,
                        last_entry,
                    }
                };
            }
            if now < range.start {
                return PoolStatus::OpeningSoon {
                    opens_at: range.start,
                    closes_at: range.end,
                };
            }
        }

        PoolStatus::Closed {
            reason: ClosedReason::DayOver,
        }
    }

    /// Status for a day that is not today: its first opening, if any.
    pub fn on(schedule: &Schedule, day: Day) -> Self {
        let ranges = match day_ranges(schedule, day) {
            Ok(ranges) => ranges,
            Err(closed) => return closed,
        };

        PoolStatus::OpenThatDay {
            first: ranges[0],
            more: ranges.len() > 1,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(
            self,
            PoolStatus::Open { .. } | PoolStatus::ClosingSoon { .. }
        )
    }
}

/// Sorted ranges of `day`, never empty, or the closed status to report.
fn day_ranges(schedule: &Schedule, day: Day) -> Result<Vec<TimeRange>, PoolStatus> {
    let Some(text) = schedule.get(day).filter(|text| !text.trim().is_empty()) else {
        return Err(PoolStatus::Closed {
            reason: ClosedReason::NoScheduleForDay,
        });
    };

    let ranges = parse_ranges(text);
    if ranges.is_empty() {
        return Err(PoolStatus::Closed {
            reason: ClosedReason::Unrecognized,
        });
    }
    Ok(ranges)
}

impl Display for PoolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolStatus::Open {
                closes_at,
                last_entry,
            }
            | PoolStatus::ClosingSoon {
                closes_at,
                last_entry,
            } => write!(f, "Ferme à {} (Dernier accès : {})", closes_at, last_entry),
            PoolStatus::OpeningSoon {
                opens_at,
                closes_at,
            } => write!(f, "Ouvre à {} ({} - {})", opens_at, opens_at, closes_at),
            PoolStatus::OpenThatDay { first, more } => {
                write!(f, "Ouvert : {}", first)?;
                if *more {
                    write!(f, " ...")?;
                }
                Ok(())
            }
            PoolStatus::Closed { reason } => match reason {
                ClosedReason::NoScheduleForDay => write!(f, "Fermé ce jour"),
                ClosedReason::Unrecognized => write!(f, "Fermé"),
                ClosedReason::DayOver => write!(f, "Fermé pour la journée"),
            },
        }
    }
}
