//! Slot geometry for the four summary resolutions
//!
//! A slot is the half-open interval `[start, advance(start, 1))`. Slot
//! boundaries are computed in the timestamp's own offset, so a weekly slot
//! starts at local midnight on Monday.

use crate::types::{Table, Timestamp};
use crate::units::Conversion;
use chrono::{Datelike, Duration, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Summary granularity. Each one owns a target table and reads one source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    FiveMinute,
    Hourly,
    Weekly,
    Monthly,
}

impl Resolution {
    /// Processing order used by the daemon
    pub const ALL: [Resolution; 4] = [
        Resolution::FiveMinute,
        Resolution::Hourly,
        Resolution::Weekly,
        Resolution::Monthly,
    ];

    /// Summary table written by this resolution
    pub fn table(self) -> Table {
        match self {
            Resolution::FiveMinute => Table::FiveMinute,
            Resolution::Hourly => Table::Hourly,
            Resolution::Weekly => Table::Weekly,
            Resolution::Monthly => Table::Monthly,
        }
    }

    /// Table the slots are summed from
    pub fn source(self) -> Table {
        match self {
            Resolution::FiveMinute | Resolution::Hourly => Table::Samples,
            Resolution::Weekly | Resolution::Monthly => Table::Daily,
        }
    }

    pub fn conversion(self) -> Conversion {
        match self {
            Resolution::FiveMinute | Resolution::Hourly => Conversion::MeanPower,
            Resolution::Weekly | Resolution::Monthly => Conversion::Energy,
        }
    }

    /// Start of the slot containing `t`
    pub fn slot_start(self, t: Timestamp) -> Timestamp {
        match self {
            Resolution::FiveMinute => {
                t - Duration::seconds(i64::from((t.minute() % 5) * 60 + t.second()))
                    - subsecond(&t)
            }
            Resolution::Hourly => {
                t - Duration::seconds(i64::from(t.minute() * 60 + t.second())) - subsecond(&t)
            }
            Resolution::Weekly => {
                let monday_offset = i64::from(t.weekday().num_days_from_monday());
                t - since_midnight(&t) - Duration::days(monday_offset)
            }
            Resolution::Monthly => {
                t - since_midnight(&t) - Duration::days(i64::from(t.day() - 1))
            }
        }
    }

    /// Start of the slot `n` positions after `start`
    pub fn advance(self, start: Timestamp, n: u32) -> Timestamp {
        let n64 = i64::from(n);
        match self {
            Resolution::FiveMinute => start + Duration::minutes(5 * n64),
            Resolution::Hourly => start + Duration::hours(n64),
            Resolution::Weekly => start + Duration::days(7 * n64),
            Resolution::Monthly => {
                // Day 1 plus 31 days always lands in the following month.
                (0..n).fold(start, |t, _| {
                    Resolution::Monthly.slot_start(t + Duration::days(31))
                })
            }
        }
    }

    /// Start of the slot immediately after `start`
    pub fn next_slot(self, start: Timestamp) -> Timestamp {
        self.advance(start, 1)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table().name())
    }
}

fn subsecond(t: &Timestamp) -> Duration {
    Duration::nanoseconds(i64::from(t.nanosecond() % 1_000_000_000))
}

fn since_midnight(t: &Timestamp) -> Duration {
    Duration::seconds(i64::from(t.num_seconds_from_midnight())) + subsecond(t)
}
