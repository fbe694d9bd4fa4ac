use chrono::Datelike;
use serde::Serialize;

/// Rainfall season the calendar is currently in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Season {
    LongRains,
    ShortRains,
}

impl Season {
    /// Source label: `LRLD` (long rains/long dry) or `SRSD`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::LongRains => "LRLD",
            Season::ShortRains => "SRSD",
        }
    }
}

/// March through September is the long-rains season.
pub fn current_season(date: impl Datelike) -> Season {
    if (3..=9).contains(&date.month()) {
        Season::LongRains
    } else {
        Season::ShortRains
    }
}

/// Upcoming payout dates and the open sales window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PayoutSchedule {
    pub new_payout: String,
    pub current_payout: String,
    pub sales_window: String,
}

pub fn payout_schedule(date: impl Datelike) -> PayoutSchedule {
    let year = date.year();
    let next = year + 1;
    let (new_payout, current_payout, sales_window) = match date.month0() {
        0..=2 => (
            format!("October {year}"),
            format!("March {year}"),
            format!("Jan/Feb {year}"),
        ),
        3 => (
            format!("October {year}"),
            format!("March {year}"),
            format!("Aug/Sep {year}"),
        ),
        4..=9 => (
            format!("March {next}"),
            format!("October {year}"),
            format!("Aug/Sep {year}"),
        ),
        _ => (
            format!("October {next}"),
            format!("March {next}"),
            format!("Jan/Feb {next}"),
        ),
    };
    PayoutSchedule {
        new_payout,
        current_payout,
        sales_window,
    }
}
