use chrono::{DateTime, Local};

/// Formatted wall-clock strings for the clock display surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockReading {
    /// `HH:MM:SS`, 24-hour.
    pub time: String,
    /// `Weekday, Month DD, YYYY`.
    pub date: String,
}

impl ClockReading {
    pub fn now() -> Self {
        Self::at(Local::now())
    }

    pub fn at(datetime: DateTime<Local>) -> Self {
        Self {
            time: datetime.format("%H:%M:%S").to_string(),
            date: datetime.format("%A, %B %d, %Y").to_string(),
        }
    }
}
