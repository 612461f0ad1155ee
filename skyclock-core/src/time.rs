use std::time::Instant;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};

use crate::error::SceneError;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub struct StepTimer {
    start: Instant,
}

impl StepTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// Where the scene reads "now" from.
pub trait TimeSource {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulatedClock {
    at: NaiveDateTime,
}

impl SimulatedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        Self { at }
    }

    /// Today (local date) at `hour:minute`.
    pub fn at_time(hour: u32, minute: u32) -> Result<Self, SceneError> {
        let time = parse_hm(hour, minute)?;
        Ok(Self::new(Local::now().date_naive().and_time(time)))
    }

    pub fn set(&mut self, at: NaiveDateTime) {
        self.at = at;
    }

    pub fn set_time_of_day(&mut self, hour: u32, minute: u32) -> Result<(), SceneError> {
        self.at = self.at.date().and_time(parse_hm(hour, minute)?);
        Ok(())
    }

    pub fn advance_minutes(&mut self, minutes: i64) {
        self.at += chrono::Duration::minutes(minutes);
    }
}

impl TimeSource for SimulatedClock {
    fn now(&self) -> NaiveDateTime {
        self.at
    }
}

/// Switchable clock for a presentation surface that can toggle simulation
/// at runtime. Reads the system clock unless a simulated one is installed.
#[derive(Clone, Copy, Debug, Default)]
pub struct SceneClock {
    simulated: Option<SimulatedClock>,
}

impl SceneClock {
    pub fn simulated(clock: SimulatedClock) -> Self {
        Self {
            simulated: Some(clock),
        }
    }

    pub fn is_simulated(&self) -> bool {
        self.simulated.is_some()
    }

    /// Switches to a simulated clock, frozen at the current reading if
    /// simulation was off.
    pub fn simulate(&mut self) -> &mut SimulatedClock {
        self.simulated
            .get_or_insert_with(|| SimulatedClock::new(SystemClock.now()))
    }

    pub fn follow_system(&mut self) {
        self.simulated = None;
    }
}

impl TimeSource for SceneClock {
    fn now(&self) -> NaiveDateTime {
        match &self.simulated {
            Some(sim) => sim.now(),
            None => SystemClock.now(),
        }
    }
}

fn parse_hm(hour: u32, minute: u32) -> Result<NaiveTime, SceneError> {
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or(SceneError::InvalidTime { hour, minute })
}

/// Parses `HH:MM`.
pub fn parse_clock(text: &str) -> Result<NaiveTime, SceneError> {
    let malformed = || SceneError::MalformedClock(text.to_string());
    let (h, m) = text.trim().split_once(':').ok_or_else(malformed)?;
    let hour = h.parse().map_err(|_| malformed())?;
    let minute = m.parse().map_err(|_| malformed())?;
    parse_hm(hour, minute)
}

pub fn minutes_of_day(at: &NaiveDateTime) -> u32 {
    at.hour() * 60 + at.minute()
}

/// Hours since midnight at minute precision.
pub fn fractional_hour(at: &NaiveDateTime) -> f64 {
    f64::from(at.hour()) + f64::from(at.minute()) / 60.0
}

/// Epoch milliseconds of a local wall-clock reading. A time skipped by a
/// DST jump has no local instant and is read as UTC.
pub fn unix_millis(at: &NaiveDateTime) -> i64 {
    Local
        .from_local_datetime(at)
        .earliest()
        .map_or_else(|| at.and_utc().timestamp_millis(), |dt| dt.timestamp_millis())
}

pub fn format_clock(at: &NaiveDateTime) -> String {
    format!("{:02}:{:02}:{:02}", at.hour(), at.minute(), at.second())
}

pub fn format_date(at: &NaiveDateTime) -> String {
    let date: NaiveDate = at.date();
    let weekday = WEEKDAYS[date.weekday().num_days_from_sunday() as usize];
    format!(
        "{}/{:02}/{:02} ({weekday})",
        date.year(),
        date.month(),
        date.day()
    )
}
