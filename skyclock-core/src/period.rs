use serde::{Deserialize, Serialize};

use crate::time::MINUTES_PER_DAY;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    Morning,
    Day,
    Sunset,
    Night,
}

/// `[start, end)` in whole hours; `end < start` wraps past midnight.
#[derive(Clone, Copy, Debug)]
pub struct Window {
    pub period: TimePeriod,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Window {
    fn start(&self) -> u32 {
        self.start_hour * 60
    }

    fn end(&self) -> u32 {
        self.end_hour * 60
    }

    fn wraps(&self) -> bool {
        self.end_hour < self.start_hour
    }

    pub fn len_minutes(&self) -> u32 {
        if self.wraps() {
            MINUTES_PER_DAY - self.start() + self.end()
        } else {
            self.end() - self.start()
        }
    }

    pub fn contains(&self, minute: u32) -> bool {
        if self.wraps() {
            minute >= self.start() || minute < self.end()
        } else {
            minute >= self.start() && minute < self.end()
        }
    }

    /// Minutes elapsed since the window opened. Only meaningful when
    /// `contains(minute)`.
    fn elapsed(&self, minute: u32) -> u32 {
        if minute >= self.start() {
            minute - self.start()
        } else {
            minute + (MINUTES_PER_DAY - self.start())
        }
    }
}

/// The four windows in cycle order. Together they cover the day exactly once.
pub const WINDOWS: [Window; 4] = [
    Window {
        period: TimePeriod::Morning,
        start_hour: 5,
        end_hour: 8,
    },
    Window {
        period: TimePeriod::Day,
        start_hour: 8,
        end_hour: 18,
    },
    Window {
        period: TimePeriod::Sunset,
        start_hour: 18,
        end_hour: 19,
    },
    Window {
        period: TimePeriod::Night,
        start_hour: 19,
        end_hour: 5,
    },
];

impl TimePeriod {
    pub const ALL: [TimePeriod; 4] = [
        TimePeriod::Morning,
        TimePeriod::Day,
        TimePeriod::Sunset,
        TimePeriod::Night,
    ];

    pub fn next(self) -> Self {
        match self {
            Self::Morning => Self::Day,
            Self::Day => Self::Sunset,
            Self::Sunset => Self::Night,
            Self::Night => Self::Morning,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Day => "day",
            Self::Sunset => "sunset",
            Self::Night => "night",
        }
    }

    /// Coarse hour buckets used when colors are not interpolated. Sunset
    /// starts at 17:00 here, an hour before the interpolated window does.
    pub fn from_hour_static(hour: u32) -> Self {
        match hour {
            5..=7 => Self::Morning,
            8..=16 => Self::Day,
            17..=18 => Self::Sunset,
            _ => Self::Night,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct PeriodState {
    pub current: TimePeriod,
    pub next: TimePeriod,
    /// Position within `current`, in [0, 1).
    pub progress: f64,
    /// `progress` after the period's easing curve.
    pub eased: f64,
}

impl PeriodState {
    pub fn at_minute(minute_of_day: u32) -> Self {
        let (current, next, progress) = classify_period(minute_of_day);
        Self {
            current,
            next,
            progress,
            eased: apply_easing(progress, current),
        }
    }
}

pub fn classify_period(minute_of_day: u32) -> (TimePeriod, TimePeriod, f64) {
    let minute = minute_of_day % MINUTES_PER_DAY;
    WINDOWS
        .iter()
        .find(|w| w.contains(minute))
        .map(|w| {
            let progress = f64::from(w.elapsed(minute)) / f64::from(w.len_minutes());
            (w.period, w.period.next(), progress)
        })
        .unwrap_or((TimePeriod::Day, TimePeriod::Sunset, 0.0))
}

/// End of the slow stretch of the day curve, and the eased value there.
const DAY_BREAK: f64 = 0.7;
const DAY_BREAK_EASED: f64 = DAY_BREAK * 0.2;

pub fn apply_easing(progress: f64, period: TimePeriod) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    match period {
        TimePeriod::Day if p < DAY_BREAK => p * 0.2,
        TimePeriod::Day => {
            DAY_BREAK_EASED + (p - DAY_BREAK) * (1.0 - DAY_BREAK_EASED) / (1.0 - DAY_BREAK)
        }
        TimePeriod::Morning => p.powf(0.8),
        TimePeriod::Sunset => p.powf(1.5),
        TimePeriod::Night => p,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_partition_the_day() {
        for m in 0..MINUTES_PER_DAY {
            let hits = WINDOWS.iter().filter(|w| w.contains(m)).count();
            assert_eq!(hits, 1, "minute {m}");
            let (_, _, p) = classify_period(m);
            assert!((0.0..1.0).contains(&p), "minute {m} progress {p}");
        }
        let total: u32 = WINDOWS.iter().map(Window::len_minutes).sum();
        assert_eq!(total, MINUTES_PER_DAY);
    }

    #[test]
    fn boundaries_and_next() {
        assert_eq!(classify_period(300), (TimePeriod::Morning, TimePeriod::Day, 0.0));
        assert_eq!(classify_period(480).0, TimePeriod::Day);
        assert_eq!(classify_period(1079).0, TimePeriod::Day);
        assert_eq!(classify_period(1080), (TimePeriod::Sunset, TimePeriod::Night, 0.0));
        assert_eq!(classify_period(1140), (TimePeriod::Night, TimePeriod::Morning, 0.0));
        assert_eq!(classify_period(299).0, TimePeriod::Night);
    }

    #[test]
    fn night_wraps_midnight() {
        let (late, _, p_late) = classify_period(1430);
        let (early, _, p_early) = classify_period(100);
        assert_eq!(late, TimePeriod::Night);
        assert_eq!(early, TimePeriod::Night);
        assert!(p_early > p_late);
        assert!((p_late - 290.0 / 600.0).abs() < 1e-12);
        assert!((p_early - 400.0 / 600.0).abs() < 1e-12);

        let mut last = -1.0;
        for m in (1140..1440).chain(0..300) {
            let (_, _, p) = classify_period(m);
            assert!(p > last);
            last = p;
        }
    }

    #[test]
    fn easing_starts_at_zero_and_never_decreases() {
        for period in TimePeriod::ALL {
            assert_eq!(apply_easing(0.0, period), 0.0);
            let mut last = 0.0;
            for i in 0..10_000 {
                let e = apply_easing(f64::from(i) / 10_000.0, period);
                assert!(e >= last, "{period:?} at {i}");
                assert!((0.0..1.0).contains(&e), "{period:?} at {i}: {e}");
                last = e;
            }
        }
    }

    #[test]
    fn easing_curves_have_their_shapes() {
        let morning = apply_easing(0.5, TimePeriod::Morning);
        assert!((morning - 0.5f64.powf(0.8)).abs() < 1e-12);
        assert!(morning > 0.5);

        let sunset = apply_easing(0.5, TimePeriod::Sunset);
        assert!((sunset - 0.5f64.powf(1.5)).abs() < 1e-12);
        assert!(sunset < 0.5);

        assert_eq!(apply_easing(0.5, TimePeriod::Night), 0.5);
        assert!((apply_easing(0.5, TimePeriod::Day) - 0.1).abs() < 1e-12);
        assert!((apply_easing(0.85, TimePeriod::Day) - (0.14 + 0.15 * 0.86 / 0.3)).abs() < 1e-12);
    }

    #[test]
    fn day_curve_is_continuous_at_break() {
        let below = apply_easing(DAY_BREAK - 1e-12, TimePeriod::Day);
        let at = apply_easing(DAY_BREAK, TimePeriod::Day);
        assert!((at - 0.14).abs() < 1e-12);
        assert!((below - at).abs() < 1e-9);
        assert!((apply_easing(1.0, TimePeriod::Day) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn static_buckets() {
        assert_eq!(TimePeriod::from_hour_static(17), TimePeriod::Sunset);
        assert_eq!(TimePeriod::from_hour_static(4), TimePeriod::Night);
        assert_eq!(TimePeriod::from_hour_static(19), TimePeriod::Night);
    }
}
