use std::time::{Duration, Instant};

use log::debug;

use crate::params::ScheduleParams;
use crate::particles::Viewport;
use crate::state::Scene;
use crate::time::TimeSource;

/// Fires once per `period`, the first time one period after `start`.
#[derive(Clone, Copy, Debug)]
pub struct Interval {
    period: Duration,
    next_due: Instant,
}

impl Interval {
    pub fn new(period: Duration, start: Instant) -> Self {
        Self {
            period,
            next_due: start + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Changes the cadence, counting the new period from `now`.
    pub fn set_period(&mut self, period: Duration, now: Instant) {
        self.period = period;
        self.next_due = now + period;
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        // Missed periods collapse into one firing.
        self.next_due = now + self.period;
        true
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }
}

/// Coalesces bursts of triggers into one firing after `quiet` has passed
/// without another trigger.
#[derive(Clone, Copy, Debug)]
pub struct Debouncer {
    quiet: Duration,
    last_trigger: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            last_trigger: None,
        }
    }

    pub fn trigger(&mut self, now: Instant) {
        self.last_trigger = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_trigger.is_some()
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        match self.last_trigger {
            Some(t) if now.saturating_duration_since(t) >= self.quiet => {
                self.last_trigger = None;
                true
            }
            _ => false,
        }
    }
}

/// Every frame while visible; a fixed slow cadence while hidden.
#[derive(Clone, Copy, Debug)]
pub struct FrameThrottle {
    hidden_interval: Duration,
    visible: bool,
    last_frame: Option<Instant>,
}

impl FrameThrottle {
    pub fn new(hidden_interval: Duration) -> Self {
        Self {
            hidden_interval,
            visible: true,
            last_frame: None,
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        let due = self.visible
            || self
                .last_frame
                .map_or(true, |t| now.saturating_duration_since(t) >= self.hidden_interval);
        if due {
            self.last_frame = Some(now);
        }
        due
    }

    /// How long the host may sleep before the next frame; `None` means
    /// redraw continuously.
    pub fn next_frame_in(&self, now: Instant) -> Option<Duration> {
        if self.visible {
            return None;
        }
        Some(match self.last_frame {
            Some(t) => self
                .hidden_interval
                .saturating_sub(now.saturating_duration_since(t)),
            None => Duration::ZERO,
        })
    }
}

/// The three independent scheduling sources plus the resize debouncer.
#[derive(Clone, Debug)]
pub struct Schedule {
    started: Instant,
    params: ScheduleParams,
    pub colors: Interval,
    pub terrain: Interval,
    pub frames: FrameThrottle,
    resize: Debouncer,
    pending_viewport: Option<Viewport>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DueTasks {
    pub colors: bool,
    pub terrain: bool,
    pub resize: bool,
    pub frame: bool,
}

impl Schedule {
    pub fn new(params: &ScheduleParams, simulated: bool, now: Instant) -> Self {
        Self {
            started: now,
            params: params.clone(),
            colors: Interval::new(params.color_interval(simulated), now),
            terrain: Interval::new(params.terrain_interval(), now),
            frames: FrameThrottle::new(params.hidden_frame_interval()),
            resize: Debouncer::new(params.resize_quiet()),
            pending_viewport: None,
        }
    }

    /// Switches the color cadence between the real and simulated rates.
    pub fn set_simulated(&mut self, simulated: bool, now: Instant) {
        self.colors
            .set_period(self.params.color_interval(simulated), now);
    }

    pub fn request_resize(&mut self, viewport: Viewport, now: Instant) {
        self.pending_viewport = Some(viewport);
        self.resize.trigger(now);
    }

    pub fn elapsed_secs(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.started).as_secs_f64()
    }

    /// Earliest time any timer-driven task becomes due.
    pub fn next_wake(&self, now: Instant) -> Duration {
        let mut wake = self.colors.remaining(now).min(self.terrain.remaining(now));
        if self.resize.is_pending() {
            wake = wake.min(self.params.resize_quiet());
        }
        if let Some(frame) = self.frames.next_frame_in(now) {
            wake = wake.min(frame);
        }
        wake
    }
}

/// Runs whatever is due at `now` against the scene. Each task writes only
/// its own part of the scene.
pub fn run_due<S: TimeSource>(scene: &mut Scene<S>, schedule: &mut Schedule, now: Instant) -> DueTasks {
    let mut due = DueTasks::default();

    if schedule.colors.poll(now) {
        scene.refresh_colors();
        due.colors = true;
    }
    if schedule.terrain.poll(now) {
        scene.regenerate_terrain();
        due.terrain = true;
    }
    if schedule.resize.poll(now) {
        if let Some(viewport) = schedule.pending_viewport.take() {
            debug!("resize settled at {}x{}", viewport.width, viewport.height);
            scene.apply_resize(viewport);
            due.resize = true;
        }
    }
    if schedule.frames.poll(now) {
        scene.tick_clock();
        scene.advance_particles(schedule.elapsed_secs(now));
        due.frame = true;
    }
    due
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn interval_fires_once_per_period() {
        let t0 = Instant::now();
        let mut iv = Interval::new(ms(100), t0);
        assert!(!iv.poll(t0));
        assert!(!iv.poll(t0 + ms(99)));
        assert!(iv.poll(t0 + ms(100)));
        assert!(!iv.poll(t0 + ms(150)));
        assert!(iv.poll(t0 + ms(450)));
        assert!(!iv.poll(t0 + ms(500)));
    }

    #[test]
    fn debouncer_coalesces_bursts() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(ms(300));
        for i in 0..10 {
            d.trigger(t0 + ms(i * 50));
            assert!(!d.poll(t0 + ms(i * 50 + 10)));
        }
        assert!(!d.poll(t0 + ms(450 + 299)));
        assert!(d.poll(t0 + ms(450 + 300)));
        assert!(!d.poll(t0 + ms(2000)));
    }

    #[test]
    fn hidden_frames_are_throttled_not_stopped() {
        let t0 = Instant::now();
        let mut f = FrameThrottle::new(ms(66));
        assert!(f.poll(t0));
        assert!(f.poll(t0 + ms(1)));
        assert_eq!(f.next_frame_in(t0), None);

        f.set_visible(false);
        let frames = (2..1000u64).filter(|i| f.poll(t0 + ms(*i))).count();
        assert!((14..=16).contains(&frames), "{frames} frames in ~1s");
        assert!(f.next_frame_in(t0 + ms(1000)).is_some());
    }

    #[test]
    fn schedule_wakes_for_the_nearest_task() {
        let t0 = Instant::now();
        let mut s = Schedule::new(&ScheduleParams::default(), false, t0);
        assert_eq!(s.next_wake(t0), ms(10_000));
        s.set_simulated(true, t0);
        assert_eq!(s.colors.period(), ms(1_000));
        s.request_resize(Viewport::new(10.0, 10.0), t0);
        assert_eq!(s.next_wake(t0), ms(300));
    }
}
