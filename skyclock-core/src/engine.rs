use std::collections::BTreeMap;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::celestial::{compute_celestial_transform, BodyTransform, CelestialTransform};
use crate::palette::{BlendedPalette, PaletteSource};
use crate::period::{PeriodState, TimePeriod};
use crate::time::{fractional_hour, minutes_of_day, TimeSource};

/// Everything the presentation surface needs for one color tick.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SceneFrame {
    pub at: NaiveDateTime,
    pub period: PeriodState,
    pub palette: BlendedPalette,
    pub celestial: CelestialTransform,
}

impl SceneFrame {
    /// Palette colors plus the sun, moon and star styles, keyed by CSS
    /// custom-property name.
    pub fn style_variables(&self) -> BTreeMap<String, String> {
        let mut vars: BTreeMap<String, String> = self
            .palette
            .css_variables()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        body_variables(&mut vars, "sun", &self.celestial.sun);
        body_variables(&mut vars, "moon", &self.celestial.moon);
        let stars = if self.celestial.stars_visible {
            "block"
        } else {
            "none"
        };
        vars.insert("--stars-display".to_string(), stars.to_string());
        vars.insert("--sky-gradient".to_string(), self.palette.sky_gradient_css());
        vars
    }
}

fn body_variables(vars: &mut BTreeMap<String, String>, name: &str, body: &BodyTransform) {
    vars.insert(format!("--{name}-display"), body.display_css().to_string());
    if !body.visible {
        return;
    }
    vars.insert(format!("--{name}-left"), format!("{:.1}%", body.left_percent()));
    vars.insert(format!("--{name}-top"), format!("{:.1}%", body.top_percent()));
    vars.insert(format!("--{name}-filter"), body.filter_css());
    vars.insert(format!("--{name}-opacity"), format!("{:.3}", body.opacity));
}

/// Maps wall-clock time to a palette and celestial placement.
///
/// The clock is injected, so a simulated source drives the same
/// classification and blending as the real one. The palette source is fixed
/// at construction.
#[derive(Clone, Debug)]
pub struct TimeColorEngine<S> {
    clock: S,
    source: PaletteSource,
}

impl<S: TimeSource> TimeColorEngine<S> {
    pub fn new(clock: S, source: PaletteSource) -> Self {
        Self { clock, source }
    }

    pub fn clock(&self) -> &S {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut S {
        &mut self.clock
    }

    pub fn palette_source(&self) -> PaletteSource {
        self.source
    }

    pub fn frame(&self) -> SceneFrame {
        self.frame_at(self.clock.now())
    }

    pub fn frame_at(&self, at: NaiveDateTime) -> SceneFrame {
        let period = PeriodState::at_minute(minutes_of_day(&at));
        let palette = match self.source {
            PaletteSource::Interpolated => {
                BlendedPalette::blended(period.current, period.next, period.eased)
            }
            PaletteSource::Static => BlendedPalette::raw(TimePeriod::from_hour_static(at.hour())),
        };
        SceneFrame {
            at,
            period,
            palette,
            celestial: compute_celestial_transform(fractional_hour(&at)),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::palette::{Palette, PaletteField};
    use crate::time::SimulatedClock;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .expect("valid datetime")
    }

    #[test]
    fn simulated_clock_drives_frame() {
        let mut engine = TimeColorEngine::new(
            SimulatedClock::new(at(12, 0)),
            PaletteSource::Interpolated,
        );
        let noon = engine.frame();
        assert_eq!(noon.period.current, TimePeriod::Day);
        assert!(noon.celestial.sun.visible);

        engine.clock_mut().set(at(23, 50));
        let late = engine.frame();
        assert_eq!(late.period.current, TimePeriod::Night);
        assert!(late.celestial.moon.visible);
        assert_eq!(late, engine.frame_at(at(23, 50)));
    }

    #[test]
    fn period_start_shows_current_palette() {
        let engine = TimeColorEngine::new(SimulatedClock::new(at(5, 0)), PaletteSource::Interpolated);
        let frame = engine.frame();
        assert_eq!(frame.period.eased, 0.0);
        assert_eq!(frame.palette.get(PaletteField::SkyStart), "#4a3a2a");
        assert_eq!(
            frame.palette.get(PaletteField::Fog),
            "rgba(160, 82, 45, 0.400)"
        );
    }

    #[test]
    fn static_source_skips_blending() {
        let engine = TimeColorEngine::new(SimulatedClock::new(at(17, 30)), PaletteSource::Static);
        let frame = engine.frame();
        assert_eq!(frame.period.current, TimePeriod::Day);
        assert_eq!(
            frame.palette.get(PaletteField::SkyStart),
            Palette::for_period(TimePeriod::Sunset).sky_start
        );
    }

    #[test]
    fn style_variables_describe_visible_bodies() {
        let engine = TimeColorEngine::new(SimulatedClock::new(at(12, 0)), PaletteSource::Interpolated);
        let vars = engine.frame().style_variables();
        assert_eq!(vars["--sun-display"], "block");
        assert_eq!(vars["--sun-left"], "50.0%");
        assert_eq!(vars["--sun-top"], "35.0%");
        assert_eq!(vars["--sun-filter"], "brightness(1) saturate(1)");
        assert_eq!(vars["--moon-display"], "none");
        assert!(!vars.contains_key("--moon-left"));
        assert_eq!(vars["--stars-display"], "none");
        assert!(vars.contains_key("--current-sky-start"));
    }

    #[test]
    fn midday_barely_moves() {
        let engine = TimeColorEngine::new(SimulatedClock::new(at(8, 0)), PaletteSource::Interpolated);
        let morning = engine.frame_at(at(8, 0));
        let afternoon = engine.frame_at(at(14, 0));
        assert!(afternoon.period.eased < 0.15);
        let a = morning.palette.color(PaletteField::SkyStart).rgb();
        let b = afternoon.palette.color(PaletteField::SkyStart).rgb();
        assert!(a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= 10));
    }
}
