use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::rng::SplitMix64;

/// Screen placement and CSS filter values for the sun or moon.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct BodyTransform {
    pub visible: bool,
    /// Normalized horizontal position; the sun can pass slightly beyond 1.
    pub x: f64,
    pub y: f64,
    pub brightness: f64,
    pub saturation: f64,
    pub opacity: f64,
}

impl BodyTransform {
    pub fn hidden() -> Self {
        Self {
            visible: false,
            x: 0.0,
            y: 0.0,
            brightness: 1.0,
            saturation: 1.0,
            opacity: 1.0,
        }
    }

    pub fn left_percent(&self) -> f64 {
        self.x * 100.0
    }

    pub fn top_percent(&self) -> f64 {
        self.y * 100.0
    }

    pub fn filter_css(&self) -> String {
        format!(
            "brightness({}) saturate({})",
            round3(self.brightness),
            round3(self.saturation)
        )
    }

    pub fn display_css(&self) -> &'static str {
        if self.visible {
            "block"
        } else {
            "none"
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct CelestialTransform {
    pub sun: BodyTransform,
    pub moon: BodyTransform,
    pub stars_visible: bool,
}

/// `hour` is the fractional hour of day in [0, 24).
pub fn compute_celestial_transform(hour: f64) -> CelestialTransform {
    CelestialTransform {
        sun: sun_transform(hour),
        moon: moon_transform(hour),
        stars_visible: !(5.0..19.0).contains(&hour),
    }
}

fn sun_transform(t: f64) -> BodyTransform {
    if !(6.0..19.0).contains(&t) {
        return BodyTransform::hidden();
    }
    let x = (t - 6.0) / 12.0;
    let (brightness, saturation) = if t < 8.0 {
        (1.1, 1.2)
    } else if t < 17.0 {
        (1.0, 1.0)
    } else {
        let p = (t - 17.0) / 2.0;
        (1.05 - p * 0.3, 1.15 - p * 0.3)
    };
    BodyTransform {
        visible: true,
        x,
        y: 0.15 + (x * PI).sin() * 0.2,
        brightness,
        saturation,
        opacity: 1.0,
    }
}

fn moon_transform(t: f64) -> BodyTransform {
    if (6.0..18.0).contains(&t) {
        return BodyTransform::hidden();
    }
    // One arc from 18:00 to 06:00, split at midnight: both halves sweep 0 -> 1.
    let x = if t >= 18.0 { (t - 18.0) / 12.0 } else { t / 6.0 };
    let opacity = if (17.5..=18.5).contains(&t) {
        0.8 + (t - 17.5) * 0.2
    } else {
        1.0
    };
    let (brightness, saturation) = if (18.0..20.0).contains(&t) {
        let p = (t - 18.0) / 2.0;
        (1.0 - p * 0.3, 0.8 + p * 0.2)
    } else {
        (0.7, 1.0)
    };
    BodyTransform {
        visible: true,
        x,
        y: 0.85 + (x * PI).sin() * 0.1,
        brightness,
        saturation,
        opacity,
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Star {
    pub left_percent: f64,
    pub top_percent: f64,
    /// Twinkle animation delay, seconds.
    pub delay: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct StarField {
    pub stars: Vec<Star>,
}

impl StarField {
    pub fn generate(seed: u64, count: usize) -> Self {
        let mut rng = SplitMix64::new(seed);
        let stars = (0..count)
            .map(|_| Star {
                left_percent: rng.gen_range_f64(0.0, 100.0),
                top_percent: rng.gen_range_f64(0.0, 100.0),
                delay: rng.gen_range_f64(0.0, 3.0),
            })
            .collect();
        Self { stars }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn sun_at_noon() {
        let c = compute_celestial_transform(12.0);
        assert!(c.sun.visible);
        assert!(close(c.sun.x, 0.5));
        assert!(close(c.sun.y, 0.35));
        assert_eq!((c.sun.brightness, c.sun.saturation), (1.0, 1.0));
        assert!(!c.moon.visible);
        assert!(!c.stars_visible);
    }

    #[test]
    fn sun_hidden_at_night_and_overshoots_at_dusk() {
        assert!(!compute_celestial_transform(2.0).sun.visible);
        assert!(!compute_celestial_transform(19.0).sun.visible);
        let late = compute_celestial_transform(18.9).sun;
        assert!(late.visible && late.x > 1.0);
    }

    #[test]
    fn sun_filter_schedule() {
        let morning = compute_celestial_transform(7.0).sun;
        assert_eq!((morning.brightness, morning.saturation), (1.1, 1.2));
        let dusk = compute_celestial_transform(17.0).sun;
        assert!(close(dusk.brightness, 1.05) && close(dusk.saturation, 1.15));
        let late = compute_celestial_transform(18.0).sun;
        assert!(close(late.brightness, 0.9) && close(late.saturation, 1.0));
        assert_eq!(late.filter_css(), "brightness(0.9) saturate(1)");
    }

    #[test]
    fn moon_arc_is_continuous_across_midnight() {
        assert!(close(compute_celestial_transform(18.0).moon.x, 0.0));
        assert!(close(compute_celestial_transform(0.0).moon.x, 0.0));
        assert!(close(compute_celestial_transform(3.0).moon.x, 0.5));
        assert!(close(compute_celestial_transform(3.0).moon.y, 0.95));
        assert!(!compute_celestial_transform(6.0).moon.visible);
        assert!(!compute_celestial_transform(12.0).moon.visible);
    }

    #[test]
    fn moon_fades_and_cools() {
        let m = compute_celestial_transform(18.25).moon;
        assert!(close(m.opacity, 0.95));
        let m = compute_celestial_transform(19.0).moon;
        assert!(close(m.opacity, 1.0));
        assert!(close(m.brightness, 0.85) && close(m.saturation, 0.9));
        let m = compute_celestial_transform(22.0).moon;
        assert_eq!((m.brightness, m.saturation), (0.7, 1.0));
    }

    #[test]
    fn stars_follow_night_hours() {
        assert!(compute_celestial_transform(19.0).stars_visible);
        assert!(compute_celestial_transform(4.9).stars_visible);
        assert!(!compute_celestial_transform(5.0).stars_visible);
    }

    #[test]
    fn star_field_is_seeded() {
        let a = StarField::generate(5, 50);
        assert_eq!(a.stars.len(), 50);
        assert_eq!(a, StarField::generate(5, 50));
        assert!(a
            .stars
            .iter()
            .all(|s| (0.0..100.0).contains(&s.left_percent) && (0.0..3.0).contains(&s.delay)));
    }
}
