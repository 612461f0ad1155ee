use serde::{Deserialize, Serialize};

use crate::rng::SplitMix64;

/// Pixels a particle may drift past an edge before it wraps.
const EDGE_MARGIN: f64 = 10.0;

pub const SUN_DEPTH: f64 = 0.12;
pub const MOON_DEPTH: f64 = 0.12;
pub const CLOUD_DEPTH: f64 = 0.05;
pub const FOG_DEPTH: f64 = 0.03;
pub const ATMOSPHERE_DEPTH: f64 = 0.02;
pub const PARTICLE_DEPTH: f64 = 0.1;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScreenClass {
    PhonePortrait,
    TabletPortrait,
    Standard,
    WideDesktop,
    Ultrawide,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }

    pub fn screen_class(&self) -> ScreenClass {
        let ratio = self.aspect_ratio();
        if ratio < 0.6 {
            ScreenClass::PhonePortrait
        } else if ratio < 1.0 {
            ScreenClass::TabletPortrait
        } else if ratio > 2.0 {
            ScreenClass::Ultrawide
        } else if ratio > 1.5 {
            ScreenClass::WideDesktop
        } else {
            ScreenClass::Standard
        }
    }

    pub fn cloud_count(&self) -> usize {
        match self.screen_class() {
            ScreenClass::PhonePortrait => 3,
            ScreenClass::TabletPortrait => 4,
            ScreenClass::Standard => 6,
            ScreenClass::WideDesktop => 8,
            ScreenClass::Ultrawide => 10,
        }
    }

    /// SVG `preserveAspectRatio` for the terrain: crop on portrait screens,
    /// letterbox otherwise.
    pub fn terrain_aspect_mode(&self) -> &'static str {
        if self.is_portrait() {
            "xMidYMid slice"
        } else {
            "xMidYMid meet"
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Pointer position normalized to [0, 1] on both axes, to a pixel offset.
pub fn parallax_offset(pointer: (f64, f64), depth: f64) -> (f64, f64) {
    (
        (pointer.0 - 0.5) * depth * 100.0,
        (pointer.1 - 0.5) * depth * 50.0,
    )
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub size: f64,
    pub opacity: f64,
    pub wind: f64,
    pub sway: f64,
    /// Drawn with a bright core this frame.
    pub sparkle: bool,
}

#[derive(Clone, Debug)]
pub struct ParticleField {
    particles: Vec<Particle>,
    viewport: Viewport,
    rng: SplitMix64,
}

impl ParticleField {
    pub fn new(seed: u64, count: usize, viewport: Viewport) -> Self {
        let mut rng = SplitMix64::new(seed);
        let particles = (0..count)
            .map(|_| Particle {
                x: rng.gen_range_f64(0.0, viewport.width),
                y: rng.gen_range_f64(0.0, viewport.height),
                vx: rng.gen_range_f64(-0.25, 0.25),
                vy: rng.gen_range_f64(0.1, 0.4),
                size: rng.gen_range_f64(0.3, 1.5),
                opacity: rng.gen_range_f64(0.1, 0.4),
                wind: rng.gen_range_f64(-0.1, 0.1),
                sway: rng.gen_range_f64(-0.05, 0.05),
                sparkle: false,
            })
            .collect();
        Self {
            particles,
            viewport,
            rng,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// One animation step. `time_secs` phases the sideways sway.
    pub fn advance(&mut self, time_secs: f64) {
        let Viewport { width, height } = self.viewport;
        for p in &mut self.particles {
            p.x += p.vx + p.wind;
            p.y += p.vy;
            p.x += (time_secs + p.x * 0.01).sin() * p.sway;

            if p.x < -EDGE_MARGIN {
                p.x = width + EDGE_MARGIN;
            }
            if p.x > width + EDGE_MARGIN {
                p.x = -EDGE_MARGIN;
            }
            if p.y > height + EDGE_MARGIN {
                p.y = -EDGE_MARGIN;
                p.x = self.rng.gen_range_f64(0.0, width);
            }
            p.sparkle = self.rng.next_f64() > 0.95;
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Cloud {
    pub left_percent: f64,
    pub top_percent: f64,
    /// Seconds for one pass across the sky.
    pub duration: f64,
    pub delay: f64,
}

impl Cloud {
    /// Fraction of the current drift pass completed at `time_secs`; zero
    /// until the delay has elapsed.
    pub fn phase_at(&self, time_secs: f64) -> f64 {
        let t = time_secs - self.delay;
        if t <= 0.0 {
            0.0
        } else {
            (t / self.duration).rem_euclid(1.0)
        }
    }

    /// Left edge in percent, drifting rightwards and wrapping to -20%.
    pub fn left_at(&self, time_secs: f64) -> f64 {
        (self.left_percent + 20.0 + self.phase_at(time_secs) * 120.0).rem_euclid(120.0) - 20.0
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CloudField {
    pub clouds: Vec<Cloud>,
}

impl CloudField {
    pub fn generate(seed: u64, viewport: &Viewport) -> Self {
        let mut rng = SplitMix64::new(seed);
        let clouds = (0..viewport.cloud_count())
            .map(|_| Cloud {
                left_percent: rng.gen_range_f64(0.0, 100.0),
                top_percent: rng.gen_range_f64(0.0, 50.0),
                duration: rng.gen_range_f64(60.0, 100.0),
                delay: rng.gen_range_f64(0.0, 20.0),
            })
            .collect();
        Self { clouds }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloud_count_follows_aspect_ratio() {
        assert_eq!(Viewport::new(390.0, 844.0).cloud_count(), 3);
        assert_eq!(Viewport::new(768.0, 1024.0).cloud_count(), 4);
        assert_eq!(Viewport::new(1280.0, 1024.0).cloud_count(), 6);
        assert_eq!(Viewport::new(1920.0, 1080.0).cloud_count(), 8);
        assert_eq!(Viewport::new(3440.0, 1440.0).cloud_count(), 10);
        assert_eq!(Viewport::new(390.0, 844.0).terrain_aspect_mode(), "xMidYMid slice");
    }

    #[test]
    fn parallax_is_centered() {
        assert_eq!(parallax_offset((0.5, 0.5), 0.15), (0.0, 0.0));
        let (dx, dy) = parallax_offset((1.0, 0.0), 0.1);
        assert!((dx - 5.0).abs() < 1e-12);
        assert!((dy + 2.5).abs() < 1e-12);
    }

    #[test]
    fn particles_stay_within_wrap_margins() {
        let vp = Viewport::new(200.0, 100.0);
        let mut field = ParticleField::new(3, 80, vp);
        assert_eq!(field.particles().len(), 80);
        for frame in 0..5_000 {
            field.advance(f64::from(frame) / 60.0);
            for p in field.particles() {
                assert!(p.x >= -EDGE_MARGIN - 1.0 && p.x <= vp.width + EDGE_MARGIN + 1.0);
                assert!(p.y >= -EDGE_MARGIN - 1.0 && p.y <= vp.height + EDGE_MARGIN + 1.0);
            }
        }
    }

    #[test]
    fn falling_particle_respawns_at_top() {
        let vp = Viewport::new(100.0, 100.0);
        let mut field = ParticleField::new(1, 1, vp);
        field.particles[0].y = vp.height + EDGE_MARGIN;
        field.particles[0].vy = 0.5;
        field.advance(0.0);
        assert_eq!(field.particles()[0].y, -EDGE_MARGIN);
    }

    #[test]
    fn clouds_wait_then_drift() {
        let c = Cloud {
            left_percent: 10.0,
            top_percent: 5.0,
            duration: 60.0,
            delay: 10.0,
        };
        assert_eq!(c.phase_at(5.0), 0.0);
        assert!((c.phase_at(40.0) - 0.5).abs() < 1e-12);
        let left = c.left_at(40.0);
        assert!((-20.0..100.0).contains(&left));
        assert_eq!(CloudField::generate(4, &Viewport::new(1920.0, 1080.0)).clouds.len(), 8);
    }
}
