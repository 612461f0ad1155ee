use std::f64::consts::PI;
use std::num::NonZeroUsize;
use std::fmt::Write as _;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::rng::{jitter, IndexedStream};
use crate::time::StepTimer;

pub const LOGICAL_WIDTH: f64 = 1000.0;
pub const BASELINE: f64 = 600.0;
pub const BUCKET_MILLIS: i64 = 60_000;

/// Seeds are drawn from `[0, SEED_RANGE)`.
pub const SEED_RANGE: u64 = 1_000_000;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LayerName {
    Background,
    Far,
    Midground,
    Foreground,
}

impl LayerName {
    /// Back to front, the order layers are painted in.
    pub const ALL: [LayerName; 4] = [
        LayerName::Background,
        LayerName::Far,
        LayerName::Midground,
        LayerName::Foreground,
    ];

    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "foreground" => Self::Foreground,
            "midground" => Self::Midground,
            "far" => Self::Far,
            "background" => Self::Background,
            other => {
                debug!("unknown terrain layer {other:?}, using background");
                Self::Background
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Foreground => "foreground",
            Self::Midground => "midground",
            Self::Far => "far",
            Self::Background => "background",
        }
    }

    pub fn salt(self) -> u64 {
        match self {
            Self::Foreground => 100,
            Self::Midground => 200,
            Self::Far => 300,
            Self::Background => 400,
        }
    }

    pub fn default_segments(self) -> usize {
        match self {
            Self::Foreground => 8,
            Self::Midground => 6,
            Self::Far => 4,
            Self::Background => 3,
        }
    }

    pub fn z_index(self) -> u8 {
        match self {
            Self::Background => 1,
            Self::Far => 2,
            Self::Midground => 3,
            Self::Foreground => 4,
        }
    }

    pub fn parallax_depth(self) -> f64 {
        match self {
            Self::Foreground => 0.15,
            Self::Midground => 0.08,
            Self::Far => 0.04,
            Self::Background => 0.02,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Ripple {
    pub frequency: f64,
    pub amplitude: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LayerParameters {
    pub layer: LayerName,
    pub seed: u64,
    pub base_height: f64,
    pub central_dip: f64,
    pub side_peaks: f64,
    pub ripples: Vec<Ripple>,
    pub random_amp: f64,
}

/// Field ranges for one layer. Ripple entries are `(freq range, amp range)`.
struct LayerRanges {
    first_index: u64,
    height_above_baseline: (f64, f64),
    central_dip: (f64, f64),
    side_peaks: (f64, f64),
    ripples: &'static [((f64, f64), (f64, f64))],
    random_amp: (f64, f64),
}

const FOREGROUND: LayerRanges = LayerRanges {
    first_index: 1,
    height_above_baseline: (70.0, 90.0),
    central_dip: (60.0, 100.0),
    side_peaks: (40.0, 80.0),
    ripples: &[
        ((2.5, 4.0), (40.0, 60.0)),
        ((1.5, 2.5), (20.0, 35.0)),
        ((0.8, 1.2), (10.0, 20.0)),
    ],
    random_amp: (10.0, 20.0),
};

const MIDGROUND: LayerRanges = LayerRanges {
    first_index: 11,
    height_above_baseline: (130.0, 150.0),
    central_dip: (45.0, 75.0),
    side_peaks: (35.0, 55.0),
    ripples: &[((2.0, 3.0), (30.0, 50.0)), ((1.2, 1.8), (15.0, 25.0))],
    random_amp: (8.0, 12.0),
};

const FAR: LayerRanges = LayerRanges {
    first_index: 19,
    height_above_baseline: (170.0, 190.0),
    central_dip: (30.0, 50.0),
    side_peaks: (25.0, 35.0),
    ripples: &[((1.8, 2.2), (20.0, 30.0)), ((1.0, 1.2), (10.0, 15.0))],
    random_amp: (6.0, 10.0),
};

const BACKGROUND: LayerRanges = LayerRanges {
    first_index: 27,
    height_above_baseline: (210.0, 230.0),
    central_dip: (20.0, 30.0),
    side_peaks: (15.0, 25.0),
    ripples: &[((1.4, 1.6), (12.0, 18.0))],
    random_amp: (3.0, 7.0),
};

fn ranges(layer: LayerName) -> &'static LayerRanges {
    match layer {
        LayerName::Foreground => &FOREGROUND,
        LayerName::Midground => &MIDGROUND,
        LayerName::Far => &FAR,
        LayerName::Background => &BACKGROUND,
    }
}

/// Derives the shape parameters of one layer. Pure in `(seed, bucket, layer)`.
///
/// Field indices are laid out as base height, dip, side peaks, all ripple
/// frequencies, all ripple amplitudes, then jitter amplitude, starting at the
/// layer's first index so no two fields of any layer share a stream.
pub fn generate_layer_parameters(seed: u64, time_bucket: u64, layer: LayerName) -> LayerParameters {
    let stream = IndexedStream::new(seed.wrapping_add(time_bucket));
    let r = ranges(layer);
    let at = |offset: u64, (min, max): (f64, f64)| stream.range(r.first_index + offset, min, max);

    let n = r.ripples.len() as u64;
    let ripples = r
        .ripples
        .iter()
        .zip(0u64..)
        .map(|(&(freq, amp), i)| Ripple {
            frequency: at(3 + i, freq),
            amplitude: at(3 + n + i, amp),
        })
        .collect();

    LayerParameters {
        layer,
        seed,
        base_height: BASELINE - at(0, r.height_above_baseline),
        central_dip: at(1, r.central_dip),
        side_peaks: at(2, r.side_peaks),
        ripples,
        random_amp: at(3 + 2 * n, r.random_amp),
    }
}

/// Same as [`generate_layer_parameters`] for a layer given by name; unknown
/// names use the background layer.
pub fn generate_named_layer_parameters(seed: u64, time_bucket: u64, name: &str) -> LayerParameters {
    generate_layer_parameters(seed, time_bucket, LayerName::from_name(name))
}

pub fn time_bucket(unix_millis: i64) -> u64 {
    unix_millis.div_euclid(BUCKET_MILLIS).max(0) as u64
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct CubicSegment {
    pub start: Point,
    pub control1: Point,
    pub control2: Point,
    pub end: Point,
}

impl CubicSegment {
    fn between(start: Point, end: Point) -> Self {
        let dx = end.x - start.x;
        Self {
            start,
            control1: Point::new(start.x + dx * 0.3, start.y),
            control2: Point::new(start.x + dx * 0.7, end.y),
            end,
        }
    }

    pub fn eval(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        Point::new(
            a * self.start.x + b * self.control1.x + c * self.control2.x + d * self.end.x,
            a * self.start.y + b * self.control1.y + c * self.control2.y + d * self.end.y,
        )
    }
}

/// A closed silhouette: baseline at both extremes, cubic curves between samples.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TerrainPath {
    pub layer: LayerName,
    pub points: Vec<Point>,
    pub curves: Vec<CubicSegment>,
}

impl TerrainPath {
    pub fn to_svg_path(&self) -> String {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return String::new();
        };
        let mut d = format!("M 0,{BASELINE} L 0,{}", first.y);
        for c in &self.curves {
            let _ = write!(
                d,
                " C {},{} {},{} {},{}",
                c.control1.x, c.control1.y, c.control2.x, c.control2.y, c.end.x, c.end.y
            );
        }
        let _ = write!(d, " L {LOGICAL_WIDTH},{} L {LOGICAL_WIDTH},{BASELINE} Z", last.y);
        d
    }

    /// The ridge line sampled along the curves, `steps` points per segment.
    pub fn flatten(&self, steps: usize) -> Vec<Point> {
        let steps = steps.max(1);
        let mut out = Vec::with_capacity(self.curves.len() * steps + 1);
        if let Some(first) = self.points.first() {
            out.push(*first);
        }
        for c in &self.curves {
            out.extend((1..=steps).map(|i| c.eval(i as f64 / steps as f64)));
        }
        out
    }

    /// Ridge height at logical `x`, clamped to the path's extent.
    pub fn height_at(&self, x: f64) -> f64 {
        let x = x.clamp(0.0, LOGICAL_WIDTH);
        let Some(c) = self
            .curves
            .iter()
            .find(|c| x <= c.end.x)
            .or(self.curves.last())
        else {
            return self.points.first().map_or(BASELINE, |p| p.y);
        };
        // x(t) is monotonic on each segment, so bisect for t.
        let (mut lo, mut hi) = (0.0, 1.0);
        for _ in 0..40 {
            let mid = 0.5 * (lo + hi);
            if c.eval(mid).x < x {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        c.eval(0.5 * (lo + hi)).y
    }
}

pub fn generate_path(
    layer: LayerName,
    segments: usize,
    params: &LayerParameters,
) -> Result<TerrainPath, SceneError> {
    let segments = NonZeroUsize::new(segments).ok_or(SceneError::ZeroSegments)?;
    Ok(sample_path(layer, segments, params))
}

fn sample_path(layer: LayerName, segments: NonZeroUsize, params: &LayerParameters) -> TerrainPath {
    let segments = segments.get();
    let points: Vec<Point> = (0..=segments)
        .map(|i| {
            let u = i as f64 / segments as f64;
            let dip_factor = (u * PI).sin();
            let side_factor = dip_factor.max(0.0).powf(0.3);

            let central_dip = dip_factor * params.central_dip;
            let side_peaks = (1.0 - side_factor) * params.side_peaks;
            let ripples: f64 = params
                .ripples
                .iter()
                .map(|r| (u * PI * r.frequency).sin() * r.amplitude)
                .sum();
            let noise = (jitter(params.seed, i as u64, layer.salt()) - 0.5) * params.random_amp;

            Point::new(
                u * LOGICAL_WIDTH,
                params.base_height + central_dip - side_peaks + ripples + noise,
            )
        })
        .collect();

    let curves = points
        .windows(2)
        .map(|w| CubicSegment::between(w[0], w[1]))
        .collect();

    TerrainPath {
        layer,
        points,
        curves,
    }
}

/// All four layers from one `(seed, bucket)` pair.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TerrainSet {
    pub seed: u64,
    pub time_bucket: u64,
    pub layers: Vec<TerrainPath>,
}

impl TerrainSet {
    pub fn layer(&self, name: LayerName) -> Option<&TerrainPath> {
        self.layers.iter().find(|p| p.layer == name)
    }
}

#[derive(Clone, Debug)]
pub struct TerrainGenerator {
    seed: u64,
    segments: [NonZeroUsize; 4],
}

impl TerrainGenerator {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            segments: LayerName::ALL.map(|l| segment_count(l.default_segments())),
        }
    }

    pub fn random() -> Self {
        Self::with_seed(fresh_seed())
    }

    /// Overrides the per-layer segment counts, back to front. Zero counts
    /// are raised to one.
    pub fn with_segments(mut self, segments: [usize; 4]) -> Self {
        self.segments = segments.map(segment_count);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
    }

    pub fn regenerate(&mut self) -> u64 {
        self.seed = fresh_seed();
        self.seed
    }

    pub fn generate(&self, time_bucket: u64) -> TerrainSet {
        let timer = StepTimer::start();
        let layers = LayerName::ALL
            .iter()
            .zip(self.segments)
            .map(|(&layer, segments)| {
                let params = generate_layer_parameters(self.seed, time_bucket, layer);
                sample_path(layer, segments, &params)
            })
            .collect();
        info!(
            "generated terrain seed={} bucket={} in {:.2} ms",
            self.seed,
            time_bucket,
            timer.elapsed_ms()
        );
        TerrainSet {
            seed: self.seed,
            time_bucket,
            layers,
        }
    }
}

fn segment_count(segments: usize) -> NonZeroUsize {
    NonZeroUsize::new(segments).unwrap_or(NonZeroUsize::MIN)
}

fn fresh_seed() -> u64 {
    rand::random::<u64>() % SEED_RANGE
}
