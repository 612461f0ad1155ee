use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::palette::PaletteSource;
use crate::terrain::LayerName;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleParams {
    pub color_update_ms: u64,
    /// Color cadence while a simulated clock is driving the scene.
    pub simulated_update_ms: u64,
    pub terrain_regen_ms: u64,
    pub resize_debounce_ms: u64,
    pub hidden_frame_hz: f64,
}

impl Default for ScheduleParams {
    fn default() -> Self {
        Self {
            color_update_ms: 10_000,
            simulated_update_ms: 1_000,
            terrain_regen_ms: 300_000,
            resize_debounce_ms: 300,
            hidden_frame_hz: 15.0,
        }
    }
}

impl ScheduleParams {
    pub fn color_interval(&self, simulated: bool) -> Duration {
        Duration::from_millis(if simulated {
            self.simulated_update_ms
        } else {
            self.color_update_ms
        })
    }

    pub fn terrain_interval(&self) -> Duration {
        Duration::from_millis(self.terrain_regen_ms)
    }

    pub fn resize_quiet(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    pub fn hidden_frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.hidden_frame_hz.max(1.0))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainParams {
    /// Fixed seed; a random one is drawn when absent.
    pub seed: Option<u64>,
    /// Segment counts, back to front.
    pub segments: [usize; 4],
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seed: None,
            segments: LayerName::ALL.map(LayerName::default_segments),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneParams {
    pub palette_source: PaletteSource,
    pub particle_count: usize,
    pub star_count: usize,
    pub schedule: ScheduleParams,
    pub terrain: TerrainParams,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            palette_source: PaletteSource::Interpolated,
            particle_count: 80,
            star_count: 50,
            schedule: ScheduleParams::default(),
            terrain: TerrainParams::default(),
        }
    }
}

impl SceneParams {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading scene params {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing scene params {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_constants() {
        let p = SceneParams::default();
        assert_eq!(p.particle_count, 80);
        assert_eq!(p.star_count, 50);
        assert_eq!(p.schedule.color_interval(false), Duration::from_secs(10));
        assert_eq!(p.schedule.color_interval(true), Duration::from_secs(1));
        assert_eq!(p.schedule.terrain_interval(), Duration::from_secs(300));
        assert_eq!(p.terrain.segments, [3, 4, 6, 8]);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let p: SceneParams =
            serde_json::from_str(r#"{"palette_source":"static","terrain":{"seed":7}}"#)
                .expect("parse");
        assert_eq!(p.palette_source, PaletteSource::Static);
        assert_eq!(p.terrain.seed, Some(7));
        assert_eq!(p.terrain.segments, [3, 4, 6, 8]);
        assert_eq!(p.particle_count, 80);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = SceneParams::load("definitely/not/here.json").expect_err("missing");
        assert!(err.to_string().contains("reading scene params"));
    }
}
