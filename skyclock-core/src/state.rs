use std::collections::BTreeMap;

use blake3::Hasher;
use chrono::NaiveDateTime;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::celestial::StarField;
use crate::engine::{SceneFrame, TimeColorEngine};
use crate::params::SceneParams;
use crate::particles::{CloudField, ParticleField, Viewport};
use crate::rng::hash_u64;
use crate::terrain::{time_bucket, TerrainGenerator, TerrainPath, TerrainSet};
use crate::time::{unix_millis, TimeSource};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostics {
    pub layer_hashes: BTreeMap<String, String>,
    pub checksum: String,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            layer_hashes: BTreeMap::new(),
            checksum: String::from("unset"),
        }
    }
}

/// The whole decorative scene: one owner per output.
///
/// Colors, terrain and particles are refreshed by separate calls and never
/// touch each other's state.
pub struct Scene<S> {
    pub params: SceneParams,
    engine: TimeColorEngine<S>,
    generator: TerrainGenerator,
    pub terrain: TerrainSet,
    pub frame: SceneFrame,
    /// Clock reading for the clock face; follows every frame, unlike
    /// `frame.at` which only moves on color ticks.
    pub now: NaiveDateTime,
    pub particles: ParticleField,
    pub stars: StarField,
    pub clouds: CloudField,
    pub viewport: Viewport,
    pub diagnostics: Diagnostics,
}

impl<S: TimeSource> Scene<S> {
    pub fn new(params: SceneParams, clock: S, viewport: Viewport) -> Self {
        let engine = TimeColorEngine::new(clock, params.palette_source);
        let generator = match params.terrain.seed {
            Some(seed) => TerrainGenerator::with_seed(seed),
            None => TerrainGenerator::random(),
        }
        .with_segments(params.terrain.segments);

        let frame = engine.frame();
        let terrain = generator.generate(time_bucket(unix_millis(&frame.at)));
        let seed = generator.seed();

        let mut scene = Self {
            particles: ParticleField::new(hash_u64(seed ^ 0x5041_5254), params.particle_count, viewport),
            stars: StarField::default(),
            clouds: CloudField::generate(hash_u64(seed ^ 0x434C_4F55), &viewport),
            params,
            engine,
            generator,
            terrain,
            now: frame.at,
            frame,
            viewport,
            diagnostics: Diagnostics::default(),
        };
        if scene.frame.celestial.stars_visible {
            scene.scatter_stars();
        }
        scene.update_diagnostics();
        scene
    }

    pub fn engine(&self) -> &TimeColorEngine<S> {
        &self.engine
    }

    pub fn clock_mut(&mut self) -> &mut S {
        self.engine.clock_mut()
    }

    pub fn seed(&self) -> u64 {
        self.generator.seed()
    }

    pub fn refresh_colors(&mut self) {
        let was_showing_stars = self.frame.celestial.stars_visible;
        self.frame = self.engine.frame();
        self.now = self.frame.at;
        let showing_stars = self.frame.celestial.stars_visible;
        if showing_stars && !was_showing_stars {
            self.scatter_stars();
        }
    }

    /// New random seed, then all four layers rebuilt together.
    pub fn regenerate_terrain(&mut self) -> u64 {
        let seed = self.generator.regenerate();
        self.rebuild_terrain();
        seed
    }

    pub fn reseed_terrain(&mut self, seed: u64) {
        self.generator.reseed(seed);
        self.rebuild_terrain();
    }

    pub fn rebuild_terrain(&mut self) {
        let bucket = time_bucket(unix_millis(&self.engine.clock().now()));
        self.terrain = self.generator.generate(bucket);
        self.update_diagnostics();
    }

    pub fn apply_resize(&mut self, viewport: Viewport) {
        let clouds_before = self.viewport.cloud_count();
        self.viewport = viewport;
        self.particles.resize(viewport);
        if viewport.cloud_count() != clouds_before {
            debug!("cloud count {} -> {}", clouds_before, viewport.cloud_count());
            self.clouds = CloudField::generate(hash_u64(self.seed() ^ 0x434C_4F55), &viewport);
        }
    }

    pub fn tick_clock(&mut self) {
        self.now = self.engine.clock().now();
    }

    pub fn advance_particles(&mut self, time_secs: f64) {
        self.particles.advance(time_secs);
    }

    fn scatter_stars(&mut self) {
        let salt = unix_millis(&self.frame.at) as u64;
        self.stars = StarField::generate(hash_u64(self.seed() ^ salt), self.params.star_count);
    }

    pub fn update_diagnostics(&mut self) {
        let mut hashes = BTreeMap::new();
        for path in &self.terrain.layers {
            hashes.insert(path.layer.as_str().to_string(), hash_path(path));
        }

        let mut combined = Hasher::new();
        combined.update(&self.terrain.seed.to_le_bytes());
        combined.update(&self.terrain.time_bucket.to_le_bytes());
        for (name, hash) in &hashes {
            combined.update(name.as_bytes());
            combined.update(hash.as_bytes());
        }
        self.diagnostics.layer_hashes = hashes;
        self.diagnostics.checksum = combined.finalize().to_hex().to_string();
    }
}

fn hash_path(path: &TerrainPath) -> String {
    let mut h = Hasher::new();
    for p in &path.points {
        h.update(&p.x.to_bits().to_le_bytes());
        h.update(&p.y.to_bits().to_le_bytes());
    }
    h.finalize().to_hex().to_string()
}
