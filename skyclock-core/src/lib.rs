pub mod celestial;
pub mod color;
pub mod engine;
pub mod error;
pub mod export;
pub mod palette;
pub mod params;
pub mod particles;
pub mod period;
pub mod rng;
pub mod scheduler;
pub mod state;
pub mod terrain;
pub mod time;

pub use engine::{SceneFrame, TimeColorEngine};
pub use error::SceneError;
pub use params::SceneParams;
pub use scheduler::{run_due, DueTasks, Schedule};
pub use state::Scene;
pub use time::{SceneClock, SimulatedClock, SystemClock, TimeSource};

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::particles::Viewport;
    use crate::{Scene, SceneParams, SimulatedClock};

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid datetime")
    }

    fn scene_with_seed(seed: u64) -> Scene<SimulatedClock> {
        let mut p = SceneParams::default();
        p.terrain.seed = Some(seed);
        Scene::new(p, SimulatedClock::new(noon()), Viewport::default())
    }

    #[test]
    fn deterministic_same_seed_same_checksum() {
        let a = scene_with_seed(123_456);
        let b = scene_with_seed(123_456);
        assert_eq!(a.diagnostics.checksum, b.diagnostics.checksum);
        assert_eq!(a.terrain, b.terrain);
    }

    #[test]
    fn deterministic_different_seed_different_checksum() {
        let a = scene_with_seed(111);
        let b = scene_with_seed(222);
        assert_ne!(a.diagnostics.checksum, b.diagnostics.checksum);
    }

    #[test]
    fn rebuild_is_pure_for_a_fixed_clock() {
        let mut a = scene_with_seed(9);
        let before = a.diagnostics.checksum.clone();
        a.rebuild_terrain();
        assert_eq!(before, a.diagnostics.checksum);
    }
}
