use anyhow::Result;
use chrono::Local;
use skyclock_core::export::export_snapshot;
use skyclock_core::particles::Viewport;
use skyclock_core::time::parse_clock;
use skyclock_core::{Scene, SceneParams, SimulatedClock};

fn main() -> Result<()> {
    let mut seed = 42;
    let mut at = parse_clock("12:00")?;
    for arg in std::env::args().skip(1) {
        if let Some(v) = arg.strip_prefix("--seed=") {
            seed = v.parse()?;
        } else if let Some(v) = arg.strip_prefix("--at=") {
            at = parse_clock(v)?;
        }
    }

    let mut params = SceneParams::default();
    params.terrain.seed = Some(seed);
    let clock = SimulatedClock::new(Local::now().date_naive().and_time(at));
    let scene = Scene::new(params, clock, Viewport::new(1920.0, 1080.0));

    let out_dir = format!("exports/scene_seed{}_{}", seed, at.format("%H%M"));
    export_snapshot(&scene, &out_dir)?;

    println!("exported: {out_dir}");
    println!("period: {}", scene.frame.period.current.as_str());
    println!("checksum: {}", scene.diagnostics.checksum);
    Ok(())
}
