use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use serde::Serialize;

use crate::celestial::BodyTransform;
use crate::palette::PaletteField;
use crate::state::Scene;
use crate::terrain::{LayerName, BASELINE, LOGICAL_WIDTH};
use crate::time::{format_clock, TimeSource};

const PREVIEW_WIDTH: u32 = 500;
const PREVIEW_HEIGHT: u32 = 300;

const SUN_RGB: [u8; 3] = [255, 214, 120];
const MOON_RGB: [u8; 3] = [226, 230, 240];

#[derive(Serialize)]
struct ExportMeta<'a> {
    seed: u64,
    time_bucket: u64,
    clock: String,
    period: &'static str,
    next_period: &'static str,
    progress: f64,
    eased: f64,
    checksum: &'a str,
    layer_hashes: &'a BTreeMap<String, String>,
    timestamp_unix_s: u64,
}

/// Writes `scene.svg`, `palette.json`, `meta.json` and `preview.png` for the
/// scene as it stands.
pub fn export_snapshot<S: TimeSource>(scene: &Scene<S>, dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("creating export dir {}", dir.display()))?;

    fs::write(dir.join("scene.svg"), scene_svg(scene))
        .with_context(|| format!("writing {}", dir.join("scene.svg").display()))?;

    let vars = scene.frame.style_variables();
    fs::write(dir.join("palette.json"), serde_json::to_string_pretty(&vars)?)?;

    write_preview_png(scene, dir.join("preview.png"))?;

    let frame = &scene.frame;
    let meta = ExportMeta {
        seed: scene.terrain.seed,
        time_bucket: scene.terrain.time_bucket,
        clock: format_clock(&frame.at),
        period: frame.period.current.as_str(),
        next_period: frame.period.next.as_str(),
        progress: frame.period.progress,
        eased: frame.period.eased,
        checksum: &scene.diagnostics.checksum,
        layer_hashes: &scene.diagnostics.layer_hashes,
        timestamp_unix_s: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs()),
    };
    fs::write(dir.join("meta.json"), serde_json::to_string_pretty(&meta)?)?;
    Ok(())
}

/// Sky gradient plus the four silhouettes in their current colors.
pub fn scene_svg<S: TimeSource>(scene: &Scene<S>) -> String {
    let palette = &scene.frame.palette;
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {LOGICAL_WIDTH} {BASELINE}\" \
         preserveAspectRatio=\"{}\">\n",
        scene.viewport.terrain_aspect_mode()
    );
    let _ = writeln!(
        svg,
        "  <defs><linearGradient id=\"sky\" x1=\"0\" y1=\"0\" x2=\"0\" y2=\"1\">\
         <stop offset=\"0\" stop-color=\"{}\"/><stop offset=\"1\" stop-color=\"{}\"/>\
         </linearGradient></defs>",
        palette.get(PaletteField::SkyStart),
        palette.get(PaletteField::SkyEnd)
    );
    let _ = writeln!(
        svg,
        "  <rect width=\"{LOGICAL_WIDTH}\" height=\"{BASELINE}\" fill=\"url(#sky)\"/>"
    );
    let mut layers: Vec<_> = scene.terrain.layers.iter().collect();
    layers.sort_by_key(|p| p.layer.z_index());
    for path in layers {
        let _ = writeln!(
            svg,
            "  <path class=\"mountain-{}\" fill=\"{}\" d=\"{}\"/>",
            path.layer.as_str(),
            palette.get(PaletteField::mountain(path.layer)),
            path.to_svg_path()
        );
    }
    svg.push_str("</svg>\n");
    svg
}

fn write_preview_png<S: TimeSource>(scene: &Scene<S>, path: impl AsRef<Path>) -> Result<()> {
    let palette = &scene.frame.palette;
    let top = palette.color(PaletteField::SkyStart).rgb();
    let bottom = palette.color(PaletteField::SkyEnd).rgb();

    let mut img = RgbImage::new(PREVIEW_WIDTH, PREVIEW_HEIGHT);
    for y in 0..PREVIEW_HEIGHT {
        let t = f64::from(y) / f64::from(PREVIEW_HEIGHT - 1);
        let c = blend_rgb(top, bottom, t);
        for x in 0..PREVIEW_WIDTH {
            img.put_pixel(x, y, Rgb(c));
        }
    }

    let celestial = &scene.frame.celestial;
    paint_disc(&mut img, &celestial.sun, SUN_RGB, 0.06);
    paint_disc(&mut img, &celestial.moon, MOON_RGB, 0.045);

    let sx = LOGICAL_WIDTH / f64::from(PREVIEW_WIDTH);
    let sy = BASELINE / f64::from(PREVIEW_HEIGHT);
    for layer in LayerName::ALL {
        let Some(terrain) = scene.terrain.layer(layer) else {
            continue;
        };
        let [r, g, b, a] = palette.color(PaletteField::mountain(layer)).to_rgba8();
        let alpha = f64::from(a) / 255.0;
        for x in 0..PREVIEW_WIDTH {
            let ridge = terrain.height_at((f64::from(x) + 0.5) * sx);
            for y in 0..PREVIEW_HEIGHT {
                if (f64::from(y) + 0.5) * sy < ridge {
                    continue;
                }
                let px = img.get_pixel_mut(x, y);
                px.0 = blend_rgb(px.0, [r, g, b], alpha);
            }
        }
    }

    img.save(path.as_ref())
        .with_context(|| format!("writing {}", path.as_ref().display()))?;
    Ok(())
}

fn paint_disc(img: &mut RgbImage, body: &BodyTransform, rgb: [u8; 3], radius_frac: f64) {
    if !body.visible {
        return;
    }
    let (w, h) = (f64::from(img.width()), f64::from(img.height()));
    let (cx, cy) = (body.x * w, body.y * h);
    let radius = radius_frac * h;
    let lit = scale_rgb(rgb, body.brightness);
    for y in 0..img.height() {
        for x in 0..img.width() {
            let dx = f64::from(x) + 0.5 - cx;
            let dy = f64::from(y) + 0.5 - cy;
            if dx * dx + dy * dy <= radius * radius {
                let px = img.get_pixel_mut(x, y);
                px.0 = blend_rgb(px.0, lit, body.opacity.clamp(0.0, 1.0));
            }
        }
    }
}

fn scale_rgb(c: [u8; 3], k: f64) -> [u8; 3] {
    c.map(|v| (f64::from(v) * k).clamp(0.0, 255.0) as u8)
}

fn blend_rgb(a: [u8; 3], b: [u8; 3], t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let s = 1.0 - t;
    [
        (f64::from(a[0]) * s + f64::from(b[0]) * t).round().clamp(0.0, 255.0) as u8,
        (f64::from(a[1]) * s + f64::from(b[1]) * t).round().clamp(0.0, 255.0) as u8,
        (f64::from(a[2]) * s + f64::from(b[2]) * t).round().clamp(0.0, 255.0) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::params::SceneParams;
    use crate::particles::Viewport;
    use crate::time::SimulatedClock;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .expect("valid datetime")
    }

    fn scene() -> Scene<SimulatedClock> {
        let mut params = SceneParams::default();
        params.terrain.seed = Some(42);
        params.particle_count = 4;
        Scene::new(params, SimulatedClock::new(at(12, 0)), Viewport::new(1280.0, 720.0))
    }

    #[test]
    fn svg_stacks_layers_back_to_front() {
        let svg = scene_svg(&scene());
        let back = svg.find("mountain-background").expect("background");
        let front = svg.find("mountain-foreground").expect("foreground");
        assert!(back < front);
        assert_eq!(svg.matches("<path").count(), 4);
        assert!(svg.contains("xMidYMid meet"));
    }

    #[test]
    fn export_writes_all_artifacts() {
        let dir = std::env::temp_dir().join(format!("skyclock-export-{}", std::process::id()));
        export_snapshot(&scene(), &dir).expect("export");
        for name in ["scene.svg", "palette.json", "meta.json", "preview.png"] {
            assert!(dir.join(name).is_file(), "{name} missing");
        }
        let meta: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("meta.json")).expect("read"))
                .expect("json");
        assert_eq!(meta["seed"], 42);
        assert_eq!(meta["period"], "day");
        assert_eq!(meta["clock"], "12:00:00");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn blend_rgb_hits_endpoints() {
        assert_eq!(blend_rgb([0, 0, 0], [255, 255, 255], 0.0), [0, 0, 0]);
        assert_eq!(blend_rgb([0, 0, 0], [255, 255, 255], 1.0), [255, 255, 255]);
        assert_eq!(blend_rgb([0, 0, 0], [255, 255, 255], 0.5), [128, 128, 128]);
    }
}
