use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use chrono::Timelike;
use eframe::egui;
use egui::{Align2, Color32, FontId, Mesh, Pos2, Rect, Shape, Vec2};
use log::{info, warn};
use skyclock_core::celestial::BodyTransform;
use skyclock_core::color::Color;
use skyclock_core::export::export_snapshot;
use skyclock_core::palette::{PaletteField, PaletteSource};
use skyclock_core::particles::{
    parallax_offset, Viewport, ATMOSPHERE_DEPTH, CLOUD_DEPTH, FOG_DEPTH, MOON_DEPTH,
    PARTICLE_DEPTH, SUN_DEPTH,
};
use skyclock_core::terrain::{LayerName, BASELINE, LOGICAL_WIDTH};
use skyclock_core::time::{format_clock, format_date, parse_clock};
use skyclock_core::{run_due, Scene, SceneClock, SceneParams, Schedule, SimulatedClock};

const SUN_RGB: [u8; 3] = [255, 214, 120];
const MOON_RGB: [u8; 3] = [226, 230, 240];
const STAR_TWINKLE_SECS: f64 = 3.0;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse(std::env::args().skip(1))?;
    let app = SkyClockApp::new(args)?;

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Sky Clock",
        options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow!("viewer exited: {e}"))
}

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    seed: Option<u64>,
    simulate: Option<(u32, u32)>,
    static_colors: bool,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut out = Self::default();
        for arg in args {
            if let Some(v) = arg.strip_prefix("--config=") {
                out.config = Some(PathBuf::from(v));
            } else if let Some(v) = arg.strip_prefix("--seed=") {
                out.seed = Some(v.parse().with_context(|| format!("bad seed {v:?}"))?);
            } else if let Some(v) = arg.strip_prefix("--simulate=") {
                let t = parse_clock(v)?;
                out.simulate = Some((t.hour(), t.minute()));
            } else if arg == "--static-colors" {
                out.static_colors = true;
            } else {
                warn!("ignoring unknown argument {arg:?}");
            }
        }
        Ok(out)
    }
}

struct SkyClockApp {
    scene: Scene<SceneClock>,
    schedule: Schedule,
    screen: Vec2,
    show_controls: bool,
    sim_hour: u32,
    sim_minute: u32,
    status: Option<String>,
}

impl SkyClockApp {
    fn new(args: Args) -> Result<Self> {
        let mut params = match &args.config {
            Some(path) => SceneParams::load(path)?,
            None => SceneParams::default(),
        };
        if let Some(seed) = args.seed {
            params.terrain.seed = Some(seed);
        }
        if args.static_colors {
            params.palette_source = PaletteSource::Static;
        }

        let (sim_hour, sim_minute) = args.simulate.unwrap_or((12, 0));
        let clock = match args.simulate {
            Some((h, m)) => SceneClock::simulated(SimulatedClock::at_time(h, m)?),
            None => SceneClock::default(),
        };
        let simulated = clock.is_simulated();
        let scene = Scene::new(params, clock, Viewport::default());
        let schedule = Schedule::new(&scene.params.schedule, simulated, Instant::now());
        info!(
            "sky clock started: seed={} period={} simulated={}",
            scene.seed(),
            scene.frame.period.current.as_str(),
            simulated
        );

        Ok(Self {
            scene,
            schedule,
            screen: Vec2::ZERO,
            show_controls: false,
            sim_hour,
            sim_minute,
            status: None,
        })
    }

    fn set_simulated(&mut self, on: bool, now: Instant) {
        if on {
            let (h, m) = (self.sim_hour, self.sim_minute);
            if let Err(e) = self.scene.clock_mut().simulate().set_time_of_day(h, m) {
                self.status = Some(e.to_string());
            }
        } else {
            self.scene.clock_mut().follow_system();
        }
        self.schedule.set_simulated(on, now);
        self.scene.refresh_colors();
    }

    fn controls(&mut self, ui: &mut egui::Ui, now: Instant) {
        let mut simulated = self.scene.engine().clock().is_simulated();
        if ui.checkbox(&mut simulated, "Simulate time").changed() {
            self.set_simulated(simulated, now);
        }

        ui.add_enabled_ui(simulated, |ui| {
            let hour = ui.add(egui::Slider::new(&mut self.sim_hour, 0..=23).text("Hour"));
            let minute = ui.add(egui::Slider::new(&mut self.sim_minute, 0..=59).text("Minute"));
            if hour.changed() || minute.changed() {
                let (h, m) = (self.sim_hour, self.sim_minute);
                match self.scene.clock_mut().simulate().set_time_of_day(h, m) {
                    Ok(()) => self.scene.refresh_colors(),
                    Err(e) => self.status = Some(e.to_string()),
                }
            }
        });

        ui.separator();
        if ui.button("Regenerate terrain").clicked() {
            let seed = self.scene.regenerate_terrain();
            self.status = Some(format!("New seed {seed}"));
        }
        if ui.button("Export snapshot").clicked() {
            self.status = Some(match self.export() {
                Ok(path) => format!("Exported to {}", path.display()),
                Err(e) => format!("Export failed: {e:#}"),
            });
        }

        ui.separator();
        let frame = &self.scene.frame;
        ui.label(format!(
            "Period: {} -> {}",
            frame.period.current.as_str(),
            frame.period.next.as_str()
        ));
        ui.label(format!(
            "Progress: {:.3} (eased {:.3})",
            frame.period.progress, frame.period.eased
        ));
        ui.label(format!("Seed: {}", self.scene.seed()));
        ui.label(format!("Bucket: {}", self.scene.terrain.time_bucket));
        ui.label(format!("Checksum: {}", self.scene.diagnostics.checksum));
        ui.label(format!(
            "Viewport: {:.0}x{:.0} ({} clouds)",
            self.scene.viewport.width,
            self.scene.viewport.height,
            self.scene.clouds.clouds.len()
        ));

        if let Some(msg) = &self.status {
            ui.separator();
            ui.label(msg);
        }
    }

    fn export(&self) -> Result<PathBuf> {
        let checksum_prefix = self
            .scene
            .diagnostics
            .checksum
            .chars()
            .take(8)
            .collect::<String>();
        let dir = PathBuf::from("exports").join(format!(
            "seed{}_{}_{}",
            self.scene.seed(),
            self.scene.frame.at.format("%H%M"),
            checksum_prefix
        ));
        export_snapshot(&self.scene, &dir)?;
        Ok(dir)
    }

    fn paint(&self, painter: &egui::Painter, rect: Rect, pointer: (f64, f64), time_secs: f64) {
        let palette = &self.scene.frame.palette;
        let celestial = &self.scene.frame.celestial;
        let offset = |depth: f64| {
            let (dx, dy) = parallax_offset(pointer, depth);
            Vec2::new(dx as f32, dy as f32)
        };

        painter.add(Shape::mesh(gradient_mesh(
            rect,
            color32(&palette.color(PaletteField::SkyStart)),
            color32(&palette.color(PaletteField::SkyEnd)),
        )));

        if celestial.stars_visible {
            for star in &self.scene.stars.stars {
                let phase = (time_secs + star.delay) / STAR_TWINKLE_SECS * std::f64::consts::TAU;
                let alpha = (0.55 + 0.45 * phase.sin()) as f32;
                let pos = percent_pos(rect, star.left_percent, star.top_percent);
                painter.circle_filled(pos, 1.2, Color32::WHITE.gamma_multiply(alpha));
            }
        }

        paint_body(painter, rect, &celestial.sun, SUN_RGB, 0.05, offset(SUN_DEPTH));
        paint_body(painter, rect, &celestial.moon, MOON_RGB, 0.04, offset(MOON_DEPTH));

        let atmosphere = color32(&palette.color(PaletteField::Atmosphere));
        let band = Rect::from_min_max(
            Pos2::new(rect.left(), rect.top() + rect.height() * 0.3),
            rect.right_bottom(),
        )
        .translate(offset(ATMOSPHERE_DEPTH));
        painter.add(Shape::mesh(gradient_mesh(band, Color32::TRANSPARENT, atmosphere)));

        let cloud = color32(&palette.color(PaletteField::Cloud));
        let cloud_shift = offset(CLOUD_DEPTH);
        for c in &self.scene.clouds.clouds {
            let center = percent_pos(rect, c.left_at(time_secs), c.top_percent) + cloud_shift;
            let r = rect.height() * 0.035;
            for (dx, dy, k) in [(-1.2, 0.2, 0.8), (0.0, 0.0, 1.0), (1.3, 0.25, 0.75)] {
                painter.circle_filled(center + Vec2::new(dx * r, dy * r), r * k, cloud);
            }
        }

        let (scale, origin) = terrain_transform(rect, self.scene.viewport.is_portrait());
        for layer in LayerName::ALL {
            let Some(path) = self.scene.terrain.layer(layer) else {
                continue;
            };
            let fill = color32(&palette.color(PaletteField::mountain(layer)));
            let shift = offset(layer.parallax_depth());
            let ridge: Vec<Pos2> = path
                .flatten(12)
                .iter()
                .map(|p| origin + Vec2::new(p.x as f32, p.y as f32) * scale + shift)
                .collect();
            let floor = (origin.y + BASELINE as f32 * scale).max(rect.bottom()) + shift.y.abs();
            painter.add(Shape::mesh(silhouette_mesh(&ridge, floor, fill)));
        }

        let fog = color32(&palette.color(PaletteField::Fog));
        let fog_band = Rect::from_min_max(
            Pos2::new(rect.left(), rect.bottom() - rect.height() * 0.35),
            rect.right_bottom(),
        )
        .translate(offset(FOG_DEPTH));
        painter.add(Shape::mesh(gradient_mesh(fog_band, Color32::TRANSPARENT, fog)));

        let particle = palette.color(PaletteField::Particle);
        let particle_shift = offset(PARTICLE_DEPTH);
        for p in self.scene.particles.particles() {
            let pos = rect.min + Vec2::new(p.x as f32, p.y as f32) + particle_shift;
            let (radius, alpha) = if p.sparkle {
                (p.size * 1.8, (p.opacity * 2.0).min(1.0))
            } else {
                (p.size, p.opacity)
            };
            painter.circle_filled(pos, radius as f32, color32(&particle).gamma_multiply(alpha as f32));
        }

        let at = &self.scene.now;
        let clock_pos = Pos2::new(rect.center().x, rect.top() + rect.height() * 0.08);
        painter.text(
            clock_pos,
            Align2::CENTER_TOP,
            format_clock(at),
            FontId::proportional(56.0),
            Color32::from_white_alpha(230),
        );
        painter.text(
            clock_pos + Vec2::new(0.0, 66.0),
            Align2::CENTER_TOP,
            format_date(at),
            FontId::proportional(20.0),
            Color32::from_white_alpha(200),
        );
    }
}

impl eframe::App for SkyClockApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        let visible = ctx.input(|i| {
            let vp = i.viewport();
            vp.focused.unwrap_or(true) && !vp.minimized.unwrap_or(false)
        });
        self.schedule.frames.set_visible(visible);

        let rect = ctx.screen_rect();
        if rect.size() != self.screen {
            self.screen = rect.size();
            self.schedule.request_resize(
                Viewport::new(f64::from(rect.width()), f64::from(rect.height())),
                now,
            );
        }

        run_due(&mut self.scene, &mut self.schedule, now);

        if ctx.input(|i| i.key_pressed(egui::Key::F1)) {
            self.show_controls = !self.show_controls;
        }

        let pointer = ctx
            .input(|i| i.pointer.hover_pos())
            .map_or((0.5, 0.5), |p| {
                (
                    f64::from((p.x - rect.left()) / rect.width().max(1.0)),
                    f64::from((p.y - rect.top()) / rect.height().max(1.0)),
                )
            });
        let time_secs = self.schedule.elapsed_secs(now);

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                self.paint(&ui.painter_at(rect), rect, pointer, time_secs);
            });

        let mut open = self.show_controls;
        egui::Window::new("Sky clock")
            .open(&mut open)
            .default_width(280.0)
            .show(ctx, |ui| self.controls(ui, now));
        self.show_controls = open;

        if self.schedule.frames.is_visible() {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(self.schedule.next_wake(now));
        }
    }
}

fn color32(c: &Color) -> Color32 {
    let [r, g, b, a] = c.to_rgba8();
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

fn percent_pos(rect: Rect, left: f64, top: f64) -> Pos2 {
    Pos2::new(
        rect.left() + rect.width() * (left / 100.0) as f32,
        rect.top() + rect.height() * (top / 100.0) as f32,
    )
}

/// Vertical two-stop gradient over `rect`.
fn gradient_mesh(rect: Rect, top: Color32, bottom: Color32) -> Mesh {
    let mut mesh = Mesh::default();
    mesh.colored_vertex(rect.left_top(), top);
    mesh.colored_vertex(rect.right_top(), top);
    mesh.colored_vertex(rect.right_bottom(), bottom);
    mesh.colored_vertex(rect.left_bottom(), bottom);
    mesh.add_triangle(0, 1, 2);
    mesh.add_triangle(0, 2, 3);
    mesh
}

/// Ridge line filled down to `floor`, as quads so concave ridges fill
/// correctly.
fn silhouette_mesh(ridge: &[Pos2], floor: f32, fill: Color32) -> Mesh {
    let mut mesh = Mesh::default();
    for pair in ridge.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let base = mesh.vertices.len() as u32;
        mesh.colored_vertex(a, fill);
        mesh.colored_vertex(b, fill);
        mesh.colored_vertex(Pos2::new(b.x, floor), fill);
        mesh.colored_vertex(Pos2::new(a.x, floor), fill);
        mesh.add_triangle(base, base + 1, base + 2);
        mesh.add_triangle(base, base + 2, base + 3);
    }
    mesh
}

/// Scale and top-left origin for the logical terrain box, anchored to the
/// bottom edge. Portrait screens crop the sides; others fit the width and
/// let the sky fill what is above.
fn terrain_transform(rect: Rect, portrait: bool) -> (f32, Pos2) {
    let sx = rect.width() / LOGICAL_WIDTH as f32;
    let sy = rect.height() / BASELINE as f32;
    let scale = if portrait { sx.max(sy) } else { sx };
    let width = LOGICAL_WIDTH as f32 * scale;
    let height = BASELINE as f32 * scale;
    let origin = Pos2::new(rect.center().x - width / 2.0, rect.bottom() - height);
    (scale, origin)
}

fn paint_body(
    painter: &egui::Painter,
    rect: Rect,
    body: &BodyTransform,
    rgb: [u8; 3],
    radius_frac: f32,
    shift: Vec2,
) {
    if !body.visible {
        return;
    }
    let [r, g, b] = filtered(rgb, body.brightness, body.saturation);
    let alpha = (body.opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    let pos = percent_pos(rect, body.left_percent(), body.top_percent()) + shift;
    let radius = rect.height() * radius_frac;
    painter.circle_filled(pos, radius * 1.6, Color32::from_rgba_unmultiplied(r, g, b, alpha / 6));
    painter.circle_filled(pos, radius, Color32::from_rgba_unmultiplied(r, g, b, alpha));
}

/// CSS `saturate()` then `brightness()` on one color.
fn filtered(rgb: [u8; 3], brightness: f64, saturation: f64) -> [u8; 3] {
    let [r, g, b] = rgb.map(f64::from);
    let gray = 0.2126 * r + 0.7152 * g + 0.0722 * b;
    [r, g, b].map(|c| ((gray + (c - gray) * saturation) * brightness).clamp(0.0, 255.0) as u8)
}
