use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::color::{blend_str, Color};
use crate::period::TimePeriod;
use crate::terrain::LayerName;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaletteField {
    SkyStart,
    SkyEnd,
    MountainForeground,
    MountainMidground,
    MountainFar,
    MountainBackground,
    Cloud,
    Fog,
    Atmosphere,
    AtmosphereHeavy,
    Particle,
}

impl PaletteField {
    pub const ALL: [PaletteField; 11] = [
        PaletteField::SkyStart,
        PaletteField::SkyEnd,
        PaletteField::MountainForeground,
        PaletteField::MountainMidground,
        PaletteField::MountainFar,
        PaletteField::MountainBackground,
        PaletteField::Cloud,
        PaletteField::Fog,
        PaletteField::Atmosphere,
        PaletteField::AtmosphereHeavy,
        PaletteField::Particle,
    ];

    pub fn mountain(layer: LayerName) -> Self {
        match layer {
            LayerName::Foreground => Self::MountainForeground,
            LayerName::Midground => Self::MountainMidground,
            LayerName::Far => Self::MountainFar,
            LayerName::Background => Self::MountainBackground,
        }
    }

    pub fn css_variable(self) -> &'static str {
        match self {
            Self::SkyStart => "--current-sky-start",
            Self::SkyEnd => "--current-sky-end",
            Self::MountainForeground => "--current-mountain-foreground",
            Self::MountainMidground => "--current-mountain-midground",
            Self::MountainFar => "--current-mountain-far",
            Self::MountainBackground => "--current-mountain-background",
            Self::Cloud => "--current-cloud-color",
            Self::Fog => "--current-fog-light",
            Self::Atmosphere => "--current-atmosphere-color",
            Self::AtmosphereHeavy => "--current-atmosphere-heavy",
            Self::Particle => "--current-particle-color",
        }
    }
}

/// Raw colors for one period, as CSS strings.
#[derive(Clone, Copy, Debug)]
pub struct Palette {
    pub sky_start: &'static str,
    pub sky_end: &'static str,
    pub mountain_foreground: &'static str,
    pub mountain_midground: &'static str,
    pub mountain_far: &'static str,
    pub mountain_background: &'static str,
    pub cloud: &'static str,
    pub fog: &'static str,
    pub atmosphere: &'static str,
    pub atmosphere_heavy: &'static str,
    pub particle: &'static str,
}

impl Palette {
    pub fn get(&self, field: PaletteField) -> &'static str {
        match field {
            PaletteField::SkyStart => self.sky_start,
            PaletteField::SkyEnd => self.sky_end,
            PaletteField::MountainForeground => self.mountain_foreground,
            PaletteField::MountainMidground => self.mountain_midground,
            PaletteField::MountainFar => self.mountain_far,
            PaletteField::MountainBackground => self.mountain_background,
            PaletteField::Cloud => self.cloud,
            PaletteField::Fog => self.fog,
            PaletteField::Atmosphere => self.atmosphere,
            PaletteField::AtmosphereHeavy => self.atmosphere_heavy,
            PaletteField::Particle => self.particle,
        }
    }

    pub fn for_period(period: TimePeriod) -> &'static Palette {
        match period {
            TimePeriod::Morning => &MORNING,
            TimePeriod::Day => &DAY,
            TimePeriod::Sunset => &SUNSET,
            TimePeriod::Night => &NIGHT,
        }
    }
}

const MORNING: Palette = Palette {
    sky_start: "#4a3a2a",
    sky_end: "#8a6a4a",
    mountain_foreground: "#5d4a3a",
    mountain_midground: "#7d6a5a",
    mountain_far: "#9d8a7a",
    mountain_background: "#bd9a8a",
    cloud: "#d4a574",
    fog: "rgba(160, 82, 45, 0.4)",
    atmosphere: "rgba(139, 69, 19, 0.3)",
    atmosphere_heavy: "rgba(139, 69, 19, 0.5)",
    particle: "rgba(255, 218, 185, 0.5)",
};

const DAY: Palette = Palette {
    sky_start: "#307070",
    sky_end: "#80B8B0",
    mountain_foreground: "#4d6a4a",
    mountain_midground: "#5d7a5a",
    mountain_far: "#6d8a6a",
    mountain_background: "#7d9a7a",
    cloud: "#E8E4D9",
    fog: "rgba(128, 184, 176, 0.4)",
    atmosphere: "rgba(232, 228, 217, 0.3)",
    atmosphere_heavy: "rgba(232, 228, 217, 0.5)",
    particle: "rgba(232, 228, 217, 0.8)",
};

const SUNSET: Palette = Palette {
    sky_start: "#4a3a2a",
    sky_end: "#8a6a4a",
    mountain_foreground: "#5d4a3a",
    mountain_midground: "#7d6a5a",
    mountain_far: "#9d8a7a",
    mountain_background: "#bd9a8a",
    cloud: "#d4a574",
    fog: "rgba(160, 82, 45, 0.5)",
    atmosphere: "rgba(139, 69, 19, 0.4)",
    atmosphere_heavy: "rgba(139, 69, 19, 0.6)",
    particle: "rgba(255, 218, 185, 0.6)",
};

const NIGHT: Palette = Palette {
    sky_start: "#374752",
    sky_end: "#4A6A7A",
    mountain_foreground: "#4A5A6A",
    mountain_midground: "#5A6A7A",
    mountain_far: "#6A7A8A",
    mountain_background: "#7A8A9A",
    cloud: "#4A6A7A",
    fog: "rgba(200, 200, 255, 0.08)",
    atmosphere: "rgba(200, 200, 255, 0.08)",
    atmosphere_heavy: "rgba(180, 180, 240, 0.15)",
    particle: "rgba(255, 255, 255, 0.8)",
};

/// One field blended between two periods' raw colors.
pub fn blend(field: PaletteField, current: TimePeriod, next: TimePeriod, eased: f64) -> String {
    blend_str(
        Palette::for_period(current).get(field),
        Palette::for_period(next).get(field),
        eased,
    )
}

/// Which palette the scene shows. Fixed for the lifetime of an engine.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaletteSource {
    #[default]
    Interpolated,
    Static,
}

/// Every palette field resolved to a CSS string for one tick.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BlendedPalette {
    colors: BTreeMap<PaletteField, String>,
}

impl BlendedPalette {
    pub fn blended(current: TimePeriod, next: TimePeriod, eased: f64) -> Self {
        Self {
            colors: PaletteField::ALL
                .iter()
                .map(|&f| (f, blend(f, current, next, eased)))
                .collect(),
        }
    }

    /// A period's raw table entry, unblended.
    pub fn raw(period: TimePeriod) -> Self {
        let palette = Palette::for_period(period);
        Self {
            colors: PaletteField::ALL
                .iter()
                .map(|&f| (f, palette.get(f).to_string()))
                .collect(),
        }
    }

    pub fn get(&self, field: PaletteField) -> &str {
        self.colors.get(&field).map_or("#000000", String::as_str)
    }

    pub fn color(&self, field: PaletteField) -> Color {
        Color::parse_or_fallback(self.get(field))
    }

    pub fn css_variables(&self) -> BTreeMap<&'static str, &str> {
        self.colors
            .iter()
            .map(|(f, c)| (f.css_variable(), c.as_str()))
            .collect()
    }

    /// `linear-gradient(...)` for the sky element.
    pub fn sky_gradient_css(&self) -> String {
        format!(
            "linear-gradient(to bottom, {}, {})",
            self.get(PaletteField::SkyStart),
            self.get(PaletteField::SkyEnd)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_entry_parses() {
        for period in TimePeriod::ALL {
            for field in PaletteField::ALL {
                let raw = Palette::for_period(period).get(field);
                assert!(Color::parse(raw).is_ok(), "{period:?} {field:?} {raw}");
            }
        }
    }

    #[test]
    fn blend_at_zero_is_current_period() {
        for period in TimePeriod::ALL {
            for field in PaletteField::ALL {
                let raw = Color::parse(Palette::for_period(period).get(field)).expect("raw");
                let got = Color::parse(&blend(field, period, period.next(), 0.0)).expect("blend");
                assert_eq!(got, raw);
            }
        }
    }

    #[test]
    fn blend_near_one_approaches_next_period() {
        for period in TimePeriod::ALL {
            for field in PaletteField::ALL {
                let next = Color::parse(Palette::for_period(period.next()).get(field)).expect("raw");
                let got = Color::parse(&blend(field, period, period.next(), 0.9999)).expect("blend");
                assert_eq!(got.rgb(), next.rgb());
                assert!((got.alpha() - next.alpha()).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn css_variables_cover_all_fields() {
        let p = BlendedPalette::blended(TimePeriod::Day, TimePeriod::Sunset, 0.5);
        let vars = p.css_variables();
        assert_eq!(vars.len(), PaletteField::ALL.len());
        assert_eq!(vars["--current-fog-light"], p.get(PaletteField::Fog));
        assert!(p.sky_gradient_css().starts_with("linear-gradient(to bottom, #"));
    }

    #[test]
    fn raw_palette_keeps_table_text() {
        let p = BlendedPalette::raw(TimePeriod::Night);
        assert_eq!(p.get(PaletteField::SkyEnd), "#4A6A7A");
    }
}
