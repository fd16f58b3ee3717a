// Clubgrid - Club Membership Visualizer
// Copyright (c) 2025 Filipe da Veiga Ventura Alves
// Licensed under MIT License

use crate::surface::Color;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const SETTINGS_FILE_NAME: &str = "clubgrid_settings.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VisualizerSettings {
    seed: Option<u64>,
    // Layout, as fractions of the smaller surface dimension or of the club radius
    pub padding_fraction: f32,      // of min(width, height)
    pub club_radius_fraction: f32,  // of the smaller grid cell side
    pub offset_min_fraction: f32,   // of club radius
    pub offset_max_fraction: f32,   // of club radius
    pub rebalance_ratio: f32,       // columns are added while rows > ratio * cols
    // Club decoration, as fractions of club radius
    pub stats_spacing_fraction: f32,
    pub bar_width_fraction: f32,
    pub bar_height_fraction: f32,
    pub label_offset_fraction: f32,
    // Strokes and dots, as fractions of min(width, height)
    pub club_stroke_fraction: f32,
    pub dot_radius_fraction: f32,
    pub dot_outline_fraction: f32,
    pub count_padding_fraction: f32,
    pub count_height_fraction: f32,
    pub font_fraction: f32,
    pub min_font_size: f32,
    // Palette
    pub r_color: [u8; 3],
    pub b_color: [u8; 3],
    pub club_stroke_color: [u8; 3],
    pub club_fill_color: [u8; 3],
    pub bar_background_color: [u8; 3],
    pub text_color: [u8; 3],
    pub label_backing_alpha: f32,
    pub highlight_color: [u8; 3],
    // Demo population used when no snapshot file is given
    pub demo_clubs: usize,
    pub demo_people: usize,
    pub demo_memberships: usize,
    pub demo_r_share: f32,
}

impl Default for VisualizerSettings {
    fn default() -> Self {
        Self {
            seed: None,
            padding_fraction: 0.05,
            club_radius_fraction: 0.3,
            offset_min_fraction: 0.10,
            offset_max_fraction: 0.85,
            rebalance_ratio: 1.5,
            stats_spacing_fraction: 0.3,
            bar_width_fraction: 0.75,
            bar_height_fraction: 0.2,
            label_offset_fraction: 1.25,
            club_stroke_fraction: 0.002,
            dot_radius_fraction: 0.008,
            dot_outline_fraction: 0.001,
            count_padding_fraction: 0.005,
            count_height_fraction: 0.015,
            font_fraction: 0.012,
            min_font_size: 12.0,
            r_color: [0xe9, 0x1e, 0x63],
            b_color: [0x21, 0x96, 0xf3],
            club_stroke_color: [0xcc, 0xcc, 0xcc],
            club_fill_color: [0xff, 0xff, 0xff],
            bar_background_color: [0xf0, 0xf0, 0xf0],
            text_color: [0x00, 0x00, 0x00],
            label_backing_alpha: 0.9,
            highlight_color: [0xff, 0xc1, 0x07],
            demo_clubs: 9,
            demo_people: 90,
            demo_memberships: 2,
            demo_r_share: 0.5,
        }
    }
}

impl VisualizerSettings {
    pub fn default_path() -> PathBuf {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(SETTINGS_FILE_NAME)
    }

    pub fn load_from_disk(path: &Path) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut settings: VisualizerSettings = serde_json::from_str(&data)?;
        settings.sanitize();
        Ok(settings)
    }

    pub fn save_to_disk(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Loads settings from `path`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_disk(path) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("Failed to load settings {}: {err:?}", path.display());
                Self::default()
            }
        }
    }

    pub fn sanitize(&mut self) {
        self.padding_fraction = self.padding_fraction.clamp(0.0, 0.45);
        self.club_radius_fraction = self.club_radius_fraction.clamp(0.05, 0.5);
        self.offset_min_fraction = self.offset_min_fraction.clamp(0.0, 1.0);
        self.offset_max_fraction = self.offset_max_fraction.clamp(self.offset_min_fraction, 1.0);
        self.rebalance_ratio = self.rebalance_ratio.clamp(1.0, 10.0);
        self.stats_spacing_fraction = self.stats_spacing_fraction.clamp(0.0, 2.0);
        self.bar_width_fraction = self.bar_width_fraction.clamp(0.05, 2.0);
        self.bar_height_fraction = self.bar_height_fraction.clamp(0.01, 1.0);
        self.label_offset_fraction = self.label_offset_fraction.clamp(1.0, 3.0);
        self.club_stroke_fraction = self.club_stroke_fraction.clamp(0.0, 0.05);
        self.dot_radius_fraction = self.dot_radius_fraction.clamp(0.001, 0.05);
        self.dot_outline_fraction = self.dot_outline_fraction.clamp(0.0, 0.01);
        self.count_padding_fraction = self.count_padding_fraction.clamp(0.0, 0.05);
        self.count_height_fraction = self.count_height_fraction.clamp(0.001, 0.1);
        self.font_fraction = self.font_fraction.clamp(0.001, 0.1);
        self.min_font_size = self.min_font_size.clamp(4.0, 72.0);
        self.label_backing_alpha = self.label_backing_alpha.clamp(0.0, 1.0);
        self.demo_clubs = self.demo_clubs.clamp(1, 400);
        self.demo_people = self.demo_people.min(20_000);
        self.demo_memberships = self.demo_memberships.clamp(1, self.demo_clubs);
        self.demo_r_share = self.demo_r_share.clamp(0.0, 1.0);
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.seed = seed;
    }

    /// Random source for offsets and demo populations: seeded when a seed is
    /// configured, from OS entropy otherwise.
    pub fn make_rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn r_color(&self) -> Color {
        Color::from_rgb_array(self.r_color)
    }

    pub fn b_color(&self) -> Color {
        Color::from_rgb_array(self.b_color)
    }

    pub fn label_backing(&self) -> Color {
        Color::WHITE.with_alpha(self.label_backing_alpha)
    }
}
