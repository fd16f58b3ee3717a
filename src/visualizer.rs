// Clubgrid - Club Membership Visualizer
// Copyright (c) 2025 Filipe da Veiga Ventura Alves
// Licensed under MIT License

//! Grid visualizer: lays clubs out on a grid, scatters members inside each
//! club circle and repaints the whole surface on every draw.

use crate::layout::{GridLayout, OffsetStore};
use crate::model::{Club, ClubId, Person, PersonId, Snapshot, TraitCounts};
use crate::settings::VisualizerSettings;
use crate::stats::draw_club_stats;
use crate::style::DrawStyle;
use crate::surface::{DrawSurface, Point, Stroke, TextAlign, ViewportProvider};
use rand::rngs::StdRng;
use std::collections::HashMap;

/// Receives the population-wide trait counts after every draw.
pub trait LegendSink {
    fn update_legend(&mut self, counts: TraitCounts);
}

impl LegendSink for () {
    fn update_legend(&mut self, _counts: TraitCounts) {}
}

/// Keeps the most recent legend counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegendState {
    pub counts: Option<TraitCounts>,
    pub updates: usize,
}

impl LegendSink for LegendState {
    fn update_legend(&mut self, counts: TraitCounts) {
        self.counts = Some(counts);
        self.updates += 1;
    }
}

/// Anything that can be fitted to a viewport and repainted onto a surface.
pub trait Renderer {
    fn resize(&mut self, viewport: &dyn ViewportProvider, surface: &mut dyn DrawSurface);
    fn draw(&mut self, surface: &mut dyn DrawSurface);
}

pub struct GridVisualizer<L: LegendSink = LegendState> {
    settings: VisualizerSettings,
    rng: StdRng,
    legend: L,
    snapshot: Option<Snapshot>,
    layout: Option<GridLayout>,
    style: Option<DrawStyle>,
    club_positions: HashMap<ClubId, Point>,
    offsets: OffsetStore,
    size: (f32, f32),
    layout_dirty: bool,
}

impl<L: LegendSink> GridVisualizer<L> {
    pub fn new(settings: VisualizerSettings, legend: L) -> Self {
        let rng = settings.make_rng();
        Self::with_rng(settings, legend, rng)
    }

    pub fn with_rng(mut settings: VisualizerSettings, legend: L, rng: StdRng) -> Self {
        settings.sanitize();
        Self {
            settings,
            rng,
            legend,
            snapshot: None,
            layout: None,
            style: None,
            club_positions: HashMap::new(),
            offsets: OffsetStore::default(),
            size: (0.0, 0.0),
            layout_dirty: true,
        }
    }

    pub fn settings(&self) -> &VisualizerSettings {
        &self.settings
    }

    /// Replaces the settings; the layout is recomputed on the next resize.
    pub fn set_settings(&mut self, mut settings: VisualizerSettings) {
        settings.sanitize();
        self.settings = settings;
        self.layout_dirty = true;
    }

    pub fn legend(&self) -> &L {
        &self.legend
    }

    pub fn legend_mut(&mut self) -> &mut L {
        &mut self.legend
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn layout(&self) -> Option<&GridLayout> {
        self.layout.as_ref()
    }

    pub fn club_position(&self, club: ClubId) -> Option<Point> {
        self.club_positions.get(&club).copied()
    }

    pub fn offsets(&self) -> &OffsetStore {
        &self.offsets
    }

    /// Takes ownership of `snapshot`, fits the surface to the viewport, lays
    /// the clubs out, seeds missing member offsets and draws.
    pub fn initialize(
        &mut self,
        snapshot: Snapshot,
        viewport: &dyn ViewportProvider,
        surface: &mut dyn DrawSurface,
    ) {
        self.snapshot = Some(snapshot);
        self.layout_dirty = true;
        self.fit(viewport, surface);
        surface.set_visible(true);
        self.draw(surface);
    }

    /// Discards every member offset and generates fresh ones for the current
    /// snapshot.
    pub fn reseed_offsets(&mut self) {
        self.offsets.clear();
        if let Some(snapshot) = &self.snapshot {
            let generated = self.offsets.seed(snapshot, &self.settings, &mut self.rng);
            log::debug!("Re-seeded {} member offsets", generated);
        }
    }

    fn fit(&mut self, viewport: &dyn ViewportProvider, surface: &mut dyn DrawSurface) {
        let (width, height) = viewport.size();
        let ratio = viewport.pixel_ratio();
        let ratio = if ratio.is_finite() && ratio > 0.0 { ratio } else { 1.0 };
        surface.resize(width, height, ratio);

        if self.size != (width, height) {
            self.size = (width, height);
            self.layout_dirty = true;
        }
        if self.layout_dirty {
            self.relayout();
        }
    }

    fn relayout(&mut self) {
        self.layout_dirty = false;
        self.club_positions.clear();
        self.layout = None;
        self.style = None;

        let Some(snapshot) = &self.snapshot else {
            return;
        };
        let (width, height) = self.size;
        let club_count = snapshot.clubs().len();

        match GridLayout::compute(width, height, club_count, &self.settings) {
            Some(layout) => {
                log::debug!(
                    "Layout {}x{} for {} clubs: {} columns x {} rows, club radius {:.1}",
                    width,
                    height,
                    club_count,
                    layout.columns,
                    layout.rows,
                    layout.club_radius
                );
                self.club_positions = layout.club_positions(snapshot);
                self.style = Some(DrawStyle::new(&layout, &self.settings));
                self.layout = Some(layout);
            }
            None => {
                log::warn!(
                    "No layout for {} clubs on a {}x{} surface",
                    club_count,
                    width,
                    height
                );
            }
        }

        let generated = self.offsets.seed(snapshot, &self.settings, &mut self.rng);
        if generated > 0 {
            log::debug!("Generated {} member offsets", generated);
        }
    }

    /// Full repaint from the current snapshot and layout.
    pub fn draw(&mut self, surface: &mut dyn DrawSurface) {
        let Some(snapshot) = &self.snapshot else {
            log::error!("Cannot draw: missing snapshot, initialize the visualizer first");
            return;
        };

        let (width, height) = self.size;
        if let Err(err) = surface.clear(width, height) {
            log::error!("Cannot draw: clearing the surface failed: {err:?}");
            return;
        }

        for club in snapshot.clubs() {
            let depth = surface.depth();
            if let Err(err) = self.draw_club(surface, club) {
                log::error!("Error drawing club {}: {err:?}", club.id);
                surface.restore_to(depth);
            }
        }

        let counts = snapshot.trait_counts();
        self.legend.update_legend(counts);
    }

    /// Circle, stats, label and member dots of one club, around its grid
    /// center. Clubs outside the current layout are skipped.
    pub fn draw_club(&self, surface: &mut dyn DrawSurface, club: &Club) -> anyhow::Result<()> {
        let (Some(center), Some(style), Some(snapshot)) = (
            self.club_positions.get(&club.id),
            self.style.as_ref(),
            self.snapshot.as_ref(),
        ) else {
            return Ok(());
        };

        surface.save();
        surface.translate(center.x, center.y);
        let result = self.draw_club_local(surface, style, snapshot, club);
        surface.restore();
        result
    }

    fn draw_club_local(
        &self,
        surface: &mut dyn DrawSurface,
        style: &DrawStyle,
        snapshot: &Snapshot,
        club: &Club,
    ) -> anyhow::Result<()> {
        let radius = style.club_radius;
        surface.circle(Point::ORIGIN, radius, Some(style.club_fill), Some(style.club_stroke))?;

        let bar_y = -radius - style.stats_spacing;
        draw_club_stats(surface, style, 0.0, bar_y, snapshot.club_counts(club))?;

        surface.fill_text(
            &format!("Club {}", club.id),
            Point::new(0.0, style.label_offset),
            TextAlign::Center,
            style.font_size,
            style.text_color,
        )?;

        for person in snapshot.members(club) {
            self.draw_member_dot(surface, style, club.id, person)?;
        }
        Ok(())
    }

    /// One member dot, relative to an origin already translated to the club
    /// center.
    pub fn draw_member(
        &self,
        surface: &mut dyn DrawSurface,
        club: &Club,
        person: &Person,
    ) -> anyhow::Result<()> {
        match &self.style {
            Some(style) => self.draw_member_dot(surface, style, club.id, person),
            None => Ok(()),
        }
    }

    fn draw_member_dot(
        &self,
        surface: &mut dyn DrawSurface,
        style: &DrawStyle,
        club: ClubId,
        person: &Person,
    ) -> anyhow::Result<()> {
        let Some(offset) = self.offsets.get(person.id, club) else {
            return Ok(());
        };
        paint_dot(surface, style, offset.local_position(style.club_radius), person)
    }

    /// Absolute dot positions of `person` in every club of the layout they
    /// have an offset for, following the person's own membership list.
    pub fn person_positions(&self, person: &Person) -> Vec<(ClubId, Point)> {
        let Some(style) = &self.style else {
            return Vec::new();
        };
        person
            .clubs
            .iter()
            .filter_map(|&club| {
                let center = self.club_positions.get(&club)?;
                let local = self.offsets.get(person.id, club)?.local_position(style.club_radius);
                Some((club, Point::new(center.x + local.x, center.y + local.y)))
            })
            .collect()
    }

    /// Draws `person` across all of their clubs in untranslated surface
    /// coordinates.
    pub fn draw_person(&self, surface: &mut dyn DrawSurface, person: &Person) -> anyhow::Result<()> {
        let Some(style) = &self.style else {
            return Ok(());
        };
        for (_, at) in self.person_positions(person) {
            paint_dot(surface, style, at, person)?;
        }
        Ok(())
    }

    /// `draw_person` with a ring around each dot, for the selected person.
    pub fn highlight_person(&self, surface: &mut dyn DrawSurface, person: PersonId) -> anyhow::Result<()> {
        let (Some(style), Some(person)) = (
            self.style.as_ref(),
            self.snapshot.as_ref().and_then(|s| s.person(person)),
        ) else {
            return Ok(());
        };
        let ring = Stroke::new((style.dot_radius * 0.4).max(1.0), style.highlight);
        for (_, at) in self.person_positions(person) {
            surface.circle(at, style.dot_radius * 1.8, None, Some(ring))?;
        }
        self.draw_person(surface, person)
    }

    /// The member whose dot is under `at` (surface coordinates). Dots drawn
    /// later win, matching paint order.
    pub fn person_at(&self, at: Point) -> Option<PersonId> {
        let style = self.style.as_ref()?;
        let snapshot = self.snapshot.as_ref()?;
        let reach = style.dot_radius + style.dot_outline.width;
        let mut hit = None;
        for club in snapshot.clubs() {
            let Some(center) = self.club_positions.get(&club.id) else {
                continue;
            };
            if center.distance(at) > style.club_radius + reach {
                continue;
            }
            for &member in &club.members {
                if let Some(offset) = self.offsets.get(member, club.id) {
                    let local = offset.local_position(style.club_radius);
                    let dot = Point::new(center.x + local.x, center.y + local.y);
                    if dot.distance(at) <= reach {
                        hit = Some(member);
                    }
                }
            }
        }
        hit
    }
}

fn paint_dot(
    surface: &mut dyn DrawSurface,
    style: &DrawStyle,
    at: Point,
    person: &Person,
) -> anyhow::Result<()> {
    surface.circle(
        at,
        style.dot_radius,
        Some(style.trait_color(person.kind)),
        Some(style.dot_outline),
    )
}

impl<L: LegendSink> Renderer for GridVisualizer<L> {
    /// Fits the surface to the viewport; the layout is recomputed only when
    /// the viewport size or the settings changed. Member offsets survive.
    fn resize(&mut self, viewport: &dyn ViewportProvider, surface: &mut dyn DrawSurface) {
        self.fit(viewport, surface);
    }

    fn draw(&mut self, surface: &mut dyn DrawSurface) {
        GridVisualizer::draw(self, surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DrawCommand, RecordingSurface};
    use crate::model::Trait;
    use crate::surface::FixedViewport;
    use rand::SeedableRng;

    fn visualizer() -> GridVisualizer {
        GridVisualizer::with_rng(
            VisualizerSettings::default(),
            LegendState::default(),
            StdRng::seed_from_u64(1),
        )
    }

    fn snapshot() -> Snapshot {
        Snapshot::new(
            vec![
                Club { id: 1, members: vec![1, 2, 3, 4] },
                Club { id: 2, members: vec![] },
            ],
            vec![
                Person { id: 1, kind: Trait::R, clubs: vec![1] },
                Person { id: 2, kind: Trait::R, clubs: vec![1] },
                Person { id: 3, kind: Trait::R, clubs: vec![1] },
                Person { id: 4, kind: Trait::B, clubs: vec![1] },
                Person { id: 5, kind: Trait::B, clubs: vec![] },
            ],
        )
    }

    #[test]
    fn draw_before_initialize_draws_nothing() {
        let mut vis = visualizer();
        let mut surface = RecordingSurface::new();
        vis.draw(&mut surface);
        assert!(surface.commands().is_empty());
        assert_eq!(vis.legend().updates, 0);
    }

    #[test]
    fn initialize_draws_clubs_and_updates_legend() {
        let mut vis = visualizer();
        let mut surface = RecordingSurface::new();
        vis.initialize(snapshot(), &FixedViewport::new(800.0, 600.0), &mut surface);

        assert!(surface.is_visible());
        assert!(matches!(surface.commands()[0], DrawCommand::Clear { .. }));
        let texts = surface.texts();
        assert!(texts.contains(&"Club 1"));
        assert!(texts.contains(&"Club 2"));
        assert!(texts.contains(&"R/B: 3.00"));
        assert!(texts.contains(&"Members: 4"));
        assert!(texts.contains(&"R/B: N/A"));
        assert!(texts.contains(&"Members: 0"));
        assert_eq!(vis.legend().counts, Some(TraitCounts { r: 3, b: 2 }));
    }

    #[test]
    fn members_are_drawn_after_label() {
        let mut vis = visualizer();
        let mut surface = RecordingSurface::new();
        vis.initialize(snapshot(), &FixedViewport::new(800.0, 600.0), &mut surface);

        let commands = surface.commands();
        let label = commands
            .iter()
            .position(|c| matches!(c, DrawCommand::Text { text, .. } if text == "Club 1"))
            .unwrap();
        let dots: Vec<usize> = commands
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, DrawCommand::Circle { fill: Some(f), .. } if *f != crate::surface::Color::WHITE))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(dots.len(), 4);
        assert!(dots.iter().all(|&i| i > label));
    }

    #[test]
    fn person_at_finds_drawn_dot() {
        let mut vis = visualizer();
        let mut surface = RecordingSurface::new();
        vis.initialize(snapshot(), &FixedViewport::new(800.0, 600.0), &mut surface);

        let person = vis.snapshot().unwrap().person(4).unwrap().clone();
        let (_, at) = vis.person_positions(&person)[0];
        assert_eq!(vis.person_at(at), Some(4));
        assert_eq!(vis.person_at(Point::new(1.0, 1.0)), None);
    }

    #[test]
    fn draw_person_uses_absolute_coordinates() {
        let mut vis = visualizer();
        let mut surface = RecordingSurface::new();
        vis.initialize(snapshot(), &FixedViewport::new(800.0, 600.0), &mut surface);
        surface.take_commands();

        let person = vis.snapshot().unwrap().person(1).unwrap().clone();
        vis.draw_person(&mut surface, &person).unwrap();

        let center = vis.club_position(1).unwrap();
        let offset = vis.offsets().get(1, 1).unwrap();
        let local = offset.local_position(vis.layout().unwrap().club_radius);
        match &surface.commands()[0] {
            DrawCommand::Circle { center: at, .. } => {
                assert!(at.distance(Point::new(center.x + local.x, center.y + local.y)) < 1e-3);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn resize_keeps_offsets_and_moves_clubs() {
        let mut vis = visualizer();
        let mut surface = RecordingSurface::new();
        vis.initialize(snapshot(), &FixedViewport::new(800.0, 600.0), &mut surface);
        let before = vis.offsets().get(2, 1).unwrap();
        let center_before = vis.club_position(1).unwrap();

        vis.resize(&FixedViewport::new(400.0, 300.0), &mut surface);
        assert_eq!(vis.offsets().get(2, 1), Some(before));
        assert_ne!(vis.club_position(1), Some(center_before));
    }

    #[test]
    fn zero_rebalance_ratio_still_lays_out() {
        let mut settings = VisualizerSettings::default();
        settings.rebalance_ratio = 0.0;
        let mut vis = GridVisualizer::with_rng(settings, LegendState::default(), StdRng::seed_from_u64(1));
        assert_eq!(vis.settings().rebalance_ratio, 1.0);

        let mut surface = RecordingSurface::new();
        vis.initialize(snapshot(), &FixedViewport::new(800.0, 600.0), &mut surface);
        let layout = vis.layout().unwrap();
        assert!(layout.rows as f32 <= layout.columns as f32);

        let mut changed = vis.settings().clone();
        changed.rebalance_ratio = -2.0;
        vis.set_settings(changed);
        assert_eq!(vis.settings().rebalance_ratio, 1.0);
        vis.resize(&FixedViewport::new(800.0, 600.0), &mut surface);
        assert!(vis.layout().is_some());
    }

    #[test]
    fn draw_member_paints_relative_to_translated_origin() {
        let mut vis = visualizer();
        let mut surface = RecordingSurface::new();
        vis.initialize(snapshot(), &FixedViewport::new(800.0, 600.0), &mut surface);
        surface.take_commands();

        let snapshot = vis.snapshot().unwrap().clone();
        let club = snapshot.club(1).unwrap();
        let member = snapshot.person(4).unwrap();
        let outsider = snapshot.person(5).unwrap();

        surface.save();
        surface.translate(100.0, 50.0);
        vis.draw_member(&mut surface, club, member).unwrap();
        vis.draw_member(&mut surface, club, outsider).unwrap();
        surface.restore();

        let local = vis.offsets().get(4, 1).unwrap().local_position(vis.layout().unwrap().club_radius);
        assert_eq!(surface.commands().len(), 1);
        match &surface.commands()[0] {
            DrawCommand::Circle { center, fill, .. } => {
                assert!(center.distance(Point::new(100.0 + local.x, 50.0 + local.y)) < 1e-3);
                assert_eq!(*fill, Some(vis.settings().b_color()));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn reseed_replaces_offsets() {
        let mut vis = visualizer();
        let mut surface = RecordingSurface::new();
        vis.initialize(snapshot(), &FixedViewport::new(800.0, 600.0), &mut surface);
        let before = vis.offsets().get(3, 1).unwrap();
        vis.reseed_offsets();
        assert_eq!(vis.offsets().len(), 4);
        assert_ne!(vis.offsets().get(3, 1), Some(before));
    }
}
