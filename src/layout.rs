// Clubgrid - Club Membership Visualizer
// Copyright (c) 2025 Filipe da Veiga Ventura Alves
// Licensed under MIT License

//! Grid placement of clubs and stable polar offsets of their members.

use crate::model::{ClubId, PersonId, Snapshot};
use crate::settings::VisualizerSettings;
use crate::surface::Point;
use rand::Rng;
use std::collections::HashMap;
use std::f32::consts::TAU;

/// Grid geometry for one `initialize`: constant until the next one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub width: f32,
    pub height: f32,
    pub columns: usize,
    pub rows: usize,
    pub cell_width: f32,
    pub cell_height: f32,
    pub club_radius: f32,
    pub min_padding: f32,
    pub horizontal_padding: f32,
    pub vertical_padding: f32,
}

/// Columns and rows for `club_count` cells on a `width / height` surface.
///
/// Starts from `ceil(sqrt(n * aspect))` columns; while the grid is taller than
/// `rebalance_ratio` rows per column, adds a column. Ratios below 1 are
/// treated as 1 so the loop ends once there is a single row.
pub fn grid_dimensions(club_count: usize, aspect_ratio: f32, rebalance_ratio: f32) -> (usize, usize) {
    if club_count == 0 {
        return (0, 0);
    }
    let rebalance_ratio = rebalance_ratio.max(1.0);
    let mut columns = ((club_count as f32 * aspect_ratio).sqrt().ceil() as usize).max(1);
    let mut rows = club_count.div_ceil(columns);
    while rows as f32 > columns as f32 * rebalance_ratio {
        columns += 1;
        rows = club_count.div_ceil(columns);
    }
    (columns, rows)
}

impl GridLayout {
    /// `None` when there is nothing to lay out: no clubs, or a surface without
    /// a usable size.
    pub fn compute(
        width: f32,
        height: f32,
        club_count: usize,
        settings: &VisualizerSettings,
    ) -> Option<GridLayout> {
        if club_count == 0 || !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return None;
        }

        let (columns, rows) = grid_dimensions(club_count, width / height, settings.rebalance_ratio);

        let min_padding = width.min(height) * settings.padding_fraction;
        let cell_width = (width - min_padding * 2.0) / columns as f32;
        let cell_height = (height - min_padding * 2.0) / rows as f32;
        let club_radius = cell_width.min(cell_height) * settings.club_radius_fraction;
        if club_radius <= 0.0 {
            return None;
        }

        Some(GridLayout {
            width,
            height,
            columns,
            rows,
            cell_width,
            cell_height,
            club_radius,
            min_padding,
            horizontal_padding: (width - cell_width * columns as f32) / 2.0,
            vertical_padding: (height - cell_height * rows as f32) / 2.0,
        })
    }

    /// Center of the `index`-th club, row-major.
    pub fn center(&self, index: usize) -> Point {
        let row = index / self.columns;
        let col = index % self.columns;
        Point::new(
            self.horizontal_padding + self.cell_width * (0.5 + col as f32),
            self.vertical_padding + self.cell_height * (0.5 + row as f32),
        )
    }

    pub fn min_dimension(&self) -> f32 {
        self.width.min(self.height)
    }

    /// Centers for `snapshot`'s clubs in stored order.
    pub fn club_positions(&self, snapshot: &Snapshot) -> HashMap<ClubId, Point> {
        snapshot
            .clubs()
            .iter()
            .enumerate()
            .map(|(i, club)| (club.id, self.center(i)))
            .collect()
    }
}

/// A member's fixed place inside a club circle. The radius is kept as a
/// fraction of the club radius so the dot stays inside the circle when the
/// layout is recomputed for a different surface size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarOffset {
    pub angle: f32,
    pub radius_fraction: f32,
}

impl PolarOffset {
    pub fn radius(&self, club_radius: f32) -> f32 {
        self.radius_fraction * club_radius
    }

    /// Cartesian position relative to the club center.
    pub fn local_position(&self, club_radius: f32) -> Point {
        let r = self.radius(club_radius);
        Point::new(self.angle.cos() * r, self.angle.sin() * r)
    }
}

#[derive(Debug, Clone, Default)]
pub struct OffsetStore {
    offsets: HashMap<PersonId, HashMap<ClubId, PolarOffset>>,
}

impl OffsetStore {
    pub fn get(&self, person: PersonId, club: ClubId) -> Option<PolarOffset> {
        self.offsets.get(&person)?.get(&club).copied()
    }

    /// Returns the stored offset for the pair, generating it with `make` only
    /// when absent. The flag reports whether a new entry was created.
    pub fn get_or_insert_with(
        &mut self,
        person: PersonId,
        club: ClubId,
        make: impl FnOnce() -> PolarOffset,
    ) -> (PolarOffset, bool) {
        let clubs = self.offsets.entry(person).or_default();
        let mut created = false;
        let offset = *clubs.entry(club).or_insert_with(|| {
            created = true;
            make()
        });
        (offset, created)
    }

    pub fn len(&self) -> usize {
        self.offsets.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.offsets.clear();
    }

    /// Seeds an offset for every (member, club) pair of `snapshot` that has
    /// none yet. Returns how many were generated.
    pub fn seed<R: Rng + ?Sized>(
        &mut self,
        snapshot: &Snapshot,
        settings: &VisualizerSettings,
        rng: &mut R,
    ) -> usize {
        let lo = settings.offset_min_fraction.min(settings.offset_max_fraction);
        let hi = settings.offset_min_fraction.max(settings.offset_max_fraction);
        let mut generated = 0;
        for club in snapshot.clubs() {
            for &person in &club.members {
                let (_, created) = self.get_or_insert_with(person, club.id, || PolarOffset {
                    angle: rng.gen_range(0.0..TAU),
                    radius_fraction: rng.gen_range(lo..=hi),
                });
                if created {
                    generated += 1;
                }
            }
        }
        generated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Club, Person, Trait};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn clubs(n: u32) -> Snapshot {
        Snapshot::new((1..=n).map(|id| Club { id, members: vec![] }).collect(), vec![])
    }

    #[test]
    fn four_clubs_on_800_by_600() {
        let settings = VisualizerSettings::default();
        let layout = GridLayout::compute(800.0, 600.0, 4, &settings).unwrap();
        assert_eq!((layout.columns, layout.rows), (3, 2));
        assert!((layout.min_padding - 30.0).abs() < 1e-4);
        assert!((layout.cell_width - 740.0 / 3.0).abs() < 1e-3);
        assert!((layout.cell_height - 270.0).abs() < 1e-3);
        assert!((layout.club_radius - 0.3 * 740.0 / 3.0).abs() < 1e-3);

        let positions = layout.club_positions(&clubs(4));
        let fourth = positions[&4];
        assert!((fourth.x - (30.0 + layout.cell_width * 0.5)).abs() < 1e-3);
        assert!((fourth.y - (30.0 + 270.0 * 1.5)).abs() < 1e-3);
    }

    #[test]
    fn tall_surface_rebalances_columns() {
        // sqrt(10 * 0.25) rounds up to 2 columns; 5 rows > 1.5 * 2
        assert_eq!(grid_dimensions(10, 0.25, 1.5), (3, 4));
    }

    #[test]
    fn non_positive_rebalance_ratio_terminates() {
        assert_eq!(grid_dimensions(1, 4.0 / 3.0, 0.0), (2, 1));
        assert_eq!(grid_dimensions(6, 1.0, -3.0), (3, 2));
        assert_eq!(grid_dimensions(6, 1.0, f32::NAN), (3, 2));
    }

    #[test]
    fn single_club_is_centered() {
        let settings = VisualizerSettings::default();
        let layout = GridLayout::compute(300.0, 300.0, 1, &settings).unwrap();
        assert_eq!((layout.columns, layout.rows), (1, 1));
        assert!(layout.center(0).distance(Point::new(150.0, 150.0)) < 1e-3);
    }

    #[test]
    fn degenerate_surfaces_have_no_layout() {
        let settings = VisualizerSettings::default();
        assert!(GridLayout::compute(0.0, 600.0, 3, &settings).is_none());
        assert!(GridLayout::compute(800.0, -1.0, 3, &settings).is_none());
        assert!(GridLayout::compute(f32::NAN, 600.0, 3, &settings).is_none());
        assert!(GridLayout::compute(800.0, 600.0, 0, &settings).is_none());
    }

    #[test]
    fn offsets_are_generated_once() {
        let snapshot = Snapshot::new(
            vec![Club { id: 1, members: vec![1, 2] }, Club { id: 2, members: vec![2] }],
            vec![
                Person { id: 1, kind: Trait::R, clubs: vec![1] },
                Person { id: 2, kind: Trait::B, clubs: vec![1, 2] },
            ],
        );
        let settings = VisualizerSettings::default();
        let mut rng = StdRng::seed_from_u64(9);
        let mut store = OffsetStore::default();

        assert_eq!(store.seed(&snapshot, &settings, &mut rng), 3);
        let before = store.get(2, 2).unwrap();
        assert_eq!(store.seed(&snapshot, &settings, &mut rng), 0);
        assert_eq!(store.get(2, 2), Some(before));
        assert_eq!(store.len(), 3);
        assert!(store.get(1, 2).is_none());
    }

    #[test]
    fn get_or_insert_keeps_existing_entry() {
        let mut store = OffsetStore::default();
        let first = PolarOffset { angle: 1.0, radius_fraction: 0.5 };
        let (_, created) = store.get_or_insert_with(1, 1, || first);
        assert!(created);
        let (kept, created) =
            store.get_or_insert_with(1, 1, || PolarOffset { angle: 2.0, radius_fraction: 0.2 });
        assert!(!created);
        assert_eq!(kept, first);
    }

    #[test]
    fn local_position_scales_with_club_radius() {
        let offset = PolarOffset { angle: 0.0, radius_fraction: 0.5 };
        assert_eq!(offset.local_position(40.0), Point::new(20.0, 0.0));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_grid_covers_all_clubs(n in 1usize..500, aspect in 0.05f32..20.0) {
                let (cols, rows) = grid_dimensions(n, aspect, 1.5);
                prop_assert!(cols * rows >= n);
                prop_assert!(rows as f32 <= 1.5 * cols as f32 + 1.0);
            }

            #[test]
            fn prop_centers_stay_inside_surface(
                n in 1usize..120,
                width in 50.0f32..3000.0,
                height in 50.0f32..3000.0,
            ) {
                let settings = VisualizerSettings::default();
                let layout = GridLayout::compute(width, height, n, &settings).unwrap();
                let margin = layout.club_radius / 2.0;
                for i in 0..n {
                    let c = layout.center(i);
                    prop_assert!(c.x >= margin && c.x <= width - margin);
                    prop_assert!(c.y >= margin && c.y <= height - margin);
                }
            }

            #[test]
            fn prop_offsets_within_ring(seed in any::<u64>(), club_radius in 1.0f32..500.0) {
                let snapshot = Snapshot::new(
                    vec![Club { id: 1, members: (1..=20).collect() }],
                    (1..=20).map(|id| Person { id, kind: Trait::R, clubs: vec![1] }).collect(),
                );
                let settings = VisualizerSettings::default();
                let mut store = OffsetStore::default();
                store.seed(&snapshot, &settings, &mut StdRng::seed_from_u64(seed));
                for id in 1..=20 {
                    let offset = store.get(id, 1).unwrap();
                    let r = offset.radius(club_radius);
                    prop_assert!(r >= 0.10 * club_radius - 1e-4);
                    prop_assert!(r <= 0.85 * club_radius + 1e-4);
                    prop_assert!(offset.angle >= 0.0 && offset.angle < TAU);
                }
            }
        }
    }
}
