// Clubgrid - Club Membership Visualizer
// Copyright (c) 2025 Filipe da Veiga Ventura Alves
// Licensed under MIT License

//! Renders club membership snapshots of a social simulation: clubs on a grid,
//! members as trait-coloured dots inside each club, and per-club statistics.

pub mod backend;
pub mod layout;
pub mod model;
pub mod settings;
pub mod stats;
pub mod style;
pub mod surface;
pub mod visualizer;

pub use layout::{GridLayout, OffsetStore, PolarOffset};
pub use model::{Club, ClubId, Person, PersonId, Snapshot, Trait, TraitCounts};
pub use settings::VisualizerSettings;
pub use surface::{Color, DrawSurface, FixedViewport, Point, Stroke, TextAlign, ViewportProvider};
pub use visualizer::{GridVisualizer, LegendSink, LegendState, Renderer};
