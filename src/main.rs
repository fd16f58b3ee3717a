// Clubgrid - Club Membership Visualizer
// Copyright (c) 2025 Filipe da Veiga Ventura Alves
// Licensed under MIT License

use anyhow::Context;
use clap::Parser;
use clubgrid::backend::{EguiSurface, SvgSurface};
use clubgrid::{
    DrawSurface, FixedViewport, GridVisualizer, LegendState, PersonId, Point, Renderer, Snapshot,
    VisualizerSettings, ViewportProvider,
};
use egui_wgpu::ScreenDescriptor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use winit::{
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

#[derive(Parser)]
#[command(name = "clubgrid")]
#[command(about = "Interactive viewer for club membership snapshots", long_about = None)]
struct Cli {
    /// Snapshot JSON file. A demo population is generated when omitted
    snapshot: Option<PathBuf>,

    /// Settings JSON file
    #[arg(long)]
    settings: Option<PathBuf>,
}

// ============================================================================
// GPU PRESENTATION
// ============================================================================

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    egui_renderer: egui_wgpu::Renderer,
}

impl GpuState {
    fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Clubgrid Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let surface_caps = surface.get_capabilities(&adapter);
        // egui blends in gamma space and expects a non-sRGB target.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no texture formats")?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            egui_renderer,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.surface_config.width = new_size.width;
            self.surface_config.height = new_size.height;
            self.surface.configure(&self.device, &self.surface_config);
        }
    }

    fn render(
        &mut self,
        clipped_primitives: Vec<egui::ClippedPrimitive>,
        textures_delta: egui::TexturesDelta,
        screen_descriptor: ScreenDescriptor,
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui Encoder"),
            });

        let callback_buffers = self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let mut rpass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut rpass, &clipped_primitives, &screen_descriptor);
        }

        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(
            callback_buffers
                .into_iter()
                .chain(std::iter::once(encoder.finish())),
        );
        output.present();

        Ok(())
    }
}

// ============================================================================
// VIEWER UI
// ============================================================================

/// The central panel, in egui points.
struct PanelViewport {
    width: f32,
    height: f32,
    pixels_per_point: f32,
}

impl ViewportProvider for PanelViewport {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn pixel_ratio(&self) -> f32 {
        self.pixels_per_point
    }
}

#[inline]
fn rgb_to_color32(rgb: [u8; 3]) -> egui::Color32 {
    egui::Color32::from_rgb(rgb[0], rgb[1], rgb[2])
}

struct ViewerApp {
    visualizer: GridVisualizer<LegendState>,
    settings: VisualizerSettings,
    saved_settings: VisualizerSettings,
    settings_path: PathBuf,
    rng: StdRng,
    pending_snapshot: Option<Snapshot>,
    source: Option<PathBuf>,
    selected: Option<PersonId>,
    last_viewport: FixedViewport,
    status: Option<String>,
}

impl ViewerApp {
    fn new(cli: Cli) -> Self {
        let settings_path = cli.settings.unwrap_or_else(VisualizerSettings::default_path);
        let settings = VisualizerSettings::load_or_default(&settings_path);
        let mut rng = settings.make_rng();
        let offset_rng = derive_rng(&mut rng);

        let mut status = None;
        let snapshot = match cli.snapshot.as_deref().map(Snapshot::load_from_disk) {
            Some(Ok(snapshot)) => Some(snapshot),
            Some(Err(err)) => {
                log::error!("Failed to load snapshot: {err:?}");
                status = Some(format!("Failed to load snapshot: {err}"));
                None
            }
            None => None,
        };
        let source = snapshot.as_ref().and(cli.snapshot);
        let snapshot = snapshot.unwrap_or_else(|| demo_population(&settings, &mut rng));

        Self {
            visualizer: GridVisualizer::with_rng(settings.clone(), LegendState::default(), offset_rng),
            saved_settings: settings.clone(),
            settings,
            settings_path,
            rng,
            pending_snapshot: Some(snapshot),
            source,
            selected: None,
            last_viewport: FixedViewport::new(0.0, 0.0),
            status,
        }
    }

    fn ui(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("clubgrid_controls")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| self.side_panel(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::WHITE))
            .show(ctx, |ui| self.canvas(ui));
    }

    fn side_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Clubgrid");
        match &self.source {
            Some(path) => ui.label(format!("Snapshot: {}", path.display())),
            None => ui.label("Snapshot: demo population"),
        };
        ui.separator();

        ui.label("Legend");
        let counts = self.visualizer.legend().counts.unwrap_or_default();
        ui.colored_label(rgb_to_color32(self.settings.r_color), format!("● R: {}", counts.r));
        ui.colored_label(rgb_to_color32(self.settings.b_color), format!("● B: {}", counts.b));
        if let Some(snapshot) = self.visualizer.snapshot() {
            ui.label(format!(
                "{} clubs, {} people",
                snapshot.clubs().len(),
                snapshot.people().len()
            ));
        }
        if let Some(layout) = self.visualizer.layout() {
            ui.label(format!("Grid: {} x {}", layout.columns, layout.rows));
        }
        match self.settings.seed() {
            Some(seed) => ui.label(format!("Seed: {seed}")),
            None => ui.label("Seed: random"),
        };

        ui.separator();
        self.selection_info(ui);

        ui.separator();
        if ui.button("Open snapshot...").clicked() {
            self.open_snapshot();
        }
        if ui.button("Export SVG...").clicked() {
            self.export_svg();
        }
        if ui.button("New population").clicked() {
            self.pending_snapshot = Some(demo_population(&self.settings, &mut self.rng));
            self.source = None;
            self.selected = None;
        }
        if ui.button("Re-seed offsets").clicked() {
            self.visualizer.reseed_offsets();
        }

        ui.separator();
        ui.label("Layout");
        let mut changed = false;
        changed |= ui
            .add(egui::Slider::new(&mut self.settings.club_radius_fraction, 0.1..=0.5).text("Club radius"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut self.settings.padding_fraction, 0.0..=0.2).text("Padding"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut self.settings.dot_radius_fraction, 0.002..=0.03).text("Dot size"))
            .changed();
        ui.label("Demo population");
        changed |= ui
            .add(egui::Slider::new(&mut self.settings.demo_clubs, 1..=64).text("Clubs"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut self.settings.demo_people, 0..=2000).text("People"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut self.settings.demo_r_share, 0.0..=1.0).text("R share"))
            .changed();
        if changed {
            self.settings.sanitize();
            self.visualizer.set_settings(self.settings.clone());
        }

        if let Some(status) = &self.status {
            ui.separator();
            ui.label(status);
        }
    }

    fn selection_info(&mut self, ui: &mut egui::Ui) {
        let Some(id) = self.selected else {
            ui.label("Click a dot to select a person");
            return;
        };
        let Some(person) = self.visualizer.snapshot().and_then(|s| s.person(id)) else {
            self.selected = None;
            return;
        };
        let clubs: Vec<String> = person.clubs.iter().map(|c| c.to_string()).collect();
        ui.label(format!("Person {} ({})", person.id, person.kind.label()));
        ui.label(format!("Clubs: {}", clubs.join(", ")));
        if ui.button("Clear selection").clicked() {
            self.selected = None;
        }
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::click());
        let rect = response.rect;
        let viewport = PanelViewport {
            width: rect.width(),
            height: rect.height(),
            pixels_per_point: ui.ctx().pixels_per_point(),
        };
        self.last_viewport =
            FixedViewport::new(viewport.width, viewport.height).with_pixel_ratio(viewport.pixels_per_point);

        let mut surface = EguiSurface::new(painter, rect);
        match self.pending_snapshot.take() {
            Some(snapshot) => self.visualizer.initialize(snapshot, &viewport, &mut surface),
            None => {
                self.visualizer.resize(&viewport, &mut surface);
                self.visualizer.draw(&mut surface);
            }
        }

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let local = Point::new(pos.x - rect.min.x, pos.y - rect.min.y);
                self.selected = self.visualizer.person_at(local);
            }
        }
        if let Some(id) = self.selected {
            if let Err(err) = self.visualizer.highlight_person(&mut surface, id) {
                log::error!("Error highlighting person {id}: {err:?}");
            }
        }
    }

    fn open_snapshot(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Snapshot JSON", &["json"])
            .pick_file()
        else {
            return;
        };
        match Snapshot::load_from_disk(&path) {
            Ok(snapshot) => {
                println!("✓ Loaded snapshot: {} clubs, {} people", snapshot.clubs().len(), snapshot.people().len());
                self.pending_snapshot = Some(snapshot);
                self.source = Some(path);
                self.selected = None;
                self.status = None;
            }
            Err(err) => {
                log::error!("Failed to load snapshot {}: {err:?}", path.display());
                self.status = Some(format!("Failed to load snapshot: {err}"));
            }
        }
    }

    fn export_svg(&mut self) {
        let file_name = format!("clubgrid_{}.svg", chrono::Local::now().format("%Y%m%d_%H%M%S"));
        let Some(path) = rfd::FileDialog::new()
            .add_filter("SVG Image", &["svg"])
            .set_file_name(&file_name)
            .save_file()
        else {
            return;
        };
        match self.write_svg(&path) {
            Ok(()) => {
                println!("✓ Exported SVG to {}", path.display());
                self.status = Some(format!("Exported {}", path.display()));
            }
            Err(err) => {
                log::error!("Failed to export SVG: {err:?}");
                self.status = Some(format!("Failed to export SVG: {err}"));
            }
        }
    }

    fn write_svg(&mut self, path: &Path) -> anyhow::Result<()> {
        let mut svg = SvgSurface::new();
        self.visualizer.resize(&self.last_viewport, &mut svg);
        svg.set_visible(true);
        self.visualizer.draw(&mut svg);
        if let Some(id) = self.selected {
            self.visualizer.highlight_person(&mut svg, id)?;
        }
        svg.write_to(path)
    }

    fn persist_settings_if_changed(&mut self) {
        if self.settings == self.saved_settings {
            return;
        }
        match self.settings.save_to_disk(&self.settings_path) {
            Ok(()) => self.saved_settings = self.settings.clone(),
            Err(err) => {
                log::warn!("Failed to save settings {}: {err:?}", self.settings_path.display());
                // Do not retry every frame.
                self.saved_settings = self.settings.clone();
            }
        }
    }
}

/// A child stream seeded from `rng`, so member offsets and demo populations
/// do not share one sequence.
fn derive_rng(rng: &mut StdRng) -> StdRng {
    StdRng::seed_from_u64(rng.gen())
}

fn demo_population(settings: &VisualizerSettings, rng: &mut StdRng) -> Snapshot {
    Snapshot::random(
        settings.demo_clubs,
        settings.demo_people,
        settings.demo_memberships,
        settings.demo_r_share,
        rng,
    )
}

fn main() -> anyhow::Result<()> {
    use env_logger::Env;
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .init();

    let mut app = ViewerApp::new(Cli::parse());

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        event_loop.create_window(
            winit::window::WindowAttributes::default()
                .with_title("Clubgrid")
                .with_inner_size(winit::dpi::LogicalSize::new(1200, 760)),
        )?,
    );

    let mut gpu = GpuState::new(window.clone())?;

    let mut egui_state = egui_winit::State::new(
        egui::Context::default(),
        egui::ViewportId::ROOT,
        &window,
        None,
        None,
        None,
    );

    event_loop.run(move |event, target| match event {
        Event::WindowEvent { event, window_id } if window_id == window.id() => {
            let response = egui_state.on_window_event(&window, &event);
            if response.repaint {
                window.request_redraw();
            }
            if response.consumed {
                return;
            }

            match event {
                WindowEvent::CloseRequested => target.exit(),
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(KeyCode::Escape),
                            state: ElementState::Pressed,
                            ..
                        },
                    ..
                } => target.exit(),
                WindowEvent::Resized(physical_size) => {
                    gpu.resize(physical_size);
                    window.request_redraw();
                }
                WindowEvent::RedrawRequested => {
                    let raw_input = egui_state.take_egui_input(&window);
                    let full_output = egui_state.egui_ctx().run(raw_input, |ctx| app.ui(ctx));

                    egui_state.handle_platform_output(&window, full_output.platform_output);
                    app.persist_settings_if_changed();

                    let clipped_primitives = egui_state
                        .egui_ctx()
                        .tessellate(full_output.shapes, full_output.pixels_per_point);
                    let screen_descriptor = ScreenDescriptor {
                        size_in_pixels: [gpu.surface_config.width, gpu.surface_config.height],
                        pixels_per_point: window.scale_factor() as f32,
                    };

                    match gpu.render(clipped_primitives, full_output.textures_delta, screen_descriptor) {
                        Ok(_) => {}
                        Err(wgpu::SurfaceError::Lost) => gpu.resize(window.inner_size()),
                        Err(wgpu::SurfaceError::Outdated) => {}
                        Err(wgpu::SurfaceError::OutOfMemory) => target.exit(),
                        Err(e) => log::error!("{:?}", e),
                    }
                }
                _ => {}
            }
        }
        Event::AboutToWait => {
            window.request_redraw();
        }
        _ => {}
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_rng_is_reproducible_and_separate() {
        let mut settings = VisualizerSettings::default();
        settings.set_seed(Some(42));

        let mut parent = settings.make_rng();
        let mut child = derive_rng(&mut parent);
        let mut parent_again = settings.make_rng();
        let mut child_again = derive_rng(&mut parent_again);
        assert_eq!(child.gen::<u64>(), child_again.gen::<u64>());

        let mut fresh = settings.make_rng();
        let mut child = derive_rng(&mut settings.make_rng());
        let from_fresh: Vec<u64> = (0..4).map(|_| fresh.gen()).collect();
        let from_child: Vec<u64> = (0..4).map(|_| child.gen()).collect();
        assert_ne!(from_fresh, from_child);
    }
}
