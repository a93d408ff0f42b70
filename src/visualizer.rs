//! The interaction surface: user intents come in, frames go out through a
//! [`Presenter`].
//!
//! Colour changes never render synchronously. They update the state and arm
//! the [`RenderScheduler`]; the host calls [`Visualizer::frame`] once per
//! display frame and at most one composite happens there. A lighting toggle
//! hides the output, waits for the cross-fade delay, then renders and shows
//! it again.

use std::path::Path;
use std::time::Instant;

use crate::classifier::RegionClassifier;
use crate::color::{active_preset, find_preset, hex_to_rgb, ColorPreset, Rgb};
use crate::compositor::composite;
use crate::config::VisualizerConfig;
use crate::error::VizError;
use crate::loader::SourceSet;
use crate::pixel_buffer::PixelBuffer;
use crate::runtime::Command;
use crate::scheduler::{CrossFade, RenderScheduler};
use crate::state::VisualizerState;

/// Where rendered frames go. The visualizer owns exactly one.
pub trait Presenter {
    fn present(&mut self, frame: &PixelBuffer);

    /// 0.0 hides the output, 1.0 shows it.
    fn set_opacity(&mut self, opacity: f32);

    /// Marks the swatch matching the wall colour, or clears the marker.
    fn highlight_preset(&mut self, _preset: Option<&ColorPreset>) {}
}

/// Keeps the last presented frame in memory. Useful headless and in tests.
#[derive(Debug, Clone)]
pub struct SnapshotPresenter {
    last: Option<PixelBuffer>,
    opacity: f32,
    presents: usize,
    highlighted: Option<String>,
}

impl Default for SnapshotPresenter {
    fn default() -> Self {
        Self {
            last: None,
            opacity: 1.0,
            presents: 0,
            highlighted: None,
        }
    }
}

impl SnapshotPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<&PixelBuffer> {
        self.last.as_ref()
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn present_count(&self) -> usize {
        self.presents
    }

    /// Name of the highlighted preset swatch.
    pub fn highlighted(&self) -> Option<&str> {
        self.highlighted.as_deref()
    }

    pub fn save_png(&self, path: &Path) -> Result<(), VizError> {
        let frame = self
            .last
            .as_ref()
            .ok_or_else(|| VizError::Encode("no frame has been presented".to_string()))?;
        let image = frame
            .to_image()
            .ok_or_else(|| VizError::Encode("frame buffer has the wrong size".to_string()))?;
        image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| VizError::Encode(format!("Failed to write {}: {}", path.display(), e)))
    }
}

impl Presenter for SnapshotPresenter {
    fn present(&mut self, frame: &PixelBuffer) {
        self.last = Some(frame.clone());
        self.presents += 1;
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    fn highlight_preset(&mut self, preset: Option<&ColorPreset>) {
        self.highlighted = preset.map(|preset| preset.name.clone());
    }
}

pub struct Visualizer<P: Presenter> {
    config: VisualizerConfig,
    state: VisualizerState,
    sources: Option<SourceSet>,
    classifier: RegionClassifier,
    scheduler: RenderScheduler,
    fade: CrossFade,
    output: PixelBuffer,
    renders: u64,
    presenter: P,
}

impl<P: Presenter> Visualizer<P> {
    /// Shows the placeholder and highlights the preset matching the initial
    /// wall colour. Nothing renders until sources are attached.
    pub fn new(config: VisualizerConfig, mut presenter: P) -> Self {
        let placeholder = &config.placeholder;
        let fill = placeholder.color;
        let output = PixelBuffer::filled(
            placeholder.width,
            placeholder.height,
            [fill.red, fill.green, fill.blue, 255],
        );
        presenter.present(&output);
        presenter.set_opacity(1.0);

        let state = VisualizerState::from_config(&config);
        presenter.highlight_preset(active_preset(&config.presets, state.wall_color));

        Self {
            classifier: RegionClassifier::new(config.strategy),
            fade: CrossFade::new(config.fade_delay()),
            scheduler: RenderScheduler::new(),
            sources: None,
            renders: 0,
            config,
            state,
            output,
            presenter,
        }
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    pub fn state(&self) -> &VisualizerState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state.ready
    }

    /// The frame currently on display (the placeholder before the first
    /// successful render).
    pub fn output(&self) -> &PixelBuffer {
        &self.output
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn render_count(&self) -> u64 {
        self.renders
    }

    pub fn is_render_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_hidden()
    }

    pub fn active_preset(&self) -> Option<&ColorPreset> {
        active_preset(&self.config.presets, self.state.wall_color)
    }

    /// Installs a freshly loaded source set and renders it straight away.
    pub fn attach_sources(&mut self, sources: SourceSet) {
        let (width, height) = sources.dimensions();
        log::info!(
            "Attached {} visualizer sources at {}x{}",
            sources.loaded_count(),
            width,
            height
        );
        self.sources = Some(sources);
        self.state.ready = true;
        self.render();
    }

    pub fn set_wall_color(&mut self, color: Rgb) {
        self.state.wall_color = color;
        self.presenter
            .highlight_preset(active_preset(&self.config.presets, color));
        self.scheduler.request();
    }

    pub fn set_surface_color(&mut self, color: Rgb) {
        self.state.surface_color = color;
        self.scheduler.request();
    }

    pub fn set_wall_hex(&mut self, hex: &str) -> Result<(), VizError> {
        let color = hex_to_rgb(hex)?;
        self.set_wall_color(color);
        Ok(())
    }

    pub fn set_surface_hex(&mut self, hex: &str) -> Result<(), VizError> {
        let color = hex_to_rgb(hex)?;
        self.set_surface_color(color);
        Ok(())
    }

    /// Sets the wall colour from a named swatch.
    pub fn apply_preset(&mut self, name: &str) -> Result<(), VizError> {
        let color = find_preset(&self.config.presets, name)
            .map(|preset| preset.color)
            .ok_or_else(|| VizError::UnknownPreset(name.to_string()))?;
        self.set_wall_color(color);
        Ok(())
    }

    /// Flips the lighting. The state changes now; the output is hidden and
    /// re-rendered once the fade delay has passed.
    pub fn set_light_on(&mut self, on: bool, now: Instant) {
        if self.state.light_on == on {
            return;
        }
        log::debug!("Light {}", if on { "on" } else { "off" });
        self.state.light_on = on;
        self.presenter.set_opacity(0.0);
        self.fade.start(now);
    }

    /// Runs one display frame. Returns whether a new image was presented.
    pub fn frame(&mut self, now: Instant) -> bool {
        let mut presented = false;
        if self.fade.poll(now) {
            presented = self.render();
            self.presenter.set_opacity(1.0);
        }
        // A fade render already covers any pending request.
        if self.scheduler.begin_frame() && !presented {
            presented = self.render();
        }
        presented
    }

    pub fn handle(&mut self, command: Command, now: Instant) -> Result<(), VizError> {
        match command {
            Command::SetWallColor(color) => self.set_wall_color(color),
            Command::SetSurfaceColor(color) => self.set_surface_color(color),
            Command::SetWallHex(hex) => self.set_wall_hex(&hex)?,
            Command::SetSurfaceHex(hex) => self.set_surface_hex(&hex)?,
            Command::SetLightOn(on) => self.set_light_on(on, now),
            Command::ApplyPreset(name) => self.apply_preset(&name)?,
            Command::AttachSources(sources) => self.attach_sources(sources),
            Command::Shutdown => {}
        }
        Ok(())
    }

    /// Composites the current state. On any failure the previous output
    /// stays on display.
    fn render(&mut self) -> bool {
        if !self.state.ready {
            return false;
        }
        let Some(sources) = self.sources.as_ref() else {
            return false;
        };

        let started = Instant::now();
        let mask = self.classifier.classify(sources);
        match composite(sources, mask, &self.state) {
            Ok(frame) => {
                self.output = frame;
                self.renders += 1;
                self.presenter.present(&self.output);
                log::debug!(
                    "Rendered frame {} in {}ms",
                    self.renders,
                    started.elapsed().as_millis()
                );
                true
            }
            Err(err) => {
                log::warn!("Render skipped, keeping previous frame: {}", err);
                false
            }
        }
    }
}
