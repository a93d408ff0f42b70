//! Async driver for a [`Visualizer`]: a command channel plus a frame ticker.

use std::path::Path;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::color::Rgb;
use crate::config::VisualizerConfig;
use crate::loader::{load_sources, SourceSet, SourceSpec};
use crate::visualizer::{Presenter, Visualizer};

const COMMAND_BUFFER: usize = 64;

/// A user intent, or a finished background load.
#[derive(Debug)]
pub enum Command {
    SetWallColor(Rgb),
    SetSurfaceColor(Rgb),
    SetWallHex(String),
    SetSurfaceHex(String),
    SetLightOn(bool),
    ApplyPreset(String),
    AttachSources(SourceSet),
    Shutdown,
}

/// Drives `visualizer` until `Shutdown` arrives or every sender is dropped,
/// then hands it back.
pub async fn run<P: Presenter>(
    mut visualizer: Visualizer<P>,
    mut commands: mpsc::Receiver<Command>,
) -> Visualizer<P> {
    let mut ticker = tokio::time::interval(visualizer.config().frame_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                None | Some(Command::Shutdown) => break,
                Some(command) => {
                    if let Err(err) = visualizer.handle(command, Instant::now().into_std()) {
                        log::warn!("Ignoring visualizer command: {}", err);
                    }
                }
            },
            tick = ticker.tick() => {
                visualizer.frame(tick.into_std());
            }
        }
    }

    log::info!(
        "Visualizer loop stopped after {} renders",
        visualizer.render_count()
    );
    visualizer
}

/// Starts a visualizer on the current tokio runtime: the placeholder goes up
/// at once, the configured sources load from `asset_root` in the background,
/// and the returned sender feeds the loop.
pub fn launch<P>(
    config: VisualizerConfig,
    asset_root: &Path,
    presenter: P,
) -> (mpsc::Sender<Command>, JoinHandle<Visualizer<P>>)
where
    P: Presenter + Send + 'static,
{
    let specs = config.source_specs(asset_root);
    let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
    let visualizer = Visualizer::new(config.clone(), presenter);

    spawn_source_load(specs, config, commands.clone());
    let task = tokio::spawn(run(visualizer, receiver));
    (commands, task)
}

/// Loads `specs` in the background and posts the result to the loop. When
/// nothing loads, nothing is sent and the placeholder stays up.
pub fn spawn_source_load(
    specs: Vec<SourceSpec>,
    config: VisualizerConfig,
    commands: mpsc::Sender<Command>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match load_sources(specs, &config).await {
            Ok(sources) => {
                if commands.send(Command::AttachSources(sources)).await.is_err() {
                    log::warn!("Visualizer loop closed before sources arrived");
                }
            }
            Err(err) => log::warn!("Visualizer staying on placeholder: {}", err),
        }
    })
}
