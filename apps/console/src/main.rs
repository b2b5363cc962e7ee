use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use live_core::LiveController;
use pipeline::ConversionPipeline;
use shared::events::ControlNotification;
use storage::ProjectRepository;

mod bridge;
mod config;
mod source;

use bridge::ConsoleCommand;
use source::RasterDirectorySource;

#[derive(Parser, Debug)]
#[command(about = "Operator console for live score-sheet broadcast")]
struct Args {
    /// Project file to open
    #[arg(long)]
    project: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    let project_path = args
        .project
        .canonicalize()
        .with_context(|| format!("project file '{}' not found", args.project.display()))?;
    let project_root = project_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let repository = ProjectRepository::new(&project_root);
    let project = repository
        .load(&project_path)
        .with_context(|| format!("failed to load project '{}'", project_path.display()))?;
    info!(name = %project.name, sheets = project.sheets().len(), "project opened");

    config::remember_recent_project(&mut settings, &project_path);
    if let Err(err) = config::save_settings(&settings) {
        tracing::warn!(%err, "could not persist console settings");
    }

    let pipeline = ConversionPipeline::new(
        Arc::new(RasterDirectorySource::new(&project_root)),
        settings.render_width,
        settings.render_height,
        tokio::runtime::Handle::current(),
    );
    let mut controller = LiveController::new(project, pipeline.clone());
    controller.prefetch_documents();

    let (pipeline_tx, pipeline_rx) = crossbeam_channel::unbounded();
    bridge::forward_pipeline_events(pipeline.subscribe(), pipeline_tx);

    let (command_tx, command_rx) = crossbeam_channel::unbounded();
    bridge::spawn_stdin_reader(command_tx);

    let mut notifications = controller.subscribe();
    println!("scoreflow console: up/down stage, enter confirms, 1-6 select verse,");
    println!("left/right switch sheets, clear blanks output, undo/redo, quit exits.");

    loop {
        crossbeam_channel::select! {
            recv(command_rx) -> command => match command {
                Ok(ConsoleCommand::Operator(event)) => {
                    if let Err(err) = controller.handle_event(event) {
                        println!("rejected: {err}");
                    }
                }
                Ok(ConsoleCommand::Unknown(line)) => {
                    println!("unrecognized command '{line}'");
                }
                Ok(ConsoleCommand::Quit) | Err(_) => break,
            },
            recv(pipeline_rx) -> event => {
                if let Ok(event) = event {
                    controller.absorb_pipeline_event(event);
                }
            },
        }
        print_notifications(&mut notifications);
    }

    repository
        .save(controller.project(), Some(&project_path))
        .context("failed to save project on exit")?;
    info!("project saved; goodbye");
    Ok(())
}

fn print_notifications(
    rx: &mut tokio::sync::broadcast::Receiver<ControlNotification>,
) {
    while let Ok(notification) = rx.try_recv() {
        match notification {
            ControlNotification::PreviewChanged { preview, frame } => match preview {
                Some(target) => println!(
                    "preview: {} @ {}{}",
                    frame.overlay.as_deref().unwrap_or("(untitled)"),
                    target.verse,
                    if frame.image.is_some() { "" } else { " [no imagery yet]" }
                ),
                None => println!("preview: (empty)"),
            },
            ControlNotification::LiveChanged { live, frame } => println!(
                "LIVE: {} @ {}{}",
                frame.overlay.as_deref().unwrap_or("(untitled)"),
                live.verse,
                if frame.image.is_some() { "" } else { " [placeholder]" }
            ),
            ControlNotification::LiveCleared => println!("LIVE: cleared"),
            ControlNotification::EditRejected { fault } => {
                println!("edit rejected: {}", fault.message);
            }
        }
    }
}
