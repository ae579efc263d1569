use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use game_frame_analyzer::pipeline::services::OpenAiVisionAnalyzer;
use game_frame_analyzer::{
    init_logging, AppError, Configuration, PipelineReport, ProcessingPipeline, ProgressEvent,
};

/// Game scene analysis from sampled frames
#[derive(Parser)]
#[command(name = "game-frame-analyzer", version)]
#[command(about = "Identify the game, characters and situation shown in gameplay screenshots")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (TOML), layered over the defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long, global = true, default_value = "false")]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze hand-picked screenshots and combine the results
    Images {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let configuration = Configuration::load(cli.config.as_deref())?;
    init_logging(&configuration.logging)?;

    let Commands::Images { files } = cli.command;
    let mut images = Vec::with_capacity(files.len());
    for path in &files {
        images.push(Bytes::from(tokio::fs::read(path).await?));
    }

    let (sender, mut receiver) = mpsc::channel(configuration.analysis.progress_buffer);
    let analyzer = OpenAiVisionAnalyzer::new(&configuration.analysis)?;
    let mut pipeline = ProcessingPipeline::builder(configuration)
        .analyzer(Arc::new(analyzer))
        .progress(sender)
        .build()?;

    let progress = tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            match event {
                ProgressEvent::Captured {
                    index, description, ..
                } => info!("Frame {}: {}", index + 1, description),
                ProgressEvent::Analyzed { index, outcome } => {
                    info!("Frame {}: {}", index + 1, outcome.description())
                }
            }
        }
    });

    let report = pipeline.analyze_images(images).await?;
    drop(pipeline);
    if let Err(e) = progress.await {
        warn!("Progress reporter stopped abnormally: {}", e);
    }

    if cli.json {
        print_json(&report)?;
    } else {
        print_text(&report, &files);
    }
    Ok(())
}

fn print_text(report: &PipelineReport, files: &[PathBuf]) {
    for (outcome, path) in report.outcomes().iter().zip(files) {
        println!("{}: {}", path.display(), outcome.description());
    }
    println!();
    match report.consensus() {
        Ok(consensus) => println!("{consensus}"),
        Err(e) => println!("No combined analysis: {e}"),
    }
}

fn print_json(report: &PipelineReport) -> Result<(), AppError> {
    let frames: Vec<_> = report
        .outcomes()
        .iter()
        .enumerate()
        .map(|(index, outcome)| {
            json!({
                "index": index,
                "description": outcome.description(),
                "analysis": outcome.result(),
                "error": outcome.error().map(|e| e.to_string()),
            })
        })
        .collect();
    let document = json!({
        "run_id": report.run_id().to_string(),
        "frames": frames,
        "consensus": report.consensus().ok(),
    });
    let text = serde_json::to_string_pretty(&document)
        .map_err(|e| AppError::Pipeline(format!("failed to render report: {e}")))?;
    println!("{text}");
    Ok(())
}
