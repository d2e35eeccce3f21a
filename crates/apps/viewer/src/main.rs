use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use viewer::{FrameCounter, JsonLines, Playback, Script, ViewHost, ViewerConfig, replay};

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay a gesture script against the map camera host")]
struct Args {
    /// Gesture script (JSON object with "events", or a bare event array)
    script: PathBuf,

    /// Viewer configuration (JSON); demo page defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write every rendered frame to stdout as JSON lines
    #[arg(long)]
    frames: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    let script = Script::load(&args.script)?;
    info!(
        script = script.name.as_deref().unwrap_or("<unnamed>"),
        events = script.events.len(),
        "replaying"
    );

    let mut host = ViewHost::new(&config);
    let mut playback = Playback::new(config.frame_rate_hz);

    let summary = if args.frames {
        let mut sink = JsonLines::new(io::stdout().lock());
        replay(&mut host, &script.events, &mut playback, &mut sink)?
    } else {
        let mut sink = FrameCounter::default();
        replay(&mut host, &script.events, &mut playback, &mut sink)?
    };

    if !args.frames {
        let report = serde_json::json!({
            "summary": summary,
            "views": host.views(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
