use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{ArgAction, Parser};
use feedback_core::{EventLog, FeedbackSession};
use uuid::Uuid;

/// Headless harness around the feedback core. Reads free-text feedback from
/// stdin, applies attachments and preset selections from flags, and prints
/// the assembled result the way the desktop dialog would return it.
#[derive(Debug, Parser)]
#[command(name = "feedback-rs", version, about = "Interactive feedback core harness")]
struct Cli {
    /// Prompt text displayed to the operator
    #[arg(long, default_value = "The requested changes are complete.")]
    prompt: String,
    /// Preset options separated by |||
    #[arg(long, default_value = "")]
    predefined_options: String,
    /// Image file to attach (repeatable, attached in flag order)
    #[arg(long = "image")]
    images: Vec<PathBuf>,
    /// Preset option label to mark selected (repeatable)
    #[arg(long = "select")]
    selected: Vec<String>,
    /// Diagnostics JSONL path
    #[arg(long)]
    events: Option<PathBuf>,
    /// Print the rendered prompt HTML to stderr before reading feedback
    #[arg(long, action = ArgAction::SetTrue)]
    show_prompt: bool,
    /// Print the full result as JSON instead of the feedback text alone
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("feedback-rs error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    let options: Vec<String> = cli
        .predefined_options
        .split("|||")
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect();

    let events = match &cli.events {
        Some(path) => EventLog::new(path, Uuid::new_v4().to_string()),
        None => EventLog::disabled(),
    };

    let mut session = FeedbackSession::new(&cli.prompt, &options, events);
    session.add_image_files(&cli.images);
    for label in &cli.selected {
        if !session.set_option_by_label(label, true) {
            bail!("unknown preset option: {label}");
        }
    }

    if cli.show_prompt {
        eprintln!("{}", session.prompt_html());
    }

    let mut feedback = String::new();
    io::stdin().read_to_string(&mut feedback)?;

    let result = session.submit(&feedback);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.interactive_feedback);
    }
    Ok(0)
}
