use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use clicktrail_core::{
    EventKind, FixedSession, HttpTransport, Page, RecordingTransport, SessionId, SessionIdentity,
    TrackedEvent, Tracker, TrackerConfig, Transport,
};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::format::{format_duration, format_event};

mod format;
mod input;

#[derive(Parser)]
#[command(name = "clicktrail")]
#[command(about = "Report pointer events to a clicktrail collector and replay the session")]
struct Cli {
    /// Collector base URL. Overrides the config file and CLICKTRAIL_ENDPOINT.
    #[arg(short, long, global = true)]
    endpoint: Option<String>,

    /// Config file. Defaults to <config dir>/clicktrail/config.json when present.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Reuse an existing session id instead of starting a new one
    #[arg(short, long, global = true)]
    session: Option<String>,

    /// Record requests locally and print them instead of sending
    #[arg(long, global = true)]
    dry_run: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dispatch JSON-lines pointer events onto the tracked region
    Track {
        /// Input file, stdin when omitted or "-"
        input: Option<PathBuf>,

        /// Replay the session once every event was sent
        #[arg(long)]
        replay: bool,
    },
    /// Click the replay control and print what the collector returns
    Replay,
    /// Send a synthetic pointer trail ending in a click, then replay it
    Demo {
        /// Number of mousemove events in the trail
        #[arg(short, long, default_value_t = 24)]
        points: u32,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "clicktrail=debug,clicktrail_core=debug"
    } else {
        "clicktrail=info,clicktrail_core=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Waits for outstanding requests and reports how many were issued since `sent_before`.
async fn settle(tracker: &Tracker, what: &str, sent_before: usize) {
    let start = Instant::now();
    let spinner = (tracker.in_flight() > 0)
        .then(|| create_spinner(&format!("Waiting for {what}...")));
    tracker.settle().await;

    let message = format!(
        "{} Sent {} {} {}",
        style("✓").green().bold(),
        tracker.requests_sent() - sent_before,
        what,
        style(format!("[{}]", format_duration(start.elapsed()))).dim()
    );
    match spinner {
        Some(spinner) => spinner.finish_with_message(message),
        None => println!("{message}"),
    }
}

async fn replay(tracker: &Tracker) {
    let sent_before = tracker.requests_sent();
    tracker.click_replay();
    settle(tracker, "replay request", sent_before).await;

    println!("{}", style("─".repeat(60)).dim());
    let output = tracker.output();
    if output.is_empty() {
        println!("{}", style("(nothing rendered)").dim());
    } else {
        println!("{}", output);
    }
}

async fn track(tracker: &Tracker, input: Option<PathBuf>) -> Result<()> {
    let reader = input::open(input.as_deref())?;
    let events = input::read_events(reader, tracker.page())?;

    let sent_before = tracker.requests_sent();
    let tracked = events
        .iter()
        .filter(|e| tracker.config().tracked_events.contains(&e.kind))
        .count();
    for event in &events {
        tracker
            .page()
            .dispatch(&tracker.config().tracked_region, event);
    }

    println!(
        "{} Dispatched {} events {}",
        style("✓").green().bold(),
        events.len(),
        style(format!("({} tracked)", tracked)).dim()
    );
    settle(tracker, "event reports", sent_before).await;
    Ok(())
}

async fn demo(tracker: &Tracker, points: u32) {
    let sent_before = tracker.requests_sent();
    let (width, height) = (640.0_f64, 480.0_f64);
    for i in 0..points {
        let t = i as f64 / points.max(1) as f64;
        let x = (t * width).round();
        let y = (height / 2.0 + (t * std::f64::consts::TAU).sin() * height / 3.0).round();
        tracker.pointer(EventKind::MouseMove, x, y);
        tokio::time::sleep(Duration::from_millis(16)).await;
    }
    tracker.pointer(EventKind::Click, width - 1.0, height / 2.0);

    println!(
        "{} Dispatched a {}-point trail and a click",
        style("✓").green().bold(),
        points
    );
    settle(tracker, "event reports", sent_before).await;
}

fn print_recorded(transport: &RecordingTransport) {
    println!("{}", style("─".repeat(60)).dim());
    for url in transport.requests() {
        let event = url
            .query_pairs()
            .find(|(k, _)| k == "event")
            .and_then(|(_, v)| serde_json::from_str::<TrackedEvent>(&v).ok());
        match event {
            Some(event) => println!("{} {}", style("GET").cyan(), format_event(&event)),
            None => println!("{} {}", style("GET").cyan(), url),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = TrackerConfig::resolve(cli.config.as_deref())?;
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }
    if let Err(e) = config.validate() {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
    tracing::debug!(?config, "config resolved");

    let page = Page::with_regions([
        &config.tracked_region,
        &config.replay_control,
        &config.output_region,
    ]);

    let recorder = cli.dry_run.then(|| RecordingTransport::ok(""));
    let transport: Arc<dyn Transport> = match &recorder {
        Some(recorder) => recorder.clone(),
        None => Arc::new(
            HttpTransport::new(config.request_timeout())?.with_cookies(page.cookies().clone()),
        ),
    };

    let tracker = match cli.session {
        Some(sid) => Tracker::install(
            page,
            config,
            Arc::new(FixedSession::new(SessionId::new(sid))),
            transport,
        )?,
        None => Tracker::load(page, config, transport)?,
    };

    let sid = tracker.session().get_or_create();
    println!(
        "\n{}  {}\n",
        style("clicktrail").cyan().bold(),
        style(format!("session {}", sid)).dim()
    );
    println!(
        "{} Collector {}",
        style("✓").green().bold(),
        style(&tracker.config().endpoint).yellow()
    );
    println!("{}", style("─".repeat(60)).dim());

    let total_start = Instant::now();
    match cli.command {
        Command::Track { input, replay: then_replay } => {
            track(&tracker, input).await?;
            if then_replay {
                replay(&tracker).await;
            }
        }
        Command::Replay => replay(&tracker).await,
        Command::Demo { points } => {
            demo(&tracker, points).await;
            replay(&tracker).await;
        }
    }

    if let Some(recorder) = &recorder {
        print_recorded(recorder);
    }

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );

    Ok(())
}
