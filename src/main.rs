use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn, Level as LogLevel};
use tracing_subscriber::EnvFilter;

use statuswatch::duration::{format_duration, parse_duration};
use statuswatch::{
    FileSource, Level, Notification, NotificationQueue, ReentryPolicy, Settings, StatusWatcher,
    StreamKind,
};

#[derive(Parser, Debug)]
#[command(name = "statuswatch")]
#[command(about = "Watch a polled collection and print a notification for every status change")]
struct Args {
    /// Path to a JSON file holding an array of records
    #[arg(short, long, default_value = "records.json")]
    file: PathBuf,

    /// Settings file (TOML); STATUSWATCH_* environment variables also apply
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Which collection the file holds
    #[arg(short, long, value_enum)]
    stream: Option<StreamKind>,

    /// Poll interval (e.g., "15s", "500ms")
    #[arg(short, long)]
    refresh: Option<String>,

    /// How long a notification stays visible (e.g., "3s", "3500ms")
    #[arg(short, long)]
    ttl: Option<String>,

    /// Whether history survives a re-entry
    #[arg(long, value_enum)]
    reentry: Option<ReentryPolicy>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Resolve settings: config layers first, then command-line overrides.
    fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())
            .context("Failed to load settings")?;

        if let Some(stream) = self.stream {
            settings.stream = stream;
        }
        if let Some(ref refresh) = self.refresh {
            settings.poll_interval = parse_duration(refresh)?;
            anyhow::ensure!(!settings.poll_interval.is_zero(), "--refresh must be positive");
        }
        if let Some(ref ttl) = self.ttl {
            settings.notification_ttl = parse_duration(ttl)?;
        }
        if let Some(reentry) = self.reentry {
            settings.reentry = reentry;
        }
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LogLevel::INFO,
        1 => LogLevel::DEBUG,
        _ => LogLevel::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("statuswatch={}", level.as_str().to_lowercase())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // Notifications go to stdout, logs to stderr
        .init();

    let settings = args.settings()?;
    info!(
        file = %args.file.display(),
        stream = ?settings.stream,
        refresh = %format_duration(settings.poll_interval),
        ttl = %format_duration(settings.notification_ttl),
        "watching"
    );

    let queue = NotificationQueue::new(settings.notification_ttl);
    // Subscribe before the first tick so the cold-start summary is not missed.
    let events = queue.subscribe();
    let source = Box::new(FileSource::new(&args.file));
    let watcher = StatusWatcher::from_settings(source, &settings, queue.clone());
    let handle = watcher.spawn(settings.poll_interval);

    render(events).await?;

    handle.stop().await;
    info!("stopped");
    Ok(())
}

/// Print every notification as it is enqueued, until Ctrl-C.
///
/// Expiries are logged by the queue itself at debug level.
async fn render(mut events: broadcast::Receiver<Notification>) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(notification) => print_notification(&notification),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "renderer fell behind"),
                Err(RecvError::Closed) => return Ok(()),
            },
            signal = &mut shutdown => {
                signal.context("Failed to listen for Ctrl-C")?;
                return Ok(());
            }
        }
    }
}

fn print_notification(notification: &Notification) {
    let marker = match notification.level {
        Level::Info => "•",
        Level::Success => "✓",
        Level::Error => "✗",
    };
    println!("{} [{}] {}", marker, notification.level.label(), notification.text);
}
