use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use alert_watcher::alerting::{AlertPayload, WebhookClient};
use alert_watcher::config::loader::resolve_with;
use alert_watcher::config::ObservabilityConfig;
use alert_watcher::observability::logging;
use alert_watcher::replay::replay;

#[derive(Parser)]
#[command(name = "watcher-cli")]
#[command(about = "Operator tools for the alert watcher", long_about = None)]
struct Cli {
    /// Log level for diagnostics on stderr
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run detection over a captured log and print alert candidates as JSON lines
    Replay {
        /// Access log to read from the beginning
        file: PathBuf,

        /// Error window size (defaults to the configured value)
        #[arg(long)]
        window: Option<usize>,

        /// Error-rate threshold as a fraction (defaults to the configured value)
        #[arg(long)]
        threshold: Option<f64>,

        /// Primary pool (defaults to the configured value, else inferred)
        #[arg(long)]
        primary_pool: Option<String>,
    },
    /// Send a test notification through the configured webhook
    TestAlert {
        /// Webhook URL (defaults to SLACK_WEBHOOK_URL / config file)
        #[arg(long)]
        url: Option<String>,

        #[arg(long, default_value = "alert-watcher test notification")]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(&ObservabilityConfig {
        log_level: cli.log_level.clone(),
        ..ObservabilityConfig::default()
    });

    let mut config = resolve_with(&|key: &str| std::env::var(key).ok())?;

    match cli.command {
        Commands::Replay {
            file,
            window,
            threshold,
            primary_pool,
        } => {
            if let Some(window) = window {
                config.detection.window_size = window;
            }
            if let Some(threshold) = threshold {
                config.detection.error_threshold = threshold;
            }
            if primary_pool.is_some() {
                config.detection.primary_pool = primary_pool;
            }

            let reader = BufReader::new(File::open(&file)?);
            let report = replay(reader, &config.detection, |candidate| {
                let payload = AlertPayload::from_candidate(candidate);
                match serde_json::to_string(&payload) {
                    Ok(line) => println!("{}", line),
                    Err(e) => eprintln!("Error: cannot encode candidate: {}", e),
                }
            })?;
            eprintln!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::TestAlert { url, message } => {
            if url.is_some() {
                config.webhook.url = url;
            }
            let client = WebhookClient::new(&config.webhook)?;
            let payload = AlertPayload::test_message(&message);

            match client.deliver(&payload).await {
                Ok(attempts) => println!("Delivered test alert {} to {} ({} attempt(s))", payload.id, client.url(), attempts),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
