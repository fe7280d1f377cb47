//! Event Consumer - applies broker events to the user directory.

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use event_consumer_lib::config::EventConsumerConfig;

#[derive(Parser)]
#[command(name = "event-consumer")]
#[command(about = "Directory event consumer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Subscribe to every topic and process events until Ctrl+C
    Consume {
        /// Override the Redis URL hosting the event streams
        #[arg(long)]
        redis_url: Option<String>,
        /// Override the directory service endpoint
        #[arg(long)]
        directory_url: Option<String>,
    },
    /// Delete expired anonymous accounts once and exit
    Sweep {
        #[arg(long)]
        directory_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = EventConsumerConfig::from_env()?;

    match cli.command {
        Commands::Consume {
            redis_url,
            directory_url,
        } => {
            if let Some(url) = redis_url {
                config.broker.url = url;
            }
            if let Some(url) = directory_url {
                config.directory.endpoint = url;
            }
            event_consumer_lib::run_consumer(config).await?;
        }
        Commands::Sweep { directory_url } => {
            if let Some(url) = directory_url {
                config.directory.endpoint = url;
            }
            let deleted = event_consumer_lib::run_sweep(config).await?;
            info!(deleted, "Sweep finished");
        }
    }

    Ok(())
}
