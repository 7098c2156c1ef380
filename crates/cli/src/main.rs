use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "follower")]
#[command(about = "Signal-following trading agent for Kraken Futures", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent: poll for signals, trade, report P&L
    Run {
        /// Config file path
        #[arg(short, long, default_value = "config/Follower.toml")]
        config: String,
        /// Trade against a simulated exchange instead of Kraken
        #[arg(long)]
        paper: bool,
    },
    /// Verify signal-source access and exit
    Verify {
        /// Config file path
        #[arg(short, long, default_value = "config/Follower.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, paper } => commands::run(&config, paper).await,
        Commands::Verify { config } => commands::verify(&config).await,
    }
}
