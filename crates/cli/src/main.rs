mod check_commands;
mod offline_commands;
mod serve;
mod startup;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "tvlogo", about = "tvlogo, printable TV channel logo sheets over Telegram")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (skips discovery of tvlogo.{toml,yaml,yml,json}).
    #[arg(long, global = true, env = "TVLOGO_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Register the webhook and serve updates (default when no subcommand is provided).
    Serve,
    /// Search the channel catalog the way the bot does.
    Search {
        /// Free-form query, e.g. "первый канал".
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Render a stored gallery to a PDF file.
    Render {
        /// Telegram user id owning the gallery.
        #[arg(long)]
        user: String,
        /// Output file (defaults to gallery_<user>.pdf).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Validate the configuration and catalog.
    Check,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_telemetry(&cli);

    let config = tvlogo_config::discover_and_load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            info!(version = env!("CARGO_PKG_VERSION"), "tvlogo starting");
            let overrides = serve::ListenOverrides {
                bind: cli.bind,
                port: cli.port,
            };
            serve::run(config, overrides).await
        },
        Commands::Search { query } => offline_commands::search(&config, &query.join(" ")),
        Commands::Render { user, out } => {
            offline_commands::render(&config, &user, out.as_deref()).await
        },
        Commands::Check => check_commands::handle_check(&config),
    }
}
