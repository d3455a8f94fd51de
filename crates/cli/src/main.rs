mod auth_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "rolemap", about = "Rolemap: HubSpot contacts on a map, by project role")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to use instead of the discovered one.
    #[arg(long, global = true, env = "ROLEMAP_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server.
    Serve {
        /// Overrides `server.bind`.
        #[arg(long)]
        bind: Option<String>,
        /// Overrides `server.port` and `PORT`.
        #[arg(long)]
        port: Option<u16>,
    },
    /// OAuth helpers.
    Auth {
        #[command(subcommand)]
        action: auth_commands::AuthAction,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the resolved configuration with secrets redacted.
    Show,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
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

    let mut config = rolemap_config::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind, port } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            info!(version = env!("CARGO_PKG_VERSION"), "rolemap starting");
            rolemap_gateway::start_server(config).await
        },
        Commands::Auth { action } => auth_commands::handle_auth(action, &config).await,
        Commands::Config {
            action: ConfigAction::Show,
        } => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        },
    }
}
