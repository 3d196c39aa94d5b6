mod backend;
mod commands;
mod util;

use clap::{Parser, Subcommand};
use pitchside_core::config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::Context;
use commands::connection::ConnectionCommands;
use commands::form::{FormArgs, ValidateArgs};
use commands::message::MessageCommands;
use commands::profile::ProfileCommands;
use commands::schema::SchemaCommands;
use util::exit_error;

#[derive(Parser)]
#[command(
    name = "pitchside",
    version,
    about = "Pitchside CLI: profile schemas, form validation and the Pitchside API"
)]
struct Cli {
    /// API base URL
    #[arg(long, env = "PITCHSIDE_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect profile schemas (offline)
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
    /// Render a profile form as a control tree (offline)
    Form(FormArgs),
    /// Validate field values against a profile type (offline)
    Validate(ValidateArgs),
    /// Create and edit profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Manage connections
    Connection {
        #[command(subcommand)]
        command: ConnectionCommands,
    },
    /// Read and send messages
    Message {
        #[command(subcommand)]
        command: MessageCommands,
    },
    /// Store an API key for later runs
    Login {
        /// API key (prompted when omitted)
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Remove stored credentials
    Logout,
}

fn init_tracing() {
    let json = std::env::var("PITCHSIDE_LOG_JSON").is_ok_and(|v| v == "true" || v == "1");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pitchside=info".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();
    let cli = Cli::parse();

    let config = Config::from_env_with_api_url(&cli.api_url).unwrap_or_else(|e| {
        exit_error(
            &e.to_string(),
            Some("Check --api-url, PITCHSIDE_API_URL and PITCHSIDE_TOAST_MS."),
        )
    });
    let ctx = Context {
        api_url: config.api_url,
        toast_duration: config.toast_duration,
    };

    let code = match cli.command {
        Commands::Schema { command } => commands::schema::run(command),
        Commands::Form(args) => commands::form::render(args),
        Commands::Validate(args) => commands::form::validate(args),
        Commands::Profile { command } => commands::profile::run(&ctx, command).await,
        Commands::Connection { command } => commands::connection::run(&ctx, command).await,
        Commands::Message { command } => commands::message::run(&ctx, command).await,
        Commands::Login { api_key } => commands::auth::login(&ctx.api_url, api_key).await,
        Commands::Logout => commands::auth::logout(),
    };

    std::process::exit(code);
}
