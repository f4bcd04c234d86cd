use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "mindforge")]
#[command(about = "mindforge CLI - AI mind map generation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a mind map from a topic or text
    Generate {
        /// The topic or text to map
        text: String,
        /// Enhance with web search and deeper analysis
        #[arg(long)]
        research: bool,
        /// Provider to use a personal API key for (google, openai, anthropic, cohere)
        #[arg(long, default_value = "google")]
        provider: String,
        /// Write the diagram markup to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Create a new account
    Signup { email: String, password: String },
    /// Sign in to an existing account
    Login { email: String, password: String },
    /// Sign out of the current account
    Logout,
    /// Request a password reset email
    ResetPassword { email: String },
    /// Manage provider API keys
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
    /// Show remaining anonymous generations
    Usage,
}

#[derive(Subcommand)]
enum KeyAction {
    /// Store an API key for a provider
    Set { provider: String, api_key: String },
    /// List stored API keys (masked)
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = commands::build_context().await?;

    match cli.command {
        Commands::Generate {
            text,
            research,
            provider,
            output,
        } => commands::generate::run(&ctx, &text, research, &provider, output).await,
        Commands::Signup { email, password } => commands::auth::signup(&ctx, &email, &password).await,
        Commands::Login { email, password } => commands::auth::login(&ctx, &email, &password).await,
        Commands::Logout => commands::auth::logout(&ctx),
        Commands::ResetPassword { email } => commands::auth::reset_password(&ctx, &email).await,
        Commands::Key { action } => match action {
            KeyAction::Set { provider, api_key } => {
                commands::keys::set(&ctx, &provider, &api_key).await
            }
            KeyAction::List => commands::keys::list(&ctx).await,
        },
        Commands::Usage => commands::usage::run(&ctx),
    }
}
