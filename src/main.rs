//! Wallet Session CLI
//!
//! Terminal front-end for the wallet session: connect, watch network and
//! balance, switch chains and send a test self-transfer.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wallet_session::notice::LogNotifier;
use wallet_session::ui::{self, Action, ConsoleNotifier};
use wallet_session::wallet::SecureWallet;
use wallet_session::{
    Config, Error, LocalEnvironment, Notification, Notifier, Result, RpcConfig, RpcWallet,
    WalletSession,
};

#[derive(Parser)]
#[command(name = "wallet-session")]
#[command(about = "Connect to a wallet, track its network and balance, send a test transfer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive session
    Run,

    /// Initialize once and print the session state as JSON
    Status,

    /// Show current configuration
    Config,
}

enum Input {
    Line(Option<String>),
    Notification(Option<Notification>),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = match cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Run => run_session(config).await,
        Commands::Status => print_status(config).await,
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Inject the RPC wallet when a private key is configured
fn build_environment(config: &Config) -> Result<LocalEnvironment> {
    let Some(signer) = SecureWallet::from_env(&config.wallet.private_key_env)? else {
        tracing::warn!(
            var = %config.wallet.private_key_env,
            "No private key set - running without a wallet"
        );
        return Ok(LocalEnvironment::default());
    };

    let chain_id = config
        .networks
        .chain_id(&config.wallet.chain)
        .ok_or_else(|| Error::Config(format!("Unknown wallet chain '{}'", config.wallet.chain)))?;

    let wallet = RpcWallet::new(
        signer,
        RpcConfig::from_env(),
        chain_id,
        config.wallet.auto_approve,
    )?;
    Ok(LocalEnvironment::new(Some(wallet)))
}

async fn print_status(config: Config) -> Result<()> {
    let env = build_environment(&config)?;
    let mut session = WalletSession::new(env, &config, Arc::new(LogNotifier))?;

    if let Err(e) = session.initialize().await {
        tracing::warn!(error = %e, "Could not read wallet state");
    }

    println!("{}", serde_json::to_string_pretty(session.state())?);
    Ok(())
}

async fn run_session(config: Config) -> Result<()> {
    let env = build_environment(&config)?;
    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
    let mut session = WalletSession::new(env, &config, notifier)?;

    tracing::info!(session_id = %session.id(), "Starting wallet session");

    if let Err(e) = session.initialize().await {
        tracing::warn!(error = %e, "Initial wallet read failed");
    }

    println!("{}", ui::help(session.networks()));
    print!("{}", ui::render(session.state(), session.networks(), &config.transfer_value));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let input = tokio::select! {
            line = lines.next_line() => Input::Line(line?),
            notification = session.next_notification() => Input::Notification(notification),
        };

        match input {
            Input::Line(None) => break,
            Input::Line(Some(line)) => {
                let action = match ui::parse_action(&line, session.networks()) {
                    Ok(action) => action,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };

                match action {
                    Action::Help => {
                        println!("{}", ui::help(session.networks()));
                        continue;
                    }
                    Action::Quit => break,
                    action => {
                        if let Err(e) = ui::perform(&mut session, action).await {
                            tracing::debug!(error = %e, "Action failed");
                        }
                    }
                }
            }
            Input::Notification(Some(notification)) => {
                tracing::debug!(?notification, "Wallet notification");
                if let Err(e) = session.dispatch(notification).await {
                    tracing::debug!(error = %e, "Notification not applied");
                }
            }
            Input::Notification(None) => {}
        }

        print!("{}", ui::render(session.state(), session.networks(), &config.transfer_value));
    }

    session.teardown();
    tracing::info!(session_id = %session.id(), "Wallet session closed");
    Ok(())
}
