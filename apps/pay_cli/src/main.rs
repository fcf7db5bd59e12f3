use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use payment_core::{
    config::{self, Settings},
    horizon::HorizonClient,
    lookup_balance, PaymentController,
};
use serde_json::json;
use shared::{
    domain::{AccountAddress, PaymentDraft},
    error::{ErrorReport, WorkflowError},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Send native testnet payments from the terminal")]
struct Args {
    /// Settings file; defaults to ./payment.toml or the user config dir.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    horizon_url: Option<String>,
    /// Secret seed (S...) used as the local signing wallet.
    #[arg(long, global = true)]
    secret: Option<String>,
    /// Print machine-readable output.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect the wallet and print its address.
    Address,
    /// Show the native balance of the wallet or of another account.
    Balance {
        #[arg(long)]
        address: Option<String>,
    },
    /// Send one native payment.
    Pay {
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(EnvFilter::DEFAULT_ENV))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let settings = resolve_settings(&args);
    tracing::debug!(
        horizon = %settings.horizon_url,
        network = settings.network_label(),
        "settings loaded"
    );

    match run(&args, &settings).await? {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            report_failure(&err, args.json)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Filter from `env_var`, or `info` when it is unset or unparsable.
fn log_filter(env_var: &str) -> EnvFilter {
    EnvFilter::try_from_env(env_var).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn resolve_settings(args: &Args) -> Settings {
    let mut settings = match &args.config {
        Some(path) => config::load_settings_from(Some(path)),
        None => config::load_settings(),
    };
    if let Some(url) = &args.horizon_url {
        settings.horizon_url = url.clone();
    }
    if let Some(secret) = &args.secret {
        settings.wallet_secret = Some(secret.clone());
    }
    settings
}

/// Outer error: setup problems. Inner error: workflow failures shown to the user.
async fn run(args: &Args, settings: &Settings) -> Result<Result<(), WorkflowError>> {
    match &args.command {
        Command::Balance {
            address: Some(address),
        } => {
            let ledger = HorizonClient::new(&settings.horizon_url)
                .context("invalid horizon url")?;
            let address = AccountAddress::new(address.trim());
            let balance = lookup_balance(&ledger, &address).await;
            print_output(
                args.json,
                json!({ "address": address, "balance": balance }),
                &format!("{address}: {}", balance.label()),
            )?;
            Ok(Ok(()))
        }
        command => {
            let controller =
                PaymentController::from_settings(settings).context("invalid settings")?;
            let session = match controller.connect().await {
                Ok(session) => session,
                Err(err) => return Ok(Err(err)),
            };

            match command {
                Command::Address => {
                    print_output(
                        args.json,
                        json!({ "address": session.address }),
                        session.address.as_str(),
                    )?;
                }
                Command::Balance { .. } => {
                    let balance = controller.snapshot().await.balance;
                    print_output(
                        args.json,
                        json!({ "address": session.address, "balance": balance }),
                        &format!("{}: {}", session.address, balance.label()),
                    )?;
                }
                Command::Pay { to, amount } => {
                    let draft = PaymentDraft::new(to.clone(), amount.clone());
                    let hash = match controller.submit_payment(&draft).await {
                        Ok(hash) => hash,
                        Err(err) => return Ok(Err(err)),
                    };
                    let explorer = settings.explorer_tx_url(&hash);
                    print_output(
                        args.json,
                        json!({ "hash": hash, "explorer_url": explorer }),
                        &format!("Payment sent: {hash}\n{explorer}"),
                    )?;
                }
            }
            Ok(Ok(()))
        }
    }
}

fn print_output(as_json: bool, value: serde_json::Value, text: &str) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string(&value)?);
    } else {
        println!("{text}");
    }
    Ok(())
}

fn report_failure(err: &WorkflowError, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string(&ErrorReport::from(err))?);
    } else {
        eprintln!("{}", err.user_message());
    }
    Ok(())
}
