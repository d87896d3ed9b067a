use chrono::{TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result, miette};
use paywatch::application::PaymentConfirmationMonitor;
use paywatch::config::MonitorConfig;
use paywatch::domain::keys;
use paywatch::domain::outcome::PaymentOutcome;
use paywatch::domain::ports::{SessionStorage, SessionStorageRef};
use paywatch::domain::shipping::ShippingDetails;
use paywatch::infrastructure::file::FileSessionStorage;
use paywatch::infrastructure::process_window::ProcessGatewayLauncher;
use paywatch::interfaces::http::backend::HttpPaymentBackend;
use paywatch::interfaces::terminal::{TerminalNavigator, TerminalNotifier};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file holding the client session state
    #[arg(long, global = true, default_value = "paywatch-session.json")]
    store_path: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Remember the signed-in storefront account
    Login {
        #[arg(long)]
        account_id: String,
    },
    /// Forget the signed-in account
    Logout,
    /// Show the signed-in account and any payment in progress
    Status,
    /// Pay for the current cart through the external gateway
    Pay(PayArgs),
}

#[derive(Args)]
struct PayArgs {
    /// Base URL of the storefront REST backend
    #[arg(long, default_value = "http://localhost:8080/api")]
    api_base: String,

    /// Base URL of the storefront site, used to resolve redirects
    #[arg(long, default_value = "http://localhost:3000")]
    site_base: String,

    #[arg(long)]
    receiver_name: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    address: String,

    /// Browser program that hosts the gateway window
    #[arg(long, default_value = "firefox")]
    browser: String,

    /// Extra argument passed to the browser before the URL (repeatable)
    #[arg(long = "browser-arg", allow_hyphen_values = true)]
    browser_args: Vec<String>,

    #[arg(long, default_value_t = 1000)]
    poll_interval_ms: u64,
    #[arg(long, default_value_t = 600)]
    timeout_secs: u64,
    #[arg(long, default_value_t = 1500)]
    launch_delay_ms: u64,
    #[arg(long, default_value_t = 1500)]
    redirect_delay_ms: u64,
}

impl PayArgs {
    fn config(&self) -> MonitorConfig {
        MonitorConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            timeout: Duration::from_secs(self.timeout_secs),
            launch_delay: Duration::from_millis(self.launch_delay_ms),
            redirect_delay: Duration::from_millis(self.redirect_delay_ms),
            ..MonitorConfig::default()
        }
    }

    fn shipping_details(&self) -> ShippingDetails {
        ShippingDetails {
            receiver_name: self.receiver_name.clone(),
            receiver_phone: self.phone.clone(),
            email: self.email.clone(),
            shipping_address: self.address.clone(),
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paywatch=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn open_storage(cli: &Cli) -> Result<SessionStorageRef> {
    #[cfg(feature = "storage-rocksdb")]
    {
        if let Some(db_path) = &cli.db_path {
            use paywatch::infrastructure::rocksdb::RocksDBSessionStorage;
            let store = RocksDBSessionStorage::open(db_path).into_diagnostic()?;
            return Ok(Arc::new(store));
        }
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    {
        if cli.db_path.is_some() {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to the JSON session file."
            );
        }
    }

    Ok(Arc::new(FileSessionStorage::new(&cli.store_path)))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let storage = open_storage(&cli)?;

    match &cli.command {
        Command::Login { account_id } => {
            if account_id.trim().is_empty() {
                return Err(miette!("Account id must not be empty"));
            }
            storage
                .set(keys::ACCOUNT_ID, account_id.trim())
                .await
                .into_diagnostic()?;
            if let Some(path) = storage.get(keys::RETURN_PATH).await.into_diagnostic()? {
                storage.remove(keys::RETURN_PATH).await.into_diagnostic()?;
                println!("Signed in as {}. Return to {path}", account_id.trim());
            } else {
                println!("Signed in as {}", account_id.trim());
            }
            Ok(())
        }
        Command::Logout => {
            storage.remove(keys::ACCOUNT_ID).await.into_diagnostic()?;
            println!("Signed out");
            Ok(())
        }
        Command::Status => print_status(&storage).await,
        Command::Pay(args) => pay(args, storage).await,
    }
}

async fn print_status(storage: &SessionStorageRef) -> Result<()> {
    match storage.get(keys::ACCOUNT_ID).await.into_diagnostic()? {
        Some(account) => println!("account: {account}"),
        None => println!("account: not signed in"),
    }
    match storage.get(keys::TRANSACTION_REF).await.into_diagnostic()? {
        Some(txn) => {
            let started = storage
                .get(keys::STARTED_AT)
                .await
                .into_diagnostic()?
                .and_then(|millis| millis.parse::<i64>().ok())
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string());
            println!("payment: {txn} (started {started})");
        }
        None => println!("payment: none in progress"),
    }
    Ok(())
}

async fn pay(args: &PayArgs, storage: SessionStorageRef) -> Result<()> {
    let monitor = PaymentConfirmationMonitor::new(
        Arc::new(HttpPaymentBackend::new(&args.api_base)),
        Arc::new(ProcessGatewayLauncher::new(
            &args.browser,
            args.browser_args.clone(),
        )),
        storage,
        Arc::new(TerminalNotifier),
        Arc::new(TerminalNavigator::new(&args.site_base)),
        args.config(),
    );

    let mut session = monitor
        .begin_payment(args.shipping_details())
        .await
        .into_diagnostic()?;
    let txn = session.transaction_ref().clone();
    let unload = session.unload_hook();

    // Ctrl-C plays the part of the page being unloaded.
    let outcome = tokio::select! {
        outcome = session.outcome() => outcome,
        _ = tokio::signal::ctrl_c() => {
            unload.fire().await;
            return Err(miette!("Payment monitoring for {txn} interrupted"));
        }
    };

    match outcome {
        Some(PaymentOutcome::Completed) => {
            println!("Payment {txn} completed");
            Ok(())
        }
        Some(outcome) => Err(miette!("Payment {txn} ended as {outcome:?}")),
        None => Err(miette!("Payment monitoring stopped before an outcome")),
    }
}
