//! mCASH merchant command line client
//!
//! Creates payment requests and shortlinks, and waits for their outcome.

mod config;
mod shutdown;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use config::FileConfig;
use mcash_core::{MerchantClient, PollState, Poller, Subscription};
use mcash_sdk::objects::{NewPaymentRequest, NewShortlink};
use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// mCASH merchant client
#[derive(Parser, Debug)]
#[command(name = "mcash")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "MCASH_CONFIG", default_value = "./mcash.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the API host is reachable
    Ping,

    /// Create a payment request for a scanned customer token
    CreatePayment {
        /// Scan token of the customer
        #[arg(long)]
        customer: String,
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value = "NOK")]
        currency: String,
        /// Tip added on top of the amount
        #[arg(long, default_value = "0")]
        additional_amount: Decimal,
        /// Let the customer add a tip
        #[arg(long)]
        additional_edit: bool,
        #[arg(long)]
        allow_credit: bool,
        #[arg(long)]
        callback_uri: Option<String>,
        /// Point-of-sale ticket id; generated when omitted
        #[arg(long)]
        pos_tid: Option<String>,
        /// Wait for the payment to finish
        #[arg(long)]
        watch: bool,
    },

    /// Wait until a payment request is ok or failed
    WatchPayment { ticket_id: String },

    /// Create a shortlink
    CreateShortlink {
        #[arg(long)]
        serial_number: Option<String>,
        #[arg(long)]
        callback_uri: Option<String>,
    },

    /// Wait for a shortlink to be scanned
    WatchShortlink {
        shortlink_id: String,
        /// Also accept scans made up to this many seconds ago
        #[arg(long, default_value = "0")]
        since: i64,
    },

    /// Close the open report of the configured ledger and wait until it is closed
    CloseReport,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    let config = FileConfig::load(&args.config)
        .and_then(FileConfig::into_client_config)
        .with_context(|| format!("loading configuration from {:?}", args.config))?;
    tracing::debug!(base_url = %config.base_url, ledger = %config.ledger, "Configuration loaded");

    let client = MerchantClient::new(config)?;

    match args.command {
        Command::Ping => {
            if !client.api().is_ready().await {
                bail!("{} is not reachable", client.config().base_url);
            }
            println!("ok");
        }
        Command::CreatePayment {
            customer,
            amount,
            currency,
            additional_amount,
            additional_edit,
            allow_credit,
            callback_uri,
            pos_tid,
            watch,
        } => {
            let request = NewPaymentRequest {
                pos_tid: pos_tid.unwrap_or_else(|| Uuid::now_v7().to_string()),
                customer,
                amount,
                currency,
                additional_amount,
                additional_edit,
                callback_uri,
                allow_credit,
            };
            let ticket = client.api().create_payment_request(&request).await?;
            tracing::info!(ticket_id = %ticket.id, pos_tid = %request.pos_tid, "Payment request created");
            println!("{}", ticket.id);
            if watch {
                watch_payment(&client, &ticket.id).await?;
            }
        }
        Command::WatchPayment { ticket_id } => watch_payment(&client, &ticket_id).await?,
        Command::CreateShortlink {
            serial_number,
            callback_uri,
        } => {
            let shortlink = client
                .api()
                .create_shortlink(&NewShortlink {
                    serial_number,
                    callback_uri,
                })
                .await?;
            println!("{}", shortlink.id);
        }
        Command::WatchShortlink {
            shortlink_id,
            since,
        } => {
            let events = client.subscribe_shortlink_scanned();
            let start_time = scan_window_start(OffsetDateTime::now_utc(), since)?;
            client.start_shortlink_scanned_listener(&shortlink_id, start_time);
            wait_for(&client, client.shortlinks(), events).await?;
        }
        Command::CloseReport => {
            let events = client.subscribe_report_closed();
            client.start_report_closed_listener().await?;
            wait_for(&client, client.reports(), events).await?;
        }
    }

    client.close().await;
    Ok(())
}

async fn watch_payment(client: &MerchantClient, ticket_id: &str) -> anyhow::Result<()> {
    let events = client.subscribe_payment_finished();
    client.start_payment_finished_listener(ticket_id);
    wait_for(client, client.payments(), events).await
}

/// Start of the scan window reaching `since` seconds back from `now`.
fn scan_window_start(now: OffsetDateTime, since: i64) -> anyhow::Result<OffsetDateTime> {
    let Some(start) = now.checked_sub(time::Duration::seconds(since.max(0))) else {
        bail!("--since {since} reaches before the earliest representable date");
    };
    Ok(start)
}

/// Print the first event of `events` as JSON.
///
/// Gives up when the poll aborts or a shutdown signal arrives; the client is
/// closed in every case.
async fn wait_for<E>(
    client: &MerchantClient,
    poller: &Poller<E>,
    mut events: Subscription<E>,
) -> anyhow::Result<()>
where
    E: Serialize + Clone + Send + Sync + 'static,
{
    let mut probe = tokio::time::interval(Duration::from_secs(1));
    let shutdown = shutdown::shutdown_signal();
    tokio::pin!(shutdown);

    let result = loop {
        tokio::select! {
            event = events.recv() => {
                break match event {
                    Some(event) => serde_json::to_string_pretty(&event)
                        .map(|json| println!("{json}"))
                        .map_err(Into::into),
                    None => Err(anyhow!("listener was removed before the event arrived")),
                };
            }
            _ = probe.tick() => {
                if let PollState::Aborted { target } = poller.state() {
                    break Err(anyhow!("polling {target} was aborted, see the log for the cause"));
                }
            }
            signal = &mut shutdown => {
                break signal.map_err(Into::into);
            }
        }
    };

    client.close().await;
    result
}

/// Initialize the tracing subscriber with environment-based filtering.
///
/// Logs go to stderr so stdout only carries command output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
