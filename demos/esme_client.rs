// ABOUTME: Command line ESME that binds to an SMSC, optionally sends one message, and logs traffic
// ABOUTME: Shows wiring a store, callbacks and the command handle around one session

//! # ESME Client
//!
//! Binds in the requested role, logs every delivered message and receipt,
//! optionally submits one SMS, then unbinds after `--run-duration` seconds.
//!
//! ## Usage
//!
//! ```bash
//! # Receive for five minutes
//! cargo run --example esme_client -- --system-id test --password secret --role rx
//!
//! # Send one message with sequence numbers kept on disk
//! cargo run --example esme_client -- \
//!   --system-id test --password secret \
//!   --state-dir /tmp/esme \
//!   --to 123456789 --from 987654321 --message "hello"
//! ```

use argh::FromArgs;
use smpp_esme::client::{
    ClientBuilder, ClientConfig, DeliveredMessage, DeliveryReport, EsmeCallbacks, EsmeHandle,
    Role, SmsMessage,
};
use smpp_esme::datatypes::SubmitSmResponse;
use smpp_esme::store::{FileStore, KeyValueStore, MemoryStore};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

/// SMPP ESME client
#[derive(FromArgs)]
struct CliArgs {
    /// whether or not to enable debugging
    #[argh(switch, short = 'd')]
    debugging: bool,

    /// the system id
    #[argh(option)]
    system_id: Option<String>,

    /// the password
    #[argh(option)]
    password: Option<String>,

    /// the hostname of IP address of the SMSC (default: localhost)
    #[argh(option)]
    host: Option<String>,

    /// the port to use when connecting to the SMSC (default: 2775)
    #[argh(option, short = 'p')]
    port: Option<u16>,

    /// bind role: tx, rx or trx (default: trx)
    #[argh(option)]
    role: Option<String>,

    /// directory for the durable sequence number (default: in memory)
    #[argh(option)]
    state_dir: Option<String>,

    /// seconds to wait for a bind response (default: 30)
    #[argh(option)]
    bind_timeout: Option<u64>,

    /// seconds between enquire_link PDUs (default: 55)
    #[argh(option)]
    enquire_link_interval: Option<u64>,

    /// how long to stay bound in seconds (default: 300)
    #[argh(option)]
    run_duration: Option<u64>,

    /// the recipient telephone number (no SMS sent if not provided)
    #[argh(option, short = 't')]
    to: Option<String>,

    /// the telephone number that the message will be from
    #[argh(option, short = 'f')]
    from: Option<String>,

    /// the message text
    #[argh(option, short = 'm')]
    message: Option<String>,
}

/// Logs every session event and signals once bound.
struct LoggingCallbacks {
    bound: Arc<Notify>,
}

impl EsmeCallbacks for LoggingCallbacks {
    async fn connect(&mut self, role: Role) {
        info!(?role, "bound");
        self.bound.notify_one();
    }

    async fn disconnect(&mut self) {
        info!("disconnected");
    }

    async fn submit_sm_resp(&mut self, response: &SubmitSmResponse) {
        info!(
            sequence_number = response.sequence_number,
            message_id = %response.message_id,
            status = %response.command_status,
            "submit_sm_resp"
        );
    }

    async fn deliver_sm(&mut self, message: DeliveredMessage) {
        info!(
            from = %message.source_addr,
            to = %message.destination_addr,
            content = ?message.short_message,
            "message received"
        );
    }

    async fn delivery_report(&mut self, report: DeliveryReport) {
        info!(
            message_id = ?report.message_id(),
            status = ?report.receipt.status(),
            receipt = %report.receipt,
            "delivery report"
        );
    }
}

fn parse_role(role: Option<&str>) -> Result<Role, Box<dyn Error>> {
    match role.unwrap_or("trx") {
        "tx" => Ok(Role::Transmitter),
        "rx" => Ok(Role::Receiver),
        "trx" => Ok(Role::Transceiver),
        other => Err(format!("unknown role {other:?}, expected tx, rx or trx").into()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli_args.debugging { Level::DEBUG } else { Level::INFO })
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = ClientConfig::new(
        cli_args.host.clone().unwrap_or_else(|| "localhost".to_owned()),
        cli_args.port.unwrap_or(2775),
        cli_args.system_id.clone().unwrap_or_default(),
        cli_args.password.clone().unwrap_or_default(),
    )
    .with_bind_timeout(Duration::from_secs(cli_args.bind_timeout.unwrap_or(30)))
    .with_enquire_link_interval(Duration::from_secs(
        cli_args.enquire_link_interval.unwrap_or(55),
    ));

    match cli_args.state_dir.clone() {
        Some(dir) => run_session(&cli_args, config, FileStore::open(dir).await?).await,
        None => run_session(&cli_args, config, MemoryStore::new()).await,
    }
}

async fn run_session<S: KeyValueStore>(
    cli_args: &CliArgs,
    config: ClientConfig,
    store: S,
) -> Result<(), Box<dyn Error>> {
    let role = parse_role(cli_args.role.as_deref())?;
    let run_duration = Duration::from_secs(cli_args.run_duration.unwrap_or(300));
    let sequencer = Arc::new(config.sequencer(store));

    let bound = Arc::new(Notify::new());
    let callbacks = LoggingCallbacks {
        bound: bound.clone(),
    };

    info!("Connecting to {}", config.addr());
    let (mut esme, mut reader) = ClientBuilder::connect(config, role, sequencer, callbacks).await?;
    let (handle, commands) = EsmeHandle::channel(8);

    let application = async {
        bound.notified().await;

        if let (Some(to), Some(from)) = (&cli_args.to, &cli_args.from) {
            let text = cli_args.message.clone().unwrap_or_else(|| "Hello from smpp-esme".into());
            match handle.submit_sm(SmsMessage::new(to, from, text)).await {
                Ok(Some(sequence_number)) => info!(sequence_number, "submit_sm sent"),
                Ok(None) => warn!(?role, "role cannot submit, message not sent"),
                Err(e) => warn!(error = %e, "submit_sm failed"),
            }
        }

        tokio::time::sleep(run_duration).await;
        handle.unbind().await
    };

    tokio::select! {
        result = esme.run_with(&mut reader, Some(commands)) => {
            result?;
            return Ok(());
        }
        unbind = application => {
            unbind?;
        }
    }

    // Keep reading until the SMSC acknowledges the unbind.
    esme.run(&mut reader).await?;
    info!("Session finished");
    Ok(())
}
