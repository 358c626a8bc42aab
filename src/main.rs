use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use outbound_caller::application::entrypoint::{CallJob, CallSettings};
use outbound_caller::application::worker::CallWorker;
use outbound_caller::config::{Config, DispatchMode};
use outbound_caller::domain::appointment::StaticAppointmentBook;
use outbound_caller::domain::dial_info::DialInfo;
use outbound_caller::domain::dispatch::{DispatchRequest, Dispatcher};
use outbound_caller::domain::PhoneNumber;
use outbound_caller::infrastructure::dispatch::{new_room_name, ApiDispatcher, CliDispatcher};
use outbound_caller::infrastructure::livekit::LiveKitCallControl;
use outbound_caller::infrastructure::session::BridgeConnector;
use outbound_caller::interface::api::{build_router, init_metrics, AppState, FormDefaults};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "outbound-caller")]
#[command(about = "AI voice agent for outbound appointment follow-up calls")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, env = "OUTBOUND_CALLER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dispatch form and accept call jobs
    Serve,
    /// Place one call from this process
    Call {
        #[arg(long)]
        phone_number: String,
        #[arg(long)]
        transfer_to: Option<String>,
        /// Room to run the call in; a fresh one by default
        #[arg(long)]
        room: Option<String>,
    },
    /// Run the configured dispatcher once
    Dispatch {
        #[arg(long)]
        phone_number: String,
        #[arg(long)]
        transfer_to: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    info!("SIP outbound trunk: {}", config.sip.outbound_trunk_id);
    if config.sip.outbound_trunk_id.is_empty() {
        warn!("SIP_OUTBOUND_TRUNK_ID is not set; outbound dials will fail");
    }

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Call {
            phone_number,
            transfer_to,
            room,
        } => call(config, &phone_number, transfer_to.as_deref(), room).await,
        Commands::Dispatch {
            phone_number,
            transfer_to,
        } => dispatch(config, &phone_number, transfer_to.as_deref().unwrap_or("")).await,
    }
}

fn build_worker(config: &Config) -> CallWorker {
    CallWorker::new(
        CallSettings::from_config(config),
        Arc::new(LiveKitCallControl::new(&config.livekit)),
        Arc::new(StaticAppointmentBook::new(config.agent.availability_delay())),
        Arc::new(BridgeConnector::new(config.agent.session_url.clone())),
    )
}

fn build_dispatcher(config: &Config) -> Arc<dyn Dispatcher> {
    match config.dispatch.mode {
        DispatchMode::Cli => Arc::new(CliDispatcher::from_config(&config.dispatch, &config.agent.name)),
        DispatchMode::Api => Arc::new(ApiDispatcher::new(&config.livekit, &config.agent.name)),
    }
}

async fn serve(config: Config) -> Result<()> {
    let prometheus_handle = match init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("metrics exporter unavailable: {}", e);
            None
        }
    };

    let state = AppState {
        dispatcher: build_dispatcher(&config),
        jobs: Arc::new(build_worker(&config)),
        form_defaults: FormDefaults::from_config(&config.dispatch),
    };
    let app = build_router(state, prometheus_handle);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Outbound caller listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn call(
    config: Config,
    phone_number: &str,
    transfer_to: Option<&str>,
    room: Option<String>,
) -> Result<()> {
    let transfer_to = transfer_to
        .filter(|n| !n.trim().is_empty())
        .map(PhoneNumber::parse)
        .transpose()?;
    let dial_info = DialInfo::new(PhoneNumber::parse(phone_number)?, transfer_to);
    let job = CallJob::new(room.unwrap_or_else(new_room_name), dial_info.to_metadata());

    let outcome = build_worker(&config).run(job).await?;
    info!("call finished: {:?}", outcome);
    Ok(())
}

async fn dispatch(config: Config, phone_number: &str, transfer_to: &str) -> Result<()> {
    let request = DispatchRequest::from_form(phone_number, transfer_to)?;
    let dispatcher = build_dispatcher(&config);

    match dispatcher.dispatch(&request).await {
        Ok(receipt) => {
            println!("{}", receipt.stdout.trim_end());
            if !receipt.stderr.trim().is_empty() {
                eprintln!("{}", receipt.stderr.trim_end());
            }
            Ok(())
        }
        Err(e) => {
            error!("dispatch via {} failed: {}", dispatcher.program(), e);
            Err(e.into())
        }
    }
}
