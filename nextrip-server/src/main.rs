use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use nextrip_server::cache::{CacheConfig, CachedNexTrip};
use nextrip_server::cli::{Cli, Command, format_minutes};
use nextrip_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let source = match cli.source() {
        Ok(source) => source,
        Err(e) => {
            error!("failed to create NexTrip client: {e}");
            return ExitCode::FAILURE;
        }
    };
    let nextrip = CachedNexTrip::new(source, &CacheConfig::default());

    match cli.command() {
        Command::Demo {
            route,
            stop,
            direction,
        } => match nextrip.demo(&route, &stop, &direction, false).await {
            Ok(Some(minutes)) => {
                println!("{}", format_minutes(minutes));
                ExitCode::SUCCESS
            }
            Ok(None) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
        command @ Command::Serve { .. } => {
            let Some(addr) = command.addr() else {
                return ExitCode::FAILURE;
            };

            let app = create_router(AppState::new(nextrip));

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(e) => {
                    error!(%addr, "failed to bind: {e}");
                    return ExitCode::FAILURE;
                }
            };

            info!("NexTrip server listening on http://{addr}");
            info!("  GET /demo?route=&stop=&direction=");
            info!("  GET /providers, /routes, /directions/:route, /stops/:route/:direction");
            info!("  GET /departures/:stop_id, /timepoint_departures/:route/:direction/:stop");
            info!("  GET /vehicle_locations/:route");

            if let Err(e) = axum::serve(listener, app).await {
                error!("server error: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
    }
}
