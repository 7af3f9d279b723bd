mod address;
mod api;
mod config;
mod error;
mod hostname;
mod provider;
mod response;
mod updater;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use time::macros::format_description;

use crate::provider::cloudflare::CloudflareClient;
use crate::updater::DnsRecordUpdater;

#[derive(Parser, Debug)]
#[command(name = "flare-dyndns")]
#[command(about = "DynDNS update endpoint that pushes router addresses to Cloudflare")]
struct Args {
    /// Optional TOML configuration file; environment variables override it
    #[arg(short, long, env = "DDNS_CONFIG")]
    config: Option<PathBuf>,
}

fn init_logger(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            let timestamp = time::OffsetDateTime::now_utc()
                .format(format_description!(
                    "[year]-[month]-[day] [hour]:[minute]:[second],[subsecond digits:3]"
                ))
                .unwrap_or_default();
            writeln!(
                buf,
                "{} [{}] {}: {}",
                timestamp,
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Configuration comes first so the logger can use its level
    let config = config::Config::load(args.config.as_deref())?;

    init_logger(&config.server.log_level);

    if let Some(path) = &args.config {
        info!("Loaded configuration from: {}", path.display());
    }
    info!(
        "Managing {} hostname(s): {:?}",
        config.hostnames().len(),
        config.hostnames()
    );
    for name in config.hostnames() {
        if let Err(err) = hostname::resolve(name) {
            warn!("{}; updates for it will report an error", err);
        }
    }

    let client = CloudflareClient::new(
        config.cloudflare.api_base.clone(),
        config.cloudflare.api_token.clone(),
    );
    let app = api::create_router(api::AppState {
        hostnames: config.hostnames().to_vec(),
        mode: config.server.response_mode,
        updater: DnsRecordUpdater::new(Arc::new(client)),
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server listening on http://{}", addr);
    info!(
        "DDNS endpoint: GET /update?ipv4=<ip>&ipv6=<ip6>&ipv6lanprefix=<prefix> ({:?} responses)",
        config.server.response_mode
    );

    axum::serve(listener, app).await?;

    Ok(())
}
