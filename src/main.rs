//! Resource service CLI.
//!
//! # Commands
//! ```text
//! resource-cli [--config service.toml] fetch <url> [--cache] [--retries N] [--pin-key KEY]
//! resource-cli [--config service.toml] submit <url> [json] [--retries N] [--pin-key KEY]
//! resource-cli [--config service.toml] cache
//! ```
//!
//! `submit` without a payload sends an all-fake pair.

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use resource_service::config::{load_config, ServiceConfig};
use resource_service::net::{HttpTransport, PinningTrustEvaluation, TrustEvaluation};
use resource_service::observability::logging::init_logging;
use resource_service::resource::{
    EmptyReceiveResource, EmptySendResource, JsonReceiveResource, PaddingJsonSendResource,
};
use resource_service::{Locator, PlausibleDeniability, Resource, ResponseCache, Service};

#[derive(Parser)]
#[command(name = "resource-cli")]
#[command(about = "Load and submit HTTP resources through the resource service", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a JSON resource and print it
    Fetch {
        url: String,
        /// Revalidate with the persisted cache and fall back to it
        #[arg(long)]
        cache: bool,
        #[arg(short, long, default_value_t = 0)]
        retries: u32,
        /// Pinning key from the [pinning] config section
        #[arg(long)]
        pin_key: Option<String>,
    },
    /// POST a padded JSON object, paired with a fake request
    Submit {
        url: String,
        /// JSON object to send; omit to send fakes only
        json: Option<String>,
        #[arg(short, long, default_value_t = 0)]
        retries: u32,
        #[arg(long)]
        pin_key: Option<String>,
    },
    /// List persisted cache entries
    Cache,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    init_logging(&config.observability);

    let cache = Arc::new(match &config.cache.persistence_path {
        Some(path) => ResponseCache::load_from_file(path)?,
        None => ResponseCache::new(None),
    });

    match cli.command {
        Commands::Fetch {
            url,
            cache: use_cache,
            retries,
            pin_key,
        } => {
            let service = build_service(&config, cache.clone())?;
            let (locator, trust) = locate(&config, &url, pin_key, false)?;

            let resource = Resource::new(locator, EmptySendResource, JsonReceiveResource::<Value>::new())
                .retrying(retries)
                .trust(trust);
            let resource = if use_cache { resource.caching() } else { resource };

            let value = service.load(&resource).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
            cache.save_to_file()?;
        }
        Commands::Submit {
            url,
            json,
            retries,
            pin_key,
        } => {
            let service = Arc::new(build_service(&config, cache.clone())?);
            let scheduler = PlausibleDeniability::new(service);
            let (locator, trust) = locate(&config, &url, pin_key, true)?;

            match json {
                Some(json) => {
                    let payload: Value = serde_json::from_str(&json)?;
                    let resource = Resource::new(locator, PaddingJsonSendResource::new(payload), EmptyReceiveResource)
                        .retrying(retries)
                        .trust(trust);
                    scheduler.submit(&resource).await?;
                    println!("Submitted");
                }
                None => {
                    let resource = Resource::new(
                        locator,
                        PaddingJsonSendResource::new(Value::Object(Default::default())),
                        EmptyReceiveResource,
                    )
                    .retrying(retries)
                    .trust(trust);
                    scheduler.submit_empty(&resource).await;
                    println!("Sent empty submission");
                }
            }
        }
        Commands::Cache => {
            if config.cache.persistence_path.is_none() {
                eprintln!("No cache.persistence_path configured");
                return Ok(());
            }
            for entry in cache.entries() {
                println!(
                    "{}  etag={}  stored_at={}  bytes={}",
                    entry.key,
                    entry.etag.as_deref().unwrap_or("-"),
                    entry.date,
                    entry.data.len()
                );
            }
        }
    }

    Ok(())
}

fn build_service(
    config: &ServiceConfig,
    cache: Arc<ResponseCache>,
) -> Result<Service, Box<dyn std::error::Error>> {
    let transport = HttpTransport::new(config.transport.clone())?;
    Ok(Service::new(Arc::new(transport), cache, config))
}

fn locate(
    config: &ServiceConfig,
    url: &str,
    pin_key: Option<String>,
    submit: bool,
) -> Result<(Locator, Arc<dyn TrustEvaluation>), Box<dyn std::error::Error>> {
    let key = pin_key.clone().unwrap_or_else(|| "default".to_string());
    let locator = if submit {
        Locator::post(url, key)?
    } else {
        Locator::get(url, key)?
    };

    let trust: Arc<dyn TrustEvaluation> = match pin_key {
        Some(_) => Arc::new(PinningTrustEvaluation::from_config(&config.pinning)?),
        None => Arc::new(resource_service::net::DisabledTrustEvaluation),
    };
    Ok((locator, trust))
}
