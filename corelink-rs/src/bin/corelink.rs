//! CLI for corelink: fetch value descriptors from core-data, statically or through Consul.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use corelink_rs::{
    consul_url_from_env, load_params, select_discovery, Discovery, EndpointParams,
    RequestContext, ValueDescriptor, ValueDescriptorClient, ValueDescriptorRestClient,
    API_VALUE_DESCRIPTOR_ROUTE, CORE_DATA_SERVICE_KEY,
};
use tracing_subscriber::EnvFilter;

/// Env prefix for endpoint overrides: CORELINK_URL, CORELINK_USE_REGISTRY, CORELINK_INTERVAL_MS,
/// CORELINK_CONSUL_URL.
const ENV_PREFIX: &str = "CORELINK";

#[derive(Parser)]
#[command(name = "corelink")]
#[command(about = "corelink CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch value descriptors from core-data and print them as JSON.
    ValueDescriptors {
        /// Static core-data URL including the route
        #[arg(long, default_value = "http://localhost:48080/api/v1/valuedescriptor")]
        url: String,
        /// Endpoint params JSON file (overrides --url and --service-key)
        #[arg(long)]
        params: Option<PathBuf>,
        /// Consul agent URL (or CORELINK_CONSUL_URL); enables registry mode
        #[arg(long)]
        consul: Option<String>,
        #[arg(long, default_value = CORE_DATA_SERVICE_KEY)]
        service_key: String,
        /// Registry poll interval in milliseconds
        #[arg(long, default_value_t = 15_000)]
        interval_ms: u64,
        /// Only the descriptor with this name
        #[arg(long, conflicts_with_all = ["label", "device"])]
        name: Option<String>,
        /// Only descriptors with this label
        #[arg(long, conflicts_with = "device")]
        label: Option<String>,
        /// Only descriptors used by this device
        #[arg(long)]
        device: Option<String>,
        /// Overall timeout in milliseconds, including the first registry resolution
        #[arg(long, default_value_t = 10_000)]
        timeout_ms: u64,
    },
}

struct Filter {
    name: Option<String>,
    label: Option<String>,
    device: Option<String>,
}

async fn run_value_descriptors(
    params: EndpointParams,
    discovery: Discovery,
    filter: Filter,
    timeout: Duration,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ctx = RequestContext::background().with_timeout(timeout);
    let use_registry = params.use_registry;
    let client = ValueDescriptorRestClient::new(params, discovery.build());

    if use_registry {
        let url = ctx
            .run(async { Ok(client.endpoint().wait_resolved().await) })
            .await?;
        tracing::info!(%url, "endpoint resolved");
    }

    let descriptors: Vec<ValueDescriptor> = if let Some(name) = filter.name {
        vec![client.value_descriptor_for_name(&ctx, &name).await?]
    } else if let Some(label) = filter.label {
        client.value_descriptors_by_label(&ctx, &label).await?
    } else if let Some(device) = filter.device {
        client.value_descriptors_for_device(&ctx, &device).await?
    } else {
        client.value_descriptors(&ctx).await?
    };
    tracing::info!(count = descriptors.len(), url = %client.url(), "fetched value descriptors");
    println!("{}", serde_json::to_string_pretty(&descriptors)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::ValueDescriptors {
            url,
            params,
            consul,
            service_key,
            interval_ms,
            name,
            label,
            device,
            timeout_ms,
        } => {
            let mut endpoint_params = match params {
                Some(path) => load_params(&path, ENV_PREFIX)?,
                None => EndpointParams::new(&service_key, API_VALUE_DESCRIPTOR_ROUTE, &url)
                    .interval(Duration::from_millis(interval_ms))
                    .apply_env(ENV_PREFIX),
            };
            let consul = consul.or_else(|| consul_url_from_env(ENV_PREFIX));
            let discovery =
                select_discovery(&mut endpoint_params, consul.as_deref(), ENV_PREFIX)?;
            let filter = Filter {
                name,
                label,
                device,
            };
            run_value_descriptors(
                endpoint_params,
                discovery,
                filter,
                Duration::from_millis(timeout_ms),
            )
            .await
        }
    }
}
