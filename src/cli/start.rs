use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use boltql_core::cnf::PUBLISH_CAPACITY;
use boltql_core::crud::{Blueprint, Publisher};
use boltql_core::gql::GraphqlService;
use boltql_core::mem::MemoryStore;
use clap::Args;

use super::abstraction::ModelArguments;
use super::config::{CF, Config};
use crate::cnf::{DEFAULT_BIND, LOGO};
use crate::net::{self, AppState};
use crate::telemetry::LogFormat;

#[derive(Args, Debug)]
pub struct StartCommandArguments {
	#[command(flatten)]
	models: ModelArguments,
	#[arg(help = "The hostname or ip address to listen for connections on")]
	#[arg(env = "BOLTQL_BIND", short = 'b', long = "bind")]
	#[arg(default_value = DEFAULT_BIND)]
	listen_address: SocketAddr,
	#[arg(help = "The logging level for the server")]
	#[arg(env = "BOLTQL_LOG", short = 'l', long = "log")]
	#[arg(default_value = "info")]
	#[arg(value_parser = ["none", "full", "error", "warn", "info", "debug", "trace"])]
	log: String,
	#[arg(help = "The format of the log output")]
	#[arg(env = "BOLTQL_LOG_FORMAT", long = "log-format", value_enum)]
	#[arg(default_value_t = LogFormat::Text)]
	log_format: LogFormat,
	#[arg(help = "Whether to hide the startup banner")]
	#[arg(env = "BOLTQL_NO_BANNER", long)]
	no_banner: bool,
}

pub async fn init(
	StartCommandArguments {
		models,
		listen_address,
		log,
		log_format,
		no_banner,
	}: StartCommandArguments,
) -> Result<()> {
	// Initialize logging
	crate::telemetry::builder().with_log_level(&log).with_format(log_format).init()?;
	// Check if a banner should be outputted
	if !no_banner {
		println!("{LOGO}");
	}
	// Setup the cli options
	let config = CF.get_or_init(|| Config {
		bind: listen_address,
		models: models.models.clone(),
	});
	// Load the model definitions
	let registry = Arc::new(models.load().await?);
	let store = Arc::new(MemoryStore::new(registry.clone()));
	let blueprint = Arc::new(
		Blueprint::new(registry.clone(), store).with_publisher(Publisher::new(*PUBLISH_CAPACITY)),
	);
	let service = GraphqlService::new(registry, blueprint.clone());
	// Schema problems are fatal, so surface them before accepting connections
	service.ensure_built().await.context("Failed to generate the GraphQL schema")?;
	// Start the web server
	net::init(
		config,
		AppState {
			service,
			blueprint,
		},
	)
	.await?;
	Ok(())
}
