use std::path::PathBuf;

use anyhow::Result;
use boltql_core::gql::generate_schema;
use clap::Args;

use super::abstraction::ModelArguments;

#[derive(Args, Debug)]
pub struct SchemaCommandArguments {
	#[command(flatten)]
	models: ModelArguments,
	#[arg(help = "Write the schema to this file instead of stdout")]
	#[arg(short = 'o', long = "output")]
	output: Option<PathBuf>,
}

pub async fn init(
	SchemaCommandArguments {
		models,
		output,
	}: SchemaCommandArguments,
) -> Result<()> {
	// Initialize logging
	crate::telemetry::builder().with_log_level("warn").init()?;
	// Generate the schema
	let registry = models.load().await?;
	let sdl = generate_schema(&registry)?.sdl();
	match output {
		Some(path) => {
			tokio::fs::write(&path, sdl).await?;
			info!("Wrote the GraphQL schema to {}", path.display());
		}
		None => print!("{sdl}"),
	}
	Ok(())
}
