mod abstraction;
pub(crate) mod config;
mod schema;
mod start;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::cnf::LOGO;

const INFO: &str = "
To get started, point boltql at a JSON file of model definitions:

  boltql start --models models.json

The GraphQL endpoint is then served on /graphql, and the CRUD API on /api.
";

#[derive(Parser, Debug)]
#[command(name = "boltql command-line interface and server", bin_name = "boltql")]
#[command(about = INFO, before_help = LOGO)]
#[command(version, arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[allow(clippy::large_enum_variant)]
#[derive(Debug, Subcommand)]
enum Commands {
	#[command(about = "Start the GraphQL and CRUD API server")]
	Start(start::StartCommandArguments),
	#[command(about = "Print the GraphQL schema generated from a set of models")]
	Schema(schema::SchemaCommandArguments),
}

#[tokio::main]
pub async fn init() -> ExitCode {
	let args = Cli::parse();
	let output = match args.command {
		Commands::Start(args) => start::init(args).await,
		Commands::Schema(args) => schema::init(args).await,
	};
	if let Err(e) = output {
		error!("{e:#}");
		eprintln!("{e:#}");
		return ExitCode::FAILURE;
	}
	ExitCode::SUCCESS
}
