//! The boltql command-line host.
//!
//! Loads a set of ORM model definitions, generates the GraphQL schema for
//! them and serves it over HTTP next to the CRUD API the resolvers talk to.

#[macro_use]
extern crate tracing;

mod cli;
mod cnf;
mod err;
mod net;
mod telemetry;

use std::process::ExitCode;

fn main() -> ExitCode {
	cli::init() // Initiate the command line
}
