use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::SubscriberInitExt;

use crate::err::Error;

/// How log lines are written
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum LogFormat {
	#[default]
	Text,
	Json,
}

#[derive(Default, Debug, Clone)]
pub struct Builder {
	log_level: Option<String>,
	format: LogFormat,
}

pub fn builder() -> Builder {
	Builder::default()
}

impl Builder {
	/// Set the log level on the builder
	pub fn with_log_level(mut self, log_level: &str) -> Self {
		self.log_level = Some(log_level.to_owned());
		self
	}

	/// Set the output format on the builder
	pub fn with_format(mut self, format: LogFormat) -> Self {
		self.format = format;
		self
	}

	fn filter(&self) -> Result<EnvFilter, Error> {
		let directives = match self.log_level.as_deref() {
			None => return Ok(EnvFilter::from_default_env()),
			Some("none") => "off".to_owned(),
			Some("full") => "trace".to_owned(),
			// Only our own crates log below the error level
			Some(level) => format!("error,boltql={level},boltql_core={level},tower_http={level}"),
		};
		EnvFilter::builder().parse(directives).map_err(|e| Error::Telemetry(e.to_string()))
	}

	/// Build a tracing dispatcher with the fmt subscriber
	pub fn build(self) -> Result<Box<dyn Subscriber + Send + Sync + 'static>, Error> {
		let registry = tracing_subscriber::registry().with(self.filter()?);
		let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
		Ok(match self.format {
			LogFormat::Text => Box::new(registry.with(layer.compact().with_ansi(true))),
			LogFormat::Json => Box::new(registry.with(layer.json())),
		})
	}

	/// tracing pipeline
	pub fn init(self) -> Result<(), Error> {
		self.build()?.try_init().map_err(|e| Error::Telemetry(e.to_string()))
	}
}
