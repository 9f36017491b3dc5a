use std::path::PathBuf;

use boltql_core::model::ModelRegistry;
use clap::Args;

use crate::err::Error;

#[derive(Args, Debug)]
pub(crate) struct ModelArguments {
	#[arg(help = "Path to a JSON file holding the model definitions, keyed by identity")]
	#[arg(env = "BOLTQL_MODELS", short = 'm', long = "models")]
	pub(crate) models: PathBuf,
}

impl ModelArguments {
	/// Reads and ingests the model definitions
	pub(crate) async fn load(&self) -> Result<ModelRegistry, Error> {
		let path = self.models.display().to_string();
		let text = tokio::fs::read_to_string(&self.models).await.map_err(|e| Error::ModelFile {
			path: path.clone(),
			message: e.to_string(),
		})?;
		let value = serde_json::from_str(&text).map_err(|e| Error::ModelFile {
			path,
			message: e.to_string(),
		})?;
		let registry = ModelRegistry::from_json(value)?;
		info!("Loaded {} models from {}", registry.len(), self.models.display());
		Ok(registry)
	}
}
