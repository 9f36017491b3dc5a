use std::fmt::Debug;
use std::sync::Arc;

use async_graphql::dynamic::Schema;
use tokio::sync::OnceCell;

use super::error::GqlError;
use super::schema::generate_schema;
use crate::model::ModelRegistry;

/// Holds the generated schema. The schema is generated on first use and
/// kept for the lifetime of the cache.
#[derive(Clone)]
pub struct SchemaCache {
	inner: Arc<OnceCell<Schema>>,
	pub registry: Arc<ModelRegistry>,
}

impl Debug for SchemaCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SchemaCache")
			.field("built", &self.inner.initialized())
			.field("models", &self.registry.len())
			.finish()
	}
}

impl SchemaCache {
	pub fn new(registry: Arc<ModelRegistry>) -> Self {
		SchemaCache {
			inner: Default::default(),
			registry,
		}
	}

	pub fn is_built(&self) -> bool {
		self.inner.initialized()
	}

	/// Returns the schema, generating it first if needed
	pub async fn ensure_built(&self) -> Result<&Schema, GqlError> {
		self.inner
			.get_or_try_init(|| async {
				debug!("Generating the GraphQL schema for {} models", self.registry.len());
				generate_schema(&self.registry)
			})
			.await
	}
}
