use indexmap::IndexMap;
use inflector::Inflector;
use serde_json::Value;

use super::{ModelDescriptor, RawModel};
use crate::err::Error;

/// All models known to the ORM, keyed by identity
#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
	models: IndexMap<String, ModelDescriptor>,
}

impl ModelRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Ingests raw model definitions keyed by identity
	pub fn from_raw(raw: IndexMap<String, RawModel>) -> Result<Self, Error> {
		let mut registry = Self::new();
		for (key, model) in raw {
			registry.insert(model.into_descriptor(&key)?);
		}
		debug!("Loaded {} models into the registry", registry.models.len());
		Ok(registry)
	}

	/// Ingests a JSON object of raw model definitions keyed by identity
	pub fn from_json(value: Value) -> Result<Self, Error> {
		Self::from_raw(serde_json::from_value(value)?)
	}

	pub fn insert(&mut self, model: ModelDescriptor) {
		self.models.insert(model.identity.clone(), model);
	}

	/// Fetches a model, failing when the identity is unknown
	pub fn get(&self, identity: &str) -> Result<&ModelDescriptor, Error> {
		self.find(identity).ok_or_else(|| Error::ModelNotFound(identity.to_owned()))
	}

	pub fn find(&self, identity: &str) -> Option<&ModelDescriptor> {
		self.models.get(&identity.to_lowercase())
	}

	/// Finds the model whose collection path segment is `name`
	pub fn by_collection(&self, name: &str) -> Option<&ModelDescriptor> {
		let name = name.to_lowercase();
		self.models.values().find(|m| collection_name(&m.identity) == name || m.identity == name)
	}

	pub fn iter(&self) -> impl Iterator<Item = &ModelDescriptor> {
		self.models.values()
	}

	/// The models exposed over GraphQL, which are those with a global id
	pub fn graphable(&self) -> impl Iterator<Item = &ModelDescriptor> {
		self.models.values().filter(|m| m.is_graphable())
	}

	pub fn len(&self) -> usize {
		self.models.len()
	}

	pub fn is_empty(&self) -> bool {
		self.models.is_empty()
	}
}

/// The pluralised identity under which a model's records are served
pub fn collection_name(identity: &str) -> String {
	identity.to_plural()
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn graphable_skips_join_models() {
		let registry = ModelRegistry::from_json(json!({
			"category": {"globalId": "Category", "attributes": {"id": "integer"}},
			"categorytag": {"attributes": {"id": "integer"}},
		}))
		.unwrap();
		assert_eq!(registry.len(), 2);
		let names: Vec<_> = registry.graphable().map(|m| m.identity.as_str()).collect();
		assert_eq!(names, vec!["category"]);
	}

	#[test]
	fn lookups() {
		let registry = ModelRegistry::from_json(json!({
			"category": {"globalId": "Category", "attributes": {"id": "integer"}},
		}))
		.unwrap();
		assert!(registry.get("Category").is_ok());
		assert!(matches!(registry.get("nope"), Err(Error::ModelNotFound(_))));
		assert_eq!(registry.by_collection("categories").map(|m| m.identity.as_str()), Some("category"));
		assert!(registry.by_collection("products").is_none());
	}
}
