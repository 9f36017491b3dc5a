//! Discovery of the inverse side of many-to-many associations.
//!
//! A find on `category` filtered by `{"tags": [1, 2]}` cannot be answered
//! from the category table alone. The inverse alias map records that the
//! `tags` association on `category` is mirrored by the `categories`
//! association on `tag`, so the find can look up tags 1 and 2, populate
//! their categories, and filter on the collected category keys.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::model::{AttributeKind, ModelRegistry};

/// Where the inverse side of a many-to-many association lives
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InverseAlias {
	/// The identity of the model holding the inverse association
	pub collection: String,
	/// The name of the inverse association on that model
	pub alias: String,
}

/// model identity → alias → inverse side
pub type AliasMap = HashMap<String, HashMap<String, InverseAlias>>;

/// The lazily built inverse alias map.
///
/// The map is built on first use and kept for the lifetime of the owner.
/// It is never invalidated, so models registered later are not seen.
#[derive(Debug, Default)]
pub struct InverseAliasMap {
	inner: OnceLock<AliasMap>,
}

impl InverseAliasMap {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_built(&self) -> bool {
		self.inner.get().is_some()
	}

	/// Returns the map, building it from the registry on first use
	pub fn get_or_build(&self, registry: &ModelRegistry) -> &AliasMap {
		self.inner.get_or_init(|| build(registry))
	}

	/// The many-to-many aliases of one model
	pub fn for_model(
		&self,
		registry: &ModelRegistry,
		identity: &str,
	) -> Option<&HashMap<String, InverseAlias>> {
		self.get_or_build(registry).get(identity).filter(|m| !m.is_empty())
	}
}

fn build(registry: &ModelRegistry) -> AliasMap {
	let mut map = AliasMap::new();
	for model in registry.graphable() {
		let mut aliases = HashMap::new();
		for assoc in model.associations() {
			let AttributeKind::ToMany {
				via: Some(via),
				..
			} = &assoc.kind
			else {
				continue;
			};
			let Some(target) = assoc.target().and_then(|t| registry.find(t)) else {
				continue;
			};
			let inverse = target.attributes.values().find(|a| &a.name == via && a.is_to_many());
			if let Some(inverse) = inverse {
				aliases.insert(
					assoc.name.clone(),
					InverseAlias {
						collection: target.identity.clone(),
						alias: inverse.name.clone(),
					},
				);
			}
		}
		map.insert(model.identity.clone(), aliases);
	}
	debug!("Built the inverse alias map for {} models", map.len());
	map
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn registry() -> ModelRegistry {
		ModelRegistry::from_json(json!({
			"category": {"globalId": "Category", "attributes": {
				"id": "integer",
				"tags": {"collection": "tag", "via": "categories"},
				"products": {"collection": "product", "via": "category"},
			}},
			"tag": {"globalId": "Tag", "attributes": {
				"id": "integer",
				"categories": {"collection": "category", "via": "tags"},
			}},
			"product": {"globalId": "Product", "attributes": {
				"id": "integer",
				"category": {"model": "category"},
			}},
			"shadow": {"attributes": {
				"id": "integer",
				"tags": {"collection": "tag", "via": "shadows"},
			}},
		}))
		.unwrap()
	}

	#[test]
	fn pairs_many_to_many_aliases() {
		let registry = registry();
		let map = InverseAliasMap::new();
		assert!(!map.is_built());
		let category = map.for_model(&registry, "category").unwrap();
		assert_eq!(
			category["tags"],
			InverseAlias {
				collection: "tag".into(),
				alias: "categories".into()
			}
		);
		assert!(!category.contains_key("products"));
		assert_eq!(map.for_model(&registry, "tag").unwrap()["categories"].alias, "tags");
		assert!(map.for_model(&registry, "product").is_none());
		assert!(map.for_model(&registry, "shadow").is_none());
		assert!(map.is_built());
	}

	#[test]
	fn built_once() {
		let registry = registry();
		let map = InverseAliasMap::new();
		let first = map.get_or_build(&registry) as *const AliasMap;
		let second = map.get_or_build(&ModelRegistry::new()) as *const AliasMap;
		assert_eq!(first, second);
	}
}
