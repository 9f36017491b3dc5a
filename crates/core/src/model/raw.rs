use indexmap::IndexMap;
use serde::Deserialize;

use super::{Attribute, AttributeKind, ModelDescriptor, Primitive};
use crate::err::Error;

/// A model definition as exported by the ORM
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawModel {
	#[serde(default)]
	pub identity: Option<String>,
	#[serde(default)]
	pub global_id: Option<String>,
	#[serde(default)]
	pub primary_key: Option<String>,
	#[serde(default)]
	pub attributes: IndexMap<String, RawAttribute>,
}

/// An attribute definition as exported by the ORM.
///
/// Accepts both the full object form and the `"name": "string"` shorthand.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(from = "Repr")]
pub struct RawAttribute {
	pub kind: Option<String>,
	pub model: Option<String>,
	pub collection: Option<String>,
	pub via: Option<String>,
	pub through: Option<String>,
	pub unique: bool,
	pub required: bool,
	pub primary_key: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
	Short(String),
	Full(Full),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Full {
	#[serde(default, rename = "type")]
	kind: Option<String>,
	#[serde(default)]
	model: Option<String>,
	#[serde(default)]
	collection: Option<String>,
	#[serde(default)]
	via: Option<String>,
	#[serde(default)]
	through: Option<String>,
	#[serde(default)]
	unique: bool,
	#[serde(default)]
	required: bool,
	#[serde(default)]
	primary_key: bool,
}

impl From<Repr> for RawAttribute {
	fn from(v: Repr) -> Self {
		match v {
			Repr::Short(kind) => RawAttribute {
				kind: Some(kind),
				..Default::default()
			},
			Repr::Full(f) => RawAttribute {
				kind: f.kind,
				model: f.model,
				collection: f.collection,
				via: f.via,
				through: f.through,
				unique: f.unique,
				required: f.required,
				primary_key: f.primary_key,
			},
		}
	}
}

impl RawAttribute {
	fn classify(&self) -> AttributeKind {
		if let Some(model) = &self.model {
			return AttributeKind::ToOne {
				model: model.to_lowercase(),
			};
		}
		if let Some(collection) = &self.collection {
			return AttributeKind::ToMany {
				collection: collection.to_lowercase(),
				via: self.via.clone(),
				through: self.through.as_ref().map(|t| t.to_lowercase()),
			};
		}
		match &self.kind {
			Some(kind) => AttributeKind::Scalar(Primitive::parse(kind)),
			None => AttributeKind::Unclassified,
		}
	}
}

impl RawModel {
	/// Classifies every attribute and resolves the primary key.
	///
	/// The registry key is used as identity when the definition has none.
	pub fn into_descriptor(self, key: &str) -> Result<ModelDescriptor, Error> {
		let identity = self.identity.as_deref().unwrap_or(key).to_lowercase();
		let flagged = self.attributes.iter().find(|(_, a)| a.primary_key).map(|(n, _)| n.clone());
		let primary_key = flagged.or(self.primary_key).unwrap_or_else(|| "id".to_owned());
		let attributes: IndexMap<String, Attribute> = self
			.attributes
			.into_iter()
			.map(|(name, raw)| {
				let attr = Attribute {
					kind: raw.classify(),
					unique: raw.unique,
					required: raw.required,
					name: name.clone(),
				};
				(name, attr)
			})
			.collect();
		if !attributes.contains_key(&primary_key) {
			return Err(Error::MissingPrimaryKey {
				model: identity,
				key: primary_key,
			});
		}
		trace!("Ingested model `{identity}` with {} attributes", attributes.len());
		Ok(ModelDescriptor {
			identity,
			global_id: self.global_id,
			primary_key,
			attributes,
		})
	}
}
