//! Model metadata as exposed by the ORM.
//!
//! Raw definitions are classified exactly once, when they are ingested into
//! a [`ModelRegistry`]. Every later consumer matches on [`AttributeKind`]
//! instead of inspecting loose keys.

mod raw;
mod registry;

pub use raw::{RawAttribute, RawModel};
pub use registry::{ModelRegistry, collection_name};

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// A record, as it travels through the CRUD API
pub type Record = Map<String, Value>;

/// The primitive type of a scalar attribute
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Primitive {
	Json,
	Array,
	String,
	Integer,
	Float,
	Date,
	DateTime,
	Boolean,
	ObjectId,
	/// A type name the schema has no mapping for
	Unsupported(String),
}

impl Primitive {
	pub fn parse(name: &str) -> Self {
		match name.to_ascii_lowercase().as_str() {
			"json" => Self::Json,
			"array" => Self::Array,
			"string" | "email" | "text" => Self::String,
			"integer" => Self::Integer,
			"float" => Self::Float,
			"date" => Self::Date,
			"datetime" => Self::DateTime,
			"boolean" => Self::Boolean,
			"objectid" => Self::ObjectId,
			_ => Self::Unsupported(name.to_owned()),
		}
	}
}

/// What an attribute holds, decided at ingestion
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttributeKind {
	Scalar(Primitive),
	/// A single reference to a record of another model
	ToOne {
		model: String,
	},
	/// A collection of records of another model
	ToMany {
		collection: String,
		via: Option<String>,
		through: Option<String>,
	},
	/// An attribute without any recognisable classifier
	Unclassified,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attribute {
	pub name: String,
	pub kind: AttributeKind,
	pub unique: bool,
	pub required: bool,
}

impl Attribute {
	pub fn is_association(&self) -> bool {
		matches!(
			self.kind,
			AttributeKind::ToOne {
				..
			} | AttributeKind::ToMany {
				..
			}
		)
	}

	pub fn is_to_one(&self) -> bool {
		matches!(
			self.kind,
			AttributeKind::ToOne {
				..
			}
		)
	}

	pub fn is_to_many(&self) -> bool {
		matches!(
			self.kind,
			AttributeKind::ToMany {
				..
			}
		)
	}

	/// The identity of the model records of this association are stored in.
	/// For a to-many association that is the join model when one is set.
	pub fn target(&self) -> Option<&str> {
		match &self.kind {
			AttributeKind::ToOne {
				model,
			} => Some(model),
			AttributeKind::ToMany {
				collection,
				through,
				..
			} => Some(through.as_deref().unwrap_or(collection)),
			_ => None,
		}
	}

	/// The inverse attribute name on the target model
	pub fn via(&self) -> Option<&str> {
		match &self.kind {
			AttributeKind::ToMany {
				via,
				..
			} => via.as_deref(),
			_ => None,
		}
	}
}

/// The metadata of one ORM model
#[derive(Clone, Debug)]
pub struct ModelDescriptor {
	/// The lower-case identifier of the model
	pub identity: String,
	/// The display identifier. Models without one are not exposed over GraphQL.
	pub global_id: Option<String>,
	/// The name of the primary key attribute
	pub primary_key: String,
	pub attributes: IndexMap<String, Attribute>,
}

impl ModelDescriptor {
	pub fn attribute(&self, name: &str) -> Option<&Attribute> {
		self.attributes.get(name)
	}

	pub fn associations(&self) -> impl Iterator<Item = &Attribute> {
		self.attributes.values().filter(|a| a.is_association())
	}

	pub fn is_graphable(&self) -> bool {
		self.global_id.is_some()
	}

	/// The global id, falling back to the identity with an upper-cased first letter
	pub fn global_name(&self) -> String {
		match &self.global_id {
			Some(v) => v.clone(),
			None => ucfirst(&self.identity),
		}
	}

	/// The path of this model's collection on the CRUD API
	pub fn collection_url(&self) -> String {
		format!("/{}", collection_name(&self.identity))
	}

	/// The path of one record on the CRUD API
	pub fn record_url(&self, pk: &Value) -> String {
		match pk {
			Value::String(s) => format!("{}/{s}", self.collection_url()),
			v => format!("{}/{v}", self.collection_url()),
		}
	}

	/// The primary key attribute of this model
	pub fn pk_attribute(&self) -> Option<&Attribute> {
		self.attributes.get(&self.primary_key)
	}

	/// Reads the primary key value of a record, treating null as absent
	pub fn pk_of<'a>(&self, record: &'a Record) -> Option<&'a Value> {
		record.get(&self.primary_key).filter(|v| !v.is_null())
	}
}

pub(crate) fn ucfirst(s: &str) -> String {
	let mut chars = s.chars();
	match chars.next() {
		Some(c) => c.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

pub(crate) fn lcfirst(s: &str) -> String {
	let mut chars = s.chars();
	match chars.next() {
		Some(c) => c.to_lowercase().chain(chars).collect(),
		None => String::new(),
	}
}

/// Whether a JSON value counts as set, the way the write pipeline sees it
pub(crate) fn is_truthy(v: &Value) -> bool {
	match v {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
		Value::String(s) => !s.is_empty(),
		_ => true,
	}
}
