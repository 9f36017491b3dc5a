//! The seam between the CRUD blueprint actions and the ORM.

use async_trait::async_trait;
use serde_json::Value;

use crate::crud::Criteria;
use crate::err::Error;
use crate::model::{ModelDescriptor, Record};

/// An association to populate onto fetched records
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Populate {
	pub alias: String,
	pub limit: u64,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SortField {
	pub field: String,
	pub ascending: bool,
}

#[derive(Clone, Debug, Default)]
pub struct FindQuery {
	pub criteria: Criteria,
	pub skip: u64,
	pub limit: Option<u64>,
	pub sort: Vec<SortField>,
	pub populate: Vec<Populate>,
}

impl FindQuery {
	pub fn new(criteria: Criteria) -> Self {
		Self {
			criteria,
			..Default::default()
		}
	}
}

/// The data access operations the blueprint actions rely on.
///
/// Implementations report validation failures as [`Error::Validation`] so
/// they can be reshaped for GraphQL clients.
#[async_trait]
pub trait Store: Send + Sync {
	async fn find(&self, model: &ModelDescriptor, query: &FindQuery) -> Result<Vec<Record>, Error>;

	async fn count(&self, model: &ModelDescriptor, criteria: &Criteria) -> Result<u64, Error>;

	async fn find_one(
		&self,
		model: &ModelDescriptor,
		pk: &Value,
		populate: &[Populate],
	) -> Result<Option<Record>, Error>;

	async fn create(&self, model: &ModelDescriptor, values: Record) -> Result<Record, Error>;

	/// Updates the record with the given primary key, returning every updated record
	async fn update(
		&self,
		model: &ModelDescriptor,
		pk: &Value,
		values: Record,
	) -> Result<Vec<Record>, Error>;

	/// Destroys the record with the given primary key, returning every destroyed record
	async fn destroy(&self, model: &ModelDescriptor, pk: &Value) -> Result<Vec<Record>, Error>;
}
