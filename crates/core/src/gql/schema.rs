use std::sync::Arc;

use async_graphql::dynamic::{Object, Scalar, Schema};

use super::error::{GqlError, schema_error};
use super::mutations::build_mutations;
use super::queries::build_queries;
use super::types::{Models, build_types};
use crate::cnf::{JSON_SCALAR, MUTATION_TYPE, QUERY_TYPE};
use crate::model::ModelRegistry;

const TARGET: &str = "boltql::gql::schema";

/// Generates the schema of every model carrying a global id
pub fn generate_schema(registry: &ModelRegistry) -> Result<Schema, GqlError> {
	let models: Models =
		registry.graphable().map(|m| (m.identity.clone(), Arc::new(m.clone()))).collect();
	if models.is_empty() {
		return Err(schema_error("no graphable models found"));
	}

	trace!(target: TARGET, models = models.len(), "generating schema");

	let types = build_types(&models)?;
	let query = build_queries(&models, Object::new(QUERY_TYPE));
	let mutation = build_mutations(&models, Object::new(MUTATION_TYPE))?;

	let mut schema = Schema::build(QUERY_TYPE, Some(MUTATION_TYPE), None)
		.register(query)
		.register(mutation)
		.register(
			Scalar::new(JSON_SCALAR)
				.description("Any JSON value")
				.specified_by_url("https://www.rfc-editor.org/rfc/rfc8259"),
		);
	for ty in types {
		schema = schema.register(ty);
	}

	schema
		.finish()
		.map_err(|e| schema_error(format!("there was an error generating schema: {e:?}")))
}
