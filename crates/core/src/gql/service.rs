use std::sync::Arc;

use async_graphql::{Request, Variables};
use http::HeaderMap;
use serde_json::Value;

use super::cache::SchemaCache;
use super::error::{GqlError, format_errors};
use super::ext::TryIntoExt;
use super::resolvers::RequestData;
use crate::api::Dispatch;
use crate::model::ModelRegistry;

const TARGET: &str = "boltql::gql";

/// The standard introspection query
pub const INTROSPECTION_QUERY: &str = r#"
query IntrospectionQuery {
	__schema {
		queryType { name }
		mutationType { name }
		subscriptionType { name }
		types { ...FullType }
		directives {
			name
			description
			locations
			args { ...InputValue }
		}
	}
}

fragment FullType on __Type {
	kind
	name
	description
	fields(includeDeprecated: true) {
		name
		description
		args { ...InputValue }
		type { ...TypeRef }
		isDeprecated
		deprecationReason
	}
	inputFields { ...InputValue }
	interfaces { ...TypeRef }
	enumValues(includeDeprecated: true) {
		name
		description
		isDeprecated
		deprecationReason
	}
	possibleTypes { ...TypeRef }
}

fragment InputValue on __InputValue {
	name
	description
	type { ...TypeRef }
	defaultValue
}

fragment TypeRef on __Type {
	kind
	name
	ofType {
		kind
		name
		ofType {
			kind
			name
			ofType {
				kind
				name
				ofType {
					kind
					name
					ofType {
						kind
						name
						ofType {
							kind
							name
							ofType {
								kind
								name
							}
						}
					}
				}
			}
		}
	}
}
"#;

/// Executes GraphQL requests against the generated schema, resolving every
/// field through a [`Dispatch`]
#[derive(Clone)]
pub struct GraphqlService {
	cache: SchemaCache,
	dispatch: Arc<dyn Dispatch>,
}

impl GraphqlService {
	pub fn new(registry: Arc<ModelRegistry>, dispatch: Arc<dyn Dispatch>) -> Self {
		Self {
			cache: SchemaCache::new(registry),
			dispatch,
		}
	}

	pub fn cache(&self) -> &SchemaCache {
		&self.cache
	}

	/// Generates the schema if it has not been generated yet
	pub async fn ensure_built(&self) -> Result<(), GqlError> {
		self.cache.ensure_built().await.map(|_| ())
	}

	/// Executes one operation, returning `{data, errors?}` with any errors
	/// reshaped for clients
	pub async fn execute(
		&self,
		query: &str,
		variables: Option<Value>,
		headers: HeaderMap,
	) -> Result<Value, GqlError> {
		let schema = self.cache.ensure_built().await?;
		let mut request = Request::new(query)
			.data(RequestData::new(self.dispatch.clone(), headers));
		if let Some(vars) = variables.filter(Value::is_object) {
			request = request.variables(Variables::from_json(vars));
		}
		trace!(target: TARGET, "Executing GraphQL operation");
		let response = schema.execute(request).await;
		let data: Value = response.data.try_intox()?;
		let mut out = obj! { "data" => data };
		if !response.errors.is_empty() {
			debug!(target: TARGET, "GraphQL operation finished with {} errors", response.errors.len());
			out.insert("errors".to_owned(), Value::Array(format_errors(response.errors)));
		}
		Ok(Value::Object(out))
	}

	/// Runs the standard introspection query
	pub async fn introspect(&self, headers: HeaderMap) -> Result<Value, GqlError> {
		self.execute(INTROSPECTION_QUERY, None, headers).await
	}

	/// The schema in SDL form
	pub async fn sdl(&self) -> Result<String, GqlError> {
		Ok(self.cache.ensure_built().await?.sdl())
	}
}
