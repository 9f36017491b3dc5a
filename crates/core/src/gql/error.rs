use std::fmt::Debug;

use async_graphql::{ErrorExtensions, InputType, InputValueError, ServerError, Value as GqlValue};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::err::Error;

#[derive(Debug, Error)]
pub enum GqlError {
	#[error("{0}")]
	Core(Error),
	#[error("Error generating schema: {0}")]
	SchemaError(String),
	#[error("Error resolving request: {0}")]
	ResolverError(String),
	#[error("Internal Error: {0}")]
	InternalError(String),
	#[error("The query {0} returned no results.")]
	NoResults(Value),
}

pub fn schema_error(msg: impl Into<String>) -> GqlError {
	GqlError::SchemaError(msg.into())
}

pub fn resolver_error(msg: impl Into<String>) -> GqlError {
	GqlError::ResolverError(msg.into())
}

pub fn internal_error(msg: impl Into<String>) -> GqlError {
	let msg = msg.into();
	error!("{}", msg);
	GqlError::InternalError(msg)
}

impl From<Error> for GqlError {
	fn from(value: Error) -> Self {
		GqlError::Core(value)
	}
}

impl From<serde_json::Error> for GqlError {
	fn from(value: serde_json::Error) -> Self {
		GqlError::Core(Error::Json(value))
	}
}

impl<T> From<InputValueError<T>> for GqlError
where
	T: InputType + Debug,
{
	fn from(value: InputValueError<T>) -> Self {
		GqlError::ResolverError(format!("{value:?}"))
	}
}

impl From<GqlError> for async_graphql::Error {
	fn from(value: GqlError) -> Self {
		let err = async_graphql::Error::new(value.to_string());
		let (status, body) = match &value {
			GqlError::Core(Error::Api {
				status,
				body,
				..
			}) => (status.as_u16(), Some(body.clone())),
			GqlError::Core(e) => (e.status().as_u16(), Some(e.to_body())),
			GqlError::NoResults(_) => (404, None),
			GqlError::ResolverError(_) => (400, None),
			GqlError::SchemaError(_) | GqlError::InternalError(_) => (500, None),
		};
		err.extend_with(|_, e| {
			e.set("status", status);
			if let Some(body) = body.and_then(|b| GqlValue::from_json(b).ok()) {
				e.set("body", body);
			}
		})
	}
}

/// Reshapes execution errors for clients. Errors carrying a CRUD response
/// body are reported with their code, model and failed validation rules.
pub fn format_errors(errors: Vec<ServerError>) -> Vec<Value> {
	errors.into_iter().map(format_error).collect()
}

fn extension(err: &ServerError, name: &str) -> Option<Value> {
	err.extensions.as_ref()?.get(name).and_then(|v| v.clone().into_json().ok())
}

fn format_error(err: ServerError) -> Value {
	let status = extension(&err, "status");
	match extension(&err, "body") {
		Some(Value::Object(body)) if body.contains_key("code") => {
			let code = body.get("code").cloned().unwrap_or(Value::Null);
			let model = body.get("model").cloned().unwrap_or(Value::Null);
			let status = match code.as_str() {
				Some("E_VALIDATION") => Value::from(422),
				_ => body.get("status").cloned().or(status).unwrap_or(Value::Null),
			};
			let mut validation_errors = Map::new();
			if let (Some(Value::Object(invalid)), Some(model)) =
				(body.get("invalidAttributes"), model.as_str())
			{
				for (field, rules) in invalid {
					let rules = rules
						.as_array()
						.map(|r| r.iter().filter_map(|v| v.get("rule")?.as_str()).collect())
						.unwrap_or_else(Vec::new);
					let rules: Vec<Value> =
						rules.into_iter().map(|r| Value::from(format!("{model}.{r}"))).collect();
					validation_errors.insert(field.clone(), Value::Array(rules));
				}
			}
			Value::Object(obj! {
				"code" => code,
				"status" => status,
				"message" => body.get("reason").cloned().unwrap_or(Value::Null),
				"model" => model,
				"validationErrors" => validation_errors,
			})
		}
		_ => Value::Object(obj! {
			"message" => err.message,
			"status", if status.is_some() => status,
			"path" => serde_json::to_value(&err.path).unwrap_or(Value::Null),
			"locations" => serde_json::to_value(&err.locations).unwrap_or(Value::Null),
		}),
	}
}
