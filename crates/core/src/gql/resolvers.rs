//! Field resolvers. Every resolver answers by issuing an internal request
//! against the CRUD API and reshaping the response body.

use std::sync::Arc;

use async_graphql::Value as GqlValue;
use async_graphql::dynamic::{FieldValue, ResolverContext};
use http::HeaderMap;
use serde_json::{Map, Value};

use super::error::{GqlError, internal_error, resolver_error};
use super::ext::{JsonValueExt, TryIntoExt};
use crate::api::{ApiRequest, Dispatch, DispatchExt};
use crate::cnf::RANGE_LIMIT;
use crate::model::{ModelDescriptor, is_truthy};

const TARGET: &str = "boltql::gql::resolvers";

/// The per-request data every resolver reads
#[derive(Clone)]
pub struct RequestData {
	pub dispatch: Arc<dyn Dispatch>,
	/// Headers forwarded with every internal request
	pub headers: HeaderMap,
}

impl RequestData {
	pub fn new(dispatch: Arc<dyn Dispatch>, headers: HeaderMap) -> Self {
		Self {
			dispatch,
			headers,
		}
	}

	async fn send(&self, req: ApiRequest) -> Result<Value, GqlError> {
		let req = req.with_headers(self.headers.clone()).graphql();
		trace!(target: TARGET, "Resolving through {} {}", req.method, req.path);
		Ok(self.dispatch.send(req).await?)
	}
}

/// How a nested collection is filtered by the record it hangs off
#[derive(Clone, Debug)]
pub struct ParentLink {
	/// The criteria key carrying the parent's key
	pub field: String,
	/// The primary key attribute of the parent
	pub key: String,
}

fn request_data<'a>(ctx: &ResolverContext<'a>) -> Result<&'a RequestData, GqlError> {
	ctx.data::<RequestData>().map_err(|e| internal_error(e.message))
}

fn parent_record<'a>(ctx: &ResolverContext<'a>) -> Result<&'a Value, GqlError> {
	ctx.parent_value
		.downcast_ref::<Value>()
		.ok_or_else(|| internal_error("the parent value of a field is not a record"))
}

fn record<'a>(value: Value) -> Option<FieldValue<'a>> {
	match value {
		Value::Null => None,
		v => Some(FieldValue::owned_any(v)),
	}
}

/// Reads a scalar attribute off the parent record
pub fn scalar<'a>(ctx: &ResolverContext<'a>, name: &str) -> Result<Option<FieldValue<'a>>, GqlError> {
	match parent_record(ctx)?.get(name) {
		None | Some(Value::Null) => Ok(None),
		Some(v) => {
			let v: GqlValue = v.clone().try_intox()?;
			Ok(Some(FieldValue::value(v)))
		}
	}
}

/// Reads a list of records off the parent record
pub fn records<'a>(ctx: &ResolverContext<'a>, name: &str) -> Result<Option<FieldValue<'a>>, GqlError> {
	match parent_record(ctx)?.get(name) {
		Some(Value::Array(items)) => {
			Ok(Some(FieldValue::list(items.iter().cloned().map(FieldValue::owned_any))))
		}
		None | Some(Value::Null) => Ok(None),
		Some(v) => Err(internal_error(format!("expected a list of records, found {v}"))),
	}
}

/// Unwraps a single record out of a find response. A paginated envelope
/// must hold at least one record.
fn unwrap_single(body: Value, query: Map<String, Value>) -> Result<Option<Value>, GqlError> {
	let body = match body {
		Value::Object(mut o) if o.get("data").is_some_and(Value::is_array) => match o.remove("data") {
			Some(Value::Array(items)) if !items.is_empty() => Value::Array(items),
			_ => return Err(GqlError::NoResults(Value::Object(query))),
		},
		body => body,
	};
	match body {
		Value::Array(items) => Ok(items.into_iter().next()),
		Value::Null => Ok(None),
		body => Ok(Some(body)),
	}
}

/// Finds one record by the unique attributes given as arguments
pub async fn get_single<'a>(
	ctx: &ResolverContext<'a>,
	model: &ModelDescriptor,
) -> Result<Option<FieldValue<'a>>, GqlError> {
	let query: Map<String, Value> = ctx.args.as_index_map().try_intox()?;
	let req = ApiRequest::get(model.collection_url()).with_query(query.clone());
	let body = request_data(ctx)?.send(req).await?;
	Ok(unwrap_single(body, query)?.and_then(record))
}

/// Follows a to-one association. A populated record is returned as is,
/// a bare key is looked up.
pub async fn get_nested_single<'a>(
	ctx: &ResolverContext<'a>,
	field: &str,
	model: &ModelDescriptor,
) -> Result<Option<FieldValue<'a>>, GqlError> {
	match parent_record(ctx)?.get(field) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::Object(o)) => Ok(Some(FieldValue::owned_any(Value::Object(o.clone())))),
		Some(id) => {
			let query = obj! { "id" => id.clone() };
			let req = ApiRequest::get(model.collection_url()).with_query(query.clone());
			let body = request_data(ctx)?.send(req).await?;
			Ok(unwrap_single(body, query)?.and_then(record))
		}
	}
}

/// The page size of a range. Missing or non-positive limits fall back to
/// the configured default, which is itself never below one.
fn page_size(limit: Option<i64>, fallback: i64) -> i64 {
	limit.filter(|v| *v > 0).unwrap_or(fallback).max(1)
}

/// Fetches a page of records, filtered by the parent record when the
/// field hangs off one
pub async fn get_range<'a>(
	ctx: &ResolverContext<'a>,
	model: &ModelDescriptor,
	parent: Option<&ParentLink>,
) -> Result<Option<FieldValue<'a>>, GqlError> {
	let args: Map<String, Value> = ctx.args.as_index_map().try_intox()?;
	let mut filter = match args.get("where") {
		Some(Value::String(s)) => s.clone(),
		_ => "{}".to_owned(),
	};
	let limit = page_size(args.get("limit").and_then(Value::as_integer), *RANGE_LIMIT);
	let skip = args.get("skip").and_then(Value::as_integer).filter(|v| *v >= 0).unwrap_or(0);
	let sort = match args.get("sort") {
		Some(Value::String(s)) => s.clone(),
		_ => String::new(),
	};
	if let Some(link) = parent {
		if let Some(id) = parent_record(ctx)?.get(&link.key).filter(|v| is_truthy(v)) {
			let mut criteria = match serde_json::from_str::<Value>(&filter) {
				Ok(Value::Object(o)) => o,
				_ => Map::new(),
			};
			criteria.insert(link.field.clone(), id.clone());
			filter = Value::Object(criteria).to_string();
		}
	}
	let query = obj! {
		"where" => filter,
		"limit" => limit,
		"skip" => skip,
		"sort" => sort,
	};
	let body = request_data(ctx)?.send(ApiRequest::get(model.collection_url()).with_query(query)).await?;
	let total = body.pointer("/meta/total").and_then(Value::as_integer).unwrap_or(0);
	let edges = match body.get("data") {
		Some(Value::Array(items)) => Value::Array(items.clone()),
		_ => Value::Array(vec![]),
	};
	let connection = obj! {
		"page" => skip / limit + 1,
		"pages" => (total + limit - 1) / limit,
		"perPage" => limit,
		"total" => total,
		"edges" => edges,
	};
	Ok(Some(FieldValue::owned_any(Value::Object(connection))))
}

fn input(ctx: &ResolverContext<'_>, name: &str) -> Result<Value, GqlError> {
	match ctx.args.as_index_map().get(name) {
		Some(v) => v.clone().try_intox(),
		None => Err(resolver_error(format!("missing the `{name}` argument"))),
	}
}

pub async fn create<'a>(
	ctx: &ResolverContext<'a>,
	model: &ModelDescriptor,
	input_name: &str,
) -> Result<Option<FieldValue<'a>>, GqlError> {
	let req = ApiRequest::post(model.collection_url()).with_body(input(ctx, input_name)?);
	Ok(record(request_data(ctx)?.send(req).await?))
}

pub async fn update<'a>(
	ctx: &ResolverContext<'a>,
	model: &ModelDescriptor,
	input_name: &str,
) -> Result<Option<FieldValue<'a>>, GqlError> {
	let id = input(ctx, "id")?;
	let req = ApiRequest::put(model.record_url(&id)).with_body(input(ctx, input_name)?);
	Ok(record(request_data(ctx)?.send(req).await?))
}

pub async fn delete<'a>(
	ctx: &ResolverContext<'a>,
	model: &ModelDescriptor,
) -> Result<Option<FieldValue<'a>>, GqlError> {
	let id = input(ctx, "id")?;
	let req = ApiRequest::delete(model.record_url(&id));
	Ok(record(request_data(ctx)?.send(req).await?))
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn query() -> Map<String, Value> {
		obj! { "name" => "Foo" }
	}

	#[test]
	fn unwraps_the_first_record() {
		let body = json!({"data": [{"id": 1}, {"id": 2}], "meta": {"total": 2}});
		assert_eq!(unwrap_single(body, query()).unwrap(), Some(json!({"id": 1})));
		assert_eq!(unwrap_single(json!([{"id": 3}]), query()).unwrap(), Some(json!({"id": 3})));
		assert_eq!(unwrap_single(json!({"id": 4}), query()).unwrap(), Some(json!({"id": 4})));
	}

	#[test]
	fn page_sizes_are_positive() {
		assert_eq!(page_size(Some(5), 100), 5);
		assert_eq!(page_size(Some(0), 100), 100);
		assert_eq!(page_size(Some(-3), 100), 100);
		assert_eq!(page_size(None, 0), 1);
		assert_eq!(page_size(Some(-1), -10), 1);
	}

	#[test]
	fn empty_envelopes_are_errors() {
		let err = unwrap_single(json!({"data": [], "meta": {"total": 0}}), query()).unwrap_err();
		assert_eq!(err.to_string(), "The query {\"name\":\"Foo\"} returned no results.");
	}
}
