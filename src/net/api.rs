use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::{Path, Query};
use axum::response::IntoResponse;
use axum::routing::any;
use axum::{Extension, Json, Router};
use boltql_core::api::{ApiRequest, Dispatch};
use http::{HeaderMap, Method};
use serde_json::{Map, Value};

use super::AppState;
use crate::cnf::API_PREFIX;
use crate::err::Error;

pub(super) fn router<S>() -> Router<S>
where
	S: Clone + Send + Sync + 'static,
{
	Router::new().route(&format!("{API_PREFIX}/{{*path}}"), any(handler))
}

/// Serves the CRUD API over HTTP, forwarding each request to the blueprint
async fn handler(
	Extension(state): Extension<AppState>,
	Path(path): Path<String>,
	Query(query): Query<BTreeMap<String, String>>,
	method: Method,
	headers: HeaderMap,
	body: Bytes,
) -> Result<impl IntoResponse, Error> {
	let body = match body.is_empty() {
		true => Value::Null,
		false => serde_json::from_slice(&body).map_err(|e| Error::InvalidBody(e.to_string()))?,
	};
	let query: Map<String, Value> = query.into_iter().map(|(k, v)| (k, Value::String(v))).collect();
	let req = ApiRequest::new(method, format!("/{path}"))
		.with_headers(headers)
		.with_query(query)
		.with_body(body);
	let res = state.blueprint.dispatch(req).await?;
	Ok((res.status, Json(res.body)))
}

#[cfg(test)]
mod tests {
	use crate::net::tests::{app, call};
	use axum::body::Body;
	use http::{Request, StatusCode, header};
	use serde_json::json;

	fn request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
		Request::builder()
			.method(method)
			.uri(uri)
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(body.to_string()))
			.unwrap()
	}

	#[test_log::test(tokio::test)]
	async fn serves_the_crud_routes() {
		let app = app();
		let (status, body) = call(&app, request("POST", "/api/categories", json!({"name": "Foo"}))).await;
		assert_eq!(status, StatusCode::CREATED);
		assert_eq!(body, json!({"id": 1, "name": "Foo"}));
		let (status, body) = call(&app, request("PUT", "/api/categories/1", json!({"name": "Bar"}))).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["name"], json!("Bar"));
		let get = Request::get("/api/categories?name=Bar&limit=5").body(Body::empty()).unwrap();
		let (status, body) = call(&app, get).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body, json!({"data": [{"id": 1, "name": "Bar"}], "meta": {"total": 1}}));
		let (status, _) = call(&app, request("DELETE", "/api/categories/1", json!(null))).await;
		assert_eq!(status, StatusCode::OK);
		let get = Request::get("/api/categories/1").body(Body::empty()).unwrap();
		let (status, body) = call(&app, get).await;
		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(body["code"], json!("E_NOT_FOUND"));
	}

	#[test_log::test(tokio::test)]
	async fn validation_failures_keep_their_body() {
		let app = app();
		call(&app, request("POST", "/api/categories", json!({"name": "Foo"}))).await;
		let (status, body) = call(&app, request("POST", "/api/categories", json!({"name": "Foo"}))).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["code"], json!("E_VALIDATION"));
		assert_eq!(body["invalidAttributes"]["name"][0]["rule"], json!("unique"));
	}
}
