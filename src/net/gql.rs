use axum::body::Bytes;
use axum::extract::Query;
use axum::routing::get;
use axum::{Extension, Json, Router};
use http::HeaderMap;
use serde::Deserialize;
use serde_json::Value;

use super::AppState;
use crate::err::Error;

pub(super) fn router<S>() -> Router<S>
where
	S: Clone + Send + Sync + 'static,
{
	Router::new()
		.route("/graphql", get(get_handler).post(post_handler))
		.route("/graphql/introspect", get(introspect))
		.route("/graphql/schema", get(schema))
}

#[derive(Debug, Deserialize)]
struct GraphqlBody {
	query: String,
	#[serde(default)]
	variables: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GraphqlParams {
	ql: Option<String>,
	/// The variables, as a JSON encoded object
	#[serde(rename = "where")]
	variables: Option<String>,
}

async fn post_handler(
	Extension(state): Extension<AppState>,
	headers: HeaderMap,
	body: Bytes,
) -> Result<Json<Value>, Error> {
	let body: GraphqlBody =
		serde_json::from_slice(&body).map_err(|e| Error::InvalidBody(e.to_string()))?;
	let res = state.service.execute(&body.query, body.variables, headers).await?;
	Ok(Json(res))
}

async fn get_handler(
	Extension(state): Extension<AppState>,
	headers: HeaderMap,
	Query(params): Query<GraphqlParams>,
) -> Result<Json<Value>, Error> {
	let query = params.ql.filter(|q| !q.trim().is_empty()).ok_or(Error::MissingQuery)?;
	let variables = match params.variables.as_deref().map(str::trim) {
		None | Some("") => None,
		Some(text) => match serde_json::from_str(text) {
			Ok(v @ Value::Object(_)) => Some(v),
			_ => return Err(Error::InvalidVariables),
		},
	};
	let res = state.service.execute(&query, variables, headers).await?;
	Ok(Json(res))
}

async fn introspect(
	Extension(state): Extension<AppState>,
	headers: HeaderMap,
) -> Result<Json<Value>, Error> {
	Ok(Json(state.service.introspect(headers).await?))
}

async fn schema(Extension(state): Extension<AppState>) -> Result<String, Error> {
	Ok(state.service.sdl().await?)
}

#[cfg(test)]
mod tests {
	use crate::net::tests::{app, call};
	use axum::body::Body;
	use http::{Request, StatusCode, header};
	use serde_json::json;

	fn post(body: serde_json::Value) -> Request<Body> {
		Request::post("/graphql")
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(body.to_string()))
			.unwrap()
	}

	#[test_log::test(tokio::test)]
	async fn posts_run_queries_and_mutations() {
		let app = app();
		let (status, body) = call(
			&app,
			post(json!({
				"query": "mutation ($c: CategoryInputType!) { createCategory(category: $c) { id name } }",
				"variables": {"c": {"name": "Foo"}},
			})),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body, json!({"data": {"createCategory": {"id": 1, "name": "Foo"}}}));
		let (_, body) = call(&app, post(json!({"query": "{ categories { total } }"}))).await;
		assert_eq!(body, json!({"data": {"categories": {"total": 1}}}));
	}

	#[test_log::test(tokio::test)]
	async fn gets_read_the_query_string() {
		let app = app();
		let uri = "/graphql?ql=query%20(%24n%3A%20String)%20%7B%20categories(where%3A%20%24n)%20%7B%20total%20%7D%20%7D&where=%7B%22n%22%3A%22%7B%7D%22%7D";
		let (status, body) = call(&app, Request::get(uri).body(Body::empty()).unwrap()).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body, json!({"data": {"categories": {"total": 0}}}));
		let (status, _) = call(&app, Request::get("/graphql").body(Body::empty()).unwrap()).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		let uri = "/graphql?ql=%7B%20categories%20%7B%20total%20%7D%20%7D&where=%5B%5D";
		let (status, _) = call(&app, Request::get(uri).body(Body::empty()).unwrap()).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
	}

	#[test_log::test(tokio::test)]
	async fn malformed_bodies_are_rejected() {
		let app = app();
		let req = Request::post("/graphql").body(Body::from("{")).unwrap();
		let (status, body) = call(&app, req).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["code"], json!(400));
	}

	#[test_log::test(tokio::test)]
	async fn serves_the_schema() {
		let app = app();
		let (status, body) =
			call(&app, Request::get("/graphql/schema").body(Body::empty()).unwrap()).await;
		assert_eq!(status, StatusCode::OK);
		assert!(body.as_str().unwrap().contains("type CategoryType"));
		let (status, body) =
			call(&app, Request::get("/graphql/introspect").body(Body::empty()).unwrap()).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["data"]["__schema"]["queryType"]["name"], json!("RootQueryType"));
	}
}
