use http::{HeaderMap, HeaderValue, Method};
use serde_json::{Map, Value};

use crate::cnf::GRAPHQL_HEADER;

/// A request against the CRUD API.
///
/// Requests issued by the GraphQL resolvers and by the relational write
/// pipeline never leave the process, but they carry the same shape as the
/// ones arriving over HTTP.
#[derive(Clone, Debug, Default)]
pub struct ApiRequest {
	pub method: Method,
	pub path: String,
	pub headers: HeaderMap,
	/// Parameters extracted from the path by the router
	pub params: Map<String, Value>,
	pub query: Map<String, Value>,
	pub body: Value,
}

impl ApiRequest {
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			..Default::default()
		}
	}

	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	pub fn with_headers(mut self, headers: HeaderMap) -> Self {
		self.headers.extend(headers);
		self
	}

	pub fn with_query(mut self, query: Map<String, Value>) -> Self {
		self.query = query;
		self
	}

	pub fn with_body(mut self, body: Value) -> Self {
		self.body = body;
		self
	}

	/// Marks this request as issued on behalf of a GraphQL operation
	pub fn graphql(mut self) -> Self {
		self.headers.insert(GRAPHQL_HEADER, HeaderValue::from_static("true"));
		self
	}

	pub fn is_graphql(&self) -> bool {
		self.headers.contains_key(GRAPHQL_HEADER)
	}

	/// Looks up a single parameter. Path parameters win over the body, which
	/// wins over the query string.
	pub fn param(&self, name: &str) -> Option<&Value> {
		self.params
			.get(name)
			.or_else(|| self.body.as_object().and_then(|b| b.get(name)))
			.or_else(|| self.query.get(name))
			.filter(|v| !v.is_null())
	}

	/// Merges all parameters with the same precedence as [`ApiRequest::param`]
	pub fn all_params(&self) -> Map<String, Value> {
		let mut out = self.query.clone();
		if let Some(body) = self.body.as_object() {
			out.extend(body.iter().map(|(k, v)| (k.clone(), v.clone())));
		}
		out.extend(self.params.iter().map(|(k, v)| (k.clone(), v.clone())));
		out
	}
}
