use axum::Json;
use axum::response::{IntoResponse, Response};
use boltql_core::gql::GqlError;
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
	#[error("The server has not been configured")]
	NotConfigured,

	#[error("Couldn't read the model definitions from `{path}`: {message}")]
	ModelFile {
		path: String,
		message: String,
	},

	#[error("The request body could not be parsed: {0}")]
	InvalidBody(String),

	#[error("The `where` parameter must hold a JSON object of variables")]
	InvalidVariables,

	#[error("Specify a query with the `ql` parameter")]
	MissingQuery,

	#[error("Failed to initialise logging: {0}")]
	Telemetry(String),

	#[error("There was a problem with the models: {0}")]
	Core(#[from] boltql_core::err::Error),

	#[error("{0}")]
	Gql(#[from] GqlError),

	#[error("There was an error with the network: {0}")]
	Io(#[from] std::io::Error),

	#[error("There was a problem with JSON serialization: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	fn status(&self) -> StatusCode {
		match self {
			Error::InvalidBody(_)
			| Error::InvalidVariables
			| Error::MissingQuery
			| Error::Json(_) => StatusCode::BAD_REQUEST,
			Error::Core(e) => e.status(),
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let status = self.status();
		if status.is_server_error() {
			error!("{self}");
		}
		let body = json!({
			"code": status.as_u16(),
			"information": self.to_string(),
		});
		(status, Json(body)).into_response()
	}
}
