use http::StatusCode;
use serde_json::Value;

use crate::err::Error;

/// The outcome of a request against the CRUD API
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
	pub status: StatusCode,
	pub body: Value,
}

impl ApiResponse {
	pub fn ok(body: impl Into<Value>) -> Self {
		Self {
			status: StatusCode::OK,
			body: body.into(),
		}
	}

	pub fn created(body: impl Into<Value>) -> Self {
		Self {
			status: StatusCode::CREATED,
			body: body.into(),
		}
	}

	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}
}

impl From<Error> for ApiResponse {
	fn from(err: Error) -> Self {
		let status = err.status();
		if status.is_server_error() {
			warn!("CRUD request failed: {err}");
		} else {
			debug!("CRUD request rejected: {err}");
		}
		Self {
			status,
			body: err.to_body(),
		}
	}
}
