use std::collections::BTreeMap;
use std::fmt;

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

/// A single failed validation rule on a record attribute
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Violation {
	pub rule: String,
	pub message: String,
}

/// The failed validation rules of a record, keyed by attribute
pub type InvalidAttributes = BTreeMap<String, Vec<Violation>>;

/// An error raised while generating the schema or serving a CRUD request.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
	/// The code encountered unreachable logic
	#[error("Encountered unreachable logic: {0}")]
	Unreachable(String),

	/// A model was referenced which is not in the registry
	#[error("The model `{0}` does not exist")]
	ModelNotFound(String),

	/// A model declares a primary key which is not one of its attributes
	#[error("The model `{model}` does not define its primary key attribute `{key}`")]
	MissingPrimaryKey {
		model: String,
		key: String,
	},

	/// A primary key attribute has a type which cannot be used as a mutation argument
	#[error("The attribute `{attribute}` on `{model}` has the unsupported type `{kind}`")]
	UnsupportedType {
		model: String,
		attribute: String,
		kind: String,
	},

	/// A model definition could not be ingested
	#[error("The model definition for `{model}` is invalid: {message}")]
	InvalidModel {
		model: String,
		message: String,
	},

	/// The blacklist handed to the parameter parser was not a list of field names
	#[error("The values blacklist must be an array of attribute names")]
	InvalidBlacklist,

	/// A request was made without a required primary key
	#[error("Missing required `{0}` parameter")]
	MissingPk(String),

	/// A request was malformed
	#[error("{0}")]
	BadRequest(String),

	/// No record exists with the requested key
	#[error("No record found with the specified `{key}`.")]
	NotFound {
		key: String,
	},

	/// No route matches the internal request
	#[error("No route matches `{method} {path}`")]
	RouteNotFound {
		method: Method,
		path: String,
	},

	/// A record failed validation
	#[error("{reason}")]
	Validation {
		model: String,
		reason: String,
		invalid: InvalidAttributes,
	},

	/// An internal request responded with an unsuccessful status
	#[error("Request `{method} {path}` failed with status {status}")]
	Api {
		method: Method,
		path: String,
		status: StatusCode,
		body: Value,
	},

	/// An interception hook aborted the request
	#[error("The `{hook}` hook aborted the request: {message}")]
	Interrupted {
		hook: &'static str,
		message: String,
	},

	/// There was a problem with the underlying store
	#[error("There was a problem with the underlying store: {0}")]
	Store(String),

	/// A value could not be serialized or deserialized
	#[error("There was a problem with JSON serialization: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	#[track_caller]
	pub fn unreachable<T: fmt::Display>(message: T) -> Error {
		let location = std::panic::Location::caller();
		let message = format!("{}:{}: {}", location.file(), location.line(), message);
		Error::Unreachable(message)
	}

	/// Creates a validation error with one violation per attribute rule
	pub fn validation(model: impl Into<String>, invalid: InvalidAttributes) -> Error {
		let count = invalid.len();
		let reason = match count {
			1 => "1 attribute is invalid".to_owned(),
			n => format!("{n} attributes are invalid"),
		};
		Error::Validation {
			model: model.into(),
			reason,
			invalid,
		}
	}

	/// Creates an interruption error for the named hook
	pub fn interrupted(hook: &'static str, message: impl Into<String>) -> Error {
		Error::Interrupted {
			hook,
			message: message.into(),
		}
	}

	/// The HTTP status this error is served with by the CRUD API
	pub fn status(&self) -> StatusCode {
		match self {
			Error::Api {
				status,
				..
			} => *status,
			Error::Validation {
				..
			}
			| Error::BadRequest(_)
			| Error::MissingPk(_)
			| Error::Interrupted {
				..
			} => StatusCode::BAD_REQUEST,
			Error::NotFound {
				..
			}
			| Error::RouteNotFound {
				..
			}
			| Error::ModelNotFound(_) => StatusCode::NOT_FOUND,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// The machine readable code of this error
	pub fn code(&self) -> &'static str {
		match self {
			Error::Validation {
				..
			} => "E_VALIDATION",
			Error::NotFound {
				..
			}
			| Error::RouteNotFound {
				..
			}
			| Error::ModelNotFound(_) => "E_NOT_FOUND",
			Error::BadRequest(_)
			| Error::MissingPk(_)
			| Error::Interrupted {
				..
			} => "E_BAD_REQUEST",
			_ => "E_UNKNOWN",
		}
	}

	/// Renders this error as the body of a CRUD API response
	pub fn to_body(&self) -> Value {
		match self {
			Error::Api {
				body,
				..
			} => body.clone(),
			Error::Validation {
				model,
				reason,
				invalid,
			} => json!({
				"code": self.code(),
				"status": self.status().as_u16(),
				"reason": reason,
				"model": model,
				"invalidAttributes": invalid,
			}),
			_ => json!({
				"code": self.code(),
				"status": self.status().as_u16(),
				"reason": self.to_string(),
			}),
		}
	}
}

impl From<Error> for String {
	fn from(e: Error) -> String {
		e.to_string()
	}
}
