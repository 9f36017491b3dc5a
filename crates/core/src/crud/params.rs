//! Parsing of blueprint parameters out of a CRUD request.

use serde_json::{Map, Value};

use super::Criteria;
use crate::api::ApiRequest;
use crate::cnf::{CRITERIA_BLACKLIST, DEFAULT_LIMIT, POPULATE_LIMIT};
use crate::dbs::{Populate, SortField};
use crate::err::Error;
use crate::model::{ModelDescriptor, Record};

/// Validates a configured blacklist, which must be an array of strings
pub fn blacklist(config: Option<&Value>, default: &[&str]) -> Result<Vec<String>, Error> {
	match config {
		None => Ok(default.iter().map(|s| (*s).to_owned()).collect()),
		Some(Value::Array(items)) => items
			.iter()
			.map(|v| v.as_str().map(str::to_owned).ok_or(Error::InvalidBlacklist))
			.collect(),
		Some(_) => Err(Error::InvalidBlacklist),
	}
}

/// Reads the primary key sent with the request. Object values are criteria
/// rather than a key, so they are ignored.
pub fn parse_pk(req: &ApiRequest) -> Option<Value> {
	req.param("id").filter(|v| !v.is_object()).cloned()
}

/// Like [`parse_pk`], failing when no key was sent
pub fn require_pk(req: &ApiRequest) -> Result<Value, Error> {
	match parse_pk(req) {
		Some(v) if !matches!(&v, Value::String(s) if s.is_empty()) => Ok(v),
		_ => Err(Error::MissingPk("id".to_owned())),
	}
}

/// Builds the find criteria, from the `where` parameter when it is given
/// and from the remaining parameters otherwise
pub fn parse_criteria(req: &ApiRequest, config: Option<&Value>) -> Result<Criteria, Error> {
	let blacklist = blacklist(config, &CRITERIA_BLACKLIST)?;
	match req.param("where") {
		Some(Value::String(s)) if s.trim().is_empty() => Ok(Criteria::default()),
		Some(Value::String(s)) => {
			let parsed: Value = serde_json::from_str(s)
				.map_err(|e| Error::BadRequest(format!("Could not parse the `where` parameter: {e}")))?;
			Criteria::parse(&parsed)
		}
		Some(v) => Criteria::parse(v),
		None => {
			let mut params = req.all_params();
			params.retain(|k, v| !blacklist.contains(k) && !v.is_null());
			Criteria::parse(&Value::Object(params))
		}
	}
}

/// Builds the values of a create or update from all request parameters
pub fn parse_values(req: &ApiRequest, config: Option<&Value>, default: &[&str]) -> Result<Record, Error> {
	let blacklist = blacklist(config, default)?;
	if req.body.is_array() {
		return Err(Error::BadRequest("Expected a single record in the request body".to_owned()));
	}
	let mut values = req.all_params();
	values.retain(|k, _| !blacklist.contains(k));
	Ok(values)
}

fn integer(req: &ApiRequest, name: &str) -> Result<Option<u64>, Error> {
	match req.param(name) {
		None => Ok(None),
		Some(Value::Number(n)) => match n.as_u64() {
			Some(v) => Ok(Some(v)),
			None => Err(Error::BadRequest(format!("The `{name}` parameter must be a positive integer"))),
		},
		Some(Value::String(s)) if s.is_empty() => Ok(None),
		Some(Value::String(s)) => s
			.parse()
			.map(Some)
			.map_err(|_| Error::BadRequest(format!("The `{name}` parameter must be a positive integer"))),
		Some(_) => Err(Error::BadRequest(format!("The `{name}` parameter must be a positive integer"))),
	}
}

pub fn parse_limit(req: &ApiRequest) -> Result<u64, Error> {
	Ok(integer(req, "limit")?.filter(|v| *v > 0).unwrap_or(*DEFAULT_LIMIT))
}

pub fn parse_skip(req: &ApiRequest) -> Result<u64, Error> {
	Ok(integer(req, "skip")?.unwrap_or(0))
}

/// Parses the `sort` parameter, given either as JSON (`{"name": 1}`) or
/// as clauses like `name ASC, age DESC`
pub fn parse_sort(req: &ApiRequest) -> Result<Vec<SortField>, Error> {
	match req.param("sort") {
		None => Ok(vec![]),
		Some(Value::String(s)) if s.trim().is_empty() => Ok(vec![]),
		Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
			Ok(Value::Object(o)) => sort_object(&o),
			_ => s.split(',').map(sort_clause).collect(),
		},
		Some(Value::Object(o)) => sort_object(o),
		Some(v) => Err(Error::BadRequest(format!("Invalid sort `{v}`"))),
	}
}

fn sort_clause(clause: &str) -> Result<SortField, Error> {
	let mut parts = clause.split_whitespace();
	let field = parts.next().ok_or_else(|| Error::BadRequest("Empty sort clause".to_owned()))?;
	let ascending = match parts.next().map(str::to_ascii_lowercase).as_deref() {
		None | Some("asc") => true,
		Some("desc") => false,
		Some(other) => return Err(Error::BadRequest(format!("Invalid sort direction `{other}`"))),
	};
	Ok(SortField {
		field: field.to_owned(),
		ascending,
	})
}

fn sort_object(o: &Map<String, Value>) -> Result<Vec<SortField>, Error> {
	o.iter()
		.map(|(field, dir)| {
			let ascending = match dir {
				Value::Number(n) => n.as_i64().unwrap_or(1) >= 0,
				Value::String(s) => !s.eq_ignore_ascii_case("desc"),
				_ => return Err(Error::BadRequest(format!("Invalid sort direction for `{field}`"))),
			};
			Ok(SortField {
				field: field.clone(),
				ascending,
			})
		})
		.collect()
}

/// The associations to populate. Every association is populated unless
/// the `populate` parameter (`a,b` or `[a,b]`) narrows them down.
pub fn parse_populate(req: &ApiRequest, model: &ModelDescriptor) -> Vec<Populate> {
	let filter: Option<Vec<String>> = match req.param("populate") {
		Some(Value::String(s)) => {
			let s = s.replace(['[', ']'], "");
			Some(s.split(',').map(|a| a.trim().to_owned()).filter(|a| !a.is_empty()).collect())
		}
		Some(Value::Array(items)) => {
			Some(items.iter().filter_map(|v| v.as_str().map(str::to_owned)).collect())
		}
		Some(Value::Bool(false)) => Some(vec![]),
		_ => None,
	};
	model
		.associations()
		.filter(|a| filter.as_ref().is_none_or(|f| f.contains(&a.name)))
		.map(|a| Populate {
			alias: a.name.clone(),
			limit: *POPULATE_LIMIT,
		})
		.collect()
}
