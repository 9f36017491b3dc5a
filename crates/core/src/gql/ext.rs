use async_graphql::dynamic::indexmap::IndexMap;
use async_graphql::{Name, Value as GqlValue};
use serde_json::{Map, Value};

use super::error::{GqlError, resolver_error};

pub trait TryIntoExt<T> {
	type Error;

	fn try_intox(self) -> Result<T, Self::Error>;
}

pub trait TryFromExt<T>: Sized {
	type Error;

	fn try_fromx(value: T) -> Result<Self, Self::Error>;
}

impl<S, T> TryIntoExt<T> for S
where
	T: TryFromExt<S>,
{
	type Error = <T as TryFromExt<S>>::Error;

	fn try_intox(self) -> Result<T, <T as TryFromExt<S>>::Error> {
		T::try_fromx(self)
	}
}

impl TryFromExt<Value> for GqlValue {
	type Error = GqlError;

	fn try_fromx(value: Value) -> Result<Self, GqlError> {
		GqlValue::from_json(value)
			.map_err(|e| resolver_error(format!("could not convert a record value: {e}")))
	}
}

impl TryFromExt<GqlValue> for Value {
	type Error = GqlError;

	fn try_fromx(value: GqlValue) -> Result<Self, GqlError> {
		value.into_json().map_err(|e| resolver_error(format!("could not convert an argument: {e}")))
	}
}

/// Field arguments become the query parameters or body of an internal request
impl TryFromExt<&IndexMap<Name, GqlValue>> for Map<String, Value> {
	type Error = GqlError;

	fn try_fromx(args: &IndexMap<Name, GqlValue>) -> Result<Self, GqlError> {
		args.iter()
			.map(|(k, v)| {
				let v: Value = v.clone().try_intox()?;
				Ok((k.to_string(), v))
			})
			.collect::<Result<Map<String, Value>, GqlError>>()
	}
}

pub trait JsonValueExt {
	/// Reads an integer out of a number, or a string holding one
	fn as_integer(&self) -> Option<i64>;
}

impl JsonValueExt for Value {
	fn as_integer(&self) -> Option<i64> {
		match self {
			Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
			Value::String(s) => s.parse().ok(),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn converts_arguments() {
		let mut args = IndexMap::new();
		args.insert(Name::new("name"), GqlValue::from("Foo"));
		args.insert(Name::new("limit"), GqlValue::from(3));
		let map: Map<String, Value> = (&args).try_intox().unwrap();
		assert_eq!(Value::Object(map), json!({"name": "Foo", "limit": 3}));
		let back: GqlValue = json!({"a": [1, null]}).try_intox().unwrap();
		assert_eq!(back.into_json().unwrap(), json!({"a": [1, null]}));
		assert_eq!(json!("12").as_integer(), Some(12));
		assert_eq!(json!(null).as_integer(), None);
	}
}
