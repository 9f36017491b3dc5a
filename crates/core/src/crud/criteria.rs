//! The `where` criteria of a find request.
//!
//! Criteria arrive as a JSON object. The keys `and`, `or`, `$and` and `$or`
//! holding arrays become branches, and every other key becomes a field
//! clause. Field clauses compare with loose equality, so a path segment
//! `"3"` matches a stored integer `3`.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::err::Error;
use crate::model::Record;

const AND: [&str; 2] = ["and", "$and"];
const OR: [&str; 2] = ["or", "$or"];

#[derive(Clone, Debug, PartialEq)]
pub enum Criteria {
	And(Vec<Criteria>),
	Or(Vec<Criteria>),
	/// A condition on one attribute. A scalar means equality, an array means
	/// membership and an object holds comparison modifiers.
	Field(String, Value),
}

impl Default for Criteria {
	fn default() -> Self {
		Criteria::And(vec![])
	}
}

impl Criteria {
	/// Parses a JSON criteria object
	pub fn parse(value: &Value) -> Result<Self, Error> {
		match value {
			Value::Object(o) => Self::parse_object(o),
			Value::Null => Ok(Self::default()),
			v => Err(Error::BadRequest(format!("Expected a criteria object but found `{v}`"))),
		}
	}

	fn parse_object(o: &Map<String, Value>) -> Result<Self, Error> {
		let mut clauses = Vec::with_capacity(o.len());
		for (k, v) in o {
			match v {
				Value::Array(items) if AND.contains(&k.as_str()) => {
					clauses.push(Criteria::And(
						items.iter().map(Self::parse).collect::<Result<_, _>>()?,
					));
				}
				Value::Array(items) if OR.contains(&k.as_str()) => {
					clauses.push(Criteria::Or(
						items.iter().map(Self::parse).collect::<Result<_, _>>()?,
					));
				}
				v => clauses.push(Criteria::Field(k.clone(), v.clone())),
			}
		}
		match clauses.len() {
			1 => Ok(clauses.remove(0)),
			_ => Ok(Criteria::And(clauses)),
		}
	}

	/// Whether this criteria places no restriction at all
	pub fn is_empty(&self) -> bool {
		matches!(self, Criteria::And(v) if v.is_empty())
	}

	/// Restricts the criteria so that `field` must match `value`, replacing
	/// any clause on the same field at the top level
	pub fn set_field(self, field: &str, value: Value) -> Criteria {
		let clause = Criteria::Field(field.to_owned(), value);
		match self {
			Criteria::And(mut clauses) => {
				clauses.retain(|c| !matches!(c, Criteria::Field(k, _) if k == field));
				clauses.push(clause);
				Criteria::And(clauses)
			}
			Criteria::Field(k, _) if k == field => clause,
			other => Criteria::And(vec![other, clause]),
		}
	}

	/// Splits off every field clause for which `is_target` holds, anywhere
	/// in the tree. Branches emptied by the extraction are dropped. The
	/// extracted values are grouped by field name in order of appearance.
	pub fn extract<F>(self, is_target: F) -> (Criteria, Vec<(String, Vec<Value>)>)
	where
		F: Fn(&str) -> bool,
	{
		let mut found: Vec<(String, Vec<Value>)> = Vec::new();
		let remaining = self.extract_inner(&is_target, &mut found).unwrap_or_default();
		(remaining, found)
	}

	fn extract_inner<F>(self, is_target: &F, found: &mut Vec<(String, Vec<Value>)>) -> Option<Criteria>
	where
		F: Fn(&str) -> bool,
	{
		match self {
			Criteria::Field(k, v) if is_target(&k) => {
				let values = match v {
					Value::Array(items) => items,
					v => vec![v],
				};
				match found.iter_mut().find(|(name, _)| *name == k) {
					Some((_, existing)) => existing.extend(values),
					None => found.push((k, values)),
				}
				None
			}
			Criteria::And(clauses) => {
				let was_empty = clauses.is_empty();
				let clauses: Vec<_> =
					clauses.into_iter().filter_map(|c| c.extract_inner(is_target, found)).collect();
				match clauses.is_empty() && !was_empty {
					true => None,
					false => Some(Criteria::And(clauses)),
				}
			}
			Criteria::Or(clauses) => {
				let clauses: Vec<_> =
					clauses.into_iter().filter_map(|c| c.extract_inner(is_target, found)).collect();
				match clauses.is_empty() {
					true => None,
					false => Some(Criteria::Or(clauses)),
				}
			}
			other => Some(other),
		}
	}

	/// Evaluates the criteria against a record
	pub fn matches(&self, record: &Record) -> bool {
		match self {
			Criteria::And(clauses) => clauses.iter().all(|c| c.matches(record)),
			Criteria::Or(clauses) => clauses.iter().any(|c| c.matches(record)),
			Criteria::Field(k, cond) => {
				let value = record.get(k).unwrap_or(&Value::Null);
				field_matches(value, cond)
			}
		}
	}
}

fn field_matches(value: &Value, cond: &Value) -> bool {
	match cond {
		Value::Array(options) => options.iter().any(|o| loose_eq(value, o)),
		Value::Object(modifiers) if modifiers.keys().any(|k| is_modifier(k)) => {
			modifiers.iter().all(|(op, arg)| apply_modifier(value, op, arg))
		}
		cond => loose_eq(value, cond),
	}
}

fn is_modifier(key: &str) -> bool {
	matches!(
		key,
		"in" | "not"
			| "!" | "contains"
			| "startsWith"
			| "endsWith"
			| "like"
			| "<" | "<="
			| ">" | ">="
			| "lessThan"
			| "lessThanOrEqual"
			| "greaterThan"
			| "greaterThanOrEqual"
	)
}

fn apply_modifier(value: &Value, op: &str, arg: &Value) -> bool {
	match op {
		"in" => field_matches(value, arg),
		"not" | "!" => !field_matches(value, arg),
		"contains" => text(value).zip(text(arg)).is_some_and(|(v, a)| v.contains(&a)),
		"like" => text(value).zip(text(arg)).is_some_and(|(v, a)| {
			v.contains(a.trim_matches('%'))
		}),
		"startsWith" => text(value).zip(text(arg)).is_some_and(|(v, a)| v.starts_with(&a)),
		"endsWith" => text(value).zip(text(arg)).is_some_and(|(v, a)| v.ends_with(&a)),
		"<" | "lessThan" => compare(value, arg) == Some(Ordering::Less),
		"<=" | "lessThanOrEqual" => {
			matches!(compare(value, arg), Some(Ordering::Less | Ordering::Equal))
		}
		">" | "greaterThan" => compare(value, arg) == Some(Ordering::Greater),
		">=" | "greaterThanOrEqual" => {
			matches!(compare(value, arg), Some(Ordering::Greater | Ordering::Equal))
		}
		_ => false,
	}
}

fn text(v: &Value) -> Option<String> {
	match v {
		Value::String(s) => Some(s.to_lowercase()),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	}
}

fn number(v: &Value) -> Option<f64> {
	match v {
		Value::Number(n) => n.as_f64(),
		Value::String(s) => s.parse().ok(),
		_ => None,
	}
}

/// Compares two values, numerically when both sides look like numbers
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
	match (a, b) {
		(Value::String(x), Value::String(y)) => Some(x.cmp(y)),
		(Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
		_ => number(a).zip(number(b)).and_then(|(x, y)| x.partial_cmp(&y)),
	}
}

/// Equality which treats a number and its string form as the same value
pub fn loose_eq(a: &Value, b: &Value) -> bool {
	match (a, b) {
		(Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
			number(a).zip(number(b)).is_some_and(|(x, y)| x == y)
		}
		(Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
		(a, b) => a == b,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use serde_json::json;

	fn record(v: Value) -> Record {
		match v {
			Value::Object(o) => o,
			_ => unreachable!(),
		}
	}

	#[test]
	fn parses_branches() {
		let c = Criteria::parse(&json!({"name": "Foo", "or": [{"a": 1}, {"$and": [{"b": 2}]}]}))
			.unwrap();
		assert_eq!(
			c,
			Criteria::And(vec![
				Criteria::Field("name".into(), json!("Foo")),
				Criteria::Or(vec![
					Criteria::Field("a".into(), json!(1)),
					Criteria::And(vec![Criteria::Field("b".into(), json!(2))]),
				]),
			])
		);
	}

	#[test]
	fn rejects_non_objects() {
		assert!(Criteria::parse(&json!([1, 2])).is_err());
		assert!(Criteria::parse(&Value::Null).unwrap().is_empty());
	}

	#[test]
	fn extract_removes_emptied_branches() {
		let c = Criteria::parse(&json!({
			"name": "Foo",
			"or": [{"tags": [1, 2]}, {"tags": 3}],
		}))
		.unwrap();
		let (remaining, found) = c.extract(|k| k == "tags");
		assert_eq!(remaining, Criteria::And(vec![Criteria::Field("name".into(), json!("Foo"))]));
		assert_eq!(found, vec![("tags".to_owned(), vec![json!(1), json!(2), json!(3)])]);
	}

	#[test]
	fn extract_keeps_unrelated_criteria() {
		let c = Criteria::parse(&json!({"name": "Foo"})).unwrap();
		let (remaining, found) = c.clone().extract(|k| k == "tags");
		assert_eq!(remaining, c);
		assert!(found.is_empty());
	}

	#[test]
	fn set_field_replaces_existing_clause() {
		let c = Criteria::parse(&json!({"id": 4, "name": "Foo"})).unwrap();
		let c = c.set_field("id", json!([1, 2]));
		assert_eq!(
			c,
			Criteria::And(vec![
				Criteria::Field("name".into(), json!("Foo")),
				Criteria::Field("id".into(), json!([1, 2])),
			])
		);
	}

	#[test]
	fn matching() {
		let r = record(json!({"id": 3, "name": "Foo Bar", "price": 12.5}));
		assert!(Criteria::parse(&json!({"id": "3"})).unwrap().matches(&r));
		assert!(Criteria::parse(&json!({"id": [1, 3]})).unwrap().matches(&r));
		assert!(Criteria::parse(&json!({"name": {"contains": "bar"}})).unwrap().matches(&r));
		assert!(Criteria::parse(&json!({"price": {">": 10, "<=": 12.5}})).unwrap().matches(&r));
		assert!(!Criteria::parse(&json!({"id": {"not": 3}})).unwrap().matches(&r));
		assert!(
			Criteria::parse(&json!({"or": [{"id": 9}, {"name": {"startsWith": "foo"}}]}))
				.unwrap()
				.matches(&r)
		);
		assert!(Criteria::default().matches(&r));
	}
}
