//! An in-memory [`Store`], holding every model's records in process.
//!
//! The store performs the validation an ORM adapter would: required and
//! unique attributes, and the primitive type of scalar values. It assigns
//! auto-incrementing keys to records created without one.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::crud::{Criteria, compare, loose_eq};
use crate::dbs::{FindQuery, Populate, SortField, Store};
use crate::err::{Error, InvalidAttributes, Violation};
use crate::model::{Attribute, AttributeKind, ModelDescriptor, ModelRegistry, Primitive, Record};

const TARGET: &str = "boltql::mem";

#[derive(Debug, Default)]
struct Table {
	rows: Vec<Record>,
	next: i64,
}

impl Table {
	fn position(&self, model: &ModelDescriptor, pk: &Value) -> Option<usize> {
		self.rows.iter().position(|r| model.pk_of(r).is_some_and(|v| loose_eq(v, pk)))
	}
}

pub struct MemoryStore {
	registry: Arc<ModelRegistry>,
	tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
	pub fn new(registry: Arc<ModelRegistry>) -> Self {
		Self {
			registry,
			tables: RwLock::new(HashMap::new()),
		}
	}

	/// Every stored record of a model, unpopulated
	pub fn records(&self, identity: &str) -> Vec<Record> {
		self.tables.read().get(identity).map(|t| t.rows.clone()).unwrap_or_default()
	}

	/// The records of a model matching some criteria, in insertion order
	fn select(&self, model: &ModelDescriptor, criteria: &Criteria) -> Vec<Record> {
		let tables = self.tables.read();
		match tables.get(&model.identity) {
			Some(t) => t.rows.iter().filter(|r| criteria.matches(r)).cloned().collect(),
			None => vec![],
		}
	}

	fn get(&self, model: &ModelDescriptor, pk: &Value) -> Option<Record> {
		let tables = self.tables.read();
		let table = tables.get(&model.identity)?;
		table.position(model, pk).map(|i| table.rows[i].clone())
	}

	/// Replaces association keys on a record with the associated records
	fn populate(&self, model: &ModelDescriptor, record: &mut Record, populate: &[Populate]) {
		for p in populate {
			let Some(attr) = model.attribute(&p.alias) else {
				continue;
			};
			let Some(target) = attr.target().and_then(|t| self.registry.find(t)) else {
				continue;
			};
			let limit = p.limit as usize;
			match &attr.kind {
				AttributeKind::ToOne {
					..
				} => {
					let found = record
						.get(&attr.name)
						.filter(|v| !v.is_null())
						.and_then(|pk| self.get(target, pk));
					if let Some(found) = found {
						record.insert(attr.name.clone(), Value::Object(found));
					}
				}
				AttributeKind::ToMany {
					via,
					..
				} => {
					let Some(pk) = model.pk_of(record).cloned() else {
						continue;
					};
					let stored = match record.get(&attr.name) {
						Some(Value::Array(keys)) => keys.clone(),
						_ => vec![],
					};
					let children: Vec<Value> = self
						.select(target, &Criteria::default())
						.into_iter()
						.filter(|child| {
							let owned = target.pk_of(child).is_some_and(|k| stored.iter().any(|s| loose_eq(s, k)));
							let linked = via.as_ref().and_then(|v| child.get(v)).is_some_and(|v| match v {
								Value::Array(keys) => keys.iter().any(|k| loose_eq(k, &pk)),
								v => loose_eq(v, &pk),
							});
							owned || linked
						})
						.take(limit)
						.map(Value::Object)
						.collect();
					record.insert(attr.name.clone(), Value::Array(children));
				}
				_ => {}
			}
		}
	}

	/// Normalises association values before they are stored
	fn prepare(&self, model: &ModelDescriptor, values: &mut Record) {
		for attr in model.associations() {
			let Some(target) = attr.target().and_then(|t| self.registry.find(t)) else {
				continue;
			};
			let owned_by_children = match attr.via() {
				Some(via) if attr.is_to_many() => {
					target.attribute(via).is_some_and(Attribute::is_to_one)
				}
				_ => false,
			};
			if owned_by_children {
				values.remove(&attr.name);
				continue;
			}
			let key_of = |v: Value| match v {
				Value::Object(o) => target.pk_of(&o).cloned().unwrap_or(Value::Null),
				v => v,
			};
			let Some(value) = values.remove(&attr.name) else {
				continue;
			};
			let value = match value {
				Value::Array(items) if attr.is_to_many() => Value::Array(
					items.into_iter().map(key_of).filter(|v| !v.is_null()).collect(),
				),
				v => key_of(v),
			};
			values.insert(attr.name.clone(), value);
		}
	}

	/// Checks a record about to be stored at `position`
	fn validate(
		&self,
		model: &ModelDescriptor,
		table: &Table,
		record: &Record,
		position: Option<usize>,
	) -> Result<(), Error> {
		let mut invalid = InvalidAttributes::new();
		for attr in model.attributes.values() {
			let value = record.get(&attr.name).filter(|v| !v.is_null());
			let mut violations = Vec::new();
			match value {
				None if attr.required && attr.name != model.primary_key => {
					violations.push(Violation {
						rule: "required".to_owned(),
						message: format!("\"required\" validation rule failed for input: {}", Value::Null),
					});
				}
				None => {}
				Some(v) => {
					if let AttributeKind::Scalar(p) = &attr.kind {
						if let Some(rule) = type_violation(p, v) {
							violations.push(Violation {
								rule: rule.to_owned(),
								message: format!("`{v}` should be a {rule}"),
							});
						}
					}
					if attr.unique || attr.name == model.primary_key {
						let taken = table.rows.iter().enumerate().any(|(i, r)| {
							Some(i) != position && r.get(&attr.name).is_some_and(|o| loose_eq(o, v))
						});
						if taken {
							violations.push(Violation {
								rule: "unique".to_owned(),
								message: format!("A record with that `{}` already exists (`{v}`).", attr.name),
							});
						}
					}
				}
			}
			if !violations.is_empty() {
				invalid.insert(attr.name.clone(), violations);
			}
		}
		match invalid.is_empty() {
			true => Ok(()),
			false => Err(Error::validation(model.global_name(), invalid)),
		}
	}
}

/// The name of the type rule a scalar value breaks, if any
fn type_violation(primitive: &Primitive, value: &Value) -> Option<&'static str> {
	let ok = match primitive {
		Primitive::String | Primitive::Date | Primitive::DateTime | Primitive::ObjectId => {
			value.is_string()
		}
		Primitive::Integer => value.is_i64() || value.is_u64(),
		Primitive::Float => value.is_number(),
		Primitive::Boolean => value.is_boolean(),
		Primitive::Array => value.is_array(),
		Primitive::Json | Primitive::Unsupported(_) => true,
	};
	match (ok, primitive) {
		(true, _) => None,
		(false, Primitive::String | Primitive::ObjectId) => Some("string"),
		(false, Primitive::Date) => Some("date"),
		(false, Primitive::DateTime) => Some("datetime"),
		(false, Primitive::Integer) => Some("integer"),
		(false, Primitive::Float) => Some("float"),
		(false, Primitive::Boolean) => Some("boolean"),
		(false, _) => Some("array"),
	}
}

fn sort_records(records: &mut [Record], sort: &[SortField]) {
	if sort.is_empty() {
		return;
	}
	records.sort_by(|a, b| {
		for s in sort {
			let x = a.get(&s.field).unwrap_or(&Value::Null);
			let y = b.get(&s.field).unwrap_or(&Value::Null);
			let ord = match (x.is_null(), y.is_null()) {
				(true, true) => Ordering::Equal,
				(true, false) => Ordering::Less,
				(false, true) => Ordering::Greater,
				(false, false) => compare(x, y).unwrap_or(Ordering::Equal),
			};
			let ord = if s.ascending {
				ord
			} else {
				ord.reverse()
			};
			if ord != Ordering::Equal {
				return ord;
			}
		}
		Ordering::Equal
	});
}

#[async_trait]
impl Store for MemoryStore {
	async fn find(&self, model: &ModelDescriptor, query: &FindQuery) -> Result<Vec<Record>, Error> {
		// Filter and order the matching records
		let mut records = self.select(model, &query.criteria);
		sort_records(&mut records, &query.sort);
		// Apply the requested page
		let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
		let mut records: Vec<Record> =
			records.into_iter().skip(query.skip as usize).take(limit).collect();
		// Populate the requested associations
		for record in records.iter_mut() {
			self.populate(model, record, &query.populate);
		}
		trace!(target: TARGET, "Found {} `{}` records", records.len(), model.identity);
		Ok(records)
	}

	async fn count(&self, model: &ModelDescriptor, criteria: &Criteria) -> Result<u64, Error> {
		Ok(self.select(model, criteria).len() as u64)
	}

	async fn find_one(
		&self,
		model: &ModelDescriptor,
		pk: &Value,
		populate: &[Populate],
	) -> Result<Option<Record>, Error> {
		let mut record = self.get(model, pk);
		if let Some(record) = record.as_mut() {
			self.populate(model, record, populate);
		}
		Ok(record)
	}

	async fn create(&self, model: &ModelDescriptor, mut values: Record) -> Result<Record, Error> {
		self.prepare(model, &mut values);
		let mut tables = self.tables.write();
		let table = tables.entry(model.identity.clone()).or_default();
		// Assign a key to records created without one
		match model.pk_of(&values) {
			Some(Value::Number(n)) => {
				if let Some(n) = n.as_i64() {
					table.next = table.next.max(n);
				}
			}
			Some(_) => {}
			None => {
				table.next += 1;
				let key = match model.pk_attribute().map(|a| &a.kind) {
					Some(AttributeKind::Scalar(Primitive::String | Primitive::ObjectId)) => {
						Value::from(table.next.to_string())
					}
					_ => Value::from(table.next),
				};
				values.insert(model.primary_key.clone(), key);
			}
		}
		self.validate(model, table, &values, None)?;
		table.rows.push(values.clone());
		trace!(target: TARGET, "Created a `{}` record", model.identity);
		Ok(values)
	}

	async fn update(
		&self,
		model: &ModelDescriptor,
		pk: &Value,
		mut values: Record,
	) -> Result<Vec<Record>, Error> {
		self.prepare(model, &mut values);
		values.remove(&model.primary_key);
		let mut tables = self.tables.write();
		let table = tables.entry(model.identity.clone()).or_default();
		let Some(position) = table.position(model, pk) else {
			return Ok(vec![]);
		};
		let mut record = table.rows[position].clone();
		record.extend(values);
		self.validate(model, table, &record, Some(position))?;
		table.rows[position] = record.clone();
		trace!(target: TARGET, "Updated a `{}` record", model.identity);
		Ok(vec![record])
	}

	async fn destroy(&self, model: &ModelDescriptor, pk: &Value) -> Result<Vec<Record>, Error> {
		let mut tables = self.tables.write();
		let Some(table) = tables.get_mut(&model.identity) else {
			return Ok(vec![]);
		};
		let destroyed = match table.position(model, pk) {
			Some(position) => vec![table.rows.remove(position)],
			None => vec![],
		};
		trace!(target: TARGET, "Destroyed {} `{}` records", destroyed.len(), model.identity);
		Ok(destroyed)
	}
}
