//! The relational half of the create and update blueprints.
//!
//! A single write payload may carry nested records for its associations.
//! Writing it takes four steps around the root write:
//!
//! 1. [`de_shim`] collapses `{pk}` shims to bare keys and moves every
//!    richer nested payload out of the root values.
//! 2. [`generate`] turns the moved payloads into nested write tasks,
//!    stamping the inverse key of the root record on to-many children.
//! 3. [`execute`] runs all tasks concurrently through the CRUD API.
//! 4. [`re_shim`] keeps only the results the root record itself stores.

use futures::future::try_join_all;
use http::HeaderMap;
use indexmap::IndexMap;
use serde_json::Value;

use crate::api::{ApiRequest, Dispatch, DispatchExt};
use crate::err::Error;
use crate::model::{Attribute, AttributeKind, ModelDescriptor, ModelRegistry, Record, is_truthy};

/// A nested write, or a key which is already known
#[derive(Clone, Debug, PartialEq)]
pub enum Task {
	Ready(Value),
	/// Create or update a record of `model`, yielding its primary key
	Write {
		model: String,
		values: Record,
	},
}

#[derive(Clone, Debug, PartialEq)]
pub enum Pending {
	One(Task),
	Many(Vec<Task>),
}

/// Whether an object is nothing more than a reference to a record by key
fn is_shim(obj: &Record, pk: &str) -> bool {
	obj.len() == 1 && obj.contains_key(pk)
}

fn target<'a>(registry: &'a ModelRegistry, attr: &Attribute) -> Result<&'a ModelDescriptor, Error> {
	match attr.target() {
		Some(t) => registry.get(t),
		None => Err(Error::unreachable(format!("`{}` is not an association", attr.name))),
	}
}

/// Whether the inverse attribute of a to-many association holds a single key
fn inverse_is_to_one(registry: &ModelRegistry, attr: &Attribute) -> Result<bool, Error> {
	let model = target(registry, attr)?;
	let via = attr.via().unwrap_or_default();
	match model.attribute(via) {
		Some(inverse) => Ok(inverse.is_to_one()),
		None => Err(Error::InvalidModel {
			model: model.identity.clone(),
			message: format!("the inverse attribute `{via}` of `{}` does not exist", attr.name),
		}),
	}
}

/// Strips nested relational payloads out of `values`, returning them.
///
/// A to-one object holding only the target's primary key is collapsed in
/// place to that key. Any other to-one object, and any to-many array, is
/// moved into the returned container.
pub fn de_shim(
	registry: &ModelRegistry,
	model: &ModelDescriptor,
	values: &mut Record,
) -> Result<Record, Error> {
	enum Action {
		Collapse(Value),
		Move,
	}
	let mut container = Record::new();
	for attr in model.associations() {
		let action = match (&attr.kind, values.get(&attr.name)) {
			(
				AttributeKind::ToOne {
					..
				},
				Some(Value::Object(obj)),
			) => {
				let pk = &target(registry, attr)?.primary_key;
				match is_shim(obj, pk) {
					true => Action::Collapse(obj.get(pk).cloned().unwrap_or(Value::Null)),
					false => Action::Move,
				}
			}
			(
				AttributeKind::ToMany {
					..
				},
				Some(Value::Array(_)),
			) => Action::Move,
			_ => continue,
		};
		match action {
			Action::Collapse(key) => {
				values.insert(attr.name.clone(), key);
			}
			Action::Move => {
				if let Some(moved) = values.remove(&attr.name) {
					container.insert(attr.name.clone(), moved);
				}
			}
		}
	}
	Ok(container)
}

/// Builds the nested write tasks for the payloads moved out by [`de_shim`]
pub fn generate(
	registry: &ModelRegistry,
	model: &ModelDescriptor,
	container: Record,
	root_pk: &Value,
) -> Result<IndexMap<String, Pending>, Error> {
	let mut tasks = IndexMap::new();
	for (name, value) in container {
		let Some(attr) = model.attribute(&name) else {
			continue;
		};
		let target = target(registry, attr)?;
		match (&attr.kind, value) {
			(
				AttributeKind::ToOne {
					..
				},
				Value::Object(obj),
			) => {
				let task = match is_shim(&obj, &target.primary_key) {
					true => Task::Ready(obj.get(&target.primary_key).cloned().unwrap_or(Value::Null)),
					false => Task::Write {
						model: target.identity.clone(),
						values: obj,
					},
				};
				tasks.insert(name, Pending::One(task));
			}
			(
				AttributeKind::ToMany {
					via: Some(via),
					..
				},
				Value::Array(items),
			) => {
				let stamp = match inverse_is_to_one(registry, attr)? {
					true => root_pk.clone(),
					false => Value::Array(vec![root_pk.clone()]),
				};
				let list = items
					.into_iter()
					.map(|item| match item {
						Value::Object(obj) if is_shim(&obj, &target.primary_key) => {
							Task::Ready(obj.get(&target.primary_key).cloned().unwrap_or(Value::Null))
						}
						Value::Object(mut obj) => {
							obj.insert(via.clone(), stamp.clone());
							Task::Write {
								model: target.identity.clone(),
								values: obj,
							}
						}
						other => Task::Ready(other),
					})
					.collect();
				tasks.insert(name, Pending::Many(list));
			}
			_ => {}
		}
	}
	Ok(tasks)
}

/// Creates or updates one nested record through the CRUD API, depending on
/// whether its payload carries a primary key
async fn run(
	dispatch: &dyn Dispatch,
	registry: &ModelRegistry,
	headers: &HeaderMap,
	task: Task,
) -> Result<Value, Error> {
	let (identity, values) = match task {
		Task::Ready(v) => return Ok(v),
		Task::Write {
			model,
			values,
		} => (model, values),
	};
	let model = registry.get(&identity)?;
	let req = match model.pk_of(&values).filter(|v| is_truthy(v)) {
		Some(pk) => ApiRequest::put(model.record_url(pk)),
		None => ApiRequest::post(model.collection_url()),
	};
	let req = req.with_headers(headers.clone()).with_body(Value::Object(values));
	let body = dispatch.send(req).await?;
	match body.get(&model.primary_key) {
		Some(pk) => Ok(pk.clone()),
		None => Err(Error::unreachable(format!(
			"the nested write on `{}` returned no primary key",
			model.identity
		))),
	}
}

/// Runs every task concurrently, failing fast on the first error. To-many
/// results keep the order of the input array.
pub async fn execute(
	dispatch: &dyn Dispatch,
	registry: &ModelRegistry,
	headers: &HeaderMap,
	tasks: IndexMap<String, Pending>,
) -> Result<Record, Error> {
	let futures = tasks.into_iter().map(|(name, pending)| async move {
		let value = match pending {
			Pending::One(task) => run(dispatch, registry, headers, task).await?,
			Pending::Many(list) => Value::Array(
				try_join_all(list.into_iter().map(|t| run(dispatch, registry, headers, t))).await?,
			),
		};
		Ok::<_, Error>((name, value))
	});
	Ok(try_join_all(futures).await?.into_iter().collect())
}

/// Keeps the results the root record stores itself. A to-many association
/// whose inverse is to-one is owned by the children, so its keys are dropped.
pub fn re_shim(
	registry: &ModelRegistry,
	model: &ModelDescriptor,
	results: Record,
) -> Result<Record, Error> {
	let mut out = Record::new();
	for (name, value) in results {
		let Some(attr) = model.attribute(&name) else {
			continue;
		};
		if attr.is_to_one() || !inverse_is_to_one(registry, attr)? {
			out.insert(name, value);
		}
	}
	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::ApiResponse;
	use async_trait::async_trait;
	use parking_lot::Mutex;
	use pretty_assertions::assert_eq;
	use serde_json::json;

	fn registry() -> ModelRegistry {
		ModelRegistry::from_json(json!({
			"category": {"globalId": "Category", "attributes": {
				"id": "integer",
				"name": "string",
				"owner": {"model": "user"},
				"products": {"collection": "product", "via": "category"},
				"tags": {"collection": "tag", "via": "categories"},
			}},
			"user": {"globalId": "User", "attributes": {"id": "integer", "name": "string"}},
			"product": {"globalId": "Product", "attributes": {
				"id": "integer",
				"name": "string",
				"category": {"model": "category"},
			}},
			"tag": {"globalId": "Tag", "attributes": {
				"id": "integer",
				"categories": {"collection": "category", "via": "tags"},
			}},
		}))
		.unwrap()
	}

	fn record(v: Value) -> Record {
		match v {
			Value::Object(o) => o,
			_ => unreachable!(),
		}
	}

	#[test]
	fn shims_collapse_in_place() {
		let registry = registry();
		let model = registry.get("category").unwrap();
		let mut values = record(json!({"name": "Foo", "owner": {"id": 7}}));
		let container = de_shim(&registry, model, &mut values).unwrap();
		assert_eq!(values, record(json!({"name": "Foo", "owner": 7})));
		assert!(container.is_empty());
	}

	#[test]
	fn rich_payloads_move_out() {
		let registry = registry();
		let model = registry.get("category").unwrap();
		let mut values = record(json!({
			"name": "Foo",
			"owner": {"name": "Ann"},
			"products": [{"name": "A"}, {"id": 4}, 5],
		}));
		let container = de_shim(&registry, model, &mut values).unwrap();
		assert_eq!(values, record(json!({"name": "Foo"})));
		assert_eq!(container.keys().collect::<Vec<_>>(), vec!["owner", "products"]);
	}

	#[test]
	fn tasks_stamp_the_inverse_key() {
		let registry = registry();
		let model = registry.get("category").unwrap();
		let container = record(json!({
			"owner": {"name": "Ann"},
			"products": [{"name": "A"}, {"id": 4}, 5],
			"tags": [{"label": "x"}],
		}));
		let tasks = generate(&registry, model, container, &json!(3)).unwrap();
		assert_eq!(
			tasks["owner"],
			Pending::One(Task::Write {
				model: "user".into(),
				values: record(json!({"name": "Ann"})),
			})
		);
		assert_eq!(
			tasks["products"],
			Pending::Many(vec![
				Task::Write {
					model: "product".into(),
					values: record(json!({"name": "A", "category": 3})),
				},
				Task::Ready(json!(4)),
				Task::Ready(json!(5)),
			])
		);
		assert_eq!(
			tasks["tags"],
			Pending::Many(vec![Task::Write {
				model: "tag".into(),
				values: record(json!({"label": "x", "categories": [3]})),
			}])
		);
	}

	#[test]
	fn re_shim_drops_child_owned_keys() {
		let registry = registry();
		let model = registry.get("category").unwrap();
		let results = record(json!({"owner": 1, "products": [4, 5], "tags": [9]}));
		let kept = re_shim(&registry, model, results).unwrap();
		assert_eq!(kept, record(json!({"owner": 1, "tags": [9]})));
	}

	struct Recorder {
		seen: Mutex<Vec<(String, String)>>,
	}

	#[async_trait]
	impl Dispatch for Recorder {
		async fn dispatch(&self, req: ApiRequest) -> Result<ApiResponse, Error> {
			self.seen.lock().push((req.method.to_string(), req.path.clone()));
			let mut body = req.body.as_object().cloned().unwrap_or_default();
			if !body.contains_key("id") {
				let name = body.get("name").and_then(Value::as_str).unwrap_or_default();
				body.insert("id".into(), json!(name.len()));
			}
			Ok(ApiResponse::ok(Value::Object(body)))
		}
	}

	#[tokio::test]
	async fn executes_creates_and_updates() {
		let registry = registry();
		let recorder = Recorder {
			seen: Mutex::new(vec![]),
		};
		let mut tasks = IndexMap::new();
		tasks.insert(
			"products".to_owned(),
			Pending::Many(vec![
				Task::Write {
					model: "product".into(),
					values: record(json!({"name": "abc"})),
				},
				Task::Ready(json!(9)),
				Task::Write {
					model: "product".into(),
					values: record(json!({"id": 12, "name": "x"})),
				},
			]),
		);
		let out = execute(&recorder, &registry, &HeaderMap::new(), tasks).await.unwrap();
		assert_eq!(out, record(json!({"products": [3, 9, 12]})));
		let mut seen = recorder.seen.lock().clone();
		seen.sort();
		assert_eq!(
			seen,
			vec![("POST".into(), "/products".into()), ("PUT".into(), "/products/12".into())]
		);
	}

	struct Failing;

	#[async_trait]
	impl Dispatch for Failing {
		async fn dispatch(&self, _: ApiRequest) -> Result<ApiResponse, Error> {
			Ok(ApiResponse::from(Error::BadRequest("nope".into())))
		}
	}

	#[tokio::test]
	async fn failures_propagate() {
		let registry = registry();
		let mut tasks = IndexMap::new();
		tasks.insert(
			"owner".to_owned(),
			Pending::One(Task::Write {
				model: "user".into(),
				values: record(json!({"name": "Ann"})),
			}),
		);
		let res = execute(&Failing, &registry, &HeaderMap::new(), tasks).await;
		assert!(matches!(
			res,
			Err(Error::Api {
				..
			})
		));
	}
}
