use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::ApiRequest;
use crate::err::Error;
use crate::model::ModelDescriptor;

/// The points in the blueprint actions where an [`Interrupt`] can step in
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Hook {
	/// Runs with the created record, before it is published
	Create,
	/// Runs with the destroyed record
	Destroy,
	/// Runs with the array of found records
	Find,
	/// Runs with the found record
	FindOne,
	/// Runs with the populated association value
	Populate,
	/// Runs with the values about to be written by an update
	BeforeUpdate,
	/// Runs with `{before, after, values}` once an update is written. The
	/// response is always the re-fetched record, so only errors matter here.
	AfterUpdate,
}

impl Hook {
	pub fn name(&self) -> &'static str {
		match self {
			Hook::Create => "create",
			Hook::Destroy => "destroy",
			Hook::Find => "find",
			Hook::FindOne => "findone",
			Hook::Populate => "populate",
			Hook::BeforeUpdate => "beforeUpdate",
			Hook::AfterUpdate => "afterUpdate",
		}
	}
}

impl fmt::Display for Hook {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Intercepts a blueprint action.
///
/// Returning `Ok` lets the action proceed with the returned value, which
/// may differ from the one passed in. Returning `Err` aborts the action and
/// the error is served as the response.
#[async_trait]
pub trait Interrupt: Send + Sync {
	async fn call(
		&self,
		req: &ApiRequest,
		model: &ModelDescriptor,
		value: Value,
	) -> Result<Value, Error>;
}

#[async_trait]
impl<F> Interrupt for F
where
	F: Fn(&ApiRequest, &ModelDescriptor, Value) -> Result<Value, Error> + Send + Sync,
{
	async fn call(
		&self,
		req: &ApiRequest,
		model: &ModelDescriptor,
		value: Value,
	) -> Result<Value, Error> {
		self(req, model, value)
	}
}

/// The registered interrupts. Hooks registered for a specific model take
/// precedence over the ones registered for every model.
#[derive(Clone, Default)]
pub struct Interrupts {
	global: HashMap<Hook, Arc<dyn Interrupt>>,
	models: HashMap<(String, Hook), Arc<dyn Interrupt>>,
}

impl fmt::Debug for Interrupts {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Interrupts")
			.field("global", &self.global.keys().collect::<Vec<_>>())
			.field("models", &self.models.keys().collect::<Vec<_>>())
			.finish()
	}
}

impl Interrupts {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers an interrupt for every model
	pub fn set(mut self, hook: Hook, interrupt: impl Interrupt + 'static) -> Self {
		self.global.insert(hook, Arc::new(interrupt));
		self
	}

	/// Registers an interrupt for a single model
	pub fn set_for(
		mut self,
		model: &str,
		hook: Hook,
		interrupt: impl Interrupt + 'static,
	) -> Self {
		self.models.insert((model.to_lowercase(), hook), Arc::new(interrupt));
		self
	}

	/// Runs the interrupt registered for a hook, passing the value through
	/// unchanged when there is none
	pub async fn run(
		&self,
		hook: Hook,
		req: &ApiRequest,
		model: &ModelDescriptor,
		value: Value,
	) -> Result<Value, Error> {
		let interrupt = self
			.models
			.get(&(model.identity.clone(), hook))
			.or_else(|| self.global.get(&hook));
		match interrupt {
			Some(i) => {
				trace!("Running the `{hook}` interrupt for `{}`", model.identity);
				i.call(req, model, value).await
			}
			None => Ok(value),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::ModelRegistry;
	use serde_json::json;

	fn registry() -> ModelRegistry {
		ModelRegistry::from_json(json!({
			"category": {"globalId": "Category", "attributes": {"id": "integer"}},
			"product": {"globalId": "Product", "attributes": {"id": "integer"}},
		}))
		.unwrap()
	}

	#[tokio::test]
	async fn defaults_to_passing_through() {
		let registry = registry();
		let model = registry.get("category").unwrap();
		let req = ApiRequest::get("/categories");
		let out = Interrupts::new().run(Hook::Create, &req, model, json!({"a": 1})).await.unwrap();
		assert_eq!(out, json!({"a": 1}));
	}

	#[tokio::test]
	async fn model_hooks_win() {
		let registry = registry();
		let req = ApiRequest::get("/categories");
		let interrupts = Interrupts::new()
			.set(Hook::Find, |_: &ApiRequest, _: &ModelDescriptor, _: Value| -> Result<Value, Error> {
				Ok(json!("global"))
			})
			.set_for("Category", Hook::Find, |_: &ApiRequest, _: &ModelDescriptor, _: Value| -> Result<Value, Error> {
				Err(Error::interrupted("find", "denied"))
			});
		let category = registry.get("category").unwrap();
		let product = registry.get("product").unwrap();
		assert!(interrupts.run(Hook::Find, &req, category, json!([])).await.is_err());
		assert_eq!(
			interrupts.run(Hook::Find, &req, product, json!([])).await.unwrap(),
			json!("global")
		);
	}
}
