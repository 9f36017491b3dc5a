//! The CRUD blueprint actions.
//!
//! A [`Blueprint`] serves the internal CRUD API which every GraphQL
//! resolver talks to. It routes `METHOD /<collection>[/<id>[/<alias>]]`
//! requests onto the find, findone, create, update, destroy and populate
//! actions, each of which can be intercepted through [`Interrupts`].

mod create;
mod criteria;
mod destroy;
mod find;
mod findone;
mod interrupt;
mod inverse;
mod params;
mod populate;
mod publish;
pub mod relations;
mod update;

pub use criteria::{Criteria, compare, loose_eq};
pub use interrupt::{Hook, Interrupt, Interrupts};
pub use inverse::{AliasMap, InverseAlias, InverseAliasMap};
pub use publish::{Publisher, RecordEvent};

use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::api::{ApiRequest, ApiResponse, Dispatch};
use crate::dbs::Store;
use crate::err::Error;
use crate::model::{AttributeKind, ModelDescriptor, ModelRegistry, Primitive};

const TARGET: &str = "boltql::crud";

/// Options shared by every blueprint action
#[derive(Clone, Debug, Default)]
pub struct BlueprintOptions {
	/// Parameters which never become find criteria. Must be an array of
	/// strings, defaults to `limit`, `skip`, `sort` and `populate`.
	pub criteria_blacklist: Option<Value>,
	/// Parameters which are never written by create. Must be an array of strings.
	pub create_blacklist: Option<Value>,
	/// Parameters which are never written by update. Must be an array of
	/// strings, defaults to `id`.
	pub update_blacklist: Option<Value>,
}

#[derive(Clone, Debug, PartialEq)]
enum Action {
	Find,
	FindOne,
	Create,
	Update,
	Destroy,
	Populate(String),
}

/// Serves the CRUD API over a [`Store`]
pub struct Blueprint {
	registry: Arc<ModelRegistry>,
	store: Arc<dyn Store>,
	interrupts: Interrupts,
	options: BlueprintOptions,
	inverse: InverseAliasMap,
	publisher: Option<Publisher>,
}

impl Blueprint {
	pub fn new(registry: Arc<ModelRegistry>, store: Arc<dyn Store>) -> Self {
		Self {
			registry,
			store,
			interrupts: Interrupts::default(),
			options: BlueprintOptions::default(),
			inverse: InverseAliasMap::new(),
			publisher: None,
		}
	}

	pub fn with_interrupts(mut self, interrupts: Interrupts) -> Self {
		self.interrupts = interrupts;
		self
	}

	pub fn with_options(mut self, options: BlueprintOptions) -> Self {
		self.options = options;
		self
	}

	/// Publishes a [`RecordEvent`] for every create, update and destroy
	pub fn with_publisher(mut self, publisher: Publisher) -> Self {
		self.publisher = Some(publisher);
		self
	}

	pub fn registry(&self) -> &Arc<ModelRegistry> {
		&self.registry
	}

	pub fn store(&self) -> &Arc<dyn Store> {
		&self.store
	}

	pub fn inverse_aliases(&self) -> &InverseAliasMap {
		&self.inverse
	}

	pub fn subscribe(&self) -> Option<broadcast::Receiver<RecordEvent>> {
		self.publisher.as_ref().map(Publisher::subscribe)
	}

	fn publish(&self, event: RecordEvent) {
		if let Some(publisher) = &self.publisher {
			let reached = publisher.publish(event);
			trace!(target: TARGET, "Published a record event to {reached} subscribers");
		}
	}

	/// Resolves the model and action of a request, storing the path
	/// parameters on the request
	fn route(&self, req: &mut ApiRequest) -> Result<(&ModelDescriptor, Action), Error> {
		let not_found = || Error::RouteNotFound {
			method: req.method.clone(),
			path: req.path.clone(),
		};
		let path = req.path.split('?').next().unwrap_or_default();
		let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
		let model = match segments.first() {
			Some(name) => self.registry.by_collection(name).ok_or_else(not_found)?,
			None => return Err(not_found()),
		};
		let id = segments.get(1).map(|s| coerce_key(model, s));
		let alias = segments.get(2).map(|s| (*s).to_owned());
		let action = match (&req.method, &id, alias, segments.len()) {
			(&Method::GET, None, None, 1) => Action::Find,
			(&Method::POST, None, None, 1) => Action::Create,
			(&Method::GET, Some(_), None, 2) => Action::FindOne,
			(&Method::PUT | &Method::PATCH, Some(_), None, 2) => Action::Update,
			(&Method::DELETE, Some(_), None, 2) => Action::Destroy,
			(&Method::GET, Some(_), Some(alias), 3) => Action::Populate(alias),
			_ => return Err(not_found()),
		};
		if let Some(id) = id {
			req.params.insert("id".to_owned(), id);
		}
		Ok((model, action))
	}

	async fn handle(
		&self,
		req: &ApiRequest,
		model: &ModelDescriptor,
		action: Action,
	) -> Result<ApiResponse, Error> {
		match action {
			Action::Find => self.find(req, model).await,
			Action::FindOne => self.findone(req, model).await,
			Action::Create => self.create(req, model).await,
			Action::Update => self.update(req, model).await,
			Action::Destroy => self.destroy(req, model).await,
			Action::Populate(alias) => self.populate(req, model, &alias).await,
		}
	}
}

/// Path segments of integer keyed models are read as integers
fn coerce_key(model: &ModelDescriptor, segment: &str) -> Value {
	let integer = matches!(
		model.pk_attribute().map(|a| &a.kind),
		Some(AttributeKind::Scalar(Primitive::Integer))
	);
	match segment.parse::<i64>() {
		Ok(v) if integer => Value::from(v),
		_ => Value::from(segment),
	}
}

#[async_trait]
impl Dispatch for Blueprint {
	async fn dispatch(&self, mut req: ApiRequest) -> Result<ApiResponse, Error> {
		let res = match self.route(&mut req) {
			Ok((model, action)) => {
				debug!(target: TARGET, "{} {} → {:?} on `{}`", req.method, req.path, action, model.identity);
				self.handle(&req, model, action).await
			}
			Err(e) => Err(e),
		};
		Ok(res.unwrap_or_else(ApiResponse::from))
	}
}
