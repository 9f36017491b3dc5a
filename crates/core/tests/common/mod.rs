#![allow(dead_code)]

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use boltql_core::api::{ApiRequest, ApiResponse, Dispatch};
use boltql_core::crud::{Blueprint, Interrupts, Publisher, RecordEvent};
use boltql_core::dbs::Store;
use boltql_core::err::Error;
use boltql_core::gql::GraphqlService;
use boltql_core::mem::MemoryStore;
use boltql_core::model::{ModelRegistry, Record};
use http::HeaderMap;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

pub fn registry() -> ModelRegistry {
	ModelRegistry::from_json(json!({
		"category": {
			"globalId": "Category",
			"attributes": {
				"id": {"type": "integer", "primaryKey": true, "unique": true},
				"name": {"type": "string", "unique": true, "required": true},
				"owner": {"model": "user"},
				"products": {"collection": "product", "via": "category"},
				"tags": {"collection": "tag", "via": "categories"},
			},
		},
		"user": {
			"globalId": "User",
			"attributes": {
				"id": {"type": "integer", "primaryKey": true},
				"name": "string",
			},
		},
		"product": {
			"globalId": "Product",
			"attributes": {
				"id": {"type": "integer", "primaryKey": true},
				"title": "string",
				"price": "float",
				"category": {"model": "category"},
			},
		},
		"tag": {
			"globalId": "Tag",
			"attributes": {
				"id": {"type": "integer", "primaryKey": true, "unique": true},
				"label": "string",
				"categories": {"collection": "category", "via": "tags"},
			},
		},
	}))
	.unwrap()
}

/// Records the method and path of every request it forwards
pub struct Recording {
	inner: Arc<Blueprint>,
	pub seen: Mutex<Vec<String>>,
}

impl Recording {
	pub fn requests(&self) -> Vec<String> {
		self.seen.lock().clone()
	}

	pub fn clear(&self) {
		self.seen.lock().clear();
	}
}

#[async_trait]
impl Dispatch for Recording {
	async fn dispatch(&self, req: ApiRequest) -> Result<ApiResponse, Error> {
		self.seen.lock().push(format!("{} {}", req.method, req.path));
		self.inner.dispatch(req).await
	}
}

pub struct Harness {
	pub registry: Arc<ModelRegistry>,
	pub store: Arc<MemoryStore>,
	pub blueprint: Arc<Blueprint>,
	pub recording: Arc<Recording>,
	pub service: GraphqlService,
	pub events: broadcast::Receiver<RecordEvent>,
}

impl Harness {
	pub fn new() -> Self {
		Self::with_interrupts(Interrupts::new())
	}

	pub fn with_interrupts(interrupts: Interrupts) -> Self {
		let registry = Arc::new(registry());
		let store = Arc::new(MemoryStore::new(registry.clone()));
		let blueprint = Blueprint::new(registry.clone(), store.clone())
			.with_interrupts(interrupts)
			.with_publisher(Publisher::new(64));
		let events = blueprint.subscribe().unwrap();
		let blueprint = Arc::new(blueprint);
		let recording = Arc::new(Recording {
			inner: blueprint.clone(),
			seen: Mutex::new(vec![]),
		});
		let service = GraphqlService::new(registry.clone(), recording.clone());
		Self {
			registry,
			store,
			blueprint,
			recording,
			service,
			events,
		}
	}

	/// Writes a record straight to the store
	pub async fn seed(&self, identity: &str, values: Value) -> Record {
		let model = self.registry.get(identity).unwrap();
		let Value::Object(values) = values else {
			panic!("seed values must be an object");
		};
		self.store.create(model, values).await.unwrap()
	}

	pub async fn graphql(&self, query: &str) -> Value {
		self.service.execute(query, None, HeaderMap::new()).await.unwrap()
	}

	pub async fn graphql_with(&self, query: &str, variables: Value) -> Value {
		self.service.execute(query, Some(variables), HeaderMap::new()).await.unwrap()
	}

	pub async fn api(&self, req: ApiRequest) -> ApiResponse {
		self.blueprint.dispatch(req).await.unwrap()
	}

	/// Drains the record events published so far
	pub fn drain_events(&mut self) -> Vec<RecordEvent> {
		let mut out = vec![];
		while let Ok(event) = self.events.try_recv() {
			out.push(event);
		}
		out
	}
}

/// Formatted log output collected on the current thread
#[derive(Clone, Default)]
pub struct Logs(Arc<Mutex<Vec<u8>>>);

impl Logs {
	pub fn contents(&self) -> String {
		String::from_utf8_lossy(&self.0.lock()).into_owned()
	}
}

impl io::Write for Logs {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl<'a> MakeWriter<'a> for Logs {
	type Writer = Logs;

	fn make_writer(&'a self) -> Self::Writer {
		self.clone()
	}
}

/// Captures warnings logged on this thread until the guard is dropped
pub fn capture_warnings() -> (Logs, DefaultGuard) {
	let logs = Logs::default();
	let subscriber = tracing_subscriber::fmt()
		.with_writer(logs.clone())
		.with_ansi(false)
		.with_max_level(tracing::Level::WARN)
		.finish();
	(logs, tracing::subscriber::set_default(subscriber))
}
