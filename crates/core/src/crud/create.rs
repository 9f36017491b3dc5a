use serde_json::Value;

use super::params::{parse_populate, parse_values};
use super::relations::{de_shim, execute, generate, re_shim};
use super::{Blueprint, Hook, RecordEvent, TARGET};
use crate::api::{ApiRequest, ApiResponse};
use crate::err::Error;
use crate::model::{ModelDescriptor, Record};

impl Blueprint {
	/// Creates one record, writing any nested association payloads through
	/// the CRUD API once the root record has a primary key
	pub(super) async fn create(
		&self,
		req: &ApiRequest,
		model: &ModelDescriptor,
	) -> Result<ApiResponse, Error> {
		let mut values = parse_values(req, self.options.create_blacklist.as_ref(), &[])?;
		let container = de_shim(&self.registry, model, &mut values)?;
		let created = self.store.create(model, values).await?;
		let pk = model.pk_of(&created).cloned().ok_or_else(|| {
			Error::Store(format!("The created `{}` record has no primary key", model.identity))
		})?;
		let tasks = generate(&self.registry, model, container, &pk)?;
		if tasks.is_empty() {
			return self.finish_create(req, model, created).await;
		}
		debug!(target: TARGET, "Running {} nested writes for a new `{}`", tasks.len(), model.identity);
		let results = execute(self, &self.registry, &req.headers, tasks).await?;
		let current = self.store.find_one(model, &pk, &[]).await?.ok_or_else(|| {
			Error::Store(format!("Could not find the `{}` record after creating it", model.identity))
		})?;
		let mut merged = current;
		merged.extend(re_shim(&self.registry, model, results)?);
		merged.remove(&model.primary_key);
		self.store.update(model, &pk, merged).await?;
		let populate = parse_populate(req, model);
		let record = self.store.find_one(model, &pk, &populate).await?.ok_or_else(|| {
			Error::Store(format!("Could not find the `{}` record after creating it", model.identity))
		})?;
		self.finish_create(req, model, record).await
	}

	async fn finish_create(
		&self,
		req: &ApiRequest,
		model: &ModelDescriptor,
		record: Record,
	) -> Result<ApiResponse, Error> {
		let record = self.interrupts.run(Hook::Create, req, model, Value::Object(record)).await?;
		self.publish(RecordEvent::Created {
			model: model.identity.clone(),
			record: record.clone(),
		});
		Ok(ApiResponse::created(record))
	}
}
