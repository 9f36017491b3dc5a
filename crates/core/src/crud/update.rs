use serde_json::{Value, json};

use super::params::{parse_populate, parse_values, require_pk};
use super::relations::{de_shim, execute, generate, re_shim};
use super::{Blueprint, Hook, RecordEvent, TARGET, loose_eq};
use crate::api::{ApiRequest, ApiResponse};
use crate::cnf::UPDATE_BLACKLIST;
use crate::err::Error;
use crate::model::{ModelDescriptor, Record};

impl Blueprint {
	/// Updates one record. Nested association payloads are written through
	/// the CRUD API and the resulting keys stored by a second update.
	pub(super) async fn update(
		&self,
		req: &ApiRequest,
		model: &ModelDescriptor,
	) -> Result<ApiResponse, Error> {
		let pk = require_pk(req)?;
		let sent = req.body.get(&model.primary_key).or_else(|| req.query.get(&model.primary_key));
		if let Some(sent) = sent.filter(|v| !v.is_null() && !loose_eq(v, &pk)) {
			warn!(target: TARGET, "Cannot change primary key via update blueprint; ignoring value sent for `{}`: {sent}", model.primary_key);
		}
		let mut values =
			parse_values(req, self.options.update_blacklist.as_ref(), &UPDATE_BLACKLIST)?;
		values.remove(&model.primary_key);
		let before = self.store.find_one(model, &pk, &[]).await?.ok_or_else(|| {
			Error::NotFound {
				key: "id".to_owned(),
			}
		})?;
		// Nested children are stamped with the key as stored
		let stored_pk = model.pk_of(&before).cloned().unwrap_or_else(|| pk.clone());
		let container = de_shim(&self.registry, model, &mut values)?;
		let values = match self
			.interrupts
			.run(Hook::BeforeUpdate, req, model, Value::Object(values))
			.await?
		{
			Value::Object(v) => v,
			_ => {
				return Err(Error::interrupted(
					Hook::BeforeUpdate.name(),
					"the update values must remain an object",
				));
			}
		};
		let updated = self.store.update(model, &stored_pk, values.clone()).await?;
		let mut after = self.single_update(model, updated).unwrap_or_else(|| before.clone());
		let tasks = generate(&self.registry, model, container, &stored_pk)?;
		if !tasks.is_empty() {
			debug!(target: TARGET, "Running {} nested writes for `{}`", tasks.len(), model.identity);
			let results = execute(self, &self.registry, &req.headers, tasks).await?;
			let mut merged = self.store.find_one(model, &stored_pk, &[]).await?.ok_or_else(|| {
				Error::NotFound {
					key: "id".to_owned(),
				}
			})?;
			merged.extend(re_shim(&self.registry, model, results)?);
			merged.remove(&model.primary_key);
			let updated = self.store.update(model, &stored_pk, merged).await?;
			if let Some(record) = self.single_update(model, updated) {
				after = record;
			}
		}
		self.interrupts
			.run(
				Hook::AfterUpdate,
				req,
				model,
				json!({
					"before": before,
					"after": after,
					"values": values,
				}),
			)
			.await?;
		self.publish(RecordEvent::Updated {
			model: model.identity.clone(),
			id: stored_pk.clone(),
			values,
			previous: before,
		});
		let populate = parse_populate(req, model);
		let record = self.store.find_one(model, &stored_pk, &populate).await?.ok_or_else(|| {
			Error::Store("Could not find record after updating!".to_owned())
		})?;
		Ok(ApiResponse::ok(record))
	}

	/// Takes the record an update by primary key wrote, warning when the
	/// store reports anything other than exactly one
	fn single_update(&self, model: &ModelDescriptor, records: Vec<Record>) -> Option<Record> {
		if records.len() != 1 {
			warn!(target: TARGET, "Unexpected output from `{}.update`.", model.global_name());
		}
		records.into_iter().next()
	}
}
