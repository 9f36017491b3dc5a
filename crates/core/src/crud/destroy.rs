use serde_json::Value;

use super::params::{parse_populate, require_pk};
use super::{Blueprint, Hook, RecordEvent};
use crate::api::{ApiRequest, ApiResponse};
use crate::err::Error;
use crate::model::ModelDescriptor;

impl Blueprint {
	/// Destroys one record, responding with the record as it was before
	pub(super) async fn destroy(
		&self,
		req: &ApiRequest,
		model: &ModelDescriptor,
	) -> Result<ApiResponse, Error> {
		let pk = require_pk(req)?;
		let populate = parse_populate(req, model);
		let record = self.store.find_one(model, &pk, &populate).await?.ok_or_else(|| {
			Error::NotFound {
				key: "id".to_owned(),
			}
		})?;
		self.store.destroy(model, &pk).await?;
		let id = model.pk_of(&record).cloned().unwrap_or(pk);
		let response =
			self.interrupts.run(Hook::Destroy, req, model, Value::Object(record.clone())).await?;
		self.publish(RecordEvent::Destroyed {
			model: model.identity.clone(),
			id,
			previous: record,
		});
		Ok(ApiResponse::ok(response))
	}
}
