use serde_json::Value;

use super::params::{parse_populate, require_pk};
use super::{Blueprint, Hook};
use crate::api::{ApiRequest, ApiResponse};
use crate::err::Error;
use crate::model::ModelDescriptor;

impl Blueprint {
	/// Finds one populated record by primary key
	pub(super) async fn findone(
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
		let record = self.interrupts.run(Hook::FindOne, req, model, Value::Object(record)).await?;
		Ok(ApiResponse::ok(record))
	}
}
