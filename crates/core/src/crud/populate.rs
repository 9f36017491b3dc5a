use serde_json::Value;

use super::params::{parse_limit, require_pk};
use super::{Blueprint, Hook};
use crate::api::{ApiRequest, ApiResponse};
use crate::dbs::Populate;
use crate::err::Error;
use crate::model::ModelDescriptor;

impl Blueprint {
	/// Responds with the populated value of one association of a record
	pub(super) async fn populate(
		&self,
		req: &ApiRequest,
		model: &ModelDescriptor,
		alias: &str,
	) -> Result<ApiResponse, Error> {
		let attr = model.attribute(alias).filter(|a| a.is_association()).ok_or_else(|| {
			Error::BadRequest(format!("`{alias}` is not an association of `{}`", model.identity))
		})?;
		let pk = require_pk(req)?;
		let populate = [Populate {
			alias: attr.name.clone(),
			limit: parse_limit(req)?,
		}];
		let mut record = self.store.find_one(model, &pk, &populate).await?.ok_or_else(|| {
			Error::NotFound {
				key: "id".to_owned(),
			}
		})?;
		let value = match record.remove(&attr.name) {
			Some(v) => v,
			None if attr.is_to_many() => Value::Array(vec![]),
			None => Value::Null,
		};
		let value = self.interrupts.run(Hook::Populate, req, model, value).await?;
		Ok(ApiResponse::ok(value))
	}
}
