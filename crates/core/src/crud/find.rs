use futures::future::{try_join, try_join_all};
use serde_json::{Value, json};

use super::params::{parse_criteria, parse_limit, parse_pk, parse_populate, parse_skip, parse_sort};
use super::{Blueprint, Criteria, Hook, InverseAlias, TARGET};
use crate::api::{ApiRequest, ApiResponse};
use crate::cnf::INVERSE_LIMIT;
use crate::dbs::{FindQuery, Populate};
use crate::err::Error;
use crate::model::ModelDescriptor;

impl Blueprint {
	/// Finds the records matching the request criteria, responding with
	/// `{data, meta: {total}}`. A request carrying an `id` is served as a
	/// findone instead.
	pub(super) async fn find(
		&self,
		req: &ApiRequest,
		model: &ModelDescriptor,
	) -> Result<ApiResponse, Error> {
		if parse_pk(req).is_some() {
			return self.findone(req, model).await;
		}
		let criteria = parse_criteria(req, self.options.criteria_blacklist.as_ref())?;
		let criteria = self.resolve_many_to_many(model, criteria).await?;
		let query = FindQuery {
			criteria,
			skip: parse_skip(req)?,
			limit: Some(parse_limit(req)?),
			sort: parse_sort(req)?,
			populate: parse_populate(req, model),
		};
		let (total, records) = try_join(
			self.store.count(model, &query.criteria),
			self.store.find(model, &query),
		)
		.await?;
		let records = Value::Array(records.into_iter().map(Value::Object).collect());
		let data = self.interrupts.run(Hook::Find, req, model, records).await?;
		Ok(ApiResponse::ok(json!({
			"data": data,
			"meta": {"total": total},
		})))
	}

	/// Replaces every criteria clause on a many-to-many alias with a filter
	/// on the primary keys found through the inverse association. Keys found
	/// for several aliases are unioned.
	async fn resolve_many_to_many(
		&self,
		model: &ModelDescriptor,
		criteria: Criteria,
	) -> Result<Criteria, Error> {
		let Some(aliases) = self.inverse.for_model(&self.registry, &model.identity) else {
			return Ok(criteria);
		};
		let (remaining, extracted) = criteria.extract(|k| aliases.contains_key(k));
		if extracted.is_empty() {
			return Ok(remaining);
		}
		let lookups = extracted.into_iter().filter_map(|(alias, values)| {
			aliases.get(&alias).map(|inverse| self.inverse_keys(model, inverse, values))
		});
		let keys: Vec<Value> = try_join_all(lookups).await?.into_iter().flatten().collect();
		debug!(target: TARGET, "Resolved {} `{}` keys through many-to-many filters", keys.len(), model.identity);
		Ok(remaining.set_field(&model.primary_key, Value::Array(keys)))
	}

	/// Looks up the target records and collects the keys of the records
	/// populated on their inverse association
	async fn inverse_keys(
		&self,
		model: &ModelDescriptor,
		inverse: &InverseAlias,
		values: Vec<Value>,
	) -> Result<Vec<Value>, Error> {
		let target = self.registry.get(&inverse.collection)?;
		let query = FindQuery {
			populate: vec![Populate {
				alias: inverse.alias.clone(),
				limit: *INVERSE_LIMIT,
			}],
			..FindQuery::new(Criteria::Field(target.primary_key.clone(), Value::Array(values)))
		};
		let records = self.store.find(target, &query).await?;
		let mut keys = Vec::new();
		for record in records {
			let Some(Value::Array(items)) = record.get(&inverse.alias) else {
				continue;
			};
			for item in items {
				match item {
					Value::Object(o) => keys.extend(model.pk_of(o).cloned()),
					Value::Null => {}
					v => keys.push(v.clone()),
				}
			}
		}
		Ok(keys)
	}
}
