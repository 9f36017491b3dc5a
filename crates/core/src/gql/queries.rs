use async_graphql::dynamic::{Field, FieldFuture, InputValue, Object, TypeRef};

use super::naming::Names;
use super::resolvers;
use super::types::{Models, connection_args, primitive_type};
use crate::model::AttributeKind;

/// Adds the singular and the range query of every model to the query root
pub fn build_queries(models: &Models, mut query: Object) -> Object {
	for model in models.values() {
		let names = Names::of(model);
		// Find one record by any of its unique attributes
		let target = model.clone();
		let mut single = Field::new(&names.query_name, TypeRef::named(&names.type_name), move |ctx| {
			let target = target.clone();
			FieldFuture::new(async move { Ok(resolvers::get_single(&ctx, &target).await?) })
		})
		.description(format!("Finds one `{}` by a unique attribute", model.global_name()));
		for attr in model.attributes.values().filter(|a| a.unique) {
			if let AttributeKind::Scalar(primitive) = &attr.kind {
				if let Some(ty) = primitive_type(primitive) {
					single = single.argument(InputValue::new(&attr.name, ty));
				}
			}
		}
		query = query.field(single);
		// Find a page of records
		let target = model.clone();
		let range = Field::new(
			&names.query_plural_name,
			TypeRef::named(&names.connection_type_name),
			move |ctx| {
				let target = target.clone();
				FieldFuture::new(async move { Ok(resolvers::get_range(&ctx, &target, None).await?) })
			},
		)
		.description(format!("Finds a page of `{}` records", model.global_name()));
		query = query.field(connection_args(range));
	}
	query
}
