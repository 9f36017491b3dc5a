use async_graphql::dynamic::{Field, FieldFuture, InputValue, Object, TypeRef};

use super::error::GqlError;
use super::naming::Names;
use super::resolvers;
use super::types::{Models, scalar_name};
use crate::err::Error;
use crate::model::{AttributeKind, ModelDescriptor};

/// The non-null type of a model's primary key argument
fn pk_type(model: &ModelDescriptor) -> Result<TypeRef, GqlError> {
	let attr = model.pk_attribute().ok_or_else(|| Error::MissingPrimaryKey {
		model: model.identity.clone(),
		key: model.primary_key.clone(),
	})?;
	let name = match &attr.kind {
		AttributeKind::Scalar(primitive) => scalar_name(primitive),
		_ => None,
	};
	match name {
		Some(name) => Ok(TypeRef::named_nn(name)),
		None => Err(Error::UnsupportedType {
			model: model.identity.clone(),
			attribute: attr.name.clone(),
			kind: format!("{:?}", attr.kind),
		}
		.into()),
	}
}

/// Adds the create, update and delete mutations of every model to the
/// mutation root
pub fn build_mutations(models: &Models, mut mutation: Object) -> Result<Object, GqlError> {
	for model in models.values() {
		let names = Names::of(model);
		let pk = pk_type(model)?;
		let input = TypeRef::named_nn(&names.input_type_name);

		let (target, arg) = (model.clone(), names.query_name.clone());
		let create = Field::new(&names.mutation_create_name, TypeRef::named(&names.type_name), move |ctx| {
			let (target, arg) = (target.clone(), arg.clone());
			FieldFuture::new(async move { Ok(resolvers::create(&ctx, &target, &arg).await?) })
		})
		.argument(InputValue::new(&names.query_name, input.clone()));

		let (target, arg) = (model.clone(), names.query_name.clone());
		let update = Field::new(&names.mutation_update_name, TypeRef::named(&names.type_name), move |ctx| {
			let (target, arg) = (target.clone(), arg.clone());
			FieldFuture::new(async move { Ok(resolvers::update(&ctx, &target, &arg).await?) })
		})
		.argument(InputValue::new("id", pk.clone()))
		.argument(InputValue::new(&names.query_name, input));

		let target = model.clone();
		let delete = Field::new(&names.mutation_delete_name, TypeRef::named(&names.type_name), move |ctx| {
			let target = target.clone();
			FieldFuture::new(async move { Ok(resolvers::delete(&ctx, &target).await?) })
		})
		.argument(InputValue::new("id", pk));

		mutation = mutation.field(create).field(update).field(delete);
	}
	Ok(mutation)
}
