use std::sync::Arc;

use async_graphql::dynamic::{Field, FieldFuture, InputObject, InputValue, Object, Type, TypeRef};
use indexmap::IndexMap;

use super::error::{GqlError, schema_error};
use super::naming::{Names, field_connection_type_name};
use super::resolvers::{self, ParentLink};
use crate::cnf::JSON_SCALAR;
use crate::model::{AttributeKind, ModelDescriptor, Primitive};

const TARGET: &str = "boltql::gql::types";

/// The graphable models, keyed by identity, in registry order
pub type Models = IndexMap<String, Arc<ModelDescriptor>>;

/// The named scalar a primitive maps to. Arrays and unknown types have none.
pub fn scalar_name(primitive: &Primitive) -> Option<&'static str> {
	match primitive {
		Primitive::Json => Some(JSON_SCALAR),
		Primitive::String | Primitive::Date | Primitive::DateTime => Some(TypeRef::STRING),
		Primitive::Integer => Some(TypeRef::INT),
		Primitive::Float => Some(TypeRef::FLOAT),
		Primitive::Boolean => Some(TypeRef::BOOLEAN),
		Primitive::ObjectId => Some(TypeRef::ID),
		Primitive::Array | Primitive::Unsupported(_) => None,
	}
}

/// The nullable type of a scalar attribute
pub fn primitive_type(primitive: &Primitive) -> Option<TypeRef> {
	match primitive {
		Primitive::Array => Some(TypeRef::named_list(TypeRef::STRING)),
		p => scalar_name(p).map(TypeRef::named),
	}
}

macro_rules! int_field {
	($name:expr) => {
		scalar_field($name, TypeRef::named(TypeRef::INT))
	};
}

pub(super) fn scalar_field(name: &str, ty: TypeRef) -> Field {
	let key = name.to_owned();
	Field::new(name, ty, move |ctx| {
		let key = key.clone();
		FieldFuture::new(async move { Ok(resolvers::scalar(&ctx, &key)?) })
	})
}

/// Adds the pagination arguments of a range field
pub(super) fn connection_args(field: Field) -> Field {
	field
		.argument(InputValue::new("where", TypeRef::named(TypeRef::STRING)))
		.argument(InputValue::new("limit", TypeRef::named(TypeRef::INT)))
		.argument(InputValue::new("skip", TypeRef::named(TypeRef::INT)))
		.argument(InputValue::new("sort", TypeRef::named(TypeRef::STRING)))
}

/// A page of records of one type
pub(super) fn connection_type(name: &str, edges: &str) -> Object {
	Object::new(name)
		.field(int_field!("page"))
		.field(int_field!("pages"))
		.field(int_field!("perPage"))
		.field(int_field!("total"))
		.field(Field::new("edges", TypeRef::named_list(edges), |ctx| {
			FieldFuture::new(async move { Ok(resolvers::records(&ctx, "edges")?) })
		}))
}

/// Builds the object, input and connection types of every graphable model
pub fn build_types(models: &Models) -> Result<Vec<Type>, GqlError> {
	let mut types = Vec::new();
	for model in models.values() {
		trace!(target: TARGET, "Adding model: {}", model.identity);
		let names = Names::of(model);
		let mut object = Object::new(&names.type_name);
		let mut input = InputObject::new(&names.input_type_name);
		let mut fields = 0;
		for attr in model.attributes.values() {
			match &attr.kind {
				AttributeKind::Scalar(primitive) => {
					let Some(ty) = primitive_type(primitive) else {
						warn!(target: TARGET, "Field `{}` on `{}` has unsupported type `{primitive:?}` and was omitted", attr.name, model.identity);
						continue;
					};
					object = object.field(scalar_field(&attr.name, ty.clone()));
					input = input.field(InputValue::new(&attr.name, ty));
				}
				AttributeKind::ToOne {
					model: target,
				} => {
					let Some(target) = models.get(target) else {
						warn!(target: TARGET, "Field `{}` on `{}` references `{target}`, which is not exposed, and was omitted", attr.name, model.identity);
						continue;
					};
					let target_names = Names::of(target);
					let (key, target) = (attr.name.clone(), target.clone());
					let field = Field::new(&attr.name, TypeRef::named(&target_names.type_name), move |ctx| {
						let (key, target) = (key.clone(), target.clone());
						FieldFuture::new(async move {
							Ok(resolvers::get_nested_single(&ctx, &key, &target).await?)
						})
					})
					.argument(InputValue::new("id", TypeRef::named(TypeRef::ID)));
					object = object.field(field);
					input = input.field(InputValue::new(
						&attr.name,
						TypeRef::named(&target_names.input_type_name),
					));
				}
				AttributeKind::ToMany {
					via,
					..
				} => {
					let Some(target) = attr.target().and_then(|t| models.get(t)) else {
						warn!(target: TARGET, "Field `{}` on `{}` references a model which is not exposed, and was omitted", attr.name, model.identity);
						continue;
					};
					let target_names = Names::of(target);
					let connection = field_connection_type_name(model, &attr.name);
					types.push(Type::Object(connection_type(&connection, &target_names.type_name)));
					let link = ParentLink {
						field: via.clone().unwrap_or_else(|| names.query_name.clone()),
						key: model.primary_key.clone(),
					};
					let target = target.clone();
					let field = Field::new(&attr.name, TypeRef::named(&connection), move |ctx| {
						let (link, target) = (link.clone(), target.clone());
						FieldFuture::new(async move {
							Ok(resolvers::get_range(&ctx, &target, Some(&link)).await?)
						})
					});
					object = object.field(connection_args(field));
					input = input.field(InputValue::new(
						&attr.name,
						TypeRef::named_list(&target_names.input_type_name),
					));
				}
				AttributeKind::Unclassified => {
					warn!(target: TARGET, "Field `{}` on `{}` has no type, collection or model and was omitted", attr.name, model.identity);
					continue;
				}
			}
			fields += 1;
		}
		if fields == 0 {
			return Err(schema_error(format!("the model `{}` exposes no fields", model.identity)));
		}
		types.push(Type::Object(object));
		types.push(Type::InputObject(input));
		types.push(Type::Object(connection_type(&names.connection_type_name, &names.type_name)));
	}
	Ok(types)
}
