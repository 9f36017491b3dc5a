use inflector::Inflector;

use crate::model::{ModelDescriptor, lcfirst, ucfirst};

/// Every GraphQL name derived from one model
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Names {
	pub type_name: String,
	pub input_type_name: String,
	pub connection_type_name: String,
	pub query_name: String,
	pub query_plural_name: String,
	pub query_type_name: String,
	pub query_plural_type_name: String,
	pub mutation_create_name: String,
	pub mutation_create_type_name: String,
	pub mutation_update_name: String,
	pub mutation_update_type_name: String,
	pub mutation_delete_name: String,
	pub mutation_delete_type_name: String,
}

impl Names {
	pub fn of(model: &ModelDescriptor) -> Self {
		let global = model.global_name();
		let query_name = lcfirst(&global);
		Self {
			type_name: format!("{global}Type"),
			input_type_name: format!("{global}InputType"),
			connection_type_name: format!("{global}ConnectionType"),
			query_plural_name: query_name.to_plural(),
			query_name,
			query_type_name: format!("{global}Query"),
			query_plural_type_name: format!("{global}RangeQuery"),
			mutation_create_name: format!("create{global}"),
			mutation_create_type_name: format!("Create{global}Mutation"),
			mutation_update_name: format!("update{global}"),
			mutation_update_type_name: format!("Update{global}Mutation"),
			mutation_delete_name: format!("delete{global}"),
			mutation_delete_type_name: format!("Delete{global}Mutation"),
		}
	}
}

/// The connection type of a to-many field
pub fn field_connection_type_name(model: &ModelDescriptor, field: &str) -> String {
	format!("{}{}ConnectionType", model.global_name(), ucfirst(field))
}

pub fn field_union_type_name(model: &ModelDescriptor, field: &str) -> String {
	format!("{}{}UnionType", model.global_name(), ucfirst(field))
}
