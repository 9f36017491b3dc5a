//! The GraphQL façade.
//!
//! The schema is derived from the model registry: every graphable model
//! yields an object type, an input type and a connection type, a singular
//! and a range query, and create, update and delete mutations. Resolvers
//! never touch the store; they issue internal requests against the CRUD
//! API through the [`Dispatch`](crate::api::Dispatch) found in the
//! per-request [`RequestData`].

pub mod cache;
pub mod error;
mod ext;
mod mutations;
pub mod naming;
mod queries;
pub mod resolvers;
pub mod schema;
mod service;
mod types;

pub use cache::SchemaCache;
pub use error::{GqlError, format_errors};
pub use resolvers::RequestData;
pub use schema::generate_schema;
pub use service::{GraphqlService, INTROSPECTION_QUERY};
