//! The core of boltql.
//!
//! This crate derives a GraphQL schema from ORM model metadata and resolves
//! every GraphQL field by issuing internal requests against the CRUD
//! blueprint actions, which in turn talk to a [`dbs::Store`].
//!
//! The main entry points are [`model::ModelRegistry`], which holds the
//! ingested model descriptors, [`crud::Blueprint`], which serves the
//! internal CRUD API, and [`gql::GraphqlService`], which owns the lazily
//! generated schema and executes GraphQL requests.

#[macro_use]
extern crate tracing;

#[macro_use]
mod mac;

pub mod api;
pub mod cnf;
pub mod crud;
pub mod dbs;
pub mod err;
pub mod gql;
pub mod mem;
pub mod model;
