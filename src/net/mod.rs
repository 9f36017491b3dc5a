mod api;
mod gql;
mod health;
mod signals;

use std::sync::Arc;

use axum::{Extension, Router};
use boltql_core::crud::Blueprint;
use boltql_core::gql::GraphqlService;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::cli::config::Config;
use crate::cnf::HTTP_MAX_BODY_SIZE;
use crate::err::Error;

const LOG: &str = "boltql::net";

/// The services shared by every route
#[derive(Clone)]
pub struct AppState {
	pub service: GraphqlService,
	pub blueprint: Arc<Blueprint>,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.merge(health::router())
		.merge(gql::router())
		.merge(api::router())
		.layer(Extension(state))
		.layer(RequestBodyLimitLayer::new(*HTTP_MAX_BODY_SIZE))
		.layer(CorsLayer::permissive())
		.layer(TraceLayer::new_for_http())
		.layer(PropagateRequestIdLayer::x_request_id())
		.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

pub async fn init(cf: &Config, state: AppState) -> Result<(), Error> {
	let listener = tokio::net::TcpListener::bind(cf.bind).await?;
	info!(target: LOG, "Started web server on {} for the models in {}", cf.bind, cf.models.display());
	axum::serve(listener, router(state)).with_graceful_shutdown(signals::shutdown()).await?;
	info!(target: LOG, "Web server stopped. Bye!");
	Ok(())
}
