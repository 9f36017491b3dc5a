use axum::routing::get;
use axum::{Extension, Router};

use super::AppState;
use crate::err::Error;

pub(super) fn router<S>() -> Router<S>
where
	S: Clone + Send + Sync + 'static,
{
	Router::new().route("/health", get(handler))
}

/// Healthy once the GraphQL schema can be generated
async fn handler(Extension(state): Extension<AppState>) -> Result<(), Error> {
	state.service.ensure_built().await?;
	trace!("Health check passed");
	Ok(())
}
