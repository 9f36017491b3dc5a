mod request;
mod response;

pub use request::ApiRequest;
pub use response::ApiResponse;

use async_trait::async_trait;
use serde_json::Value;

use crate::err::Error;

/// Something which can serve a request against the CRUD API.
///
/// An `Err` means the request could not be delivered at all. A request
/// which was delivered but rejected comes back as an unsuccessful
/// [`ApiResponse`].
#[async_trait]
pub trait Dispatch: Send + Sync {
	async fn dispatch(&self, req: ApiRequest) -> Result<ApiResponse, Error>;
}

#[async_trait]
pub trait DispatchExt: Dispatch {
	/// Dispatches a request and returns the response body, turning an
	/// unsuccessful status into [`Error::Api`]
	async fn send(&self, req: ApiRequest) -> Result<Value, Error> {
		let method = req.method.clone();
		let path = req.path.clone();
		trace!("Dispatching internal request {method} {path}");
		let res = self.dispatch(req).await?;
		if res.is_success() {
			Ok(res.body)
		} else {
			Err(Error::Api {
				method,
				path,
				status: res.status,
				body: res.body,
			})
		}
	}
}

impl<T: Dispatch + ?Sized> DispatchExt for T {}
