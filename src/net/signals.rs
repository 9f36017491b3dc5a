use crate::err::Error;

/// Resolves once a shutdown signal is received
pub async fn shutdown() {
	match listen().await {
		Ok(signal) => {
			info!(target: super::LOG, "{signal} received. Waiting for graceful shutdown...")
		}
		Err(e) => {
			error!(target: super::LOG, "Failed to listen to shutdown signal: {e}. Shutting down...")
		}
	}
}

#[cfg(unix)]
async fn listen() -> Result<String, Error> {
	// Import the OS signals
	use tokio::signal::unix::{SignalKind, signal};
	// Get the operating system signal types
	let mut sighup = signal(SignalKind::hangup())?;
	let mut sigint = signal(SignalKind::interrupt())?;
	let mut sigquit = signal(SignalKind::quit())?;
	let mut sigterm = signal(SignalKind::terminate())?;
	// Listen and wait for the system signals
	tokio::select! {
		// Wait for a SIGHUP signal
		_ = sighup.recv() => {
			Ok(String::from("SIGHUP"))
		}
		// Wait for a SIGINT signal
		_ = sigint.recv() => {
			Ok(String::from("SIGINT"))
		}
		// Wait for a SIGQUIT signal
		_ = sigquit.recv() => {
			Ok(String::from("SIGQUIT"))
		}
		// Wait for a SIGTERM signal
		_ = sigterm.recv() => {
			Ok(String::from("SIGTERM"))
		}
	}
}

#[cfg(not(unix))]
async fn listen() -> Result<String, Error> {
	// Listen and wait for the system signals
	tokio::signal::ctrl_c().await?;
	Ok(String::from("CTRL-C"))
}
