use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::OnceLock;

pub static CF: OnceLock<Config> = OnceLock::new();

#[derive(Clone, Debug)]
pub struct Config {
	pub bind: SocketAddr,
	pub models: PathBuf,
}
