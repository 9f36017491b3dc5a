use std::sync::LazyLock;

use boltql_core::lazy_env_parse;

pub const LOGO: &str = "
888               888 888    .d88888b.  888
888               888 888   d88P' 'Y88b 888
888               888 888   888     888 888
88888b.   .d88b.  888 888888 888     888 888
888 '88b d88''88b 888 888   888     888 888
888  888 888  888 888 888   888 Y8b 888 888
888 d88P Y88..88P 888 Y88b. Y88b.Y8b88P 888
88888P'   'Y88P'  888  'Y888 'Y888888'  88888888
                                   Y8b
";

/// The publicly visible name of the server
pub const PKG_NAME: &str = "boltql";

/// The address the server listens on when none is given
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// The path prefix under which the CRUD API is mounted
pub const API_PREFIX: &str = "/api";

/// The maximum size of an HTTP request body (defaults to 4 MiB)
pub static HTTP_MAX_BODY_SIZE: LazyLock<usize> =
	lazy_env_parse!("BOLTQL_HTTP_MAX_BODY_SIZE", usize, 4 << 20);
