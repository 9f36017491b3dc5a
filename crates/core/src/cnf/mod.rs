use std::sync::LazyLock;

/// The number of records returned by the find blueprint when no `limit` is given
pub static DEFAULT_LIMIT: LazyLock<u64> = lazy_env_parse!("BOLTQL_DEFAULT_LIMIT", u64, 30);

/// The page size used by range queries when the GraphQL request omits `limit`
pub static RANGE_LIMIT: LazyLock<i64> = lazy_env_parse!("BOLTQL_RANGE_LIMIT", i64, 100);

/// The number of associated records populated onto each record
pub static POPULATE_LIMIT: LazyLock<u64> = lazy_env_parse!("BOLTQL_POPULATE_LIMIT", u64, 30);

/// The number of inverse records populated when resolving many-to-many filters
pub static INVERSE_LIMIT: LazyLock<u64> = lazy_env_parse!("BOLTQL_INVERSE_LIMIT", u64, 100);

/// The number of record events buffered for slow realtime subscribers
pub static PUBLISH_CAPACITY: LazyLock<usize> =
	lazy_env_parse!("BOLTQL_PUBLISH_CAPACITY", usize, 1024);

/// The header which marks a request as issued by the GraphQL resolvers
pub const GRAPHQL_HEADER: &str = "graphql";

/// The name of the generated query root type
pub const QUERY_TYPE: &str = "RootQueryType";

/// The name of the generated mutation root type
pub const MUTATION_TYPE: &str = "RootMutationType";

/// The name of the scalar used for `json` attributes
pub const JSON_SCALAR: &str = "JSON";

/// Request parameters which never become part of the find criteria
pub const CRITERIA_BLACKLIST: [&str; 4] = ["limit", "skip", "sort", "populate"];

/// The default update blacklist
pub const UPDATE_BLACKLIST: [&str; 1] = ["id"];
