mod schema;

pub use schema::{Config, QueryConfig, RetryConfig, ServerConfig};
