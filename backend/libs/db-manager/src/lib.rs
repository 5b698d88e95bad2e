//! Config-driven construction of backend clients
//!
//! A [`ClientSet`] reads one profile from a YAML config file and builds the
//! matching client: Elasticsearch (`es.*`), GitLab (`gitlab.*`),
//! Redis (`redis.*`) or MySQL (`mysql.*`).
//!
//! ```yaml
//! redis:
//!   default:
//!     Addresses: "localhost:6379"
//!     Password: ""
//!     DB: 0
//! ```
//!
//! # Example
//!
//! ```no_run
//! use db_manager::{ClientSet, ConfigLocation};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut clients = ClientSet::new(ConfigLocation::new("./conf", "config"));
//!     clients.initialize("redis.default").await?;
//!
//!     let mut conn = clients.cache_client().expect("initialized").connection();
//!     let _: () = redis::cmd("SET").arg("greeting").arg("hello").query_async(&mut conn).await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cache;
pub mod config;
pub mod container;
pub mod error;
pub mod gitlab;
pub mod relational;
pub mod search;

pub use backend::{BackendKind, ClientType};
pub use cache::{build_cache_client, CacheClient, RedisSettings};
pub use config::{ConfigLocation, ConfigSource, FieldPolicy, ProfileReader, YamlConfig};
pub use container::ClientSet;
pub use error::{ClientError, Result};
pub use gitlab::{build_gitlab_client, GitlabClient, GitlabSettings};
pub use relational::{build_mysql_client, MysqlSettings};
pub use search::{build_search_client, SearchSettings};
