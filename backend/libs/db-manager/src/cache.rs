use redis::aio::MultiplexedConnection;
use redis::{Client, ConnectionInfo, IntoConnectionInfo};
use std::fmt;
use tracing::{error, info};

use crate::config::ProfileReader;
use crate::error::{ClientError, Result};

/// Server used when the address is empty
pub const DEFAULT_ADDRESS: &str = "localhost:6379";

#[derive(Clone, Default, PartialEq, Eq)]
pub struct RedisSettings {
    /// `host:port`; empty means `localhost:6379`
    pub address: String,
    pub password: String,
    /// Logical database index
    pub db: i64,
}

impl fmt::Debug for RedisSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisSettings")
            .field("address", &self.address)
            .field("password", &"[REDACTED]")
            .field("db", &self.db)
            .finish()
    }
}

impl RedisSettings {
    pub fn from_profile(reader: &ProfileReader<'_>) -> Result<Self> {
        Ok(Self {
            address: reader.required_string("Addresses")?,
            password: reader.optional_string("Password")?,
            db: reader.optional_integer("DB")?,
        })
    }

    pub fn connection_info(&self) -> Result<ConnectionInfo> {
        let address = match self.address.trim() {
            "" => DEFAULT_ADDRESS,
            trimmed => trimmed,
        };
        let url = format!("redis://{}/{}", address, self.db);
        let mut info = url
            .as_str()
            .into_connection_info()
            .map_err(|e| ClientError::InvalidAddress {
                address: self.address.clone(),
                reason: e.to_string(),
            })?;

        if !self.password.is_empty() {
            info.redis.password = Some(self.password.clone());
        }
        Ok(info)
    }
}

/// Redis client plus the connection that passed the startup `PING`.
#[derive(Clone)]
pub struct CacheClient {
    client: Client,
    connection: MultiplexedConnection,
}

impl CacheClient {
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Cheap handle to the shared multiplexed connection
    pub fn connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }
}

/// Connect to Redis and verify the connection with `PING`.
pub async fn build_cache_client(settings: &RedisSettings) -> Result<CacheClient> {
    let client = Client::open(settings.connection_info()?)?;

    let mut connection = match client.get_multiplexed_tokio_connection().await {
        Ok(connection) => connection,
        Err(e) => {
            error!(address = %settings.address, error = %e, "Failed to connect to Redis");
            return Err(e.into());
        }
    };

    let ping = redis::cmd("PING")
        .query_async::<_, String>(&mut connection)
        .await;
    let reply = match ping {
        Ok(reply) => reply,
        Err(e) => {
            error!(address = %settings.address, error = %e, "Redis PING failed");
            return Err(e.into());
        }
    };

    info!(
        address = %settings.address,
        db = settings.db,
        reply = %reply,
        "Connected to Redis"
    );

    Ok(CacheClient { client, connection })
}
