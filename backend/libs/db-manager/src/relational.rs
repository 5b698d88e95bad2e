//! MySQL connection pool

use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions};
use sqlx::Connection;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::ProfileReader;
use crate::error::{ClientError, Result};

/// Maximum lifetime of a pooled connection
pub const MAX_CONNECTION_LIFETIME: Duration = Duration::from_secs(100);
/// Upper bound on pooled (and therefore idle) connections
pub const MAX_IDLE_CONNECTIONS: u32 = 10;
pub const DEFAULT_PORT: u16 = 3306;
/// Host used when the address is empty
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Bound on the startup connect and `SELECT 1`
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Default, PartialEq, Eq)]
pub struct MysqlSettings {
    /// `host:port`, port defaults to 3306; empty means `127.0.0.1:3306`
    pub address: String,
    pub username: String,
    pub password: String,
    /// Schema name
    pub database: String,
}

impl fmt::Debug for MysqlSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MysqlSettings")
            .field("address", &self.address)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("database", &self.database)
            .finish()
    }
}

impl MysqlSettings {
    pub fn from_profile(reader: &ProfileReader<'_>) -> Result<Self> {
        Ok(Self {
            address: reader.required_string("Addresses")?,
            username: reader.required_string("Username")?,
            password: reader.optional_string("Password")?,
            database: reader.required_string("DB")?,
        })
    }

    /// `<user>:<password>@tcp(<address>)/<database>`
    pub fn data_source_name(&self) -> String {
        format!(
            "{}:{}@tcp({})/{}",
            self.username, self.password, self.address, self.database
        )
    }

    /// Same as [`data_source_name`](Self::data_source_name) with the password masked
    pub fn redacted_data_source_name(&self) -> String {
        format!(
            "{}:***@tcp({})/{}",
            self.username, self.address, self.database
        )
    }

    pub fn connect_options(&self) -> Result<MySqlConnectOptions> {
        let (host, port) = split_host_port(&self.address)?;

        let mut options = MySqlConnectOptions::new()
            .host(&host)
            .port(port)
            .username(&self.username);
        if !self.password.is_empty() {
            options = options.password(&self.password);
        }
        if !self.database.is_empty() {
            options = options.database(&self.database);
        }
        Ok(options)
    }
}

fn split_host_port(address: &str) -> Result<(String, u16)> {
    let invalid = |reason: &str| ClientError::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    let address = address.trim();
    if address.is_empty() {
        return Ok((DEFAULT_HOST.to_string(), DEFAULT_PORT));
    }

    let (host, port) = if let Some(rest) = address.strip_prefix('[') {
        // [v6-address]:port
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| invalid("unterminated IPv6 literal"))?;
        (host, tail.strip_prefix(':'))
    } else if address.matches(':').count() > 1 {
        // Bare IPv6 literal, no port
        (address, None)
    } else {
        match address.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (address, None),
        }
    };

    if host.is_empty() {
        return Err(invalid("missing host"));
    }

    let port = match port {
        Some(port) => port.parse().map_err(|_| invalid("port is not a number"))?,
        None => DEFAULT_PORT,
    };

    Ok((host.to_string(), port))
}

/// Verify the server with `SELECT 1` over a direct connection, then open a
/// lazy MySQL pool.
///
/// Connect failures (refused, unknown host, bad credentials) are returned as
/// reported by the driver. Verification is bounded by [`CONNECT_TIMEOUT`].
pub async fn build_mysql_client(settings: &MysqlSettings) -> Result<MySqlPool> {
    let options = settings.connect_options()?;
    debug!(dsn = %settings.redacted_data_source_name(), "Verifying MySQL connection");

    match tokio::time::timeout(CONNECT_TIMEOUT, verify_connection(&options)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!(
                dsn = %settings.redacted_data_source_name(),
                error = %e,
                "MySQL connection verification failed"
            );
            return Err(e.into());
        }
        Err(_) => {
            error!(
                dsn = %settings.redacted_data_source_name(),
                timeout_secs = CONNECT_TIMEOUT.as_secs(),
                "MySQL connection verification timeout"
            );
            return Err(ClientError::Mysql(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "MySQL verification timeout",
            ))));
        }
    }

    let pool = MySqlPoolOptions::new()
        .max_lifetime(MAX_CONNECTION_LIFETIME)
        .max_connections(MAX_IDLE_CONNECTIONS)
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect_lazy_with(options);

    info!(
        address = %settings.address,
        database = %settings.database,
        "MySQL pool created and verified successfully"
    );
    Ok(pool)
}

async fn verify_connection(options: &MySqlConnectOptions) -> sqlx::Result<()> {
    let mut conn = MySqlConnection::connect_with(options).await?;
    sqlx::query("SELECT 1").execute(&mut conn).await?;
    conn.close().await
}
