use elasticsearch::http::transport::BuildError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unknown backend kind: {0:?}")]
    UnknownBackend(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("missing config value: {0}")]
    MissingField(String),

    #[error("config value {key} has the wrong type, expected {expected}")]
    InvalidField { key: String, expected: &'static str },

    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("invalid Elasticsearch URL: {0}")]
    SearchUrl(#[source] url::ParseError),

    #[error("failed to build Elasticsearch transport: {0}")]
    SearchTransport(#[from] BuildError),

    #[error("invalid GitLab URL: {0}")]
    GitlabUrl(#[source] url::ParseError),

    #[error("GitLab token is not a valid header value: {0}")]
    GitlabToken(#[from] reqwest::header::InvalidHeaderValue),

    #[error("failed to build GitLab HTTP client: {0}")]
    GitlabHttp(#[from] reqwest::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("MySQL error: {0}")]
    Mysql(#[from] sqlx::Error),
}
