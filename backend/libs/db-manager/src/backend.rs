use std::fmt;
use std::str::FromStr;

use crate::error::{ClientError, Result};

/// External services a [`ClientSet`](crate::ClientSet) can hold a client for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Elasticsearch, selected by `es`
    Search,
    /// GitLab, selected by `gitlab`
    SourceControl,
    /// Redis, selected by `redis`
    Cache,
    /// MySQL, selected by `mysql`
    Relational,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Search,
        BackendKind::SourceControl,
        BackendKind::Cache,
        BackendKind::Relational,
    ];

    /// First segment of a client type string selecting this backend
    pub fn prefix(self) -> &'static str {
        match self {
            BackendKind::Search => "es",
            BackendKind::SourceControl => "gitlab",
            BackendKind::Cache => "redis",
            BackendKind::Relational => "mysql",
        }
    }
}

impl FromStr for BackendKind {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.prefix() == s)
            .ok_or_else(|| ClientError::UnknownBackend(s.to_string()))
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.prefix())
    }
}

/// A parsed `<kind>.<profile>` string, e.g. `redis.default`.
///
/// The whole string is the key prefix for the profile's fields, so
/// `redis.default` reads `redis.default.Addresses`, `redis.default.DB`, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientType {
    kind: BackendKind,
    raw: String,
}

impl ClientType {
    pub fn parse(raw: &str) -> Result<Self> {
        let head = raw.split('.').next().unwrap_or_default();
        Ok(Self {
            kind: head.parse()?,
            raw: raw.to_string(),
        })
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Everything after the backend segment; empty for a bare `redis`
    pub fn profile(&self) -> &str {
        self.raw
            .split_once('.')
            .map(|(_, profile)| profile)
            .unwrap_or_default()
    }

    pub fn key_prefix(&self) -> &str {
        &self.raw
    }
}

impl FromStr for ClientType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
