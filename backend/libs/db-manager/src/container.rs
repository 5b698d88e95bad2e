use elasticsearch::Elasticsearch;
use sqlx::mysql::MySqlPool;
use std::fmt;
use tracing::{debug, error, info};

use crate::backend::{BackendKind, ClientType};
use crate::cache::{build_cache_client, CacheClient, RedisSettings};
use crate::config::{ConfigLocation, ConfigSource, FieldPolicy, ProfileReader, YamlConfig};
use crate::error::Result;
use crate::gitlab::{build_gitlab_client, GitlabClient, GitlabSettings};
use crate::relational::{build_mysql_client, MysqlSettings};
use crate::search::{build_search_client, SearchSettings};

/// Holds at most one live client per backend kind, together with the
/// settings it was built from.
///
/// Re-initializing a backend replaces both. The previous handle is dropped;
/// no explicit shutdown is sent to the service. A failed initialization
/// leaves the backend's settings and handle untouched.
#[derive(Default)]
pub struct ClientSet {
    config: ConfigLocation,
    policy: FieldPolicy,

    search_settings: SearchSettings,
    search_client: Option<Elasticsearch>,

    gitlab_settings: GitlabSettings,
    gitlab_client: Option<GitlabClient>,

    redis_settings: RedisSettings,
    cache_client: Option<CacheClient>,

    mysql_settings: MysqlSettings,
    mysql_client: Option<MySqlPool>,
}

impl ClientSet {
    pub fn new(config: ConfigLocation) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Config location taken from `DB_MANAGER_CONFIG_PATH` / `DB_MANAGER_CONFIG_NAME`
    pub fn from_env() -> Self {
        Self::new(ConfigLocation::from_env())
    }

    pub fn with_policy(mut self, policy: FieldPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config_location(&self) -> &ConfigLocation {
        &self.config
    }

    pub fn policy(&self) -> FieldPolicy {
        self.policy
    }

    /// Build the client selected by `client_type` (e.g. `redis.default`) from
    /// the config file and store it.
    ///
    /// The config file is read on every call.
    pub async fn initialize(&mut self, client_type: &str) -> Result<BackendKind> {
        let client_type = ClientType::parse(client_type)?;
        let config = YamlConfig::load(&self.config)?;
        self.apply(&config, &client_type).await
    }

    /// Same as [`initialize`](Self::initialize) against an already loaded source.
    pub async fn initialize_from(
        &mut self,
        source: &dyn ConfigSource,
        client_type: &str,
    ) -> Result<BackendKind> {
        let client_type = ClientType::parse(client_type)?;
        self.apply(source, &client_type).await
    }

    async fn apply(
        &mut self,
        source: &dyn ConfigSource,
        client_type: &ClientType,
    ) -> Result<BackendKind> {
        let kind = client_type.kind();
        let reader = ProfileReader::new(source, client_type.key_prefix(), self.policy);

        let result = match kind {
            BackendKind::Search => self.init_search(&reader),
            BackendKind::SourceControl => self.init_gitlab(&reader),
            BackendKind::Cache => self.init_cache(&reader).await,
            BackendKind::Relational => self.init_mysql(&reader).await,
        };

        match result {
            Ok(()) => {
                info!(backend = %kind, profile = %client_type.profile(), "Client initialized");
                Ok(kind)
            }
            Err(e) => {
                error!(
                    backend = %kind,
                    profile = %client_type.profile(),
                    error = %e,
                    "Client initialization failed"
                );
                Err(e)
            }
        }
    }

    fn init_search(&mut self, reader: &ProfileReader<'_>) -> Result<()> {
        let settings = SearchSettings::from_profile(reader)?;
        debug!(settings = ?settings, "Resolved search settings");

        let client = build_search_client(&settings)?;
        self.search_settings = settings;
        self.search_client = Some(client);
        Ok(())
    }

    fn init_gitlab(&mut self, reader: &ProfileReader<'_>) -> Result<()> {
        let settings = GitlabSettings::from_profile(reader)?;
        debug!(settings = ?settings, "Resolved GitLab settings");

        let client = build_gitlab_client(&settings)?;
        self.gitlab_settings = settings;
        self.gitlab_client = Some(client);
        Ok(())
    }

    async fn init_cache(&mut self, reader: &ProfileReader<'_>) -> Result<()> {
        let settings = RedisSettings::from_profile(reader)?;
        debug!(settings = ?settings, "Resolved Redis settings");

        let client = build_cache_client(&settings).await?;
        self.redis_settings = settings;
        self.cache_client = Some(client);
        Ok(())
    }

    async fn init_mysql(&mut self, reader: &ProfileReader<'_>) -> Result<()> {
        let settings = MysqlSettings::from_profile(reader)?;
        debug!(settings = ?settings, "Resolved MySQL settings");

        let client = build_mysql_client(&settings).await?;
        self.mysql_settings = settings;
        self.mysql_client = Some(client);
        Ok(())
    }

    pub fn is_initialized(&self, kind: BackendKind) -> bool {
        match kind {
            BackendKind::Search => self.search_client.is_some(),
            BackendKind::SourceControl => self.gitlab_client.is_some(),
            BackendKind::Cache => self.cache_client.is_some(),
            BackendKind::Relational => self.mysql_client.is_some(),
        }
    }

    pub fn search_client(&self) -> Option<&Elasticsearch> {
        self.search_client.as_ref()
    }

    pub fn search_settings(&self) -> &SearchSettings {
        &self.search_settings
    }

    pub fn gitlab_client(&self) -> Option<&GitlabClient> {
        self.gitlab_client.as_ref()
    }

    pub fn gitlab_settings(&self) -> &GitlabSettings {
        &self.gitlab_settings
    }

    pub fn cache_client(&self) -> Option<&CacheClient> {
        self.cache_client.as_ref()
    }

    pub fn redis_settings(&self) -> &RedisSettings {
        &self.redis_settings
    }

    pub fn mysql_client(&self) -> Option<&MySqlPool> {
        self.mysql_client.as_ref()
    }

    pub fn mysql_settings(&self) -> &MysqlSettings {
        &self.mysql_settings
    }
}

impl fmt::Debug for ClientSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSet")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .field("search_settings", &self.search_settings)
            .field("search_client", &self.search_client.is_some())
            .field("gitlab_settings", &self.gitlab_settings)
            .field("gitlab_client", &self.gitlab_client.is_some())
            .field("redis_settings", &self.redis_settings)
            .field("cache_client", &self.cache_client.is_some())
            .field("mysql_settings", &self.mysql_settings)
            .field("mysql_client", &self.mysql_client.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    const DOCUMENT: &str = r#"
es:
  default:
    Addresses: "http://localhost:9200"
    Username: elastic
    Password: changeme
  backup:
    Addresses: "http://backup:9200"
gitlab:
  default:
    Token: glpat-secret
    Url: https://gitlab.example.com
    Username: ci
    Password: hunter2
  partial:
    Url: https://gitlab.example.com
redis:
  down:
    Addresses: "127.0.0.1:1"
mysql:
  broken:
    Addresses: "db.internal:not-a-port"
    Username: app
    DB: nova
  down:
    Addresses: "127.0.0.1:1"
    Username: app
    Password: s3cret
    DB: nova
"#;

    fn config() -> YamlConfig {
        YamlConfig::parse(DOCUMENT).unwrap()
    }

    fn snapshot(clients: &ClientSet) -> String {
        format!("{:?}", clients)
    }

    #[tokio::test]
    async fn test_initialize_search() {
        let mut clients = ClientSet::default();
        let kind = clients.initialize_from(&config(), "es.default").await.unwrap();

        assert_eq!(kind, BackendKind::Search);
        assert!(clients.search_client().is_some());
        assert_eq!(
            clients.search_settings(),
            &SearchSettings {
                address: "http://localhost:9200".to_string(),
                username: "elastic".to_string(),
                password: "changeme".to_string(),
            }
        );
        assert!(!clients.is_initialized(BackendKind::Cache));
    }

    #[tokio::test]
    async fn test_initialize_gitlab() {
        let mut clients = ClientSet::default();
        clients.initialize_from(&config(), "gitlab.default").await.unwrap();

        let settings = clients.gitlab_settings();
        assert_eq!(settings.token, "glpat-secret");
        assert_eq!(settings.url, "https://gitlab.example.com");
        assert_eq!(settings.username, "ci");
        assert_eq!(settings.password, "hunter2");
        assert_eq!(
            clients.gitlab_client().unwrap().base_url().as_str(),
            "https://gitlab.example.com/api/v4/"
        );
    }

    #[tokio::test]
    async fn test_unknown_backend_leaves_container_untouched() {
        let mut clients = ClientSet::default();
        clients.initialize_from(&config(), "es.default").await.unwrap();
        let before = snapshot(&clients);

        let result = clients.initialize_from(&config(), "mongo.default").await;
        assert!(matches!(result, Err(ClientError::UnknownBackend(ref kind)) if kind == "mongo"));
        assert_eq!(snapshot(&clients), before);
    }

    #[tokio::test]
    async fn test_reinitialize_replaces_settings() {
        let mut clients = ClientSet::default();
        clients.initialize_from(&config(), "es.default").await.unwrap();
        clients.initialize_from(&config(), "es.backup").await.unwrap();

        // No leftovers from the first profile
        assert_eq!(
            clients.search_settings(),
            &SearchSettings {
                address: "http://backup:9200".to_string(),
                username: String::new(),
                password: String::new(),
            }
        );
        assert!(clients.search_client().is_some());
    }

    #[tokio::test]
    async fn test_strict_policy_reports_missing_field() {
        let mut clients = ClientSet::default();
        let result = clients.initialize_from(&config(), "gitlab.partial").await;

        match result {
            Err(ClientError::MissingField(key)) => assert_eq!(key, "gitlab.partial.Token"),
            other => panic!("expected MissingField, got {:?}", other),
        }
        assert!(clients.gitlab_client().is_none());
        assert_eq!(clients.gitlab_settings(), &GitlabSettings::default());
    }

    #[tokio::test]
    async fn test_lenient_policy_uses_zero_values() {
        let mut clients = ClientSet::default().with_policy(FieldPolicy::Lenient);
        clients.initialize_from(&config(), "gitlab.partial").await.unwrap();

        let settings = clients.gitlab_settings();
        assert_eq!(settings.token, "");
        assert_eq!(settings.username, "");
        assert_eq!(settings.url, "https://gitlab.example.com");
        assert!(clients.gitlab_client().is_some());
    }

    #[tokio::test]
    async fn test_failed_cache_build_keeps_previous_state() {
        let mut clients = ClientSet::default();
        let before = snapshot(&clients);

        let result = clients.initialize_from(&config(), "redis.down").await;
        assert!(matches!(result, Err(ClientError::Redis(_))));
        assert!(clients.cache_client().is_none());
        assert_eq!(snapshot(&clients), before);
    }

    #[tokio::test]
    async fn test_failed_mysql_build_keeps_previous_state() {
        let mut clients = ClientSet::default();
        let before = snapshot(&clients);

        let result = clients.initialize_from(&config(), "mysql.broken").await;
        assert!(matches!(result, Err(ClientError::InvalidAddress { .. })));
        assert!(!clients.is_initialized(BackendKind::Relational));
        assert_eq!(snapshot(&clients), before);
    }

    #[tokio::test]
    async fn test_unreachable_mysql_keeps_previous_state() {
        let mut clients = ClientSet::default();
        let before = snapshot(&clients);

        let result = clients.initialize_from(&config(), "mysql.down").await;
        assert!(matches!(result, Err(ClientError::Mysql(sqlx::Error::Io(_)))));
        assert!(clients.mysql_client().is_none());
        assert_eq!(snapshot(&clients), before);
    }

    #[tokio::test]
    async fn test_initialize_reads_config_location() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clients.yaml"), DOCUMENT).unwrap();

        let mut clients = ClientSet::new(ConfigLocation::new(dir.path(), "clients"));
        clients.initialize("es.backup").await.unwrap();
        assert_eq!(clients.search_settings().address, "http://backup:9200");
    }

    #[tokio::test]
    async fn test_initialize_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut clients = ClientSet::new(ConfigLocation::new(dir.path(), "missing"));

        let result = clients.initialize("es.default").await;
        assert!(matches!(result, Err(ClientError::ConfigLoad { .. })));
    }
}
