use elasticsearch::{
    auth::Credentials,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    Elasticsearch,
};
use std::fmt;
use tracing::info;
use url::Url;

use crate::config::ProfileReader;
use crate::error::{ClientError, Result};

/// Node used when the address is empty
pub const DEFAULT_ADDRESS: &str = "http://localhost:9200";

#[derive(Clone, Default, PartialEq, Eq)]
pub struct SearchSettings {
    pub address: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SearchSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchSettings")
            .field("address", &self.address)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl SearchSettings {
    pub fn from_profile(reader: &ProfileReader<'_>) -> Result<Self> {
        Ok(Self {
            address: reader.required_string("Addresses")?,
            username: reader.optional_string("Username")?,
            password: reader.optional_string("Password")?,
        })
    }
}

/// Build an Elasticsearch client for a single node.
///
/// Basic auth is applied when a username is set. An empty address means
/// [`DEFAULT_ADDRESS`]. Nothing is sent to the cluster here; connectivity
/// problems surface on the first request.
pub fn build_search_client(settings: &SearchSettings) -> Result<Elasticsearch> {
    let address = match settings.address.trim() {
        "" => DEFAULT_ADDRESS,
        trimmed => trimmed,
    };
    let url = Url::parse(address).map_err(ClientError::SearchUrl)?;
    let pool = SingleNodeConnectionPool::new(url);

    let mut builder = TransportBuilder::new(pool);
    if !settings.username.is_empty() {
        builder = builder.auth(Credentials::Basic(
            settings.username.clone(),
            settings.password.clone(),
        ));
    }
    let transport = builder.build()?;

    info!(address = %address, "Elasticsearch client initialized");
    Ok(Elasticsearch::new(transport))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldPolicy, YamlConfig};

    #[test]
    fn test_settings_from_profile() {
        let config = YamlConfig::parse(
            r#"
es:
  default:
    Addresses: "http://localhost:9200"
    Username: elastic
    Password: changeme
"#,
        )
        .unwrap();

        let reader = ProfileReader::new(&config, "es.default", FieldPolicy::Strict);
        let settings = SearchSettings::from_profile(&reader).unwrap();
        assert_eq!(
            settings,
            SearchSettings {
                address: "http://localhost:9200".to_string(),
                username: "elastic".to_string(),
                password: "changeme".to_string(),
            }
        );
    }

    #[test]
    fn test_build_does_not_connect() {
        // Nothing listens on port 1; construction must still succeed.
        let settings = SearchSettings {
            address: "http://127.0.0.1:1".to_string(),
            username: "elastic".to_string(),
            password: "changeme".to_string(),
        };
        assert!(build_search_client(&settings).is_ok());
    }

    #[test]
    fn test_build_without_credentials() {
        let settings = SearchSettings {
            address: "http://localhost:9200".to_string(),
            ..Default::default()
        };
        assert!(build_search_client(&settings).is_ok());
    }

    #[test]
    fn test_build_rejects_invalid_address() {
        let settings = SearchSettings {
            address: "localhost 9200".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            build_search_client(&settings),
            Err(ClientError::SearchUrl(_))
        ));
    }

    #[test]
    fn test_empty_address_uses_local_node() {
        assert!(build_search_client(&SearchSettings::default()).is_ok());
    }

    #[test]
    fn test_debug_redacts_password() {
        let settings = SearchSettings {
            address: "http://localhost:9200".to_string(),
            username: "elastic".to_string(),
            password: "changeme".to_string(),
        };
        let rendered = format!("{:?}", settings);
        assert!(rendered.contains("elastic"));
        assert!(!rendered.contains("changeme"));
    }
}
