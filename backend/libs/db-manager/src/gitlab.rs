//! GitLab REST client handle
//!
//! Only the transport is set up here: a `reqwest` client carrying the
//! access token on every request and bound to the instance's API root.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use std::fmt;
use tracing::info;
use url::Url;

use crate::config::ProfileReader;
use crate::error::{ClientError, Result};

/// Used when no URL is configured
pub const DEFAULT_BASE_URL: &str = "https://gitlab.com/";

const API_VERSION_PATH: &str = "api/v4/";
const TOKEN_HEADER: &str = "private-token";

#[derive(Clone, Default, PartialEq, Eq)]
pub struct GitlabSettings {
    pub token: String,
    pub url: String,
    /// Recorded but not used for authentication
    pub username: String,
    /// Recorded but not used for authentication
    pub password: String,
}

impl fmt::Debug for GitlabSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitlabSettings")
            .field("token", &"[REDACTED]")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl GitlabSettings {
    pub fn from_profile(reader: &ProfileReader<'_>) -> Result<Self> {
        Ok(Self {
            token: reader.required_string("Token")?,
            url: reader.required_string("Url")?,
            username: reader.optional_string("Username")?,
            password: reader.optional_string("Password")?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct GitlabClient {
    http: Client,
    base_url: Url,
}

impl GitlabClient {
    /// API root, always ending in `api/v4/`
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an API path such as `projects/42/issues` against the API root
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(ClientError::GitlabUrl)
    }

    /// Request against an API path, carrying the token header
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        Ok(self.http.request(method, self.endpoint(path)?))
    }

    pub fn get(&self, path: &str) -> Result<RequestBuilder> {
        self.request(Method::GET, path)
    }
}

/// Build a token-authenticated GitLab client. No request is made.
pub fn build_gitlab_client(settings: &GitlabSettings) -> Result<GitlabClient> {
    let base_url = api_base_url(&settings.url).map_err(ClientError::GitlabUrl)?;

    let mut token = HeaderValue::from_str(&settings.token)?;
    token.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(TOKEN_HEADER, token);

    let http = Client::builder().default_headers(headers).build()?;

    info!(base_url = %base_url, "GitLab client initialized");
    Ok(GitlabClient { http, base_url })
}

fn api_base_url(raw: &str) -> std::result::Result<Url, url::ParseError> {
    let raw = match raw.trim() {
        "" => DEFAULT_BASE_URL,
        trimmed => trimmed,
    };

    let mut url = Url::parse(raw)?;
    let mut path = url.path().to_string();
    if !path.ends_with('/') {
        path.push('/');
    }
    if !path.ends_with(API_VERSION_PATH) {
        path.push_str(API_VERSION_PATH);
    }
    url.set_path(&path);
    Ok(url)
}
