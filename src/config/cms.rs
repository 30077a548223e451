//! CMS connection settings, read from the process environment once at start-up

use serde::Serialize;

pub const DEFAULT_REPOSITORY: &str = "postdesafio";

/// Prismic repository connection settings
#[derive(Debug, Clone, Serialize)]
pub struct CmsConfig {
    /// Repository name
    pub repository: String,
    /// REST API v2 endpoint
    pub api_endpoint: String,
    /// Permanent access token for private repositories
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

impl CmsConfig {
    /// Build a config for a repository, deriving the CDN endpoint from its name
    pub fn new(repository: &str, access_token: Option<String>) -> Self {
        Self {
            repository: repository.to_string(),
            api_endpoint: endpoint_for(repository),
            access_token,
        }
    }

    /// Read `PRISMIC_REPOSITORY`, `PRISMIC_ACCESS_TOKEN` and `PRISMIC_API_ENDPOINT`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`CmsConfig::from_env`] but with an injectable variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let repository =
            non_empty("PRISMIC_REPOSITORY").unwrap_or_else(|| DEFAULT_REPOSITORY.to_string());
        let mut config = Self::new(&repository, non_empty("PRISMIC_ACCESS_TOKEN"));
        if let Some(endpoint) = non_empty("PRISMIC_API_ENDPOINT") {
            config.api_endpoint = endpoint.trim_end_matches('/').to_string();
        }
        config
    }
}

fn endpoint_for(repository: &str) -> String {
    format!("https://{}.cdn.prismic.io/api/v2", repository)
}
