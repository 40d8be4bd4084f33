use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::text::Language;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid server url: {0}")]
    InvalidUrl(String),

    #[error("server url must use http or https, got {0}")]
    UnsupportedScheme(String),

    #[error("server url has no host")]
    MissingHost,

    #[error("server url must not embed credentials")]
    EmbeddedCredentials,

    #[error("server url must not carry a query or fragment")]
    UnexpectedQuery,

    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Base address of the inference service. Endpoint paths are appended to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerUrl(Url);

impl ServerUrl {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingHost);
        }

        if !url.username().is_empty() || url.password().is_some() {
            return Err(ConfigError::EmbeddedCredentials);
        }

        if url.query().is_some() || url.fragment().is_some() {
            return Err(ConfigError::UnexpectedQuery);
        }

        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Appends `segments` to the base path. Each segment is percent-encoded
    /// on its own; an empty last segment yields a trailing slash.
    pub fn endpoint_url(&self, segments: &[&str]) -> Url {
        let mut url = self.0.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

impl TryFrom<String> for ServerUrl {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ServerUrl> for String {
    fn from(value: ServerUrl) -> Self {
        value.0.into()
    }
}

impl std::fmt::Display for ServerUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server_url: Option<ServerUrl>,
    pub default_language: Language,
}

impl AppConfig {
    pub fn new(server_url: ServerUrl) -> Self {
        Self {
            server_url: Some(server_url),
            default_language: Language::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reads the server address baked in at build time through
    /// `AGRI_ASSIST_SERVER_URL`, if any.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        let server_url = option_env!("AGRI_ASSIST_SERVER_URL")
            .filter(|raw| !raw.trim().is_empty())
            .map(ServerUrl::parse)
            .transpose()?;

        Ok(Self {
            server_url,
            default_language: Language::default(),
        })
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.default_language = language;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_url_validation() {
        assert!(ServerUrl::parse("http://192.168.1.20:8000").is_ok());
        assert!(ServerUrl::parse("https://api.example.com/v1/").is_ok());

        assert!(matches!(
            ServerUrl::parse("ftp://example.com"),
            Err(ConfigError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            ServerUrl::parse("https://user:pw@example.com"),
            Err(ConfigError::EmbeddedCredentials)
        ));
        assert!(matches!(
            ServerUrl::parse("https://example.com/?debug=1"),
            Err(ConfigError::UnexpectedQuery)
        ));
        assert!(matches!(
            ServerUrl::parse("not a url"),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_endpoint_url_joins_segments() {
        let base = ServerUrl::parse("http://10.0.2.2:8000").unwrap();
        assert_eq!(
            base.endpoint_url(&["upload", "plant-image"]).as_str(),
            "http://10.0.2.2:8000/upload/plant-image"
        );
        assert_eq!(
            base.endpoint_url(&["upload-pest-image", ""]).as_str(),
            "http://10.0.2.2:8000/upload-pest-image/"
        );
    }

    #[test]
    fn test_endpoint_url_keeps_base_prefix() {
        let base = ServerUrl::parse("https://example.com/api/").unwrap();
        assert_eq!(
            base.endpoint_url(&["retrieve_pest_data"]).as_str(),
            "https://example.com/api/retrieve_pest_data"
        );
    }

    #[test]
    fn test_endpoint_url_encodes_names() {
        let base = ServerUrl::parse("https://example.com").unwrap();
        assert_eq!(
            base.endpoint_url(&["get_pest_image", "green/aphid bug"]).as_str(),
            "https://example.com/get_pest_image/green%2Faphid%20bug"
        );
    }

    #[test]
    fn test_config_from_json() {
        let config =
            AppConfig::from_json(r#"{"server_url":"http://localhost:8000","default_language":"ta"}"#)
                .unwrap();
        assert_eq!(config.server_url.unwrap().as_str(), "http://localhost:8000/");
        assert_eq!(config.default_language, Language::Ta);

        let empty = AppConfig::from_json("{}").unwrap();
        assert!(empty.server_url.is_none());
        assert_eq!(empty.default_language, Language::En);

        assert!(matches!(
            AppConfig::from_json(r#"{"server_url":"ftp://x"}"#),
            Err(ConfigError::Parse(_))
        ));
    }
}
