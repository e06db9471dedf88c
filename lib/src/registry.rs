//! npm registry package metadata lookup.

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::debug;

use crate::error::RegistryError;

const DEFAULT_BASE_URL: &str = "https://registry.npmjs.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Repository and homepage fields of a registry package document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    /// The package's `homepage` field, empty when absent.
    pub homepage: String,
    /// The package's `repository.url` field (or bare-string `repository`),
    /// empty when absent.
    pub repository_url: String,
}

/// Client for the npm registry.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: HttpClient,
    base_url: String,
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryClient {
    /// Creates a client against the public npm registry.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom registry endpoint (used by tests to
    /// point at a mock server).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetches the repository/homepage metadata for a package.
    ///
    /// Scoped names percent-encode the scope separator, per the registry's
    /// URL scheme (`/@scope%2Fname`).
    ///
    /// ## Errors
    ///
    /// - [`RegistryError::Http`] - network failure
    /// - [`RegistryError::Status`] - non-2xx response (404 for unknown packages)
    pub async fn lookup_package(&self, name: &str) -> Result<PackageMetadata, RegistryError> {
        let url = format!("{}/{}", self.base_url, name.replace('/', "%2F"));
        debug!(package = name, %url, "looking up package on registry");

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RegistryError::Status {
                status: response.status().as_u16(),
                package: name.to_string(),
            });
        }

        let body = response.text().await?;
        let package: NpmPackage = serde_json::from_str(&body)?;
        Ok(PackageMetadata {
            homepage: package.homepage.unwrap_or_default(),
            repository_url: package.repository.map(|r| r.into_url()).unwrap_or_default(),
        })
    }
}

/// Registry package document, reduced to the fields resolution needs.
#[derive(Debug, Deserialize)]
struct NpmPackage {
    homepage: Option<String>,
    repository: Option<NpmRepository>,
}

/// The `repository` field appears as either an object or a bare URL string
/// in real registry documents.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NpmRepository {
    Object { url: Option<String> },
    Url(String),
}

impl NpmRepository {
    fn into_url(self) -> String {
        match self {
            Self::Object { url } => url.unwrap_or_default(),
            Self::Url(url) => url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn lookup_returns_homepage_and_repository_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vue"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "vue",
                "homepage": "https://vuejs.org",
                "repository": { "type": "git", "url": "git+https://github.com/vuejs/core.git" }
            })))
            .mount(&server)
            .await;

        let client = RegistryClient::with_base_url(server.uri());
        let metadata = client.lookup_package("vue").await.unwrap();
        assert_eq!(metadata.homepage, "https://vuejs.org");
        assert_eq!(
            metadata.repository_url,
            "git+https://github.com/vuejs/core.git"
        );
    }

    #[tokio::test]
    async fn lookup_accepts_bare_string_repository_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tiny"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "repository": "github:user/tiny"
            })))
            .mount(&server)
            .await;

        let client = RegistryClient::with_base_url(server.uri());
        let metadata = client.lookup_package("tiny").await.unwrap();
        assert_eq!(metadata.repository_url, "github:user/tiny");
        assert_eq!(metadata.homepage, "");
    }

    #[tokio::test]
    async fn lookup_tolerates_missing_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bare"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "bare"
            })))
            .mount(&server)
            .await;

        let client = RegistryClient::with_base_url(server.uri());
        let metadata = client.lookup_package("bare").await.unwrap();
        assert_eq!(metadata.homepage, "");
        assert_eq!(metadata.repository_url, "");
    }

    #[tokio::test]
    async fn lookup_maps_not_found_to_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/no-such-package"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = RegistryClient::with_base_url(server.uri());
        let err = client.lookup_package("no-such-package").await.unwrap_err();
        match err {
            RegistryError::Status { status, package } => {
                assert_eq!(status, 404);
                assert_eq!(package, "no-such-package");
            }
            other => panic!("expected Status error, got {other:?}"),
        }
    }
}
